// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use crate::{CompareAndSwap, Get, Insert, Remove, ScanPrefix};
use crate::{InMemStore, IntoKey, KeyValStore, SledDb};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of times a conditional write is retried after losing a race before giving up.
const MAX_MUTATE_ATTEMPTS: usize = 128;

/// Outcome of a `try_mutate` closure.
pub enum Mutation<T, R> {
    /// Store `T` and hand `R` back to the caller.
    Write(T, R),
    /// Leave the stored value untouched.
    Skip(R),
}

/// Scoped handle over a shared `KeyValStore`.
/// DataStore is scopable and cheap to clone.
#[derive(Clone)]
pub struct DataStore {
    scope: Vec<u8>,
    db: Arc<dyn KeyValStore>,
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("scope", &String::from_utf8_lossy(&self.scope))
            .finish()
    }
}

impl DataStore {
    pub fn new(db: Arc<dyn KeyValStore>) -> Self {
        Self { scope: vec![], db }
    }

    pub fn in_mem() -> Self {
        Self::new(Arc::new(InMemStore::new(false)))
    }

    pub fn sled(path: &Path) -> Result<Self> {
        Ok(Self::new(Arc::new(SledDb::new(path, "datastore")?)))
    }

    /// Read data at the scope location
    pub fn read<T>(&self) -> Result<Option<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let Some(bytes) = self.db.get(Get::new(&self.scope))? else {
            return Ok(None);
        };

        Ok(Some(self.decode(&bytes)?))
    }

    /// Writes data to the scope location
    pub fn write<T: Serialize>(&self, value: T) -> Result<()> {
        let serialized = self.encode(&value)?;
        self.db.insert(Insert::new(&self.scope, serialized))
    }

    /// Removes data from the scope location
    pub fn clear(&self) -> Result<()> {
        self.db.remove(Remove::new(&self.scope))
    }

    /// Read every value stored below the scope, ordered by key.
    pub fn read_all<T>(&self) -> Result<Vec<T>>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut prefix = self.scope.clone();
        if !prefix.ends_with(b"/") {
            prefix.push(b'/');
        }
        self.db
            .scan_prefix(ScanPrefix::new(prefix))?
            .iter()
            .map(|(_, v)| self.decode(v))
            .collect()
    }

    /// Atomically read-modify-write the value at the scope.
    ///
    /// `f` receives the current value and decides whether to write. The write only lands if the
    /// stored bytes are still the ones `f` saw, otherwise `f` runs again against the fresh value.
    /// `f` may therefore be called more than once and must not have side effects.
    pub fn try_mutate<T, R, F>(&self, mut f: F) -> Result<R>
    where
        T: Serialize + for<'de> Deserialize<'de>,
        F: FnMut(Option<T>) -> Result<Mutation<T, R>>,
    {
        for _ in 0..MAX_MUTATE_ATTEMPTS {
            let current = self.db.get(Get::new(&self.scope))?;
            let decoded = match &current {
                Some(bytes) => Some(self.decode::<T>(bytes)?),
                None => None,
            };
            match f(decoded)? {
                Mutation::Skip(res) => return Ok(res),
                Mutation::Write(value, res) => {
                    let serialized = self.encode(&value)?;
                    let swapped = self.db.compare_and_swap(CompareAndSwap::new(
                        &self.scope,
                        current,
                        serialized,
                    ))?;
                    if swapped {
                        return Ok(res);
                    }
                    warn!(scope = %self.scope_str(), "lost write race, retrying");
                }
            }
        }
        bail!(
            "Could not update {} after {} attempts",
            self.scope_str(),
            MAX_MUTATE_ATTEMPTS
        )
    }

    /// Write the value only if nothing is stored at the scope yet.
    /// Returns the value that ends up stored, which is the existing one when the key was taken.
    pub fn set_if_absent<T>(&self, value: T) -> Result<T>
    where
        T: Serialize + for<'de> Deserialize<'de>,
    {
        let serialized = self.encode(&value)?;
        if self
            .db
            .compare_and_swap(CompareAndSwap::new(&self.scope, None, serialized))?
        {
            return Ok(value);
        }
        self.read()?
            .ok_or_else(|| anyhow!("{} vanished after a failed insert", self.scope_str()))
    }

    /// Get the scope as a string
    pub fn get_scope(&self) -> Result<Cow<'_, str>> {
        Ok(String::from_utf8_lossy(&self.scope))
    }

    fn scope_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.scope)
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value)
            .with_context(|| anyhow!("Could not serialize value passed to {}", self.scope_str()))
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        bincode::deserialize(bytes)
            .with_context(|| anyhow!("Could not deserialize value at {}", self.scope_str()))
    }

    /// Changes the scope for the data store.
    /// Note that if the scope does not start with a slash one is appended.
    /// ```
    /// use eg_data::DataStore;
    /// use anyhow::Result;
    ///
    /// fn main() -> Result<()> {
    ///   let store = DataStore::in_mem();
    ///   assert_eq!(store.base("//foo")
    ///     .scope("bar")
    ///     .scope("/baz")
    ///     .get_scope()?, "//foo/bar/baz");
    ///   Ok(())
    /// }
    /// ```
    pub fn scope<K: IntoKey>(&self, key: K) -> Self {
        let mut scope = self.scope.clone();
        let encoded_key = key.into_key();
        if !encoded_key.starts_with(b"/") {
            scope.extend("/".into_key());
        }
        scope.extend(encoded_key);
        Self {
            db: self.db.clone(),
            scope,
        }
    }

    /// New handle over the same store whose scope is replaced by `key`.
    pub fn base<K: IntoKey>(&self, key: K) -> Self {
        Self {
            db: self.db.clone(),
            scope: key.into_key(),
        }
    }
}
