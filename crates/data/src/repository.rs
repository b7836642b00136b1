// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{marker::PhantomData, ops::Deref};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::{DataStore, Mutation};

/// A `DataStore` pinned to a single value type.
pub struct Repository<S> {
    store: DataStore,
    _p: PhantomData<S>,
}

impl<S> Repository<S> {
    pub fn new(store: DataStore) -> Self {
        Self {
            store,
            _p: PhantomData,
        }
    }
}

impl<S> Deref for Repository<S> {
    type Target = DataStore;
    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<S> From<Repository<S>> for DataStore {
    fn from(value: Repository<S>) -> Self {
        value.store
    }
}

impl<S> From<&Repository<S>> for DataStore {
    fn from(value: &Repository<S>) -> Self {
        value.store.clone()
    }
}

/// Clone without phantom data
impl<S> Clone for Repository<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _p: PhantomData,
        }
    }
}

impl<T> Repository<T>
where
    T: for<'de> Deserialize<'de> + Serialize,
{
    pub fn read(&self) -> Result<Option<T>> {
        self.store.read()
    }

    pub fn write(&self, value: &T) -> Result<()> {
        self.store.write(value)
    }

    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    pub fn try_mutate<R, F>(&self, f: F) -> Result<R>
    where
        F: FnMut(Option<T>) -> Result<Mutation<T, R>>,
    {
        self.store.try_mutate(f)
    }

    pub fn set_if_absent(&self, value: T) -> Result<T> {
        self.store.set_if_absent(value)
    }
}
