// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{CompareAndSwap, Get, Insert, KeyValStore, Remove, ScanPrefix};
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataOp {
    Insert(Insert),
    Remove(Remove),
}

struct Inner {
    db: BTreeMap<Vec<u8>, Vec<u8>>,
    log: Vec<DataOp>,
    capture: bool,
}

impl Inner {
    fn record(&mut self, op: DataOp) {
        if self.capture {
            self.log.push(op);
        }
    }
}

/// BTreeMap backed store used for tests and `in_mem_store` deployments.
/// When `capture` is set every write is recorded and can be read back with `get_log`.
pub struct InMemStore {
    inner: Mutex<Inner>,
}

impl InMemStore {
    pub fn new(capture: bool) -> Self {
        Self {
            inner: Mutex::new(Inner {
                db: BTreeMap::new(),
                log: vec![],
                capture,
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("InMemStore lock was poisoned"))
    }

    pub fn get_log(&self) -> Result<Vec<DataOp>> {
        Ok(self.lock()?.log.clone())
    }

    pub fn get_dump(&self) -> Result<Vec<u8>> {
        let inner = self.lock()?;
        bincode::serialize(&inner.db).context("Error serializing BTreeMap")
    }

    /// Construct an InMemStore from a bincode-serialized database produced by `get_dump`.
    pub fn from_dump(db: Vec<u8>, capture: bool) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(Inner {
                db: bincode::deserialize(&db).context("Error deserializing BTreeMap")?,
                log: vec![],
                capture,
            }),
        })
    }
}

impl KeyValStore for InMemStore {
    fn insert(&self, msg: Insert) -> Result<()> {
        let mut inner = self.lock()?;
        inner.db.insert(msg.key().to_vec(), msg.value().to_vec());
        inner.record(DataOp::Insert(msg));
        Ok(())
    }

    fn remove(&self, msg: Remove) -> Result<()> {
        let mut inner = self.lock()?;
        inner.db.remove(msg.key());
        inner.record(DataOp::Remove(msg));
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        Ok(self.lock()?.db.get(msg.key()).cloned())
    }

    fn compare_and_swap(&self, msg: CompareAndSwap) -> Result<bool> {
        let mut inner = self.lock()?;
        if inner.db.get(msg.key()) != msg.expected() {
            return Ok(false);
        }
        inner.db.insert(msg.key().to_vec(), msg.value().to_vec());
        inner.record(DataOp::Insert(msg.into()));
        Ok(true)
    }

    fn scan_prefix(&self, msg: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let inner = self.lock()?;
        let prefix = msg.prefix();
        Ok(inner
            .db
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
