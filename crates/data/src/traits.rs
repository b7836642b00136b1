// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;

use crate::{CompareAndSwap, Get, Insert, Remove, ScanPrefix};

/// Byte level storage backend shared between every `DataStore` handle.
/// Implementations must be safe to call from many tasks at once.
pub trait KeyValStore: Send + Sync {
    fn insert(&self, msg: Insert) -> Result<()>;
    fn remove(&self, msg: Remove) -> Result<()>;
    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>>;

    /// Atomically swap the value at the key. Returns `false` when the current value did not match
    /// the expectation and nothing was written.
    fn compare_and_swap(&self, msg: CompareAndSwap) -> Result<bool>;

    /// Return every (key, value) pair whose key starts with the prefix, in key order.
    fn scan_prefix(&self, msg: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>>;
}
