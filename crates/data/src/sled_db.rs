// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use sled::Tree;
use std::path::Path;

use crate::{
    sled_utils::{clear_all_caches, get_or_open_db_tree},
    CompareAndSwap, Get, Insert, KeyValStore, Remove, ScanPrefix,
};

pub struct SledDb {
    db: Tree,
}

impl SledDb {
    pub fn new(path: &Path, tree: &str) -> Result<Self> {
        let db = get_or_open_db_tree(path, tree)?;
        Ok(Self { db })
    }

    pub fn close_all_connections() -> Result<()> {
        clear_all_caches()
    }

    pub fn flush(&self) -> Result<()> {
        self.db.flush().context("Could not flush db")?;
        Ok(())
    }
}

impl KeyValStore for SledDb {
    fn insert(&self, msg: Insert) -> Result<()> {
        self.db
            .insert(msg.key(), msg.value().to_vec())
            .context("Could not insert data into db")?;

        Ok(())
    }

    fn remove(&self, msg: Remove) -> Result<()> {
        self.db
            .remove(msg.key())
            .context("Could not remove data from db")?;
        Ok(())
    }

    fn get(&self, msg: Get) -> Result<Option<Vec<u8>>> {
        let key = msg.key();
        let res = self
            .db
            .get(key)
            .with_context(|| format!("Failed to fetch {}", String::from_utf8_lossy(key)))?;

        Ok(res.map(|v| v.to_vec()))
    }

    fn compare_and_swap(&self, msg: CompareAndSwap) -> Result<bool> {
        let res = self
            .db
            .compare_and_swap(
                msg.key(),
                msg.expected().map(|v| v.as_slice()),
                Some(msg.value().as_slice()),
            )
            .with_context(|| {
                format!(
                    "Could not compare and swap {}",
                    String::from_utf8_lossy(msg.key())
                )
            })?;
        Ok(res.is_ok())
    }

    fn scan_prefix(&self, msg: ScanPrefix) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        self.db
            .scan_prefix(msg.prefix())
            .map(|item| {
                let (k, v) = item.context("Could not scan db")?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_sled_db_caching() -> Result<()> {
        let temp_dir = tempdir()?;
        let db_path = temp_dir.path().join("test_cache.db");

        let db1 = SledDb::new(&db_path, "datastore")?;
        db1.insert(Insert::new(b"test_key".to_vec(), b"test_value".to_vec()))?;

        // A second handle to the same path shares the cached Db
        let db2 = SledDb::new(&db_path, "datastore")?;
        assert_eq!(
            db2.get(Get::new(b"test_key".to_vec()))?,
            Some(b"test_value".to_vec())
        );

        db2.insert(Insert::new(b"key2".to_vec(), b"value2".to_vec()))?;
        assert_eq!(
            db1.get(Get::new(b"key2".to_vec()))?,
            Some(b"value2".to_vec())
        );

        let other = SledDb::new(&temp_dir.path().join("other.db"), "datastore")?;
        assert!(other.get(Get::new(b"test_key".to_vec()))?.is_none());
        Ok(())
    }

    #[test]
    fn test_sled_compare_and_swap() -> Result<()> {
        let temp_dir = tempdir()?;
        let db = SledDb::new(&temp_dir.path().join("cas.db"), "datastore")?;

        assert!(db.compare_and_swap(CompareAndSwap::new("tally", None, b"t1".to_vec()))?);
        assert!(!db.compare_and_swap(CompareAndSwap::new("tally", None, b"t2".to_vec()))?);
        assert!(db.compare_and_swap(CompareAndSwap::new(
            "tally",
            Some(b"t1".to_vec()),
            b"t3".to_vec()
        ))?);
        assert_eq!(db.get(Get::new("tally"))?, Some(b"t3".to_vec()));
        Ok(())
    }

    #[test]
    fn test_sled_scan_prefix() -> Result<()> {
        let temp_dir = tempdir()?;
        let db = SledDb::new(&temp_dir.path().join("scan.db"), "datastore")?;
        db.insert(Insert::new("/g/0001", b"a".to_vec()))?;
        db.insert(Insert::new("/g/0002", b"b".to_vec()))?;
        db.insert(Insert::new("/h/0001", b"c".to_vec()))?;

        let keys: Vec<_> = db
            .scan_prefix(ScanPrefix::new("/g/"))?
            .into_iter()
            .map(|(k, _)| String::from_utf8_lossy(&k).into_owned())
            .collect();
        assert_eq!(keys, vec!["/g/0001", "/g/0002"]);
        Ok(())
    }
}
