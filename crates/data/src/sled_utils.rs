// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use sled::{Db, Tree};
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tracing::info;

// Process wide handle cache. sled refuses a second open of the same file.
static SLED_CACHE: Lazy<Arc<Mutex<HashMap<String, Db>>>> =
    Lazy::new(|| Arc::new(Mutex::new(HashMap::new())));

// Canonicalizes the parent directory if the target path does not yet exist.
fn canonical_key(path: &Path) -> String {
    if path.exists() {
        return path
            .canonicalize()
            .unwrap_or_else(|_| path.to_path_buf())
            .to_string_lossy()
            .into_owned();
    }
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let base: PathBuf = parent
        .canonicalize()
        .unwrap_or_else(|_| parent.to_path_buf());
    let tail = path.file_name().map(|s| s.to_owned()).unwrap_or_default();
    base.join(tail).to_string_lossy().into_owned()
}

fn get_or_open_db(path: &Path) -> Result<Db> {
    std::fs::create_dir_all(path)
        .with_context(|| format!("Could not create db directory '{}'", path.display()))?;
    let key = canonical_key(path);
    let mut cache = SLED_CACHE
        .lock()
        .map_err(|_| anyhow!("sled cache lock was poisoned"))?;
    if let Some(db) = cache.get(&key) {
        return Ok(db.clone());
    }
    let db = sled::open(path)
        .with_context(|| format!("Could not open database at path '{}'", path.display()))?;
    cache.insert(key, db.clone());
    if db.was_recovered() {
        info!("recovered db at: {:?}", path);
    } else {
        info!("created db at: {:?}", path);
    }

    Ok(db)
}

pub fn get_or_open_db_tree(path: &Path, tree: &str) -> Result<Tree> {
    let db = get_or_open_db(path)?;
    db.open_tree(tree)
        .with_context(|| format!("Could not open tree '{}'", tree))
}

pub fn clear_all_caches() -> Result<()> {
    SLED_CACHE
        .lock()
        .map_err(|_| anyhow!("sled cache lock was poisoned"))?
        .clear();
    Ok(())
}
