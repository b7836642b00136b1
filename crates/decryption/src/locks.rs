// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use eg_rpc::GuardianId;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Names of the critical sections
pub struct LockKey;

impl LockKey {
    pub fn tally(election_id: &str) -> String {
        format!("tally/{election_id}")
    }

    pub fn combine(election_id: &str) -> String {
        format!("combine/{election_id}")
    }

    pub fn guardian(election_id: &str, sequence: GuardianId) -> String {
        format!("guardian/{election_id}/{sequence}")
    }
}

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// In-process async locks keyed by name. Holders of different keys never wait on each other.
///
/// A key's entry lives only while someone holds or waits for it, so the map stays bounded by
/// the number of in-flight operations.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    locks: LockMap,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, key: impl Into<String>) -> KeyedGuard {
        let key = key.into();
        let slot = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks.entry(key.clone()).or_default().clone()
        };
        KeyedGuard {
            guard: Some(slot.lock_owned().await),
            key,
            locks: self.locks.clone(),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for KeyedLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyedLocks").finish_non_exhaustive()
    }
}

/// Held lock. Releasing the last interest in a key drops its entry.
pub struct KeyedGuard {
    guard: Option<OwnedMutexGuard<()>>,
    key: String,
    locks: LockMap,
}

impl Drop for KeyedGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        // Waiters clone the slot under the map lock, so a count of one means only the map holds it
        let idle = locks
            .get(&self.key)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            locks.remove(&self.key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_serializes() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(LockKey::tally("e1")).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.lock(LockKey::tally("e1")).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .expect("lock released")
            .expect("task ran");
    }

    #[tokio::test]
    async fn test_released_keys_are_evicted() {
        let locks = KeyedLocks::new();
        let a = locks.lock(LockKey::guardian("e1", 1)).await;
        let b = locks.lock(LockKey::guardian("e1", 2)).await;
        assert_eq!(locks.len(), 2);
        drop(a);
        assert_eq!(locks.len(), 1);
        drop(b);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_entry_survives_while_awaited() {
        let locks = KeyedLocks::new();
        let guard = locks.lock(LockKey::combine("e1")).await;

        let (acquired_tx, acquired_rx) = tokio::sync::oneshot::channel();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.lock(LockKey::combine("e1")).await;
            let _ = acquired_tx.send(());
            let _ = release_rx.await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        drop(guard);
        assert_eq!(locks.len(), 1);
        acquired_rx.await.expect("contender acquired");
        assert_eq!(locks.len(), 1);

        release_tx.send(()).expect("contender waiting");
        waiting.await.expect("task ran");
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn test_different_keys_do_not_block() {
        let locks = KeyedLocks::new();
        let _a = locks.lock(LockKey::guardian("e1", 1)).await;
        let b = tokio::time::timeout(
            Duration::from_millis(100),
            locks.lock(LockKey::guardian("e1", 2)),
        )
        .await;
        assert!(b.is_ok());
    }
}
