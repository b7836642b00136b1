// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// A holder for sensitive data that zeroizes on drop
#[derive(ZeroizeOnDrop)]
struct SecretHolder {
    data: Zeroizing<Vec<u8>>,
    purged: bool,
}

impl SecretHolder {
    fn purge(&mut self) {
        self.data.zeroize();
        self.purged = true;
    }

    fn update(&mut self, new_data: Zeroizing<Vec<u8>>) {
        self.data.zeroize();
        self.data = new_data;
        self.purged = false;
    }
}

/// Keeps a secret in memory and wipes it after `timeout` without access.
/// Every access pushes the deadline back.
pub struct TimedSecretHolder {
    secret: Arc<Mutex<SecretHolder>>,
    touch: watch::Sender<()>,
}

impl TimedSecretHolder {
    /// Must be called from within a tokio runtime.
    pub fn new(data: Zeroizing<Vec<u8>>, timeout: Duration) -> Self {
        let secret = Arc::new(Mutex::new(SecretHolder {
            data,
            purged: false,
        }));
        let (touch, mut touched) = watch::channel(());

        let weak = Arc::downgrade(&secret);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = sleep(timeout) => {
                        let Some(secret) = weak.upgrade() else { break };
                        if let Ok(mut guard) = secret.try_lock() {
                            debug!("Purging key data from memory");
                            guard.purge();
                        }
                        // Wait for the next access before arming the timer again
                        if touched.changed().await.is_err() {
                            break;
                        }
                    }
                    res = touched.changed() => {
                        if res.is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Self { secret, touch }
    }

    /// Run `f` against the secret. Returns `None` when the secret has been purged.
    pub fn access<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Zeroizing<Vec<u8>>) -> R,
    {
        let guard = self.secret.lock().ok()?;
        if guard.purged {
            return None;
        }
        let result = f(&guard.data);
        let _ = self.touch.send(());
        Some(result)
    }

    pub fn update(&self, new_data: Zeroizing<Vec<u8>>) {
        if let Ok(mut guard) = self.secret.lock() {
            guard.update(new_data);
        }
        let _ = self.touch.send(());
    }

    pub fn purge(&self) {
        if let Ok(mut guard) = self.secret.lock() {
            guard.purge();
        }
    }
}
