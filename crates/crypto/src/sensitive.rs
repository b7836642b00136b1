// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::Cipher;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Bytes that are only ever held encrypted under the server `Cipher`.
/// The type tells readers the value is ciphertext, eg. a guardian's vault credentials at rest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensitiveBytes {
    encrypted: Arc<Vec<u8>>,
}

impl SensitiveBytes {
    pub fn new(input: impl Into<Vec<u8>>, cipher: &Cipher) -> Result<Self> {
        let mut bytes = input.into();
        let encrypted = cipher.encrypt_data(&mut bytes)?;
        Ok(Self {
            encrypted: Arc::new(encrypted),
        })
    }

    /// Decrypt into a container that wipes itself on drop
    pub fn access(&self, cipher: &Cipher) -> Result<Zeroizing<Vec<u8>>> {
        Ok(Zeroizing::new(cipher.decrypt_data(&self.encrypted)?))
    }

    /// Decrypt and interpret as utf8
    pub fn access_str(&self, cipher: &Cipher) -> Result<Zeroizing<String>> {
        let bytes = self.access(cipher)?;
        Ok(Zeroizing::new(String::from_utf8(bytes.to_vec())?))
    }
}
