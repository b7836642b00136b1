// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{
    password_manager::{EnvPasswordManager, InMemPasswordManager, PasswordManager},
    secret_holder::TimedSecretHolder,
    FilePasswordManager,
};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use eg_config::AppConfig;
use rand::{rngs::OsRng, RngCore};
use std::{path::Path, time::Duration};
use zeroize::{Zeroize, Zeroizing};

// ARGON2 PARAMS
// https://cheatsheetseries.owasp.org/cheatsheets/Password_Storage_Cheat_Sheet.html
const ARGON2_M_COST: u32 = 19 * 1024; // 19 MiB
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

// AES PARAMS
pub(crate) const AES_SALT_LEN: usize = 32;
pub(crate) const AES_NONCE_LEN: usize = 12;

/// Seconds of inactivity after which the cached key is wiped
const PURGE_TIME_SECONDS: u64 = 120;

/// Derives a 256 bit key from a password with Argon2id.
fn argon2_derive_key(
    password_bytes: &Zeroizing<Vec<u8>>,
    salt: &[u8],
) -> Result<Zeroizing<Vec<u8>>> {
    let mut derived_key = Zeroizing::new(vec![0u8; ARGON2_OUTPUT_LEN]);
    let params = Params::new(
        ARGON2_M_COST,
        ARGON2_T_COST,
        ARGON2_P_COST,
        Some(ARGON2_OUTPUT_LEN),
    )
    .map_err(|_| anyhow!("Could not create params"))?;

    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(password_bytes, salt, &mut derived_key)
        .map_err(|_| anyhow!("Key derivation error"))?;

    Ok(derived_key)
}

/// AES-256-GCM seal. Output layout is `[nonce][ciphertext]`.
pub(crate) fn aes_seal(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut nonce_bytes = [0u8; AES_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!(e))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|_| anyhow!("Could not AES Encrypt given plaintext."))?;

    let mut output = Vec::with_capacity(AES_NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce_bytes);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Opens data produced by [`aes_seal`]. Fails on a wrong key or any tampering.
pub(crate) fn aes_open(key: &[u8], sealed: &[u8]) -> Result<Vec<u8>> {
    if sealed.len() < AES_NONCE_LEN {
        return Err(anyhow!("Invalid encrypted data length"));
    }
    let (nonce, ciphertext) = sealed.split_at(AES_NONCE_LEN);
    let cipher = Aes256Gcm::new_from_slice(key).map_err(|e| anyhow!(e))?;
    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| anyhow!("Could not decrypt data"))
}

/// Layout `[salt][nonce][ciphertext]`. The input is zeroized once sealed.
fn encrypt_data(password_bytes: &Zeroizing<Vec<u8>>, data: &mut Vec<u8>) -> Result<Vec<u8>> {
    let mut salt = [0u8; AES_SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    let derived_key = argon2_derive_key(password_bytes, &salt)?;
    let sealed = aes_seal(&derived_key, data)?;
    data.zeroize();

    let mut output = Vec::with_capacity(salt.len() + sealed.len());
    output.extend_from_slice(&salt);
    output.extend_from_slice(&sealed);
    Ok(output)
}

fn decrypt_data(password_bytes: &Zeroizing<Vec<u8>>, encrypted_data: &[u8]) -> Result<Vec<u8>> {
    if encrypted_data.len() < AES_SALT_LEN + AES_NONCE_LEN {
        return Err(anyhow!("Invalid encrypted data length"));
    }
    let (salt, sealed) = encrypted_data.split_at(AES_SALT_LEN);
    let derived_key = argon2_derive_key(password_bytes, salt)?;
    aes_open(&derived_key, sealed)
}

/// Server side secret encryption.
///
/// Data is sealed with AES-256-GCM under a key stretched from the server password with Argon2id.
/// Every call draws a fresh salt and nonce so the same plaintext never encrypts the same way twice.
/// The password is cached in memory and wiped after a period without use, after which it is
/// fetched again from the `PasswordManager`.
///
/// ```
/// # use anyhow::Result;
/// # use eg_crypto::*;
/// # #[tokio::main]
/// # async fn main() -> Result<()> {
/// let cipher = Cipher::from_password("my-secret-password").await?;
/// let encrypted = cipher.encrypt_data(&mut b"vault token".to_vec())?;
/// assert_eq!(cipher.decrypt_data(&encrypted)?, b"vault token");
/// # Ok(())
/// # }
/// ```
pub struct Cipher {
    key: TimedSecretHolder,
    pm: Box<dyn PasswordManager>,
}

impl Cipher {
    pub async fn new<P>(pm: P) -> Result<Self>
    where
        P: PasswordManager + 'static,
    {
        let key =
            TimedSecretHolder::new(pm.get_key().await?, Duration::from_secs(PURGE_TIME_SECONDS));
        Ok(Self {
            key,
            pm: Box::new(pm),
        })
    }

    pub async fn from_password(value: &str) -> Result<Self> {
        Self::new(InMemPasswordManager::from_str(value)).await
    }

    /// Read the password from the named environment variable
    pub async fn from_env(value: &str) -> Result<Self> {
        Self::new(EnvPasswordManager::new(value)?).await
    }

    pub async fn from_file(value: impl AsRef<Path>) -> Result<Self> {
        Self::new(FilePasswordManager::new(value)).await
    }

    /// Use the key file named in the configuration
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(FilePasswordManager::new(config.key_file())).await
    }

    /// Run `op` against the key, reloading it from the password manager if it was purged.
    pub fn with_key<F, R>(&self, operation_name: &str, mut op: F) -> Result<R>
    where
        F: FnMut(&Zeroizing<Vec<u8>>) -> R,
    {
        if let Some(result) = self.key.access(&mut op) {
            return Ok(result);
        }

        self.key.update(self.pm.get_key_sync()?);

        self.key
            .access(&mut op)
            .ok_or_else(|| anyhow!("Could not complete {}: key update failed", operation_name))
    }

    /// Encrypt `data`, zeroizing it afterwards. Output is `[salt][nonce][ciphertext]`.
    pub fn encrypt_data(&self, data: &mut Vec<u8>) -> Result<Vec<u8>> {
        self.with_key("encryption", |key| encrypt_data(key, data))?
    }

    pub fn decrypt_data(&self, encrypted_data: &[u8]) -> Result<Vec<u8>> {
        self.with_key("decryption", |key| decrypt_data(key, encrypted_data))?
    }
}

impl Zeroize for Cipher {
    fn zeroize(&mut self) {
        self.key.purge();
    }
}
