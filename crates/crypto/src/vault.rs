// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Guardian credential files.
//!
//! A guardian's private key and polynomial are bundled into a delimited text document, sealed with
//! AES-256-GCM under 32 random credential bytes and handed to the guardian as a hex encoded file.
//! The credential bytes stay on the server. A submission must present the file, the server must
//! hold the credentials, and neither is useful alone.

use crate::cipher::{aes_open, aes_seal};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

const PRIVATE_KEY_MARKER: &str = "===Private Key===";
const POLYNOMIAL_MARKER: &str = "===Polynomial===";
const CREDENTIALS_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    #[error("malformed credential bundle: {0}")]
    MalformedCredential(String),
    #[error("credential file could not be decrypted with these credentials")]
    Decryption,
    #[error("invalid encoding: {0}")]
    Encoding(String),
}

/// The key material a guardian brings to a decryption.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct GuardianSecrets {
    pub private_key: String,
    pub polynomial: String,
}

impl GuardianSecrets {
    pub fn new(private_key: impl Into<String>, polynomial: impl Into<String>) -> Self {
        Self {
            private_key: private_key.into(),
            polynomial: polynomial.into(),
        }
    }
}

impl fmt::Debug for GuardianSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GuardianSecrets(..)")
    }
}

/// Hex encoded symmetric credentials. Never leave the server.
#[derive(Clone, PartialEq, Eq)]
pub struct VaultCredentials(Zeroizing<String>);

impl VaultCredentials {
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; CREDENTIALS_LEN]);
        OsRng.fill_bytes(&mut *bytes);
        Self(Zeroizing::new(hex::encode(&*bytes)))
    }

    pub fn from_hex(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }

    fn key(&self) -> Result<Zeroizing<Vec<u8>>, VaultError> {
        let key = Zeroizing::new(
            hex::decode(self.0.as_str()).map_err(|e| VaultError::Encoding(e.to_string()))?,
        );
        if key.len() != CREDENTIALS_LEN {
            return Err(VaultError::Encoding(format!(
                "credentials must be {} bytes, got {}",
                CREDENTIALS_LEN,
                key.len()
            )));
        }
        Ok(key)
    }
}

impl fmt::Debug for VaultCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultCredentials(..)")
    }
}

/// The downloadable credential file contents: hex of `[nonce][ciphertext]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob(pub String);

impl EncryptedBlob {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EncryptedBlob {
    fn from(value: String) -> Self {
        // Files are often saved with a trailing newline
        Self(value.trim().to_string())
    }
}

pub struct CredentialVault;

impl CredentialVault {
    /// Seal the secrets under freshly generated credentials.
    pub fn encrypt(
        private_key: &str,
        polynomial: &str,
    ) -> Result<(EncryptedBlob, VaultCredentials), VaultError> {
        let credentials = VaultCredentials::generate();
        let blob = Self::encrypt_with(&GuardianSecrets::new(private_key, polynomial), &credentials)?;
        Ok((blob, credentials))
    }

    pub fn encrypt_with(
        secrets: &GuardianSecrets,
        credentials: &VaultCredentials,
    ) -> Result<EncryptedBlob, VaultError> {
        let bundle = serialize_bundle(secrets)?;
        let sealed = aes_seal(&credentials.key()?, bundle.as_bytes())
            .map_err(|e| VaultError::Encoding(e.to_string()))?;
        Ok(EncryptedBlob(hex::encode(sealed)))
    }

    pub fn decrypt(
        blob: &EncryptedBlob,
        credentials: &VaultCredentials,
    ) -> Result<GuardianSecrets, VaultError> {
        let sealed = hex::decode(blob.as_str().trim()).map_err(|_| VaultError::Decryption)?;
        let plaintext =
            Zeroizing::new(aes_open(&credentials.key()?, &sealed).map_err(|_| VaultError::Decryption)?);
        let bundle = std::str::from_utf8(&plaintext)
            .map_err(|_| VaultError::MalformedCredential("bundle is not utf8".to_string()))?;
        parse_bundle(bundle)
    }
}

/// `===Private Key===\n{key}\n===Polynomial===\n{polynomial}`
pub fn serialize_bundle(secrets: &GuardianSecrets) -> Result<Zeroizing<String>, VaultError> {
    for (name, value) in [
        ("private key", &secrets.private_key),
        ("polynomial", &secrets.polynomial),
    ] {
        if value.trim().is_empty() {
            return Err(VaultError::MalformedCredential(format!("{name} is empty")));
        }
        if value.contains(PRIVATE_KEY_MARKER) || value.contains(POLYNOMIAL_MARKER) {
            return Err(VaultError::MalformedCredential(format!(
                "{name} contains a section marker"
            )));
        }
    }
    Ok(Zeroizing::new(format!(
        "{PRIVATE_KEY_MARKER}\n{}\n{POLYNOMIAL_MARKER}\n{}",
        secrets.private_key, secrets.polynomial
    )))
}

/// Inverse of [`serialize_bundle`]. The document must split into exactly three parts on the two
/// markers, in order, with nothing before the first and two non-empty fields.
pub fn parse_bundle(bundle: &str) -> Result<GuardianSecrets, VaultError> {
    let malformed = |reason: &str| VaultError::MalformedCredential(reason.to_string());

    let parts: Vec<&str> = bundle
        .split(PRIVATE_KEY_MARKER)
        .flat_map(|p| p.split(POLYNOMIAL_MARKER))
        .collect();
    if parts.len() != 3 {
        return Err(malformed("expected exactly one private key and one polynomial section"));
    }
    if !parts[0].trim().is_empty() {
        return Err(malformed("unexpected content before the private key section"));
    }
    let key_at = bundle.find(PRIVATE_KEY_MARKER);
    let poly_at = bundle.find(POLYNOMIAL_MARKER);
    if key_at > poly_at {
        return Err(malformed("sections are out of order"));
    }

    // Only the separators written by `serialize_bundle` are stripped; values are kept verbatim.
    let private_key = parts[1]
        .strip_prefix('\n')
        .and_then(|p| p.strip_suffix('\n'))
        .ok_or_else(|| malformed("private key section is not newline delimited"))?;
    let polynomial = parts[2]
        .strip_prefix('\n')
        .ok_or_else(|| malformed("polynomial section is not newline delimited"))?;
    if private_key.trim().is_empty() {
        return Err(malformed("private key is empty"));
    }
    if polynomial.trim().is_empty() {
        return Err(malformed("polynomial is empty"));
    }
    Ok(GuardianSecrets::new(private_key, polynomial))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vault_round_trip() -> Result<(), VaultError> {
        let (blob, credentials) = CredentialVault::encrypt("sk-1", "poly-1\nline two")?;
        let secrets = CredentialVault::decrypt(&blob, &credentials)?;
        assert_eq!(secrets, GuardianSecrets::new("sk-1", "poly-1\nline two"));
        Ok(())
    }

    #[test]
    fn test_round_trip_keeps_surrounding_whitespace() -> Result<(), VaultError> {
        let secrets = GuardianSecrets::new(" sk-1\t", "\npoly-1\n\n");
        let bundle = serialize_bundle(&secrets)?;
        assert_eq!(parse_bundle(&bundle)?, secrets);

        let (blob, credentials) = CredentialVault::encrypt(" sk-1\t", "\npoly-1\n\n")?;
        assert_eq!(CredentialVault::decrypt(&blob, &credentials)?, secrets);
        Ok(())
    }

    #[test]
    fn test_credentials_are_fresh_per_call() -> Result<(), VaultError> {
        let (blob_a, cred_a) = CredentialVault::encrypt("sk", "poly")?;
        let (blob_b, cred_b) = CredentialVault::encrypt("sk", "poly")?;
        assert_ne!(cred_a, cred_b);
        assert_ne!(blob_a, blob_b);
        assert_eq!(cred_a.as_hex().len(), CREDENTIALS_LEN * 2);
        Ok(())
    }

    #[test]
    fn test_wrong_credentials_fail() -> Result<(), VaultError> {
        let (blob, _) = CredentialVault::encrypt("sk-1", "poly-1")?;
        let (_, other) = CredentialVault::encrypt("sk-2", "poly-2")?;
        assert_eq!(
            CredentialVault::decrypt(&blob, &other),
            Err(VaultError::Decryption)
        );
        Ok(())
    }

    #[test]
    fn test_tampered_blob_fails() -> Result<(), VaultError> {
        let (blob, credentials) = CredentialVault::encrypt("sk-1", "poly-1")?;
        let mut bytes = hex::decode(blob.as_str()).map_err(|e| VaultError::Encoding(e.to_string()))?;
        if let Some(last) = bytes.last_mut() {
            *last ^= 0x01;
        }
        let tampered = EncryptedBlob(hex::encode(bytes));
        assert_eq!(
            CredentialVault::decrypt(&tampered, &credentials),
            Err(VaultError::Decryption)
        );
        assert_eq!(
            CredentialVault::decrypt(&EncryptedBlob("not hex".into()), &credentials),
            Err(VaultError::Decryption)
        );
        Ok(())
    }

    #[test]
    fn test_blob_from_file_contents_is_trimmed() -> Result<(), VaultError> {
        let (blob, credentials) = CredentialVault::encrypt("sk-1", "poly-1")?;
        let from_file = EncryptedBlob::from(format!("{}\n", blob.as_str()));
        assert_eq!(
            CredentialVault::decrypt(&from_file, &credentials)?.private_key,
            "sk-1"
        );
        Ok(())
    }

    #[test]
    fn test_parse_bundle_rejects_malformed() {
        let cases = [
            "",
            "===Private Key===\nkey",
            "===Private Key===\n\n===Polynomial===\npoly",
            "===Private Key===\nkey\n===Polynomial===\n",
            "===Private Key===\nkey\n===Polynomial===\npoly\n===Polynomial===\nmore",
            "===Polynomial===\npoly\n===Private Key===\nkey",
            "junk===Private Key===\nkey\n===Polynomial===\npoly",
            "===Private Key===key\n===Polynomial===\npoly",
            "===Private Key===\nkey===Polynomial===\npoly",
        ];
        for case in cases {
            assert!(
                matches!(parse_bundle(case), Err(VaultError::MalformedCredential(_))),
                "expected malformed for {case:?}"
            );
        }
    }

    #[test]
    fn test_encrypt_rejects_empty_fields() {
        assert!(matches!(
            CredentialVault::encrypt("", "poly"),
            Err(VaultError::MalformedCredential(_))
        ));
        assert!(matches!(
            CredentialVault::encrypt("key", "===Polynomial==="),
            Err(VaultError::MalformedCredential(_))
        ));
    }

    #[test]
    fn test_undelimited_plaintext_is_malformed() -> Result<(), VaultError> {
        let credentials = VaultCredentials::generate();
        let sealed = aes_seal(&credentials.key()?, b"just a key")
            .map_err(|e| VaultError::Encoding(e.to_string()))?;
        let blob = EncryptedBlob(hex::encode(sealed));
        assert!(matches!(
            CredentialVault::decrypt(&blob, &credentials),
            Err(VaultError::MalformedCredential(_))
        ));
        Ok(())
    }
}
