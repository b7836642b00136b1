// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{sync::Arc, time::Duration};

use eg_crypto::{Cipher, CredentialVault, EncryptedBlob, GuardianSecrets, VaultCredentials};
use eg_data::Repositories;
use eg_rpc::{CryptoService, GuardianId};
use tracing::warn;

use crate::{
    repo::{BallotRepositoryFactory, ElectionRepositoryFactory, GuardianRepositoryFactory},
    DecryptionError, Election, Guardian, KeyedLocks,
};

/// Everything the decryption components share.
#[derive(Clone)]
pub struct DecryptionContext {
    pub repositories: Repositories,
    pub crypto: Arc<dyn CryptoService>,
    pub cipher: Arc<Cipher>,
    pub locks: KeyedLocks,
    pub rpc_timeout: Duration,
}

impl DecryptionContext {
    pub fn new(
        repositories: Repositories,
        crypto: Arc<dyn CryptoService>,
        cipher: Arc<Cipher>,
        rpc_timeout: Duration,
    ) -> Self {
        Self {
            repositories,
            crypto,
            cipher,
            locks: KeyedLocks::new(),
            rpc_timeout,
        }
    }

    pub fn election(&self, election_id: &str) -> Result<Election, DecryptionError> {
        self.repositories
            .election(election_id)
            .read()?
            .ok_or_else(|| DecryptionError::ElectionNotFound(election_id.to_string()))
    }

    pub fn guardian(
        &self,
        election_id: &str,
        sequence: GuardianId,
    ) -> Result<Guardian, DecryptionError> {
        self.repositories
            .guardian(election_id, sequence)
            .read()?
            .ok_or(DecryptionError::NotAGuardian)
    }

    pub fn guardian_for_user(
        &self,
        election_id: &str,
        user_id: &str,
    ) -> Result<Guardian, DecryptionError> {
        self.repositories
            .guardians(election_id)?
            .into_iter()
            .find(|g| g.user_id == user_id)
            .ok_or(DecryptionError::NotAGuardian)
    }

    pub fn submitted_ballots(&self, election_id: &str) -> Result<Vec<String>, DecryptionError> {
        Ok(self
            .repositories
            .submitted_ballots(election_id)
            .read()?
            .unwrap_or_default())
    }

    /// Open a guardian's credential file with the credentials held for them on the server.
    /// Every failure reads the same to the caller.
    pub fn open_credentials(
        &self,
        guardian: &Guardian,
        blob: &EncryptedBlob,
    ) -> Result<GuardianSecrets, DecryptionError> {
        let Some(sealed) = &guardian.vault_credentials else {
            warn!(guardian = guardian.sequence_order, "no credentials issued");
            return Err(DecryptionError::CredentialDecryption);
        };
        let credentials = sealed.access_str(&self.cipher).map_err(|e| {
            warn!(guardian = guardian.sequence_order, error = %e, "could not unseal vault credentials");
            DecryptionError::CredentialDecryption
        })?;
        let credentials = VaultCredentials::from_hex(credentials.as_str());
        CredentialVault::decrypt(blob, &credentials).map_err(|e| {
            warn!(guardian = guardian.sequence_order, error = %e, "credential file rejected");
            DecryptionError::CredentialDecryption
        })
    }
}
