// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::sync::Arc;

use anyhow::{Context, Result};
use eg_config::AppConfig;
use eg_crypto::{Cipher, EncryptedBlob};
use eg_data::{DataStore, Repositories};
use eg_rpc::{CryptoService, GuardianId, HttpCryptoService};
use tracing::info;

use crate::{
    decryption_status, CredentialDelivery, CredentialFile, DecryptionContext, DecryptionError,
    DecryptionStatus, Election, ElectionResults, ElectionSetup, EncryptedTally, EndCheck,
    LoggingCredentialDelivery, Onboarding, PartialDecryptionExecutor, QuorumCombiner,
    SubmissionReceipt, TallyBuilder,
};

/// Entry point for every user facing decryption operation.
#[derive(Clone)]
pub struct Coordinator {
    ctx: DecryptionContext,
    onboarding: Onboarding,
    tally: TallyBuilder,
    executor: PartialDecryptionExecutor,
    combiner: QuorumCombiner,
}

impl Coordinator {
    pub fn new(ctx: DecryptionContext, delivery: Arc<dyn CredentialDelivery>) -> Self {
        Self {
            onboarding: Onboarding::new(&ctx, delivery),
            tally: TallyBuilder::new(&ctx),
            executor: PartialDecryptionExecutor::new(&ctx),
            combiner: QuorumCombiner::new(&ctx),
            ctx,
        }
    }

    /// Wire the store, cipher and crypto service described by the config.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let store = if config.use_in_mem_store() {
            DataStore::in_mem()
        } else {
            DataStore::sled(&config.db_file())
                .with_context(|| format!("Could not open store at {}", config.db_file().display()))?
        };
        let cipher = Cipher::from_config(config).await?;
        let crypto: Arc<dyn CryptoService> =
            Arc::new(HttpCryptoService::from_config(config.crypto_service())?);
        info!(
            name = %config.name(),
            crypto_service = %config.crypto_service().url,
            in_mem = config.use_in_mem_store(),
            "coordinator ready"
        );
        let ctx = DecryptionContext::new(
            Repositories::new(store),
            crypto,
            Arc::new(cipher),
            config.rpc_timeout(),
        );
        Ok(Self::new(ctx, Arc::new(LoggingCredentialDelivery)))
    }

    pub fn context(&self) -> &DecryptionContext {
        &self.ctx
    }

    pub async fn register_election(&self, setup: ElectionSetup) -> Result<Election, DecryptionError> {
        self.onboarding.register_election(setup).await
    }

    pub async fn issue_credentials(
        &self,
        election_id: &str,
        sequence: GuardianId,
        private_key: &str,
        polynomial: &str,
    ) -> Result<CredentialFile, DecryptionError> {
        self.onboarding
            .issue_credentials(election_id, sequence, private_key, polynomial)
            .await
    }

    pub async fn cast_ballot(&self, election_id: &str, ciphertext: &str) -> Result<usize, DecryptionError> {
        self.onboarding.cast_ballot(election_id, ciphertext).await
    }

    /// Administrator request. Always checks that voting is over.
    pub async fn build_tally(&self, election_id: &str) -> Result<EncryptedTally, DecryptionError> {
        self.tally.build_tally(election_id, EndCheck::Enforce).await
    }

    pub async fn submit_partial_decryption(
        &self,
        election_id: &str,
        user_id: &str,
        blob: &EncryptedBlob,
    ) -> Result<SubmissionReceipt, DecryptionError> {
        self.executor
            .submit_partial_decryption(election_id, user_id, blob)
            .await
    }

    pub async fn combine(&self, election_id: &str) -> Result<ElectionResults, DecryptionError> {
        self.combiner.combine(election_id).await
    }

    pub fn status(&self, election_id: &str) -> Result<DecryptionStatus, DecryptionError> {
        decryption_status(&self.ctx, election_id)
    }
}
