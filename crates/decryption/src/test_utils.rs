// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use eg_crypto::Cipher;
use eg_data::{DataStore, Repositories};
use eg_test_helpers::{mock_key_backup, mock_public_key, mock_user_id, MockCryptoService};

pub use eg_test_helpers::ballots_for;

use crate::{
    ChoiceSetup, CredentialDelivery, CredentialFile, DecryptionContext, DecryptionError, Election,
    ElectionSetup, ElectionStatus, GuardianSetup, LoggingCredentialDelivery, Onboarding,
    TallyBuilder,
};

pub struct TestHarness {
    pub ctx: DecryptionContext,
    pub crypto: Arc<MockCryptoService>,
    pub onboarding: Onboarding,
    pub tally: TallyBuilder,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_delivery(Arc::new(LoggingCredentialDelivery)).await
    }

    pub async fn with_delivery(delivery: Arc<dyn CredentialDelivery>) -> Result<Self> {
        let crypto = Arc::new(MockCryptoService::new());
        let ctx = DecryptionContext::new(
            Repositories::new(DataStore::in_mem()),
            crypto.clone(),
            Arc::new(Cipher::from_password("test password").await?),
            Duration::from_secs(5),
        );
        Ok(Self {
            onboarding: Onboarding::new(&ctx, delivery),
            tally: TallyBuilder::new(&ctx),
            crypto,
            ctx,
        })
    }

    pub async fn register(&self, setup: ElectionSetup) -> Result<Election, DecryptionError> {
        self.onboarding.register_election(setup).await
    }

    pub async fn cast(&self, ballots: &[String]) -> Result<(), DecryptionError> {
        for ballot in ballots {
            self.onboarding.cast_ballot("e1", ballot).await?;
        }
        Ok(())
    }
}

/// Election `e1` that ended an hour ago, Alice (Blue) against Bob (Red)
pub fn setup_with(guardians: u32, quorum: u32) -> ElectionSetup {
    ElectionSetup {
        id: "e1".into(),
        name: "Board election".into(),
        quorum,
        joint_public_key: "joint-key".into(),
        commitment_hash: "commitment".into(),
        status: ElectionStatus::Active,
        ends_at: Some(Utc::now() - ChronoDuration::hours(1)),
        admin: Some("admin".into()),
        choices: vec![
            ChoiceSetup {
                candidate_name: "Alice".into(),
                party_name: "Blue".into(),
            },
            ChoiceSetup {
                candidate_name: "Bob".into(),
                party_name: "Red".into(),
            },
        ],
        guardians: (1..=guardians)
            .map(|seq| GuardianSetup {
                user_id: mock_user_id(seq),
                sequence_order: seq,
                public_key: mock_public_key(seq),
                key_backup: mock_key_backup(seq),
            })
            .collect(),
    }
}

#[derive(Default)]
pub struct RecordingDelivery {
    files: Mutex<Vec<CredentialFile>>,
}

impl RecordingDelivery {
    pub fn delivered(&self) -> Vec<CredentialFile> {
        self.files.lock().map(|f| f.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CredentialDelivery for RecordingDelivery {
    async fn deliver(&self, file: &CredentialFile) -> Result<()> {
        self.files
            .lock()
            .map_err(|_| anyhow::anyhow!("poisoned"))?
            .push(file.clone());
        Ok(())
    }
}
