// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Shared setup for the integration suite.

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::{Duration as ChronoDuration, Utc};
use eg_crypto::{Cipher, EncryptedBlob};
use eg_data::{DataStore, Repositories};
use eg_decryption::{
    ChoiceSetup, Coordinator, DecryptionContext, DecryptionError, ElectionSetup, ElectionStatus,
    GuardianSetup, LoggingCredentialDelivery, SubmissionReceipt,
};
use eg_rpc::GuardianId;
use eg_test_helpers::{
    ballots_for, mock_key_backup, mock_polynomial, mock_private_key, mock_public_key,
    mock_user_id, MockCryptoService,
};

pub const ELECTION_ID: &str = "board-2026";

/// Crypto service timeout used by every test coordinator
pub const RPC_TIMEOUT: Duration = Duration::from_secs(2);

/// The votes every test election receives
pub fn standard_votes() -> Vec<String> {
    ballots_for(&["Alice", "Bob", "Alice", "Carol", "Alice", "Bob", "Carol"])
}

pub fn election_setup(guardians: u32, quorum: u32) -> ElectionSetup {
    ElectionSetup {
        id: ELECTION_ID.into(),
        name: "Board of trustees".into(),
        quorum,
        joint_public_key: "joint-key".into(),
        commitment_hash: "commitment".into(),
        status: ElectionStatus::Active,
        ends_at: Some(Utc::now() - ChronoDuration::minutes(5)),
        admin: Some("returning-officer".into()),
        choices: [("Alice", "Blue"), ("Bob", "Red"), ("Carol", "Green")]
            .into_iter()
            .map(|(candidate, party)| ChoiceSetup {
                candidate_name: candidate.into(),
                party_name: party.into(),
            })
            .collect(),
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

/// A registered election with credentials issued to every guardian and the standard votes cast.
pub struct TestSystem {
    pub coordinator: Coordinator,
    pub crypto: Arc<MockCryptoService>,
    pub blobs: BTreeMap<GuardianId, EncryptedBlob>,
}

impl TestSystem {
    pub async fn new(guardians: u32, quorum: u32) -> Result<Self> {
        Self::with_store(DataStore::in_mem(), guardians, quorum).await
    }

    pub async fn with_store(store: DataStore, guardians: u32, quorum: u32) -> Result<Self> {
        let crypto = Arc::new(MockCryptoService::new());
        let coordinator = coordinator(store, crypto.clone()).await?;
        coordinator
            .register_election(election_setup(guardians, quorum))
            .await?;

        let mut blobs = BTreeMap::new();
        for seq in 1..=guardians {
            let file = coordinator
                .issue_credentials(
                    ELECTION_ID,
                    seq,
                    &mock_private_key(seq),
                    &mock_polynomial(seq),
                )
                .await?;
            blobs.insert(seq, EncryptedBlob::from(file.contents));
        }
        for ballot in standard_votes() {
            coordinator.cast_ballot(ELECTION_ID, &ballot).await?;
        }
        Ok(Self {
            coordinator,
            crypto,
            blobs,
        })
    }

    pub fn blob(&self, seq: GuardianId) -> Result<&EncryptedBlob> {
        self.blobs
            .get(&seq)
            .with_context(|| format!("no credential file for guardian {seq}"))
    }

    pub async fn submit(&self, seq: GuardianId) -> Result<SubmissionReceipt, DecryptionError> {
        let blob = self
            .blobs
            .get(&seq)
            .ok_or(DecryptionError::NotAGuardian)?;
        self.coordinator
            .submit_partial_decryption(ELECTION_ID, &mock_user_id(seq), blob)
            .await
    }
}

/// Coordinator over the given store with a throwaway server password
pub async fn coordinator(store: DataStore, crypto: Arc<MockCryptoService>) -> Result<Coordinator> {
    let ctx = DecryptionContext::new(
        Repositories::new(store),
        crypto,
        Arc::new(Cipher::from_password("integration").await?),
        RPC_TIMEOUT,
    );
    Ok(Coordinator::new(ctx, Arc::new(LoggingCredentialDelivery)))
}
