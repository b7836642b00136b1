// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use chrono::{DateTime, Utc};
use eg_crypto::SensitiveBytes;
use eg_rpc::{ElectionContext, GuardianId};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ElectionStatus {
    Draft,
    #[default]
    Active,
    Ended,
    Decrypted,
}

impl fmt::Display for ElectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Ended => "ended",
            Self::Decrypted => "decrypted",
        };
        f.write_str(name)
    }
}

/// Whether building a tally checks that voting is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndCheck {
    Enforce,
    /// Only for builds triggered internally by a guardian submission.
    Bypass,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub candidate_name: String,
    pub party_name: String,
    pub vote_count: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: String,
    pub name: String,
    pub quorum: u32,
    pub guardian_count: u32,
    pub joint_public_key: String,
    pub commitment_hash: String,
    /// Set at most once
    pub encrypted_tally: Option<String>,
    pub status: ElectionStatus,
    pub ends_at: Option<DateTime<Utc>>,
    pub admin: Option<String>,
    /// Creation order. Vote attribution downstream is positional.
    pub choices: Vec<Choice>,
}

impl Election {
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            ElectionStatus::Ended | ElectionStatus::Decrypted => true,
            ElectionStatus::Draft | ElectionStatus::Active => {
                self.ends_at.is_some_and(|ends_at| ends_at <= now)
            }
        }
    }

    pub fn is_decrypted(&self) -> bool {
        self.status == ElectionStatus::Decrypted
    }

    pub fn party_names(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.party_name.clone()).collect()
    }

    pub fn candidate_names(&self) -> Vec<String> {
        self.choices.iter().map(|c| c.candidate_name.clone()).collect()
    }

    /// Parameters every crypto service call carries
    pub fn context(&self) -> ElectionContext {
        ElectionContext {
            party_names: self.party_names(),
            candidate_names: self.candidate_names(),
            joint_public_key: self.joint_public_key.clone(),
            commitment_hash: self.commitment_hash.clone(),
            guardian_count: self.guardian_count,
            quorum: self.quorum,
        }
    }

    pub fn results(&self) -> Option<ElectionResults> {
        if !self.is_decrypted() {
            return None;
        }
        Some(ElectionResults {
            election_id: self.id.clone(),
            results: self
                .choices
                .iter()
                .map(|c| CandidateResult {
                    candidate_name: c.candidate_name.clone(),
                    party_name: c.party_name.clone(),
                    votes: c.vote_count.unwrap_or_default(),
                })
                .collect(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guardian {
    pub election_id: String,
    pub user_id: String,
    pub sequence_order: GuardianId,
    pub public_key: String,
    pub key_backup: String,
    /// Hex blob also handed to the guardian as their credential file
    pub encrypted_credentials: Option<String>,
    /// Vault credentials sealed under the server cipher
    pub vault_credentials: Option<SensitiveBytes>,
    pub decryption_public_key: Option<String>,
    pub tally_share: Option<String>,
    pub ballot_shares: Vec<String>,
    pub submitted_at: Option<DateTime<Utc>>,
}

impl Guardian {
    pub fn submitted(&self) -> bool {
        self.tally_share.is_some()
    }
}

/// A decryption share computed on behalf of a guardian who never submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompensatedShare {
    pub election_id: String,
    pub missing_guardian_sequence: GuardianId,
    pub compensating_guardian_sequence: GuardianId,
    pub compensated_tally_share: String,
    pub compensated_ballot_shares: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// The row the combiner uses for a missing guardian: lowest compensating sequence wins.
pub fn canonical_share(rows: &[CompensatedShare]) -> Option<&CompensatedShare> {
    rows.iter().min_by_key(|r| r.compensating_guardian_sequence)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedTally {
    pub election_id: String,
    pub tally_ciphertext: String,
    pub ballot_ciphertexts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResult {
    pub candidate_name: String,
    pub party_name: String,
    pub votes: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionResults {
    pub election_id: String,
    pub results: Vec<CandidateResult>,
}

impl ElectionResults {
    pub fn votes_for(&self, candidate_name: &str) -> Option<u64> {
        self.results
            .iter()
            .find(|r| r.candidate_name == candidate_name)
            .map(|r| r.votes)
    }

    pub fn total(&self) -> u64 {
        self.results.iter().map(|r| r.votes).sum()
    }
}

/// Election description accepted by `register_election`, usually read from yaml.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElectionSetup {
    pub id: String,
    pub name: String,
    pub quorum: u32,
    pub joint_public_key: String,
    pub commitment_hash: String,
    #[serde(default)]
    pub status: ElectionStatus,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admin: Option<String>,
    pub choices: Vec<ChoiceSetup>,
    pub guardians: Vec<GuardianSetup>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceSetup {
    pub candidate_name: String,
    pub party_name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardianSetup {
    pub user_id: String,
    pub sequence_order: GuardianId,
    pub public_key: String,
    pub key_backup: String,
}

/// What a guardian downloads after credentials are issued.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialFile {
    pub election_id: String,
    pub guardian_user_id: String,
    pub sequence_order: GuardianId,
    pub contents: String,
}

impl CredentialFile {
    pub fn file_name(&self) -> String {
        format!(
            "guardian-{}-{}.credentials",
            self.election_id, self.sequence_order
        )
    }
}
