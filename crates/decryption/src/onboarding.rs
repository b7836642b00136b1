// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Election registration, credential issuance and ballot intake.

use std::{collections::HashSet, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use eg_crypto::{CredentialVault, SensitiveBytes};
use eg_data::Mutation;
use eg_rpc::GuardianId;
use tracing::{error, info};

use crate::{
    repo::{BallotRepositoryFactory, ElectionRepositoryFactory, GuardianRepositoryFactory},
    Choice, CredentialFile, DecryptionContext, DecryptionError, Election, ElectionSetup, Guardian,
};

/// Hands a freshly issued credential file to its guardian.
#[async_trait]
pub trait CredentialDelivery: Send + Sync {
    async fn deliver(&self, file: &CredentialFile) -> Result<()>;
}

/// Records the delivery in the log. The file itself is returned to the caller.
#[derive(Clone, Debug, Default)]
pub struct LoggingCredentialDelivery;

#[async_trait]
impl CredentialDelivery for LoggingCredentialDelivery {
    async fn deliver(&self, file: &CredentialFile) -> Result<()> {
        info!(
            election_id = %file.election_id,
            guardian = file.sequence_order,
            user_id = %file.guardian_user_id,
            file_name = %file.file_name(),
            "credential file ready for guardian"
        );
        Ok(())
    }
}

#[derive(Clone)]
pub struct Onboarding {
    ctx: DecryptionContext,
    delivery: Arc<dyn CredentialDelivery>,
}

impl Onboarding {
    pub fn new(ctx: &DecryptionContext, delivery: Arc<dyn CredentialDelivery>) -> Self {
        Self {
            ctx: ctx.clone(),
            delivery,
        }
    }

    pub async fn register_election(
        &self,
        setup: ElectionSetup,
    ) -> Result<Election, DecryptionError> {
        validate_setup(&setup)?;
        let election = election_from(setup.clone());

        // Only the registration that inserts the election writes guardians
        let inserted = self
            .ctx
            .repositories
            .election(&setup.id)
            .try_mutate(|current| match current {
                Some(_) => Ok(Mutation::Skip(false)),
                None => Ok(Mutation::Write(election.clone(), true)),
            })?;
        if !inserted {
            return Err(DecryptionError::InvalidSetup(format!(
                "election {} already exists",
                setup.id
            )));
        }

        for g in &setup.guardians {
            self.ctx
                .repositories
                .guardian(&setup.id, g.sequence_order)
                .write(&Guardian {
                    election_id: setup.id.clone(),
                    user_id: g.user_id.clone(),
                    sequence_order: g.sequence_order,
                    public_key: g.public_key.clone(),
                    key_backup: g.key_backup.clone(),
                    encrypted_credentials: None,
                    vault_credentials: None,
                    decryption_public_key: None,
                    tally_share: None,
                    ballot_shares: vec![],
                    submitted_at: None,
                })?;
        }

        info!(
            election_id = %election.id,
            guardians = election.guardian_count,
            quorum = election.quorum,
            "election registered"
        );
        Ok(election)
    }

    /// Seal a guardian's key material, keep the credentials and return the file for the guardian.
    /// Delivery runs in the background and never fails the issuance.
    pub async fn issue_credentials(
        &self,
        election_id: &str,
        sequence: GuardianId,
        private_key: &str,
        polynomial: &str,
    ) -> Result<CredentialFile, DecryptionError> {
        self.ctx.election(election_id)?;
        let guardian = self.ctx.guardian(election_id, sequence)?;
        if guardian.submitted() {
            return Err(DecryptionError::AlreadySubmitted(sequence));
        }

        let (blob, credentials) = CredentialVault::encrypt(private_key, polynomial)
            .map_err(|e| DecryptionError::InvalidSetup(e.to_string()))?;
        let sealed = SensitiveBytes::new(credentials.as_hex().as_bytes(), &self.ctx.cipher)?;

        self.ctx
            .repositories
            .guardian(election_id, sequence)
            .try_mutate(|current| {
                let Some(mut guardian) = current else {
                    return Ok(Mutation::Skip(Err(DecryptionError::NotAGuardian)));
                };
                if guardian.submitted() {
                    return Ok(Mutation::Skip(Err(DecryptionError::AlreadySubmitted(sequence))));
                }
                guardian.encrypted_credentials = Some(blob.as_str().to_string());
                guardian.vault_credentials = Some(sealed.clone());
                Ok(Mutation::Write(guardian, Ok(())))
            })??;

        let file = CredentialFile {
            election_id: election_id.to_string(),
            guardian_user_id: guardian.user_id,
            sequence_order: sequence,
            contents: blob.as_str().to_string(),
        };
        info!(election_id, guardian = sequence, "credentials issued");

        let delivery = self.delivery.clone();
        let outgoing = file.clone();
        tokio::spawn(async move {
            if let Err(e) = delivery.deliver(&outgoing).await {
                error!(
                    election_id = %outgoing.election_id,
                    guardian = outgoing.sequence_order,
                    error = %e,
                    "credential delivery failed"
                );
            }
        });

        Ok(file)
    }

    pub async fn cast_ballot(
        &self,
        election_id: &str,
        ciphertext: &str,
    ) -> Result<usize, DecryptionError> {
        let election = self.ctx.election(election_id)?;
        if election.encrypted_tally.is_some() || election.is_decrypted() {
            return Err(DecryptionError::BallotsClosed(election_id.to_string()));
        }
        let count = self
            .ctx
            .repositories
            .ballots(election_id)
            .try_mutate(|current| {
                let mut ballots = current.unwrap_or_default();
                ballots.push(ciphertext.to_string());
                let count = ballots.len();
                Ok(Mutation::Write(ballots, count))
            })?;
        Ok(count)
    }
}

pub(crate) fn election_from(setup: ElectionSetup) -> Election {
    Election {
        id: setup.id,
        name: setup.name,
        quorum: setup.quorum,
        guardian_count: setup.guardians.len() as u32,
        joint_public_key: setup.joint_public_key,
        commitment_hash: setup.commitment_hash,
        encrypted_tally: None,
        status: setup.status,
        ends_at: setup.ends_at,
        admin: setup.admin,
        choices: setup
            .choices
            .into_iter()
            .map(|c| Choice {
                candidate_name: c.candidate_name,
                party_name: c.party_name,
                vote_count: None,
            })
            .collect(),
    }
}

fn validate_setup(setup: &ElectionSetup) -> Result<(), DecryptionError> {
    let invalid = |reason: String| Err(DecryptionError::InvalidSetup(reason));

    if setup.id.trim().is_empty() || setup.id.contains('/') {
        return invalid(format!("{:?} is not a usable election id", setup.id));
    }
    let guardian_count = setup.guardians.len() as u32;
    if guardian_count == 0 {
        return invalid("an election needs at least one guardian".into());
    }
    if setup.quorum < 1 || setup.quorum > guardian_count {
        return invalid(format!(
            "quorum {} must be between 1 and {}",
            setup.quorum, guardian_count
        ));
    }

    let mut sequences: Vec<GuardianId> = setup.guardians.iter().map(|g| g.sequence_order).collect();
    sequences.sort_unstable();
    if sequences != (1..=guardian_count).collect::<Vec<_>>() {
        return invalid(format!(
            "guardian sequence orders must be exactly 1..={}",
            guardian_count
        ));
    }

    let mut users = HashSet::new();
    for g in &setup.guardians {
        if g.user_id.trim().is_empty() {
            return invalid(format!("guardian {} has no user id", g.sequence_order));
        }
        if !users.insert(g.user_id.as_str()) {
            return invalid(format!("user {} appears twice", g.user_id));
        }
    }

    if setup.choices.is_empty() {
        return invalid("an election needs at least one choice".into());
    }
    let mut candidates = HashSet::new();
    for c in &setup.choices {
        if !candidates.insert(c.candidate_name.as_str()) {
            return invalid(format!("candidate {} appears twice", c.candidate_name));
        }
    }
    Ok(())
}
