// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::collections::BTreeMap;

use eg_data::Mutation;
use eg_rpc::{combine, with_timeout, CryptoOperation, GuardianId};
use tracing::{error, info};

use crate::{
    canonical_share,
    repo::{CompensatedShareRepositoryFactory, ElectionRepositoryFactory, GuardianRepositoryFactory},
    CompensatedShare, DecryptionContext, DecryptionError, Election, ElectionResults,
    ElectionStatus, Guardian, LockKey,
};

/// Guardians split by whether they submitted, each side ascending by sequence.
#[derive(Clone, Debug, Default)]
pub struct GuardianPartition {
    pub available: Vec<Guardian>,
    pub missing: Vec<Guardian>,
}

impl GuardianPartition {
    pub fn new(guardians: Vec<Guardian>) -> Self {
        let (available, missing) = guardians.into_iter().partition(|g| g.submitted());
        Self { available, missing }
    }
}

#[derive(Clone)]
pub struct QuorumCombiner {
    ctx: DecryptionContext,
}

impl QuorumCombiner {
    pub fn new(ctx: &DecryptionContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    pub async fn combine(&self, election_id: &str) -> Result<ElectionResults, DecryptionError> {
        let _guard = self.ctx.locks.lock(LockKey::combine(election_id)).await;
        let election = self.ctx.election(election_id)?;

        if let Some(results) = election.results() {
            info!(election_id, "already decrypted, returning stored results");
            return Ok(results);
        }
        let tally = election
            .encrypted_tally
            .clone()
            .ok_or(DecryptionError::TallyNotReady)?;

        let partition = GuardianPartition::new(self.ctx.repositories.guardians(election_id)?);
        let submitted = partition.available.len() as u32;
        if submitted < election.quorum {
            return Err(DecryptionError::QuorumNotMet {
                submitted,
                guardian_count: election.guardian_count,
                quorum: election.quorum,
            });
        }

        let compensated = self.canonical_rows(election_id, &partition.missing)?;
        let request = build_request(
            &election,
            tally,
            self.ctx.submitted_ballots(election_id)?,
            &partition,
            &compensated,
        );

        info!(
            election_id,
            available = ?request.available_guardian_ids,
            missing = ?request.missing_guardian_ids,
            compensating = ?request.compensating_guardian_ids,
            "combining decryption shares"
        );
        let response = with_timeout(
            CryptoOperation::Combine,
            self.ctx.rpc_timeout,
            self.ctx.crypto.combine(request),
        )
        .await
        .map_err(|e| {
            error!(election_id, error = %e, "combine request failed");
            DecryptionError::from(e)
        })?;

        let results = self.store_results(&election, response.results)?;
        info!(election_id, total = results.total(), "election decrypted");
        Ok(results)
    }

    /// One row per missing guardian in ascending order
    fn canonical_rows(
        &self,
        election_id: &str,
        missing: &[Guardian],
    ) -> Result<Vec<CompensatedShare>, DecryptionError> {
        missing
            .iter()
            .map(|g| -> Result<CompensatedShare, DecryptionError> {
                let rows = self
                    .ctx
                    .repositories
                    .compensated_shares(election_id, g.sequence_order)
                    .read()?
                    .unwrap_or_default();
                canonical_share(&rows)
                    .cloned()
                    .ok_or(DecryptionError::IncompleteCompensation(g.sequence_order))
            })
            .collect()
    }

    fn store_results(
        &self,
        election: &Election,
        counts: BTreeMap<String, u64>,
    ) -> Result<ElectionResults, DecryptionError> {
        if let Some(unknown) = counts
            .keys()
            .find(|name| !election.choices.iter().any(|c| &c.candidate_name == *name))
        {
            error!(election_id = %election.id, candidate = %unknown, "combine returned an unknown candidate");
            return Err(DecryptionError::UnknownCandidate(unknown.clone()));
        }

        self.ctx
            .repositories
            .election(&election.id)
            .try_mutate(|current| {
                let Some(mut stored) = current else {
                    return Ok(Mutation::Skip(Err(DecryptionError::ElectionNotFound(
                        election.id.clone(),
                    ))));
                };
                if let Some(results) = stored.results() {
                    return Ok(Mutation::Skip(Ok(results)));
                }
                for choice in stored.choices.iter_mut() {
                    choice.vote_count =
                        Some(counts.get(&choice.candidate_name).copied().unwrap_or(0));
                }
                stored.status = ElectionStatus::Decrypted;
                let Some(results) = stored.results() else {
                    return Ok(Mutation::Skip(Err(DecryptionError::TallyNotReady)));
                };
                Ok(Mutation::Write(stored, Ok(results)))
            })?
    }
}

/// Available guardians in ascending order, then the four sequences describing the missing
/// guardians, all aligned on the same index.
fn build_request(
    election: &Election,
    tally_ciphertext: String,
    ballot_ciphertexts: Vec<String>,
    partition: &GuardianPartition,
    compensated: &[CompensatedShare],
) -> combine::Request {
    let available = &partition.available;
    let mut all: Vec<&Guardian> = available.iter().chain(partition.missing.iter()).collect();
    all.sort_by_key(|g| g.sequence_order);

    combine::Request {
        context: election.context(),
        tally_ciphertext,
        ballot_ciphertexts,
        guardian_key_backups: all.iter().map(|g| g.key_backup.clone()).collect(),
        available_guardian_ids: available.iter().map(|g| g.sequence_order).collect(),
        available_public_keys: available.iter().map(|g| g.public_key.clone()).collect(),
        available_tally_shares: available
            .iter()
            .map(|g| g.tally_share.clone().unwrap_or_default())
            .collect(),
        available_ballot_shares: available.iter().map(|g| g.ballot_shares.clone()).collect(),
        missing_guardian_ids: compensated
            .iter()
            .map(|r| r.missing_guardian_sequence)
            .collect::<Vec<GuardianId>>(),
        compensating_guardian_ids: compensated
            .iter()
            .map(|r| r.compensating_guardian_sequence)
            .collect(),
        compensated_tally_shares: compensated
            .iter()
            .map(|r| r.compensated_tally_share.clone())
            .collect(),
        compensated_ballot_shares: compensated
            .iter()
            .map(|r| r.compensated_ballot_shares.clone())
            .collect(),
    }
}
