// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Shares computed by a submitting guardian on behalf of every peer, so that any guardian who
//! never shows up can be covered at combine time.
//!
//! Several guardians may compensate for the same peer. Only the lowest sequence is ever used, so a
//! row is stored only while no row from a lower or equal compensator exists. The check happens
//! twice: before the RPC to avoid wasted work and inside the conditional write to settle races.

use chrono::Utc;
use eg_crypto::GuardianSecrets;
use eg_data::Mutation;
use eg_rpc::{compensated_decrypt, with_timeout, CryptoOperation, GuardianId};
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::{
    repo::{CompensatedShareRepositoryFactory, GuardianRepositoryFactory},
    CompensatedShare, DecryptionContext, DecryptionError, Election, Guardian, LockKey,
};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub compensator: GuardianId,
    /// Peers this compensator now holds the canonical row for
    pub stored: Vec<GuardianId>,
    /// Peers already covered by this or a lower compensator
    pub skipped: Vec<GuardianId>,
    pub failed: Vec<(GuardianId, String)>,
}

impl CompensationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

enum PeerOutcome {
    Stored,
    Covered,
    Failed(String),
}

#[derive(Clone)]
pub struct CompensatedShareGenerator {
    ctx: DecryptionContext,
}

impl CompensatedShareGenerator {
    pub fn new(ctx: &DecryptionContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    pub async fn generate_compensated_shares(
        &self,
        election_id: &str,
        compensator: &Guardian,
        secrets: &GuardianSecrets,
    ) -> Result<CompensationReport, DecryptionError> {
        let election = self.ctx.election(election_id)?;
        if election.is_decrypted() {
            return Err(DecryptionError::ElectionAlreadyDecrypted(
                election_id.to_string(),
            ));
        }
        let tally = election
            .encrypted_tally
            .clone()
            .ok_or(DecryptionError::TallyNotReady)?;
        let ballots = self.ctx.submitted_ballots(election_id)?;
        let peers: Vec<Guardian> = self
            .ctx
            .repositories
            .guardians(election_id)?
            .into_iter()
            .filter(|g| g.sequence_order != compensator.sequence_order)
            .collect();

        let outcomes = join_all(peers.iter().map(|missing| {
            self.compensate_for(&election, compensator, missing, secrets, &tally, &ballots)
        }))
        .await;

        let mut report = CompensationReport {
            compensator: compensator.sequence_order,
            ..Default::default()
        };
        for (missing, outcome) in peers.iter().zip(outcomes) {
            match outcome {
                PeerOutcome::Stored => report.stored.push(missing.sequence_order),
                PeerOutcome::Covered => report.skipped.push(missing.sequence_order),
                PeerOutcome::Failed(reason) => {
                    report.failed.push((missing.sequence_order, reason))
                }
            }
        }
        info!(
            election_id,
            compensator = compensator.sequence_order,
            stored = ?report.stored,
            skipped = ?report.skipped,
            failed = report.failed.len(),
            "compensation finished"
        );
        Ok(report)
    }

    async fn compensate_for(
        &self,
        election: &Election,
        compensator: &Guardian,
        missing: &Guardian,
        secrets: &GuardianSecrets,
        tally: &str,
        ballots: &[String],
    ) -> PeerOutcome {
        match self
            .try_compensate_for(election, compensator, missing, secrets, tally, ballots)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    election_id = %election.id,
                    compensator = compensator.sequence_order,
                    missing = missing.sequence_order,
                    error = %e,
                    "compensated share failed"
                );
                PeerOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_compensate_for(
        &self,
        election: &Election,
        compensator: &Guardian,
        missing: &Guardian,
        secrets: &GuardianSecrets,
        tally: &str,
        ballots: &[String],
    ) -> Result<PeerOutcome, DecryptionError> {
        let me = compensator.sequence_order;
        let repo = self
            .ctx
            .repositories
            .compensated_shares(&election.id, missing.sequence_order);

        let existing = repo.read()?.unwrap_or_default();
        if covered(&existing, me) {
            debug!(
                election_id = %election.id,
                compensator = me,
                missing = missing.sequence_order,
                "already covered"
            );
            return Ok(PeerOutcome::Covered);
        }

        let request = compensated_decrypt::Request {
            compensating_guardian_id: me,
            missing_guardian_id: missing.sequence_order,
            compensating_key_backup: compensator.key_backup.clone(),
            missing_key_backup: missing.key_backup.clone(),
            private_key: secrets.private_key.clone(),
            public_key: compensator.public_key.clone(),
            polynomial: secrets.polynomial.clone(),
            context: election.context(),
            tally_ciphertext: tally.to_string(),
            ballot_ciphertexts: ballots.to_vec(),
        };
        let response = with_timeout(
            CryptoOperation::CompensatedDecrypt,
            self.ctx.rpc_timeout,
            self.ctx.crypto.compensated_decrypt(request),
        )
        .await?;

        let row = CompensatedShare {
            election_id: election.id.clone(),
            missing_guardian_sequence: missing.sequence_order,
            compensating_guardian_sequence: me,
            compensated_tally_share: response.compensated_tally_share,
            compensated_ballot_shares: response.compensated_ballot_shares,
            created_at: Utc::now(),
        };
        let _combine = self.ctx.locks.lock(LockKey::combine(&election.id)).await;
        if self.ctx.election(&election.id)?.is_decrypted() {
            return Err(DecryptionError::ElectionAlreadyDecrypted(
                election.id.clone(),
            ));
        }
        let outcome = repo.try_mutate(|current| {
            let mut rows = current.unwrap_or_default();
            if covered(&rows, me) {
                return Ok(Mutation::Skip(PeerOutcome::Covered));
            }
            rows.push(row.clone());
            Ok(Mutation::Write(rows, PeerOutcome::Stored))
        })?;
        if let PeerOutcome::Covered = outcome {
            warn!(
                election_id = %election.id,
                compensator = me,
                missing = missing.sequence_order,
                "a lower compensator stored first, discarding share"
            );
        }
        Ok(outcome)
    }
}

/// True when a row from `compensator` or a lower sequence is already stored
fn covered(rows: &[CompensatedShare], compensator: GuardianId) -> bool {
    rows.iter()
        .any(|r| r.compensating_guardian_sequence <= compensator)
}
