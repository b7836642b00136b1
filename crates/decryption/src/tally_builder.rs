// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Aggregates the cast ballots into one encrypted tally, at most once per election.

use chrono::Utc;
use eg_data::Mutation;
use eg_rpc::{build_tally, with_timeout, CryptoOperation};
use tracing::{error, info};

use crate::{
    repo::{BallotRepositoryFactory, ElectionRepositoryFactory},
    DecryptionContext, DecryptionError, Election, EncryptedTally, EndCheck, LockKey,
};

#[derive(Clone)]
pub struct TallyBuilder {
    ctx: DecryptionContext,
}

impl TallyBuilder {
    pub fn new(ctx: &DecryptionContext) -> Self {
        Self { ctx: ctx.clone() }
    }

    pub async fn build_tally(
        &self,
        election_id: &str,
        end_check: EndCheck,
    ) -> Result<EncryptedTally, DecryptionError> {
        let _guard = self.ctx.locks.lock(LockKey::tally(election_id)).await;
        let election = self.ctx.election(election_id)?;

        if let Some(tally) = &election.encrypted_tally {
            return self.existing(election_id, tally.clone());
        }

        if end_check == EndCheck::Enforce && !election.has_ended(Utc::now()) {
            return Err(DecryptionError::ElectionNotEnded(election_id.to_string()));
        }

        let ballots = self.gather_ballots(election_id)?;
        if election.admin.is_none() {
            return Err(DecryptionError::MissingAdmin(election_id.to_string()));
        }

        info!(election_id, ballots = ballots.len(), "building encrypted tally");
        let response = self.request_tally(&election, ballots).await?;

        self.store_canonical_ballots(election_id, &response.ballot_ciphertexts)?;
        let stored = self.store_tally(election_id, response.tally_ciphertext)?;

        Ok(EncryptedTally {
            election_id: election_id.to_string(),
            tally_ciphertext: stored,
            ballot_ciphertexts: self.ctx.submitted_ballots(election_id)?,
        })
    }

    fn existing(&self, election_id: &str, tally: String) -> Result<EncryptedTally, DecryptionError> {
        Ok(EncryptedTally {
            election_id: election_id.to_string(),
            tally_ciphertext: tally,
            ballot_ciphertexts: self.ctx.submitted_ballots(election_id)?,
        })
    }

    /// Cast ballots first, the canonical list when nothing was cast directly.
    fn gather_ballots(&self, election_id: &str) -> Result<Vec<String>, DecryptionError> {
        let primary = self
            .ctx
            .repositories
            .ballots(election_id)
            .read()?
            .unwrap_or_default();
        if !primary.is_empty() {
            return Ok(primary);
        }
        let submitted = self.ctx.submitted_ballots(election_id)?;
        if submitted.is_empty() {
            return Err(DecryptionError::NoBallots(election_id.to_string()));
        }
        Ok(submitted)
    }

    async fn request_tally(
        &self,
        election: &Election,
        ballot_ciphertexts: Vec<String>,
    ) -> Result<build_tally::Response, DecryptionError> {
        let request = build_tally::Request {
            context: election.context(),
            ballot_ciphertexts,
        };
        with_timeout(
            CryptoOperation::BuildTally,
            self.ctx.rpc_timeout,
            self.ctx.crypto.build_tally(request),
        )
        .await
        .map_err(|e| {
            error!(election_id = %election.id, error = %e, "tally request failed");
            DecryptionError::from(e)
        })
    }

    fn store_canonical_ballots(
        &self,
        election_id: &str,
        canonical: &[String],
    ) -> Result<(), DecryptionError> {
        let added = self
            .ctx
            .repositories
            .submitted_ballots(election_id)
            .try_mutate(|existing| {
                let mut ballots = existing.unwrap_or_default();
                let before = ballots.len();
                for ciphertext in canonical {
                    if !ballots.contains(ciphertext) {
                        ballots.push(ciphertext.clone());
                    }
                }
                let added = ballots.len() - before;
                if added == 0 {
                    return Ok(Mutation::Skip(0));
                }
                Ok(Mutation::Write(ballots, added))
            })?;
        info!(election_id, added, "stored canonical ballots");
        Ok(())
    }

    /// Set the tally unless someone got there first. Returns whichever tally is stored.
    fn store_tally(&self, election_id: &str, tally: String) -> Result<String, DecryptionError> {
        let stored = self
            .ctx
            .repositories
            .election(election_id)
            .try_mutate(|current| {
                let Some(mut election) = current else {
                    return Ok(Mutation::Skip(Err(DecryptionError::ElectionNotFound(
                        election_id.to_string(),
                    ))));
                };
                if let Some(existing) = &election.encrypted_tally {
                    return Ok(Mutation::Skip(Ok(existing.clone())));
                }
                election.encrypted_tally = Some(tally.clone());
                Ok(Mutation::Write(election, Ok(tally.clone())))
            })??;
        info!(election_id, "encrypted tally stored");
        Ok(stored)
    }
}
