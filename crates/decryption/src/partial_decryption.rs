// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! A guardian's partial decryption of the tally.
//!
//! ```text
//! pending --(share stored)--> submitted
//! ```
//!
//! A guardian leaves `pending` exactly once. Anything that fails before the share is stored leaves
//! the guardian pending so the submission can be retried.

use chrono::Utc;
use eg_crypto::{EncryptedBlob, GuardianSecrets};
use eg_data::Mutation;
use eg_rpc::{partial_decrypt, with_timeout, CryptoOperation, GuardianId};
use tracing::{error, info, warn};

use crate::{
    repo::GuardianRepositoryFactory, CompensatedShareGenerator, CompensationReport,
    DecryptionContext, DecryptionError, Election, EndCheck, Guardian, LockKey, TallyBuilder,
};

/// Outcome of an accepted submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmissionReceipt {
    pub election_id: String,
    pub guardian: GuardianId,
    /// `None` when compensation could not run at all. The share is stored either way.
    pub compensation: Option<CompensationReport>,
}

#[derive(Clone)]
pub struct PartialDecryptionExecutor {
    ctx: DecryptionContext,
    tally: TallyBuilder,
    compensation: CompensatedShareGenerator,
}

impl PartialDecryptionExecutor {
    pub fn new(ctx: &DecryptionContext) -> Self {
        Self {
            ctx: ctx.clone(),
            tally: TallyBuilder::new(ctx),
            compensation: CompensatedShareGenerator::new(ctx),
        }
    }

    pub async fn submit_partial_decryption(
        &self,
        election_id: &str,
        user_id: &str,
        blob: &EncryptedBlob,
    ) -> Result<SubmissionReceipt, DecryptionError> {
        self.ctx.election(election_id)?;
        let sequence = self.ctx.guardian_for_user(election_id, user_id)?.sequence_order;

        let _guard = self
            .ctx
            .locks
            .lock(LockKey::guardian(election_id, sequence))
            .await;

        let guardian = self.ctx.guardian(election_id, sequence)?;
        if guardian.submitted() {
            return Err(DecryptionError::AlreadySubmitted(sequence));
        }
        let election = self.ctx.election(election_id)?;
        if election.is_decrypted() {
            return Err(DecryptionError::ElectionAlreadyDecrypted(
                election_id.to_string(),
            ));
        }

        let election = self.ensure_tally(election).await?;
        let secrets = self.ctx.open_credentials(&guardian, blob)?;
        let response = self.request_share(&election, &guardian, &secrets).await?;

        let tally_share = match response.tally_share {
            Some(share) if !share.trim().is_empty() => share,
            _ => {
                warn!(election_id, guardian = sequence, "crypto service produced no share");
                return Err(DecryptionError::InvalidKey);
            }
        };

        {
            // A running combine has already taken its snapshot of the shares
            let _combine = self.ctx.locks.lock(LockKey::combine(election_id)).await;
            if self.ctx.election(election_id)?.is_decrypted() {
                warn!(election_id, guardian = sequence, "election decrypted while submitting");
                return Err(DecryptionError::ElectionAlreadyDecrypted(
                    election_id.to_string(),
                ));
            }
            self.store_share(
                election_id,
                sequence,
                tally_share,
                response.ballot_shares,
                response.guardian_public_key,
            )?;
        }
        info!(election_id, guardian = sequence, "partial decryption stored");

        let compensation = match self
            .compensation
            .generate_compensated_shares(election_id, &guardian, &secrets)
            .await
        {
            Ok(report) => Some(report),
            Err(e) => {
                error!(election_id, guardian = sequence, error = %e, "compensation did not run");
                None
            }
        };

        Ok(SubmissionReceipt {
            election_id: election_id.to_string(),
            guardian: sequence,
            compensation,
        })
    }

    async fn ensure_tally(&self, election: Election) -> Result<Election, DecryptionError> {
        if election.encrypted_tally.is_some() {
            return Ok(election);
        }
        info!(election_id = %election.id, "no tally yet, building one for this submission");
        self.tally
            .build_tally(&election.id, EndCheck::Bypass)
            .await?;
        self.ctx.election(&election.id)
    }

    async fn request_share(
        &self,
        election: &Election,
        guardian: &Guardian,
        secrets: &GuardianSecrets,
    ) -> Result<partial_decrypt::Response, DecryptionError> {
        let request = partial_decrypt::Request {
            guardian_id: guardian.sequence_order,
            key_backup: guardian.key_backup.clone(),
            private_key: secrets.private_key.clone(),
            public_key: guardian.public_key.clone(),
            polynomial: secrets.polynomial.clone(),
            context: election.context(),
            tally_ciphertext: election
                .encrypted_tally
                .clone()
                .ok_or(DecryptionError::TallyNotReady)?,
            ballot_ciphertexts: self.ctx.submitted_ballots(&election.id)?,
        };
        with_timeout(
            CryptoOperation::PartialDecrypt,
            self.ctx.rpc_timeout,
            self.ctx.crypto.partial_decrypt(request),
        )
        .await
        .map_err(|e| {
            error!(
                election_id = %election.id,
                guardian = guardian.sequence_order,
                error = %e,
                "partial decryption request failed"
            );
            DecryptionError::from(e)
        })
    }

    fn store_share(
        &self,
        election_id: &str,
        sequence: GuardianId,
        tally_share: String,
        ballot_shares: Vec<String>,
        decryption_public_key: Option<String>,
    ) -> Result<(), DecryptionError> {
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
                guardian.tally_share = Some(tally_share.clone());
                guardian.ballot_shares = ballot_shares.clone();
                guardian.decryption_public_key = decryption_public_key.clone();
                guardian.submitted_at = Some(Utc::now());
                Ok(Mutation::Write(guardian, Ok(())))
            })?
    }
}
