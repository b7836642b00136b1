// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::collections::BTreeMap;

use eg_rpc::GuardianId;
use serde::{Deserialize, Serialize};

use crate::{
    canonical_share,
    repo::{CompensatedShareRepositoryFactory, GuardianRepositoryFactory},
    DecryptionContext, DecryptionError, ElectionResults, ElectionStatus, GuardianPartition,
};

/// Where an election stands on its way to published results.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionStatus {
    pub election_id: String,
    pub status: ElectionStatus,
    pub quorum: u32,
    pub guardian_count: u32,
    pub tally_built: bool,
    pub submitted: Vec<GuardianId>,
    pub missing: Vec<GuardianId>,
    /// Canonical compensator for each missing guardian, if any row exists yet
    pub compensators: BTreeMap<GuardianId, Option<GuardianId>>,
    pub results: Option<ElectionResults>,
}

impl DecryptionStatus {
    pub fn quorum_met(&self) -> bool {
        self.submitted.len() as u32 >= self.quorum
    }

    pub fn ready_to_combine(&self) -> bool {
        self.tally_built
            && self.quorum_met()
            && self.compensators.values().all(Option::is_some)
    }
}

pub fn decryption_status(
    ctx: &DecryptionContext,
    election_id: &str,
) -> Result<DecryptionStatus, DecryptionError> {
    let election = ctx.election(election_id)?;
    let partition = GuardianPartition::new(ctx.repositories.guardians(election_id)?);

    let mut compensators = BTreeMap::new();
    for g in &partition.missing {
        let rows = ctx
            .repositories
            .compensated_shares(election_id, g.sequence_order)
            .read()?
            .unwrap_or_default();
        compensators.insert(
            g.sequence_order,
            canonical_share(&rows).map(|r| r.compensating_guardian_sequence),
        );
    }

    Ok(DecryptionStatus {
        election_id: election.id.clone(),
        status: election.status,
        quorum: election.quorum,
        guardian_count: election.guardian_count,
        tally_built: election.encrypted_tally.is_some(),
        submitted: partition.available.iter().map(|g| g.sequence_order).collect(),
        missing: partition.missing.iter().map(|g| g.sequence_order).collect(),
        compensators,
        results: election.results(),
    })
}
