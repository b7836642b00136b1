// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_config::StoreKeys;
use eg_data::{Repositories, Repository};
use eg_rpc::GuardianId;

use crate::{CompensatedShare, Election, Guardian};

pub trait ElectionRepositoryFactory {
    fn election(&self, election_id: &str) -> Repository<Election>;
}

impl ElectionRepositoryFactory for Repositories {
    fn election(&self, election_id: &str) -> Repository<Election> {
        Repository::new(self.store.scope(StoreKeys::election(election_id)))
    }
}

pub trait GuardianRepositoryFactory {
    fn guardian(&self, election_id: &str, sequence: GuardianId) -> Repository<Guardian>;

    /// Every guardian of the election, ascending by sequence order
    fn guardians(&self, election_id: &str) -> Result<Vec<Guardian>>;
}

impl GuardianRepositoryFactory for Repositories {
    fn guardian(&self, election_id: &str, sequence: GuardianId) -> Repository<Guardian> {
        Repository::new(
            self.store
                .scope(StoreKeys::guardians(election_id))
                .scope(sequence),
        )
    }

    fn guardians(&self, election_id: &str) -> Result<Vec<Guardian>> {
        let mut guardians: Vec<Guardian> = self
            .store
            .scope(StoreKeys::guardians(election_id))
            .read_all()?;
        guardians.sort_by_key(|g| g.sequence_order);
        Ok(guardians)
    }
}

pub trait CompensatedShareRepositoryFactory {
    /// All rows computed for one missing guardian
    fn compensated_shares(
        &self,
        election_id: &str,
        missing: GuardianId,
    ) -> Repository<Vec<CompensatedShare>>;
}

impl CompensatedShareRepositoryFactory for Repositories {
    fn compensated_shares(
        &self,
        election_id: &str,
        missing: GuardianId,
    ) -> Repository<Vec<CompensatedShare>> {
        Repository::new(
            self.store
                .scope(StoreKeys::compensated_shares(election_id, missing)),
        )
    }
}

pub trait BallotRepositoryFactory {
    /// Ballots as cast
    fn ballots(&self, election_id: &str) -> Repository<Vec<String>>;

    /// Canonical ballot list returned by the tally service
    fn submitted_ballots(&self, election_id: &str) -> Repository<Vec<String>>;
}

impl BallotRepositoryFactory for Repositories {
    fn ballots(&self, election_id: &str) -> Repository<Vec<String>> {
        Repository::new(self.store.scope(StoreKeys::ballots(election_id)))
    }

    fn submitted_ballots(&self, election_id: &str) -> Repository<Vec<String>> {
        Repository::new(self.store.scope(StoreKeys::submitted_ballots(election_id)))
    }
}
