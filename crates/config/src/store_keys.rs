// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

/// Location of every aggregate in the data store.
pub struct StoreKeys;

impl StoreKeys {
    pub fn election(election_id: &str) -> String {
        format!("//election/{election_id}")
    }

    /// Guardians are stored one per key below this prefix, keyed by sequence order.
    pub fn guardians(election_id: &str) -> String {
        format!("//guardians/{election_id}")
    }

    pub fn compensated_shares(election_id: &str, missing_sequence: u32) -> String {
        format!("//compensated/{election_id}/{missing_sequence:010}")
    }

    pub fn ballots(election_id: &str) -> String {
        format!("//ballots/{election_id}")
    }

    pub fn submitted_ballots(election_id: &str) -> String {
        format!("//submitted_ballots/{election_id}")
    }
}
