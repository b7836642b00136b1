// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! A share computed by one guardian on behalf of another who is missing.

use crate::{ElectionContext, GuardianId};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    pub compensating_guardian_id: GuardianId,
    pub missing_guardian_id: GuardianId,
    pub compensating_key_backup: String,
    pub missing_key_backup: String,
    pub private_key: String,
    pub public_key: String,
    pub polynomial: String,
    #[serde(flatten)]
    pub context: ElectionContext,
    pub tally_ciphertext: String,
    pub ballot_ciphertexts: Vec<String>,
}

impl std::fmt::Debug for Request {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("compensated_decrypt::Request")
            .field("compensating_guardian_id", &self.compensating_guardian_id)
            .field("missing_guardian_id", &self.missing_guardian_id)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    pub compensated_tally_share: String,
    pub compensated_ballot_shares: Vec<String>,
}
