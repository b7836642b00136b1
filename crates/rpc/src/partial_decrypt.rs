// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! A guardian's own share of the tally decryption.

use crate::{ElectionContext, GuardianId};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    pub guardian_id: GuardianId,
    pub key_backup: String,
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
        f.debug_struct("partial_decrypt::Request")
            .field("guardian_id", &self.guardian_id)
            .field("ballots", &self.ballot_ciphertexts.len())
            .finish_non_exhaustive()
    }
}

/// `tally_share` is absent when the key material does not belong to the guardian.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub tally_share: Option<String>,
    #[serde(default)]
    pub ballot_shares: Vec<String>,
    #[serde(default)]
    pub guardian_public_key: Option<String>,
}
