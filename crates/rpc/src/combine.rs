// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Final decryption from a quorum of shares.
//!
//! The `available_*` vectors are index aligned with `available_guardian_ids`. `missing_guardian_ids`,
//! `compensating_guardian_ids`, `compensated_tally_shares` and `compensated_ballot_shares` are index
//! aligned with each other: entry `i` of each describes the same missing guardian.

use crate::{ElectionContext, GuardianId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    #[serde(flatten)]
    pub context: ElectionContext,
    pub tally_ciphertext: String,
    pub ballot_ciphertexts: Vec<String>,
    /// Every guardian's key backup in sequence order
    pub guardian_key_backups: Vec<String>,
    pub available_guardian_ids: Vec<GuardianId>,
    pub available_public_keys: Vec<String>,
    pub available_tally_shares: Vec<String>,
    pub available_ballot_shares: Vec<Vec<String>>,
    pub missing_guardian_ids: Vec<GuardianId>,
    pub compensating_guardian_ids: Vec<GuardianId>,
    pub compensated_tally_shares: Vec<String>,
    pub compensated_ballot_shares: Vec<Vec<String>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    /// Votes per candidate name
    pub results: BTreeMap<String, u64>,
}
