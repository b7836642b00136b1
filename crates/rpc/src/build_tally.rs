// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Homomorphically accumulate ballots into one encrypted tally.

use crate::ElectionContext;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Request {
    #[serde(flatten)]
    pub context: ElectionContext,
    pub ballot_ciphertexts: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Response {
    pub tally_ciphertext: String,
    /// The ballots as the service accepted them. These are what later RPCs must be given.
    pub ballot_ciphertexts: Vec<String>,
}
