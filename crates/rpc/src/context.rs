// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// Election wide values every RPC carries.
///
/// `party_names` and `candidate_names` are index aligned and in choice creation order. The crypto
/// service attributes votes by position, so this order must never change between calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElectionContext {
    pub party_names: Vec<String>,
    pub candidate_names: Vec<String>,
    pub joint_public_key: String,
    pub commitment_hash: String,
    pub guardian_count: u32,
    pub quorum: u32,
}
