// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::collections::BTreeMap;

use eg_rpc::GuardianId;

pub fn mock_user_id(seq: GuardianId) -> String {
    format!("guardian-{seq}")
}

pub fn mock_public_key(seq: GuardianId) -> String {
    format!("pk-{seq}")
}

pub fn mock_key_backup(seq: GuardianId) -> String {
    format!("backup-{seq}")
}

/// The only private key `MockCryptoService` accepts for this guardian
pub fn mock_private_key(seq: GuardianId) -> String {
    format!("sk-{seq}")
}

pub fn mock_polynomial(seq: GuardianId) -> String {
    format!("poly-{seq}\ncoefficients-{seq}")
}

/// One distinct ciphertext per vote. The candidate follows the last `:`.
pub fn ballots_for(candidates: &[&str]) -> Vec<String> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| format!("ballot-{i}:{candidate}"))
        .collect()
}

pub fn ballot_candidate(ciphertext: &str) -> Option<&str> {
    ciphertext.rsplit_once(':').map(|(_, candidate)| candidate)
}

/// Count the votes by hand
pub fn hand_tally(ballots: &[String]) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for candidate in ballots.iter().filter_map(|b| ballot_candidate(b)) {
        *counts.entry(candidate.to_string()).or_insert(0) += 1;
    }
    counts
}
