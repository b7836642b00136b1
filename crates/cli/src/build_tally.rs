// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_decryption::Coordinator;

use crate::helpers::user_error;

pub async fn execute(coordinator: &Coordinator, election: &str) -> Result<()> {
    let tally = coordinator
        .build_tally(election)
        .await
        .map_err(user_error)?;
    println!(
        "Encrypted tally for {} covers {} ballots",
        tally.election_id,
        tally.ballot_ciphertexts.len()
    );
    Ok(())
}
