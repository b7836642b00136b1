// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_decryption::Coordinator;

use crate::helpers::user_error;

pub async fn execute(coordinator: &Coordinator, election: &str) -> Result<()> {
    let results = coordinator.combine(election).await.map_err(user_error)?;
    for r in &results.results {
        println!("{:<24} {:<16} {:>8}", r.candidate_name, r.party_name, r.votes);
    }
    println!("{:<24} {:<16} {:>8}", "total", "", results.total());
    Ok(())
}
