// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use anyhow::Result;
use eg_decryption::Coordinator;

use crate::helpers::{read_value, user_error};

pub async fn execute(coordinator: &Coordinator, election: &str, ballots: &[PathBuf]) -> Result<()> {
    let mut count = 0;
    for path in ballots {
        let ciphertext = read_value(path)?;
        count = coordinator
            .cast_ballot(election, &ciphertext)
            .await
            .map_err(user_error)?;
    }
    println!("{} ballots recorded for {}", count, election);
    Ok(())
}
