// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_decryption::Coordinator;

use crate::helpers::user_error;

pub fn execute(coordinator: &Coordinator, election: &str) -> Result<()> {
    let status = coordinator.status(election).map_err(user_error)?;
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}
