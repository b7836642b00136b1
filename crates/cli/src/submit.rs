// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::Path;

use anyhow::Result;
use eg_crypto::EncryptedBlob;
use eg_decryption::Coordinator;

use crate::helpers::{read_value, user_error};

pub async fn execute(
    coordinator: &Coordinator,
    election: &str,
    user: &str,
    credentials: &Path,
) -> Result<()> {
    let blob = EncryptedBlob::from(read_value(credentials)?.to_string());
    let receipt = coordinator
        .submit_partial_decryption(election, user, &blob)
        .await
        .map_err(user_error)?;

    println!(
        "Guardian {} submitted a partial decryption for {}",
        receipt.guardian, receipt.election_id
    );
    match receipt.compensation {
        Some(report) if report.is_complete() => {
            println!("Compensated for {} missing guardians", report.stored.len())
        }
        Some(report) => {
            for (missing, reason) in &report.failed {
                eprintln!("Could not compensate for guardian {}: {}", missing, reason);
            }
        }
        None => eprintln!("Compensation did not run, it is retried on the next submission"),
    }
    Ok(())
}
