// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use eg_decryption::Coordinator;
use tracing::info;

use crate::helpers::{read_value, user_error};

pub async fn execute(
    coordinator: &Coordinator,
    election: &str,
    sequence: u32,
    private_key: &Path,
    polynomial: &Path,
    out: PathBuf,
) -> Result<()> {
    let private_key = read_value(private_key)?;
    let polynomial = read_value(polynomial)?;
    let file = coordinator
        .issue_credentials(election, sequence, &private_key, &polynomial)
        .await
        .map_err(user_error)?;

    fs::create_dir_all(&out)
        .with_context(|| format!("Could not create {}", out.display()))?;
    let path = out.join(file.file_name());
    fs::write(&path, &file.contents)
        .with_context(|| format!("Could not write {}", path.display()))?;
    info!(path = %path.display(), guardian = sequence, "credential file written");
    println!(
        "Credential file for {} written to {}",
        file.guardian_user_id,
        path.display()
    );
    Ok(())
}
