// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{bail, Result};
use eg_config::AppConfig;
use eg_crypto::{FilePasswordManager, PasswordManager};
use tracing::info;
use zeroize::{Zeroize, Zeroizing};

use crate::helpers::prompt_password::prompt_password;

pub fn ask_for_password(input: Option<Zeroizing<String>>) -> Result<Zeroizing<String>> {
    if let Some(pw_str) = input {
        if pw_str.trim().is_empty() {
            bail!("Password must not be blank")
        }
        return Ok(pw_str);
    }

    let mut pw_str = prompt_password("Please enter a new password")?;
    if pw_str.trim().is_empty() {
        bail!("Password must not be blank")
    }

    let mut confirm_pw_str = prompt_password("Please confirm your password")?;

    if pw_str.trim() != confirm_pw_str.trim() {
        pw_str.zeroize();
        confirm_pw_str.zeroize();
        bail!("Passwords do not match")
    }

    confirm_pw_str.zeroize();
    let trimmed = Zeroizing::new(pw_str.trim().to_owned());
    pw_str.zeroize();

    Ok(trimmed)
}

pub async fn execute(config: &AppConfig, input: Option<Zeroizing<String>>) -> Result<()> {
    let mut pm = FilePasswordManager::new(config.key_file());
    if pm.is_set() {
        bail!(
            "A password is already set at {}. Stored secrets depend on it.",
            config.key_file().display()
        );
    }

    let pw = ask_for_password(input)?;
    pm.set_key(Zeroizing::new(pw.as_bytes().to_vec())).await?;
    info!(key_file = %config.key_file().display(), "password set");
    println!("Password successfully set.");

    Ok(())
}
