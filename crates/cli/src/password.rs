// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::*;
use clap::Subcommand;
use eg_config::AppConfig;
use zeroize::Zeroizing;

use crate::{helpers::parse_zeroizing, password_set};

#[derive(Subcommand, Debug)]
pub enum PasswordCommands {
    /// Set the password protecting stored secrets
    Set {
        /// The new password
        #[arg(short, long, value_parser = parse_zeroizing)]
        password: Option<Zeroizing<String>>,
    },
}

pub async fn execute(command: PasswordCommands, config: &AppConfig) -> Result<()> {
    match command {
        PasswordCommands::Set { password } => password_set::execute(config, password).await?,
    };

    Ok(())
}
