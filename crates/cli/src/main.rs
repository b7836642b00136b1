// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use clap::Parser;
use cli::Cli;

mod build_tally;
mod cast;
mod cli;
mod combine;
pub mod helpers;
mod issue_credentials;
mod password;
mod password_set;
mod register;
mod status;
mod submit;

#[tokio::main]
pub async fn main() {
    // Execute the cli
    if let Err(err) = Cli::parse().execute().await {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
