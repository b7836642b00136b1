// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::path::PathBuf;

use crate::helpers::telemetry::setup_simple_tracing;
use crate::password::{self, PasswordCommands};
use crate::{build_tally, cast, combine, issue_credentials, register, status, submit};
use anyhow::Result;
use clap::{command, ArgAction, Parser, Subcommand};
use eg_config::{load_config, AppConfig};
use eg_decryption::Coordinator;
use tracing::{info, instrument, Level};

#[derive(Parser, Debug)]
#[command(name = "eg")]
#[command(about = "Coordinate guardian threshold decryption of election tallies", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,

    /// Indicate error levels by adding additional `-v` arguments. Eg. `eg -vvv` will give you
    /// trace level output
    #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Silence all output. This argument cannot be used alongside `-v`
    #[arg(
        short,
        long,
        action = ArgAction::SetTrue,
        conflicts_with = "verbose",
        global = true
    )]
    quiet: bool,
}

impl Cli {
    /// Flags win over the configured level
    pub fn log_level(&self, config: &AppConfig) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => config.log_level().parse().unwrap_or(Level::WARN),
            1 => Level::INFO,  // -v
            2 => Level::DEBUG, // -vv
            _ => Level::TRACE, // -vvv
        }
    }

    #[instrument(skip_all)]
    pub async fn execute(self) -> Result<()> {
        let config = load_config(self.config.clone())?;
        setup_simple_tracing(self.log_level(&config));
        info!("Config loaded from: {:?}", config.config_file());

        // Built per command, `password set` runs before a key file exists
        let coordinator = || Coordinator::from_config(&config);
        match self.command {
            Commands::Register { file } => register::execute(&coordinator().await?, &file).await?,
            Commands::IssueCredentials {
                election,
                sequence,
                private_key,
                polynomial,
                out,
            } => {
                issue_credentials::execute(
                    &coordinator().await?,
                    &election,
                    sequence,
                    &private_key,
                    &polynomial,
                    out,
                )
                .await?
            }
            Commands::Cast { election, ballots } => {
                cast::execute(&coordinator().await?, &election, &ballots).await?
            }
            Commands::BuildTally { election } => {
                build_tally::execute(&coordinator().await?, &election).await?
            }
            Commands::Submit {
                election,
                user,
                credentials,
            } => submit::execute(&coordinator().await?, &election, &user, &credentials).await?,
            Commands::Combine { election } => {
                combine::execute(&coordinator().await?, &election).await?
            }
            Commands::Status { election } => status::execute(&coordinator().await?, &election)?,
            Commands::Password { command } => password::execute(command, &config).await?,
        }

        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register an election and its guardians from a yaml description
    Register {
        /// Election setup file
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Seal a guardian's key material and write the credential file
    IssueCredentials {
        #[arg(long, short)]
        election: String,

        /// Guardian sequence order
        #[arg(long, short)]
        sequence: u32,

        /// File holding the guardian's private key
        #[arg(long)]
        private_key: PathBuf,

        /// File holding the guardian's polynomial
        #[arg(long)]
        polynomial: PathBuf,

        /// Directory the credential file is written to
        #[arg(long, short, default_value = ".")]
        out: PathBuf,
    },

    /// Record encrypted ballots, one file per ballot
    Cast {
        #[arg(long, short)]
        election: String,

        #[arg(required = true)]
        ballots: Vec<PathBuf>,
    },

    /// Build the encrypted tally once voting has ended
    BuildTally {
        #[arg(long, short)]
        election: String,
    },

    /// Submit a guardian's partial decryption using their credential file
    Submit {
        #[arg(long, short)]
        election: String,

        /// The guardian's user id
        #[arg(long, short)]
        user: String,

        /// The credential file the guardian downloaded
        #[arg(long)]
        credentials: PathBuf,
    },

    /// Combine the submitted shares and publish the results
    Combine {
        #[arg(long, short)]
        election: String,
    },

    /// Show decryption progress as json
    Status {
        #[arg(long, short)]
        election: String,
    },

    /// Manage the password protecting stored secrets
    Password {
        #[command(subcommand)]
        command: PasswordCommands,
    },
}
