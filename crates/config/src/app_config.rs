// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::load_config::find_in_parent;
use crate::load_config::resolve_config_path;
use crate::yaml::load_yaml_with_env;
use anyhow::{anyhow, bail, Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use path_clean::clean;
use serde::{Deserialize, Serialize};
use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_CONFIG_NAME: &str = "eg.config.yaml";
pub const DEFAULT_KEY_NAME: &str = "key";
pub const DEFAULT_DB_NAME: &str = "db";
pub const DEFAULT_NAME: &str = "_default";
pub const ENV_PREFIX: &str = "EG_";

/// Where the crypto microservice lives and how long we wait for it
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
#[serde(deny_unknown_fields)]
pub struct CryptoServiceConfig {
    /// Base url, each RPC is posted to `{url}/{operation}`
    pub url: String,
    /// Per request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CryptoServiceConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Configuration as it is read from defaults, yaml and environment
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct UnscopedAppConfig {
    /// The instance name. Used to separate data of several instances on one machine.
    name: String,
    /// The base folder for configuration defaults to `~/.config/eg` on linux
    config_dir: Option<PathBuf>,
    /// The data dir defaults to `~/.local/share/eg`
    data_dir: Option<PathBuf>,
    /// Fully qualified path or a path relative to `{data_dir}/{name}`
    db_file: PathBuf,
    /// Fully qualified path or a path relative to `{config_dir}/{name}`
    key_file: PathBuf,
    /// Keep everything in memory. Nothing survives a restart.
    in_mem_store: bool,
    crypto_service: CryptoServiceConfig,
    /// Default tracing level when no verbosity flag is passed
    log_level: String,
    /// The config file as found before initialization
    found_config_file: Option<PathBuf>,
}

impl Default for UnscopedAppConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            config_dir: None,
            data_dir: None,
            db_file: PathBuf::from(DEFAULT_DB_NAME),
            key_file: PathBuf::from(DEFAULT_KEY_NAME),
            in_mem_store: false,
            crypto_service: CryptoServiceConfig::default(),
            log_level: "info".to_string(),
            found_config_file: None,
        }
    }
}

impl UnscopedAppConfig {
    /// Convert to a resolved configuration using local OS based default directories
    pub fn into_scoped(self) -> Result<AppConfig> {
        self.into_scoped_with_defaults(
            &OsDirs::data_dir()?,
            &OsDirs::config_dir()?,
            &env::current_dir()?,
        )
    }

    /// Convert to a resolved configuration passing in the default directories
    pub fn into_scoped_with_defaults(
        self,
        default_data_dir: &Path,
        default_config_dir: &Path,
        cwd: &Path,
    ) -> Result<AppConfig> {
        if self.name.is_empty() {
            bail!("Instance name cannot be empty");
        }
        if self.crypto_service.timeout_secs == 0 {
            bail!("crypto_service.timeout_secs must be greater than zero");
        }
        if self.crypto_service.url.is_empty() {
            bail!("crypto_service.url must be set");
        }

        let absolute = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                clean(cwd.join(p))
            }
        };

        let data_dir = self
            .data_dir
            .as_ref()
            .map(absolute)
            .unwrap_or_else(|| default_data_dir.to_path_buf())
            .join(&self.name);
        let config_dir = self
            .config_dir
            .as_ref()
            .map(absolute)
            .unwrap_or_else(|| default_config_dir.to_path_buf());

        let config_file = self
            .found_config_file
            .clone()
            .unwrap_or_else(|| config_dir.join(DEFAULT_CONFIG_NAME));

        let db_file = within(&data_dir, &self.db_file);
        let key_file = within(&config_dir.join(&self.name), &self.key_file);

        Ok(AppConfig {
            name: self.name,
            config_file,
            db_file,
            key_file,
            in_mem_store: self.in_mem_store,
            crypto_service: self.crypto_service,
            log_level: self.log_level,
        })
    }
}

fn within(dir: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }
    clean(dir.join(file))
}

/// The config actually used throughout the app
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    name: String,
    config_file: PathBuf,
    db_file: PathBuf,
    key_file: PathBuf,
    in_mem_store: bool,
    crypto_service: CryptoServiceConfig,
    log_level: String,
}

impl AppConfig {
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Get the config file path
    pub fn config_file(&self) -> PathBuf {
        self.config_file.clone()
    }

    /// Get the database file
    pub fn db_file(&self) -> PathBuf {
        self.db_file.clone()
    }

    /// Get the key_file holding the server password
    pub fn key_file(&self) -> PathBuf {
        self.key_file.clone()
    }

    /// Use the in-memory store
    pub fn use_in_mem_store(&self) -> bool {
        self.in_mem_store
    }

    pub fn crypto_service(&self) -> &CryptoServiceConfig {
        &self.crypto_service
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.crypto_service.timeout_secs)
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

/// Value struct for passing configuration from the cli to the configuration
#[derive(Default, Serialize, Deserialize, Clone, Debug)]
struct CliOverrides {
    pub found_config_file: Option<PathBuf>,
}

/// Load the config at the config_file or the default location if not provided.
///
/// Sources are merged in order: built in defaults, the yaml file (with `${VAR}` substitution),
/// `EG_` prefixed environment variables. Nested keys use a double underscore, eg.
/// `EG_CRYPTO_SERVICE__TIMEOUT_SECS=5`.
pub fn load_config(config_file: Option<String>) -> Result<AppConfig> {
    let cli_file = config_file.map(PathBuf::from);
    let explicit = cli_file.is_some();

    let resolved_config_path = resolve_config_path(
        find_in_parent,
        env::current_dir()?,
        OsDirs::config_dir()?,
        DEFAULT_CONFIG_NAME,
        cli_file,
    );

    let loaded_yaml = if explicit || resolved_config_path.exists() {
        load_yaml_with_env(&resolved_config_path).context("Configuration file not found")?
    } else {
        String::new()
    };

    let config: UnscopedAppConfig =
        Figment::from(Serialized::defaults(&UnscopedAppConfig::default()))
            .merge(Yaml::string(&loaded_yaml))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(Serialized::defaults(&CliOverrides {
                found_config_file: Some(resolved_config_path),
            }))
            .extract()
            .context("Could not parse configuration")?;

    config
        .into_scoped()
        .context("Could not resolve configuration paths")
}

pub struct OsDirs;
impl OsDirs {
    pub fn config_dir() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .ok_or_else(|| anyhow!("This OS does not provide a config dir. See https://docs.rs/dirs for more information."))?
            .join("eg"))
    }

    pub fn data_dir() -> Result<PathBuf> {
        Ok(dirs::data_local_dir()
            .ok_or_else(|| anyhow!("This OS does not provide a data dir. See https://docs.rs/dirs for more information."))?
            .join("eg"))
    }
}
