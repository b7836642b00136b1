// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Sources for the server password that protects secrets at rest.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::{
    env,
    fs::{self, OpenOptions, Permissions},
    io::Write,
    os::unix::fs::{OpenOptionsExt, PermissionsExt},
    path::{Path, PathBuf},
};
use tracing::debug;
use zeroize::Zeroizing;

#[async_trait]
pub trait PasswordManager: Sync + Send {
    async fn get_key(&self) -> Result<Zeroizing<Vec<u8>>>;

    fn get_key_sync(&self) -> Result<Zeroizing<Vec<u8>>>;

    async fn delete_key(&mut self) -> Result<()>;

    async fn set_key(&mut self, contents: Zeroizing<Vec<u8>>) -> Result<()>;

    fn is_set(&self) -> bool;
}

/// Keeps the password in process memory. Used by tests and ephemeral deployments.
pub struct InMemPasswordManager(pub Option<Zeroizing<Vec<u8>>>);

impl InMemPasswordManager {
    pub fn new(value: Zeroizing<Vec<u8>>) -> Self {
        Self(Some(value))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(value: &str) -> Self {
        Self::new(Zeroizing::new(value.as_bytes().to_vec()))
    }
}

/// Snapshot of an environment variable taken at construction time.
pub struct EnvPasswordManager {
    var: String,
    value: Option<Zeroizing<Vec<u8>>>,
}

impl EnvPasswordManager {
    pub fn new(var: &str) -> Result<Self> {
        let value = env::var(var).with_context(|| format!("{} is not set", var))?;
        Ok(Self {
            var: var.to_string(),
            value: Some(Zeroizing::new(value.into_bytes())),
        })
    }
}

fn stored_key(slot: &Option<Zeroizing<Vec<u8>>>) -> Result<Zeroizing<Vec<u8>>> {
    slot.clone().ok_or_else(|| anyhow!("No key found"))
}

#[async_trait]
impl PasswordManager for InMemPasswordManager {
    async fn get_key(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.get_key_sync()
    }

    fn get_key_sync(&self) -> Result<Zeroizing<Vec<u8>>> {
        stored_key(&self.0)
    }

    async fn set_key(&mut self, contents: Zeroizing<Vec<u8>>) -> Result<()> {
        self.0 = Some(contents);
        Ok(())
    }

    async fn delete_key(&mut self) -> Result<()> {
        self.0 = None;
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.0.is_some()
    }
}

#[async_trait]
impl PasswordManager for EnvPasswordManager {
    async fn get_key(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.get_key_sync()
    }

    fn get_key_sync(&self) -> Result<Zeroizing<Vec<u8>>> {
        stored_key(&self.value).with_context(|| format!("{} was cleared", self.var))
    }

    async fn set_key(&mut self, contents: Zeroizing<Vec<u8>>) -> Result<()> {
        self.value = Some(contents);
        Ok(())
    }

    async fn delete_key(&mut self) -> Result<()> {
        self.value = None;
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.value.is_some()
    }
}

/// Reads the password from a file, typically a secret mounted by the orchestrator
/// (Docker Swarm secrets, Kubernetes secrets, Vault agent injection).
/// The file is kept read-only for its owner.
pub struct FilePasswordManager {
    path: PathBuf,
}

impl FilePasswordManager {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_owned(),
        }
    }
}

#[async_trait]
impl PasswordManager for FilePasswordManager {
    async fn get_key(&self) -> Result<Zeroizing<Vec<u8>>> {
        self.get_key_sync()
    }

    fn get_key_sync(&self) -> Result<Zeroizing<Vec<u8>>> {
        ensure_file_permissions(&self.path, 0o400)?;
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to access keyfile {}", self.path.display()))?;
        debug!(path = %self.path.display(), "read keyfile");
        Ok(Zeroizing::new(bytes))
    }

    async fn delete_key(&mut self) -> Result<()> {
        ensure_file_permissions(&self.path, 0o600)?;
        fs::remove_file(&self.path).context("Failed to remove keyfile")?;
        Ok(())
    }

    async fn set_key(&mut self, contents: Zeroizing<Vec<u8>>) -> Result<()> {
        let path = &self.path;
        if contents.is_empty() {
            bail!("Password must contain data!")
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create parent directories")?;
        }
        if path.exists() {
            bail!("Keyfile already exists. Refusing to overwrite.")
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o600)
            .open(path)
            .context("Failed to create keyfile")?;
        file.write_all(&contents)
            .context("Failed to write data to keyfile")?;
        file.flush().context("Failed to flush data to keyfile")?;
        drop(file);
        fs::set_permissions(path, Permissions::from_mode(0o400))
            .context("Failed to set permissions on keyfile")?;
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.path.exists()
    }
}

fn ensure_file_permissions(path: &Path, perms: u32) -> Result<()> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to get metadata for keyfile {}", path.display()))?;
    if metadata.permissions().mode() & 0o777 != perms {
        fs::set_permissions(path, Permissions::from_mode(perms))
            .context("Failed to set permissions for keyfile")?;
    }
    Ok(())
}
