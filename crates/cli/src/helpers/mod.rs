// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use eg_decryption::DecryptionError;
use zeroize::Zeroizing;

pub mod prompt_password;
pub mod telemetry;

/// Parse to a Zeroizing String
pub fn parse_zeroizing(s: &str) -> Result<Zeroizing<String>> {
    Ok(Zeroizing::new(s.to_string()))
}

/// Read a file that must hold a single non-empty value, such as a key or a ciphertext.
pub fn read_value(path: &Path) -> Result<Zeroizing<String>> {
    let contents = Zeroizing::new(
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?,
    );
    let value = contents.trim();
    if value.is_empty() {
        bail!("{} is empty", path.display());
    }
    parse_zeroizing(value)
}

/// Turn a coordinator error into something safe to print. The full error is logged.
pub fn user_error(err: DecryptionError) -> anyhow::Error {
    tracing::debug!(error = ?err, "operation failed");
    if err.is_retryable() {
        anyhow::anyhow!("{} (retryable)", err.user_message())
    } else {
        anyhow::anyhow!(err.user_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_value_trims() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("key");
        fs::write(&path, "  sk-1\n")?;
        assert_eq!(read_value(&path)?.as_str(), "sk-1");

        fs::write(&path, "\n\n")?;
        assert!(read_value(&path).is_err());
        assert!(read_value(&dir.path().join("missing")).is_err());
        Ok(())
    }
}
