// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::{Context, Result};
use std::path::Path;

/// Read a yaml file substituting `${VAR}` references from the environment.
pub fn load_yaml_with_env(file_path: &Path) -> Result<String> {
    let content = std::fs::read_to_string(file_path)
        .with_context(|| format!("Could not read {}", file_path.display()))?;
    let expanded = shellexpand::env(&content)
        .with_context(|| format!("Could not expand variables in {}", file_path.display()))?;
    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_env_substitution() {
        Jail::expect_with(|jail| {
            jail.set_env("EG_TEST_PORT", "9000");
            jail.create_file("c.yaml", "url: \"http://localhost:${EG_TEST_PORT}\"")?;
            let loaded = load_yaml_with_env(&jail.directory().join("c.yaml"))
                .map_err(|e| e.to_string())?;
            assert_eq!(loaded, "url: \"http://localhost:9000\"");
            Ok(())
        });
    }
}
