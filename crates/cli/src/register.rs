// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use eg_decryption::{Coordinator, ElectionSetup};

use crate::helpers::user_error;

pub fn read_setup(file: &Path) -> Result<ElectionSetup> {
    let contents =
        fs::read_to_string(file).with_context(|| format!("Could not read {}", file.display()))?;
    serde_yaml::from_str(&contents)
        .with_context(|| format!("{} is not a valid election setup", file.display()))
}

pub async fn execute(coordinator: &Coordinator, file: &Path) -> Result<()> {
    let setup = read_setup(file)?;
    let election = coordinator
        .register_election(setup)
        .await
        .map_err(user_error)?;
    println!(
        "Registered election '{}' ({}) with {} guardians, quorum {}",
        election.name, election.id, election.guardian_count, election.quorum
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_setup_yaml() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("election.yaml");
        fs::write(
            &path,
            r#"
id: board-2026
name: Board of trustees
quorum: 2
joint_public_key: joint-key
commitment_hash: commitment
ends_at: 2026-03-01T18:00:00Z
admin: returning-officer
choices:
  - candidate_name: Alice
    party_name: Blue
  - candidate_name: Bob
    party_name: Red
guardians:
  - user_id: guardian-1
    sequence_order: 1
    public_key: pk-1
    key_backup: backup-1
  - user_id: guardian-2
    sequence_order: 2
    public_key: pk-2
    key_backup: backup-2
  - user_id: guardian-3
    sequence_order: 3
    public_key: pk-3
    key_backup: backup-3
"#,
        )?;

        let setup = read_setup(&path)?;
        assert_eq!(setup.id, "board-2026");
        assert_eq!(setup.quorum, 2);
        assert_eq!(setup.choices.len(), 2);
        assert_eq!(setup.guardians[2].sequence_order, 3);
        assert_eq!(setup.admin.as_deref(), Some("returning-officer"));
        assert!(setup.ends_at.is_some());

        fs::write(&path, "id: [")?;
        assert!(read_setup(&path).is_err());
        Ok(())
    }
}
