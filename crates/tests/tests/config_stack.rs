// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::fs;

use anyhow::Result;
use eg_config::load_config;
use eg_crypto::{FilePasswordManager, PasswordManager};
use eg_decryption::{Coordinator, DecryptionError, ElectionStatus};
use eg_test_helpers::{mock_polynomial, mock_private_key};
use eg_tests::{election_setup, ELECTION_ID};
use tempfile::tempdir;
use zeroize::Zeroizing;

#[tokio::test]
async fn test_coordinator_from_yaml_config() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();
    let config_path = root.join("eg.config.yaml");
    fs::write(
        &config_path,
        format!(
            r#"
name: county
config_dir: {root}/config
data_dir: {root}/data
key_file: {root}/secrets/key
crypto_service:
  url: http://127.0.0.1:9
  timeout_secs: 3
"#,
            root = root.display()
        ),
    )?;

    let config = load_config(Some(config_path.to_string_lossy().to_string()))?;
    assert_eq!(config.key_file(), root.join("secrets/key"));
    assert_eq!(config.db_file(), root.join("data/county/db"));
    assert_eq!(config.rpc_timeout().as_secs(), 3);

    // No password yet
    assert!(Coordinator::from_config(&config).await.is_err());

    FilePasswordManager::new(config.key_file())
        .set_key(Zeroizing::new(b"county password".to_vec()))
        .await?;

    let coordinator = Coordinator::from_config(&config).await?;
    coordinator.register_election(election_setup(3, 2)).await?;
    let file = coordinator
        .issue_credentials(ELECTION_ID, 1, &mock_private_key(1), &mock_polynomial(1))
        .await?;
    assert_eq!(file.file_name(), format!("guardian-{ELECTION_ID}-1.credentials"));

    let status = coordinator.status(ELECTION_ID)?;
    assert_eq!(status.status, ElectionStatus::Active);
    assert_eq!(status.guardian_count, 3);
    assert!(!status.tally_built);
    assert!(config.db_file().exists());

    // Nothing listens on the configured port
    coordinator.cast_ballot(ELECTION_ID, "ballot-0:Alice").await?;
    let err = coordinator
        .build_tally(ELECTION_ID)
        .await
        .expect_err("crypto service is unreachable");
    assert!(matches!(
        err,
        DecryptionError::RpcUnavailable(_) | DecryptionError::RpcTimeout(_)
    ));
    assert!(err.is_retryable());
    assert!(!coordinator.status(ELECTION_ID)?.tally_built);
    Ok(())
}
