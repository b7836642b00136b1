// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_crypto::EncryptedBlob;
use eg_decryption::DecryptionError;
use eg_rpc::CryptoOperation;
use eg_test_helpers::{mock_polynomial, mock_private_key, mock_user_id};
use eg_tests::{TestSystem, ELECTION_ID};

#[tokio::test]
async fn test_another_guardians_file_is_rejected() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    let err = system
        .coordinator
        .submit_partial_decryption(ELECTION_ID, &mock_user_id(1), system.blob(2)?)
        .await
        .expect_err("file belongs to guardian 2");
    assert!(matches!(err, DecryptionError::CredentialDecryption));
    assert!(!err.is_retryable());
    assert_eq!(err.user_message(), "wrong credential file");
    assert_eq!(system.crypto.calls(CryptoOperation::PartialDecrypt), 0);

    // Guardian 1 can still submit with the right file
    system.submit(1).await?;
    Ok(())
}

#[tokio::test]
async fn test_damaged_files_are_rejected() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    let original = system.blob(1)?.as_str().to_string();

    let mut flipped = original.clone().into_bytes();
    let last = flipped.len() - 1;
    flipped[last] = if flipped[last] == b'0' { b'1' } else { b'0' };
    let candidates = [
        EncryptedBlob::from(String::from_utf8(flipped)?),
        EncryptedBlob::from(original[..original.len() / 2].to_string()),
        EncryptedBlob::from("not a credential file".to_string()),
        EncryptedBlob::from(String::new()),
    ];
    for blob in candidates {
        assert!(matches!(
            system
                .coordinator
                .submit_partial_decryption(ELECTION_ID, &mock_user_id(1), &blob)
                .await,
            Err(DecryptionError::CredentialDecryption)
        ));
    }
    assert!(!system.coordinator.context().guardian(ELECTION_ID, 1)?.submitted());
    Ok(())
}

#[tokio::test]
async fn test_reissued_credentials_replace_the_old_file() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    let fresh = system
        .coordinator
        .issue_credentials(ELECTION_ID, 1, &mock_private_key(1), &mock_polynomial(1))
        .await?;

    assert!(matches!(
        system.submit(1).await,
        Err(DecryptionError::CredentialDecryption)
    ));
    system
        .coordinator
        .submit_partial_decryption(
            ELECTION_ID,
            &mock_user_id(1),
            &EncryptedBlob::from(fresh.contents),
        )
        .await?;

    assert!(matches!(
        system
            .coordinator
            .issue_credentials(ELECTION_ID, 1, &mock_private_key(1), &mock_polynomial(1))
            .await,
        Err(DecryptionError::AlreadySubmitted(1))
    ));
    Ok(())
}

#[tokio::test]
async fn test_key_material_that_does_not_match_leaves_guardian_pending() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    let file = system
        .coordinator
        .issue_credentials(ELECTION_ID, 2, &mock_private_key(3), &mock_polynomial(3))
        .await?;

    let err = system
        .coordinator
        .submit_partial_decryption(
            ELECTION_ID,
            &mock_user_id(2),
            &EncryptedBlob::from(file.contents),
        )
        .await
        .expect_err("keys belong to guardian 3");
    assert!(matches!(err, DecryptionError::InvalidKey));

    let status = system.coordinator.status(ELECTION_ID)?;
    assert!(status.submitted.is_empty());
    assert!(status.tally_built);
    Ok(())
}
