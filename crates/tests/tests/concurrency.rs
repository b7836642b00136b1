// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::time::Duration;

use anyhow::Result;
use eg_decryption::{repo::CompensatedShareRepositoryFactory, DecryptionError};
use eg_rpc::CryptoOperation;
use eg_tests::{standard_votes, TestSystem, ELECTION_ID};
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_build_the_tally_once() -> Result<()> {
    let system = TestSystem::new(5, 3).await?;
    // Keep the tally call open long enough for every submission to pile up behind it
    system
        .crypto
        .delay(CryptoOperation::BuildTally, Duration::from_millis(100));

    let outcomes = join_all((1..=5).map(|seq| system.submit(seq))).await;
    for outcome in outcomes {
        outcome?;
    }

    assert_eq!(system.crypto.calls(CryptoOperation::BuildTally), 1);
    assert_eq!(system.crypto.calls(CryptoOperation::PartialDecrypt), 5);
    let submitted = system
        .coordinator
        .context()
        .submitted_ballots(ELECTION_ID)?;
    assert_eq!(submitted, standard_votes());

    let results = system.coordinator.combine(ELECTION_ID).await?;
    assert_eq!(results.total(), standard_votes().len() as u64);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resubmission_is_rejected() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;

    let (a, b) = tokio::join!(system.submit(1), system.submit(1));
    let (ok, rejected): (Vec<_>, Vec<_>) = [a, b].into_iter().partition(|r| r.is_ok());
    assert_eq!(ok.len(), 1);
    assert_eq!(rejected.len(), 1);
    assert!(matches!(
        rejected[0],
        Err(DecryptionError::AlreadySubmitted(1))
    ));
    assert_eq!(system.crypto.calls(CryptoOperation::PartialDecrypt), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_tally_requests_share_one_result() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    system
        .crypto
        .delay(CryptoOperation::BuildTally, Duration::from_millis(50));

    let tallies = join_all((0..4).map(|_| system.coordinator.build_tally(ELECTION_ID))).await;
    let tallies = tallies.into_iter().collect::<Result<Vec<_>, _>>()?;
    assert!(tallies.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(system.crypto.calls(CryptoOperation::BuildTally), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_compensators_settle_on_lowest() -> Result<()> {
    let system = TestSystem::new(6, 3).await?;
    let repositories = system.coordinator.context().repositories.clone();

    let outcomes = join_all([4, 2, 3].map(|seq| system.submit(seq))).await;
    for outcome in outcomes {
        outcome?;
    }

    for missing in [1, 5, 6] {
        let rows = repositories
            .compensated_shares(ELECTION_ID, missing)
            .read()?
            .unwrap_or_default();
        let lowest = rows.iter().map(|r| r.compensating_guardian_sequence).min();
        assert_eq!(lowest, Some(2), "guardian {missing}");
    }

    system.coordinator.combine(ELECTION_ID).await?;
    let request = &system.crypto.combine_requests()[0];
    assert_eq!(request.missing_guardian_ids, vec![1, 5, 6]);
    assert_eq!(request.compensating_guardian_ids, vec![2, 2, 2]);
    Ok(())
}

#[tokio::test]
async fn test_service_timeout_is_retryable() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    system.submit(1).await?;
    system.submit(2).await?;
    system
        .crypto
        .delay(CryptoOperation::Combine, Duration::from_secs(30));

    let combine = tokio::time::timeout(
        Duration::from_secs(10),
        system.coordinator.combine(ELECTION_ID),
    )
    .await?;
    let err = combine.expect_err("combine is held past the rpc timeout");
    assert!(matches!(err, DecryptionError::RpcTimeout(CryptoOperation::Combine)));
    assert!(err.is_retryable());
    assert_eq!(
        err.user_message(),
        "decryption service unavailable, retry later"
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_submission_during_combine_is_rejected() -> Result<()> {
    let system = TestSystem::new(5, 2).await?;
    system.submit(1).await?;
    system.submit(2).await?;
    system
        .crypto
        .delay(CryptoOperation::Combine, Duration::from_millis(300));

    let (combined, late) = tokio::join!(system.coordinator.combine(ELECTION_ID), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        system.submit(3).await
    });
    let results = combined?;
    assert!(matches!(
        late,
        Err(DecryptionError::ElectionAlreadyDecrypted(_))
    ));

    let request = &system.crypto.combine_requests()[0];
    assert_eq!(request.available_guardian_ids, vec![1, 2]);
    let status = system.coordinator.status(ELECTION_ID)?;
    assert_eq!(status.submitted, vec![1, 2]);
    assert_eq!(status.results, Some(results));
    Ok(())
}
