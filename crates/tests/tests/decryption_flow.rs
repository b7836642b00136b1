// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::Result;
use eg_data::DataStore;
use eg_decryption::{
    repo::CompensatedShareRepositoryFactory, DecryptionError, ElectionStatus,
};
use eg_rpc::CryptoOperation;
use eg_test_helpers::hand_tally;
use eg_tests::{standard_votes, TestSystem, ELECTION_ID};
use tempfile::tempdir;
use tracing_test::traced_test;

/// 5 guardians, quorum 3. Guardians 1, 3 and 5 submit, 2 and 4 are covered by guardian 1.
#[tokio::test]
#[traced_test]
async fn test_end_to_end_with_missing_guardians() -> Result<()> {
    let system = TestSystem::new(5, 3).await?;

    for seq in [1, 3, 5] {
        system.submit(seq).await?;
    }

    let status = system.coordinator.status(ELECTION_ID)?;
    assert_eq!(status.submitted, vec![1, 3, 5]);
    assert_eq!(status.missing, vec![2, 4]);
    assert_eq!(status.compensators.get(&2), Some(&Some(1)));
    assert_eq!(status.compensators.get(&4), Some(&Some(1)));
    assert!(status.ready_to_combine());

    let results = system.coordinator.combine(ELECTION_ID).await?;
    let expected = hand_tally(&standard_votes());
    for result in &results.results {
        assert_eq!(
            Some(&result.votes),
            expected.get(&result.candidate_name),
            "{}",
            result.candidate_name
        );
    }
    assert_eq!(results.votes_for("Alice"), Some(3));
    assert_eq!(results.total(), standard_votes().len() as u64);
    assert_eq!(
        results
            .results
            .iter()
            .map(|r| r.party_name.as_str())
            .collect::<Vec<_>>(),
        vec!["Blue", "Red", "Green"]
    );

    let status = system.coordinator.status(ELECTION_ID)?;
    assert_eq!(status.status, ElectionStatus::Decrypted);
    assert_eq!(status.results, Some(results));
    assert!(logs_contain("election decrypted"));
    Ok(())
}

#[tokio::test]
async fn test_combine_sequences_are_index_aligned() -> Result<()> {
    let system = TestSystem::new(5, 3).await?;
    // Guardian 3 goes first so both 1 and 3 hold rows for the missing guardians
    for seq in [3, 5, 1] {
        system.submit(seq).await?;
    }
    system.coordinator.combine(ELECTION_ID).await?;

    let requests = system.crypto.combine_requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.available_guardian_ids, vec![1, 3, 5]);
    assert_eq!(
        request.available_tally_shares,
        vec!["share-1", "share-3", "share-5"]
    );
    assert_eq!(request.missing_guardian_ids, vec![2, 4]);
    assert_eq!(request.compensating_guardian_ids, vec![1, 1]);
    assert_eq!(
        request.compensated_tally_shares,
        vec!["comp-2-by-1", "comp-4-by-1"]
    );
    assert_eq!(request.compensated_ballot_shares.len(), 2);
    assert!(request
        .compensated_ballot_shares
        .iter()
        .all(|shares| shares.len() == standard_votes().len()));
    assert_eq!(request.guardian_key_backups.len(), 5);
    assert_eq!(request.context.candidate_names, vec!["Alice", "Bob", "Carol"]);
    Ok(())
}

#[tokio::test]
async fn test_lowest_compensator_is_canonical() -> Result<()> {
    let system = TestSystem::new(5, 3).await?;
    let repositories = system.coordinator.context().repositories.clone();

    system.submit(3).await?;
    system.submit(1).await?;
    let report = system
        .submit(2)
        .await?
        .compensation
        .expect("compensation ran");
    // Guardian 1 was only covered by 3, everyone else already has a row from guardian 1
    assert_eq!(report.stored, vec![1]);
    assert_eq!(report.skipped, vec![3, 4, 5]);

    for missing in [4, 5] {
        let rows = repositories
            .compensated_shares(ELECTION_ID, missing)
            .read()?
            .unwrap_or_default();
        let mut by: Vec<_> = rows
            .iter()
            .map(|r| r.compensating_guardian_sequence)
            .collect();
        by.sort_unstable();
        assert_eq!(by, vec![1, 3], "rows for guardian {missing}");
    }

    system.coordinator.combine(ELECTION_ID).await?;
    let request = &system.crypto.combine_requests()[0];
    assert_eq!(request.missing_guardian_ids, vec![4, 5]);
    assert_eq!(request.compensating_guardian_ids, vec![1, 1]);
    Ok(())
}

#[tokio::test]
async fn test_compensation_is_complete_after_first_submission() -> Result<()> {
    let system = TestSystem::new(4, 3).await?;
    let receipt = system.submit(2).await?;
    let report = receipt.compensation.expect("compensation ran");
    assert_eq!(report.stored, vec![1, 3, 4]);
    assert!(report.is_complete());

    let status = system.coordinator.status(ELECTION_ID)?;
    assert!(status.tally_built);
    assert!(status.compensators.values().all(|c| *c == Some(2)));
    assert!(!status.quorum_met());
    assert!(!status.ready_to_combine());
    Ok(())
}

#[tokio::test]
async fn test_quorum_is_enforced() -> Result<()> {
    let system = TestSystem::new(5, 3).await?;
    system.submit(1).await?;
    system.submit(2).await?;

    let err = system
        .coordinator
        .combine(ELECTION_ID)
        .await
        .expect_err("two of five is below quorum");
    assert!(matches!(
        err,
        DecryptionError::QuorumNotMet {
            submitted: 2,
            guardian_count: 5,
            quorum: 3
        }
    ));
    assert_eq!(err.user_message(), "2/5 guardians submitted, need 3");
    assert_eq!(system.crypto.calls(CryptoOperation::Combine), 0);

    system.submit(3).await?;
    let results = system.coordinator.combine(ELECTION_ID).await?;
    assert_eq!(results.total(), standard_votes().len() as u64);
    Ok(())
}

#[tokio::test]
async fn test_decryption_is_one_way() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    system.submit(1).await?;
    system.submit(2).await?;

    let first = system.coordinator.combine(ELECTION_ID).await?;
    let second = system.coordinator.combine(ELECTION_ID).await?;
    assert_eq!(first, second);
    assert_eq!(system.crypto.calls(CryptoOperation::Combine), 1);

    assert!(matches!(
        system.submit(3).await,
        Err(DecryptionError::ElectionAlreadyDecrypted(_))
    ));
    // A guardian who already submitted is told so, whatever the election status
    assert!(matches!(
        system.submit(1).await,
        Err(DecryptionError::AlreadySubmitted(1))
    ));
    assert!(matches!(
        system.coordinator.cast_ballot(ELECTION_ID, "late").await,
        Err(DecryptionError::BallotsClosed(_))
    ));
    Ok(())
}

#[tokio::test]
async fn test_combine_reports_missing_compensation() -> Result<()> {
    let system = TestSystem::new(4, 2).await?;
    system.crypto.fail_compensation_for(4);
    system.submit(1).await?;
    system.submit(2).await?;

    assert!(matches!(
        system.coordinator.combine(ELECTION_ID).await,
        Err(DecryptionError::IncompleteCompensation(4))
    ));
    let status = system.coordinator.status(ELECTION_ID)?;
    assert_eq!(status.compensators.get(&3), Some(&Some(1)));
    assert_eq!(status.compensators.get(&4), Some(&None));
    Ok(())
}

#[tokio::test]
async fn test_unknown_candidate_from_service() -> Result<()> {
    let system = TestSystem::new(3, 2).await?;
    system.submit(1).await?;
    system.submit(2).await?;
    system
        .crypto
        .override_results([("Mallory".to_string(), 7)].into_iter().collect());

    let err = system
        .coordinator
        .combine(ELECTION_ID)
        .await
        .expect_err("unknown candidate");
    assert!(matches!(err, DecryptionError::UnknownCandidate(ref name) if name == "Mallory"));
    assert_eq!(
        system.coordinator.status(ELECTION_ID)?.status,
        ElectionStatus::Active
    );
    Ok(())
}

#[tokio::test]
async fn test_full_flow_on_sled() -> Result<()> {
    let dir = tempdir()?;
    let store = DataStore::sled(&dir.path().join("db"))?;
    let system = TestSystem::with_store(store, 3, 2).await?;

    system.submit(2).await?;
    system.submit(3).await?;
    let results = system.coordinator.combine(ELECTION_ID).await?;
    assert_eq!(results.votes_for("Bob"), Some(2));

    // A second handle on the same database sees the decrypted election
    let reopened = eg_tests::coordinator(
        DataStore::sled(&dir.path().join("db"))?,
        system.crypto.clone(),
    )
    .await?;
    assert_eq!(reopened.combine(ELECTION_ID).await?, results);
    assert_eq!(system.crypto.calls(CryptoOperation::Combine), 1);
    Ok(())
}
