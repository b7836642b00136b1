// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Deterministic stand-in for the crypto service.
//!
//! Ballots are `ballot-{n}:{candidate}`, the tally is `tally|{candidate}={count}|...` in choice
//! order and shares name the guardian that produced them. `combine` checks that every share it is
//! handed lines up with the guardian ids next to it and that the quorum holds, so orchestration
//! mistakes surface as protocol errors.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Mutex,
    time::Duration,
};

use async_trait::async_trait;
use eg_rpc::{
    build_tally, combine, compensated_decrypt, partial_decrypt, CryptoOperation, CryptoRequest,
    CryptoService, GuardianId, RpcError,
};
use tracing::debug;

use crate::{ballot_candidate, mock_key_backup, mock_polynomial, mock_private_key};

const TALLY_PREFIX: &str = "tally";

#[derive(Default)]
struct MockState {
    requests: Vec<CryptoRequest>,
    delays: HashMap<CryptoOperation, Duration>,
    failing: HashSet<CryptoOperation>,
    failing_compensation: HashSet<GuardianId>,
    results_override: Option<BTreeMap<String, u64>>,
}

#[derive(Default)]
pub struct MockCryptoService {
    state: Mutex<MockState>,
}

impl MockCryptoService {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn requests(&self) -> Vec<CryptoRequest> {
        self.state().requests.clone()
    }

    pub fn calls(&self, operation: CryptoOperation) -> usize {
        self.state()
            .requests
            .iter()
            .filter(|r| r.operation() == operation)
            .count()
    }

    pub fn combine_requests(&self) -> Vec<combine::Request> {
        self.state()
            .requests
            .iter()
            .filter_map(|r| match r {
                CryptoRequest::Combine(req) => Some(req.clone()),
                _ => None,
            })
            .collect()
    }

    /// Hold every call of this operation for `after` before answering
    pub fn delay(&self, operation: CryptoOperation, after: Duration) {
        self.state().delays.insert(operation, after);
    }

    /// Every call of this operation fails as unavailable
    pub fn fail(&self, operation: CryptoOperation) {
        self.state().failing.insert(operation);
    }

    /// Compensated shares for this missing guardian fail as unavailable
    pub fn fail_compensation_for(&self, missing: GuardianId) {
        self.state().failing_compensation.insert(missing);
    }

    /// Make `combine` answer with these counts instead of the tally contents
    pub fn override_results(&self, results: BTreeMap<String, u64>) {
        self.state().results_override = Some(results);
    }

    async fn enter(&self, request: CryptoRequest) -> Result<(), RpcError> {
        let operation = request.operation();
        let (delay, failing) = {
            let mut state = self.state();
            state.requests.push(request);
            (
                state.delays.get(&operation).copied(),
                state.failing.contains(&operation),
            )
        };
        debug!(%operation, "mock crypto call");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(RpcError::unavailable(operation, "injected failure"));
        }
        Ok(())
    }
}

fn protocol(operation: CryptoOperation, reason: impl Into<String>) -> RpcError {
    RpcError::protocol(operation, reason)
}

fn encode_tally(candidates: &[String], ballots: &[String]) -> Result<String, RpcError> {
    let mut counts: Vec<u64> = vec![0; candidates.len()];
    for ballot in ballots {
        let candidate = ballot_candidate(ballot).ok_or_else(|| {
            protocol(CryptoOperation::BuildTally, format!("unreadable ballot {ballot}"))
        })?;
        let index = candidates
            .iter()
            .position(|c| c == candidate)
            .ok_or_else(|| {
                protocol(
                    CryptoOperation::BuildTally,
                    format!("ballot for unknown candidate {candidate}"),
                )
            })?;
        counts[index] += 1;
    }
    let mut tally = TALLY_PREFIX.to_string();
    for (candidate, count) in candidates.iter().zip(counts) {
        tally.push_str(&format!("|{candidate}={count}"));
    }
    Ok(tally)
}

fn decode_tally(tally: &str) -> Result<BTreeMap<String, u64>, RpcError> {
    let malformed = || protocol(CryptoOperation::Combine, format!("malformed tally {tally}"));
    let mut parts = tally.split('|');
    if parts.next() != Some(TALLY_PREFIX) {
        return Err(malformed());
    }
    parts
        .map(|part| -> Result<(String, u64), RpcError> {
            let (candidate, count) = part.split_once('=').ok_or_else(malformed)?;
            let count = count.parse::<u64>().map_err(|_| malformed())?;
            Ok((candidate.to_string(), count))
        })
        .collect()
}

fn shares_for(prefix: &str, ballots: &[String]) -> Vec<String> {
    (0..ballots.len()).map(|i| format!("{prefix}-{i}")).collect()
}

fn holds_key(seq: GuardianId, private_key: &str, polynomial: &str) -> bool {
    private_key == mock_private_key(seq) && polynomial == mock_polynomial(seq)
}

fn check_combine(req: &combine::Request) -> Result<(), RpcError> {
    let op = CryptoOperation::Combine;
    let available = req.available_guardian_ids.len();
    if req.available_public_keys.len() != available
        || req.available_tally_shares.len() != available
        || req.available_ballot_shares.len() != available
    {
        return Err(protocol(op, "available guardian sequences are misaligned"));
    }
    let missing = req.missing_guardian_ids.len();
    if req.compensating_guardian_ids.len() != missing
        || req.compensated_tally_shares.len() != missing
        || req.compensated_ballot_shares.len() != missing
    {
        return Err(protocol(op, "missing guardian sequences are misaligned"));
    }
    if (available as u32) < req.context.quorum {
        return Err(protocol(op, "not enough shares for quorum"));
    }
    if req.guardian_key_backups.len() as u32 != req.context.guardian_count {
        return Err(protocol(op, "key backups do not cover every guardian"));
    }

    let mut everyone: Vec<GuardianId> = req
        .available_guardian_ids
        .iter()
        .chain(req.missing_guardian_ids.iter())
        .copied()
        .collect();
    everyone.sort_unstable();
    if everyone != (1..=req.context.guardian_count).collect::<Vec<_>>() {
        return Err(protocol(op, "available and missing guardians do not partition the set"));
    }

    for (i, id) in req.available_guardian_ids.iter().enumerate() {
        if req.available_tally_shares[i] != format!("share-{id}") {
            return Err(protocol(op, format!("tally share {i} is not from guardian {id}")));
        }
        if req.guardian_key_backups[(*id as usize) - 1] != mock_key_backup(*id) {
            return Err(protocol(op, format!("key backups out of order at {id}")));
        }
    }
    for (i, missing) in req.missing_guardian_ids.iter().enumerate() {
        let compensator = req.compensating_guardian_ids[i];
        if !req.available_guardian_ids.contains(&compensator) {
            return Err(protocol(op, format!("compensator {compensator} did not submit")));
        }
        if req.compensated_tally_shares[i] != format!("comp-{missing}-by-{compensator}") {
            return Err(protocol(
                op,
                format!("compensated share {i} does not belong to guardian {missing}"),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl CryptoService for MockCryptoService {
    async fn build_tally(
        &self,
        req: build_tally::Request,
    ) -> Result<build_tally::Response, RpcError> {
        self.enter(CryptoRequest::BuildTally(req.clone())).await?;
        Ok(build_tally::Response {
            tally_ciphertext: encode_tally(&req.context.candidate_names, &req.ballot_ciphertexts)?,
            ballot_ciphertexts: req.ballot_ciphertexts,
        })
    }

    async fn partial_decrypt(
        &self,
        req: partial_decrypt::Request,
    ) -> Result<partial_decrypt::Response, RpcError> {
        self.enter(CryptoRequest::PartialDecrypt(req.clone())).await?;
        let id = req.guardian_id;
        if !holds_key(id, &req.private_key, &req.polynomial) || req.key_backup != mock_key_backup(id)
        {
            return Ok(partial_decrypt::Response {
                tally_share: None,
                ballot_shares: vec![],
                guardian_public_key: None,
            });
        }
        Ok(partial_decrypt::Response {
            tally_share: Some(format!("share-{id}")),
            ballot_shares: shares_for(&format!("share-{id}"), &req.ballot_ciphertexts),
            guardian_public_key: Some(format!("dpk-{id}")),
        })
    }

    async fn compensated_decrypt(
        &self,
        req: compensated_decrypt::Request,
    ) -> Result<compensated_decrypt::Response, RpcError> {
        self.enter(CryptoRequest::CompensatedDecrypt(req.clone()))
            .await?;
        let op = CryptoOperation::CompensatedDecrypt;
        let (by, missing) = (req.compensating_guardian_id, req.missing_guardian_id);
        let failing = self.state().failing_compensation.contains(&missing);
        if failing {
            return Err(RpcError::unavailable(op, "injected failure"));
        }
        if !holds_key(by, &req.private_key, &req.polynomial) {
            return Err(protocol(op, format!("guardian {by} key material rejected")));
        }
        if req.missing_key_backup != mock_key_backup(missing) {
            return Err(protocol(op, format!("wrong backup for guardian {missing}")));
        }
        let share = format!("comp-{missing}-by-{by}");
        Ok(compensated_decrypt::Response {
            compensated_ballot_shares: shares_for(&share, &req.ballot_ciphertexts),
            compensated_tally_share: share,
        })
    }

    async fn combine(&self, req: combine::Request) -> Result<combine::Response, RpcError> {
        self.enter(CryptoRequest::Combine(req.clone())).await?;
        check_combine(&req)?;
        let results_override = self.state().results_override.clone();
        if let Some(results) = results_override {
            return Ok(combine::Response { results });
        }
        Ok(combine::Response {
            results: decode_tally(&req.tally_ciphertext)?,
        })
    }
}
