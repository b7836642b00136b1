// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use eg_rpc::{CryptoOperation, GuardianId, RpcError};
use thiserror::Error;

const SERVICE_UNAVAILABLE: &str = "decryption service unavailable, retry later";

#[derive(Error, Debug)]
pub enum DecryptionError {
    #[error("election {0} not found")]
    ElectionNotFound(String),

    #[error("election {0} has not ended yet")]
    ElectionNotEnded(String),

    #[error("election {0} has no administrator on record")]
    MissingAdmin(String),

    #[error("election {0} has already been decrypted")]
    ElectionAlreadyDecrypted(String),

    #[error("ballots are closed for election {0}")]
    BallotsClosed(String),

    #[error("you are not a guardian of this election")]
    NotAGuardian,

    #[error("guardian {0} has already submitted a partial decryption")]
    AlreadySubmitted(GuardianId),

    #[error("no ballots have been cast in election {0}")]
    NoBallots(String),

    #[error("wrong credential file")]
    CredentialDecryption,

    #[error("the key material does not produce a decryption share for this guardian")]
    InvalidKey,

    #[error("{submitted}/{guardian_count} guardians submitted, need {quorum}")]
    QuorumNotMet {
        submitted: u32,
        guardian_count: u32,
        quorum: u32,
    },

    #[error("no compensated share exists for missing guardian {0}")]
    IncompleteCompensation(GuardianId),

    #[error("the encrypted tally has not been built yet")]
    TallyNotReady,

    #[error("crypto service timed out during {0}")]
    RpcTimeout(CryptoOperation),

    #[error("crypto service returned an unusable response: {0}")]
    RpcProtocol(String),

    #[error("crypto service unavailable: {0}")]
    RpcUnavailable(String),

    #[error("crypto service reported votes for unknown candidate {0:?}")]
    UnknownCandidate(String),

    #[error("invalid election setup: {0}")]
    InvalidSetup(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl DecryptionError {
    /// Text safe to show the person who triggered the operation.
    pub fn user_message(&self) -> String {
        match self {
            Self::RpcTimeout(_)
            | Self::RpcProtocol(_)
            | Self::RpcUnavailable(_)
            | Self::UnknownCandidate(_)
            | Self::Storage(_) => SERVICE_UNAVAILABLE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RpcTimeout(_) | Self::RpcProtocol(_) | Self::RpcUnavailable(_) | Self::Storage(_)
        )
    }
}

impl From<RpcError> for DecryptionError {
    fn from(value: RpcError) -> Self {
        match value {
            RpcError::Timeout { operation, .. } => Self::RpcTimeout(operation),
            e @ RpcError::Protocol { .. } => Self::RpcProtocol(e.to_string()),
            e @ RpcError::Unavailable { .. } => Self::RpcUnavailable(e.to_string()),
        }
    }
}
