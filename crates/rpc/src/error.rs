// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::CryptoOperation;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RpcError {
    #[error("{operation} did not answer within {after:?}")]
    Timeout {
        operation: CryptoOperation,
        after: Duration,
    },

    #[error("{operation} returned an unusable response: {reason}")]
    Protocol {
        operation: CryptoOperation,
        reason: String,
    },

    #[error("{operation} could not reach the crypto service: {reason}")]
    Unavailable {
        operation: CryptoOperation,
        reason: String,
    },
}

impl RpcError {
    pub fn protocol(operation: CryptoOperation, reason: impl Into<String>) -> Self {
        RpcError::Protocol {
            operation,
            reason: reason.into(),
        }
    }

    pub fn unavailable(operation: CryptoOperation, reason: impl Into<String>) -> Self {
        RpcError::Unavailable {
            operation,
            reason: reason.into(),
        }
    }

    pub fn operation(&self) -> CryptoOperation {
        match self {
            RpcError::Timeout { operation, .. }
            | RpcError::Protocol { operation, .. }
            | RpcError::Unavailable { operation, .. } => *operation,
        }
    }
}
