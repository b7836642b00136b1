// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{build_tally, combine, compensated_decrypt, partial_decrypt};

/// The operations the crypto service exposes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CryptoOperation {
    BuildTally,
    PartialDecrypt,
    CompensatedDecrypt,
    Combine,
}

impl CryptoOperation {
    /// Path segment appended to the service base url
    pub fn path(&self) -> &'static str {
        match self {
            CryptoOperation::BuildTally => "build_tally",
            CryptoOperation::PartialDecrypt => "partial_decrypt",
            CryptoOperation::CompensatedDecrypt => "compensated_decrypt",
            CryptoOperation::Combine => "combine",
        }
    }
}

impl fmt::Display for CryptoOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Any request sent to the crypto service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CryptoRequest {
    BuildTally(build_tally::Request),
    PartialDecrypt(partial_decrypt::Request),
    CompensatedDecrypt(compensated_decrypt::Request),
    Combine(combine::Request),
}

impl CryptoRequest {
    pub fn operation(&self) -> CryptoOperation {
        match self {
            CryptoRequest::BuildTally(_) => CryptoOperation::BuildTally,
            CryptoRequest::PartialDecrypt(_) => CryptoOperation::PartialDecrypt,
            CryptoRequest::CompensatedDecrypt(_) => CryptoOperation::CompensatedDecrypt,
            CryptoRequest::Combine(_) => CryptoOperation::Combine,
        }
    }
}

/// Any response returned by the crypto service
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CryptoResponse {
    BuildTally(build_tally::Response),
    PartialDecrypt(partial_decrypt::Response),
    CompensatedDecrypt(compensated_decrypt::Response),
    Combine(combine::Response),
}
