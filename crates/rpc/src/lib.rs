// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

pub mod build_tally;
pub mod combine;
pub mod compensated_decrypt;
mod context;
mod crypto_request;
mod error;
mod http;
pub mod partial_decrypt;
mod service;

pub use context::*;
pub use crypto_request::*;
pub use error::*;
pub use http::*;
pub use service::*;

/// Guardian sequence order as understood by the crypto service
pub type GuardianId = u32;
