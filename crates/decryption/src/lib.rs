// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod combiner;
mod compensation;
mod context;
mod coordinator;
mod error;
mod locks;
mod model;
mod onboarding;
mod partial_decryption;
pub mod repo;
mod status;
mod tally_builder;
#[cfg(test)]
mod test_utils;

pub use combiner::*;
pub use compensation::*;
pub use context::*;
pub use coordinator::*;
pub use error::*;
pub use locks::*;
pub use model::*;
pub use onboarding::*;
pub use partial_decryption::*;
pub use status::*;
pub use tally_builder::*;
