// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

mod data_store;
mod in_mem;
mod into_key;
mod ops;
mod repositories;
mod repository;
mod sled_db;
mod sled_utils;
mod traits;

pub use data_store::*;
pub use in_mem::*;
pub use into_key::IntoKey;
pub use ops::*;
pub use repositories::*;
pub use repository::*;
pub use sled_db::*;
pub use traits::*;
