// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    build_tally, combine, compensated_decrypt, partial_decrypt, CryptoOperation, RpcError,
};

/// The boundary to the crypto microservice. All math happens on the other side.
#[async_trait]
pub trait CryptoService: Send + Sync {
    async fn build_tally(
        &self,
        req: build_tally::Request,
    ) -> Result<build_tally::Response, RpcError>;

    async fn partial_decrypt(
        &self,
        req: partial_decrypt::Request,
    ) -> Result<partial_decrypt::Response, RpcError>;

    async fn compensated_decrypt(
        &self,
        req: compensated_decrypt::Request,
    ) -> Result<compensated_decrypt::Response, RpcError>;

    async fn combine(&self, req: combine::Request) -> Result<combine::Response, RpcError>;
}

/// Bound a call to the crypto service. Elapsing maps to `RpcError::Timeout`.
pub async fn with_timeout<T, F>(
    operation: CryptoOperation,
    after: Duration,
    fut: F,
) -> Result<T, RpcError>
where
    F: Future<Output = Result<T, RpcError>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| RpcError::Timeout { operation, after })?
}
