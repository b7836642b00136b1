// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use std::time::Duration;

use async_trait::async_trait;
use eg_config::CryptoServiceConfig;
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error};

use crate::{
    build_tally, combine, compensated_decrypt, partial_decrypt, CryptoOperation, CryptoService,
    RpcError,
};

/// Longest response body quoted back in a protocol error
const MAX_ERROR_BODY: usize = 512;

/// Talks JSON over HTTP to the crypto service. Each operation is a POST to `{base_url}/{operation}`.
#[derive(Clone, Debug)]
pub struct HttpCryptoService {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpCryptoService {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RpcError::unavailable(CryptoOperation::BuildTally, e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &CryptoServiceConfig) -> Result<Self, RpcError> {
        Self::new(&config.url, Duration::from_secs(config.timeout_secs))
    }

    fn url(&self, operation: CryptoOperation) -> String {
        format!("{}/{}", self.base_url, operation.path())
    }

    async fn post<Req, Res>(&self, operation: CryptoOperation, req: &Req) -> Result<Res, RpcError>
    where
        Req: Serialize + Sync,
        Res: DeserializeOwned,
    {
        let url = self.url(operation);
        debug!(%url, "calling crypto service");

        let response = self
            .client
            .post(&url)
            .json(req)
            .send()
            .await
            .map_err(|e| self.transport_error(operation, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = clip(response.text().await.unwrap_or_default(), MAX_ERROR_BODY);
            error!(%url, %status, %body, "crypto service rejected request");
            return Err(RpcError::protocol(
                operation,
                format!("HTTP {}: {}", status, body),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(operation, e))?;
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(%url, error = %e, "could not decode crypto service response");
            RpcError::protocol(operation, format!("undecodable body: {}", e))
        })
    }

    fn transport_error(&self, operation: CryptoOperation, e: reqwest::Error) -> RpcError {
        if e.is_timeout() {
            return RpcError::Timeout {
                operation,
                after: self.timeout,
            };
        }
        if e.is_decode() {
            return RpcError::protocol(operation, e.to_string());
        }
        error!(%operation, error = %e, "crypto service unreachable");
        RpcError::unavailable(operation, e.to_string())
    }
}

/// Cut `text` to at most `max` bytes without splitting a character
fn clip(mut text: String, max: usize) -> String {
    if text.len() > max {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

#[async_trait]
impl CryptoService for HttpCryptoService {
    async fn build_tally(
        &self,
        req: build_tally::Request,
    ) -> Result<build_tally::Response, RpcError> {
        self.post(CryptoOperation::BuildTally, &req).await
    }

    async fn partial_decrypt(
        &self,
        req: partial_decrypt::Request,
    ) -> Result<partial_decrypt::Response, RpcError> {
        self.post(CryptoOperation::PartialDecrypt, &req).await
    }

    async fn compensated_decrypt(
        &self,
        req: compensated_decrypt::Request,
    ) -> Result<compensated_decrypt::Response, RpcError> {
        self.post(CryptoOperation::CompensatedDecrypt, &req).await
    }

    async fn combine(&self, req: combine::Request) -> Result<combine::Response, RpcError> {
        self.post(CryptoOperation::Combine, &req).await
    }
}
