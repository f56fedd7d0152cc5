//! JSON-RPC 2.0 transport shared by the ledger and metadata clients.

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::PlutusError;
use crate::utils::{build_client, endpoint_host};

#[derive(Serialize)]
struct RpcRequest<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Why a call did not yield a result
#[derive(Debug)]
pub enum RpcFailure {
    Transport(reqwest::Error),
    Status(StatusCode),
    Remote { code: i64, message: String },
    MissingResult,
    Malformed(String),
}

impl RpcFailure {
    fn describe(&self, method: &str, host: &str) -> String {
        match self {
            RpcFailure::Transport(e) if e.is_timeout() => {
                format!("{} to {} timed out", method, host)
            }
            RpcFailure::Transport(e) if e.is_connect() => {
                format!("{}: connection to {} failed", method, host)
            }
            RpcFailure::Transport(e) => format!("{} to {} failed: {}", method, host, e),
            RpcFailure::Status(status) => format!("{} to {} returned HTTP {}", method, host, status),
            RpcFailure::Remote { code, message } => {
                format!("{} rejected by {} ({}): {}", method, host, code, message)
            }
            RpcFailure::MissingResult => format!("{} response from {} has no result", method, host),
            RpcFailure::Malformed(e) => format!("{} response from {} is malformed: {}", method, host, e),
        }
    }
}

/// Minimal JSON-RPC client bound to one endpoint
pub struct RpcClient {
    client: Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> crate::error::PlutusResult<Self> {
        Ok(Self::with_client(build_client(timeout)?, endpoint))
    }

    /// Share an existing connection pool
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Endpoint host, safe for logs
    pub fn host(&self) -> String {
        endpoint_host(&self.endpoint)
    }

    pub async fn call<P, T>(&self, method: &str, params: P) -> Result<T, RpcFailure>
    where
        P: Serialize + Send,
        T: DeserializeOwned,
    {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(RpcFailure::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcFailure::Status(status));
        }

        let body = response.text().await.map_err(RpcFailure::Transport)?;
        let parsed: RpcResponse<T> =
            serde_json::from_str(&body).map_err(|e| RpcFailure::Malformed(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(RpcFailure::Remote {
                code: error.code,
                message: error.message,
            });
        }

        parsed.result.ok_or(RpcFailure::MissingResult)
    }

    pub(crate) fn ledger_error(&self, method: &str, failure: RpcFailure) -> PlutusError {
        match failure {
            RpcFailure::Malformed(_) | RpcFailure::MissingResult => {
                PlutusError::decode(failure.describe(method, &self.host()))
            }
            _ => PlutusError::ledger(failure.describe(method, &self.host())),
        }
    }

    pub(crate) fn metadata_error(&self, method: &str, failure: RpcFailure) -> PlutusError {
        PlutusError::metadata(failure.describe(method, &self.host()))
    }
}
