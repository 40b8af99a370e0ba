use reqwest::{Client, StatusCode, Url, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;

use crate::header::{HeaderError, HeaderRecord};

/// Errors that can occur when talking to a node's JSON-RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("only http:// and https:// URLs are supported")]
    NonHttpUrl,
    #[error("client error: {0}")]
    Client(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unexpected HTTP status: {0}")]
    Status(StatusCode),
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed block header in RPC result: {0}")]
    Header(#[from] HeaderError),
}

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: &'a str,
    method: &'a str,
    params: &'a [Value],
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

/// Minimal JSON-RPC client for talking to a Bitcoin-style node over HTTP(S).
///
/// Requests are authenticated with HTTP Basic credentials when configured.
/// The client performs no retries; every failure surfaces as an `RpcError`.
pub struct RpcClient {
    client: Client,
    url: Url,
    auth: Option<(String, String)>,
}

impl RpcClient {
    /// Creates a new client for the given JSON-RPC endpoint.
    ///
    /// `url` should typically look like `http://127.0.0.1:8332`.
    pub fn new(url: &str) -> Result<Self, RpcError> {
        let url = Url::parse(url).map_err(|e| RpcError::Client(e.to_string()))?;
        match url.scheme() {
            "http" | "https" => {}
            _ => {
                return Err(RpcError::NonHttpUrl);
            }
        }

        Ok(RpcClient {
            client: Client::new(),
            url,
            auth: None,
        })
    }

    /// Attaches HTTP Basic credentials to every request.
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.auth = Some((user.into(), password.into()));
        self
    }

    async fn call<T>(&self, method: &str, params: &[Value]) -> Result<T, RpcError>
    where
        T: DeserializeOwned,
    {
        let request_body = JsonRpcRequest {
            jsonrpc: "1.0",
            id: "header-sync",
            method,
            params,
        };

        let mut req = self
            .client
            .post(self.url.clone())
            .header(header::CONTENT_TYPE, "application/json");
        if let Some((user, password)) = &self.auth {
            req = req.basic_auth(user, Some(password));
        }

        let res = req
            .json(&request_body)
            .send()
            .await
            .map_err(|e| RpcError::Client(e.to_string()))?;

        if !res.status().is_success() {
            return Err(RpcError::Status(res.status()));
        }

        let bytes = res
            .bytes()
            .await
            .map_err(|e| RpcError::Client(e.to_string()))?;
        let rpc_response: JsonRpcResponse<T> = serde_json::from_slice(&bytes)?;

        if let Some(err) = rpc_response.error {
            return Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        rpc_response.result.ok_or_else(|| RpcError::Rpc {
            code: -1,
            message: "missing result field in RPC response".to_string(),
        })
    }

    /// Returns the current block height reported by the node (`getblockcount`).
    pub async fn get_block_count(&self) -> Result<u64, RpcError> {
        self.call("getblockcount", &[]).await
    }

    /// Returns the hash of the best chain tip (`getbestblockhash`).
    pub async fn get_best_block_hash(&self) -> Result<String, RpcError> {
        self.call("getbestblockhash", &[]).await
    }

    /// Fetches the verbose header for `hash` (`getblockheader` with
    /// `verbose = true`) and normalizes it into a `HeaderRecord`.
    pub async fn get_block_header(&self, hash: &str) -> Result<HeaderRecord, RpcError> {
        let result: Value = self
            .call("getblockheader", &[json!(hash), json!(true)])
            .await?;
        Ok(HeaderRecord::from_rpc_object(&result)?)
    }
}
