//! Retrying JSON-RPC client.
//!
//! One [`RpcClient`] belongs to one account: it carries that account's
//! bearer credential, derived headers, and (optionally) proxy route.
//! `call` is the only entry point -- it wraps a single logical remote
//! call in the fixed timeout/retry policy and always returns a
//! `Result`, never panicking past this boundary.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use serde_json::{json, Value};

/// Failures surfaced to callers of [`RpcClient::call`].
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The HTTP client could not be constructed (bad proxy URI, bad
    /// header value).
    #[error("client build failed: {0}")]
    Build(String),

    /// Transport-level failure (network error, timeout, non-2xx) that
    /// survived every retry attempt.
    #[error("request failed after {attempts} attempts: {last}")]
    Network { attempts: u32, last: String },

    /// The service answered but the response carried no usable result.
    /// Not retried -- idempotency of a resend is not ours to assume.
    #[error("RPC returned no result: {0}")]
    Logical(String),
}

/// Outcome of one send attempt; drives the retry decision.
#[derive(Debug)]
enum AttemptError {
    Transport(String),
    Logical(String),
}

pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    bearer: String,
    retries: u32,
    retry_delay: Duration,
}

impl RpcClient {
    /// Build a client bound to one account.
    ///
    /// * `headers` - identity-derived default headers (user agent,
    ///   client hints, origin).
    /// * `proxy`   - outbound route for every request this client
    ///   makes; `None` means a direct connection.
    pub fn new(
        endpoint: String,
        bearer: String,
        proxy: Option<&str>,
        headers: reqwest::header::HeaderMap,
        timeout: Duration,
        retries: u32,
        retry_delay: Duration,
    ) -> Result<Self, RpcError> {
        let mut builder = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers);

        if let Some(proxy_url) = proxy {
            let proxy = reqwest::Proxy::all(proxy_url)
                .map_err(|e| RpcError::Build(format!("bad proxy '{proxy_url}': {e}")))?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| RpcError::Build(e.to_string()))?;

        Ok(Self {
            http,
            endpoint,
            bearer,
            retries,
            retry_delay,
        })
    }

    /// The underlying HTTP client, for non-RPC requests that must use
    /// the same proxy route (egress-IP check, session establishment).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Issue one logical JSON-RPC call with the retry policy applied.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        call_with_retry(self.retries, self.retry_delay, method, || {
            self.send(method, &params)
        })
        .await
    }

    /// One send attempt: POST the JSON-RPC envelope, check the status,
    /// and extract the `result` field.
    async fn send(&self, method: &str, params: &Value) -> Result<Value, AttemptError> {
        let envelope = json!({
            "method": method,
            "params": params,
            "id": rand::rng().random_range(100_000_000..1_000_000_000u64),
            "jsonrpc": "2.0",
        });

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.bearer)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(AttemptError::Transport(format!("HTTP {status}: {body}")));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AttemptError::Transport(format!("invalid JSON body: {e}")))?;

        match body.get("result") {
            Some(result) if !result.is_null() => Ok(result.clone()),
            _ => {
                let detail = body
                    .get("error")
                    .map(Value::to_string)
                    .unwrap_or_else(|| "response carried no result field".to_string());
                Err(AttemptError::Logical(detail))
            }
        }
    }
}

/// Retry policy shared by every call: transport failures are retried
/// up to `retries` attempts with a fixed delay between them; logical
/// failures are returned immediately.
async fn call_with_retry<F, Fut>(
    retries: u32,
    retry_delay: Duration,
    method: &str,
    mut op: F,
) -> Result<Value, RpcError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Value, AttemptError>>,
{
    let mut attempt = 0u32;
    loop {
        attempt += 1;
        match op().await {
            Ok(result) => return Ok(result),
            Err(AttemptError::Logical(detail)) => return Err(RpcError::Logical(detail)),
            Err(AttemptError::Transport(detail)) => {
                tracing::warn!(method, attempt, error = %detail, "RPC request failed");
                if attempt >= retries {
                    return Err(RpcError::Network {
                        attempts: attempt,
                        last: detail,
                    });
                }
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}
