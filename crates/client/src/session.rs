//! Per-account session: one identity, one proxy, the fixed vocabulary
//! of remote operations.
//!
//! Every method is a thin translation to a single [`RpcClient::call`];
//! workflow logic lives above this layer, behind the [`FarmOps`] and
//! [`TaskOps`] seams.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, ORIGIN, REFERER, USER_AGENT};
use serde::Deserialize;
use serde_json::{json, Value};

use uxuy_core::agents::platform_for;
use uxuy_core::config::{REQUEST_TIMEOUT, RPC_RETRIES};
use uxuy_core::farm::FarmRecord;
use uxuy_core::task::TaskRecord;

use crate::client::{RpcClient, RpcError};

/// JSON-RPC endpoint of the miniapp service.
pub const RPC_ENDPOINT: &str = "https://miniapp.uxuy.one/rpc";
/// Multipart session-establishment endpoint.
pub const JWT_ENDPOINT: &str = "https://miniapp.uxuy.one/jwt";
/// Origin/referer expected by the service.
const APP_ORIGIN: &str = "https://miniapp.uxuy.one";
/// Egress-IP lookup used to verify the proxy route.
const IPIFY_URL: &str = "https://api.ipify.org?format=json";

/// Chat metadata constants sent during session establishment.
const CHAT_INSTANCE: &str = "-298404396458566810";
const CHAT_TYPE: &str = "channel";

/// Fixed key material for `wallet_register`.  The service expects this
/// exact shape; the values are public parameters, not secrets.
const REGISTER_PUBKEY: &str = "046cfed8d984f6bf11c27de9666261c3457d5dc2ec502ba7c5facac9618c2298bab0e8bb4b665fd8d567aad080141a0caa013a40765e602da565fcda847b39a7c1";
const REGISTER_DIGEST: &str = "2d9ede87cc10737b754e899a2612cfdbb2d17ec942345f4d61e3a217dcd005ea";
const REGISTER_TRON_KEY: &str = "044c6874089604b8c0d7ea527add873fa5b4cfbe352daa7cefab42cd1adab20879f7db091c25dd08ce98a383012979fe30e45ec9db3564ff6748319b34b827c74f";
const REGISTER_TON: (&str, &str) = (
    "043a92ee4a3af11541d5ef85a01696654381a144c6b3d777913e8f72caf0a468e0e13f47b078ce120391c2f451db51fc5f5e19f3e87186b9e02ec30c0a650de363",
    "6388cf477388a2566cb0af340e633ac4e036a6147cea80eb704a22de571a3a77",
);
const REGISTER_SUI: (&str, &str) = (
    "043dcd93ff9fbdd46c5eb347ffc369f9e344ba8f06aa155c5ce98aecc24ee3f2b0e7c59b0d51e6d575c1bfc80842bc861628787e3d93faadc43f06df9a98734bba",
    "111ac9ce78462aedba8642a0ee63f7e23c9d4acce6b6021b7a2e414365ba3ad7",
);
const REGISTER_APTOS: (&str, &str) = (
    "042d0ec4bd6885d1097aafff2080248579e37ab504609bc0974e2f0d0394bb6ca3a4b5103f8140e9f251fa1129616920293a9b92c07a09ae52a7e65d31f7f8732e",
    "8f6917557bfea543b3aedeb8b27e61cec5ff7ae8b76c084396cbc621c6a5b453",
);

/// Farm-side remote operations, mockable for workflow tests.
#[async_trait]
pub trait FarmOps {
    async fn farm_info(&self) -> Result<FarmRecord, RpcError>;
    async fn claim_farm(&self, group: &Value, id: &Value) -> Result<Value, RpcError>;
    async fn start_farm(&self, group: &Value, id: &Value) -> Result<Value, RpcError>;
}

/// Task-side remote operations, mockable for workflow tests.
#[async_trait]
pub trait TaskOps {
    async fn tasks(&self) -> Result<Vec<TaskRecord>, RpcError>;
    async fn click_task(&self, id: &Value) -> Result<Value, RpcError>;
    async fn verify_tasks(&self) -> Result<Vec<TaskRecord>, RpcError>;
    async fn claim_task(&self, id: &Value) -> Result<Value, RpcError>;
}

/// Fields of the multipart session-establishment exchange.
#[derive(Debug, Clone)]
pub struct SessionAuth {
    /// Serialized user payload.
    pub user: String,
    pub auth_date: String,
    pub signature: String,
    pub hash: String,
    /// Referral parameter, sourced from an external file.
    pub start_param: String,
}

#[derive(Debug, Deserialize)]
struct IpifyResponse {
    ip: String,
}

/// One account's bound session.
pub struct AccountSession {
    rpc: RpcClient,
    has_proxy: bool,
}

impl AccountSession {
    /// Bind an identity and proxy to a fresh session.
    ///
    /// * `bearer`     - the account's opaque credential, sent on every call.
    /// * `proxy`      - outbound route for the account's whole lifetime.
    /// * `user_agent` - the account's persisted fingerprint.
    pub fn new(
        bearer: String,
        proxy: Option<&str>,
        user_agent: &str,
        retry_delay: Duration,
    ) -> Result<Self, RpcError> {
        let headers = identity_headers(user_agent)?;
        let rpc = RpcClient::new(
            RPC_ENDPOINT.to_string(),
            bearer,
            proxy,
            headers,
            REQUEST_TIMEOUT,
            RPC_RETRIES,
            retry_delay,
        )?;
        Ok(Self {
            rpc,
            has_proxy: proxy.is_some(),
        })
    }

    /// Resolve the effective egress IP through the assigned proxy.
    ///
    /// Returns `Ok(None)` immediately when the account has no proxy.
    /// A failure here means the proxy route is unusable.
    pub async fn check_egress_ip(&self) -> Result<Option<String>, RpcError> {
        if !self.has_proxy {
            return Ok(None);
        }
        let response = self
            .rpc
            .http()
            .get(IPIFY_URL)
            .send()
            .await
            .map_err(|e| RpcError::Network {
                attempts: 1,
                last: e.to_string(),
            })?;
        if !response.status().is_success() {
            return Err(RpcError::Network {
                attempts: 1,
                last: format!("egress check returned HTTP {}", response.status()),
            });
        }
        let body: IpifyResponse = response.json().await.map_err(|e| RpcError::Network {
            attempts: 1,
            last: format!("bad egress check body: {e}"),
        })?;
        Ok(Some(body.ip))
    }

    /// Register the wallet key material for this account.  The result
    /// carries the account alias, among other fields.
    pub async fn register(&self) -> Result<Value, RpcError> {
        let params = json!([
            REGISTER_PUBKEY,
            REGISTER_DIGEST,
            {
                "tron": [REGISTER_TRON_KEY, ""],
                "ton": [REGISTER_TON.0, REGISTER_TON.1],
                "sui": [REGISTER_SUI.0, REGISTER_SUI.1],
                "aptos": [REGISTER_APTOS.0, REGISTER_APTOS.1],
            },
        ]);
        self.rpc.call("wallet_register", params).await
    }

    /// Current point balance.
    pub async fn my_point(&self) -> Result<Value, RpcError> {
        self.rpc.call("wallet_myPoint", json!([])).await
    }

    /// Establish the initial session via the multipart form exchange.
    pub async fn establish_session(&self, auth: &SessionAuth) -> Result<Value, RpcError> {
        let form = reqwest::multipart::Form::new()
            .text("user", auth.user.clone())
            .text("chat_instance", CHAT_INSTANCE)
            .text("chat_type", CHAT_TYPE)
            .text("auth_date", auth.auth_date.clone())
            .text("signature", auth.signature.clone())
            .text("hash", auth.hash.clone())
            .text("start_param", auth.start_param.clone());

        let response = self
            .rpc
            .http()
            .post(JWT_ENDPOINT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RpcError::Network {
                attempts: 1,
                last: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(RpcError::Network {
                attempts: 1,
                last: format!("HTTP {status}: {body}"),
            });
        }
        response.json().await.map_err(|e| RpcError::Logical(e.to_string()))
    }
}

#[async_trait]
impl FarmOps for AccountSession {
    async fn farm_info(&self) -> Result<FarmRecord, RpcError> {
        let result = self.rpc.call("wallet_getFarmInfo", json!([])).await?;
        serde_json::from_value(result)
            .map_err(|e| RpcError::Logical(format!("bad farm record: {e}")))
    }

    async fn claim_farm(&self, group: &Value, id: &Value) -> Result<Value, RpcError> {
        self.rpc
            .call("wallet_claimFarm", json!([group, id, ""]))
            .await
    }

    async fn start_farm(&self, group: &Value, id: &Value) -> Result<Value, RpcError> {
        self.rpc.call("wallet_startFarm", json!([group, id])).await
    }
}

#[async_trait]
impl TaskOps for AccountSession {
    async fn tasks(&self) -> Result<Vec<TaskRecord>, RpcError> {
        let result = self.rpc.call("wallet_adsList2", json!([false])).await?;
        // A result without items means no tasks, not a failure.
        Ok(parse_items(&result).unwrap_or_default())
    }

    async fn click_task(&self, id: &Value) -> Result<Value, RpcError> {
        self.rpc.call("wallet_adsClick", json!([id])).await
    }

    async fn verify_tasks(&self) -> Result<Vec<TaskRecord>, RpcError> {
        let result = self.rpc.call("wallet_adsList3", json!([false])).await?;
        parse_items(&result)
            .ok_or_else(|| RpcError::Logical("verification list carried no items".to_string()))
    }

    async fn claim_task(&self, id: &Value) -> Result<Value, RpcError> {
        self.rpc.call("wallet_adsClaim", json!([id, ""])).await
    }
}

/// Extract and decode the `items` array from a list result.
fn parse_items(result: &Value) -> Option<Vec<TaskRecord>> {
    let items = result.get("items")?;
    serde_json::from_value(items.clone()).ok()
}

/// Default headers derived from the account's persisted user agent.
fn identity_headers(user_agent: &str) -> Result<HeaderMap, RpcError> {
    let platform = platform_for(user_agent);
    let mut headers = HeaderMap::new();

    let entries: [(&str, String); 3] = [
        (
            "sec-ch-ua",
            format!(r#""Not)A;Brand";v="99", "{platform} WebView";v="127", "Chromium";v="127""#),
        ),
        ("sec-ch-ua-mobile", "?1".to_string()),
        ("sec-ch-ua-platform", format!(r#""{platform}""#)),
    ];
    for (name, value) in entries {
        let value = HeaderValue::from_str(&value)
            .map_err(|e| RpcError::Build(format!("bad header {name}: {e}")))?;
        headers.insert(name, value);
    }

    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(APP_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static("https://miniapp.uxuy.one/"));
    headers.insert(
        USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| RpcError::Build(format!("bad user agent: {e}")))?,
    );

    Ok(headers)
}
