//! Account runner: the full per-account sequence for one cycle.
//!
//! egress check -> identity decode -> start jitter -> expiry check ->
//! register + farm info -> task workflow -> farm workflow, the whole
//! thing bounded by an absolute deadline.  Every failure surfaces as a
//! [`RunError`] for the scheduler; nothing here aborts other accounts.

use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tracing::Instrument;

use uxuy_client::{AccountSession, FarmOps};
use uxuy_core::agents::random_user_agent;
use uxuy_core::config::{Settings, RUNNER_DEADLINE, STEP_DELAY};
use uxuy_core::farm::format_balance;
use uxuy_core::identity::AccountIdentity;

use crate::accounts::Account;
use crate::error::RunError;
use crate::{farming, tasks};

/// Run one account under the standard 24-hour deadline.
pub async fn run_with_deadline(
    account: &Account,
    settings: &Settings,
    agents: &HashMap<String, String>,
) -> Result<(), RunError> {
    run_bounded(RUNNER_DEADLINE, account, settings, agents).await
}

/// Run one account under an explicit deadline.  On expiry the unit is
/// abandoned and reported as a timeout; in-flight calls are not
/// individually cancelled, their results are simply discarded.
pub async fn run_bounded(
    deadline: Duration,
    account: &Account,
    settings: &Settings,
    agents: &HashMap<String, String>,
) -> Result<(), RunError> {
    match tokio::time::timeout(deadline, run_account(account, settings, agents)).await {
        Ok(result) => result,
        Err(_) => Err(RunError::Timeout),
    }
}

async fn run_account(
    account: &Account,
    settings: &Settings,
    agents: &HashMap<String, String>,
) -> Result<(), RunError> {
    let identity = AccountIdentity::decode(&account.token)?;

    // The bootstrap binds a fingerprint for every decodable credential,
    // so the fallback only fires for accounts added mid-run.
    let user_agent = agents
        .get(&identity.user_id)
        .map(String::as_str)
        .unwrap_or_else(random_user_agent);

    let session = AccountSession::new(
        account.token.clone(),
        account.proxy.as_deref(),
        user_agent,
        settings.delay_between_requests,
    )?;

    // An unusable proxy skips the account for the whole cycle.
    let egress_ip = session
        .check_egress_ip()
        .await
        .map_err(|e| RunError::ProxyUnusable(e.to_string()))?;
    let ip_label = egress_ip.unwrap_or_else(|| "No Proxy".to_string());

    let span = tracing::info_span!("account", account = account.index + 1, ip = %ip_label);
    drive(&session, &identity, settings).instrument(span).await
}

async fn drive(
    session: &AccountSession,
    identity: &AccountIdentity,
    settings: &Settings,
) -> Result<(), RunError> {
    let jitter_secs = {
        let (min, max) = settings.delay_start_bot;
        rand::rng().random_range(min..=max)
    };
    tracing::info!(
        name = %identity.display_name(),
        jitter_secs,
        "Starting account",
    );
    tokio::time::sleep(Duration::from_secs(jitter_secs)).await;

    if identity.is_expired(Utc::now()) {
        tracing::warn!("Credential expired, skipping account");
        return Err(RunError::AuthExpired);
    }

    let register = session.register().await;
    let info = session.farm_info().await;
    match (&register, &info) {
        (Ok(reg), Ok(record)) => {
            let alias = reg.get("alias").and_then(|a| a.get(0));
            if let (Some(alias), Some(token)) = (alias, &record.token) {
                tracing::info!(
                    username = %alias,
                    balance = %format_balance(&token.balance, token.decimals),
                    "Account ready",
                );
            }
        }
        (Err(e), _) => tracing::warn!(error = %e, "Wallet registration failed"),
        (_, Err(e)) => tracing::warn!(error = %e, "Farm info fetch failed"),
    }

    if let Err(e) = tasks::run(session, &settings.skip_tasks, STEP_DELAY).await {
        tracing::warn!(error = %e, "Task workflow failed");
    }
    if let Err(e) = farming::run(session, STEP_DELAY).await {
        tracing::warn!(error = %e, "Farm workflow failed");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims {
        exp: i64,
        payload: TestPayload,
    }

    #[derive(Serialize)]
    struct TestPayload {
        user: String,
    }

    fn token_with_expiry(exp: i64) -> String {
        let user = serde_json::json!({
            "userId": "u1", "firstName": "Test", "lastName": "User",
        });
        let claims = TestClaims {
            exp,
            payload: TestPayload {
                user: user.to_string(),
            },
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"k"),
        )
        .unwrap()
    }

    fn instant_settings() -> Settings {
        Settings {
            delay_start_bot: (0, 0),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn expired_credential_skips_before_any_remote_call() {
        let account = Account {
            index: 0,
            token: token_with_expiry(1_000_000_000), // long past
            proxy: None,
        };
        let result = run_bounded(
            Duration::from_secs(5),
            &account,
            &instant_settings(),
            &HashMap::new(),
        )
        .await;
        assert_matches!(result, Err(RunError::AuthExpired));
    }

    #[tokio::test]
    async fn undecodable_credential_is_an_identity_error() {
        let account = Account {
            index: 0,
            token: "garbage".to_string(),
            proxy: None,
        };
        let result = run_bounded(
            Duration::from_secs(5),
            &account,
            &instant_settings(),
            &HashMap::new(),
        )
        .await;
        assert_matches!(result, Err(RunError::Identity(_)));
    }

    #[tokio::test]
    async fn deadline_expiry_reports_timeout() {
        let account = Account {
            index: 0,
            token: token_with_expiry(4_102_444_800),
            proxy: None,
        };
        let settings = Settings {
            delay_start_bot: (2, 2), // jitter alone exceeds the deadline
            ..Settings::default()
        };
        let result = run_bounded(
            Duration::from_millis(10),
            &account,
            &settings,
            &HashMap::new(),
        )
        .await;
        assert_matches!(result, Err(RunError::Timeout));
    }
}
