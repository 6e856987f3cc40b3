//! `uxuy-bot` -- multi-account execution engine for the UXUY miniapp.
//!
//! Loads one bearer credential per line from the data file, pairs each
//! with a proxy by position, and drives every account through the
//! register -> tasks -> farm sequence in bounded concurrent batches,
//! forever.
//!
//! # Environment variables
//!
//! | Variable                 | Default                    | Description                      |
//! |--------------------------|----------------------------|----------------------------------|
//! | `MAX_THEADS`             | `10`                       | Accounts in flight per batch     |
//! | `DELAY_BETWEEN_REQUESTS` | `3`                        | Seconds between request retries  |
//! | `DELAY_START_BOT`        | `1,15`                     | Start jitter bounds (seconds)    |
//! | `SKIP_TASKS`             | --                         | Comma-separated task ids to skip |
//! | `TIME_SLEEP`             | `60`                       | Minutes between cycles           |
//! | `DATA_FILE`              | `data.txt`                 | Credential list                  |
//! | `PROXY_FILE`             | `proxy.txt`                | Proxy list                       |
//! | `SESSION_UA_FILE`        | `session_user_agents.json` | Persisted fingerprint store      |

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uxuy_bot::{accounts, fingerprint, scheduler};
use uxuy_core::config::Settings;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uxuy_bot=info,uxuy_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let tokens = match accounts::load_lines(&settings.data_file) {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!(file = %settings.data_file, error = %e, "Cannot read credential list");
            std::process::exit(1);
        }
    };
    if tokens.is_empty() {
        tracing::error!(file = %settings.data_file, "Credential list is empty");
        std::process::exit(1);
    }

    // A missing proxy list just means every account runs direct.
    let proxies = accounts::load_lines(&settings.proxy_file).unwrap_or_else(|e| {
        tracing::warn!(file = %settings.proxy_file, error = %e, "No proxy list, running without proxies");
        Vec::new()
    });

    tracing::info!(
        accounts = tokens.len(),
        proxies = proxies.len(),
        batch_size = settings.max_threads,
        "Inputs loaded",
    );

    let account_list = accounts::pair(tokens, &proxies);

    // Bootstrap: bind a fingerprint for every account before any
    // concurrent unit starts, so batches only ever read the store.
    let agents = match fingerprint::bootstrap(&account_list, &settings.session_ua_file) {
        Ok(agents) => agents,
        Err(e) => {
            tracing::error!(file = %settings.session_ua_file, error = %e, "Fingerprint store unusable");
            std::process::exit(1);
        }
    };

    scheduler::run_forever(
        Arc::new(account_list),
        Arc::new(settings),
        Arc::new(agents),
    )
    .await;
}
