//! Runtime settings loaded from the environment.
//!
//! The recognized variable names match the original deployment surface
//! (including the historical `MAX_THEADS` spelling), so existing `.env`
//! files keep working.  Every value has a default; only malformed
//! values are an error.

use std::time::Duration;

use crate::error::CoreError;

/// Default number of accounts run concurrently per batch.
const DEFAULT_MAX_THREADS: usize = 10;
/// Default pause between retried requests, in seconds.
const DEFAULT_DELAY_BETWEEN_REQUESTS_SECS: u64 = 3;
/// Default bounds for the per-account start jitter, in seconds.
const DEFAULT_DELAY_START_BOT: (u64, u64) = (1, 15);
/// Default sleep between full cycles, in minutes.
const DEFAULT_TIME_SLEEP_MINS: u64 = 60;
/// Maximum attempts for a single logical RPC call.
pub const RPC_RETRIES: u32 = 3;
/// Hard timeout applied to every HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Pause between batches within one cycle.
pub const INTER_BATCH_DELAY: Duration = Duration::from_secs(3);
/// Short pause inserted before claim/start calls to avoid bursting.
pub const STEP_DELAY: Duration = Duration::from_secs(1);
/// Absolute wall-clock bound on one account's run.
pub const RUNNER_DEADLINE: Duration = Duration::from_secs(24 * 60 * 60);

/// Engine configuration, shared read-only across all accounts.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Batch size: at most this many accounts are in flight at once.
    pub max_threads: usize,
    /// Delay between retried RPC requests.
    pub delay_between_requests: Duration,
    /// Inclusive bounds (seconds) for the randomized start jitter.
    pub delay_start_bot: (u64, u64),
    /// Task ids that are never attempted.
    pub skip_tasks: Vec<String>,
    /// Sleep between full passes over the account list, in minutes.
    pub time_sleep_mins: u64,
    /// Path to the bearer-credential list.
    pub data_file: String,
    /// Path to the proxy list.
    pub proxy_file: String,
    /// Path to the referral-code file.
    pub refer_file: String,
    /// Path to the persisted user-agent store.
    pub session_ua_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_threads: DEFAULT_MAX_THREADS,
            delay_between_requests: Duration::from_secs(DEFAULT_DELAY_BETWEEN_REQUESTS_SECS),
            delay_start_bot: DEFAULT_DELAY_START_BOT,
            skip_tasks: Vec::new(),
            time_sleep_mins: DEFAULT_TIME_SLEEP_MINS,
            data_file: "data.txt".to_string(),
            proxy_file: "proxy.txt".to_string(),
            refer_file: "refer.txt".to_string(),
            session_ua_file: "session_user_agents.json".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// | Env Var                  | Default                    |
    /// |--------------------------|----------------------------|
    /// | `MAX_THEADS`             | `10`                       |
    /// | `DELAY_BETWEEN_REQUESTS` | `3` (seconds)              |
    /// | `DELAY_START_BOT`        | `1,15` (seconds, min,max)  |
    /// | `SKIP_TASKS`             | empty                      |
    /// | `TIME_SLEEP`             | `60` (minutes)             |
    /// | `DATA_FILE`              | `data.txt`                 |
    /// | `PROXY_FILE`             | `proxy.txt`                |
    /// | `REFER_FILE`             | `refer.txt`                |
    /// | `SESSION_UA_FILE`        | `session_user_agents.json` |
    pub fn from_env() -> Result<Self, CoreError> {
        let mut settings = Self::default();

        if let Ok(raw) = std::env::var("MAX_THEADS") {
            settings.max_threads = parse_positive("MAX_THEADS", &raw)?;
        }
        if let Ok(raw) = std::env::var("DELAY_BETWEEN_REQUESTS") {
            let secs: u64 = raw.trim().parse().map_err(|_| CoreError::Setting {
                name: "DELAY_BETWEEN_REQUESTS",
                reason: format!("expected seconds, got '{raw}'"),
            })?;
            settings.delay_between_requests = Duration::from_secs(secs);
        }
        if let Ok(raw) = std::env::var("DELAY_START_BOT") {
            settings.delay_start_bot = parse_range("DELAY_START_BOT", &raw)?;
        }
        if let Ok(raw) = std::env::var("SKIP_TASKS") {
            settings.skip_tasks = parse_list(&raw);
        }
        if let Ok(raw) = std::env::var("TIME_SLEEP") {
            settings.time_sleep_mins = raw.trim().parse().map_err(|_| CoreError::Setting {
                name: "TIME_SLEEP",
                reason: format!("expected minutes, got '{raw}'"),
            })?;
        }
        for (var, slot) in [
            ("DATA_FILE", &mut settings.data_file),
            ("PROXY_FILE", &mut settings.proxy_file),
            ("REFER_FILE", &mut settings.refer_file),
            ("SESSION_UA_FILE", &mut settings.session_ua_file),
        ] {
            if let Ok(raw) = std::env::var(var) {
                *slot = raw;
            }
        }

        Ok(settings)
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<usize, CoreError> {
    let value: usize = raw.trim().parse().map_err(|_| CoreError::Setting {
        name,
        reason: format!("expected an integer, got '{raw}'"),
    })?;
    if value == 0 {
        return Err(CoreError::Setting {
            name,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

/// Parse a `min,max` pair (whitespace and surrounding brackets
/// tolerated, so `[1, 15]` works too).
fn parse_range(name: &'static str, raw: &str) -> Result<(u64, u64), CoreError> {
    let trimmed = raw.trim().trim_start_matches('[').trim_end_matches(']');
    let parts: Vec<&str> = trimmed.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(CoreError::Setting {
            name,
            reason: format!("expected 'min,max', got '{raw}'"),
        });
    }
    let min: u64 = parts[0].parse().map_err(|_| CoreError::Setting {
        name,
        reason: format!("min is not an integer in '{raw}'"),
    })?;
    let max: u64 = parts[1].parse().map_err(|_| CoreError::Setting {
        name,
        reason: format!("max is not an integer in '{raw}'"),
    })?;
    if min > max {
        return Err(CoreError::Setting {
            name,
            reason: format!("min {min} exceeds max {max}"),
        });
    }
    Ok((min, max))
}

/// Split a comma-separated list, dropping empty entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
