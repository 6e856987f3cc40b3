//! Farm state machine.
//!
//! The remote service owns the farm record; the engine reads it fresh
//! each cycle and derives the single action to take.  The decision is a
//! pure function so every branch is unit-testable.

use serde::Deserialize;
use serde_json::Value;

/// In-game token balance attached to the farm record.
#[derive(Debug, Clone, Deserialize)]
pub struct FarmToken {
    pub balance: String,
    pub decimals: u32,
}

/// One fresh read of the remote farm record.
///
/// Invariant (remote-owned): the farm finishes at
/// `farm_time + cool_down` on the server clock (`sys_time`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmRecord {
    /// Farm instance identifier, echoed back on claim/start.
    pub id: Value,
    /// Farm group identifier, echoed back on claim/start.
    pub group_id: Value,
    pub cool_down: i64,
    pub sys_time: i64,
    pub farm_time: i64,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub rewarded: bool,
    #[serde(default)]
    pub award_amount: Value,
    #[serde(default)]
    pub token: Option<FarmToken>,
}

/// Action derived from one farm record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FarmState {
    /// Still cooling down; no call is made.
    Cooling { remaining_secs: i64 },
    /// Finished but unclaimed: claim, then start regardless of the
    /// claim outcome.
    ClaimThenStart,
    /// Already rewarded: start a new farm only.
    StartOnly,
    /// Neither finished nor rewarded and not cooling -- the farm is
    /// considered already running.
    Idle,
}

/// Derive the action for one farm record.
pub fn evaluate(record: &FarmRecord) -> FarmState {
    let finish_time = record.farm_time + record.cool_down;
    if record.sys_time < finish_time {
        return FarmState::Cooling {
            remaining_secs: finish_time - record.sys_time,
        };
    }
    if record.finished && !record.rewarded {
        return FarmState::ClaimThenStart;
    }
    if record.rewarded {
        return FarmState::StartOnly;
    }
    FarmState::Idle
}

/// Format a raw integer balance against its decimal scale, e.g.
/// `("1234500", 4)` -> `"123.4500"`.  Unparsable balances come back
/// unchanged so the caller can still log something.
pub fn format_balance(balance: &str, decimals: u32) -> String {
    let Ok(raw) = balance.parse::<i128>() else {
        return balance.to_string();
    };
    let scale = 10i128.pow(decimals);
    let whole = raw / scale;
    let frac = (raw % scale).abs();
    if decimals == 0 {
        whole.to_string()
    } else {
        format!("{whole}.{frac:0>width$}", width = decimals as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(finished: bool, rewarded: bool, sys: i64, farm: i64, cool: i64) -> FarmRecord {
        FarmRecord {
            id: Value::from(1),
            group_id: Value::from(10),
            cool_down: cool,
            sys_time: sys,
            farm_time: farm,
            finished,
            rewarded,
            award_amount: Value::Null,
            token: None,
        }
    }

    #[test]
    fn cooling_when_before_finish_time() {
        // finishTime = 50 + 20 = 70 > sysTime 60 => 10s remaining.
        let state = evaluate(&record(false, false, 60, 50, 20));
        assert_eq!(state, FarmState::Cooling { remaining_secs: 10 });
    }

    #[test]
    fn finished_unrewarded_claims_then_starts() {
        // finishTime = 50 + 20 = 70 <= sysTime 100.
        let state = evaluate(&record(true, false, 100, 50, 20));
        assert_eq!(state, FarmState::ClaimThenStart);
    }

    #[test]
    fn rewarded_starts_only() {
        let state = evaluate(&record(false, true, 100, 50, 20));
        assert_eq!(state, FarmState::StartOnly);
    }

    #[test]
    fn finished_and_rewarded_starts_only() {
        let state = evaluate(&record(true, true, 100, 50, 20));
        assert_eq!(state, FarmState::StartOnly);
    }

    #[test]
    fn neither_flag_past_finish_is_idle() {
        let state = evaluate(&record(false, false, 100, 50, 20));
        assert_eq!(state, FarmState::Idle);
    }

    #[test]
    fn cooling_takes_precedence_over_flags() {
        // Even a finished/unrewarded record waits out the cooldown.
        let state = evaluate(&record(true, false, 60, 50, 20));
        assert_eq!(state, FarmState::Cooling { remaining_secs: 10 });
    }

    #[test]
    fn exact_finish_time_is_ready() {
        let state = evaluate(&record(true, false, 70, 50, 20));
        assert_eq!(state, FarmState::ClaimThenStart);
    }

    #[test]
    fn record_deserializes_from_wire_shape() {
        let json = serde_json::json!({
            "id": 3, "groupId": "g1",
            "coolDown": 20, "sysTime": 100, "farmTime": 50,
            "finished": true, "rewarded": false,
            "awardAmount": "150",
            "token": { "balance": "1234500", "decimals": 4 },
        });
        let record: FarmRecord = serde_json::from_value(json).unwrap();
        assert!(record.finished);
        assert_eq!(record.token.as_ref().unwrap().decimals, 4);
        assert_eq!(evaluate(&record), FarmState::ClaimThenStart);
    }

    #[test]
    fn balance_formatting() {
        assert_eq!(format_balance("1234500", 4), "123.4500");
        assert_eq!(format_balance("50", 0), "50");
        assert_eq!(format_balance("7", 2), "0.07");
        assert_eq!(format_balance("not-a-number", 2), "not-a-number");
    }
}
