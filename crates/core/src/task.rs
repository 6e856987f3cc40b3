//! Task record filtering.
//!
//! Tasks move through `unclicked -> clicked -> finished -> rewarded` on
//! the remote side.  The engine only decides which records to act on;
//! those selections are pure functions over a freshly fetched list.

use serde::Deserialize;
use serde_json::Value;

/// One remote-owned task record.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    /// Task identifier, echoed back on click/claim.
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clicked: bool,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub rewarded: bool,
    #[serde(default)]
    pub award_amount: Value,
}

impl TaskRecord {
    /// Render the id the way it is matched against the skip-list.
    pub fn id_key(&self) -> String {
        match &self.id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Tasks still worth attempting: not finished and not skip-listed.
pub fn actionable<'a>(tasks: &'a [TaskRecord], skip: &[String]) -> Vec<&'a TaskRecord> {
    tasks
        .iter()
        .filter(|t| !t.finished && !skip.iter().any(|s| *s == t.id_key()))
        .collect()
}

/// Entries from a verification fetch that can be claimed now.
pub fn claimable(tasks: &[TaskRecord]) -> Vec<&TaskRecord> {
    tasks.iter().filter(|t| t.finished && !t.rewarded).collect()
}

/// Entries still awaiting server-side verification.  Recognized but
/// intentionally left unactioned.
pub fn pending(tasks: &[TaskRecord]) -> Vec<&TaskRecord> {
    tasks.iter().filter(|t| !t.finished && !t.rewarded).collect()
}
