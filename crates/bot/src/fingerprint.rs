//! Persisted user-agent store.
//!
//! Maps each account key to a stable user agent so the account keeps
//! the same outbound fingerprint across runs.  The store is a single
//! JSON document, read and written whole.  All writes happen during
//! the one-time bootstrap before any concurrent unit starts; batches
//! then read a frozen snapshot, so there are no concurrent-write races
//! by construction.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uxuy_core::agents::random_user_agent;
use uxuy_core::identity::AccountIdentity;

use crate::accounts::Account;

/// Whole-document key -> user-agent store.
pub struct UserAgentStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl UserAgentStore {
    /// Load the store, treating a missing file as empty.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let map = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        Ok(Self { path, map })
    }

    /// The user agent bound to `key`, if one exists.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// Return the binding for `key`, creating and persisting a fresh
    /// one if absent.
    pub fn ensure(&mut self, key: &str) -> io::Result<String> {
        if let Some(existing) = self.map.get(key) {
            return Ok(existing.clone());
        }
        let agent = random_user_agent().to_string();
        self.map.insert(key.to_string(), agent.clone());
        self.persist()?;
        Ok(agent)
    }

    /// Write the whole document back, pretty-printed.
    fn persist(&self) -> io::Result<()> {
        let json = serde_json::to_string_pretty(&self.map)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        fs::write(&self.path, json)
    }

    /// Consume the store into a read-only snapshot for the batches.
    pub fn into_map(self) -> HashMap<String, String> {
        self.map.into_iter().collect()
    }
}

/// One-time bootstrap: ensure every account has a user-agent binding
/// before any concurrent unit starts.  Accounts whose credential does
/// not decode are logged and left unbound; their runner will fail the
/// same decode step and skip them.
pub fn bootstrap(accounts: &[Account], path: impl AsRef<Path>) -> io::Result<HashMap<String, String>> {
    let mut store = UserAgentStore::load(path)?;
    for account in accounts {
        match AccountIdentity::decode(&account.token) {
            Ok(identity) => {
                store.ensure(&identity.user_id)?;
            }
            Err(e) => {
                tracing::warn!(
                    account = account.index + 1,
                    error = %e,
                    "Credential does not decode, no fingerprint bound",
                );
            }
        }
    }
    Ok(store.into_map())
}
