//! Flat-file account and proxy loading.
//!
//! `data.txt` carries one bearer credential per line; `proxy.txt` one
//! proxy URI per line, paired by position.  A shorter proxy list means
//! the trailing accounts run without a proxy.

use std::fs;
use std::io;
use std::path::Path;

/// One account as loaded from the input files.  The order of
/// `data.txt` defines the account index.
#[derive(Debug, Clone)]
pub struct Account {
    pub index: usize,
    /// Opaque bearer credential, forwarded as-is on every call.
    pub token: String,
    /// Proxy URI bound to this account for its entire lifetime.
    pub proxy: Option<String>,
}

/// Read non-empty trimmed lines from a flat file.
pub fn load_lines(path: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

/// Read the referral code consumed by the session-establishment
/// exchange (`start_param`).
pub fn read_referral(path: impl AsRef<Path>) -> io::Result<String> {
    Ok(fs::read_to_string(path)?.trim().to_string())
}

/// Pair credentials with proxies by position.
pub fn pair(tokens: Vec<String>, proxies: &[String]) -> Vec<Account> {
    tokens
        .into_iter()
        .enumerate()
        .map(|(index, token)| Account {
            index,
            token,
            proxy: proxies.get(index).cloned(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn load_lines_trims_and_drops_blanks() {
        let file = write_file("token-a\n\n  token-b  \n\n");
        let lines = load_lines(file.path()).unwrap();
        assert_eq!(lines, vec!["token-a", "token-b"]);
    }

    #[test]
    fn load_lines_missing_file_is_an_error() {
        assert!(load_lines("/nonexistent/data.txt").is_err());
    }

    #[test]
    fn pair_assigns_proxies_by_position() {
        let accounts = pair(
            vec!["t0".into(), "t1".into(), "t2".into()],
            &["p0".to_string(), "p1".to_string()],
        );
        assert_eq!(accounts.len(), 3);
        assert_eq!(accounts[0].proxy.as_deref(), Some("p0"));
        assert_eq!(accounts[1].proxy.as_deref(), Some("p1"));
        assert_eq!(accounts[2].proxy, None);
        assert_eq!(accounts[2].index, 2);
    }

    #[test]
    fn referral_is_trimmed() {
        let file = write_file("  REF123  \n");
        assert_eq!(read_referral(file.path()).unwrap(), "REF123");
    }
}
