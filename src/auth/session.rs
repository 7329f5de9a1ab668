// Allow dead code: Infrastructure accessors for future use
#![allow(dead_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Session file name in the data directory
const SESSION_FILE: &str = "session.json";

/// An access/refresh token pair as minted by the token endpoint.
/// Both tokens are opaque strings; the client never inspects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// On-disk shape of the session. The fields are stored independently
/// because either token can survive without the other after a partial
/// clear by an older client, and the pipeline still wants the access
/// token in that state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh: Option<String>,
}

/// Durable store for the current credential pair.
///
/// Tokens persist across restarts and are destroyed by `clear`. Writes
/// go to memory first and then to disk; a failed disk write is logged
/// and does not fail the caller, so in-memory state is authoritative
/// for the lifetime of the process.
pub struct SessionStore {
    data_dir: PathBuf,
    tokens: StoredTokens,
}

impl SessionStore {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            tokens: StoredTokens::default(),
        }
    }

    /// Load tokens from disk. Returns true if anything was found.
    pub fn load(&mut self) -> Result<bool> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(false);
        }
        let contents = std::fs::read_to_string(&path).context("Failed to read session file")?;
        self.tokens =
            serde_json::from_str(&contents).context("Failed to parse session file")?;
        Ok(self.tokens.access.is_some() || self.tokens.refresh.is_some())
    }

    /// The stored access token, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.tokens.access.as_deref()
    }

    /// The stored refresh token, if any.
    pub fn refresh_token(&self) -> Option<&str> {
        self.tokens.refresh.as_deref()
    }

    /// The full credential pair, only when both halves are present.
    pub fn pair(&self) -> Option<TokenPair> {
        match (&self.tokens.access, &self.tokens.refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }

    /// Replace both tokens wholesale. The in-memory update is complete
    /// before this returns, so a reader on another task never observes
    /// a half-replaced pair.
    pub fn set_pair(&mut self, pair: TokenPair) {
        self.tokens = StoredTokens {
            access: Some(pair.access),
            refresh: Some(pair.refresh),
        };
        if let Err(e) = self.save() {
            warn!(error = %e, "Failed to persist session to disk");
        }
    }

    /// Drop both tokens and remove the session file. Always succeeds
    /// from the caller's perspective; disk errors are logged.
    pub fn clear(&mut self) {
        self.tokens = StoredTokens::default();
        let path = self.session_path();
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(error = %e, "Failed to remove session file");
            }
        }
        debug!("Session cleared");
    }

    fn save(&self) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.tokens)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().to_path_buf())
    }

    fn pair(access: &str, refresh: &str) -> TokenPair {
        TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        }
    }

    #[test]
    fn test_set_and_get_pair() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        assert!(store.pair().is_none());
        store.set_pair(pair("A1", "R1"));
        assert_eq!(store.pair(), Some(pair("A1", "R1")));
        assert_eq!(store.access_token(), Some("A1"));
        assert_eq!(store.refresh_token(), Some("R1"));
    }

    #[test]
    fn test_pair_replaced_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_pair(pair("A1", "R1"));
        store.set_pair(pair("A2", "R2"));
        assert_eq!(store.pair(), Some(pair("A2", "R2")));
    }

    #[test]
    fn test_clear_removes_both_tokens_and_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_pair(pair("A1", "R1"));
        assert!(dir.path().join(SESSION_FILE).exists());

        store.clear();
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
        assert!(!dir.path().join(SESSION_FILE).exists());

        // A fresh store over the same directory sees nothing, so a
        // bootstrap after logout needs no network call.
        let mut reloaded = store_in(&dir);
        assert!(!reloaded.load().unwrap());
        assert!(reloaded.access_token().is_none());
    }

    #[test]
    fn test_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.set_pair(pair("A1", "R1"));

        let mut reloaded = store_in(&dir);
        assert!(reloaded.load().unwrap());
        assert_eq!(reloaded.pair(), Some(pair("A1", "R1")));
    }

    #[test]
    fn test_tolerates_lone_access_token() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SESSION_FILE),
            r#"{"access": "A1"}"#,
        )
        .unwrap();

        let mut store = store_in(&dir);
        assert!(store.load().unwrap());
        assert_eq!(store.access_token(), Some("A1"));
        assert!(store.refresh_token().is_none());
        // Not a valid pair, but the access token is still usable
        assert!(store.pair().is_none());
    }
}
