//! The stored login session: who the user is and the bearer token their requests carry.

use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The identity of the logged-in user together with their bearer token.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: i64,
    email: String,
    token: String,
}

impl Session {
    pub fn new(id: i64, email: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id,
            email: email.into(),
            token: token.into(),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Reads, writes and clears the session file at `$POCKIT_HOME/.secrets/session.json`.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Loads the stored session.
    ///
    /// # Errors
    /// - Returns an error if nobody is logged in or the file cannot be parsed.
    pub async fn load(&self) -> Result<Session> {
        if !self.exists() {
            bail!("You are not logged in, run 'pockit login' first");
        }
        let session: Session = utils::deserialize(&self.path).await?;
        if session.token.trim().is_empty() {
            bail!("The stored session has no token, run 'pockit login' again");
        }
        Ok(session)
    }

    /// Saves `session`, readable only by the current user on Unix-like systems.
    pub async fn save(&self, session: &Session) -> Result<()> {
        let json =
            serde_json::to_string_pretty(session).context("Failed to serialize the session")?;
        utils::write(&self.path, json).await?;

        #[cfg(unix)]
        {
            use std::fs::Permissions;
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, Permissions::from_mode(0o600))
                .context("Failed to set session file permissions")?;
        }

        debug!("Saved session for {} to {}", session.email, self.path.display());
        Ok(())
    }

    /// Deletes the stored session. Clearing an absent session is not an error.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed session file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Unable to remove session file {}", self.path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        assert!(store.load().await.is_err());

        let session = Session::new(7, "me@example.com", "abc.def.ghi");
        store.save(&session).await.unwrap();
        assert_eq!(store.load().await.unwrap(), session);

        store.clear().await.unwrap();
        assert!(!store.exists());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_blank_token_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("session.json"));
        store.save(&Session::new(1, "a@b.c", "  ")).await.unwrap();
        assert!(store.load().await.is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let s = format!("{:?}", Session::new(1, "a@b.c", "secret-token"));
        assert!(!s.contains("secret-token"));
        assert!(s.contains("a@b.c"));
    }
}
