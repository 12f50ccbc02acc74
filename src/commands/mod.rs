//! Command handlers for the pockit CLI.
//!
//! This module contains implementations for all CLI subcommands.

mod budget;
mod dashboard;
mod export;
mod init;
mod session;
mod transactions;

use crate::api::{self, Api, Mode, OnInvalidated, Session};
use crate::{Config, Result};
use serde::Serialize;
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use budget::budget_set;
pub use dashboard::dashboard;
pub use export::export;
pub use init::init;
pub use session::{login, logout};
pub use transactions::transactions;

/// The output type for a command. This allows the command to return a consistent message and,
/// optionally, structured data.
#[derive(Debug, Clone, Serialize)]
pub struct Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// A message that can be printed to the user regarding the outcome of the command execution.
    message: String,

    /// Any structured data that needs to be output from the call.
    structure: Option<T>,
}

impl<T, S> From<S> for Out<T>
where
    T: Debug + Clone + Serialize,
    S: Into<String>,
{
    fn from(value: S) -> Self {
        Out::new_message(value)
    }
}

impl<T> Out<T>
where
    T: Serialize + Clone + Debug,
{
    /// Create a new `Out` object that has `Some(structure)`.
    pub fn new<S>(message: S, structure: T) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: Some(structure),
        }
    }

    /// Create a new `Out` object that has `None` for `structure`.
    pub fn new_message<S>(message: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            message: message.into(),
            structure: None,
        }
    }

    /// Get the `message`.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the structured data stored in `structure`.
    pub fn structure(&self) -> Option<&T> {
        self.structure.as_ref()
    }

    /// Print the message to `info!` and the structured data (if it exists) as JSON to `debug!`.
    pub fn print(&self) {
        info!("{}", self.message);
        if let Some(structure) = self.structure() {
            if let Ok(json) = serde_json::to_string_pretty(structure) {
                debug!("Command output:\n\n{json}\n\n");
            }
        }
    }
}

/// Loads the stored session and builds the backend client for it.
async fn connect(config: &Config, mode: Mode) -> Result<(Session, Arc<dyn Api>)> {
    let session = config.session_store().load().await?;
    debug!("Using the session of {}", session.email());
    let api = api::client(config, &session, mode, login_again())?;
    Ok((session, api))
}

fn login_again() -> OnInvalidated {
    Box::new(|| {
        warn!("Your session has expired or was revoked. Run 'pockit login' to sign in again.")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[test]
    fn test_out_from_str() {
        let out: Out<()> = "done".into();
        assert_eq!(out.message(), "done");
        assert!(out.structure().is_none());
    }

    #[tokio::test]
    async fn test_connect_requires_login() {
        let env = TestEnv::new().await;
        env.logout().await;
        let result = connect(&env.config(), Mode::Test).await;
        assert!(result
            .err()
            .unwrap()
            .to_string()
            .contains("pockit login"));
    }

    #[tokio::test]
    async fn test_connect() {
        let env = TestEnv::new().await;
        let (session, api) = connect(&env.config(), Mode::Test).await.unwrap();
        assert_eq!(session.email(), "me@example.com");
        assert!(api.categories().await.unwrap().is_success());
    }
}
