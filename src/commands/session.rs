//! `pockit login` and `pockit logout`.
//!
//! Signing in happens against the MyPockit web app; these commands only store or forget the
//! resulting session so that other commands can use it.

use crate::api::Session;
use crate::commands::Out;
use crate::{Config, Result};
use anyhow::bail;

/// Stores the session of user `id`/`email` with the bearer `token`, replacing any existing one.
pub async fn login(config: &Config, id: i64, email: &str, token: &str) -> Result<Out<()>> {
    let email = email.trim();
    let token = token.trim();
    if email.is_empty() {
        bail!("An email address is required to log in");
    }
    if token.is_empty() {
        bail!("A token is required to log in");
    }
    let session = Session::new(id, email, token);
    config.session_store().save(&session).await?;
    Ok(format!("Logged in as {email}").into())
}

/// Forgets the stored session.
pub async fn logout(config: &Config) -> Result<Out<()>> {
    let store = config.session_store();
    if !store.exists() {
        return Ok("You are not logged in".into());
    }
    store.clear().await?;
    Ok("Logged out".into())
}
