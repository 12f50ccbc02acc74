use crate::commands::Out;
use crate::{Config, Result};
use anyhow::Context;
use std::path::Path;

/// Creates the home directory, its subdirectories and an initial `config.json` file pointing at
/// `api_url` along with default settings.
///
/// # Arguments
/// - `pockit_home` - The directory that will be the root of the home directory, e.g.
///   `$HOME/pockit`
/// - `api_url` - The base URL of the MyPockit backend, e.g. `http://localhost:8080`
///
/// # Errors
/// - Returns an error if the URL is invalid or any file operations fail.
pub async fn init(pockit_home: &Path, api_url: &str) -> Result<Out<()>> {
    let config = Config::create(pockit_home, api_url)
        .await
        .context("Unable to create the pockit home directory and config")?;
    Ok(format!(
        "Created the pockit home directory at {}",
        config.root().display()
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pockit");
        let out = init(&home, "http://localhost:8080").await.unwrap();
        assert!(out.message().contains("Created"));
        let config = Config::load(&home).await.unwrap();
        assert_eq!(config.api_url().as_str(), "http://localhost:8080/");
    }

    #[tokio::test]
    async fn test_init_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(init(dir.path(), "localhost").await.is_err());
    }
}
