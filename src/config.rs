//! Configuration file handling for pockit.
//!
//! The configuration file is stored at `$POCKIT_HOME/config.json` and contains the backend API
//! URL, paging settings and where exported files are written. The login session lives next to it
//! in `$POCKIT_HOME/.secrets/session.json`.

use crate::api::SessionStore;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

const APP_NAME: &str = "pockit";
const CONFIG_VERSION: u8 = 1;
const SECRETS: &str = ".secrets";
const EXPORTS: &str = "exports";
const CONFIG_JSON: &str = "config.json";
const SESSION_JSON: &str = "session.json";
const PAGE_SIZE: u32 = 10;
const EXPORT_BATCH_SIZE: u32 = 100;
const CATEGORY_CONCURRENCY: usize = 8;

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$POCKIT_HOME` and from there it loads `$POCKIT_HOME/config.json`. It provides
/// paths to other items that are either configurable or are expected in a certain location within
/// the pockit home directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    secrets: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    api_url: Url,
}

impl Config {
    /// Creates the home directory, its subdirectories and an initial `config.json` pointing at
    /// `api_url`.
    ///
    /// # Arguments
    /// - `dir` - The directory that will be the root of the home directory, e.g. `$HOME/pockit`
    /// - `api_url` - The base URL of the backend, e.g. `http://localhost:8080`
    ///
    /// # Errors
    /// - Returns an error if `api_url` is not an http(s) URL or any file operation fails.
    pub async fn create(dir: impl Into<PathBuf>, api_url: &str) -> Result<Self> {
        let api_url_parsed = parse_api_url(api_url)?;

        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the pockit home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let secrets = root.join(SECRETS);
        utils::make_dir(&secrets).await?;

        let config_path = root.join(CONFIG_JSON);
        let config_file = ConfigFile {
            api_url: api_url.to_string(),
            ..ConfigFile::default()
        };
        config_file.save(&config_path).await?;

        Ok(Self {
            root,
            secrets,
            config_path,
            config_file,
            api_url: api_url_parsed,
        })
    }

    /// This will
    /// - validate that `pockit_home` exists and that the config file exists
    /// - load and validate the config file
    /// - validate that the secrets directory exists
    pub async fn load(pockit_home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = pockit_home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("Pockit Home is missing, run 'pockit init' first")?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let api_url = parse_api_url(&config_file.api_url)?;

        let config = Self {
            root: root.clone(),
            secrets: root.join(SECRETS),
            config_path,
            config_file,
            api_url,
        };
        if !config.secrets.is_dir() {
            bail!(
                "The secrets directory is missing '{}'",
                config.secrets.display()
            )
        }
        Ok(config)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn secrets(&self) -> &Path {
        &self.secrets
    }

    /// The backend base URL, always ending in `/` so endpoints can be joined onto it.
    pub fn api_url(&self) -> &Url {
        &self.api_url
    }

    /// Records per page in the interactive transaction listing.
    pub fn page_size(&self) -> u32 {
        self.config_file.page_size.max(1)
    }

    /// Records per request when gathering every page for an export.
    pub fn export_batch_size(&self) -> u32 {
        self.config_file.export_batch_size.max(1)
    }

    /// The most per-category total requests the dashboard keeps in flight at once.
    pub fn category_concurrency(&self) -> usize {
        self.config_file
            .category_concurrency
            .clamp(1, tokio::sync::Semaphore::MAX_PERMITS)
    }

    /// Where exported files are written. A relative `export_dir` is resolved against the home
    /// directory.
    pub fn export_dir(&self) -> PathBuf {
        match &self.config_file.export_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => self.root.join(p),
            None => self.root.join(EXPORTS),
        }
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::new(self.secrets.join(SESSION_JSON))
    }
}

/// Parses the configured API URL and makes sure it ends with a slash.
fn parse_api_url(api_url: &str) -> Result<Url> {
    let trimmed = api_url.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&with_slash).with_context(|| format!("Invalid API URL '{api_url}'"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => bail!("The API URL must use http or https, got '{other}'"),
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "pockit",
///   "config_version": 1,
///   "api_url": "http://localhost:8080",
///   "page_size": 10,
///   "export_batch_size": 100,
///   "category_concurrency": 8
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "pockit"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// Base URL of the backend
    api_url: String,

    /// Directory for exported files (optional, relative to the home directory or absolute).
    /// Defaults to $POCKIT_HOME/exports
    #[serde(default, skip_serializing_if = "Option::is_none")]
    export_dir: Option<PathBuf>,

    #[serde(default = "default_page_size")]
    page_size: u32,

    #[serde(default = "default_export_batch_size")]
    export_batch_size: u32,

    #[serde(default = "default_category_concurrency")]
    category_concurrency: usize,
}

fn default_page_size() -> u32 {
    PAGE_SIZE
}

fn default_export_batch_size() -> u32 {
    EXPORT_BATCH_SIZE
}

fn default_category_concurrency() -> usize {
    CATEGORY_CONCURRENCY
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            api_url: String::new(),
            export_dir: None,
            page_size: PAGE_SIZE,
            export_batch_size: EXPORT_BATCH_SIZE,
            category_concurrency: CATEGORY_CONCURRENCY,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }

    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create_and_load() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pockit_home");

        let created = Config::create(&home, "http://localhost:8080").await.unwrap();
        assert!(created.secrets().is_dir());
        assert!(created.config_path().is_file());
        assert_eq!(created.api_url().as_str(), "http://localhost:8080/");

        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(loaded.api_url(), created.api_url());
        assert_eq!(loaded.page_size(), PAGE_SIZE);
        assert_eq!(loaded.export_batch_size(), EXPORT_BATCH_SIZE);
        assert_eq!(loaded.category_concurrency(), CATEGORY_CONCURRENCY);
        assert_eq!(loaded.export_dir(), loaded.root().join(EXPORTS));
        assert_eq!(
            loaded.session_store().path(),
            loaded.secrets().join(SESSION_JSON)
        );
    }

    #[tokio::test]
    async fn test_category_concurrency_is_clamped() {
        let dir = TempDir::new().unwrap();
        let home = dir.path().join("pockit_home");
        let created = Config::create(&home, "http://localhost:8080").await.unwrap();
        let json = r#"{
            "app_name": "pockit",
            "config_version": 1,
            "api_url": "http://localhost:8080",
            "category_concurrency": 18446744073709551615
        }"#;
        utils::write(created.config_path(), json).await.unwrap();
        let loaded = Config::load(&home).await.unwrap();
        assert_eq!(
            loaded.category_concurrency(),
            tokio::sync::Semaphore::MAX_PERMITS
        );

        let json = r#"{"app_name": "pockit", "config_version": 1, "api_url": "http://x", "category_concurrency": 0}"#;
        utils::write(created.config_path(), json).await.unwrap();
        assert_eq!(Config::load(&home).await.unwrap().category_concurrency(), 1);
    }

    #[tokio::test]
    async fn test_load_missing_home() {
        let dir = TempDir::new().unwrap();
        let result = Config::load(dir.path().join("nope")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_create_rejects_bad_url() {
        let dir = TempDir::new().unwrap();
        assert!(Config::create(dir.path(), "ftp://example.com").await.is_err());
        assert!(Config::create(dir.path(), "not a url").await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{
            "app_name": "pockit",
            "config_version": 1,
            "api_url": "https://api.example.com/base",
            "export_dir": "out"
        }"#;
        utils::write(&config_path, json).await.unwrap();

        let config = ConfigFile::load(&config_path).await.unwrap();
        assert_eq!(config.page_size, PAGE_SIZE);
        assert_eq!(config.export_dir, Some(PathBuf::from("out")));
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        let json = r#"{"app_name": "budgeteer", "config_version": 1, "api_url": "http://x"}"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[tokio::test]
    async fn test_config_file_save_and_load() {
        let t = TempDir::new().unwrap();
        let path = t.path().join("file.json");
        let original = ConfigFile {
            api_url: "http://localhost:9000".to_string(),
            export_dir: Some(PathBuf::from("/tmp/exports")),
            page_size: 25,
            ..ConfigFile::default()
        };
        original.save(&path).await.unwrap();
        assert_eq!(original, ConfigFile::load(&path).await.unwrap());
    }

    #[test]
    fn test_parse_api_url_keeps_base_path() {
        let url = parse_api_url("https://api.example.com/base").unwrap();
        assert_eq!(
            url.join("mypockit/budget/get").unwrap().as_str(),
            "https://api.example.com/base/mypockit/budget/get"
        );
    }

    #[test]
    fn test_serialization_omits_export_dir() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("export_dir"));
    }
}
