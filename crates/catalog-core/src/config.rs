//! Configuration management for the catalog client.
//!
//! Loads configuration from ${CATALOG_HOME}/config.toml with sensible defaults.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Environment variable that overrides the configured API base URL.
pub const API_URL_ENV: &str = "CATALOG_API_URL";

/// Display durations for transient notices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoticesConfig {
    /// Notices raised by the catalog view
    pub catalog_ms: u64,
    /// Successful login notice
    pub login_success_ms: u64,
    /// Failed login notice
    pub login_failure_ms: u64,
}

impl NoticesConfig {
    pub fn catalog(&self) -> Duration {
        Duration::from_millis(self.catalog_ms)
    }

    pub fn login_success(&self) -> Duration {
        Duration::from_millis(self.login_success_ms)
    }

    pub fn login_failure(&self) -> Duration {
        Duration::from_millis(self.login_failure_ms)
    }
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            catalog_ms: 3000,
            login_success_ms: 2000,
            login_failure_ms: 5000,
        }
    }
}

/// Session persistence behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Leave the stored token in place on logout (only the user record is removed).
    pub keep_token_on_logout: bool,
}

/// Returns the default config template with comments.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Overlays `values` onto the commented template. Keys already in the template
/// keep their comments and inline decoration.
fn overlay(template: &mut toml_edit::Table, values: &toml_edit::Table) {
    use toml_edit::Item;

    for (key, value) in values {
        if let Item::Table(fields) = value
            && let Some(Item::Table(section)) = template.get_mut(key)
        {
            overlay(section, fields);
            continue;
        }
        if let Item::Value(new) = value
            && let Some(current) = template.get_mut(key).and_then(Item::as_value_mut)
        {
            let decor = current.decor().clone();
            *current = new.clone();
            *current.decor_mut() = decor;
            continue;
        }
        template[key] = value.clone();
    }
}

/// Replaces `path` with `contents` through a sibling `.tmp` file and a rename,
/// creating parent directories as needed. `mode` is applied on unix only.
///
/// # Errors
/// Returns an error if the directory, temp file or rename fails.
pub(crate) fn write_atomic(path: &Path, contents: &str, mode: Option<u32>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    // a leftover from an interrupted write would keep its old permissions
    if tmp_path.exists() {
        fs::remove_file(&tmp_path)
            .with_context(|| format!("Failed to remove stale {}", tmp_path.display()))?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        if let Some(mode) = mode {
            options.mode(mode);
        }
    }
    #[cfg(not(unix))]
    let _ = mode;

    let mut file = options
        .open(&tmp_path)
        .with_context(|| format!("Failed to open {} for writing", tmp_path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("Failed to write to {}", tmp_path.display()))?;
    drop(file);

    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} to {}",
            tmp_path.display(),
            path.display()
        )
    })
}

pub mod paths {
    //! Path resolution for catalog configuration and session data.
    //!
    //! CATALOG_HOME resolution order:
    //! 1. CATALOG_HOME environment variable (if set)
    //! 2. ~/.config/catalog (default)

    use std::path::PathBuf;

    /// Returns the catalog home directory.
    pub fn catalog_home() -> PathBuf {
        if let Ok(home) = std::env::var("CATALOG_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".catalog"),
            |h| h.join(".config").join("catalog"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        catalog_home().join("config.toml")
    }

    /// Returns the path to the persisted session file.
    pub fn session_path() -> PathBuf {
        catalog_home().join("session.json")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the catalog REST API
    pub api_url: String,

    /// Notice display durations
    pub notices: NoticesConfig,

    /// Session persistence
    pub session: SessionConfig,
}

impl Config {
    const DEFAULT_API_URL: &str = "http://localhost:8080/api";

    /// Loads configuration from the default config path.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: override > env > config.
    ///
    /// # Errors
    /// Returns an error if the winning value is not a valid URL.
    pub fn api_url(&self, override_url: Option<&str>) -> Result<String> {
        let env_url = std::env::var(API_URL_ENV).ok();
        resolve_api_url(override_url, env_url.as_deref(), &self.api_url)
    }

    /// Writes this config to `path` using the commented template layout.
    /// Returns an error if the file already exists.
    ///
    /// # Errors
    /// Returns an error if the file exists or cannot be written.
    pub fn init(&self, path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }

        write_atomic(path, &self.render()?, None)
    }

    /// Renders this config as TOML, keeping the template's comments.
    ///
    /// # Errors
    /// Returns an error if serialization or template parsing fails.
    pub fn render(&self) -> Result<String> {
        use toml_edit::DocumentMut;

        let values = toml::to_string(self).context("Failed to serialize config to TOML")?;

        let mut doc: DocumentMut = default_config_template()
            .parse()
            .context("Failed to parse default config template")?;
        let values: DocumentMut = values
            .parse()
            .context("Failed to parse rendered config")?;

        overlay(doc.as_table_mut(), values.as_table());

        Ok(doc.to_string())
    }

    /// Generates a fresh config TOML from Rust defaults.
    ///
    /// # Errors
    /// Returns an error if serialization of the defaults fails.
    pub fn generate() -> Result<String> {
        Config::default().render()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Self::DEFAULT_API_URL.to_string(),
            notices: NoticesConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

/// Picks the first non-blank candidate, validates it and strips trailing slashes.
fn resolve_api_url(
    override_url: Option<&str>,
    env_url: Option<&str>,
    config_url: &str,
) -> Result<String> {
    let chosen = [override_url, env_url, Some(config_url)]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(Config::DEFAULT_API_URL);

    url::Url::parse(chosen).with_context(|| format!("Invalid API base URL: {chosen}"))?;
    Ok(chosen.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.notices.catalog(), Duration::from_millis(3000));
    }

    #[test]
    fn test_load_partial_config_merges_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");

        fs::write(
            &config_path,
            "api_url = \"https://shop.example.com/api\"\n[notices]\ncatalog_ms = 1500\n",
        )
        .unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.api_url, "https://shop.example.com/api");
        assert_eq!(config.notices.catalog_ms, 1500);
        assert_eq!(config.notices.login_failure_ms, 5000);
        assert!(!config.session.keep_token_on_logout);
    }

    #[test]
    fn test_load_invalid_toml_is_error() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "api_url = [").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_init_creates_config_with_defaults() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("subdir").join("config.toml");

        Config::default().init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Catalog Configuration"));
        assert!(contents.contains("keep_token_on_logout = false"));
        assert_eq!(Config::load_from(&config_path).unwrap(), Config::default());
    }

    #[test]
    fn test_init_fails_if_exists() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        fs::write(&config_path, "").unwrap();

        assert!(Config::default().init(&config_path).is_err());
    }

    #[test]
    fn test_init_writes_custom_api_url_with_comments() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.toml");
        let config = Config {
            api_url: "https://shop.example.com/api".to_string(),
            ..Config::default()
        };

        config.init(&config_path).unwrap();

        let contents = fs::read_to_string(&config_path).unwrap();
        assert!(contents.contains("# Overridden by the CATALOG_API_URL environment variable"));
        assert!(contents.contains("api_url = \"https://shop.example.com/api\""));
        assert!(!config_path.with_extension("toml.tmp").exists());
        assert_eq!(Config::load_from(&config_path).unwrap(), config);
    }

    #[test]
    fn test_write_atomic_replaces_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{truncated").unwrap();
        fs::write(dir.path().join("session.json.tmp"), "stale").unwrap();

        write_atomic(&path, "{}", Some(0o600)).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
        assert!(!dir.path().join("session.json.tmp").exists());
    }

    #[test]
    fn test_generate_keeps_template_comments() {
        let generated = Config::generate().unwrap();
        assert!(generated.contains("# Base URL of the catalog REST API."));
        let parsed: Config = toml::from_str(&generated).unwrap();
        assert_eq!(parsed, Config::default());
    }

    #[test]
    fn test_resolve_api_url_precedence() {
        assert_eq!(
            resolve_api_url(Some("http://flag/api/"), Some("http://env"), "http://cfg").unwrap(),
            "http://flag/api"
        );
        assert_eq!(
            resolve_api_url(None, Some("http://env"), "http://cfg").unwrap(),
            "http://env"
        );
        assert_eq!(
            resolve_api_url(Some("  "), Some(""), "http://cfg").unwrap(),
            "http://cfg"
        );
        assert_eq!(
            resolve_api_url(None, None, "").unwrap(),
            "http://localhost:8080/api"
        );
    }

    #[test]
    fn test_resolve_api_url_rejects_garbage() {
        assert!(resolve_api_url(Some("not a url"), None, "http://cfg").is_err());
    }
}
