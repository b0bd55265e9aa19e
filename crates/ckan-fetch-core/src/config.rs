//! Configuration types for ckan-fetch.
//!
//! Values are layered: built-in defaults, then the optional TOML file at
//! [`default_config_path`] (or `--config`), then environment variables and
//! command line flags handled by the CLI crate.
//!
//! ```toml
//! [portal]
//! url = "https://cctdata.co.za/data-catalogue"
//!
//! [http]
//! timeout_secs = 60
//! connect_timeout_secs = 10
//! read_timeout_secs = 120
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;

/// Portal used when neither the CLI, the environment nor the config file names one.
pub const DEFAULT_CKAN_URL: &str = "https://cctdata.co.za/data-catalogue";

/// Name of the directory under the platform config dir.
const CONFIG_DIR_NAME: &str = "ckan-fetch";

const CONFIG_FILE_NAME: &str = "config.toml";

/// HTTP client configuration for portal and download requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Whole-request timeout for the metadata call.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Idle timeout for downloads: how long a transfer may go without
    /// receiving any data. A download has no overall deadline.
    pub read_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            user_agent: format!("ckan-fetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub portal: PortalSection,
    #[serde(default)]
    pub http: HttpSection,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PortalSection {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct HttpSection {
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub read_timeout_secs: Option<u64>,
    pub user_agent: Option<String>,
}

impl FileConfig {
    /// Applies the `[http]` overrides on top of `HttpConfig::default()`.
    pub fn http_config(&self) -> HttpConfig {
        let defaults = HttpConfig::default();
        HttpConfig {
            timeout: self
                .http
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            connect_timeout: self
                .http
                .connect_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: self
                .http
                .read_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            user_agent: self
                .http
                .user_agent
                .clone()
                .unwrap_or(defaults.user_agent),
        }
    }

    /// Picks the portal URL: explicit value first, then the file, then the default.
    pub fn portal_url(&self, explicit: Option<&str>) -> String {
        explicit
            .or(self.portal.url.as_deref())
            .unwrap_or(DEFAULT_CKAN_URL)
            .to_string()
    }
}

/// Returns the default config file location, e.g. `~/.config/ckan-fetch/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads the configuration file.
///
/// With an explicit `path` the file must exist. Without one the default
/// location is tried and a missing file yields `FileConfig::default()`.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if an explicit file is missing or unreadable,
/// and `AppError::InvalidConfigFile` if the TOML is malformed.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig, AppError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(FileConfig::default()),
        },
    };

    if !path.exists() {
        if required {
            return Err(AppError::ConfigError(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        debug!(path = %path.display(), "No config file, using defaults");
        return Ok(FileConfig::default());
    }

    let content = std::fs::read_to_string(&path).map_err(|e| {
        AppError::ConfigError(format!("Cannot read {}: {}", path.display(), e))
    })?;
    let config: FileConfig = toml::from_str(&content)?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_http_config_defaults() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(60));
        assert!(config.user_agent.starts_with("ckan-fetch/"));
    }

    #[test]
    fn test_load_full_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[portal]
url = "https://demo.ckan.org"

[http]
timeout_secs = 5
connect_timeout_secs = 2
read_timeout_secs = 9
user_agent = "test-agent"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.portal.url.as_deref(), Some("https://demo.ckan.org"));

        let http = config.http_config();
        assert_eq!(http.timeout, Duration::from_secs(5));
        assert_eq!(http.connect_timeout, Duration::from_secs(2));
        assert_eq!(http.read_timeout, Duration::from_secs(9));
        assert_eq!(http.user_agent, "test-agent");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[http]\ntimeout_secs = 7").unwrap();

        let config = load_config(Some(file.path())).unwrap();
        let http = config.http_config();
        assert_eq!(http.timeout, Duration::from_secs(7));
        assert_eq!(http.connect_timeout, HttpConfig::default().connect_timeout);
        assert_eq!(http.read_timeout, HttpConfig::default().read_timeout);
        assert!(config.portal.url.is_none());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[portal\nurl = ").unwrap();
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::InvalidConfigFile(_))));
    }

    #[test]
    fn test_unknown_key_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[portal]\nadress = \"typo\"").unwrap();
        let result = load_config(Some(file.path()));
        assert!(matches!(result, Err(AppError::InvalidConfigFile(_))));
    }

    #[test]
    fn test_portal_url_precedence() {
        let config = FileConfig {
            portal: PortalSection {
                url: Some("https://file.example".to_string()),
            },
            ..Default::default()
        };
        assert_eq!(
            config.portal_url(Some("https://cli.example")),
            "https://cli.example"
        );
        assert_eq!(config.portal_url(None), "https://file.example");
        assert_eq!(FileConfig::default().portal_url(None), DEFAULT_CKAN_URL);
    }

    #[test]
    fn test_default_config_path_shape() {
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("ckan-fetch/config.toml"));
        }
    }
}
