use thiserror::Error;

/// Broad classification of an [`AppError`].
///
/// Every kind maps to its own process exit code so scripts wrapping the CLI
/// can tell a bad invocation apart from an unreachable portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad CLI input, invalid regex, unreadable config. Raised before any request.
    Configuration,
    /// DNS, TCP, TLS or timeout failure while talking to the portal.
    Connectivity,
    /// The portal answered with a non-2xx status or `"success": false`.
    Api,
    /// The portal answered with a body of unexpected shape.
    Parse,
    /// A single resource could not be downloaded or written.
    Download,
}

impl ErrorKind {
    /// Process exit code associated with this kind.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::Connectivity => 3,
            ErrorKind::Api => 4,
            ErrorKind::Parse => 5,
            ErrorKind::Download => 6,
        }
    }
}

/// Application-wide error types.
///
/// This enum represents all possible errors that can occur while fetching a
/// CKAN dataset. It uses the `thiserror` crate for ergonomic error handling and
/// automatic conversion from underlying library errors.
///
/// # Error Conversion
///
/// Some errors automatically convert from their source types using `#[from]`:
/// - `regex::Error` → `AppError::InvalidRegex`
/// - `serde_json::Error` → `AppError::ParseError`
/// - `toml::de::Error` → `AppError::InvalidConfigFile`
///
/// # Examples
///
/// ```
/// use ckan_fetch_core::error::{AppError, ErrorKind};
///
/// let err = AppError::ApiError { status: 404, body: "Not found".to_string() };
/// assert_eq!(err.kind(), ErrorKind::Api);
/// assert_eq!(err.exit_code(), 4);
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid command line or configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The resource name filter is not a valid regular expression.
    #[error("Invalid resource name regex: {0}")]
    InvalidRegex(#[from] regex::Error),

    /// The configuration file could not be parsed as TOML.
    #[error("Invalid configuration file: {0}")]
    InvalidConfigFile(#[from] toml::de::Error),

    /// Invalid CKAN portal URL provided.
    ///
    /// This error occurs when the provided CKAN portal URL is malformed
    /// or cannot be used to construct valid API endpoints.
    #[error("Invalid CKAN portal URL: {0}")]
    InvalidPortalUrl(String),

    /// Network or connection error.
    ///
    /// This error occurs when a network request fails due to connectivity issues,
    /// DNS resolution failures, or the remote server being unreachable.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Request timeout.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// The CKAN API rejected the request.
    ///
    /// Carries the HTTP status and the raw response body for diagnosis
    /// (CKAN puts its error object in the body).
    #[error("CKAN API returned HTTP {status}: {body}")]
    ApiError { status: u16, body: String },

    /// JSON deserialization failed.
    ///
    /// Raised when the `package_show` body is not JSON or lacks required
    /// fields such as `result.resources[].name`.
    #[error("Failed to parse CKAN response: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Downloading one resource failed.
    #[error("Failed to download resource '{resource}': {reason}")]
    DownloadError { resource: String, reason: String },

    /// Some resources failed while running with the continue policy.
    #[error("{failed} of {total} resource downloads failed: {names}")]
    PartialFailure {
        failed: usize,
        total: usize,
        names: String,
    },
}

impl AppError {
    /// Creates a download error naming the resource.
    pub fn download(resource: impl Into<String>, reason: impl ToString) -> Self {
        AppError::DownloadError {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns the [`ErrorKind`] this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::ConfigError(_)
            | AppError::InvalidRegex(_)
            | AppError::InvalidConfigFile(_)
            | AppError::InvalidPortalUrl(_) => ErrorKind::Configuration,
            AppError::NetworkError(_) | AppError::Timeout(_) => ErrorKind::Connectivity,
            AppError::ApiError { .. } => ErrorKind::Api,
            AppError::ParseError(_) => ErrorKind::Parse,
            AppError::DownloadError { .. } | AppError::PartialFailure { .. } => {
                ErrorKind::Download
            }
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    /// Returns a user-friendly error message suitable for CLI output.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidRegex(e) => {
                format!(
                    "Invalid --resource-name-regex pattern.\n   {}",
                    e.to_string().replace('\n', "\n   ")
                )
            }
            AppError::InvalidPortalUrl(url) => {
                format!(
                    "Invalid portal URL: {}\n   Example: https://cctdata.co.za/data-catalogue",
                    url
                )
            }
            AppError::NetworkError(msg) => {
                format!(
                    "Connectivity error: {}\n   Check your internet connection and the portal URL.",
                    msg
                )
            }
            AppError::Timeout(secs) => {
                format!(
                    "Connectivity error: request timed out after {} seconds.\n   The portal may be slow or unreachable.",
                    secs
                )
            }
            AppError::ApiError { status: 404, body } => {
                format!(
                    "API error: dataset not found (HTTP 404).\n   Check --dataset-id.\n   Response: {}",
                    truncate_body(body)
                )
            }
            AppError::ApiError {
                status: status @ (401 | 403),
                body,
            } => {
                format!(
                    "API error: access denied (HTTP {}).\n   Check --ckan-api-key or the CKAN_API_KEY environment variable.\n   Response: {}",
                    status,
                    truncate_body(body)
                )
            }
            AppError::ApiError { status, body } => {
                format!(
                    "API error: HTTP {}.\n   Response: {}",
                    status,
                    truncate_body(body)
                )
            }
            AppError::ParseError(e) => {
                format!(
                    "Parse error: the portal returned an unexpected response ({}).\n   Is the URL pointing at a CKAN portal?",
                    e
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Keeps error bodies readable on a terminal.
fn truncate_body(body: &str) -> String {
    const MAX_BODY_CHARS: usize = 300;

    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_CHARS {
        trimmed.to_string()
    } else {
        let head: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AppError::download("budget.csv", "HTTP 500");
        assert_eq!(
            err.to_string(),
            "Failed to download resource 'budget.csv': HTTP 500"
        );
    }

    #[test]
    fn test_api_error_display() {
        let err = AppError::ApiError {
            status: 403,
            body: "Forbidden".to_string(),
        };
        assert_eq!(err.to_string(), "CKAN API returned HTTP 403: Forbidden");
    }

    #[test]
    fn test_kinds() {
        assert_eq!(
            AppError::ConfigError("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            AppError::InvalidPortalUrl("x".into()).kind(),
            ErrorKind::Configuration
        );
        assert_eq!(
            AppError::NetworkError("x".into()).kind(),
            ErrorKind::Connectivity
        );
        assert_eq!(AppError::Timeout(30).kind(), ErrorKind::Connectivity);
        assert_eq!(
            AppError::download("a", "b").kind(),
            ErrorKind::Download
        );
        assert_eq!(
            AppError::PartialFailure {
                failed: 1,
                total: 2,
                names: "a".into()
            }
            .kind(),
            ErrorKind::Download
        );
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let kinds = [
            ErrorKind::Configuration,
            ErrorKind::Connectivity,
            ErrorKind::Api,
            ErrorKind::Parse,
            ErrorKind::Download,
        ];
        let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), kinds.len());
        assert!(codes.iter().all(|c| *c != 0));
    }

    #[test]
    fn test_error_from_regex() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let app_err: AppError = regex_err.into();
        assert!(matches!(app_err, AppError::InvalidRegex(_)));
        assert_eq!(app_err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_error_from_serde() {
        let json = "{ invalid json }";
        let result: Result<serde_json::Value, _> = serde_json::from_str(json);
        let serde_err = result.unwrap_err();
        let app_err: AppError = serde_err.into();
        assert!(matches!(app_err, AppError::ParseError(_)));
        assert_eq!(app_err.kind(), ErrorKind::Parse);
    }

    #[test]
    fn test_user_message_not_found() {
        let err = AppError::ApiError {
            status: 404,
            body: r#"{"success": false}"#.to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("dataset not found"));
        assert!(msg.contains("--dataset-id"));
    }

    #[test]
    fn test_user_message_forbidden() {
        let err = AppError::ApiError {
            status: 403,
            body: String::new(),
        };
        assert!(err.user_message().contains("CKAN_API_KEY"));
    }

    #[test]
    fn test_user_message_truncates_long_body() {
        let err = AppError::ApiError {
            status: 500,
            body: "x".repeat(1000),
        };
        let msg = err.user_message();
        assert!(msg.ends_with("..."));
        assert!(msg.len() < 400);
    }
}
