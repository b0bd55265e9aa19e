use ckan_fetch_core::{AppError, HttpConfig};
use reqwest::{Client, ClientBuilder};

/// Header CKAN reads the API key from.
pub const API_KEY_HEADER: &str = "X-CKAN-API-Key";

/// Builds the `reqwest` client used by [`CkanClient`](crate::CkanClient) for
/// metadata requests, bounded by the whole-request `timeout`.
///
/// # Errors
///
/// Returns `AppError::ConfigError` if the client cannot be built (e.g. the
/// configured user agent is not a valid header value).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, AppError> {
    finish(base_builder(config).timeout(config.timeout))
}

/// Builds the client used by [`Downloader`](crate::Downloader).
///
/// Transfers have no overall deadline: only `read_timeout`, which resets on
/// every chunk received, so a slow but live download runs to completion.
///
/// # Errors
///
/// Same as [`build_http_client`].
pub fn build_download_client(config: &HttpConfig) -> Result<Client, AppError> {
    finish(base_builder(config).read_timeout(config.read_timeout))
}

fn base_builder(config: &HttpConfig) -> ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(config.connect_timeout)
}

fn finish(builder: ClientBuilder) -> Result<Client, AppError> {
    builder
        .build()
        .map_err(|e| AppError::ConfigError(format!("Cannot build HTTP client: {}", e)))
}

/// Maps a transport-level `reqwest` error to a connectivity error.
pub(crate) fn connectivity_error(err: reqwest::Error, config_timeout_secs: u64) -> AppError {
    if err.is_timeout() {
        AppError::Timeout(config_timeout_secs)
    } else if err.is_connect() {
        AppError::NetworkError(format!("Connection failed: {}", err))
    } else {
        AppError::NetworkError(err.to_string())
    }
}
