use ckan_fetch_core::{ApiKey, AppError, DatasetId, HttpConfig, ResourceDescriptor};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::http::{build_http_client, connectivity_error, API_KEY_HEADER};

/// Path of the package metadata action, relative to the portal root.
const PACKAGE_SHOW_PATH: &str = "api/3/action/package_show";

/// Generic wrapper for CKAN API responses.
///
/// CKAN API reference: <https://docs.ckan.org/en/2.9/api/>
///
/// CKAN always returns responses with the structure:
/// ```json
/// {
///     "success": bool,
///     "result": T
/// }
/// ```
/// On failure `result` is replaced by an `error` object, hence the `Option`.
#[derive(Deserialize, Debug)]
struct CkanResponse<T> {
    success: bool,
    result: Option<T>,
}

/// Data Transfer Object for the parts of a CKAN `package_show` result we use.
///
/// # Examples
///
/// ```
/// use ckan_fetch_client::ckan::CkanPackage;
///
/// let json = r#"{
///     "id": "dataset-123",
///     "name": "billed-consumption-data",
///     "title": "Billed Consumption",
///     "resources": [
///         {"name": "2021", "url": "https://example.org/2021.csv", "format": "CSV"}
///     ]
/// }"#;
///
/// let package: CkanPackage = serde_json::from_str(json).unwrap();
/// assert_eq!(package.name, "billed-consumption-data");
/// assert_eq!(package.resources.len(), 1);
/// ```
#[derive(Deserialize, Debug, Clone)]
pub struct CkanPackage {
    pub id: Option<String>,
    /// URL-friendly name/slug of the dataset
    pub name: String,
    pub title: Option<String>,
    /// Files attached to the dataset, in portal order
    pub resources: Vec<CkanResource>,
}

/// One entry of a package's `resources` array.
#[derive(Deserialize, Debug, Clone)]
pub struct CkanResource {
    pub id: Option<String>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub format: Option<String>,
}

impl From<CkanResource> for ResourceDescriptor {
    fn from(resource: CkanResource) -> Self {
        ResourceDescriptor {
            id: resource.id,
            name: resource.name,
            url: resource.url,
            format: resource.format.filter(|f| !f.trim().is_empty()),
        }
    }
}

/// HTTP client for the package metadata API of a CKAN portal.
///
/// Every request carries the API key in the `X-CKAN-API-Key` header.
/// Requests are never retried.
///
/// # Examples
///
/// ```no_run
/// use ckan_fetch_client::CkanClient;
/// use ckan_fetch_core::{ApiKey, DatasetId, HttpConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CkanClient::new(
///     "https://cctdata.co.za/data-catalogue",
///     ApiKey::new("secret"),
///     &HttpConfig::default(),
/// )?;
/// let resources = client
///     .fetch_resources(&DatasetId::new("billed-consumption-data"))
///     .await?;
/// println!("Found {} resources", resources.len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CkanClient {
    client: Client,
    base_url: Url,
    api_key: ApiKey,
    timeout_secs: u64,
}

impl CkanClient {
    /// Creates a new CKAN client for the specified portal.
    ///
    /// # Arguments
    ///
    /// * `base_url_str` - The base URL of the CKAN portal, possibly with a path
    ///   prefix (e.g. <https://cctdata.co.za/data-catalogue>)
    /// * `api_key` - Credential sent with every request
    /// * `config` - Timeouts and user agent
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidPortalUrl` if the URL is invalid or not http(s).
    /// Returns `AppError::ConfigError` if the HTTP client cannot be built.
    pub fn new(base_url_str: &str, api_key: ApiKey, config: &HttpConfig) -> Result<Self, AppError> {
        let base_url = parse_base_url(base_url_str)?;
        let client = build_http_client(config)?;
        Ok(Self {
            client,
            base_url,
            api_key,
            timeout_secs: config.timeout.as_secs(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Fetches the metadata of a dataset via the CKAN `package_show` action.
    ///
    /// # Errors
    ///
    /// * `AppError::NetworkError` / `AppError::Timeout` if the portal is unreachable.
    /// * `AppError::ApiError` on a non-2xx status or `"success": false`.
    /// * `AppError::ParseError` if the body does not match the expected shape.
    #[instrument(skip(self), fields(portal = %self.base_url))]
    pub async fn show_package(&self, id: &DatasetId) -> Result<CkanPackage, AppError> {
        let url = self.package_show_url(id)?;
        debug!(%url, "Requesting package metadata");

        let resp = self
            .client
            .get(url)
            .header(API_KEY_HEADER, self.api_key.expose())
            .send()
            .await
            .map_err(|e| connectivity_error(e, self.timeout_secs))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| connectivity_error(e, self.timeout_secs))?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "CKAN API returned an error status");
            return Err(AppError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let ckan_resp: CkanResponse<Value> = serde_json::from_str(&body)?;
        if !ckan_resp.success {
            return Err(AppError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let result = ckan_resp.result.ok_or_else(|| {
            AppError::ParseError(serde::de::Error::missing_field("result"))
        })?;
        let package: CkanPackage = serde_json::from_value(result)?;

        info!(
            dataset = %package.name,
            resources = package.resources.len(),
            "Fetched package metadata"
        );
        Ok(package)
    }

    /// Fetches a dataset and returns its resources in portal order.
    pub async fn fetch_resources(
        &self,
        id: &DatasetId,
    ) -> Result<Vec<ResourceDescriptor>, AppError> {
        let package = self.show_package(id).await?;
        Ok(package
            .resources
            .into_iter()
            .map(ResourceDescriptor::from)
            .collect())
    }

    fn package_show_url(&self, id: &DatasetId) -> Result<Url, AppError> {
        let mut url = self
            .base_url
            .join(PACKAGE_SHOW_PATH)
            .map_err(|e| AppError::InvalidPortalUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("id", id.as_str());
        Ok(url)
    }
}

/// Parses the portal URL, keeping any path prefix by forcing a trailing slash
/// (otherwise `Url::join` would drop the last segment).
fn parse_base_url(base_url_str: &str) -> Result<Url, AppError> {
    let mut base_url = Url::parse(base_url_str)
        .map_err(|_| AppError::InvalidPortalUrl(base_url_str.to_string()))?;

    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(AppError::InvalidPortalUrl(base_url_str.to_string()));
    }

    if !base_url.path().ends_with('/') {
        let path = format!("{}/", base_url.path());
        base_url.set_path(&path);
    }
    base_url.set_query(None);
    base_url.set_fragment(None);
    Ok(base_url)
}
