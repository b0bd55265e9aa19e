use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Identifier of a CKAN dataset ("package"), either its UUID or its name slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetId(String);

impl DatasetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DatasetId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// CKAN API key.
///
/// The value is only reachable through [`ApiKey::expose`]; both `Debug` and
/// `Display` print a placeholder so the key never ends up in logs.
///
/// ```
/// use ckan_fetch_core::ApiKey;
///
/// let key = ApiKey::new("s3cr3t");
/// assert_eq!(format!("{:?}", key), "ApiKey(***)");
/// assert_eq!(key.expose(), "s3cr3t");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key, for use in request headers only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for ApiKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// One downloadable file listed in a dataset's `resources` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// CKAN resource UUID, when the portal provides one
    pub id: Option<String>,
    /// Display name, used for filtering and as the local file name
    pub name: String,
    /// Direct download URL
    pub url: String,
    /// Declared format (e.g. `CSV`), often empty on real portals
    pub format: Option<String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            format: None,
        }
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_is_redacted() {
        let key: ApiKey = "abc-123".parse().unwrap();
        assert_eq!(key.to_string(), "***");
        assert!(!format!("{:?}", key).contains("abc-123"));
        assert_eq!(key.expose(), "abc-123");
    }

    #[test]
    fn test_dataset_id_display() {
        let id: DatasetId = "billed-consumption-data".parse().unwrap();
        assert_eq!(id.to_string(), "billed-consumption-data");
        assert_eq!(id.as_str(), "billed-consumption-data");
    }

    #[test]
    fn test_resource_builder() {
        let r = ResourceDescriptor::new("a", "https://x/a.csv").with_format("CSV");
        assert_eq!(r.format.as_deref(), Some("CSV"));
        assert!(r.id.is_none());
    }
}
