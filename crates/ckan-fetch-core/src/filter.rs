//! Resource selection by name.

use regex::Regex;
use tracing::debug;

use crate::error::AppError;
use crate::models::ResourceDescriptor;

/// Keeps the resources whose name matches a regular expression.
///
/// Matching uses search semantics: the pattern may match anywhere in the name,
/// use `^`/`$` to anchor. Without a pattern every resource is kept.
///
/// # Examples
///
/// ```
/// use ckan_fetch_core::{ResourceDescriptor, ResourceFilter};
///
/// let filter = ResourceFilter::new(Some("2021")).unwrap();
/// let kept = filter.apply(vec![
///     ResourceDescriptor::new("consumption 2020", "https://example.org/2020.csv"),
///     ResourceDescriptor::new("consumption 2021", "https://example.org/2021.csv"),
/// ]);
/// assert_eq!(kept.len(), 1);
/// assert_eq!(kept[0].name, "consumption 2021");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pattern: Option<Regex>,
}

impl ResourceFilter {
    /// Compiles the optional pattern. An empty string counts as no pattern.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidRegex` if the pattern does not compile.
    pub fn new(pattern: Option<&str>) -> Result<Self, AppError> {
        let pattern = match pattern {
            Some(p) if !p.is_empty() => Some(Regex::new(p)?),
            _ => None,
        };
        Ok(Self { pattern })
    }

    pub fn is_pass_through(&self) -> bool {
        self.pattern.is_none()
    }

    pub fn matches(&self, resource: &ResourceDescriptor) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|re| re.is_match(&resource.name))
    }

    /// Returns the matching resources in their original order.
    pub fn apply(&self, resources: Vec<ResourceDescriptor>) -> Vec<ResourceDescriptor> {
        if self.is_pass_through() {
            return resources;
        }
        let total = resources.len();
        let kept: Vec<_> = resources.into_iter().filter(|r| self.matches(r)).collect();
        debug!(total, kept = kept.len(), "Applied resource name filter");
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(names: &[&str]) -> Vec<ResourceDescriptor> {
        names
            .iter()
            .map(|n| ResourceDescriptor::new(*n, format!("https://example.org/{}", n)))
            .collect()
    }

    fn names(resources: &[ResourceDescriptor]) -> Vec<&str> {
        resources.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_no_pattern_is_identity() {
        let filter = ResourceFilter::new(None).unwrap();
        assert!(filter.is_pass_through());
        let input = resources(&["c", "a", "b"]);
        assert_eq!(filter.apply(input.clone()), input);
    }

    #[test]
    fn test_empty_pattern_is_identity() {
        let filter = ResourceFilter::new(Some("")).unwrap();
        assert!(filter.is_pass_through());
    }

    #[test]
    fn test_only_matching_resource_kept() {
        let filter = ResourceFilter::new(Some("a")).unwrap();
        let kept = filter.apply(resources(&["a", "b"]));
        assert_eq!(names(&kept), vec!["a"]);
    }

    #[test]
    fn test_search_not_full_match() {
        let filter = ResourceFilter::new(Some("2021")).unwrap();
        let kept = filter.apply(resources(&["water 2021 q1", "water 2020 q1"]));
        assert_eq!(names(&kept), vec!["water 2021 q1"]);
    }

    #[test]
    fn test_anchored_pattern() {
        let filter = ResourceFilter::new(Some("^b")).unwrap();
        let kept = filter.apply(resources(&["ab", "ba", "bb"]));
        assert_eq!(names(&kept), vec!["ba", "bb"]);
    }

    #[test]
    fn test_preserves_order_without_duplicates() {
        let filter = ResourceFilter::new(Some("x")).unwrap();
        let input = resources(&["x3", "y1", "x1", "x2", "y2"]);
        let kept = filter.apply(input.clone());
        assert_eq!(names(&kept), vec!["x3", "x1", "x2"]);

        // Subsequence check: each kept item appears after the previous one.
        let mut cursor = 0;
        for r in &kept {
            let pos = input[cursor..].iter().position(|i| i == r).unwrap();
            cursor += pos + 1;
        }
    }

    #[test]
    fn test_no_matches() {
        let filter = ResourceFilter::new(Some("zzz")).unwrap();
        assert!(filter.apply(resources(&["a", "b"])).is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let result = ResourceFilter::new(Some("("));
        assert!(matches!(result, Err(AppError::InvalidRegex(_))));
    }
}
