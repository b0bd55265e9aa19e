//! Bookkeeping for a download run.
//!
//! Pure data types, decoupled from HTTP and filesystem I/O, so the downloader
//! and the CLI can share the same view of what happened.

use std::path::PathBuf;

use crate::error::AppError;

/// What to do with the rest of the queue after a resource fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure and return its error.
    #[default]
    Abort,
    /// Attempt every resource and report all failures at the end.
    Continue,
}

/// Result of downloading a single resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceResult {
    /// Resource name as listed by the portal.
    pub resource_name: String,
    /// Local file written, None if the download failed.
    pub path: Option<PathBuf>,
    /// Bytes written to `path`.
    pub bytes: u64,
    /// Error message if the download failed, None if successful.
    pub error: Option<String>,
}

impl ResourceResult {
    pub fn success(name: String, path: PathBuf, bytes: u64) -> Self {
        Self {
            resource_name: name,
            path: Some(path),
            bytes,
            error: None,
        }
    }

    pub fn failure(name: String, error: String) -> Self {
        Self {
            resource_name: name,
            path: None,
            bytes: 0,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregated results of a download run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct DownloadSummary {
    pub results: Vec<ResourceResult>,
}

impl DownloadSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: ResourceResult) {
        self.results.push(result);
    }

    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Total bytes written by successful downloads.
    pub fn total_bytes(&self) -> u64 {
        self.results.iter().map(|r| r.bytes).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResourceResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Turns a summary with failures into `AppError::PartialFailure`.
    pub fn into_result(self) -> Result<Self, AppError> {
        let failed = self.failed_count();
        if failed == 0 {
            return Ok(self);
        }
        let names = self
            .failures()
            .map(|r| r.resource_name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Err(AppError::PartialFailure {
            failed,
            total: self.total(),
            names,
        })
    }
}
