//! Sequential resource downloads into a destination directory.

use std::path::{Path, PathBuf};

use ckan_fetch_core::filename::resource_filename;
use ckan_fetch_core::{
    ApiKey, AppError, DownloadSummary, FailurePolicy, ResourceDescriptor, ResourceResult,
};
use futures::StreamExt;
use reqwest::{Client, Url};
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};

use crate::http::API_KEY_HEADER;

/// A resource written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Streams CKAN resources into a directory, one at a time.
///
/// Each body is written to a hidden `.<name>.part` file next to its target and
/// renamed over the target once complete. A failed transfer removes the
/// temporary file, so a previously downloaded copy is left untouched.
///
/// The API key is only sent to resources hosted on the portal's own origin.
/// Pass a client from [`build_download_client`](crate::build_download_client)
/// so large transfers are bounded by an idle timeout rather than a deadline.
///
/// # Example
///
/// ```no_run
/// use ckan_fetch_client::{build_download_client, Downloader};
/// use ckan_fetch_core::{ApiKey, FailurePolicy, HttpConfig, ResourceDescriptor};
/// use reqwest::Url;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = build_download_client(&HttpConfig::default())?;
/// let portal = Url::parse("https://cctdata.co.za/data-catalogue/")?;
/// let downloader = Downloader::new(client, ApiKey::new("secret"), &portal, "./data");
/// let resources = vec![ResourceDescriptor::new("a", "https://cctdata.co.za/a.csv")];
/// let summary = downloader
///     .download_all(&resources, FailurePolicy::Abort, |_, _| {})
///     .await?;
/// println!("{} files", summary.successful_count());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    api_key: ApiKey,
    portal_origin: url::Origin,
    destination: PathBuf,
}

impl Downloader {
    pub fn new(
        client: Client,
        api_key: ApiKey,
        portal_url: &Url,
        destination: impl Into<PathBuf>,
    ) -> Self {
        Self {
            client,
            api_key,
            portal_origin: portal_url.origin(),
            destination: destination.into(),
        }
    }

    /// Final path a resource is saved to.
    pub fn target_path(&self, resource: &ResourceDescriptor) -> PathBuf {
        self.destination.join(resource_filename(resource))
    }

    /// Downloads one resource, overwriting any existing file of the same name.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DownloadError` naming the resource if the URL is
    /// invalid, the request fails, the server answers with a non-2xx status or
    /// the file cannot be written.
    #[instrument(skip(self, resource), fields(resource = %resource.name, url = %resource.url))]
    pub async fn download(&self, resource: &ResourceDescriptor) -> Result<DownloadedFile, AppError> {
        let fail = |reason: String| AppError::download(resource.name.clone(), reason);

        let url = Url::parse(&resource.url)
            .map_err(|e| fail(format!("invalid URL '{}': {}", resource.url, e)))?;

        fs::create_dir_all(&self.destination).await.map_err(|e| {
            fail(format!(
                "cannot create directory {}: {}",
                self.destination.display(),
                e
            ))
        })?;

        let mut request = self.client.get(url.clone());
        if url.origin() == self.portal_origin {
            request = request.header(API_KEY_HEADER, self.api_key.expose());
        } else {
            debug!("Resource hosted off-portal, not sending API key");
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                fail("request timed out".to_string())
            } else {
                fail(format!("network error: {}", e))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }

        let target = self.target_path(resource);
        let part = part_path(&target);
        debug!(path = %part.display(), "Streaming to temporary file");

        let written = match stream_to_file(response, &part).await {
            Ok(bytes) => bytes,
            Err(reason) => {
                debug!(path = %part.display(), "Removing partial file after error");
                let _ = fs::remove_file(&part).await;
                return Err(fail(reason));
            }
        };

        if let Err(e) = fs::rename(&part, &target).await {
            let _ = fs::remove_file(&part).await;
            return Err(fail(format!(
                "cannot move download into {}: {}",
                target.display(),
                e
            )));
        }

        info!(path = %target.display(), bytes = written, "Download complete");
        Ok(DownloadedFile {
            path: target,
            bytes: written,
        })
    }

    /// Downloads resources in order.
    ///
    /// With `FailurePolicy::Abort` the first error is returned immediately and
    /// the remaining resources are not attempted. With `FailurePolicy::Continue`
    /// every resource is attempted and, if any failed, the run ends with
    /// `AppError::PartialFailure`.
    ///
    /// `on_finished` is called after each attempted resource.
    pub async fn download_all<F>(
        &self,
        resources: &[ResourceDescriptor],
        policy: FailurePolicy,
        mut on_finished: F,
    ) -> Result<DownloadSummary, AppError>
    where
        F: FnMut(&ResourceDescriptor, &ResourceResult),
    {
        let total = resources.len();
        let mut summary = DownloadSummary::new();

        for (i, resource) in resources.iter().enumerate() {
            debug!("[{}/{}] Downloading {}", i + 1, total, resource.name);

            let result = match self.download(resource).await {
                Ok(file) => ResourceResult::success(resource.name.clone(), file.path, file.bytes),
                Err(e) => {
                    if policy == FailurePolicy::Abort {
                        on_finished(
                            resource,
                            &ResourceResult::failure(resource.name.clone(), e.to_string()),
                        );
                        return Err(e);
                    }
                    warn!("[{}/{}] {}", i + 1, total, e);
                    ResourceResult::failure(resource.name.clone(), e.to_string())
                }
            };

            on_finished(resource, &result);
            summary.add(result);
        }

        info!(
            "Downloads complete: {} successful, {} failed out of {} total",
            summary.successful_count(),
            summary.failed_count(),
            total
        );

        summary.into_result()
    }
}

/// Temporary sibling used while a download is in flight.
fn part_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.part", name))
}

/// Streams the response body to `path`, returning bytes written.
async fn stream_to_file(response: reqwest::Response, path: &Path) -> Result<u64, String> {
    let file = File::create(path)
        .await
        .map_err(|e| format!("cannot create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                "transfer timed out waiting for data".to_string()
            } else {
                format!("transfer interrupted: {}", e)
            }
        })?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| format!("cannot write {}: {}", path.display(), e))?;

    Ok(bytes_written)
}
