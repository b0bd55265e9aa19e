//! The fetch pipeline: config → metadata request → filter → downloads.

use std::path::PathBuf;

use ckan_fetch_client::{build_download_client, CkanClient, Downloader};
use ckan_fetch_core::{load_config, AppError, DownloadSummary, ResourceFilter};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::config::Config;

/// What a successful run produced.
#[derive(Debug)]
pub enum RunOutcome {
    /// `--dry-run`: the files that would have been written, in order.
    DryRun(Vec<PathBuf>),
    /// Files were downloaded (possibly none, if nothing matched).
    Downloaded(DownloadSummary),
}

/// Runs the whole pipeline for one invocation.
///
/// The resource filter and the config file are validated before the first
/// request, so a bad regex never costs a round trip to the portal.
pub async fn run(config: &Config) -> Result<RunOutcome, AppError> {
    let filter = ResourceFilter::new(config.resource_name_regex.as_deref())?;
    let file_config = load_config(config.config.as_deref())?;
    let http_config = file_config.http_config();
    let portal_url = file_config.portal_url(config.ckan_url.as_deref());

    let ckan = CkanClient::new(&portal_url, config.ckan_api_key.clone(), &http_config)?;
    let download_client = build_download_client(&http_config)?;

    info!(
        "Looking up resources for {} on {}",
        config.dataset_id,
        ckan.base_url()
    );
    let resources = ckan.fetch_resources(&config.dataset_id).await?;
    let total = resources.len();

    let selected = filter.apply(resources);
    info!("Selected {} of {} resources", selected.len(), total);

    let downloader = Downloader::new(
        download_client,
        config.ckan_api_key.clone(),
        ckan.base_url(),
        &config.destination_dir,
    );

    if config.dry_run {
        let paths = selected
            .iter()
            .map(|r| downloader.target_path(r))
            .collect();
        return Ok(RunOutcome::DryRun(paths));
    }

    if selected.is_empty() {
        info!("No resources to download");
        return Ok(RunOutcome::Downloaded(DownloadSummary::new()));
    }

    let progress = progress_bar(selected.len() as u64, !config.no_progress_bar);
    let result = downloader
        .download_all(&selected, config.failure_policy(), |resource, outcome| {
            debug!(resource = %resource.name, success = outcome.is_success(), "Resource finished");
            progress.set_message(resource.name.clone());
            progress.inc(1);
        })
        .await;
    progress.finish_and_clear();

    result.map(RunOutcome::Downloaded)
}

/// Progress bar over the download queue, hidden when disabled.
fn progress_bar(len: u64, enabled: bool) -> ProgressBar {
    if !enabled {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(len);
    bar.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_bar() {
        let bar = progress_bar(3, false);
        assert!(bar.is_hidden());
    }

    #[test]
    fn test_progress_bar_length() {
        let bar = progress_bar(3, true);
        assert_eq!(bar.length(), Some(3));
    }
}
