use ckan_fetch_core::{ApiKey, DatasetId, FailurePolicy};
use clap::Parser;
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "ckan-fetch")]
#[command(
    author,
    version,
    about = "Downloads the resources of a CKAN dataset to a local directory"
)]
#[command(after_help = "Examples:
  ckan-fetch --dataset-id billed-consumption-data --ckan-api-key $KEY
  ckan-fetch --dataset-id water-usage --resource-name-regex '2021' --destination-dir ./water
  CKAN_URL=https://demo.ckan.org ckan-fetch --dataset-id sample --dry-run")]
pub struct Config {
    /// ID or name of the CKAN dataset, e.g. "billed-consumption-data"
    #[arg(long, value_name = "ID")]
    pub dataset_id: DatasetId,

    /// CKAN API key, sent in the X-CKAN-API-Key header
    #[arg(long, env = "CKAN_API_KEY", hide_env_values = true, value_name = "KEY")]
    pub ckan_api_key: ApiKey,

    /// Base URL of the CKAN portal [default: from config file, else https://cctdata.co.za/data-catalogue]
    #[arg(long, env = "CKAN_URL", value_name = "URL")]
    pub ckan_url: Option<String>,

    /// Only download resources whose name matches this regex (searched, not anchored)
    #[arg(long, value_name = "REGEX")]
    pub resource_name_regex: Option<String>,

    /// Directory to save resources into, created if missing
    #[arg(long, value_name = "PATH", default_value = ".")]
    pub destination_dir: PathBuf,

    /// Keep downloading after a resource fails and report all failures at the end
    #[arg(long)]
    pub keep_going: bool,

    /// List the files that would be written without downloading anything
    #[arg(long)]
    pub dry_run: bool,

    /// Custom path to the config.toml file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Turns on debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Turns off the progress bar
    #[arg(long)]
    pub no_progress_bar: bool,
}

impl Config {
    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        }
    }
}
