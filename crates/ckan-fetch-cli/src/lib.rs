//! ckan-fetch CLI - Command-line interface for downloading CKAN dataset resources
//!
//! This crate ties the core types and the HTTP client together into a single
//! sequential pipeline.

pub mod config;
pub mod pipeline;

pub use config::Config;
pub use pipeline::{run, RunOutcome};
