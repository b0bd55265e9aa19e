//! ckan-fetch Client - HTTP access to CKAN portals
//!
//! This crate provides:
//!
//! - [`ckan`] - the `package_show` metadata client
//! - [`download`] - sequential, streaming resource downloads
//!
//! # Overview
//!
//! Metadata calls use a client with a whole-request deadline
//! ([`build_http_client`]); downloads use one with only an idle timeout
//! ([`build_download_client`]). Both attach the portal API key and map
//! failures onto [`ckan_fetch_core::AppError`]. Nothing is retried.

pub mod ckan;
pub mod download;
pub mod http;

// Re-export main client types
pub use ckan::CkanClient;
pub use download::{DownloadedFile, Downloader};
pub use http::{build_download_client, build_http_client, API_KEY_HEADER};
