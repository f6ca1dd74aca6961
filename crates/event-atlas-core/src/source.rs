// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::AtlasError;
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const FETCH_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("Event-Atlas/", env!("CARGO_PKG_VERSION"));

/// Where the event feed comes from. Read exactly once per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    Url(String),
    Path(PathBuf),
}

impl FeedSource {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            FeedSource::Url(raw.to_string())
        } else {
            FeedSource::Path(PathBuf::from(raw))
        }
    }

    /// Raw feed bytes. Any failure to obtain them is `FeedUnavailable`.
    pub fn fetch(&self) -> Result<Vec<u8>, AtlasError> {
        match self {
            FeedSource::Url(url) => fetch_url(url),
            FeedSource::Path(path) => {
                let bytes = fs::read(path).map_err(|e| {
                    AtlasError::FeedUnavailable(format!("{}: {}", path.display(), e))
                })?;
                debug!(
                    "Read feed file — path={} bytes={}",
                    path.display(),
                    bytes.len()
                );
                Ok(bytes)
            }
        }
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedSource::Url(url) => f.write_str(url),
            FeedSource::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

fn fetch_url(url: &str) -> Result<Vec<u8>, AtlasError> {
    info!("Fetching event feed — url={}", url);
    let unavailable = |e: reqwest::Error| AtlasError::FeedUnavailable(format!("{url}: {e}"));

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
        .user_agent(USER_AGENT)
        .build()
        .map_err(unavailable)?;

    let response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(unavailable)?;
    let bytes = response.bytes().map_err(unavailable)?;

    debug!("Downloaded event feed — bytes={}", bytes.len());
    Ok(bytes.to_vec())
}
