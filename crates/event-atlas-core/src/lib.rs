// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod config;
pub mod feed;
pub mod geo;
pub mod icons;
pub mod panel;
pub mod properties;
pub mod registry;
pub mod session;
pub mod source;
pub mod surface;
pub mod visibility;

use std::path::PathBuf;
use thiserror::Error;

pub use feed::{Event, Ingested, SkipReason, SkippedRecord};
pub use geo::{BoundingBox, LatLon};
pub use panel::{ControlRow, FilterPanel};
pub use registry::{CategoryEntry, CategoryRegistry};
pub use session::{EventSession, LoadStatus};
pub use source::FeedSource;
pub use surface::{LayerId, LayerStore, MapSurface, Marker, Popup};
pub use visibility::{VisibilityChange, VisibilityCoordinator};

#[derive(Error, Debug)]
pub enum AtlasError {
    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),
    #[error("Malformed feed: {0}")]
    MalformedFeed(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Per-user directory holding `event_atlas.json` and the GUI log file.
/// Falls back to `.event_atlas` in the working directory when the platform
/// has no home directory.
pub fn get_config_root() -> PathBuf {
    directories::ProjectDirs::from("com", "startux", "event-atlas")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".event_atlas"))
}
