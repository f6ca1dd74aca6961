// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::AtlasError;
use log::debug;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "event_atlas.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AtlasConfig {
    /// URL or filesystem path of the GeoJSON feed.
    pub feed: String,
    /// Slippy tile template with `{z}`, `{x}` and `{y}` placeholders.
    pub tile_url: String,
    /// (lat, lon)
    pub initial_center: [f64; 2],
    pub initial_zoom: f64,
    pub show_icons: bool,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            feed: "events.geojson".to_string(),
            tile_url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            initial_center: [20.0, 0.0],
            initial_zoom: 2.0,
            show_icons: true,
        }
    }
}

impl AtlasConfig {
    pub fn default_path() -> PathBuf {
        crate::get_config_root().join(CONFIG_FILE)
    }

    /// Loads `event_atlas.json` from the per-user config directory.
    pub fn load() -> Result<Self, AtlasError> {
        Self::load_from(&Self::default_path())
    }

    /// A missing file yields the defaults; a present but broken one is an error.
    pub fn load_from(path: &Path) -> Result<Self, AtlasError> {
        if !path.exists() {
            debug!("No config file, using defaults — path={}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AtlasError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn tile_url_for(&self, z: u32, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}
