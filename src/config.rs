// Copyright 2025 RainScope Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Application configuration management.
//!
//! This module handles persistent configuration storage using TOML format.
//! It covers map and overlay preferences, playback defaults, and the home
//! view restored on startup. Unknown fields are ignored and missing fields
//! fall back to per-field defaults, so configs survive version skew.

use serde::{Deserialize, Serialize};

use crate::map::MapStyle;
use rainviewer_client::{ColorScheme, OverlayKind, PlaybackSpeed};

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Basemap style
    #[serde(default)]
    pub map_style: MapStyle,

    /// Overlay kind shown on startup
    #[serde(default)]
    pub overlay: OverlayKind,

    /// Radar color scheme
    #[serde(default)]
    pub color_scheme: ColorScheme,

    /// Overlay opacity (0.1 - 1.0)
    #[serde(default = "default_overlay_opacity")]
    pub overlay_opacity: f32,

    /// Animation speed used on startup
    #[serde(default)]
    pub playback_speed: PlaybackSpeed,

    /// Request smoothed radar tiles
    #[serde(default = "default_true")]
    pub smooth_radar: bool,

    /// Request separate snow colors in radar tiles
    #[serde(default = "default_true")]
    pub snow_colors: bool,

    /// Comma-separated ISO country codes biasing location search
    #[serde(default = "default_search_country_codes")]
    pub search_country_codes: String,

    /// Latitude restored on startup and by the home button
    #[serde(default = "default_home_latitude")]
    pub home_latitude: f64,

    /// Longitude restored on startup and by the home button
    #[serde(default = "default_home_longitude")]
    pub home_longitude: f64,

    /// Zoom level restored on startup and by the home button
    #[serde(default = "default_home_zoom")]
    pub home_zoom: f32,

    /// Show the reflectivity legend
    #[serde(default = "default_true")]
    pub show_legend: bool,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

fn default_overlay_opacity() -> f32 {
    0.8
}

fn default_search_country_codes() -> String {
    "il".to_string()
}

fn default_home_latitude() -> f64 {
    31.5
}

fn default_home_longitude() -> f64 {
    34.8
}

fn default_home_zoom() -> f32 {
    8.0
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            map_style: MapStyle::Dark,
            overlay: OverlayKind::Radar,
            color_scheme: ColorScheme::UniversalBlue,
            overlay_opacity: default_overlay_opacity(),
            playback_speed: PlaybackSpeed::Normal,
            smooth_radar: true,
            snow_colors: true,
            search_country_codes: default_search_country_codes(),
            home_latitude: default_home_latitude(),
            home_longitude: default_home_longitude(),
            home_zoom: default_home_zoom(),
            show_legend: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating a default file if absent
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load("rainscope-desktop", "config")
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store("rainscope-desktop", "config", self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path("rainscope-desktop", "config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.config_version, 1);
        assert_eq!(config.map_style, MapStyle::Dark);
        assert_eq!(config.overlay, OverlayKind::Radar);
        assert_eq!(config.color_scheme, ColorScheme::UniversalBlue);
        assert!((config.overlay_opacity - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.playback_speed, PlaybackSpeed::Normal);
        assert!(config.smooth_radar);
        assert!(config.snow_colors);
        assert_eq!(config.search_country_codes, "il");
        assert!(config.show_legend);
    }

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        // Serde defaults are format-agnostic, so JSON stands in for TOML here.
        let config: AppConfig = serde_json::from_str(r#"{"overlay_opacity": 0.5}"#)
            .expect("partial config should deserialize");
        assert!((config.overlay_opacity - 0.5).abs() < f32::EPSILON);
        assert_eq!(config.map_style, MapStyle::Dark);
        assert_eq!(config.color_scheme, ColorScheme::UniversalBlue);
        assert!(config.smooth_radar);
    }
}
