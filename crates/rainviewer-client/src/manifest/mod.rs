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

//! Frame manifest types for the RainViewer weather maps API.
//!
//! The API publishes a JSON document listing the radar frames (past
//! observations plus a short nowcast) and infrared satellite frames currently
//! available, along with the tile host to fetch them from. This module holds
//! the typed representation of that document and the tile address
//! construction for a single frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tile edge length in pixels for overlay requests.
pub const TILE_SIZE: u32 = 256;

/// Color scheme id used for satellite overlays (grayscale).
pub const SATELLITE_COLOR_SCHEME: u8 = 0;

/// A single overlay frame: a capture timestamp plus the path fragment that
/// addresses its tiles on the manifest host.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Frame {
    /// Capture time as unix seconds.
    pub time: i64,
    /// Tile path fragment, e.g. `/v2/radar/1700000000`.
    pub path: String,
}

impl Frame {
    /// Capture time as a UTC datetime, if the timestamp is representable.
    #[must_use]
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.time, 0)
    }
}

/// Radar frame sequences in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RadarFrames {
    /// Observed frames, oldest first.
    #[serde(default)]
    pub past: Vec<Frame>,
    /// Short-term forecast frames, continuing where `past` ends.
    #[serde(default)]
    pub nowcast: Vec<Frame>,
}

/// Satellite frame sequences in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SatelliteFrames {
    /// Infrared frames, oldest first.
    #[serde(default)]
    pub infrared: Vec<Frame>,
}

/// The weather maps manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WeatherMaps {
    /// API schema version string.
    #[serde(default)]
    pub version: String,
    /// Manifest generation time as unix seconds.
    pub generated: i64,
    /// Base URL of the tile host, e.g. `https://tilecache.rainviewer.com`.
    pub host: String,
    /// Radar frames.
    #[serde(default)]
    pub radar: RadarFrames,
    /// Satellite frames.
    #[serde(default)]
    pub satellite: SatelliteFrames,
}

impl WeatherMaps {
    /// Parse a manifest from its JSON representation.
    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    /// Number of frames in the timeline for the given overlay kind.
    ///
    /// The radar timeline is `past` followed by `nowcast`.
    #[must_use]
    pub fn frame_count(&self, kind: OverlayKind) -> usize {
        match kind {
            OverlayKind::Radar => self.radar.past.len() + self.radar.nowcast.len(),
            OverlayKind::Satellite => self.satellite.infrared.len(),
        }
    }

    /// Look up a frame by timeline index for the given overlay kind.
    #[must_use]
    pub fn frame_at(&self, kind: OverlayKind, index: usize) -> Option<&Frame> {
        match kind {
            OverlayKind::Radar => {
                let past = &self.radar.past;
                if index < past.len() {
                    past.get(index)
                } else {
                    self.radar.nowcast.get(index - past.len())
                }
            }
            OverlayKind::Satellite => self.satellite.infrared.get(index),
        }
    }

    /// Timeline index of the boundary between observed and forecast radar
    /// frames, i.e. the first nowcast frame.
    #[must_use]
    pub fn forecast_boundary(&self) -> usize {
        self.radar.past.len()
    }
}

/// Which overlay sequence a timeline index addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlayKind {
    /// Precipitation radar (past plus nowcast).
    #[default]
    Radar,
    /// Infrared satellite imagery.
    Satellite,
}

impl OverlayKind {
    /// Human-readable display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            OverlayKind::Radar => "Radar",
            OverlayKind::Satellite => "Satellite",
        }
    }

    /// All overlay kinds, in display order.
    #[must_use]
    pub fn all() -> &'static [OverlayKind] {
        &[OverlayKind::Radar, OverlayKind::Satellite]
    }
}

/// Radar color palettes offered by the tile host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorScheme {
    /// The original RainViewer palette.
    Original,
    /// Blue-dominant palette designed for dark basemaps.
    #[default]
    UniversalBlue,
    /// The Weather Channel palette.
    WeatherChannel,
    /// NEXRAD Level III reflectivity palette.
    NexradLevel3,
    /// Rainbow SELEX-SI palette.
    RainbowSelex,
    /// Dark Sky palette.
    DarkSky,
}

impl ColorScheme {
    /// Palette id as used in tile addresses.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            ColorScheme::Original => 1,
            ColorScheme::UniversalBlue => 2,
            ColorScheme::WeatherChannel => 4,
            ColorScheme::NexradLevel3 => 6,
            ColorScheme::RainbowSelex => 7,
            ColorScheme::DarkSky => 8,
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ColorScheme::Original => "Original",
            ColorScheme::UniversalBlue => "Universal Blue",
            ColorScheme::WeatherChannel => "The Weather Channel",
            ColorScheme::NexradLevel3 => "NEXRAD Level III",
            ColorScheme::RainbowSelex => "Rainbow SELEX-SI",
            ColorScheme::DarkSky => "Dark Sky",
        }
    }

    /// All palettes, in display order.
    #[must_use]
    pub fn all() -> &'static [ColorScheme] {
        &[
            ColorScheme::Original,
            ColorScheme::UniversalBlue,
            ColorScheme::WeatherChannel,
            ColorScheme::NexradLevel3,
            ColorScheme::RainbowSelex,
            ColorScheme::DarkSky,
        ]
    }
}

/// Build the tile address template for one overlay frame.
///
/// The result keeps `{z}`, `{x}` and `{y}` as literal placeholders for the
/// tile layer to substitute. A trailing slash on `host` is normalized away so
/// hosts with and without one produce the same address. The smoothing and
/// snow flags are rendered as `1`/`0`.
#[must_use]
pub fn overlay_tile_url(
    host: &str,
    frame: &Frame,
    size: u32,
    scheme: u8,
    smooth: bool,
    snow: bool,
) -> String {
    format!(
        "{}{}/{}/{{z}}/{{x}}/{{y}}/{}/{}_{}.png",
        host.trim_end_matches('/'),
        frame.path,
        size,
        scheme,
        u8::from(smooth),
        u8::from(snow)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(time: i64, path: &str) -> Frame {
        Frame {
            time,
            path: path.to_string(),
        }
    }

    fn sample_manifest() -> WeatherMaps {
        WeatherMaps {
            version: "2.0".to_string(),
            generated: 1_700_000_000,
            host: "https://tilecache.rainviewer.com".to_string(),
            radar: RadarFrames {
                past: vec![frame(1, "/v2/radar/1"), frame(2, "/v2/radar/2")],
                nowcast: vec![frame(3, "/v2/radar/nowcast_3")],
            },
            satellite: SatelliteFrames {
                infrared: vec![frame(1, "/v2/satellite/1")],
            },
        }
    }

    #[test]
    fn test_parse_manifest_json() {
        let json = r#"{
            "version": "2.0",
            "generated": 1700000000,
            "host": "https://tilecache.rainviewer.com",
            "radar": {
                "past": [
                    {"time": 1699999000, "path": "/v2/radar/1699999000"},
                    {"time": 1699999600, "path": "/v2/radar/1699999600"}
                ],
                "nowcast": [
                    {"time": 1700000200, "path": "/v2/radar/nowcast_1700000200"}
                ]
            },
            "satellite": {
                "infrared": [
                    {"time": 1699999500, "path": "/v2/satellite/abc123"}
                ]
            }
        }"#;

        let manifest = WeatherMaps::from_json(json).unwrap();
        assert_eq!(manifest.host, "https://tilecache.rainviewer.com");
        assert_eq!(manifest.generated, 1_700_000_000);
        assert_eq!(manifest.radar.past.len(), 2);
        assert_eq!(manifest.radar.nowcast.len(), 1);
        assert_eq!(manifest.satellite.infrared.len(), 1);
        assert_eq!(manifest.radar.past[0].time, 1_699_999_000);
    }

    #[test]
    fn test_parse_manifest_missing_sequences() {
        let json = r#"{"generated": 1700000000, "host": "https://example.com"}"#;
        let manifest = WeatherMaps::from_json(json).unwrap();
        assert_eq!(manifest.frame_count(OverlayKind::Radar), 0);
        assert_eq!(manifest.frame_count(OverlayKind::Satellite), 0);
    }

    #[test]
    fn test_parse_manifest_ignores_unknown_fields() {
        let json = r#"{"generated": 1, "host": "h", "coverage": "/v2/coverage/0"}"#;
        assert!(WeatherMaps::from_json(json).is_ok());
    }

    #[test]
    fn test_frame_count_per_kind() {
        let manifest = sample_manifest();
        assert_eq!(manifest.frame_count(OverlayKind::Radar), 3);
        assert_eq!(manifest.frame_count(OverlayKind::Satellite), 1);
    }

    #[test]
    fn test_frame_at_crosses_past_nowcast_boundary() {
        let manifest = sample_manifest();
        assert_eq!(manifest.frame_at(OverlayKind::Radar, 0).unwrap().time, 1);
        assert_eq!(manifest.frame_at(OverlayKind::Radar, 1).unwrap().time, 2);
        assert_eq!(manifest.frame_at(OverlayKind::Radar, 2).unwrap().time, 3);
        assert!(manifest.frame_at(OverlayKind::Radar, 3).is_none());
        assert_eq!(manifest.forecast_boundary(), 2);
    }

    #[test]
    fn test_overlay_tile_url_vector() {
        let frame = frame(0, "/v2/abc");
        let url = overlay_tile_url("https://tilecache.example/", &frame, 256, 4, true, false);
        assert_eq!(
            url,
            "https://tilecache.example/v2/abc/256/{z}/{x}/{y}/4/1_0.png"
        );
    }

    #[test]
    fn test_overlay_tile_url_without_trailing_slash() {
        let frame = frame(0, "/v2/abc");
        let url = overlay_tile_url("https://tilecache.example", &frame, 512, 2, false, true);
        assert_eq!(
            url,
            "https://tilecache.example/v2/abc/512/{z}/{x}/{y}/2/0_1.png"
        );
    }

    #[test]
    fn test_color_scheme_ids() {
        assert_eq!(ColorScheme::UniversalBlue.id(), 2);
        assert_eq!(ColorScheme::WeatherChannel.id(), 4);
        assert_eq!(ColorScheme::DarkSky.id(), 8);
        assert_eq!(ColorScheme::default(), ColorScheme::UniversalBlue);
    }

    #[test]
    fn test_frame_datetime() {
        let frame = frame(1_700_000_000, "/v2/radar/x");
        assert!(frame.datetime().is_some());
    }
}
