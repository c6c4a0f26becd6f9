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

//! Tile URL construction for basemaps and weather overlays.

use serde::{Deserialize, Serialize};

use rainviewer_client::{overlay_tile_url, ColorScheme, Frame, OverlayKind, TILE_SIZE};

/// Anything that can turn a tile coordinate into a fetchable URL.
pub trait TileSource {
    /// Build the URL for one tile.
    fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String;

    /// Attribution line shown on the map.
    fn attribution(&self) -> &'static str;
}

/// Available basemap styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MapStyle {
    #[default]
    Dark,
    Light,
    Satellite,
    Terrain,
}

impl MapStyle {
    /// Get human-readable display name
    pub fn label(&self) -> &'static str {
        match self {
            MapStyle::Dark => "Dark",
            MapStyle::Light => "Light",
            MapStyle::Satellite => "Satellite",
            MapStyle::Terrain => "Terrain",
        }
    }

    /// All styles in menu order
    pub fn all() -> [MapStyle; 4] {
        [
            MapStyle::Dark,
            MapStyle::Light,
            MapStyle::Satellite,
            MapStyle::Terrain,
        ]
    }

    /// Parse a style name as given on the command line, case-insensitive
    pub fn from_name(name: &str) -> Option<MapStyle> {
        Self::all()
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(name))
    }
}

impl TileSource for MapStyle {
    fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        match self {
            MapStyle::Dark => {
                // Subdomain load balancing (a, b, c, d) based on tile coordinates
                let subdomain = ['a', 'b', 'c', 'd'][((x + y) % 4) as usize];
                format!("https://{subdomain}.basemaps.cartocdn.com/dark_all/{zoom}/{x}/{y}.png")
            }
            MapStyle::Light => {
                let subdomain = ['a', 'b', 'c', 'd'][((x + y) % 4) as usize];
                format!(
                    "https://{subdomain}.basemaps.cartocdn.com/rastertiles/voyager/{zoom}/{x}/{y}.png"
                )
            }
            // Esri addresses tiles as z/y/x rather than z/x/y
            MapStyle::Satellite => format!(
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{zoom}/{y}/{x}"
            ),
            MapStyle::Terrain => {
                let subdomain = ['a', 'b', 'c'][((x + y) % 3) as usize];
                format!("https://{subdomain}.tile.opentopomap.org/{zoom}/{x}/{y}.png")
            }
        }
    }

    fn attribution(&self) -> &'static str {
        match self {
            MapStyle::Dark | MapStyle::Light => "© OpenStreetMap contributors, © CARTO",
            MapStyle::Satellite => "© Esri, Maxar, Earthstar Geographics",
            MapStyle::Terrain => "© OpenStreetMap contributors, © OpenTopoMap",
        }
    }
}

/// Tile source for one weather overlay frame.
///
/// Frozen at construction so two sources built from the same manifest frame
/// and render options produce identical URLs, which is what lets the tile
/// cache recognize already-fetched frames during animation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlaySource {
    template: String,
}

impl OverlaySource {
    /// Build the source for a manifest frame with the given render options.
    ///
    /// Satellite overlays only exist in their native palette, so the color
    /// scheme applies to radar frames alone.
    pub fn new(
        host: &str,
        frame: &Frame,
        overlay: OverlayKind,
        scheme: ColorScheme,
        smooth: bool,
        snow: bool,
    ) -> Self {
        let scheme_id = match overlay {
            OverlayKind::Radar => scheme.id(),
            OverlayKind::Satellite => rainviewer_client::SATELLITE_COLOR_SCHEME,
        };
        Self {
            template: overlay_tile_url(host, frame, TILE_SIZE, scheme_id, smooth, snow),
        }
    }
}

impl TileSource for OverlaySource {
    fn tile_url(&self, zoom: u8, x: u32, y: u32) -> String {
        self.template
            .replace("{z}", &zoom.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }

    fn attribution(&self) -> &'static str {
        "Weather data © RainViewer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dark_style_url_uses_subdomain_balancing() {
        let a = MapStyle::Dark.tile_url(8, 0, 0);
        let b = MapStyle::Dark.tile_url(8, 1, 0);
        assert_eq!(a, "https://a.basemaps.cartocdn.com/dark_all/8/0/0.png");
        assert_eq!(b, "https://b.basemaps.cartocdn.com/dark_all/8/1/0.png");
    }

    #[test]
    fn test_satellite_style_swaps_axis_order() {
        let url = MapStyle::Satellite.tile_url(7, 77, 53);
        assert!(url.ends_with("/tile/7/53/77"));
    }

    #[test]
    fn test_style_from_name_is_case_insensitive() {
        assert_eq!(MapStyle::from_name("dark"), Some(MapStyle::Dark));
        assert_eq!(MapStyle::from_name("TERRAIN"), Some(MapStyle::Terrain));
        assert_eq!(MapStyle::from_name("plasma"), None);
    }

    #[test]
    fn test_overlay_source_expands_placeholders() {
        let frame = Frame {
            time: 1_700_000_000,
            path: "/v2/radar/1700000000".to_string(),
        };
        let source = OverlaySource::new(
            "https://tilecache.rainviewer.com",
            &frame,
            OverlayKind::Radar,
            ColorScheme::UniversalBlue,
            true,
            false,
        );
        assert_eq!(
            source.tile_url(8, 155, 105),
            "https://tilecache.rainviewer.com/v2/radar/1700000000/256/8/155/105/2/1_0.png"
        );
    }

    #[test]
    fn test_satellite_overlay_ignores_color_scheme() {
        let frame = Frame {
            time: 1_700_000_000,
            path: "/v2/satellite/abc123".to_string(),
        };
        let source = OverlaySource::new(
            "https://tilecache.rainviewer.com",
            &frame,
            OverlayKind::Satellite,
            ColorScheme::NexradLevel3,
            true,
            true,
        );
        assert!(source.tile_url(6, 1, 2).contains("/6/1/2/0/1_1.png"));
    }

    #[test]
    fn test_identical_inputs_make_identical_sources() {
        let frame = Frame {
            time: 1_700_000_000,
            path: "/v2/radar/1700000000".to_string(),
        };
        let a = OverlaySource::new(
            "https://t.example",
            &frame,
            OverlayKind::Radar,
            ColorScheme::DarkSky,
            false,
            true,
        );
        let b = OverlaySource::new(
            "https://t.example",
            &frame,
            OverlayKind::Radar,
            ColorScheme::DarkSky,
            false,
            true,
        );
        assert_eq!(a, b);
    }
}
