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

//! Tile fetching, caching, and Web Mercator projection.
//!
//! Tiles are keyed by their full URL rather than by coordinate, so basemap
//! and overlay tiles share one cache and an animation frame that was shown
//! once renders again instantly from memory. Only basemap tiles are written
//! through to the disk cache; overlay frames stay in memory for the run.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use egui::{ColorImage, TextureHandle};
use log::{debug, warn};
use sha2::{Digest, Sha256};

use rainviewer_client::TILE_SIZE;

const CACHE_DURATION_DAYS: u64 = 7;

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to a fractional tile Y coordinate
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.to_radians();
        let n = 2_f64.powi(i32::from(zoom));
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to a fractional tile X coordinate
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert a fractional tile Y coordinate back to latitude
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert a fractional tile X coordinate back to longitude
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        x / n * 360.0 - 180.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }
}

/// Enumerate the tiles covering a viewport centered on a location.
///
/// Returns each tile with its pixel offset from the viewport center. X
/// wraps across the antimeridian, Y is clamped at the poles.
pub fn visible_tiles(
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    viewport_width: f32,
    viewport_height: f32,
) -> Vec<(TileCoord, f32, f32)> {
    let mut tiles = Vec::new();

    let center_tile_x = WebMercator::lon_to_x(center_lon, zoom);
    let center_tile_y = WebMercator::lat_to_y(center_lat, zoom);

    // One extra ring of tiles so panning never exposes blank edges
    let tiles_wide = (viewport_width / TILE_SIZE as f32).ceil() as i32 + 2;
    let tiles_high = (viewport_height / TILE_SIZE as f32).ceil() as i32 + 2;

    let start_x = center_tile_x.floor() as i32 - tiles_wide / 2;
    let start_y = center_tile_y.floor() as i32 - tiles_high / 2;

    let max_tile = 2_i32.pow(u32::from(zoom));

    for dy in 0..tiles_high {
        for dx in 0..tiles_wide {
            let tile_x = start_x + dx;
            let tile_y = start_y + dy;

            let wrapped_x = ((tile_x % max_tile) + max_tile) % max_tile;

            if tile_y >= 0 && tile_y < max_tile {
                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);

                let offset_x = (f64::from(tile_x) - center_tile_x) * f64::from(TILE_SIZE);
                let offset_y = (f64::from(tile_y) - center_tile_y) * f64::from(TILE_SIZE);

                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }
    }

    tiles
}

/// Cache filename for a tile URL
fn cache_filename(url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    let hash = hasher.finalize();
    format!("{hash:x}")
}

pub enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

impl fmt::Debug for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileState::Loading => f.write_str("Loading"),
            TileState::Loaded(_) => f.write_str("Loaded"),
            TileState::Failed => f.write_str("Failed"),
        }
    }
}

/// Shared tile store with an on-disk cache and background downloads.
#[derive(Debug)]
pub struct TileManager {
    cache_dir: PathBuf,
    tiles: Arc<Mutex<HashMap<String, TileState>>>,
}

impl Default for TileManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TileManager {
    pub fn new() -> Self {
        let cache_dir = Self::get_cache_dir();

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory: {e}");
        }

        Self::cleanup_old_tiles(&cache_dir);

        Self {
            cache_dir,
            tiles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("rainscope-desktop");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        if let Ok(entries) = fs::read_dir(cache_dir) {
            for entry in entries.flatten() {
                if let Ok(metadata) = entry.metadata() {
                    if let Ok(modified) = metadata.modified() {
                        if let Ok(age) = now.duration_since(modified) {
                            if age > max_age {
                                let _ = fs::remove_file(entry.path());
                                debug!("Removed expired tile cache entry: {:?}", entry.path());
                            }
                        }
                    }
                }
            }
        }
    }

    /// Get a tile texture, loading from disk or queueing a download on miss.
    ///
    /// `persist` writes downloads through to the disk cache; overlay frames
    /// pass `false` and live only in memory. Returns `None` while the tile
    /// is loading or after it failed; failed tiles are not retried within a
    /// run.
    pub fn get_tile(&self, url: &str, ctx: &egui::Context, persist: bool) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().unwrap();

        match tiles.get(url) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                if persist {
                    let cache_path = self.cache_dir.join(format!("{}.png", cache_filename(url)));
                    if cache_path.exists() {
                        match load_tile_from_disk(&cache_path, ctx, url) {
                            Ok(texture) => {
                                tiles.insert(url.to_string(), TileState::Loaded(texture.clone()));
                                return Some(texture);
                            }
                            Err(e) => warn!("Failed to load cached tile, refetching: {e}"),
                        }
                    }
                }

                tiles.insert(url.to_string(), TileState::Loading);
                self.spawn_download(url.to_string(), ctx.clone(), persist);
                None
            }
        }
    }

    fn spawn_download(&self, url: String, ctx: egui::Context, persist: bool) {
        let tiles = self.tiles.clone();
        let cache_dir = self.cache_dir.clone();

        std::thread::spawn(move || {
            Self::download_tile(&url, &tiles, &cache_dir, &ctx, persist);
        });
    }

    fn download_tile(
        url: &str,
        tiles: &Arc<Mutex<HashMap<String, TileState>>>,
        cache_dir: &Path,
        ctx: &egui::Context,
        persist: bool,
    ) {
        debug!("Downloading tile: {url}");

        let outcome = match reqwest::blocking::get(url) {
            Ok(response) if response.status().is_success() => match response.bytes() {
                Ok(bytes) => {
                    if persist {
                        let cache_path = cache_dir.join(format!("{}.png", cache_filename(url)));
                        if let Err(e) = fs::write(&cache_path, &bytes) {
                            warn!("Failed to save tile to cache: {e}");
                        }
                    }

                    match decode_tile(&bytes, ctx, url) {
                        Ok(texture) => TileState::Loaded(texture),
                        Err(e) => {
                            warn!("Failed to decode tile image: {e}");
                            TileState::Failed
                        }
                    }
                }
                Err(e) => {
                    warn!("Failed to read tile bytes: {e}");
                    TileState::Failed
                }
            },
            Ok(response) => {
                warn!("Tile download returned HTTP {}: {url}", response.status());
                TileState::Failed
            }
            Err(e) => {
                warn!("Failed to fetch tile: {e}");
                TileState::Failed
            }
        };

        let loaded = matches!(outcome, TileState::Loaded(_));
        tiles.lock().unwrap().insert(url.to_string(), outcome);
        if loaded {
            ctx.request_repaint();
        }
    }

    pub fn has_loading_tiles(&self) -> bool {
        let tiles = self.tiles.lock().unwrap();
        tiles
            .values()
            .any(|state| matches!(state, TileState::Loading))
    }

    pub fn get_error_count(&self) -> usize {
        let tiles = self.tiles.lock().unwrap();
        tiles
            .values()
            .filter(|state| matches!(state, TileState::Failed))
            .count()
    }
}

fn load_tile_from_disk(
    path: &Path,
    ctx: &egui::Context,
    url: &str,
) -> Result<TextureHandle, String> {
    let img_data = fs::read(path).map_err(|e| e.to_string())?;
    decode_tile(&img_data, ctx, url)
}

fn decode_tile(bytes: &[u8], ctx: &egui::Context, url: &str) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let color_image =
        ColorImage::from_rgba_unmultiplied([width as usize, height as usize], &rgba.into_raw());

    Ok(ctx.load_texture(url.to_string(), color_image, Default::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mercator_known_points() {
        // At zoom 0 the whole world is one tile and (0, 0) sits at its center
        assert!((WebMercator::lon_to_x(0.0, 0) - 0.5).abs() < 1e-9);
        assert!((WebMercator::lat_to_y(0.0, 0) - 0.5).abs() < 1e-9);
        assert!((WebMercator::lon_to_x(-180.0, 0)).abs() < 1e-9);
        assert!((WebMercator::lon_to_x(180.0, 0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mercator_round_trip() {
        let lat = 31.5;
        let lon = 34.8;
        let zoom = 8;

        let x = WebMercator::lon_to_x(lon, zoom);
        let y = WebMercator::lat_to_y(lat, zoom);

        assert!((WebMercator::tile_to_lon(x, zoom) - lon).abs() < 1e-9);
        assert!((WebMercator::tile_to_lat(y, zoom) - lat).abs() < 1e-9);
    }

    #[test]
    fn test_visible_tiles_wraps_x_and_clamps_y() {
        // Near the antimeridian at low zoom every X must stay in range
        let tiles = visible_tiles(0.0, 179.9, 2, 1024.0, 512.0);
        assert!(!tiles.is_empty());
        for (coord, _, _) in &tiles {
            assert!(coord.x < 4);
            assert!(coord.y < 4);
        }
    }

    #[test]
    fn test_visible_tiles_covers_viewport() {
        let tiles = visible_tiles(31.5, 34.8, 8, 800.0, 600.0);
        // 800x600 px needs at least a 4x3 tile grid plus margin
        assert!(tiles.len() >= 12);
        for (coord, _, _) in &tiles {
            assert_eq!(coord.zoom, 8);
        }
    }

    #[test]
    fn test_cache_filename_is_stable_hex() {
        let name = cache_filename("https://example.com/tile/1/2/3.png");
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(name, cache_filename("https://example.com/tile/1/2/3.png"));
        assert_ne!(name, cache_filename("https://example.com/tile/1/2/4.png"));
    }
}
