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

//! Interactive map widget.
//!
//! Renders the basemap and the active weather overlay frame, handles pan,
//! zoom, and click-to-select, and surfaces tile loading problems in a small
//! status bubble.

use egui::{Align2, Color32, FontId, Pos2, Rect, Sense, Stroke, StrokeKind};

use super::sources::{MapStyle, OverlaySource, TileSource};
use super::tiles::{visible_tiles, TileManager, WebMercator};
use rainviewer_client::TILE_SIZE;

const MIN_ZOOM: f32 = 4.0;
const MAX_ZOOM: f32 = 12.0;
/// Overlay tiles only exist at native resolution up to this zoom; beyond it
/// they are drawn upscaled.
const MAX_OVERLAY_ZOOM: u8 = 10;

/// What the map reported back for this frame.
#[derive(Debug, Default)]
pub struct MapResponse {
    /// Location the user clicked, if any.
    pub clicked_at: Option<(f64, f64)>,
}

/// Map viewport state and renderer.
#[derive(Debug)]
pub struct MapView {
    center_lat: f64,
    center_lon: f64,
    zoom: f32,
    tile_manager: TileManager,
    tile_status: Option<String>,
}

impl MapView {
    pub fn new(center_lat: f64, center_lon: f64, zoom: f32) -> Self {
        Self {
            center_lat,
            center_lon: center_lon.clamp(-180.0, 180.0),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            tile_manager: TileManager::new(),
            tile_status: None,
        }
    }

    /// Jump the viewport to a location.
    pub fn set_center(&mut self, lat: f64, lon: f64, zoom: f32) {
        self.center_lat = lat.clamp(-85.0, 85.0);
        self.center_lon = lon.clamp(-180.0, 180.0);
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Render the map and process interaction for this frame.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        style: MapStyle,
        overlay: Option<&OverlaySource>,
        overlay_opacity: f32,
        user_position: Option<(f64, f64)>,
        selected: Option<(f64, f64)>,
    ) -> MapResponse {
        let (response, painter) = ui.allocate_painter(
            egui::vec2(ui.available_width(), ui.available_height()),
            Sense::click_and_drag(),
        );

        let rect = response.rect;
        let center = rect.center();

        painter.rect_filled(rect, 0.0, Color32::from_rgb(15, 23, 42));

        // Pinch (or ctrl-scroll) zoom; plain scroll zooms too
        let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
        if (zoom_delta - 1.0).abs() > 0.001 {
            self.zoom = (self.zoom + zoom_delta.log2()).clamp(MIN_ZOOM, MAX_ZOOM);
        } else if response.hovered() {
            let scroll = ui.ctx().input(|i| i.raw_scroll_delta.y);
            if scroll.abs() > 0.0 {
                self.zoom = (self.zoom + scroll * 0.003).clamp(MIN_ZOOM, MAX_ZOOM);
            }
        }

        let tile_zoom = self.zoom.round() as u8;
        let tile_px = TILE_SIZE as f32;

        // Dragging moves the center in tile space, which keeps pan speed
        // correct at every latitude
        if response.dragged() {
            let delta = response.drag_delta();
            let center_x = WebMercator::lon_to_x(self.center_lon, tile_zoom)
                - f64::from(delta.x) / f64::from(tile_px);
            let center_y = WebMercator::lat_to_y(self.center_lat, tile_zoom)
                - f64::from(delta.y) / f64::from(tile_px);
            self.center_lon = WebMercator::tile_to_lon(center_x, tile_zoom);
            self.center_lat = WebMercator::tile_to_lat(center_y, tile_zoom).clamp(-85.0, 85.0);
        }

        // Basemap
        let mut tiles_rendered = 0;
        for (coord, offset_x, offset_y) in visible_tiles(
            self.center_lat,
            self.center_lon,
            tile_zoom,
            rect.width(),
            rect.height(),
        ) {
            let url = style.tile_url(coord.zoom, coord.x, coord.y);
            if let Some(texture) = self.tile_manager.get_tile(&url, ui.ctx(), true) {
                let tile_pos = egui::pos2(center.x + offset_x, center.y + offset_y);
                let tile_rect = Rect::from_min_size(tile_pos, egui::vec2(tile_px, tile_px));

                painter.image(
                    texture.id(),
                    tile_rect,
                    Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                    Color32::WHITE,
                );
                tiles_rendered += 1;
            }
        }

        // Weather overlay, faded to the configured opacity. Above the
        // native overlay zoom the tiles come from a coarser level and are
        // stretched to match the basemap grid.
        if let Some(source) = overlay {
            let overlay_zoom = tile_zoom.min(MAX_OVERLAY_ZOOM);
            let scale = 2_f32.powi(i32::from(tile_zoom - overlay_zoom));
            let tint = Color32::WHITE.gamma_multiply(overlay_opacity.clamp(0.0, 1.0));

            for (coord, offset_x, offset_y) in visible_tiles(
                self.center_lat,
                self.center_lon,
                overlay_zoom,
                rect.width() / scale,
                rect.height() / scale,
            ) {
                // Frame tiles are transient; they skip the disk cache
                let url = source.tile_url(coord.zoom, coord.x, coord.y);
                if let Some(texture) = self.tile_manager.get_tile(&url, ui.ctx(), false) {
                    let tile_pos =
                        egui::pos2(center.x + offset_x * scale, center.y + offset_y * scale);
                    let tile_rect = Rect::from_min_size(
                        tile_pos,
                        egui::vec2(tile_px * scale, tile_px * scale),
                    );

                    painter.image(
                        texture.id(),
                        tile_rect,
                        Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                        tint,
                    );
                }
            }
        }

        if self.tile_manager.get_error_count() > 0 {
            self.tile_status = Some(format!(
                "Failed to load {} tiles",
                self.tile_manager.get_error_count()
            ));
        } else if self.tile_manager.has_loading_tiles() {
            self.tile_status = Some("Loading map tiles...".to_string());
        } else if tiles_rendered > 0 {
            self.tile_status = None;
        }

        let to_screen = |lat: f64, lon: f64| -> Pos2 {
            let tile_x = WebMercator::lon_to_x(lon, tile_zoom);
            let tile_y = WebMercator::lat_to_y(lat, tile_zoom);

            let center_tile_x = WebMercator::lon_to_x(self.center_lon, tile_zoom);
            let center_tile_y = WebMercator::lat_to_y(self.center_lat, tile_zoom);

            let pixel_x = (tile_x - center_tile_x) * f64::from(tile_px);
            let pixel_y = (tile_y - center_tile_y) * f64::from(tile_px);

            egui::pos2(center.x + pixel_x as f32, center.y + pixel_y as f32)
        };

        // Detected device location: blue dot with a soft halo
        if let Some((lat, lon)) = user_position {
            let pos = to_screen(lat, lon);
            if rect.contains(pos) {
                painter.circle_filled(pos, 14.0, Color32::from_rgba_unmultiplied(59, 130, 246, 50));
                painter.circle_filled(pos, 6.0, Color32::from_rgb(37, 99, 235));
                painter.circle_stroke(pos, 6.0, Stroke::new(2.0, Color32::WHITE));
            }
        }

        // Selected spot: red ring on a stem
        if let Some((lat, lon)) = selected {
            let pos = to_screen(lat, lon);
            if rect.contains(pos) {
                let head = pos - egui::vec2(0.0, 12.0);
                painter.line_segment([pos, head], Stroke::new(3.0, Color32::from_rgb(220, 38, 38)));
                painter.circle_filled(head, 7.0, Color32::from_rgb(220, 38, 38));
                painter.circle_stroke(head, 7.0, Stroke::new(2.0, Color32::WHITE));
                painter.circle_filled(head, 2.5, Color32::WHITE);
            }
        }

        painter.text(
            rect.left_top() + egui::vec2(10.0, 10.0),
            Align2::LEFT_TOP,
            "Drag to pan | Scroll to zoom | Click for conditions",
            FontId::proportional(12.0),
            Color32::from_white_alpha(120),
        );

        let attribution = match overlay {
            Some(source) => format!("{} | {}", style.attribution(), source.attribution()),
            None => style.attribution().to_string(),
        };
        let attr_color = match style {
            MapStyle::Light | MapStyle::Terrain => Color32::from_black_alpha(180),
            MapStyle::Dark | MapStyle::Satellite => Color32::from_white_alpha(160),
        };
        painter.text(
            rect.right_bottom() + egui::vec2(-10.0, -10.0),
            Align2::RIGHT_BOTTOM,
            attribution,
            FontId::proportional(10.0),
            attr_color,
        );

        if let Some(ref status) = self.tile_status {
            let is_error = status.contains("Failed");
            let bg_color = if is_error {
                Color32::from_rgb(220, 50, 50)
            } else {
                Color32::from_rgb(255, 200, 100)
            };

            let status_pos = rect.center_top() + egui::vec2(0.0, 20.0);
            let galley = painter.layout_no_wrap(
                status.clone(),
                FontId::proportional(12.0),
                Color32::WHITE,
            );

            let padding = egui::vec2(12.0, 6.0);
            let bubble_rect = Rect::from_center_size(status_pos, galley.size() + padding * 2.0);

            painter.rect_filled(bubble_rect, 5.0, bg_color);
            painter.rect_stroke(
                bubble_rect,
                5.0,
                Stroke::new(1.0, Color32::from_white_alpha(60)),
                StrokeKind::Outside,
            );
            painter.text(
                status_pos,
                Align2::CENTER_CENTER,
                status,
                FontId::proportional(12.0),
                Color32::WHITE,
            );
        }

        let mut map_response = MapResponse::default();
        if response.clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                map_response.clicked_at = Some(screen_to_coords(
                    self.center_lat,
                    self.center_lon,
                    tile_zoom,
                    center,
                    pos,
                ));
            }
        }

        map_response
    }
}

/// Invert the viewport projection: screen position back to lat/lon.
fn screen_to_coords(
    center_lat: f64,
    center_lon: f64,
    zoom: u8,
    map_center: Pos2,
    pos: Pos2,
) -> (f64, f64) {
    let tile_x = WebMercator::lon_to_x(center_lon, zoom)
        + f64::from(pos.x - map_center.x) / f64::from(TILE_SIZE);
    let tile_y = WebMercator::lat_to_y(center_lat, zoom)
        + f64::from(pos.y - map_center.y) / f64::from(TILE_SIZE);

    (
        WebMercator::tile_to_lat(tile_y, zoom),
        WebMercator::tile_to_lon(tile_x, zoom),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_click_at_viewport_center_returns_center_coords() {
        let center = egui::pos2(400.0, 300.0);
        let (lat, lon) = screen_to_coords(31.5, 34.8, 8, center, center);
        assert!((lat - 31.5).abs() < 1e-6);
        assert!((lon - 34.8).abs() < 1e-6);
    }

    #[test]
    fn test_click_one_tile_right_moves_one_tile_in_x() {
        let center = egui::pos2(400.0, 300.0);
        let click = egui::pos2(400.0 + TILE_SIZE as f32, 300.0);
        let (_, lon) = screen_to_coords(0.0, 0.0, 8, center, click);

        let expected = WebMercator::tile_to_lon(WebMercator::lon_to_x(0.0, 8) + 1.0, 8);
        assert!((lon - expected).abs() < 1e-6);
    }

    #[test]
    fn test_click_up_moves_north() {
        let center = egui::pos2(400.0, 300.0);
        let click = egui::pos2(400.0, 200.0);
        let (lat, _) = screen_to_coords(31.5, 34.8, 8, center, click);
        assert!(lat > 31.5);
    }
}
