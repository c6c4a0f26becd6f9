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

//! Application state and per-frame composition.
//!
//! `RainScopeApp` owns the playback session, the map viewport, and the
//! location and weather services. Every frame it drains async results into
//! plain state, takes a playback snapshot, renders the map and the floating
//! panels against that snapshot, and applies whatever the panels reported
//! back as session commands or service calls.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use eframe::egui;
use rainviewer_client::{OverlayKind, PollerConfig, Session, SessionConfig, SessionEvent};

use crate::config::AppConfig;
use crate::location::{GeoLocator, GeocodingService};
use crate::map::{MapStyle, MapView, OverlaySource};
use crate::ui;
use crate::weather::{SpotWeather, WeatherService};

/// Zoom applied when jumping to a searched or located position.
const FOCUS_ZOOM: f32 = 11.0;

/// Startup viewport, resolved in `main` from CLI overrides and the stored
/// config. Only the config's home view persists; these values do not.
#[derive(Debug, Clone, Copy)]
pub struct StartView {
    pub lat: f64,
    pub lon: f64,
    pub zoom: f32,
    pub style: MapStyle,
}

#[derive(Debug)]
pub struct RainScopeApp {
    /// Runtime backing the session and service tasks. Held for the life of
    /// the app so spawned tasks keep running.
    _runtime: tokio::runtime::Runtime,
    session: Session,
    config: AppConfig,
    config_path: Option<PathBuf>,
    /// Basemap in use this run; a CLI `--style` override lands here without
    /// touching the saved config.
    active_style: MapStyle,
    map: MapView,
    top_bar: ui::TopBar,
    geocoder: GeocodingService,
    locator: GeoLocator,
    weather: WeatherService,
    /// Clicked or searched position awaiting/showing weather (red pin).
    selected: Option<(f64, f64)>,
    selected_weather: Option<SpotWeather>,
    /// Geolocated device position (blue marker).
    user_position: Option<(f64, f64)>,
    banner: Option<String>,
    settings_open: bool,
    /// False until the first manifest lands; gates the control bar.
    manifest_ready: bool,
    /// Manual refresh in flight; re-enabled by the next poller event.
    refresh_pending: bool,
}

impl RainScopeApp {
    pub fn new(
        config: AppConfig,
        start: StartView,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let runtime = tokio::runtime::Runtime::new()?;

        // Session::spawn captures the ambient runtime handle for its tasks.
        let session = {
            let _guard = runtime.enter();
            Session::spawn(SessionConfig {
                overlay: config.overlay,
                speed: config.playback_speed,
                poll: PollerConfig::default(),
            })
        };

        let geocoder = GeocodingService::new(runtime.handle().clone());
        let locator = GeoLocator::new(runtime.handle().clone());
        let weather = WeatherService::new(runtime.handle().clone());

        let config_path = AppConfig::get_config_path().ok();
        log::info!(
            "Starting at {:.4}, {:.4} zoom {:.1}, {} basemap, {} overlay",
            start.lat,
            start.lon,
            start.zoom,
            start.style.label(),
            config.overlay.label()
        );

        Ok(Self {
            _runtime: runtime,
            session,
            active_style: start.style,
            map: MapView::new(start.lat, start.lon, start.zoom),
            config,
            config_path,
            top_bar: ui::TopBar::new(),
            geocoder,
            locator,
            weather,
            selected: None,
            selected_weather: None,
            user_position: None,
            banner: None,
            settings_open: false,
            manifest_ready: false,
            refresh_pending: false,
        })
    }

    fn save_config(&self) {
        if let Err(e) = self.config.save() {
            log::warn!("Failed to save config: {e}");
        }
    }

    /// Select a position and request its current conditions. Any weather
    /// already on screen stays until the new result lands.
    fn select_position(&mut self, lat: f64, lon: f64) {
        self.selected = Some((lat, lon));
        self.weather.fetch(lat, lon);
    }

    /// Pull completed async work into plain state.
    fn drain_async_results(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::ManifestLoaded => {
                    self.manifest_ready = true;
                    self.refresh_pending = false;
                    self.banner = None;
                }
                SessionEvent::FetchFailed(message) => {
                    self.refresh_pending = false;
                    self.banner = Some(message);
                }
            }
        }

        if let Some(results) = self.geocoder.take_results() {
            self.top_bar.set_results(results);
        }

        if let Some(result) = self.locator.take_result() {
            match result {
                Ok((lat, lon)) => {
                    log::info!("Located at {lat:.4}, {lon:.4}");
                    self.user_position = Some((lat, lon));
                    self.map.set_center(lat, lon, FOCUS_ZOOM);
                    self.select_position(lat, lon);
                }
                Err(message) => self.banner = Some(message),
            }
        }

        if let Some(result) = self.weather.take_result() {
            match result {
                Ok(weather) => self.selected_weather = Some(weather),
                // Logged only; weather failures never raise the banner.
                Err(message) => log::warn!("Point weather fetch failed: {message}"),
            }
        }
    }

    fn apply_top_bar(&mut self, action: ui::TopBarAction) {
        if let Some(query) = action.search {
            self.geocoder
                .search(&query, &self.config.search_country_codes);
        }
        if let Some((lat, lon, name)) = action.goto {
            log::info!("Jumping to {name}");
            self.map.set_center(lat, lon, FOCUS_ZOOM);
            self.select_position(lat, lon);
        }
        if action.dismiss_error {
            self.banner = None;
        }
    }

    fn apply_control_bar(&mut self, action: ui::ControlAction) {
        if action.toggle_play {
            self.session.toggle_play();
        }
        if let Some(index) = action.seek_to {
            self.session.seek(index);
        }
        if let Some(speed) = action.set_speed {
            self.session.set_speed(speed);
            self.config.playback_speed = speed;
            self.save_config();
        }
        if action.refresh {
            self.session.refresh_now();
            self.refresh_pending = true;
        }
        if action.opacity_changed {
            self.save_config();
        }
    }

    fn apply_side_panel(&mut self, action: ui::SidePanelAction) {
        if let Some(kind) = action.set_overlay {
            self.session.set_overlay(kind);
            self.config.overlay = kind;
            self.save_config();
        }
        if let Some(style) = action.set_style {
            self.active_style = style;
            self.config.map_style = style;
            self.save_config();
        }
        if action.locate {
            self.locator.locate();
        }
        if action.go_home {
            self.map.set_center(
                self.config.home_latitude,
                self.config.home_longitude,
                self.config.home_zoom,
            );
            self.user_position = None;
            self.selected = None;
            self.selected_weather = None;
        }
        if action.toggle_legend {
            self.config.show_legend = !self.config.show_legend;
            self.save_config();
        }
        if action.toggle_settings {
            self.settings_open = !self.settings_open;
        }
    }
}

impl eframe::App for RainScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // The timer advances playback off the UI thread; schedule repaints so
        // frame changes and the clock show up promptly.
        ctx.request_repaint_after(Duration::from_millis(100));

        self.drain_async_results();

        let view = self.session.view();

        let overlay = match (&view.host, &view.frame) {
            (Some(host), Some(frame)) => Some(OverlaySource::new(
                host,
                frame,
                view.overlay,
                self.config.color_scheme,
                self.config.smooth_radar,
                self.config.snow_colors,
            )),
            _ => None,
        };

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                let response = self.map.show(
                    ui,
                    self.active_style,
                    overlay.as_ref(),
                    self.config.overlay_opacity,
                    self.user_position,
                    self.selected,
                );
                if let Some((lat, lon)) = response.clicked_at {
                    self.select_position(lat, lon);
                }
            });

        let top_action = self.top_bar.show(ctx, Local::now(), self.banner.as_deref());
        self.apply_top_bar(top_action);

        if self.manifest_ready {
            let control_action = ui::show_control_bar(
                ctx,
                &view,
                &mut self.config.overlay_opacity,
                self.refresh_pending,
            );
            self.apply_control_bar(control_action);
        } else {
            ui::show_loading_bar(ctx);
        }

        let side_action = ui::show_side_panel(
            ctx,
            ui::SidePanelState {
                overlay: view.overlay,
                style: self.active_style,
                locating: self.locator.is_locating(),
                show_legend: self.config.show_legend,
                settings_open: self.settings_open,
            },
        );
        self.apply_side_panel(side_action);

        if self.settings_open {
            let settings_action = ui::show_settings(
                ctx,
                &mut self.config,
                view.overlay == OverlayKind::Radar,
                self.config_path.as_deref(),
            );
            if settings_action.changed {
                self.save_config();
            }
            if settings_action.close {
                self.settings_open = false;
            }
        }

        if self.config.show_legend && view.overlay == OverlayKind::Radar {
            ui::show_legend(ctx);
        }

        if let (Some(weather), Some(coords)) = (&self.selected_weather, self.selected) {
            if ui::show_weather_panel(ctx, weather, coords) {
                // Dismissing the panel drops the whole selection.
                self.selected = None;
                self.selected_weather = None;
            }
        }
    }
}
