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

//! Settings window for radar rendering and search preferences.

use std::path::Path;

use egui::{Align2, Color32, RichText, Stroke};

use crate::config::AppConfig;
use rainviewer_client::ColorScheme;

/// Outcome of rendering the settings window.
#[derive(Debug, Default)]
pub struct SettingsAction {
    /// A persisted setting changed and the config should be saved.
    pub changed: bool,
    pub close: bool,
}

/// Render the settings window, editing the config in place.
pub fn show_settings(
    ctx: &egui::Context,
    config: &mut AppConfig,
    radar_overlay_active: bool,
    config_path: Option<&Path>,
) -> SettingsAction {
    let mut action = SettingsAction::default();

    egui::Window::new("settings")
        .title_bar(false)
        .anchor(Align2::RIGHT_CENTER, egui::vec2(-124.0, 0.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 245))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(10.0),
        )
        .show(ctx, |ui| {
            ui.set_width(230.0);

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("RADAR STYLE")
                        .color(Color32::from_rgb(96, 165, 250))
                        .size(12.0)
                        .strong(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui
                        .button(
                            RichText::new("\u{2715}")
                                .size(11.0)
                                .color(Color32::from_rgb(148, 163, 184)),
                        )
                        .clicked()
                    {
                        action.close = true;
                    }
                });
            });

            ui.separator();

            if radar_overlay_active {
                for scheme in ColorScheme::all() {
                    if ui
                        .radio_value(&mut config.color_scheme, *scheme, scheme.label())
                        .changed()
                    {
                        action.changed = true;
                    }
                }
            } else {
                ui.label(
                    RichText::new("Color schemes apply to the radar overlay")
                        .color(Color32::from_rgb(100, 116, 139))
                        .size(10.0)
                        .italics(),
                );
            }

            ui.add_space(6.0);

            if ui
                .checkbox(&mut config.smooth_radar, "Smooth radar edges")
                .changed()
            {
                action.changed = true;
            }
            if ui
                .checkbox(&mut config.snow_colors, "Separate snow colors")
                .changed()
            {
                action.changed = true;
            }

            ui.add_space(6.0);
            ui.separator();

            ui.label(
                RichText::new("SEARCH COUNTRIES")
                    .color(Color32::from_rgb(100, 116, 139))
                    .size(9.0)
                    .strong(),
            );
            let codes = ui.add(
                egui::TextEdit::singleline(&mut config.search_country_codes)
                    .hint_text("il,us (empty = worldwide)")
                    .desired_width(f32::INFINITY),
            );
            // Commit the edit when focus leaves the field
            if codes.lost_focus() {
                action.changed = true;
            }

            if let Some(path) = config_path {
                ui.add_space(6.0);
                ui.label(
                    RichText::new(path.display().to_string())
                        .color(Color32::from_rgb(71, 85, 105))
                        .size(8.0)
                        .monospace(),
                );
            }
        });

    action
}
