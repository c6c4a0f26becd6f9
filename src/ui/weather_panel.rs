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

//! Floating panel with current conditions at the selected spot.

use egui::{Align2, Color32, RichText, Stroke};

use crate::weather::SpotWeather;

/// Render the conditions panel. Returns true when the user closed it.
pub fn show_weather_panel(
    ctx: &egui::Context,
    weather: &SpotWeather,
    coords: (f64, f64),
) -> bool {
    let mut closed = false;

    egui::Window::new("spot_weather")
        .title_bar(false)
        .anchor(Align2::LEFT_CENTER, egui::vec2(12.0, -60.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 245))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(10.0),
        )
        .show(ctx, |ui| {
            ui.set_width(210.0);

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("WEATHER HERE")
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
                        .on_hover_text("Close")
                        .clicked()
                    {
                        closed = true;
                    }
                });
            });

            ui.separator();

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("{:.1}\u{b0}", weather.temperature))
                        .color(Color32::from_rgb(96, 165, 250))
                        .size(28.0)
                        .strong(),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(weather.condition)
                            .color(Color32::from_rgb(203, 213, 225))
                            .size(12.0)
                            .strong(),
                    );
                });
            });

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Wind:")
                        .color(Color32::from_rgb(100, 116, 139))
                        .size(10.0),
                );
                ui.label(
                    RichText::new(format!("{:.0} km/h", weather.wind_speed))
                        .color(Color32::from_rgb(226, 232, 240))
                        .size(10.0)
                        .monospace(),
                );
            });
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new("Rain:")
                        .color(Color32::from_rgb(100, 116, 139))
                        .size(10.0),
                );
                ui.label(
                    RichText::new(format!("{:.1} mm", weather.rain))
                        .color(Color32::from_rgb(147, 197, 253))
                        .size(10.0)
                        .monospace(),
                );
            });

            ui.add_space(2.0);
            ui.label(
                RichText::new(format!("{:.4}, {:.4}", coords.0, coords.1))
                    .color(Color32::from_rgb(71, 85, 105))
                    .size(8.0)
                    .monospace(),
            );
        });

    closed
}
