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

//! Top bar: app title, location search, clock, and the error banner.

use chrono::{DateTime, Local};
use egui::{Align2, Color32, Key, RichText, Stroke};

use crate::location::SearchResult;

/// What the user did in the top bar this frame.
#[derive(Debug, Default)]
pub struct TopBarAction {
    /// Query submitted with Enter or the search button.
    pub search: Option<String>,
    /// Search result chosen: coordinates and display name.
    pub goto: Option<(f64, f64, String)>,
    pub dismiss_error: bool,
}

/// Search box state plus the dropdown of pending results.
#[derive(Debug, Default)]
pub struct TopBar {
    query: String,
    results: Vec<SearchResult>,
}

impl TopBar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dropdown contents with a completed search's results.
    pub fn set_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
    }

    pub fn show(
        &mut self,
        ctx: &egui::Context,
        now: DateTime<Local>,
        banner: Option<&str>,
    ) -> TopBarAction {
        let mut action = TopBarAction::default();

        let window_frame = egui::Frame::window(&ctx.style())
            .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 236))
            .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
            .corner_radius(10.0);

        egui::Window::new("top_bar")
            .title_bar(false)
            .anchor(Align2::LEFT_TOP, egui::vec2(12.0, 12.0))
            .resizable(false)
            .frame(window_frame)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("\u{25c8} RAINSCOPE")
                            .color(Color32::from_rgb(96, 165, 250))
                            .size(15.0)
                            .strong(),
                    );

                    ui.separator();

                    let edit = ui.add(
                        egui::TextEdit::singleline(&mut self.query)
                            .hint_text("Search for a place...")
                            .desired_width(230.0),
                    );
                    let submitted =
                        edit.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));

                    if (submitted || ui.button("\u{1f50d}").clicked()) && !self.query.is_empty() {
                        action.search = Some(self.query.clone());
                    }
                });

                if !self.results.is_empty() {
                    ui.separator();
                    let mut chosen = None;
                    for (i, result) in self.results.iter().enumerate() {
                        let label = ui.add(
                            egui::Button::new(
                                RichText::new(&result.display_name)
                                    .color(Color32::from_rgb(226, 232, 240))
                                    .size(11.0),
                            )
                            .fill(Color32::TRANSPARENT)
                            .min_size(egui::vec2(ui.available_width(), 0.0)),
                        );
                        if label.clicked() {
                            chosen = Some(i);
                        }
                    }
                    if let Some(i) = chosen {
                        let result = &self.results[i];
                        if let Some((lat, lon)) = result.coords() {
                            action.goto = Some((lat, lon, result.display_name.clone()));
                        }
                        self.query.clear();
                        self.results.clear();
                    }
                }
            });

        egui::Window::new("clock")
            .title_bar(false)
            .anchor(Align2::RIGHT_TOP, egui::vec2(-12.0, 12.0))
            .resizable(false)
            .frame(window_frame)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(now.format("%H:%M:%S").to_string())
                            .color(Color32::from_rgb(52, 211, 153))
                            .size(15.0)
                            .strong()
                            .monospace(),
                    );
                    ui.label(
                        RichText::new("LOCAL")
                            .color(Color32::from_rgb(100, 116, 139))
                            .size(9.0)
                            .strong(),
                    );
                });
            });

        if let Some(message) = banner {
            egui::Window::new("error_banner")
                .title_bar(false)
                .anchor(Align2::CENTER_TOP, egui::vec2(0.0, 12.0))
                .resizable(false)
                .frame(
                    egui::Frame::window(&ctx.style())
                        .fill(Color32::from_rgba_unmultiplied(127, 29, 29, 240))
                        .stroke(Stroke::new(1.0, Color32::from_rgb(220, 38, 38)))
                        .corner_radius(8.0),
                )
                .show(ctx, |ui| {
                    ui.horizontal(|ui| {
                        ui.label(
                            RichText::new("\u{26a0}")
                                .color(Color32::from_rgb(252, 165, 165))
                                .size(13.0),
                        );
                        ui.label(
                            RichText::new(message)
                                .color(Color32::WHITE)
                                .size(12.0),
                        );
                        if ui
                            .button(
                                RichText::new("\u{2715}")
                                    .size(11.0)
                                    .color(Color32::from_rgb(252, 165, 165)),
                            )
                            .on_hover_text("Dismiss")
                            .clicked()
                        {
                            action.dismiss_error = true;
                        }
                    });
                });
        }

        action
    }
}
