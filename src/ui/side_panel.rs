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

//! Right-hand side panel: overlay, basemap, and view controls.

use egui::{Align2, Color32, RichText, Stroke};

use crate::map::MapStyle;
use rainviewer_client::OverlayKind;

/// Current selections the panel renders against.
#[derive(Debug, Clone, Copy)]
pub struct SidePanelState {
    pub overlay: OverlayKind,
    pub style: MapStyle,
    pub locating: bool,
    pub show_legend: bool,
    pub settings_open: bool,
}

/// What the user did in the side panel this frame.
#[derive(Debug, Default)]
pub struct SidePanelAction {
    pub set_overlay: Option<OverlayKind>,
    pub set_style: Option<MapStyle>,
    pub locate: bool,
    pub go_home: bool,
    pub toggle_legend: bool,
    pub toggle_settings: bool,
}

fn section_label(ui: &mut egui::Ui, text: &str) {
    ui.label(
        RichText::new(text)
            .color(Color32::from_rgb(100, 116, 139))
            .size(9.0)
            .strong(),
    );
}

/// Render the side panel and collect the frame's commands.
pub fn show_side_panel(ctx: &egui::Context, state: SidePanelState) -> SidePanelAction {
    let mut action = SidePanelAction::default();

    egui::Window::new("side_panel")
        .title_bar(false)
        .anchor(Align2::RIGHT_CENTER, egui::vec2(-12.0, 0.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 236))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(10.0),
        )
        .show(ctx, |ui| {
            ui.set_width(92.0);

            section_label(ui, "OVERLAY");
            for kind in OverlayKind::all() {
                if ui
                    .selectable_label(state.overlay == *kind, kind.label())
                    .clicked()
                    && state.overlay != *kind
                {
                    action.set_overlay = Some(*kind);
                }
            }

            ui.separator();

            section_label(ui, "VIEW");
            ui.horizontal(|ui| {
                if ui
                    .button(RichText::new("\u{27a4}").size(13.0))
                    .on_hover_text("Jump to my location")
                    .clicked()
                {
                    action.locate = true;
                }
                if state.locating {
                    ui.spinner();
                } else {
                    ui.label(RichText::new("Locate").size(11.0));
                }
            });
            ui.horizontal(|ui| {
                if ui
                    .button(RichText::new("\u{2302}").size(13.0))
                    .on_hover_text("Back to the home view")
                    .clicked()
                {
                    action.go_home = true;
                }
                ui.label(RichText::new("Home").size(11.0));
            });

            ui.separator();

            section_label(ui, "BASEMAP");
            for style in MapStyle::all() {
                if ui
                    .selectable_label(state.style == style, style.label())
                    .clicked()
                    && state.style != style
                {
                    action.set_style = Some(style);
                }
            }

            ui.separator();

            if ui
                .selectable_label(state.show_legend, "Legend")
                .on_hover_text("Show the rain intensity scale")
                .clicked()
            {
                action.toggle_legend = true;
            }
            if ui
                .selectable_label(state.settings_open, "\u{2699} Settings")
                .clicked()
            {
                action.toggle_settings = true;
            }
        });

    action
}
