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

//! Rain intensity legend shown while the radar overlay is active.

use egui::{Align2, Color32, RichText, Sense, Stroke};

// Reflectivity ramp from weak returns on the left to extreme on the right
const STEPS: [(u8, u8, u8); 9] = [
    (0, 236, 236),
    (1, 160, 246),
    (0, 0, 246),
    (0, 255, 0),
    (0, 200, 0),
    (255, 255, 0),
    (255, 128, 0),
    (255, 0, 0),
    (200, 0, 0),
];

/// Render the dBZ color scale in the lower-left corner.
pub fn show_legend(ctx: &egui::Context) {
    egui::Window::new("legend")
        .title_bar(false)
        .anchor(Align2::LEFT_BOTTOM, egui::vec2(12.0, -12.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 210))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(8.0),
        )
        .show(ctx, |ui| {
            ui.label(
                RichText::new("RAIN INTENSITY (dBZ)")
                    .color(Color32::from_rgb(148, 163, 184))
                    .size(9.0)
                    .strong(),
            );

            ui.add_space(2.0);

            let bar_width = 180.0;
            let bar_height = 10.0;
            let (rect, _) =
                ui.allocate_exact_size(egui::vec2(bar_width, bar_height), Sense::hover());
            let painter = ui.painter();
            let step_width = bar_width / STEPS.len() as f32;

            for (i, (r, g, b)) in STEPS.iter().enumerate() {
                let step_rect = egui::Rect::from_min_size(
                    egui::pos2(rect.left() + i as f32 * step_width, rect.top()),
                    egui::vec2(step_width, bar_height),
                );
                painter.rect_filled(
                    step_rect,
                    0.0,
                    Color32::from_rgba_unmultiplied(*r, *g, *b, 179),
                );
            }

            ui.add_space(2.0);

            ui.horizontal(|ui| {
                ui.spacing_mut().item_spacing.x = 0.0;
                ui.label(
                    RichText::new("Light")
                        .color(Color32::from_rgb(203, 213, 225))
                        .size(9.0),
                );
                ui.add_space(bar_width / 2.0 - 42.0);
                ui.label(
                    RichText::new("Moderate")
                        .color(Color32::from_rgb(203, 213, 225))
                        .size(9.0),
                );
                ui.add_space(bar_width / 2.0 - 52.0);
                ui.label(
                    RichText::new("Heavy")
                        .color(Color32::from_rgb(203, 213, 225))
                        .size(9.0),
                );
            });
        });
}
