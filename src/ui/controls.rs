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

//! Bottom playback control bar.

use egui::{Align2, Color32, RichText, Slider, Stroke};

use rainviewer_client::{OverlayKind, PlaybackSpeed, PlaybackView};

/// What the user did in the control bar this frame.
#[derive(Debug, Default)]
pub struct ControlAction {
    pub toggle_play: bool,
    pub seek_to: Option<usize>,
    pub set_speed: Option<PlaybackSpeed>,
    pub refresh: bool,
    /// Opacity drag finished; the new value should be persisted.
    pub opacity_changed: bool,
}

/// Render the playback bar and collect the frame's commands.
pub fn show_control_bar(
    ctx: &egui::Context,
    view: &PlaybackView,
    opacity: &mut f32,
    refreshing: bool,
) -> ControlAction {
    let mut action = ControlAction::default();

    egui::Window::new("playback_controls")
        .title_bar(false)
        .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -12.0))
        .fixed_size(egui::vec2(620.0, 74.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 236))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(10.0),
        )
        .show(ctx, |ui| {
            let has_frames = view.frame_count > 0;
            let max_index = view.frame_count.saturating_sub(1);

            // Timeline scrubber; dragging it pauses playback
            let mut index = view.index;
            let slider = ui.add_enabled(
                has_frames,
                Slider::new(&mut index, 0..=max_index).show_value(false),
            );
            if slider.changed() && index != view.index {
                action.seek_to = Some(index);
            }

            ui.add_space(4.0);

            ui.horizontal(|ui| {
                let play_icon = if view.playing { "\u{23f8}" } else { "\u{25b6}" };
                let play_label = if view.playing { "Pause" } else { "Play" };
                if ui
                    .button(RichText::new(play_icon).size(20.0))
                    .on_hover_text(play_label)
                    .clicked()
                {
                    action.toggle_play = true;
                }

                let refresh_button = ui
                    .add_enabled(
                        !refreshing,
                        egui::Button::new(RichText::new("\u{27f3}").size(16.0)),
                    )
                    .on_hover_text("Reload frames now");
                if refresh_button.clicked() {
                    action.refresh = true;
                }

                ui.add_space(8.0);

                ui.label(frame_time_text(view));
                ui.add_space(4.0);
                let (badge_color, badge_text) = if view.is_forecast {
                    (Color32::from_rgb(251, 191, 36), "FORECAST")
                } else {
                    (Color32::from_rgb(34, 197, 94), "LIVE")
                };
                ui.label(RichText::new("\u{25cf}").color(badge_color).size(10.0));
                ui.label(
                    RichText::new(badge_text)
                        .color(badge_color)
                        .size(10.0)
                        .strong(),
                );

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(format!(
                            "{}/{}",
                            if has_frames { view.index + 1 } else { 0 },
                            view.frame_count
                        ))
                        .color(Color32::from_rgb(148, 163, 184))
                        .size(11.0)
                        .monospace(),
                    );

                    ui.add_space(10.0);

                    let opacity_slider = ui.add(
                        Slider::new(opacity, 0.1..=1.0)
                            .step_by(0.1)
                            .show_value(false),
                    );
                    action.opacity_changed = opacity_slider.drag_stopped();
                    ui.label(
                        RichText::new("Opacity")
                            .color(Color32::from_rgb(100, 116, 139))
                            .size(9.0)
                            .strong(),
                    );

                    ui.add_space(10.0);

                    let mut speed = view.speed;
                    egui::ComboBox::from_id_salt("playback_speed")
                        .selected_text(speed.label())
                        .width(76.0)
                        .show_ui(ui, |ui| {
                            for option in PlaybackSpeed::all() {
                                ui.selectable_value(&mut speed, *option, option.label());
                            }
                        });
                    if speed != view.speed {
                        action.set_speed = Some(speed);
                    }
                    ui.label(
                        RichText::new("Speed")
                            .color(Color32::from_rgb(100, 116, 139))
                            .size(9.0)
                            .strong(),
                    );
                });
            });
        });

    action
}

/// Placeholder shown in place of the control bar until the first manifest
/// arrives, so the user never sees a dead scrub bar.
pub fn show_loading_bar(ctx: &egui::Context) {
    egui::Window::new("playback_loading")
        .title_bar(false)
        .anchor(Align2::CENTER_BOTTOM, egui::vec2(0.0, -12.0))
        .resizable(false)
        .frame(
            egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(15, 23, 42, 236))
                .stroke(Stroke::new(1.0, Color32::from_rgb(51, 65, 85)))
                .corner_radius(10.0),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(
                    RichText::new("Loading weather data...")
                        .color(Color32::from_rgb(148, 163, 184))
                        .size(13.0),
                );
            });
        });
}

fn frame_time_text(view: &PlaybackView) -> RichText {
    let time = view
        .frame
        .as_ref()
        .and_then(|frame| frame.datetime())
        .map_or_else(
            || "--:--".to_string(),
            |dt| dt.with_timezone(&chrono::Local).format("%H:%M").to_string(),
        );

    let prefix = match view.overlay {
        OverlayKind::Radar => "Radar",
        OverlayKind::Satellite => "Infrared",
    };

    RichText::new(format!("{prefix} {time}"))
        .color(Color32::from_rgb(226, 232, 240))
        .size(13.0)
        .strong()
}
