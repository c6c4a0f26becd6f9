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

//! Playback state management for animated overlay frames.
//!
//! [`Player`] is an explicit state object with pure transition methods; it
//! performs no I/O and holds no timers. The single side-effecting companion
//! is [`TickDriver`], which advances a shared player on an interval. Every
//! transition that invalidates a running timer bumps the player's epoch, so
//! a driver spawned before the change refuses to fire into the new
//! configuration even if its cancellation races the change.

mod timer;

pub use timer::TickDriver;

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::manifest::{Frame, OverlayKind, WeatherMaps};

/// Animation speed presets, expressed as the delay between frame advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackSpeed {
    /// 1.2 seconds per frame.
    Slow,
    /// 0.8 seconds per frame.
    #[default]
    Normal,
    /// 0.4 seconds per frame.
    Fast,
}

impl PlaybackSpeed {
    /// Delay between frame advances.
    #[must_use]
    pub fn interval(self) -> Duration {
        match self {
            PlaybackSpeed::Slow => Duration::from_millis(1200),
            PlaybackSpeed::Normal => Duration::from_millis(800),
            PlaybackSpeed::Fast => Duration::from_millis(400),
        }
    }

    /// Human-readable display name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            PlaybackSpeed::Slow => "Slow",
            PlaybackSpeed::Normal => "Normal",
            PlaybackSpeed::Fast => "Fast",
        }
    }

    /// All speeds, in display order.
    #[must_use]
    pub fn all() -> &'static [PlaybackSpeed] {
        &[
            PlaybackSpeed::Slow,
            PlaybackSpeed::Normal,
            PlaybackSpeed::Fast,
        ]
    }
}

/// Playback state over the frames of one manifest.
///
/// The index is valid for the active overlay's timeline immediately after
/// every transition; callers never observe an out-of-range index.
#[derive(Debug, Clone)]
pub struct Player {
    overlay: OverlayKind,
    index: usize,
    playing: bool,
    speed: PlaybackSpeed,
    manifest: Option<WeatherMaps>,
    epoch: u64,
}

impl Player {
    /// Create a player with no manifest. Playback starts in the playing
    /// state so the animation begins as soon as frames arrive.
    #[must_use]
    pub fn new(overlay: OverlayKind, speed: PlaybackSpeed) -> Self {
        Self {
            overlay,
            index: 0,
            playing: true,
            speed,
            manifest: None,
            epoch: 0,
        }
    }

    /// Advance one frame, wrapping from the last frame back to the first.
    ///
    /// No-op while paused or while the active timeline is empty.
    pub fn tick(&mut self) {
        let count = self.frame_count();
        if self.playing && count > 0 {
            self.index = (self.index + 1) % count;
        }
    }

    /// Toggle between playing and paused. Pausing freezes the index.
    pub fn toggle_play(&mut self) {
        self.playing = !self.playing;
        self.bump_epoch();
    }

    /// Jump to a frame. The index is clamped to the active timeline and
    /// playback pauses, since scrubbing implies manual control.
    pub fn seek(&mut self, index: usize) {
        self.index = index.min(self.frame_count().saturating_sub(1));
        self.playing = false;
        self.bump_epoch();
    }

    /// Change the animation speed. Takes effect at the next tick boundary;
    /// the current index is untouched.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        self.speed = speed;
        self.bump_epoch();
    }

    /// Switch the active overlay. The index resets to the start of the new
    /// timeline; the play state and speed carry over.
    pub fn set_overlay(&mut self, overlay: OverlayKind) {
        if self.overlay == overlay {
            return;
        }
        self.overlay = overlay;
        self.index = 0;
        self.bump_epoch();
    }

    /// Replace the manifest.
    ///
    /// On the first manifest ever applied the index starts at the "now"
    /// position: the past/nowcast boundary for radar, the most recent frame
    /// for satellite. On later replacements the index is kept, re-clamped in
    /// the same transition if the timeline shrank beneath it.
    pub fn apply_manifest(&mut self, manifest: WeatherMaps) {
        let first_load = self.manifest.is_none();
        self.manifest = Some(manifest);

        let count = self.frame_count();
        if count == 0 {
            self.index = 0;
        } else if first_load {
            self.index = match self.overlay {
                OverlayKind::Radar => self
                    .manifest
                    .as_ref()
                    .map_or(0, WeatherMaps::forecast_boundary)
                    .min(count - 1),
                OverlayKind::Satellite => count - 1,
            };
        } else if self.index >= count {
            self.index = count - 1;
        }
        self.bump_epoch();
    }

    /// Number of frames in the active timeline.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.manifest
            .as_ref()
            .map_or(0, |m| m.frame_count(self.overlay))
    }

    /// The frame at the current index, if any.
    #[must_use]
    pub fn current_frame(&self) -> Option<&Frame> {
        self.manifest
            .as_ref()
            .and_then(|m| m.frame_at(self.overlay, self.index))
    }

    /// Whether the current frame is a forecast.
    ///
    /// Only radar indices at or past the past/nowcast boundary are
    /// forecasts; satellite frames never are.
    #[must_use]
    pub fn is_forecast(&self) -> bool {
        match (&self.manifest, self.overlay) {
            (Some(m), OverlayKind::Radar) => self.index >= m.forecast_boundary(),
            _ => false,
        }
    }

    /// The active overlay kind.
    #[must_use]
    pub fn overlay(&self) -> OverlayKind {
        self.overlay
    }

    /// Current frame index into the active timeline.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Whether the animation is running.
    #[must_use]
    pub fn playing(&self) -> bool {
        self.playing
    }

    /// The configured animation speed.
    #[must_use]
    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    /// The manifest currently in effect, if one has loaded.
    #[must_use]
    pub fn manifest(&self) -> Option<&WeatherMaps> {
        self.manifest.as_ref()
    }

    /// Timer-invalidation counter. A [`TickDriver`] captures this at spawn
    /// and stops itself once it no longer matches.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    fn bump_epoch(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{RadarFrames, SatelliteFrames};

    fn frame(time: i64) -> Frame {
        Frame {
            time,
            path: format!("/v2/radar/{time}"),
        }
    }

    fn manifest(past: usize, nowcast: usize, infrared: usize) -> WeatherMaps {
        WeatherMaps {
            version: String::new(),
            generated: 0,
            host: "https://tilecache.example".to_string(),
            radar: RadarFrames {
                past: (0..past).map(|i| frame(i as i64)).collect(),
                nowcast: (0..nowcast).map(|i| frame(100 + i as i64)).collect(),
            },
            satellite: SatelliteFrames {
                infrared: (0..infrared).map(|i| frame(200 + i as i64)).collect(),
            },
        }
    }

    fn radar_player(past: usize, nowcast: usize) -> Player {
        let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Normal);
        player.apply_manifest(manifest(past, nowcast, 0));
        player
    }

    #[test]
    fn test_first_load_starts_at_forecast_boundary() {
        let player = radar_player(2, 1);
        assert_eq!(player.index(), 2);
        assert!(player.is_forecast());
    }

    #[test]
    fn test_first_load_without_nowcast_clamps_to_last_frame() {
        let player = radar_player(3, 0);
        assert_eq!(player.index(), 2);
        assert!(player.current_frame().is_some());
    }

    #[test]
    fn test_first_load_satellite_starts_at_most_recent() {
        let mut player = Player::new(OverlayKind::Satellite, PlaybackSpeed::Normal);
        player.apply_manifest(manifest(0, 0, 4));
        assert_eq!(player.index(), 3);
        assert!(!player.is_forecast());
    }

    #[test]
    fn test_tick_wraps_to_first_frame() {
        let mut player = radar_player(2, 1);
        assert_eq!(player.index(), 2);
        player.tick();
        assert_eq!(player.index(), 0);
        player.tick();
        assert_eq!(player.index(), 1);
    }

    #[test]
    fn test_tick_is_noop_while_paused() {
        let mut player = radar_player(2, 1);
        player.toggle_play();
        assert!(!player.playing());
        player.tick();
        assert_eq!(player.index(), 2);
    }

    #[test]
    fn test_tick_is_noop_without_frames() {
        let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Normal);
        player.tick();
        assert_eq!(player.index(), 0);
        assert!(player.current_frame().is_none());

        player.apply_manifest(manifest(0, 0, 0));
        player.tick();
        assert_eq!(player.index(), 0);
    }

    #[test]
    fn test_seek_clamps_and_pauses() {
        let mut player = radar_player(2, 1);
        player.seek(10);
        assert_eq!(player.index(), 2);
        assert!(!player.playing());
    }

    #[test]
    fn test_seek_on_empty_timeline_pins_to_zero() {
        let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Normal);
        player.seek(5);
        assert_eq!(player.index(), 0);
    }

    #[test]
    fn test_set_overlay_resets_index_keeps_play_state() {
        let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Fast);
        player.apply_manifest(manifest(6, 2, 3));
        player.seek(5);
        player.toggle_play();
        assert!(player.playing());

        player.set_overlay(OverlayKind::Satellite);
        assert_eq!(player.index(), 0);
        assert!(player.playing());
        assert_eq!(player.speed(), PlaybackSpeed::Fast);
        assert_eq!(player.frame_count(), 3);
    }

    #[test]
    fn test_set_overlay_same_kind_is_noop() {
        let mut player = radar_player(2, 1);
        let epoch = player.epoch();
        player.set_overlay(OverlayKind::Radar);
        assert_eq!(player.index(), 2);
        assert_eq!(player.epoch(), epoch);
    }

    #[test]
    fn test_manifest_shrink_reclamps_index() {
        let mut player = radar_player(4, 2);
        player.seek(5);
        assert_eq!(player.index(), 5);

        player.apply_manifest(manifest(3, 1, 0));
        assert_eq!(player.index(), 3);
        assert!(player.current_frame().is_some());
    }

    #[test]
    fn test_manifest_refresh_keeps_index_when_in_range() {
        let mut player = radar_player(4, 2);
        player.seek(1);
        player.apply_manifest(manifest(4, 2, 0));
        assert_eq!(player.index(), 1);
        assert!(!player.is_forecast());
    }

    #[test]
    fn test_refresh_to_empty_timeline() {
        let mut player = radar_player(2, 1);
        player.apply_manifest(manifest(0, 0, 0));
        assert_eq!(player.index(), 0);
        assert_eq!(player.frame_count(), 0);
        assert!(player.current_frame().is_none());
    }

    #[test]
    fn test_is_forecast_only_past_boundary() {
        let mut player = radar_player(2, 2);
        player.seek(1);
        assert!(!player.is_forecast());
        player.seek(2);
        assert!(player.is_forecast());
        player.seek(3);
        assert!(player.is_forecast());
    }

    #[test]
    fn test_speed_change_does_not_move_index() {
        let mut player = radar_player(2, 1);
        player.set_speed(PlaybackSpeed::Slow);
        assert_eq!(player.index(), 2);
        assert_eq!(player.speed(), PlaybackSpeed::Slow);
    }

    #[test]
    fn test_transitions_bump_epoch() {
        let mut player = radar_player(2, 1);
        let mut last = player.epoch();

        for apply in [
            |p: &mut Player| p.toggle_play(),
            |p: &mut Player| p.seek(0),
            |p: &mut Player| p.set_speed(PlaybackSpeed::Fast),
            |p: &mut Player| p.set_overlay(OverlayKind::Satellite),
            |p: &mut Player| p.apply_manifest(manifest(1, 0, 1)),
        ] {
            apply(&mut player);
            assert_ne!(player.epoch(), last);
            last = player.epoch();
        }
    }

    #[test]
    fn test_tick_does_not_bump_epoch() {
        let mut player = radar_player(2, 1);
        let epoch = player.epoch();
        player.tick();
        assert_eq!(player.epoch(), epoch);
    }

    #[test]
    fn test_speed_intervals() {
        assert_eq!(PlaybackSpeed::Slow.interval(), Duration::from_millis(1200));
        assert_eq!(
            PlaybackSpeed::Normal.interval(),
            Duration::from_millis(800)
        );
        assert_eq!(PlaybackSpeed::Fast.interval(), Duration::from_millis(400));
    }
}
