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

//! Client library for the RainViewer public weather maps API.
//!
//! This library provides a modular architecture for fetching the frame
//! manifest and animating its radar and satellite overlays. It supports
//! multiple layers that can be used independently or composed together:
//!
//! - **Manifest layer**: Typed weather maps document and overlay tile
//!   address construction
//! - **Playback layer**: Explicit playback state with pure transitions,
//!   plus the single timer driver that advances it
//! - **Poll layer**: Background manifest refresh with manual,
//!   last-write-wins reloads
//!
//! # Quick Start
//!
//! Use the [`Session`] type for full-stack operation:
//!
//! ```no_run
//! use rainviewer_client::{Session, SessionConfig};
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let mut session = Session::spawn(SessionConfig::default());
//!
//!     loop {
//!         for event in session.drain_events() {
//!             println!("{:?}", event);
//!         }
//!
//!         let view = session.view();
//!         if let Some(frame) = &view.frame {
//!             println!("frame {}/{} at {}", view.index + 1, view.frame_count, frame.time);
//!         }
//!
//!         tokio::time::sleep(Duration::from_millis(200)).await;
//!     }
//! }
//! ```
//!
//! # Using Individual Layers
//!
//! ## Playback Layer Only
//!
//! ```
//! use rainviewer_client::manifest::{OverlayKind, WeatherMaps};
//! use rainviewer_client::playback::{Player, PlaybackSpeed};
//!
//! let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Normal);
//! let manifest = WeatherMaps::from_json(
//!     r#"{
//!         "generated": 1700000000,
//!         "host": "https://tilecache.rainviewer.com",
//!         "radar": {"past": [{"time": 1699999000, "path": "/v2/radar/1699999000"}]}
//!     }"#,
//! )
//! .unwrap();
//!
//! player.apply_manifest(manifest);
//! assert_eq!(player.frame_count(), 1);
//! ```
//!
//! ## Manifest Layer Only
//!
//! ```
//! use rainviewer_client::manifest::{overlay_tile_url, Frame, TILE_SIZE};
//!
//! let frame = Frame {
//!     time: 1_700_000_000,
//!     path: "/v2/radar/1700000000".to_string(),
//! };
//! let url = overlay_tile_url("https://tilecache.rainviewer.com", &frame, TILE_SIZE, 2, true, true);
//! assert!(url.ends_with("/2/1_1.png"));
//! ```

pub mod manifest;
pub mod playback;
pub mod poll;

use std::sync::{Arc, RwLock};

use tokio::runtime::Handle;

pub use manifest::{
    overlay_tile_url, ColorScheme, Frame, OverlayKind, RadarFrames, SatelliteFrames, WeatherMaps,
    SATELLITE_COLOR_SCHEME, TILE_SIZE,
};
pub use playback::{PlaybackSpeed, Player, TickDriver};
pub use poll::{FetchError, ManifestPoller, PollerConfig, PollerEvent, WEATHER_MAPS_URL};

/// Configuration for the full-stack session.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Overlay kind to start with.
    pub overlay: OverlayKind,
    /// Animation speed to start with.
    pub speed: PlaybackSpeed,
    /// Poller configuration.
    pub poll: PollerConfig,
}

/// Events surfaced to the embedding application.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A fresh manifest was applied to the player.
    ManifestLoaded,
    /// A manifest fetch failed; previous frames stay browsable.
    FetchFailed(String),
}

/// Read-only snapshot of the playback state for rendering.
#[derive(Debug, Clone, Default)]
pub struct PlaybackView {
    /// Active overlay kind.
    pub overlay: OverlayKind,
    /// Current frame index.
    pub index: usize,
    /// Frames in the active timeline.
    pub frame_count: usize,
    /// Whether the animation is running.
    pub playing: bool,
    /// Configured animation speed.
    pub speed: PlaybackSpeed,
    /// Whether the current frame is a forecast.
    pub is_forecast: bool,
    /// The current frame, if the timeline is non-empty.
    pub frame: Option<Frame>,
    /// Tile host from the manifest, once one has loaded.
    pub host: Option<String>,
    /// Manifest generation time as unix seconds, once one has loaded.
    pub generated: Option<i64>,
}

impl PlaybackView {
    fn of(player: &Player) -> Self {
        Self {
            overlay: player.overlay(),
            index: player.index(),
            frame_count: player.frame_count(),
            playing: player.playing(),
            speed: player.speed(),
            is_forecast: player.is_forecast(),
            frame: player.current_frame().cloned(),
            host: player.manifest().map(|m| m.host.clone()),
            generated: player.manifest().map(|m| m.generated),
        }
    }
}

/// Full-stack session that wires all layers together.
///
/// The session owns the shared player, the animation timer, and the
/// manifest poller. All playback commands are serialized through the player
/// lock, and every command reconciles the timer exactly once, so there is
/// never more than one timer and never a stale one still advancing frames.
#[derive(Debug)]
pub struct Session {
    player: Arc<RwLock<Player>>,
    driver: TickDriver,
    poller: ManifestPoller,
}

impl Session {
    /// Spawn a new session with the given configuration.
    ///
    /// Must be called within a tokio runtime; the runtime handle is captured
    /// for timer restarts. The first manifest fetch starts immediately.
    #[must_use]
    pub fn spawn(config: SessionConfig) -> Self {
        let player = Arc::new(RwLock::new(Player::new(config.overlay, config.speed)));
        let driver = TickDriver::new(Handle::current());
        let poller = ManifestPoller::spawn(config.poll);

        Self {
            player,
            driver,
            poller,
        }
    }

    /// Apply pending poller results and return the events they produced.
    ///
    /// Call once per UI frame. Manifest replacement and index re-clamping
    /// happen atomically inside this call.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.poller.try_recv() {
            match event {
                PollerEvent::Manifest(manifest) => {
                    if let Ok(mut player) = self.player.write() {
                        player.apply_manifest(manifest);
                    }
                    self.sync_timer();
                    events.push(SessionEvent::ManifestLoaded);
                }
                PollerEvent::Failed(message) => {
                    events.push(SessionEvent::FetchFailed(message));
                }
            }
        }
        events
    }

    /// Snapshot the playback state for rendering.
    #[must_use]
    pub fn view(&self) -> PlaybackView {
        self.player
            .read()
            .map(|p| PlaybackView::of(&p))
            .unwrap_or_default()
    }

    /// Toggle between playing and paused.
    pub fn toggle_play(&mut self) {
        if let Ok(mut player) = self.player.write() {
            player.toggle_play();
        }
        self.sync_timer();
    }

    /// Jump to a frame, pausing playback.
    pub fn seek(&mut self, index: usize) {
        if let Ok(mut player) = self.player.write() {
            player.seek(index);
        }
        self.sync_timer();
    }

    /// Change the animation speed.
    pub fn set_speed(&mut self, speed: PlaybackSpeed) {
        if let Ok(mut player) = self.player.write() {
            player.set_speed(speed);
        }
        self.sync_timer();
    }

    /// Switch the active overlay.
    pub fn set_overlay(&mut self, overlay: OverlayKind) {
        if let Ok(mut player) = self.player.write() {
            player.set_overlay(overlay);
        }
        self.sync_timer();
    }

    /// Request an immediate manifest refresh.
    pub fn refresh_now(&self) {
        self.poller.refresh_now();
    }

    /// Stop the poller and the animation timer.
    pub fn shutdown(&mut self) {
        self.poller.shutdown();
        self.driver.stop();
    }

    /// Reconcile the timer with the current player state: exactly one timer
    /// while playing with frames available, none otherwise.
    fn sync_timer(&mut self) {
        let state = self
            .player
            .read()
            .map(|p| (p.playing() && p.frame_count() > 0, p.speed(), p.epoch()))
            .ok();

        match state {
            Some((true, speed, epoch)) => {
                self.driver
                    .restart(Arc::clone(&self.player), speed.interval(), epoch);
            }
            _ => self.driver.stop(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_config() -> SessionConfig {
        // An unroutable loopback port keeps tests off the network.
        SessionConfig {
            poll: PollerConfig {
                url: "http://127.0.0.1:9/weather-maps.json".to_string(),
                request_timeout: Duration::from_millis(200),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_session_commands_without_manifest() {
        let mut session = Session::spawn(offline_config());

        let view = session.view();
        assert!(view.playing);
        assert_eq!(view.frame_count, 0);
        assert!(view.frame.is_none());

        session.toggle_play();
        assert!(!session.view().playing);

        session.seek(7);
        assert_eq!(session.view().index, 0);

        session.set_overlay(OverlayKind::Satellite);
        assert_eq!(session.view().overlay, OverlayKind::Satellite);

        session.set_speed(PlaybackSpeed::Fast);
        assert_eq!(session.view().speed, PlaybackSpeed::Fast);

        session.shutdown();
    }

    #[tokio::test]
    async fn test_fetch_failure_reported_as_event() {
        let mut session = Session::spawn(offline_config());

        let mut failed = false;
        for _ in 0..50 {
            for event in session.drain_events() {
                if matches!(event, SessionEvent::FetchFailed(_)) {
                    failed = true;
                }
            }
            if failed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        assert!(failed, "poller never reported the unreachable endpoint");
        assert_eq!(session.view().frame_count, 0);
        session.shutdown();
    }
}
