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

//! Interval timer that advances a shared [`Player`].

use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::Player;

/// Owns at most one running animation timer.
///
/// `restart` cancels the previous timer before spawning the next one, so a
/// single driver can never have two timers advancing the same player. Each
/// timer additionally captures the player epoch it was spawned for and ends
/// itself on the first tick where the epochs no longer match, which closes
/// the window between a state change and the cancellation landing.
#[derive(Debug)]
pub struct TickDriver {
    handle: Handle,
    cancel: Option<CancellationToken>,
}

impl TickDriver {
    /// Create a driver that spawns timers on the given runtime.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            cancel: None,
        }
    }

    /// Tear down any running timer and start a fresh one.
    ///
    /// `epoch` must be the player's epoch as of the state the timer is meant
    /// to serve; the timer stops itself as soon as the player moves past it.
    pub fn restart(&mut self, player: Arc<RwLock<Player>>, interval: Duration, epoch: u64) {
        self.stop();

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        debug!("Starting animation timer at {}ms", interval.as_millis());

        self.handle.spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick completes immediately; consume it so
            // the first frame advance happens a full period from now.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let live = match player.write() {
                            Ok(mut player) => {
                                if player.epoch() == epoch {
                                    player.tick();
                                    true
                                } else {
                                    false
                                }
                            }
                            Err(_) => false,
                        };
                        if !live {
                            debug!("Animation timer superseded, stopping");
                            return;
                        }
                    }
                    () = token.cancelled() => {
                        return;
                    }
                }
            }
        });
    }

    /// Cancel the running timer, if any.
    pub fn stop(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{OverlayKind, RadarFrames, SatelliteFrames, WeatherMaps};
    use crate::playback::PlaybackSpeed;

    // A long timeline so a few hundred milliseconds of ticking can never
    // wrap back to the starting index.
    fn long_manifest() -> WeatherMaps {
        WeatherMaps {
            version: String::new(),
            generated: 0,
            host: "https://tilecache.example".to_string(),
            radar: RadarFrames {
                past: (0..1000)
                    .map(|i| crate::manifest::Frame {
                        time: i,
                        path: format!("/v2/radar/{i}"),
                    })
                    .collect(),
                nowcast: Vec::new(),
            },
            satellite: SatelliteFrames::default(),
        }
    }

    fn running_player() -> (Arc<RwLock<Player>>, u64) {
        let mut player = Player::new(OverlayKind::Radar, PlaybackSpeed::Fast);
        player.apply_manifest(long_manifest());
        player.seek(0);
        player.toggle_play();
        let epoch = player.epoch();
        assert!(player.playing());
        (Arc::new(RwLock::new(player)), epoch)
    }

    fn index_of(player: &Arc<RwLock<Player>>) -> usize {
        player.read().unwrap().index()
    }

    #[tokio::test]
    async fn test_timer_advances_playing_player() {
        let (player, epoch) = running_player();
        let mut driver = TickDriver::new(Handle::current());

        driver.restart(Arc::clone(&player), Duration::from_millis(20), epoch);
        tokio::time::sleep(Duration::from_millis(300)).await;

        let index = index_of(&player);
        assert!(index >= 1, "timer never advanced the player");
        assert!(index < 500);
    }

    #[tokio::test]
    async fn test_timer_with_stale_epoch_never_fires() {
        let (player, epoch) = running_player();
        let mut driver = TickDriver::new(Handle::current());

        driver.restart(Arc::clone(&player), Duration::from_millis(20), epoch + 1);
        tokio::time::sleep(Duration::from_millis(150)).await;

        assert_eq!(index_of(&player), 0);
    }

    #[tokio::test]
    async fn test_stop_halts_ticking() {
        let (player, epoch) = running_player();
        let mut driver = TickDriver::new(Handle::current());

        driver.restart(Arc::clone(&player), Duration::from_millis(20), epoch);
        tokio::time::sleep(Duration::from_millis(150)).await;
        driver.stop();

        tokio::time::sleep(Duration::from_millis(50)).await;
        let frozen = index_of(&player);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(index_of(&player), frozen);
    }

    #[tokio::test]
    async fn test_epoch_bump_detaches_running_timer() {
        let (player, epoch) = running_player();
        let mut driver = TickDriver::new(Handle::current());

        driver.restart(Arc::clone(&player), Duration::from_millis(20), epoch);
        tokio::time::sleep(Duration::from_millis(100)).await;

        // A transition on the player invalidates the timer without the
        // driver being told.
        if let Ok(mut p) = player.write() {
            p.seek(7);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        let frozen = index_of(&player);
        assert_eq!(frozen, 7);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(index_of(&player), frozen);
    }
}
