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

//! Background manifest polling.
//!
//! A single task fetches the weather maps manifest once at startup and then
//! on a fixed interval. A manual refresh wakes the task immediately; if a
//! fetch is already in flight its future is dropped and a fresh request
//! begins, so the newest request always produces the manifest that gets
//! delivered. Fetch failures are reported as events and never disturb the
//! schedule.

use std::time::Duration;

use log::{debug, info, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::manifest::WeatherMaps;

/// Public endpoint publishing the weather maps manifest.
pub const WEATHER_MAPS_URL: &str = "https://api.rainviewer.com/public/weather-maps.json";

/// Errors that can occur while fetching the manifest.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("malformed manifest payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Configuration for the manifest poller.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Manifest endpoint URL.
    pub url: String,
    /// Delay between scheduled fetches.
    pub poll_interval: Duration,
    /// Timeout for a single fetch.
    pub request_timeout: Duration,
    /// Channel buffer size for delivered events.
    pub buffer_size: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            url: WEATHER_MAPS_URL.to_string(),
            poll_interval: Duration::from_secs(180),
            request_timeout: Duration::from_secs(10),
            buffer_size: 8,
        }
    }
}

/// Events emitted by the poller.
#[derive(Debug, Clone)]
pub enum PollerEvent {
    /// A manifest fetch succeeded.
    Manifest(WeatherMaps),
    /// A fetch failed; the previous manifest stays in effect.
    Failed(String),
}

/// Handle to the background polling task.
///
/// Use `try_recv()` to drain events, `refresh_now()` to fetch out of
/// schedule, and `shutdown()` to stop the task. Dropping the handle also
/// stops the task.
pub struct ManifestPoller {
    event_rx: mpsc::Receiver<PollerEvent>,
    refresh_tx: mpsc::Sender<()>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for ManifestPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManifestPoller")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl ManifestPoller {
    /// Spawn the polling task with the given configuration.
    ///
    /// Must be called within a tokio runtime. The first fetch starts
    /// immediately.
    #[must_use]
    pub fn spawn(config: PollerConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel(config.buffer_size);
        let (refresh_tx, refresh_rx) = mpsc::channel(1);
        let cancel_token = CancellationToken::new();

        let task_cancel = cancel_token.clone();
        tokio::spawn(async move {
            poll_loop(config, event_tx, refresh_rx, task_cancel).await;
        });

        Self {
            event_rx,
            refresh_tx,
            cancel_token,
        }
    }

    /// Take the next pending event, if one is queued.
    pub fn try_recv(&mut self) -> Option<PollerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Wait for the next event. Returns `None` after shutdown.
    pub async fn recv(&mut self) -> Option<PollerEvent> {
        self.event_rx.recv().await
    }

    /// Request an immediate fetch, superseding any fetch in flight.
    ///
    /// Repeated requests while one is still queued coalesce into one.
    pub fn refresh_now(&self) {
        let _ = self.refresh_tx.try_send(());
    }

    /// Stop the polling task.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for ManifestPoller {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn poll_loop(
    config: PollerConfig,
    event_tx: mpsc::Sender<PollerEvent>,
    mut refresh_rx: mpsc::Receiver<()>,
    cancel_token: CancellationToken,
) {
    let client = reqwest::Client::new();

    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        // Wait for the next trigger. The first interval tick completes
        // immediately, giving the startup fetch.
        tokio::select! {
            _ = interval.tick() => {}
            Some(()) = refresh_rx.recv() => {
                info!("Manual manifest refresh requested");
                interval.reset();
            }
            () = cancel_token.cancelled() => {
                info!("Manifest poller cancelled");
                return;
            }
        }

        // Fetch, restarting from scratch if a newer refresh request arrives
        // while the request is in flight. Dropping the stale future cancels
        // its request, so a superseded response can never be delivered.
        loop {
            tokio::select! {
                result = fetch_manifest(&client, &config.url, config.request_timeout) => {
                    let event = match result {
                        Ok(manifest) => {
                            debug!(
                                "Manifest loaded: {} past, {} nowcast, {} infrared frames",
                                manifest.radar.past.len(),
                                manifest.radar.nowcast.len(),
                                manifest.satellite.infrared.len()
                            );
                            PollerEvent::Manifest(manifest)
                        }
                        Err(e) => {
                            warn!("Manifest fetch failed: {}", e);
                            PollerEvent::Failed(e.to_string())
                        }
                    };
                    if event_tx.send(event).await.is_err() {
                        return; // Receiver dropped
                    }
                    break;
                }
                Some(()) = refresh_rx.recv() => {
                    info!("Refresh superseded an in-flight manifest fetch");
                    interval.reset();
                }
                () = cancel_token.cancelled() => {
                    info!("Manifest poller cancelled");
                    return;
                }
            }
        }
    }
}

async fn fetch_manifest(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<WeatherMaps, FetchError> {
    debug!("Fetching weather maps manifest from {}", url);
    let response = client.get(url).timeout(timeout).send().await?;

    if !response.status().is_success() {
        return Err(FetchError::Status(response.status()));
    }

    let body = response.text().await?;
    Ok(WeatherMaps::from_json(&body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.url, WEATHER_MAPS_URL);
        assert_eq!(config.poll_interval, Duration::from_secs(180));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_shutdown_stops_task() {
        // An unroutable loopback port makes any attempted fetch fail fast
        // without leaving the machine.
        let mut poller = ManifestPoller::spawn(PollerConfig {
            url: "http://127.0.0.1:9/weather-maps.json".to_string(),
            request_timeout: Duration::from_millis(200),
            ..Default::default()
        });

        poller.shutdown();
        // After cancellation the event stream ends once buffered events
        // are drained; recv returning None proves the task exited.
        while poller.recv().await.is_some() {}
    }
}
