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

//! Location search and device geolocation.
//!
//! Search goes through the Nominatim geocoder and fails soft: any error
//! surfaces as an empty result list. Geolocation is IP-based with two
//! providers tried in order, and reports failures so the UI can say why
//! the locate button did nothing.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use serde::Deserialize;
use tokio::runtime::Handle;

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";
/// Nominatim's usage policy requires an identifying User-Agent.
const USER_AGENT: &str = concat!("rainscope-desktop/", env!("CARGO_PKG_VERSION"));
const MIN_QUERY_CHARS: usize = 2;
const SEARCH_RESULT_LIMIT: &str = "5";
const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);
const GEOLOCATE_TIMEOUT: Duration = Duration::from_secs(5);

/// One geocoder match.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    /// Full display name, e.g. "Haifa, Haifa District, Israel".
    pub display_name: String,
    lat: String,
    lon: String,
}

impl SearchResult {
    /// Parse the geocoder's stringly-typed coordinates.
    pub fn coords(&self) -> Option<(f64, f64)> {
        Some((self.lat.parse().ok()?, self.lon.parse().ok()?))
    }
}

fn accepts_query(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}

/// Async place-name search with last-write-wins result delivery.
#[derive(Debug)]
pub struct GeocodingService {
    handle: Handle,
    results: Arc<Mutex<Option<Vec<SearchResult>>>>,
    generation: Arc<AtomicU64>,
}

impl GeocodingService {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            results: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Kick off a search. Queries under two characters are dropped without
    /// touching the network.
    pub fn search(&self, query: &str, country_codes: &str) {
        if !accepts_query(query) {
            debug!("Ignoring search query below minimum length");
            return;
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation_counter = Arc::clone(&self.generation);
        let slot = Arc::clone(&self.results);
        let query = query.trim().to_string();
        let country_codes = country_codes.trim().to_string();

        self.handle.spawn(async move {
            let found = match fetch_locations(&query, &country_codes).await {
                Ok(found) => found,
                Err(e) => {
                    warn!("Location search failed: {e}");
                    Vec::new()
                }
            };

            // A newer query may have started while this one was in flight;
            // only the latest generation gets to publish
            if generation_counter.load(Ordering::SeqCst) == generation {
                *slot.lock().unwrap() = Some(found);
            }
        });
    }

    /// Take the pending result list, if a search has completed.
    pub fn take_results(&self) -> Option<Vec<SearchResult>> {
        self.results.lock().unwrap().take()
    }
}

async fn fetch_locations(
    query: &str,
    country_codes: &str,
) -> Result<Vec<SearchResult>, Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(SEARCH_TIMEOUT)
        .build()?;

    let mut params = vec![
        ("q", query),
        ("format", "json"),
        ("limit", SEARCH_RESULT_LIMIT),
    ];
    if !country_codes.is_empty() {
        params.push(("countrycodes", country_codes));
    }

    let response = client.get(NOMINATIM_URL).query(&params).send().await?;
    if !response.status().is_success() {
        return Err(format!("geocoder returned HTTP {}", response.status()).into());
    }

    Ok(response.json().await?)
}

/// IP-based device location lookup.
#[derive(Debug)]
pub struct GeoLocator {
    handle: Handle,
    locating: Arc<AtomicBool>,
    result: Arc<Mutex<Option<Result<(f64, f64), String>>>>,
}

impl GeoLocator {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            locating: Arc::new(AtomicBool::new(false)),
            result: Arc::new(Mutex::new(None)),
        }
    }

    /// Whether a lookup is currently in flight.
    pub fn is_locating(&self) -> bool {
        self.locating.load(Ordering::SeqCst)
    }

    /// Start a lookup. A request already in flight wins; further clicks
    /// are ignored until it resolves.
    pub fn locate(&self) {
        if self.locating.swap(true, Ordering::SeqCst) {
            debug!("Geolocation already in progress");
            return;
        }

        let locating = Arc::clone(&self.locating);
        let slot = Arc::clone(&self.result);

        self.handle.spawn(async move {
            let outcome = match tokio::time::timeout(GEOLOCATE_TIMEOUT, fetch_ip_location()).await {
                Ok(Ok(coords)) => Ok(coords),
                Ok(Err(e)) => {
                    warn!("Geolocation failed: {e}");
                    Err("Could not determine your location".to_string())
                }
                Err(_) => {
                    warn!("Geolocation timed out after {GEOLOCATE_TIMEOUT:?}");
                    Err("Location lookup timed out".to_string())
                }
            };

            *slot.lock().unwrap() = Some(outcome);
            locating.store(false, Ordering::SeqCst);
        });
    }

    /// Take the pending outcome, if a lookup has completed.
    pub fn take_result(&self) -> Option<Result<(f64, f64), String>> {
        self.result.lock().unwrap().take()
    }
}

async fn fetch_ip_location() -> Result<(f64, f64), Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

    // ipapi.co first, ip-api.com as fallback; their field names differ
    if let Some(coords) =
        probe_provider(&client, "https://ipapi.co/json/", "latitude", "longitude").await
    {
        debug!("Location found via ipapi.co: {}, {}", coords.0, coords.1);
        return Ok(coords);
    }

    if let Some(coords) = probe_provider(&client, "http://ip-api.com/json/", "lat", "lon").await {
        debug!("Location found via ip-api.com: {}, {}", coords.0, coords.1);
        return Ok(coords);
    }

    Err("no geolocation provider answered".into())
}

async fn probe_provider(
    client: &reqwest::Client,
    url: &str,
    lat_key: &str,
    lon_key: &str,
) -> Option<(f64, f64)> {
    let value: serde_json::Value = client.get(url).send().await.ok()?.json().await.ok()?;
    let lat = value.get(lat_key)?.as_f64()?;
    let lon = value.get(lon_key)?.as_f64()?;
    Some((lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_length_guard_counts_chars_not_bytes() {
        assert!(!accepts_query(""));
        assert!(!accepts_query("a"));
        assert!(!accepts_query("  a  "));
        assert!(accepts_query("ab"));
        assert!(accepts_query(" חיפה "));
        // Two Hebrew letters are four bytes but still two characters
        assert!(accepts_query("תל"));
    }

    #[test]
    fn test_search_result_parses_nominatim_payload() {
        let json = r#"[
            {
                "place_id": 282374144,
                "licence": "Data © OpenStreetMap contributors",
                "lat": "32.794044",
                "lon": "34.989571",
                "class": "place",
                "type": "city",
                "display_name": "Haifa, Haifa District, Israel"
            }
        ]"#;

        let results: Vec<SearchResult> = serde_json::from_str(json).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].display_name, "Haifa, Haifa District, Israel");

        let (lat, lon) = results[0].coords().unwrap();
        assert!((lat - 32.794044).abs() < 1e-9);
        assert!((lon - 34.989571).abs() < 1e-9);
    }

    #[test]
    fn test_unparseable_coords_return_none() {
        let result = SearchResult {
            display_name: "Nowhere".to_string(),
            lat: "not-a-number".to_string(),
            lon: "34.0".to_string(),
        };
        assert!(result.coords().is_none());
    }

    #[tokio::test]
    async fn test_short_query_never_publishes_results() {
        let service = GeocodingService::new(Handle::current());
        service.search("a", "il");
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(service.take_results().is_none());
    }

    #[tokio::test]
    async fn test_locator_starts_idle() {
        let locator = GeoLocator::new(Handle::current());
        assert!(!locator.is_locating());
        assert!(locator.take_result().is_none());
    }
}
