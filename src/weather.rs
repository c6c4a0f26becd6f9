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

//! Point weather lookup via the Open-Meteo forecast API.
//!
//! Unlike search, failures here are not swallowed: they are delivered to the
//! caller, which logs them and leaves the weather panel unpopulated.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Deserialize;
use tokio::runtime::Handle;

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Current conditions at a clicked spot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotWeather {
    /// Temperature in °C.
    pub temperature: f64,
    /// Condition summary derived from the WMO weather code.
    pub condition: &'static str,
    /// Wind speed in km/h.
    pub wind_speed: f64,
    /// Precipitation in mm for the current hour.
    pub rain: f64,
}

/// Map a WMO weather code to a short condition label.
///
/// Code groups follow the WMO interpretation table: 0 clear, 1-3 cloud
/// development, up to 48 fog, up to 67 rain and drizzle, up to 77 snow,
/// the rest convective showers and storms.
pub fn condition_label(code: u16) -> &'static str {
    if code == 0 {
        "Clear"
    } else if code <= 3 {
        "Partly cloudy"
    } else if code <= 48 {
        "Foggy"
    } else if code <= 67 {
        "Rainy"
    } else if code <= 77 {
        "Snow"
    } else if code <= 99 {
        "Thunderstorms"
    } else {
        "Variable"
    }
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeatherBlock,
    #[serde(default)]
    hourly: HourlyBlock,
}

#[derive(Debug, Deserialize)]
struct CurrentWeatherBlock {
    temperature: f64,
    windspeed: f64,
    weathercode: u16,
}

#[derive(Debug, Default, Deserialize)]
struct HourlyBlock {
    // Hourly series can contain nulls for hours with no data
    #[serde(default)]
    precipitation: Vec<Option<f64>>,
}

impl ForecastResponse {
    fn into_spot_weather(self) -> SpotWeather {
        SpotWeather {
            temperature: self.current_weather.temperature,
            condition: condition_label(self.current_weather.weathercode),
            wind_speed: self.current_weather.windspeed,
            rain: self
                .hourly
                .precipitation
                .first()
                .copied()
                .flatten()
                .unwrap_or(0.0),
        }
    }
}

/// Async point weather fetcher with last-write-wins result delivery.
#[derive(Debug)]
pub struct WeatherService {
    handle: Handle,
    result: Arc<Mutex<Option<Result<SpotWeather, String>>>>,
    generation: Arc<AtomicU64>,
}

impl WeatherService {
    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            result: Arc::new(Mutex::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetch conditions for a location. A quick second click elsewhere
    /// supersedes the first fetch.
    pub fn fetch(&self, lat: f64, lon: f64) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation_counter = Arc::clone(&self.generation);
        let slot = Arc::clone(&self.result);

        self.handle.spawn(async move {
            let outcome = fetch_spot_weather(lat, lon)
                .await
                .map_err(|e| e.to_string());

            if generation_counter.load(Ordering::SeqCst) == generation {
                *slot.lock().unwrap() = Some(outcome);
            }
        });
    }

    /// Take the pending outcome, if a fetch has completed.
    pub fn take_result(&self) -> Option<Result<SpotWeather, String>> {
        self.result.lock().unwrap().take()
    }
}

async fn fetch_spot_weather(
    lat: f64,
    lon: f64,
) -> Result<SpotWeather, Box<dyn std::error::Error + Send + Sync>> {
    let client = reqwest::Client::builder().timeout(FETCH_TIMEOUT).build()?;

    let response = client
        .get(OPEN_METEO_URL)
        .query(&[
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", "precipitation".to_string()),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(format!("forecast API returned HTTP {}", response.status()).into());
    }

    let forecast: ForecastResponse = response.json().await?;
    Ok(forecast.into_spot_weather())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_label_code_groups() {
        assert_eq!(condition_label(0), "Clear");
        assert_eq!(condition_label(1), "Partly cloudy");
        assert_eq!(condition_label(3), "Partly cloudy");
        assert_eq!(condition_label(45), "Foggy");
        assert_eq!(condition_label(48), "Foggy");
        assert_eq!(condition_label(51), "Rainy");
        assert_eq!(condition_label(67), "Rainy");
        assert_eq!(condition_label(71), "Snow");
        assert_eq!(condition_label(77), "Snow");
        assert_eq!(condition_label(80), "Thunderstorms");
        assert_eq!(condition_label(95), "Thunderstorms");
        assert_eq!(condition_label(99), "Thunderstorms");
        assert_eq!(condition_label(100), "Variable");
    }

    #[test]
    fn test_forecast_response_maps_to_spot_weather() {
        let json = r#"{
            "latitude": 32.0,
            "longitude": 34.8,
            "current_weather": {
                "temperature": 24.3,
                "windspeed": 14.2,
                "winddirection": 270,
                "weathercode": 61,
                "time": "2024-01-15T12:00"
            },
            "hourly": {
                "time": ["2024-01-15T12:00"],
                "precipitation": [1.4]
            }
        }"#;

        let forecast: ForecastResponse = serde_json::from_str(json).unwrap();
        let weather = forecast.into_spot_weather();

        assert!((weather.temperature - 24.3).abs() < 1e-9);
        assert_eq!(weather.condition, "Rainy");
        assert!((weather.wind_speed - 14.2).abs() < 1e-9);
        assert!((weather.rain - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_missing_precipitation_defaults_to_zero() {
        let json = r#"{
            "current_weather": {
                "temperature": 30.1,
                "windspeed": 5.0,
                "weathercode": 0
            }
        }"#;

        let forecast: ForecastResponse = serde_json::from_str(json).unwrap();
        let weather = forecast.into_spot_weather();

        assert_eq!(weather.condition, "Clear");
        assert!(weather.rain.abs() < f64::EPSILON);
    }

    #[test]
    fn test_null_precipitation_entry_defaults_to_zero() {
        let json = r#"{
            "current_weather": {
                "temperature": 18.0,
                "windspeed": 9.5,
                "weathercode": 2
            },
            "hourly": {
                "precipitation": [null, 0.3]
            }
        }"#;

        let forecast: ForecastResponse = serde_json::from_str(json).unwrap();
        assert!(forecast.into_spot_weather().rain.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_service_starts_with_no_result() {
        let service = WeatherService::new(Handle::current());
        assert!(service.take_result().is_none());
    }
}
