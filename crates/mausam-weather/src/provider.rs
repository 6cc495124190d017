//! Open-Meteo forecast adapter.

use std::time::Duration;

use mausam_core::ProvidersConfig;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use crate::error::{ensure_success, WeatherError};
use crate::types::{
    CurrentWeather, HourlyWeather, WeatherCondition, WeatherSnapshot, MAX_FORECAST_HOURS,
    WEATHER_SOURCE,
};

const FORECAST_SERVICE: &str = "Weather service";

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,weather_code,wind_speed_10m,wind_direction_10m";

const HOURLY_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,precipitation_probability,weather_code,wind_speed_10m,wind_direction_10m";

const SNAPSHOT_CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,weather_code,wind_speed_10m,wind_direction_10m,pressure_msl,cloud_cover";

const SNAPSHOT_HOURLY_FIELDS: &str =
    "temperature_2m,precipitation_probability,weather_code,wind_speed_10m";

const SNAPSHOT_HOURS: u32 = 24;

#[derive(Debug, Default, Deserialize)]
struct CurrentBlock {
    time: Option<String>,
    temperature_2m: Option<f64>,
    apparent_temperature: Option<f64>,
    relative_humidity_2m: Option<f64>,
    precipitation: Option<f64>,
    wind_speed_10m: Option<f64>,
    wind_direction_10m: Option<f64>,
    weather_code: Option<i32>,
    cloud_cover: Option<f64>,
    pressure_msl: Option<f64>,
}

/// Column-oriented hourly arrays. Any column may be shorter than `time`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HourlyBlock {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    apparent_temperature: Vec<Option<f64>>,
    relative_humidity_2m: Vec<Option<f64>>,
    precipitation: Vec<Option<f64>>,
    precipitation_probability: Vec<Option<f64>>,
    wind_speed_10m: Vec<Option<f64>>,
    wind_direction_10m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
}

fn at<T: Copy>(column: &[Option<T>], i: usize) -> Option<T> {
    column.get(i).copied().flatten()
}

impl HourlyBlock {
    fn into_records(self, hours: usize) -> Vec<HourlyWeather> {
        let count = self.time.len().min(hours);
        self.time
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, time)| HourlyWeather {
                time: time.clone(),
                temperature_c: at(&self.temperature_2m, i),
                feels_like_c: at(&self.apparent_temperature, i),
                humidity: at(&self.relative_humidity_2m, i),
                precipitation: at(&self.precipitation, i),
                precipitation_probability: at(&self.precipitation_probability, i),
                windspeed_kph: at(&self.wind_speed_10m, i),
                winddirection: at(&self.wind_direction_10m, i),
                weathercode: at(&self.weather_code, i),
            })
            .collect()
    }
}

fn normalize_current(raw: Value) -> Result<CurrentWeather, WeatherError> {
    let block: CurrentBlock = if raw.is_null() {
        CurrentBlock::default()
    } else {
        serde_json::from_value(raw.clone())
            .map_err(|e| WeatherError::Parse(format!("Unexpected current block: {}", e)))?
    };

    Ok(CurrentWeather {
        temperature_c: block.temperature_2m,
        feels_like_c: block.apparent_temperature,
        humidity: block.relative_humidity_2m,
        precipitation: block.precipitation,
        windspeed_kph: block.wind_speed_10m,
        winddirection: block.wind_direction_10m,
        weathercode: block.weather_code,
        condition: block.weather_code.map(WeatherCondition::from_wmo_code),
        cloud_cover: block.cloud_cover,
        pressure_hpa: block.pressure_msl,
        time: block.time,
        source: WEATHER_SOURCE.to_string(),
        raw: if raw.is_null() {
            Value::Object(Default::default())
        } else {
            raw
        },
    })
}

fn parse_hourly(raw: Option<Value>) -> Result<HourlyBlock, WeatherError> {
    match raw {
        None | Some(Value::Null) => Ok(HourlyBlock::default()),
        Some(value) => serde_json::from_value(value)
            .map_err(|e| WeatherError::Parse(format!("Unexpected hourly block: {}", e))),
    }
}

/// Fetches forecasts for a coordinate pair.
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Client,
    forecast_url: String,
}

impl WeatherProvider {
    pub fn new(providers: &ProvidersConfig) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(providers.timeout_secs))
            .build()
            .map_err(|e| WeatherError::network(FORECAST_SERVICE, e))?;

        Ok(Self {
            client,
            forecast_url: providers.forecast_url.clone(),
        })
    }

    async fn fetch(
        &self,
        lat: f64,
        lon: f64,
        params: &[(&str, String)],
    ) -> Result<serde_json::Map<String, Value>, WeatherError> {
        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[("latitude", lat.to_string()), ("longitude", lon.to_string())])
            .query(params)
            .query(&[("timezone", "auto")])
            .send()
            .await
            .map_err(|e| WeatherError::network(FORECAST_SERVICE, e))?;

        let body: Value = ensure_success(response, FORECAST_SERVICE)?
            .json()
            .await
            .map_err(|e| WeatherError::network(FORECAST_SERVICE, e))?;
        match body {
            Value::Object(map) => Ok(map),
            other => Err(WeatherError::Parse(format!(
                "Expected a JSON object from the forecast service, got {}",
                other
            ))),
        }
    }

    /// Current conditions at a coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentWeather, WeatherError> {
        let mut body = self
            .fetch(lat, lon, &[("current", CURRENT_FIELDS.to_string())])
            .await?;

        normalize_current(body.remove("current").unwrap_or(Value::Null))
    }

    /// The next `hours` hourly samples, at most [`MAX_FORECAST_HOURS`].
    #[instrument(skip(self), level = "info")]
    pub async fn hourly(
        &self,
        lat: f64,
        lon: f64,
        hours: u32,
    ) -> Result<Vec<HourlyWeather>, WeatherError> {
        let hours = hours.min(MAX_FORECAST_HOURS);
        let mut body = self
            .fetch(
                lat,
                lon,
                &[
                    ("hourly", HOURLY_FIELDS.to_string()),
                    ("forecast_hours", hours.to_string()),
                ],
            )
            .await?;

        let block = parse_hourly(body.remove("hourly"))?;
        Ok(block.into_records(hours as usize))
    }

    /// Current conditions plus the next day of hourly samples, with the
    /// extra fields the assistant reasons over.
    #[instrument(skip(self), level = "debug")]
    pub async fn snapshot(&self, lat: f64, lon: f64) -> Result<WeatherSnapshot, WeatherError> {
        let mut body = self
            .fetch(
                lat,
                lon,
                &[
                    ("current", SNAPSHOT_CURRENT_FIELDS.to_string()),
                    ("hourly", SNAPSHOT_HOURLY_FIELDS.to_string()),
                    ("forecast_hours", SNAPSHOT_HOURS.to_string()),
                ],
            )
            .await?;

        let current = normalize_current(body.remove("current").unwrap_or(Value::Null))?;
        let hourly = parse_hourly(body.remove("hourly"))?.into_records(SNAPSHOT_HOURS as usize);

        Ok(WeatherSnapshot { current, hourly })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> WeatherProvider {
        WeatherProvider::new(&ProvidersConfig::with_base_url(&server.uri())).unwrap()
    }

    #[tokio::test]
    async fn test_current_normalizes_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "12.97"))
            .and(query_param("longitude", "77.59"))
            .and(query_param("current", CURRENT_FIELDS))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 12.97,
                "current": {
                    "time": "2026-06-01T14:00",
                    "temperature_2m": 27.4,
                    "relative_humidity_2m": 71,
                    "apparent_temperature": 30.1,
                    "precipitation": 0.2,
                    "weather_code": 61,
                    "wind_speed_10m": 14.8,
                    "wind_direction_10m": 250
                }
            })))
            .mount(&server)
            .await;

        let current = provider(&server).current(12.97, 77.59).await.unwrap();

        assert_eq!(current.temperature_c, Some(27.4));
        assert_eq!(current.feels_like_c, Some(30.1));
        assert_eq!(current.humidity, Some(71.0));
        assert_eq!(current.windspeed_kph, Some(14.8));
        assert_eq!(current.winddirection, Some(250.0));
        assert_eq!(current.weathercode, Some(61));
        assert_eq!(current.condition, Some(WeatherCondition::Rain));
        assert_eq!(current.time.as_deref(), Some("2026-06-01T14:00"));
        assert_eq!(current.source, "open-meteo");
        assert_eq!(current.raw["temperature_2m"], 27.4);
        assert!(current.pressure_hpa.is_none());
    }

    #[tokio::test]
    async fn test_current_missing_block_is_all_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let current = provider(&server).current(0.0, 0.0).await.unwrap();
        assert!(current.temperature_c.is_none());
        assert!(current.condition.is_none());
        assert_eq!(current.raw, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_provider_failure_is_upstream() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = provider(&server).current(1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::UpstreamStatus { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_hourly_truncates_to_requested_hours() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_hours", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["2026-06-01T00:00", "2026-06-01T01:00", "2026-06-01T02:00"],
                    "temperature_2m": [20.0, 21.0, 22.0],
                    "precipitation_probability": [10, 20, 30]
                }
            })))
            .mount(&server)
            .await;

        let hours = provider(&server).hourly(1.0, 2.0, 2).await.unwrap();
        assert_eq!(hours.len(), 2);
        assert_eq!(hours[1].time, "2026-06-01T01:00");
        assert_eq!(hours[1].temperature_c, Some(21.0));
        assert_eq!(hours[1].precipitation_probability, Some(20.0));
    }

    #[tokio::test]
    async fn test_hourly_mismatched_arrays_report_absent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hourly": {
                    "time": ["t0", "t1", "t2"],
                    "temperature_2m": [20.0],
                    "relative_humidity_2m": [50, null, 55],
                    "weather_code": [0, 3]
                }
            })))
            .mount(&server)
            .await;

        let hours = provider(&server).hourly(1.0, 2.0, 24).await.unwrap();
        assert_eq!(hours.len(), 3);
        assert_eq!(hours[0].temperature_c, Some(20.0));
        assert_eq!(hours[2].temperature_c, None);
        assert_eq!(hours[1].humidity, None);
        assert_eq!(hours[2].humidity, Some(55.0));
        assert_eq!(hours[1].weathercode, Some(3));
        assert_eq!(hours[2].weathercode, None);
        assert_eq!(hours[0].windspeed_kph, None);
    }

    fn long_hourly_body(samples: usize) -> serde_json::Value {
        let time: Vec<String> = (0..samples).map(|i| format!("t{}", i)).collect();
        let temperature: Vec<f64> = (0..samples).map(|i| 20.0 + i as f64 / 10.0).collect();
        serde_json::json!({
            "hourly": { "time": time, "temperature_2m": temperature }
        })
    }

    #[tokio::test]
    async fn test_hourly_request_is_clamped() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_hours", "168"))
            .respond_with(ResponseTemplate::new(200).set_body_json(long_hourly_body(200)))
            .expect(1)
            .mount(&server)
            .await;

        let hours = provider(&server).hourly(1.0, 2.0, 500).await.unwrap();
        assert_eq!(hours.len(), 168);
        assert_eq!(hours[167].time, "t167");
    }

    #[tokio::test]
    async fn test_zero_hours_is_an_empty_forecast() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("forecast_hours", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(long_hourly_body(200)))
            .expect(1)
            .mount(&server)
            .await;

        let hours = provider(&server).hourly(1.0, 2.0, 0).await.unwrap();
        assert!(hours.is_empty());
    }

    #[tokio::test]
    async fn test_snapshot_requests_extra_fields() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("current", SNAPSHOT_CURRENT_FIELDS))
            .and(query_param("hourly", SNAPSHOT_HOURLY_FIELDS))
            .and(query_param("forecast_hours", "24"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current": {
                    "temperature_2m": 31.0,
                    "pressure_msl": 1008.5,
                    "cloud_cover": 40
                },
                "hourly": {
                    "time": ["t0", "t1"],
                    "temperature_2m": [31.0, 32.0],
                    "precipitation_probability": [5, 65]
                }
            })))
            .mount(&server)
            .await;

        let snapshot = provider(&server).snapshot(12.0, 77.0).await.unwrap();
        assert_eq!(snapshot.current.pressure_hpa, Some(1008.5));
        assert_eq!(snapshot.current.cloud_cover, Some(40.0));
        assert_eq!(snapshot.hourly.len(), 2);
        assert_eq!(snapshot.hourly[1].precipitation_probability, Some(65.0));
    }
}
