use serde::{Deserialize, Serialize};

/// Name reported as the data source for every weather payload.
pub const WEATHER_SOURCE: &str = "open-meteo";

/// Longest hourly window the forecast provider serves.
pub const MAX_FORECAST_HOURS: u32 = 168;

/// Weather condition categories mapped from WMO codes.
///
/// Serialized as the human-readable label ("Partly Cloudy").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WeatherCondition {
    #[default]
    Clear,
    #[serde(rename = "Partly Cloudy")]
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    #[serde(rename = "Heavy Rain")]
    HeavyRain,
    Snow,
    Sleet,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::Sleet, // Freezing drizzle
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            66 | 67 => Self::Sleet, // Freezing rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear,
        }
    }
}

/// A place name resolved to coordinates, either fresh or from the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

/// Current conditions normalized from the forecast provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub windspeed_kph: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i32>,
    pub condition: Option<WeatherCondition>,
    /// Only requested for assistant snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_cover: Option<f64>,
    /// Mean sea-level pressure; only requested for assistant snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_hpa: Option<f64>,
    pub time: Option<String>,
    pub source: String,
    /// Provider payload, untouched
    pub raw: serde_json::Value,
}

/// One hour of forecast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyWeather {
    pub time: String,
    pub temperature_c: Option<f64>,
    pub feels_like_c: Option<f64>,
    pub humidity: Option<f64>,
    pub precipitation: Option<f64>,
    pub precipitation_probability: Option<f64>,
    pub windspeed_kph: Option<f64>,
    pub winddirection: Option<f64>,
    pub weathercode: Option<i32>,
}

/// Body of the hourly forecast endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub forecast: Vec<HourlyWeather>,
    pub source: String,
}

/// Current conditions plus the next day of hourly samples
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub current: CurrentWeather,
    pub hourly: Vec<HourlyWeather>,
}

/// Current weather for a resolved region
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionWeather {
    pub location: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten)]
    pub current: CurrentWeather,
}

/// One entry returned by the Open-Meteo geocoding search
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub admin1: Option<String>,
    pub country_code: Option<String>,
}

/// Place suggestion offered while the user types a district
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub admin1: Option<String>,
}

impl From<GeocodeCandidate> for Suggestion {
    fn from(c: GeocodeCandidate) -> Self {
        let admin1 = c.admin1.as_deref().filter(|a| !a.is_empty());
        let display_name = match (&c.name, admin1) {
            (Some(name), Some(admin1)) => Some(format!("{}, {}", name, admin1)),
            (name, _) => name.clone(),
        };
        Self {
            name: c.name,
            display_name,
            latitude: c.latitude,
            longitude: c.longitude,
            admin1: c.admin1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wmo_code_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(0), WeatherCondition::Clear);
    }

    #[test]
    fn test_wmo_code_partly_cloudy() {
        assert_eq!(WeatherCondition::from_wmo_code(1), WeatherCondition::PartlyCloudy);
        assert_eq!(WeatherCondition::from_wmo_code(2), WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_wmo_code_rain_family() {
        assert_eq!(WeatherCondition::from_wmo_code(61), WeatherCondition::Rain);
        assert_eq!(WeatherCondition::from_wmo_code(82), WeatherCondition::HeavyRain);
        assert_eq!(WeatherCondition::from_wmo_code(55), WeatherCondition::Drizzle);
        assert_eq!(WeatherCondition::from_wmo_code(66), WeatherCondition::Sleet);
    }

    #[test]
    fn test_wmo_code_thunderstorm() {
        assert_eq!(WeatherCondition::from_wmo_code(95), WeatherCondition::Thunderstorm);
        assert_eq!(WeatherCondition::from_wmo_code(99), WeatherCondition::Thunderstorm);
    }

    #[test]
    fn test_wmo_code_unknown_defaults_to_clear() {
        assert_eq!(WeatherCondition::from_wmo_code(999), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_wmo_code(-1), WeatherCondition::Clear);
    }

    #[test]
    fn test_condition_serializes_as_label() {
        let labels = serde_json::to_value([
            WeatherCondition::PartlyCloudy,
            WeatherCondition::HeavyRain,
            WeatherCondition::Thunderstorm,
        ])
        .unwrap();
        assert_eq!(labels, serde_json::json!(["Partly Cloudy", "Heavy Rain", "Thunderstorm"]));

        let back: WeatherCondition = serde_json::from_str("\"Partly Cloudy\"").unwrap();
        assert_eq!(back, WeatherCondition::PartlyCloudy);
    }

    #[test]
    fn test_suggestion_display_name() {
        let with_admin = GeocodeCandidate {
            name: Some("Bengaluru".into()),
            latitude: 12.97,
            longitude: 77.59,
            admin1: Some("Karnataka".into()),
            country_code: Some("IN".into()),
        };
        let s = Suggestion::from(with_admin);
        assert_eq!(s.display_name.as_deref(), Some("Bengaluru, Karnataka"));

        let bare = GeocodeCandidate {
            name: Some("Somewhere".into()),
            latitude: 0.0,
            longitude: 0.0,
            admin1: None,
            country_code: None,
        };
        assert_eq!(Suggestion::from(bare).display_name.as_deref(), Some("Somewhere"));

        let empty_admin = GeocodeCandidate {
            name: Some("Kohima".into()),
            latitude: 25.67,
            longitude: 94.11,
            admin1: Some(String::new()),
            country_code: Some("IN".into()),
        };
        assert_eq!(Suggestion::from(empty_admin).display_name.as_deref(), Some("Kohima"));
    }

    #[test]
    fn test_region_weather_flattens_current() {
        let region = RegionWeather {
            location: "Bengaluru, Karnataka, India".into(),
            latitude: 12.97,
            longitude: 77.59,
            current: CurrentWeather {
                temperature_c: Some(24.5),
                feels_like_c: None,
                humidity: Some(60.0),
                precipitation: None,
                windspeed_kph: None,
                winddirection: None,
                weathercode: Some(1),
                condition: Some(WeatherCondition::PartlyCloudy),
                cloud_cover: None,
                pressure_hpa: None,
                time: None,
                source: WEATHER_SOURCE.into(),
                raw: serde_json::json!({}),
            },
        };

        let json = serde_json::to_value(&region).unwrap();
        assert_eq!(json["location"], "Bengaluru, Karnataka, India");
        assert_eq!(json["temperature_c"], 24.5);
        assert_eq!(json["condition"], "Partly Cloudy");
        assert_eq!(json["source"], "open-meteo");
        assert!(json.get("cloud_cover").is_none());
    }
}
