use std::sync::Arc;

use mausam_assistant::Assistant;
use mausam_core::{AppError, Config};
use mausam_weather::{GeocodeCache, GeocodeResolver, WeatherProvider};

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<GeocodeResolver>,
    pub weather: WeatherProvider,
    pub assistant: Arc<Assistant>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let cache = Arc::new(GeocodeCache::open(&config.cache.geocode_path));
        tracing::info!(
            "Geocode cache at {} ({} entries)",
            cache.path().display(),
            cache.len()
        );

        let resolver = GeocodeResolver::new(&config.providers, cache)?;
        let weather = WeatherProvider::new(&config.providers)?;
        let assistant = Assistant::new(weather.clone(), &config.assistant);

        Ok(Self {
            resolver: Arc::new(resolver),
            weather,
            assistant: Arc::new(assistant),
        })
    }
}
