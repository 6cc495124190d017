//! Weather and geocoding for Mausam
//!
//! Resolves Indian states and districts to coordinates through Open-Meteo and
//! Nominatim, remembers every resolution in a file-backed cache, and
//! normalizes Open-Meteo forecasts into a fixed schema.

pub mod cache;
pub mod error;
pub mod geocode;
pub mod provider;
pub mod types;

pub use cache::GeocodeCache;
pub use error::WeatherError;
pub use geocode::{GeocodeResolver, RegionQuery};
pub use provider::WeatherProvider;
pub use types::*;
