//! State/district geocoding for India.
//!
//! Resolution runs an ordered pipeline of strategies and stops at the first
//! one that yields a coordinate:
//!
//! 1. Open-Meteo search for `"district state"` (or just the state)
//! 2. Open-Meteo search for the district alone
//! 3. Nominatim free-text search for `"district, state, India"`
//!
//! Successful lookups are written to the [`GeocodeCache`] and served from it
//! on every later request with the same normalized name.

use std::sync::Arc;
use std::time::Duration;

use mausam_core::ProvidersConfig;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::cache::GeocodeCache;
use crate::error::{ensure_success, WeatherError};
use crate::types::{GeocodeCandidate, ResolvedLocation, Suggestion};

const GEOCODING_SERVICE: &str = "Geocoding service";
const RESOLVE_CANDIDATES: u32 = 5;
const SUGGEST_CANDIDATES: u32 = 10;

/// A state with an optional district, as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionQuery {
    pub state: String,
    pub district: Option<String>,
}

impl RegionQuery {
    /// Build a query; blank districts are treated as absent.
    pub fn new(state: &str, district: Option<&str>) -> Result<Self, WeatherError> {
        let state = state.trim();
        if state.is_empty() {
            return Err(WeatherError::InvalidInput(
                "Missing query parameter 'state'".to_string(),
            ));
        }

        Ok(Self {
            state: state.to_string(),
            district: district
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        })
    }

    /// `"district state"`, or the state alone. This is also the cache name.
    pub fn search_name(&self) -> String {
        match &self.district {
            Some(district) => format!("{} {}", district, self.state),
            None => self.state.clone(),
        }
    }

    /// Comma-separated query for free-text geocoders.
    pub fn free_text(&self, country: &str) -> String {
        match &self.district {
            Some(district) => format!("{}, {}, {}", district, self.state, country),
            None => format!("{}, {}", self.state, country),
        }
    }
}

/// One step of the resolution pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Open-Meteo search on the combined name
    CombinedName,
    /// Open-Meteo search on the district alone (skipped without a district)
    DistrictOnly,
    /// Nominatim free-text search, first hit taken as-is
    FreeText,
}

/// Strategies in the order they are tried.
pub const STRATEGIES: [Strategy; 3] = [
    Strategy::CombinedName,
    Strategy::DistrictOnly,
    Strategy::FreeText,
];

/// Whether a candidate's admin region belongs to `state`.
///
/// Case-insensitive containment in either direction. A missing admin region
/// is the empty string, which every state contains.
pub fn admin_region_matches(state: &str, admin1: Option<&str>) -> bool {
    let state = state.to_lowercase();
    let admin1 = admin1.unwrap_or_default().to_lowercase();
    admin1.contains(&state) || state.contains(&admin1)
}

/// First candidate, in provider order, whose admin region matches `state`.
pub fn first_in_state<'a>(
    candidates: &'a [GeocodeCandidate],
    state: &str,
) -> Option<&'a GeocodeCandidate> {
    candidates
        .iter()
        .find(|c| admin_region_matches(state, c.admin1.as_deref()))
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<GeocodeCandidate>>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: Option<String>,
}

pub struct GeocodeResolver {
    client: Client,
    geocoding_url: String,
    nominatim_url: String,
    user_agent: String,
    country_code: String,
    country_name: String,
    cache: Arc<GeocodeCache>,
}

impl GeocodeResolver {
    pub fn new(providers: &ProvidersConfig, cache: Arc<GeocodeCache>) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(providers.timeout_secs))
            .build()
            .map_err(|e| WeatherError::network(GEOCODING_SERVICE, e))?;

        Ok(Self {
            client,
            geocoding_url: providers.geocoding_url.clone(),
            nominatim_url: providers.nominatim_url.clone(),
            user_agent: providers.user_agent.clone(),
            country_code: providers.country_code.clone(),
            country_name: providers.country_name.clone(),
            cache,
        })
    }

    pub fn cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Resolve a region to one best-guess coordinate.
    #[instrument(skip(self), level = "info")]
    pub async fn resolve(&self, query: &RegionQuery) -> Result<ResolvedLocation, WeatherError> {
        let name = query.search_name();

        if let Some(hit) = self.cache.get(&name) {
            tracing::debug!("Geocode cache hit for {}", name);
            return Ok(hit);
        }

        for strategy in STRATEGIES {
            match self.attempt(strategy, query).await? {
                Some(location) => {
                    tracing::info!(
                        "Resolved {} via {:?} to ({}, {})",
                        name,
                        strategy,
                        location.latitude,
                        location.longitude
                    );
                    self.cache.put(&name, &location);
                    return Ok(location);
                }
                None => tracing::debug!("{:?} found nothing for {}", strategy, name),
            }
        }

        Err(WeatherError::LocationNotFound(name))
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        query: &RegionQuery,
    ) -> Result<Option<ResolvedLocation>, WeatherError> {
        match strategy {
            Strategy::CombinedName => {
                let candidates = self.search(&query.search_name(), RESOLVE_CANDIDATES).await?;
                let chosen = match query.district {
                    Some(_) => first_in_state(&candidates, &query.state),
                    None => candidates.first(),
                };
                Ok(chosen.map(|c| self.label(c, &query.state)))
            }
            Strategy::DistrictOnly => {
                let Some(district) = query.district.as_deref() else {
                    return Ok(None);
                };
                let candidates = self.search(district, RESOLVE_CANDIDATES).await?;
                Ok(first_in_state(&candidates, &query.state).map(|c| self.label(c, &query.state)))
            }
            Strategy::FreeText => self.free_text_search(&query.free_text(&self.country_name)).await,
        }
    }

    fn label(&self, candidate: &GeocodeCandidate, state: &str) -> ResolvedLocation {
        let name = candidate.name.as_deref().unwrap_or(state);
        let admin1 = candidate.admin1.as_deref().unwrap_or(state);
        ResolvedLocation {
            latitude: candidate.latitude,
            longitude: candidate.longitude,
            display_name: format!("{}, {}, {}", name, admin1, self.country_name),
        }
    }

    /// Open-Meteo geocoding search, constrained to the configured country.
    #[instrument(skip(self), level = "debug")]
    pub async fn search(&self, name: &str, count: u32) -> Result<Vec<GeocodeCandidate>, WeatherError> {
        let count = count.to_string();
        let response = self
            .client
            .get(&self.geocoding_url)
            .query(&[
                ("name", name),
                ("country", self.country_code.as_str()),
                ("count", count.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::network(GEOCODING_SERVICE, e))?;

        let body: SearchResponse = ensure_success(response, GEOCODING_SERVICE)?
            .json()
            .await
            .map_err(|e| WeatherError::network(GEOCODING_SERVICE, e))?;
        Ok(body.results.unwrap_or_default())
    }

    #[instrument(skip(self), level = "debug")]
    async fn free_text_search(&self, q: &str) -> Result<Option<ResolvedLocation>, WeatherError> {
        let response = self
            .client
            .get(&self.nominatim_url)
            .query(&[("format", "json"), ("q", q), ("limit", "1"), ("addressdetails", "1")])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .map_err(|e| WeatherError::network(GEOCODING_SERVICE, e))?;

        let places: Vec<NominatimPlace> = ensure_success(response, GEOCODING_SERVICE)?
            .json()
            .await
            .map_err(|e| WeatherError::network(GEOCODING_SERVICE, e))?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let latitude = parse_coordinate(&place.lat, "lat")?;
        let longitude = parse_coordinate(&place.lon, "lon")?;

        Ok(Some(ResolvedLocation {
            latitude,
            longitude,
            display_name: place
                .display_name
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| q.to_string()),
        }))
    }

    /// Place suggestions for a partially typed name, limited to `state` when given.
    #[instrument(skip(self), level = "info")]
    pub async fn suggest(&self, state: &str, q: &str) -> Result<Vec<Suggestion>, WeatherError> {
        let q = q.trim();
        if q.is_empty() {
            return Err(WeatherError::InvalidInput(
                "Missing query parameter 'q'".to_string(),
            ));
        }

        let state = state.trim();
        let candidates = self.search(q, SUGGEST_CANDIDATES).await?;

        Ok(candidates
            .into_iter()
            .filter(|c| state.is_empty() || admin_region_matches(state, c.admin1.as_deref().map(str::trim)))
            .map(Suggestion::from)
            .collect())
    }
}

fn parse_coordinate(value: &str, field: &str) -> Result<f64, WeatherError> {
    value
        .trim()
        .parse()
        .map_err(|_| WeatherError::Parse(format!("Invalid {} in geocoding result: {}", field, value)))
}
