//! Route handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use mausam_assistant::AnswerResult;
use mausam_weather::{
    CurrentWeather, HourlyForecast, RegionQuery, RegionWeather, Suggestion, WEATHER_SOURCE,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_HOURS: u32 = 24;

#[derive(Debug, Serialize)]
pub struct Health {
    pub ok: bool,
    pub time: String,
}

#[derive(Debug, Deserialize)]
pub struct CoordParams {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Deserialize)]
pub struct HourlyParams {
    pub lat: f64,
    pub lon: f64,
    pub hours: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RegionParams {
    #[serde(default)]
    pub state: String,
    pub district: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestParams {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Suggestions {
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
pub struct AiQuery {
    #[serde(default)]
    pub query: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

pub async fn health() -> Json<Health> {
    Json(Health {
        ok: true,
        time: chrono::Utc::now()
            .naive_utc()
            .format("%Y-%m-%dT%H:%M:%S%.6f")
            .to_string(),
    })
}

#[instrument(skip(state, params))]
pub async fn current_weather(
    State(state): State<AppState>,
    params: Result<Query<CoordParams>, QueryRejection>,
) -> Result<Json<CurrentWeather>, ApiError> {
    let Query(CoordParams { lat, lon }) = params.map_err(ApiError::bad_query)?;
    Ok(Json(state.weather.current(lat, lon).await?))
}

#[instrument(skip(state, params))]
pub async fn hourly_forecast(
    State(state): State<AppState>,
    params: Result<Query<HourlyParams>, QueryRejection>,
) -> Result<Json<HourlyForecast>, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_query)?;
    let hours = params.hours.unwrap_or(DEFAULT_HOURS);

    let forecast = state.weather.hourly(params.lat, params.lon, hours).await?;
    Ok(Json(HourlyForecast {
        forecast,
        source: WEATHER_SOURCE.to_string(),
    }))
}

#[instrument(skip(state, params))]
pub async fn weather_by_region(
    State(state): State<AppState>,
    params: Result<Query<RegionParams>, QueryRejection>,
) -> Result<Json<RegionWeather>, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_query)?;
    let query = RegionQuery::new(&params.state, params.district.as_deref())?;

    let location = state.resolver.resolve(&query).await?;
    let current = state
        .weather
        .current(location.latitude, location.longitude)
        .await?;

    Ok(Json(RegionWeather {
        location: location.display_name,
        latitude: location.latitude,
        longitude: location.longitude,
        current,
    }))
}

#[instrument(skip(state, params))]
pub async fn suggest(
    State(state): State<AppState>,
    params: Result<Query<SuggestParams>, QueryRejection>,
) -> Result<Json<Suggestions>, ApiError> {
    let Query(params) = params.map_err(ApiError::bad_query)?;
    let suggestions = state.resolver.suggest(&params.state, &params.q).await?;
    Ok(Json(Suggestions { suggestions }))
}

#[instrument(skip(state, body))]
pub async fn ai_query(
    State(state): State<AppState>,
    body: Result<Json<AiQuery>, JsonRejection>,
) -> Result<Json<AnswerResult>, ApiError> {
    let Json(request) = body.map_err(ApiError::bad_json)?;
    let answer = state
        .assistant
        .answer(&request.query, request.lat, request.lon)
        .await?;
    Ok(Json(answer))
}
