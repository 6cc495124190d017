use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let mut router = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/weather/current", get(handlers::current_weather))
        .route("/api/weather/hourly", get(handlers::hourly_forecast))
        .route("/api/weather/by-region", get(handlers::weather_by_region))
        .route("/api/geocode/suggest", get(handlers::suggest))
        .route("/api/ai/query", post(handlers::ai_query))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        router = router.layer(CorsLayer::permissive());
    }

    router
}
