//! Answer orchestration: weather snapshot, then model, then rules.

use mausam_core::{AppError, AssistantConfig};
use mausam_weather::{WeatherProvider, WeatherSnapshot, WEATHER_SOURCE};
use tracing::instrument;

use crate::error::LlmError;
use crate::llm::{describe, ChatClient};
use crate::rules::{self, Conditions};
use crate::types::{AnswerMode, AnswerResult};

const MODEL_SOURCE: &str = "openai";

pub const NEED_LOCATION: &str = "I need a location to provide weather insights. Please select a location first, then ask me anything about the weather!";

pub struct Assistant {
    weather: WeatherProvider,
    chat: Option<ChatClient>,
}

impl Assistant {
    pub fn new(weather: WeatherProvider, config: &AssistantConfig) -> Self {
        let chat = match ChatClient::new(config) {
            Ok(client) => Some(client),
            Err(LlmError::NotConfigured) => {
                tracing::info!("No chat API key configured, answering with rules only");
                None
            }
            Err(e) => {
                tracing::warn!("Chat client unavailable, answering with rules only: {}", e);
                None
            }
        };

        Self { weather, chat }
    }

    /// Whether answers may come from the chat model.
    pub fn uses_model(&self) -> bool {
        self.chat.is_some()
    }

    /// Answer a weather question, optionally about a coordinate.
    ///
    /// Only an empty question is an error. Weather and model failures degrade
    /// to a rule-based answer or to the location prompt.
    #[instrument(skip(self), level = "info")]
    pub async fn answer(
        &self,
        question: &str,
        lat: Option<f64>,
        lon: Option<f64>,
    ) -> Result<AnswerResult, AppError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("Missing field 'query'".to_string()));
        }

        let Some(snapshot) = self.snapshot(lat, lon).await else {
            return Ok(AnswerResult::rule_based(NEED_LOCATION.to_string(), &[]));
        };

        if let Some(chat) = &self.chat {
            match chat.complete(&describe(&snapshot), question).await {
                Ok(answer) => {
                    return Ok(AnswerResult {
                        answer,
                        mode: AnswerMode::Model,
                        provenance: vec![MODEL_SOURCE.to_string(), WEATHER_SOURCE.to_string()],
                    })
                }
                Err(e) => tracing::warn!("Chat completion failed, falling back to rules: {}", e),
            }
        }

        let answer = rules::respond(question, &Conditions::from(&snapshot));
        Ok(AnswerResult::rule_based(answer, &[WEATHER_SOURCE]))
    }

    async fn snapshot(&self, lat: Option<f64>, lon: Option<f64>) -> Option<WeatherSnapshot> {
        let (lat, lon) = lat.zip(lon)?;

        match self.weather.snapshot(lat, lon).await {
            Ok(snapshot) if has_readings(&snapshot) => Some(snapshot),
            Ok(_) => {
                tracing::debug!("Forecast for ({}, {}) had no current block", lat, lon);
                None
            }
            Err(e) => {
                tracing::warn!("Weather snapshot for ({}, {}) failed: {}", lat, lon, e);
                None
            }
        }
    }
}

fn has_readings(snapshot: &WeatherSnapshot) -> bool {
    snapshot
        .current
        .raw
        .as_object()
        .is_some_and(|fields| !fields.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mausam_core::ProvidersConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn forecast_body() -> serde_json::Value {
        serde_json::json!({
            "current": {
                "temperature_2m": 24.0,
                "apparent_temperature": 25.0,
                "relative_humidity_2m": 55,
                "precipitation": 0.0,
                "weather_code": 1,
                "wind_speed_10m": 8.0,
                "wind_direction_10m": 90,
                "pressure_msl": 1012.0,
                "cloud_cover": 10
            },
            "hourly": {
                "time": ["t0", "t1"],
                "temperature_2m": [24.0, 25.0],
                "precipitation_probability": [10, 20]
            }
        })
    }

    async fn mount_forecast(server: &MockServer, status: u16) {
        let template = if status == 200 {
            ResponseTemplate::new(200).set_body_json(forecast_body())
        } else {
            ResponseTemplate::new(status)
        };
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    fn assistant(server: &MockServer, api_key: Option<&str>) -> Assistant {
        let providers = ProvidersConfig::with_base_url(&server.uri());
        let config = AssistantConfig {
            api_key: api_key.map(str::to_string),
            chat_url: format!("{}/v1/chat/completions", server.uri()),
            ..AssistantConfig::default()
        };
        Assistant::new(WeatherProvider::new(&providers).unwrap(), &config)
    }

    #[tokio::test]
    async fn test_no_location_asks_for_one() {
        let server = MockServer::start().await;
        let result = assistant(&server, None)
            .answer("Will it rain?", None, None)
            .await
            .unwrap();

        assert_eq!(result.answer, NEED_LOCATION);
        assert_eq!(result.mode, AnswerMode::RuleBased);
        assert!(result.provenance.is_empty());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_half_a_coordinate_is_no_location() {
        let server = MockServer::start().await;
        let result = assistant(&server, None)
            .answer("Will it rain?", Some(12.9), None)
            .await
            .unwrap();
        assert_eq!(result.answer, NEED_LOCATION);
    }

    #[tokio::test]
    async fn test_weather_failure_degrades_to_location_prompt() {
        let server = MockServer::start().await;
        mount_forecast(&server, 503).await;

        let result = assistant(&server, None)
            .answer("Will it rain?", Some(12.9), Some(77.6))
            .await
            .unwrap();
        assert_eq!(result.answer, NEED_LOCATION);
        assert!(result.provenance.is_empty());
    }

    #[tokio::test]
    async fn test_rules_without_api_key() {
        let server = MockServer::start().await;
        mount_forecast(&server, 200).await;

        let assistant = assistant(&server, None);
        assert!(!assistant.uses_model());

        let result = assistant
            .answer("  Will it be HOT and rainy?  ", Some(12.9), Some(77.6))
            .await
            .unwrap();
        assert_eq!(result.mode, AnswerMode::RuleBased);
        assert_eq!(result.provenance, vec!["open-meteo".to_string()]);
        assert!(result.answer.starts_with("No rain expected!"));
    }

    #[tokio::test]
    async fn test_model_answer_when_configured() {
        let server = MockServer::start().await;
        mount_forecast(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "Light layers today."}}]
            })))
            .mount(&server)
            .await;

        let result = assistant(&server, Some("sk-test"))
            .answer("What should I wear?", Some(12.9), Some(77.6))
            .await
            .unwrap();
        assert_eq!(result.answer, "Light layers today.");
        assert_eq!(result.mode, AnswerMode::Model);
        assert_eq!(result.provenance, vec!["openai".to_string(), "open-meteo".to_string()]);
    }

    #[tokio::test]
    async fn test_model_failure_falls_back_to_rules() {
        let server = MockServer::start().await;
        mount_forecast(&server, 200).await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let result = assistant(&server, Some("sk-test"))
            .answer("Is it windy?", Some(12.9), Some(77.6))
            .await
            .unwrap();
        assert_eq!(result.mode, AnswerMode::RuleBased);
        assert_eq!(result.provenance, vec!["open-meteo".to_string()]);
        assert!(result.answer.starts_with("Wind is blowing at 8 km/h from the E"));
    }

    #[tokio::test]
    async fn test_empty_question_is_invalid() {
        let server = MockServer::start().await;
        let err = assistant(&server, None).answer("   ", None, None).await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
