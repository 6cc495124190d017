//! Chat-completion client.

use std::time::Duration;

use mausam_core::AssistantConfig;
use mausam_weather::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::LlmError;
use crate::rules::RAIN_WINDOW;

const SYSTEM_PROMPT: &str = "You are a helpful, friendly weather assistant. Answer ANY weather-related question naturally and conversationally.

Provide:
- Direct answers to the user's specific question
- Practical advice and recommendations when relevant
- Safety tips for extreme conditions
- Clothing suggestions when appropriate
- Activity recommendations based on weather
- Context about why the weather is the way it is

Be conversational, helpful, and specific. Use the weather data provided. Keep responses under 200 words but be thorough.";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatReply>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

fn show(value: Option<f64>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

/// Plain-text summary of a snapshot handed to the model as context.
pub fn describe(snapshot: &WeatherSnapshot) -> String {
    let c = &snapshot.current;
    let mut lines = vec![
        "Current weather conditions:".to_string(),
        format!(
            "- Temperature: {}°C (feels like {}°C)",
            show(c.temperature_c),
            show(c.feels_like_c)
        ),
        format!("- Humidity: {}%", show(c.humidity)),
        format!(
            "- Wind: {} km/h from {}°",
            show(c.windspeed_kph),
            show(c.winddirection)
        ),
        format!("- Precipitation: {} mm", c.precipitation.unwrap_or(0.0)),
        format!("- Cloud cover: {}%", c.cloud_cover.unwrap_or(0.0)),
        format!("- Pressure: {} hPa", c.pressure_hpa.unwrap_or(0.0)),
        format!(
            "- Weather code: {}",
            c.weathercode
                .map_or_else(|| "unknown".to_string(), |code| code.to_string())
        ),
    ];

    let window = &snapshot.hourly[..snapshot.hourly.len().min(RAIN_WINDOW)];

    let probs: Vec<f64> = window
        .iter()
        .filter_map(|h| h.precipitation_probability)
        .collect();
    if !probs.is_empty() {
        let max = probs.iter().copied().fold(f64::MIN, f64::max);
        let avg = probs.iter().sum::<f64>() / probs.len() as f64;
        lines.push(format!(
            "- Precipitation probability (next 12h): max {}%, avg {:.1}%",
            max, avg
        ));
    }

    let temps: Vec<f64> = window.iter().filter_map(|h| h.temperature_c).collect();
    if !temps.is_empty() {
        let max = temps.iter().copied().fold(f64::MIN, f64::max);
        let min = temps.iter().copied().fold(f64::MAX, f64::min);
        lines.push(format!(
            "- Temperature range (next 12h): {:.1}°C to {:.1}°C",
            min, max
        ));
    }

    lines.join("\n")
}

/// Client for an OpenAI-compatible chat completions endpoint.
pub struct ChatClient {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl ChatClient {
    /// Build a client, or `NotConfigured` when no API key is set.
    pub fn new(config: &AssistantConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::NotConfigured)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.chat_url.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Ask the model `question` with `context` prepended.
    #[instrument(skip(self, context), level = "info")]
    pub async fn complete(&self, context: &str, question: &str) -> Result<String, LlmError> {
        let prompt = format!(
            "{}\n\nUser question: {}\n\nProvide a helpful, natural answer.",
            context, question
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", self.auth_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Status(status.as_u16()));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .map(|content| content.trim().to_string())
            .filter(|answer| !answer.is_empty())
            .ok_or(LlmError::EmptyAnswer)
    }
}
