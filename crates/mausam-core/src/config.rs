use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "MAUSAM_CONFIG";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single-line summary of all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream weather and geocoding providers
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Language-model assistant settings
    #[serde(default)]
    pub assistant: AssistantConfig,

    /// Geocode cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allow any origin to call the API (local development frontends)
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_enable_cors() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_enable_cors(),
        }
    }
}

impl ServerConfig {
    /// `host:port` string suitable for binding a listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvidersConfig {
    /// Open-Meteo forecast endpoint
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    /// Open-Meteo geocoding search endpoint
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    /// Nominatim free-text search endpoint (fallback geocoder)
    #[serde(default = "default_nominatim_url")]
    pub nominatim_url: String,

    /// User-Agent sent to Nominatim, which rejects anonymous clients
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// ISO country code passed to the geocoding search
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Country name appended to fallback free-text queries
    #[serde(default = "default_country_name")]
    pub country_name: String,

    /// Per-request timeout for weather and geocoding calls
    #[serde(default = "default_provider_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1/forecast".to_string()
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1/search".to_string()
}

fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}

fn default_user_agent() -> String {
    "WeatherAI/1.0 (weather forecast app)".to_string()
}

fn default_country_code() -> String {
    "IN".to_string()
}

fn default_country_name() -> String {
    "India".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    10
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            geocoding_url: default_geocoding_url(),
            nominatim_url: default_nominatim_url(),
            user_agent: default_user_agent(),
            country_code: default_country_code(),
            country_name: default_country_name(),
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

impl ProvidersConfig {
    /// Point every provider at a single base URL (used by tests with a mock server)
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            forecast_url: format!("{}/v1/forecast", base),
            geocoding_url: format!("{}/v1/search", base),
            nominatim_url: format!("{}/search", base),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Chat-completion API key. Read from `OPENAI_API_KEY`; never written to disk.
    #[serde(skip_serializing, default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_chat_url")]
    pub chat_url: String,

    #[serde(default = "default_assistant_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_chat_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_assistant_timeout_secs() -> u64 {
    15
}

fn default_max_tokens() -> u32 {
    300
}

fn default_temperature() -> f64 {
    0.7
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            chat_url: default_chat_url(),
            timeout_secs: default_assistant_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

impl AssistantConfig {
    /// Check if a usable API key is present
    pub fn is_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .map(|k| !k.trim().is_empty())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// JSON file holding resolved geocodes
    #[serde(default = "default_geocode_path")]
    pub geocode_path: PathBuf,
}

fn default_geocode_path() -> PathBuf {
    PathBuf::from("data").join("geocode_cache.json")
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            geocode_path: default_geocode_path(),
        }
    }
}

impl Config {
    /// Load configuration from `$MAUSAM_CONFIG` or the user config directory,
    /// then apply environment overrides.
    pub fn load() -> Result<Self> {
        let path = match std::env::var(CONFIG_PATH_ENV) {
            Ok(p) if !p.is_empty() => PathBuf::from(p),
            _ => Self::default_config_path()?,
        };

        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a file, creating it with defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails; warnings are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Apply overrides from a variable lookup (the process environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.assistant.api_key = Some(key);
        }

        if let Some(host) = lookup("MAUSAM_HOST").filter(|h| !h.is_empty()) {
            self.server.host = host;
        }

        if let Some(port) = lookup("MAUSAM_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid MAUSAM_PORT value: {}", port),
            }
        }

        if let Some(path) = lookup("MAUSAM_GEOCODE_CACHE").filter(|p| !p.is_empty()) {
            self.cache.geocode_path = PathBuf::from(path);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.server.port == 0 {
            result.add_error("server.port", "Port cannot be 0");
        }

        self.validate_url(&self.providers.forecast_url, "providers.forecast_url", &mut result);
        self.validate_url(&self.providers.geocoding_url, "providers.geocoding_url", &mut result);
        self.validate_url(&self.providers.nominatim_url, "providers.nominatim_url", &mut result);
        self.validate_url(&self.assistant.chat_url, "assistant.chat_url", &mut result);

        if self.providers.timeout_secs == 0 {
            result.add_error("providers.timeout_secs", "Timeout must be greater than 0");
        }

        if self.providers.user_agent.trim().is_empty() {
            result.add_error(
                "providers.user_agent",
                "Nominatim requires a descriptive User-Agent",
            );
        }

        if self.assistant.timeout_secs == 0 {
            result.add_error("assistant.timeout_secs", "Timeout must be greater than 0");
        }

        if self.assistant.max_tokens == 0 {
            result.add_error("assistant.max_tokens", "max_tokens must be greater than 0");
        }

        if !(0.0..=2.0).contains(&self.assistant.temperature) {
            result.add_error(
                "assistant.temperature",
                format!(
                    "Temperature must be between 0.0 and 2.0, got {}",
                    self.assistant.temperature
                ),
            );
        }

        if !self.assistant.is_configured() {
            result.add_warning(
                "assistant.api_key",
                "OPENAI_API_KEY not set - assistant will use rule-based answers only",
            );
        }

        result
    }

    /// Validate a URL field
    fn validate_url(&self, url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to a file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).context("Failed to create config directory")?;
            }
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the default path to the configuration file
    fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("mausam");

        Ok(config_dir.join("config.toml"))
    }
}
