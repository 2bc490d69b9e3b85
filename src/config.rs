use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::guide::MAX_STEPS;

/// Main configuration structure loaded from study_guide.toml and environment variables
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub guide: GuideConfig,
    pub server: ServerConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Chat-completion provider settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub retries: u32,
    pub timeout_ms: u64,
    /// Refuse to fall back to the fake model when no API key is configured
    pub strict: bool,
}

/// Study guide behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuideConfig {
    pub default_steps: u32,
    pub responses_file: PathBuf,
    pub cache_responses: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: std::net::SocketAddr,
    pub request_timeout_ms: u64,
}

/// Secrets and values that only come from the environment
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub openai_api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            retries: 3,
            timeout_ms: 60_000,
            strict: false,
        }
    }
}

impl ModelConfig {
    /// Longest a completion can take: every attempt timing out plus the backoff between them
    pub fn worst_case_ms(&self) -> u64 {
        let attempts = self.retries.clamp(1, 5);
        let backoff: u64 = (0..attempts - 1).map(|i| 200u64 << i).sum();
        self.timeout_ms.saturating_mul(u64::from(attempts)) + backoff
    }
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            default_steps: 1,
            responses_file: PathBuf::from("saved_responses.json"),
            cache_responses: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: std::net::SocketAddr::from(([127, 0, 0, 1], 5000)),
            request_timeout_ms: 190_000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            guide: GuideConfig::default(),
            server: ServerConfig::default(),
            runtime: RuntimeConfig::default(),
        }
    }
}

/// Tracing filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "study_guide=info,tower_http=info";

/// Slack added on top of the model's worst case so its error reaches the client first
const REQUEST_TIMEOUT_MARGIN_MS: u64 = 5_000;

fn is_true(v: &str) -> bool {
    v == "1" || v.eq_ignore_ascii_case("true")
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses STUDY_GUIDE_CONFIG environment variable or defaults to "study_guide.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("STUDY_GUIDE_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::dotenv();
        }

        let config_path = std::env::var("STUDY_GUIDE_CONFIG")
            .unwrap_or_else(|_| "study_guide.toml".to_string());

        let mut config: Config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::warn!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Env-first overrides on top of file values
    fn apply_env(&mut self) {
        if let Ok(model) = std::env::var("STUDY_GUIDE_MODEL")
            && !model.trim().is_empty()
        {
            self.model.name = model;
        }
        if let Ok(url) = std::env::var("STUDY_GUIDE_BASE_URL")
            && !url.trim().is_empty()
        {
            self.model.base_url = url;
        }
        if let Some(t) = env_parse::<f32>("STUDY_GUIDE_TEMPERATURE") {
            self.model.temperature = t;
        }
        if let Some(n) = env_parse::<u32>("STUDY_GUIDE_MAX_TOKENS") {
            self.model.max_tokens = n;
        }
        if let Some(n) = env_parse::<u32>("STUDY_GUIDE_RETRIES") {
            self.model.retries = n;
        }
        if let Some(ms) = env_parse::<u64>("STUDY_GUIDE_TIMEOUT_MS") {
            self.model.timeout_ms = ms;
        }
        if let Ok(v) = std::env::var("STUDY_GUIDE_STRICT") {
            self.model.strict = is_true(&v);
        }
        if let Some(steps) = env_parse::<u32>("DEFAULT_STEPS") {
            self.guide.default_steps = steps;
        }
        if let Ok(path) = std::env::var("RESPONSES_FILE")
            && !path.trim().is_empty()
        {
            self.guide.responses_file = PathBuf::from(path);
        }
        if let Ok(v) = std::env::var("STUDY_GUIDE_CACHE") {
            self.guide.cache_responses = is_true(&v);
        }
        if let Some(bind) = env_parse::<std::net::SocketAddr>("STUDY_GUIDE_BIND") {
            self.server.bind = bind;
        }
    }

    /// Clamp soft limits and reject settings the service cannot run with
    pub fn validate(&mut self) -> anyhow::Result<()> {
        if !self.model.temperature.is_finite() {
            anyhow::bail!("temperature must be a finite number");
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            tracing::warn!(
                "temperature {} outside 0.0..=2.0, clamping",
                self.model.temperature
            );
            self.model.temperature = self.model.temperature.clamp(0.0, 2.0);
        }
        if self.model.retries == 0 {
            self.model.retries = 1;
        } else if self.model.retries > 5 {
            tracing::warn!("retries {} exceeds max 5, clamping to 5", self.model.retries);
            self.model.retries = 5;
        }
        self.guide.default_steps = self.guide.default_steps.clamp(1, MAX_STEPS);

        let min_request_ms = self.model.worst_case_ms() + REQUEST_TIMEOUT_MARGIN_MS;
        if self.server.request_timeout_ms < min_request_ms {
            tracing::warn!(
                "request_timeout_ms {} is shorter than the model worst case, raising to {}",
                self.server.request_timeout_ms,
                min_request_ms
            );
            self.server.request_timeout_ms = min_request_ms;
        }

        if self.model.max_tokens == 0 {
            anyhow::bail!("max_tokens must be greater than 0");
        }
        if !self.model.base_url.starts_with("http://") && !self.model.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "model base_url '{}' must start with http:// or https://",
                self.model.base_url
            );
        }
        Ok(())
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
        }
    }
}
