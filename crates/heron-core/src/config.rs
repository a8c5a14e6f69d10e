use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Top-level config (heron.toml + HERON_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeronConfig {
    pub slack: SlackConfig,
    pub predict: PredictConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Attachments larger than this are skipped with a warning.
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot token (xoxb-...) for Web API calls and file downloads.
    pub bot_token: String,
    /// App-level token (xapp-...) for the socket-mode connection.
    pub app_token: String,
    /// Signing secret, kept for parity with webhook-mode deployments.
    pub signing_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictConfig {
    /// Prediction service base URL, without trailing slash.
    pub base_url: String,
    pub api_key: String,
    /// Flow identifier appended to the prediction path.
    pub flow_id: String,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            jitter_ms: default_jitter_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_max_attachment_bytes() -> u64 {
    20 * 1024 * 1024
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    500
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}

impl HeronConfig {
    /// Load config from a TOML file with HERON_* env var overrides.
    ///
    /// Env keys use `__` as the section separator so field names that
    /// contain underscores survive the mapping, e.g.
    /// `HERON_SLACK__BOT_TOKEN` → `slack.bot_token`.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("heron.toml");

        let config: HeronConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("HERON_").split("__"))
            .extract()
            .map_err(|e| crate::error::HeronError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Presence and well-formedness checks. Failure here is fatal at
    /// startup; misconfiguration is not a per-message error.
    pub fn validate(&self) -> crate::error::Result<()> {
        require(&self.slack.bot_token, "slack.bot_token")?;
        require(&self.slack.app_token, "slack.app_token")?;
        require(&self.slack.signing_secret, "slack.signing_secret")?;
        require(&self.predict.api_key, "predict.api_key")?;
        require(&self.predict.flow_id, "predict.flow_id")?;
        require(&self.predict.base_url, "predict.base_url")?;

        let parsed = url::Url::parse(&self.predict.base_url)
            .map_err(|e| config_err(format!("predict.base_url is not a valid URL: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(config_err(format!(
                "predict.base_url must be http(s), got {}",
                parsed.scheme()
            )));
        }
        if self.predict.retry.max_attempts == 0 {
            return Err(config_err("predict.retry.max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

fn require(value: &str, key: &str) -> crate::error::Result<()> {
    if value.trim().is_empty() {
        return Err(config_err(format!("{key} is required")));
    }
    Ok(())
}

fn config_err(msg: String) -> crate::error::HeronError {
    crate::error::HeronError::Config(msg)
}
