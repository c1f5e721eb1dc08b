//! Layered configuration: built-in defaults, an optional settings file, and
//! environment variables.

use crate::client::Credentials;
use anyhow::{anyhow, Result};
use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Connection to the Agents Bar API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Must end with `/` so endpoint paths join beneath it.
    pub base_url: String,
    pub verify_tls: bool,
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://agents.bar/api/v1/".to_string(),
            verify_tls: true,
            timeout_seconds: 30,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Who logs in, and which agent they drive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub username: String,
    /// Prompted for on the terminal when absent.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,
    pub agent_name: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: None,
            agent_name: "CartPoleAgent".to_string(),
        }
    }
}

/// Episode schedule for the training loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub max_episodes: u32,
    pub score_threshold: f64,
    /// Base of the geometric exploration-noise decay.
    pub noise_decay: f64,
    pub render_final: bool,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_episodes: 100,
            score_threshold: 50.0,
            noise_decay: 0.99,
            render_final: true,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub api: ApiConfig,
    pub credentials: CredentialsConfig,
    pub training: TrainingConfig,
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load settings, optionally from an explicit file.
    ///
    /// Without `path`, an `agents_bar.toml` in the working directory is used
    /// when present. Call [`Settings::validate`] once logging is up and any
    /// command-line overrides are applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("agents_bar").required(false),
        };

        let config = Config::builder()
            .add_source(File::from_str(include_str!("../config.toml"), FileFormat::Toml))
            .add_source(file)
            // AGENTS_BAR__API__BASE_URL, AGENTS_BAR__TRAINING__MAX_EPISODES, ...
            // Values stay strings here; typed fields are parsed on deserialize.
            .add_source(Environment::with_prefix("AGENTS_BAR").separator("__"))
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        Self::apply_env_overrides(&mut settings);
        Ok(settings)
    }

    /// Short-form variables for the values most often kept out of files.
    fn apply_env_overrides(settings: &mut Settings) {
        if let Ok(username) = std::env::var("AGENTS_BAR_USERNAME") {
            settings.credentials.username = username;
        }
        if let Ok(password) = std::env::var("AGENTS_BAR_PASSWORD") {
            settings.credentials.password = Some(password);
        }
        if let Ok(agent) = std::env::var("AGENTS_BAR_AGENT") {
            settings.credentials.agent_name = agent;
        }
    }

    /// Login material for the client. The username is sent exactly as
    /// configured; `prompt` supplies the password when none is configured.
    pub fn credentials<F>(&self, prompt: F) -> Result<Credentials>
    where
        F: FnOnce(&str) -> Result<String>,
    {
        let username = &self.credentials.username;
        if username.trim().is_empty() {
            return Err(anyhow!(
                "No username configured; set AGENTS_BAR_USERNAME or credentials.username"
            ));
        }

        let password = match &self.credentials.password {
            Some(password) => password.clone(),
            None => prompt(username)?,
        };

        Ok(Credentials {
            username: username.clone(),
            password,
            agent_name: self.credentials.agent_name.clone(),
        })
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api.base_url)
            .map_err(|e| anyhow!("Invalid API base URL '{}': {}", self.api.base_url, e))?;
        if url.cannot_be_a_base() || !self.api.base_url.ends_with('/') {
            return Err(anyhow!(
                "API base URL must be a hierarchical URL ending in '/': {}",
                self.api.base_url
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err(anyhow!("API timeout cannot be 0"));
        }
        if !self.api.verify_tls {
            warn!("TLS certificate verification is disabled for {}", self.api.base_url);
        }

        if self.credentials.agent_name.trim().is_empty() {
            return Err(anyhow!("Agent name cannot be empty"));
        }

        let decay = self.training.noise_decay;
        if !(decay > 0.0 && decay <= 1.0) {
            return Err(anyhow!("Noise decay must be in (0, 1], got {}", decay));
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(anyhow!(
                "Logging format must be 'text' or 'json', got '{}'",
                self.logging.format
            ));
        }

        Ok(())
    }
}
