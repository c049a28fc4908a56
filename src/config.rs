use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::look::{GenerationOptions, DEFAULT_MAX_ATTEMPTS, DEFAULT_TEMPERATURE};

/// Runner configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerConfig {
    /// gRPC bind address.
    pub addr: SocketAddr,
    /// Ollama `/api/generate` endpoint or mock server URL.
    pub llm_base_url: String,
    pub ollama_model: Option<String>,
    /// Attempts used when a request does not set its own.
    pub max_attempts: u32,
    /// Sampling temperature used when a request does not set its own.
    pub temperature: f32,
    /// Deadline for a single model call.
    pub model_timeout: Duration,
}

impl RunnerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default                               |
    /// |----------------------|---------------------------------------|
    /// | `RUNNER_ADDR`        | `0.0.0.0:50051`                       |
    /// | `LLM_BASE_URL`       | `http://localhost:11434/api/generate` |
    /// | `OLLAMA_MODEL`       | unset                                 |
    /// | `MAX_ATTEMPTS`       | `3`                                   |
    /// | `TEMPERATURE`        | `0.7`                                 |
    /// | `MODEL_TIMEOUT_SECS` | `60`                                  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let addr = parse_or(&lookup, "RUNNER_ADDR", SocketAddr::from(([0, 0, 0, 0], 50051)))?;
        let llm_base_url = lookup("LLM_BASE_URL")
            .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string());
        let ollama_model = lookup("OLLAMA_MODEL").filter(|m| !m.trim().is_empty());
        let max_attempts = parse_or(&lookup, "MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?;
        let temperature: f32 = parse_or(&lookup, "TEMPERATURE", DEFAULT_TEMPERATURE)?;
        let timeout_secs: u64 = parse_or(&lookup, "MODEL_TIMEOUT_SECS", 60)?;

        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::Invalid {
                var: "TEMPERATURE",
                value: temperature.to_string(),
                reason: "must be between 0 and 2".into(),
            });
        }

        Ok(Self {
            addr,
            llm_base_url,
            ollama_model,
            max_attempts,
            temperature,
            model_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Defaults applied to requests that leave attempts or temperature unset.
    pub fn default_options(&self) -> GenerationOptions {
        GenerationOptions {
            max_attempts: self.max_attempts,
            temperature: self.temperature,
            ..GenerationOptions::default()
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}
