use std::time::Duration;

/// Caller errors from [`crate::generator::OutfitGenerator::generate`].
///
/// These describe inputs no amount of retrying can satisfy, so they are
/// returned immediately and never trigger the fallback assembler.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("the wardrobe has no items")]
    EmptyWardrobe,

    #[error("item {id} does not exist in this wardrobe")]
    UnknownForcedItem { id: i64 },
}

/// Failures of a single generative-model call. Always retried by the generator.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("LLM HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("LLM HTTP error {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("LLM did not return valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("LLM output does not match the look schema: {0}")]
    Schema(String),

    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// Invalid environment configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
