use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;
use crate::look::{look_proposal_typedef, LookProposal};
use crate::prompt::PromptData;
use crate::schema::validate;

/// A generative model able to propose a look for a prompt.
///
/// Implementations make exactly one call per invocation; retrying is the
/// generator's job.
#[async_trait]
pub trait OutfitModel: Send + Sync {
    async fn propose_look(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<LookProposal, ModelError>;
}

#[async_trait]
impl<M: OutfitModel + ?Sized> OutfitModel for Arc<M> {
    async fn propose_look(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<LookProposal, ModelError> {
        (**self).propose_look(prompt, temperature).await
    }
}

/// Bounds each model call with a deadline; an elapsed call is a model error.
#[derive(Debug, Clone)]
pub struct TimeoutModel<M> {
    inner: M,
    timeout: Duration,
}

impl<M> TimeoutModel<M> {
    pub fn new(inner: M, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl<M: OutfitModel> OutfitModel for TimeoutModel<M> {
    async fn propose_look(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<LookProposal, ModelError> {
        tokio::time::timeout(self.timeout, self.inner.propose_look(prompt, temperature))
            .await
            .map_err(|_| ModelError::Timeout(self.timeout))?
    }
}

#[derive(Clone)]
pub struct LlmClient {
    http: Client,
    base_url: String,
    model: String,
    is_ollama: bool,
}

impl LlmClient {
    pub fn new(base_url: String) -> Self {
        Self::new_with_model(base_url, None)
    }

    pub fn new_with_model(base_url: String, model: Option<String>) -> Self {
        let is_ollama = base_url.contains("11434") || base_url.contains("/api/generate");
        let model = model.unwrap_or_else(|| "llama3.2:3b".to_string());

        // HTTP/1.1 only, no proxy: the mock server speaks nothing else.
        let http = Client::builder()
            .http1_only()
            .no_proxy()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http,
            base_url,
            model,
            is_ollama,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_ollama(&self) -> bool {
        self.is_ollama
    }

    async fn call_llm(&self, prompt: &PromptData, temperature: f32) -> Result<String, ModelError> {
        if self.is_ollama {
            self.call_ollama(prompt, temperature).await
        } else {
            self.call_mock_server(prompt, temperature).await
        }
    }

    async fn call_ollama(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<String, ModelError> {
        #[derive(Serialize)]
        struct OllamaOptions {
            temperature: f32,
        }

        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            system: &'a str,
            prompt: &'a str,
            stream: bool,
            format: &'a str,
            options: OllamaOptions,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            response: String,
        }

        let url = if self.base_url.ends_with("/api/generate") {
            self.base_url.clone()
        } else {
            format!("{}/api/generate", self.base_url.trim_end_matches('/'))
        };

        let resp = self
            .http
            .post(&url)
            .header("Connection", "close")
            .json(&OllamaRequest {
                model: &self.model,
                system: &prompt.system_prompt,
                prompt: &prompt.user_prompt,
                stream: false,
                format: "json",
                options: OllamaOptions { temperature },
            })
            .send()
            .await?;

        let body: OllamaResponse = check_status(resp).await?.json().await?;
        Ok(body.response)
    }

    async fn call_mock_server(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<String, ModelError> {
        let resp = self
            .http
            .post(&self.base_url)
            .header("Connection", "close")
            .json(&LlmRequest {
                system: prompt.system_prompt.clone(),
                prompt: prompt.user_prompt.clone(),
                temperature,
            })
            .send()
            .await?;

        let body: LlmResponse = check_status(resp).await?.json().await?;
        Ok(body.output)
    }
}

#[async_trait]
impl OutfitModel for LlmClient {
    async fn propose_look(
        &self,
        prompt: &PromptData,
        temperature: f32,
    ) -> Result<LookProposal, ModelError> {
        let text = self.call_llm(prompt, temperature).await?;
        parse_proposal(&text)
    }
}

/// Body of a `POST /llm` call against the mock server.
#[derive(Debug, Serialize, Deserialize)]
pub struct LlmRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
}

/// Reply of the mock server; `output` holds the raw model text.
#[derive(Debug, Serialize, Deserialize)]
pub struct LlmResponse {
    pub output: String,
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, ModelError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(ModelError::Status { status, body })
}

/// Turn raw model text into a schema-checked proposal.
pub fn parse_proposal(text: &str) -> Result<LookProposal, ModelError> {
    let value: Value = serde_json::from_str(&clean_json_response(text))?;

    if let Err(errors) = validate(&look_proposal_typedef(), &value) {
        let joined: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(ModelError::Schema(joined.join("; ")));
    }

    Ok(serde_json::from_value(value)?)
}

/// Remove markdown code fences around a JSON answer.
fn clean_json_response(response: &str) -> String {
    let mut cleaned = response.trim();

    if cleaned.starts_with("```") {
        cleaned = match cleaned.find('\n') {
            Some(start_idx) => &cleaned[start_idx + 1..],
            None => &cleaned[3..],
        };
        if let Some(stripped) = cleaned.trim_end().strip_suffix("```") {
            cleaned = stripped;
        }
    }

    cleaned.trim().to_string()
}
