//! External text-generation collaborator.
//!
//! The engine only depends on the trait: given a persona prompt and a
//! bounded conversation window, return one short in-character utterance or
//! fail. The production adapter speaks the OpenAI-compatible chat
//! completions wire format, which also covers Ollama, vLLM, Together and
//! friends.

use async_trait::async_trait;
use serde_json::{json, Value};

use bait_domain::config::GenerationConfig;
use bait_domain::error::{Error, Result};
use bait_domain::Message;

/// A text-generation backend for the reply ladder's first tier.
#[async_trait]
pub trait ReplyProvider: Send + Sync {
    /// Produce the next utterance for the given window. Any error is
    /// swallowed by the caller and drops the ladder to the next tier.
    async fn complete(&self, system_prompt: &str, window: &[Message]) -> Result<String>;

    /// Identifier used in trace output.
    fn provider_id(&self) -> &str;
}

/// Adapter for any OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatProvider {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiCompatProvider {
    /// Build from config. Returns `None` when no endpoint is configured —
    /// the ladder then starts at the rule-based tier.
    pub fn from_config(cfg: &GenerationConfig) -> Result<Option<Self>> {
        let Some(base_url) = &cfg.base_url else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Some(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            model: cfg.model.clone(),
            api_key: std::env::var(&cfg.api_key_env).ok().filter(|k| !k.is_empty()),
            client,
        }))
    }

    fn wire_messages(system_prompt: &str, window: &[Message]) -> Vec<Value> {
        let mut messages = vec![json!({ "role": "system", "content": system_prompt })];
        for m in window {
            let role = if m.sender == "agent" { "assistant" } else { "user" };
            messages.push(json!({ "role": role, "content": m.text }));
        }
        messages
    }
}

#[async_trait]
impl ReplyProvider for OpenAiCompatProvider {
    async fn complete(&self, system_prompt: &str, window: &[Message]) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": Self::wire_messages(system_prompt, window),
            "max_tokens": 120,
            "temperature": 0.9,
        });

        let mut req = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(e.to_string())
            } else {
                Error::Http(e.to_string())
            }
        })?;

        let status = resp.status();
        let raw = resp.text().await.map_err(|e| Error::Http(e.to_string()))?;
        if !status.is_success() {
            return Err(Error::Provider {
                provider: self.provider_id().to_owned(),
                message: format!("{status}: {raw}"),
            });
        }

        let parsed: Value = serde_json::from_str(&raw)?;
        let content = parsed["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .trim()
            .to_owned();

        if content.is_empty() {
            return Err(Error::Provider {
                provider: self.provider_id().to_owned(),
                message: "empty completion".to_owned(),
            });
        }
        Ok(content)
    }

    fn provider_id(&self) -> &str {
        "openai-compat"
    }
}
