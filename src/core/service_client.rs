// src/core/service_client.rs
//! HTTP client for the chat-completion style text generation service

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use crate::core::config_manager::GenerationConfig;
use crate::core::kv_store::KeyValueStore;
use crate::error::SkillsError;
use crate::skills::generation::{CompletionPrompt, SkillGenerator};

const CHAT_COMPLETIONS_ENDPOINT: &str = "/chat/completions";

/// Settings key holding the user's generation credential
pub const API_KEY_SETTING: &str = "openai_api_key";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    fallback_api_key: Option<String>,
    settings: Arc<dyn KeyValueStore>,
}

impl ServiceClient {
    pub fn new(config: &GenerationConfig, settings: Arc<dyn KeyValueStore>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            fallback_api_key: config.api_key.clone(),
            settings,
        })
    }

    /// Credential from settings storage first, then from configuration
    fn api_key(&self) -> Result<String, SkillsError> {
        let stored = self
            .settings
            .get(API_KEY_SETTING)
            .map_err(|e| SkillsError::Configuration(format!("cannot read settings: {}", e)))?;

        stored
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.fallback_api_key.clone())
            .ok_or_else(|| {
                SkillsError::Configuration("no generation API key configured".to_string())
            })
    }
}

/// Map a non-success status to the error taxonomy
pub fn classify_status(status: StatusCode, body: &str) -> SkillsError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SkillsError::Unauthorized,
        StatusCode::TOO_MANY_REQUESTS => SkillsError::RateLimited,
        other => SkillsError::Service {
            status: Some(other.as_u16()),
            message: body.chars().take(500).collect(),
        },
    }
}

fn extract_content(body: &str) -> Result<String, SkillsError> {
    let response: ChatResponse =
        serde_json::from_str(body).map_err(|e| SkillsError::MalformedOutput {
            raw: body.to_string(),
            reason: format!("unexpected completion envelope: {}", e),
        })?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| SkillsError::MalformedOutput {
            raw: body.to_string(),
            reason: "completion has no message content".to_string(),
        })
}

#[async_trait]
impl SkillGenerator for ServiceClient {
    async fn complete(&self, prompt: &CompletionPrompt) -> Result<String, SkillsError> {
        let api_key = self.api_key()?;
        let url = format!("{}{}", self.base_url, CHAT_COMPLETIONS_ENDPOINT);

        let request = ChatRequest {
            model: &prompt.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: 0.7,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        info!("Calling generation service: {} (model {})", url, prompt.model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SkillsError::Service {
                status: None,
                message: format!("request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SkillsError::Service {
            status: Some(status.as_u16()),
            message: format!("failed to read response body: {}", e),
        })?;

        debug!("Generation service status: {}", status);

        if !status.is_success() {
            error!("Generation service error {}: {}", status, body);
            return Err(classify_status(status, &body));
        }

        extract_content(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::kv_store::MemoryKeyValueStore;

    fn client_with(settings_key: Option<&str>, fallback: Option<&str>) -> ServiceClient {
        let settings = Arc::new(MemoryKeyValueStore::new());
        if let Some(key) = settings_key {
            settings.set(API_KEY_SETTING, key).unwrap();
        }
        let config = GenerationConfig {
            api_key: fallback.map(str::to_string),
            ..GenerationConfig::default()
        };
        ServiceClient::new(&config, settings).unwrap()
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED, ""),
            SkillsError::Unauthorized
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            SkillsError::RateLimited
        ));
        match classify_status(StatusCode::BAD_GATEWAY, "upstream") {
            SkillsError::Service { status, message } => {
                assert_eq!(status, Some(502));
                assert_eq!(message, "upstream");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_extract_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"skills\":[]}"}}]}"#;
        assert_eq!(extract_content(body).unwrap(), r#"{"skills":[]}"#);

        let empty = r#"{"choices":[]}"#;
        assert!(matches!(
            extract_content(empty),
            Err(SkillsError::MalformedOutput { .. })
        ));
    }

    #[test]
    fn test_api_key_precedence() {
        assert_eq!(client_with(Some("sk-user"), Some("sk-env")).api_key().unwrap(), "sk-user");
        assert_eq!(client_with(Some("  "), Some("sk-env")).api_key().unwrap(), "sk-env");
        assert!(matches!(
            client_with(None, None).api_key(),
            Err(SkillsError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        let client = client_with(None, None);
        let prompt = CompletionPrompt {
            model: "gpt-4o-mini".to_string(),
            system: "sys".to_string(),
            user: "user".to_string(),
        };
        assert!(matches!(
            client.complete(&prompt).await,
            Err(SkillsError::Configuration(_))
        ));
    }
}
