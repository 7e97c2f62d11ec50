use std::fmt;
use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use super::retry::RetryPolicy;
use super::AssistantError;
use crate::config::AssistantConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral request: instructions, conversation and an optional JSON
/// schema the reply must follow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationRequest {
    pub system: Option<String>,
    pub turns: Vec<ChatTurn>,
    pub response_schema: Option<Value>,
}

/// Anything that turns a [`GenerationRequest`] into reply text.
pub trait GenerativeModel: Send + Sync {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, AssistantError>> + Send;
}

/// Stand-in used when no API key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredModel;

impl GenerativeModel for UnconfiguredModel {
    async fn generate(&self, _request: &GenerationRequest) -> Result<String, AssistantError> {
        Err(AssistantError::NotConfigured)
    }
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// reqwest errors quote the request URL; keep it out of anything shown or stored.
fn transport_error(err: reqwest::Error) -> AssistantError {
    AssistantError::Transport(err.without_url().to_string())
}

/// Client for the `generateContent` endpoint of the Gemini API.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    retry: RetryPolicy,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

impl GeminiClient {
    pub fn new(config: &AssistantConfig, api_key: String) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            retry: config.retry_policy(),
        })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    async fn send_once(&self, body: &GenerateContentRequest) -> Result<String, AssistantError> {
        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(%status, "generative service error");
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply: GenerateContentResponse = response
            .json()
            .await
            .map_err(|err| AssistantError::MalformedResponse(err.without_url().to_string()))?;
        reply.text().ok_or(AssistantError::EmptyResponse)
    }
}

impl GenerativeModel for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, AssistantError> {
        let body = GenerateContentRequest::from(request);
        debug!(model = %self.model, turns = request.turns.len(), "calling generative service");
        self.retry.run(|| self.send_once(&body)).await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

impl From<&GenerationRequest> for GenerateContentRequest {
    fn from(request: &GenerationRequest) -> Self {
        let text_part = |text: &str| Part {
            text: Some(text.to_string()),
        };

        Self {
            contents: request
                .turns
                .iter()
                .map(|turn| Content {
                    role: Some(
                        match turn.role {
                            ChatRole::User => "user",
                            ChatRole::Assistant => "model",
                        }
                        .to_string(),
                    ),
                    parts: vec![text_part(&turn.content)],
                })
                .collect(),
            system_instruction: request.system.as_deref().map(|system| Content {
                role: None,
                parts: vec![text_part(system)],
            }),
            generation_config: request.response_schema.clone().map(|schema| GenerationConfig {
                response_mime_type: "application/json",
                response_schema: schema,
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, parts concatenated.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_maps_roles_schema_and_system_instruction() {
        let request = GenerationRequest {
            system: Some("You screen resumes.".to_string()),
            turns: vec![
                ChatTurn::user("Hello"),
                ChatTurn {
                    role: ChatRole::Assistant,
                    content: "Hi".to_string(),
                },
            ],
            response_schema: Some(json!({ "type": "OBJECT" })),
        };

        let body = serde_json::to_value(GenerateContentRequest::from(&request)).expect("encodes");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You screen resumes.");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["systemInstruction"].get("role").is_none());
    }

    #[test]
    fn plain_requests_omit_generation_config() {
        let request = GenerationRequest {
            turns: vec![ChatTurn::user("Summarize this role")],
            ..GenerationRequest::default()
        };
        let body = serde_json::to_value(GenerateContentRequest::from(&request)).expect("encodes");
        assert!(body.get("generationConfig").is_none());
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn reply_text_joins_parts_of_first_candidate() {
        let reply: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .expect("decodes");
        assert_eq!(reply.text().as_deref(), Some("{\"a\":1}"));

        let empty: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [] })).expect("decodes");
        assert_eq!(empty.text(), None);
    }

    #[tokio::test]
    async fn transport_failures_never_expose_the_api_key() {
        let config = AssistantConfig {
            api_key: None,
            base_url: "http://127.0.0.1:1".to_string(),
            model: "gemini-2.0-flash".to_string(),
            max_attempts: 1,
            retry_base_ms: 0,
            timeout_secs: 5,
        };
        let client = GeminiClient::new(&config, "SECRET-KEY-123".to_string()).expect("builds");
        assert!(!format!("{client:?}").contains("SECRET-KEY-123"));

        let err = client
            .generate(&GenerationRequest {
                turns: vec![ChatTurn::user("Hello")],
                ..GenerationRequest::default()
            })
            .await
            .expect_err("nothing listens on port 1");

        match &err {
            AssistantError::Exhausted { last, .. } => {
                assert!(matches!(**last, AssistantError::Transport(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!err.to_string().contains("SECRET-KEY-123"));
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
        assert!(!err.user_message().contains("SECRET-KEY-123"));
        assert!(!err.user_message().contains("127.0.0.1"));
    }

    #[tokio::test]
    async fn unconfigured_model_refuses_every_call() {
        let err = UnconfiguredModel
            .generate(&GenerationRequest::default())
            .await
            .expect_err("no key");
        assert!(matches!(err, AssistantError::NotConfigured));
    }
}
