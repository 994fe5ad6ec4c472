//! Google Gemini API provider.
//!
//! Calls the Gemini `generateContent` endpoint for both chat turns and
//! one-shot image analysis. Auth via the `x-goog-api-key` header; the key
//! never appears in URLs, so transport errors are safe to log.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use kora_core::{
    config::GeminiConfig,
    context::{ApiMessage, Completion, Context},
    error::KoraError,
    traits::Provider,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini API provider.
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    /// Create from config values.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, KoraError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KoraError::Provider(format!("gemini: failed to build client: {e}")))?;
        Ok(Self {
            client,
            base_url: GEMINI_BASE_URL.to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    /// Point the provider at a different API root (local proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn generate(&self, model: &str, body: &GeminiRequest) -> Result<String, KoraError> {
        let url = format!("{}/models/{model}:generateContent", self.base_url);
        debug!("gemini: POST models/{model}:generateContent");

        let resp = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                KoraError::Provider(format!("gemini request failed: {}", e.without_url()))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KoraError::Provider(format!(
                "gemini returned {status}: {text}"
            )));
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|e| {
                KoraError::Provider(format!(
                    "gemini: failed to parse response: {}",
                    e.without_url()
                ))
            })?;

        parsed
            .first_text()
            .ok_or_else(|| KoraError::Provider("gemini: response had no text".into()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        inline_data: GeminiBlob,
    },
}

#[derive(Serialize, Deserialize)]
struct GeminiBlob {
    mime_type: String,
    data: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

impl GeminiResponse {
    fn first_text(&self) -> Option<String> {
        self.candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|p| match p {
                GeminiPart::Text { text } if !text.trim().is_empty() => Some(text.clone()),
                _ => None,
            })
    }
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

fn text_part(text: impl Into<String>) -> GeminiPart {
    GeminiPart::Text { text: text.into() }
}

fn to_contents(messages: &[ApiMessage]) -> Vec<GeminiContent> {
    messages
        .iter()
        .map(|m| {
            let role = if m.role == "assistant" {
                "model"
            } else {
                "user"
            };
            GeminiContent {
                role: Some(role.to_string()),
                parts: vec![text_part(m.content.clone())],
            }
        })
        .collect()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, context: &Context) -> Result<Completion, KoraError> {
        let (system, api_messages) = context.to_api_messages();
        let effective_model = context.model.as_deref().unwrap_or(&self.model);
        let start = Instant::now();

        let system_instruction = if system.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![text_part(system)],
            })
        };

        let body = GeminiRequest {
            contents: to_contents(&api_messages),
            system_instruction,
        };
        let text = self.generate(effective_model, &body).await?;

        Ok(Completion {
            text,
            provider_used: "gemini".to_string(),
            tokens_used: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
            model: Some(effective_model.to_string()),
        })
    }

    async fn analyze_image(
        &self,
        image: &[u8],
        mime_type: &str,
        prompt: &str,
    ) -> Result<Completion, KoraError> {
        let start = Instant::now();
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![
                    text_part(prompt),
                    GeminiPart::InlineData {
                        inline_data: GeminiBlob {
                            mime_type: mime_type.to_string(),
                            data: BASE64.encode(image),
                        },
                    },
                ],
            }],
            system_instruction: None,
        };
        let text = self.generate(&self.model, &body).await?;

        Ok(Completion {
            text,
            provider_used: "gemini".to_string(),
            tokens_used: None,
            processing_time_ms: start.elapsed().as_millis() as u64,
            model: Some(self.model.clone()),
        })
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("gemini: no API key configured");
            return false;
        }
        let url = format!("{}/models", self.base_url);
        match self
            .client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!("gemini not available: {}", e.without_url());
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Json,
        http::{HeaderMap, StatusCode, Uri},
        routing::post,
        Router,
    };
    use kora_core::context::ContextEntry;

    fn test_config() -> GeminiConfig {
        GeminiConfig {
            api_key: "AIza-test".into(),
            model: "gemini-1.5-flash".into(),
            timeout_secs: 5,
        }
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn_server(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn test_gemini_provider_name() {
        let p = GeminiProvider::from_config(&test_config()).unwrap();
        assert_eq!(p.name(), "gemini");
    }

    #[test]
    fn test_gemini_request_serialization() {
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".into()),
                parts: vec![text_part("Hello")],
            }],
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![text_part("Be helpful.")],
            }),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("systemInstruction").is_some());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "Hello");
    }

    #[test]
    fn test_inline_data_serialization() {
        let part = GeminiPart::InlineData {
            inline_data: GeminiBlob {
                mime_type: "image/jpeg".into(),
                data: BASE64.encode([0xff, 0xd8]),
            },
        };
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(json["inline_data"]["data"], "/9g=");
    }

    #[test]
    fn test_gemini_role_mapping() {
        let ctx = Context {
            system_prompt: String::new(),
            history: vec![ContextEntry::user("Hi"), ContextEntry::assistant("Hello!")],
            current_message: "More".into(),
            model: None,
        };
        let (_, api_msgs) = ctx.to_api_messages();
        let contents = to_contents(&api_msgs);
        assert_eq!(contents[0].role, Some("user".into()));
        assert_eq!(contents[1].role, Some("model".into()));
        assert_eq!(contents[2].role, Some("user".into()));
    }

    #[test]
    fn test_gemini_response_parsing() {
        let json = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hi there!"}]}}],"usageMetadata":{"totalTokenCount":25}}"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.first_text(), Some("Hi there!".into()));
    }

    #[test]
    fn test_gemini_response_without_text() {
        let resp: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(resp.first_text().is_none());
        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.first_text().is_none());
    }

    #[tokio::test]
    async fn test_complete_against_local_server() {
        let router = Router::new().route(
            "/models/{action}",
            post(|Json(body): Json<serde_json::Value>| async move {
                // Echo the system instruction back so the request shape is checked.
                let system = body["systemInstruction"]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let turns = body["contents"].as_array().map(Vec::len).unwrap_or(0);
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": format!("{system}|{turns}")}]}}]
                }))
            }),
        );
        let base = spawn_server(router).await;
        let provider = GeminiProvider::from_config(&test_config())
            .unwrap()
            .with_base_url(base);

        let ctx = Context {
            system_prompt: "persona".into(),
            history: vec![ContextEntry::user("Hi"), ContextEntry::assistant("Hello!")],
            current_message: "What's up?".into(),
            model: None,
        };
        let completion = provider.complete(&ctx).await.unwrap();
        assert_eq!(completion.text, "persona|3");
        assert_eq!(completion.provider_used, "gemini");
        assert_eq!(completion.model.as_deref(), Some("gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_error_status_is_provider_error() {
        let router = Router::new().route(
            "/models/{action}",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
        );
        let base = spawn_server(router).await;
        let provider = GeminiProvider::from_config(&test_config())
            .unwrap()
            .with_base_url(base);

        let err = provider
            .analyze_image(b"jpeg", "image/jpeg", "describe")
            .await
            .unwrap_err();
        match err {
            KoraError::Provider(msg) => assert!(msg.contains("429")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_api_key_sent_as_header_not_query() {
        let router = Router::new().route(
            "/models/{action}",
            post(|headers: HeaderMap, uri: Uri| async move {
                let key = headers
                    .get(API_KEY_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                let query = uri.query().unwrap_or_default().to_string();
                Json(serde_json::json!({
                    "candidates": [{"content": {"parts": [{"text": format!("{key}|{query}")}]}}]
                }))
            }),
        );
        let base = spawn_server(router).await;
        let provider = GeminiProvider::from_config(&test_config())
            .unwrap()
            .with_base_url(base);

        let completion = provider.complete(&Context::new("hi")).await.unwrap();
        assert_eq!(completion.text, "AIza-test|");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_expose_api_key() {
        let config = GeminiConfig {
            api_key: "SECRET-KEY-123".into(),
            ..test_config()
        };
        // Nothing listens on port 1.
        let provider = GeminiProvider::from_config(&config)
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let err = provider.complete(&Context::new("hello")).await.unwrap_err();
        let text = err.to_string();
        assert!(text.contains("gemini request failed"), "{text}");
        assert!(!text.contains("SECRET-KEY-123"), "{text}");
        assert!(!provider.is_available().await);
    }
}
