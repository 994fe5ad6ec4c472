//! `imagine`: image generation through an HTTP image API.

use async_trait::async_trait;
use kora_core::{
    error::KoraError,
    result::{HandlerResult, StructuredMessage},
    traits::CommandPlugin,
};
use std::time::Duration;
use tracing::{debug, warn};

/// Image generation plugin.
///
/// `url_template` contains a `{prompt}` placeholder that receives the
/// URL-encoded prompt; the response body is the image itself.
pub struct ImaginePlugin {
    client: reqwest::Client,
    url_template: String,
    prefix: String,
}

impl ImaginePlugin {
    pub fn new(url_template: &str, timeout: Duration, prefix: &str) -> Result<Self, KoraError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KoraError::Plugin(format!("imagine: failed to build client: {e}")))?;
        Ok(Self {
            client,
            url_template: url_template.to_string(),
            prefix: prefix.to_string(),
        })
    }

    fn failure(text: &str) -> HandlerResult {
        HandlerResult::List(vec![StructuredMessage::failure(text)])
    }
}

#[async_trait]
impl CommandPlugin for ImaginePlugin {
    fn name(&self) -> &str {
        "imagine"
    }

    fn description(&self) -> &str {
        "Generate an image from a description. Usage: imagine <prompt>"
    }

    async fn execute(&self, args: &str, sender_id: &str) -> Result<HandlerResult, KoraError> {
        let prompt = args.trim();
        if prompt.is_empty() {
            return Ok(Self::failure(&format!(
                "❌ Please provide a prompt. Usage: {}imagine <prompt>",
                self.prefix
            )));
        }

        let url = self
            .url_template
            .replace("{prompt}", &urlencoding::encode(prompt));
        debug!("imagine: generating for {sender_id}");

        let resp = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("imagine request failed: {e}");
                return Ok(Self::failure(
                    "🚨 The image service did not respond. Please try again later.",
                ));
            }
        };

        if !resp.status().is_success() {
            warn!("imagine API returned {}", resp.status());
            return Ok(Self::failure(
                "🚨 Failed to generate the image. Please try again later.",
            ));
        }

        let mime_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
            .unwrap_or_else(|| "image/jpeg".to_string());

        if !mime_type.starts_with("image/") {
            warn!("imagine API returned non-image content ({mime_type})");
            return Ok(Self::failure(
                "🚨 Failed to generate the image. Please try again later.",
            ));
        }

        let data = match resp.bytes().await {
            Ok(b) if !b.is_empty() => b.to_vec(),
            Ok(_) => {
                return Ok(Self::failure(
                    "🚨 Failed to generate the image. Please try again later.",
                ))
            }
            Err(e) => {
                warn!("imagine: failed to read image body: {e}");
                return Ok(Self::failure(
                    "🚨 The image service did not respond. Please try again later.",
                ));
            }
        };

        Ok(HandlerResult::List(vec![
            StructuredMessage::image(data, mime_type),
            StructuredMessage::text(format!("🎨 Here is your image: {prompt}")),
        ]))
    }
}
