//! Outbound Graph API calls: text, attachment references, uploads, downloads.

use super::types::{GraphErrorResponse, UploadResponse};
use super::MessengerChannel;
use kora_core::error::KoraError;
use serde_json::{json, Value};
use tracing::debug;

impl MessengerChannel {
    /// Send one text message. The caller keeps it within the length limit.
    pub(super) async fn send_text(&self, recipient_id: &str, text: &str) -> Result<(), KoraError> {
        let body = json!({
            "recipient": { "id": recipient_id },
            "messaging_type": "RESPONSE",
            "message": { "text": text },
        });
        self.post_message(body).await
    }

    /// Send a message pointing at a previously uploaded attachment.
    pub(super) async fn send_attachment(
        &self,
        recipient_id: &str,
        attachment_id: &str,
    ) -> Result<(), KoraError> {
        let body = json!({
            "recipient": { "id": recipient_id },
            "messaging_type": "RESPONSE",
            "message": {
                "attachment": {
                    "type": "image",
                    "payload": { "attachment_id": attachment_id },
                }
            },
        });
        self.post_message(body).await
    }

    async fn post_message(&self, body: Value) -> Result<(), KoraError> {
        let url = format!("{}/me/messages", self.base_url);
        debug!("messenger: POST me/messages");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.page_access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| KoraError::Channel(format!("messenger send failed: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KoraError::Channel(format!(
                "messenger send returned {status}: {}",
                graph_error_message(&text)
            )));
        }
        Ok(())
    }

    /// Upload binary content and return its reusable attachment id.
    pub(super) async fn upload_attachment(
        &self,
        data: &[u8],
        mime_type: &str,
    ) -> Result<String, KoraError> {
        let url = format!("{}/me/message_attachments", self.base_url);
        let extension = mime_type.rsplit('/').next().unwrap_or("bin");

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(format!("upload.{extension}"))
            .mime_str(mime_type)
            .map_err(|e| KoraError::Upload(format!("mime error: {e}")))?;

        let message = json!({
            "attachment": {
                "type": "image",
                "payload": { "is_reusable": true },
            }
        });
        let form = reqwest::multipart::Form::new()
            .text("message", message.to_string())
            .part("filedata", part);

        debug!("messenger: uploading {} bytes ({mime_type})", data.len());

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.page_access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| KoraError::Upload(format!("messenger upload failed: {}", e.without_url())))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KoraError::Upload(format!(
                "messenger upload returned {status}: {}",
                graph_error_message(&text)
            )));
        }

        let parsed: UploadResponse = resp
            .json()
            .await
            .map_err(|e| KoraError::Upload(format!("upload response parse failed: {}", e.without_url())))?;

        parsed
            .attachment_id
            .ok_or_else(|| KoraError::Upload("upload response had no attachment_id".into()))
    }

    /// Download an inbound attachment from its CDN URL.
    pub(super) async fn download(&self, url: &str) -> Result<Vec<u8>, KoraError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| KoraError::Channel(format!("attachment download failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(KoraError::Channel(format!(
                "attachment download returned {}",
                resp.status()
            )));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| KoraError::Channel(format!("attachment read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// Pull the human-readable part out of a Graph API error body.
pub(super) fn graph_error_message(body: &str) -> String {
    match serde_json::from_str::<GraphErrorResponse>(body) {
        Ok(parsed) => format!("{} (code {})", parsed.error.message, parsed.error.code),
        Err(_) => body.to_string(),
    }
}
