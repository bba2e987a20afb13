//! Post-completion delivery back through the bot channel.
//!
//! All delivery is fire-and-forget: errors are logged but never propagate to
//! the caller, and a finished job's status is never reverted.  Small outputs
//! are sent directly as video; anything larger (or any direct-send failure)
//! falls back to a download link.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use reqwest::Client;

use vp_core::config::DeliveryConfig;
use vp_core::urls::download_url;
use vp_db::models::Job;

/// HTTP timeout for plain API calls (messages).
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP timeout for direct artifact uploads.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Manages artifact delivery to the messaging channel.
///
/// Holds a shared [`reqwest::Client`] so connection pools are reused across
/// calls. All public methods log outcomes but never return errors.
pub struct NotificationManager {
    client: Client,
    bot_token: Option<String>,
    base_url: String,
    direct_send_limit_bytes: i64,
}

impl NotificationManager {
    /// Create a new manager from delivery config.
    pub fn new(config: &DeliveryConfig) -> Self {
        let client = Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build delivery HTTP client: {e}");
                Client::new()
            });

        Self {
            client,
            bot_token: config.bot_token.clone(),
            base_url: config.base_url.clone(),
            direct_send_limit_bytes: (config.direct_send_limit_mb * 1024 * 1024) as i64,
        }
    }

    /// Deliver a finished job's artifact back to its chat.
    ///
    /// No-op for jobs without a `chat_id` or when no bot token is
    /// configured. This is fire-and-forget: errors are logged, not returned.
    pub async fn notify_job_done(&self, job: &Job, output_path: &Path) {
        let Some(ref token) = self.bot_token else {
            return;
        };
        let Some(ref chat_id) = job.chat_id else {
            return;
        };

        if job.output_bytes <= self.direct_send_limit_bytes {
            match self.send_video(token, chat_id, job, output_path).await {
                Ok(()) => {
                    tracing::info!(job_id = %job.id, "Delivered artifact directly");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        job_id = %job.id,
                        error = %e,
                        "Direct delivery failed; falling back to link"
                    );
                }
            }
        }

        let url = download_url(&self.base_url, job.id, &job.download_token);
        if let Err(e) = self.send_message(token, chat_id, &format!("Your video is ready: {url}")).await
        {
            tracing::warn!(job_id = %job.id, error = %e, "Link delivery failed");
        } else {
            tracing::info!(job_id = %job.id, "Delivered download link");
        }
    }

    /// Upload the artifact via the bot API's `sendVideo`.
    async fn send_video(
        &self,
        token: &str,
        chat_id: &str,
        job: &Job,
        output_path: &Path,
    ) -> vp_core::Result<()> {
        let bytes = tokio::fs::read(output_path).await?;
        let file_name = output_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| format!("{}.mp4", job.id));

        let form = multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("supports_streaming", "true")
            .text("caption", format!("Job {} complete.", job.id))
            .part(
                "video",
                multipart::Part::bytes(bytes)
                    .file_name(file_name)
                    .mime_str("video/mp4")
                    .map_err(|e| vp_core::Error::Delivery(e.to_string()))?,
            );

        let resp = self
            .client
            .post(format!("https://api.telegram.org/bot{token}/sendVideo"))
            .timeout(UPLOAD_TIMEOUT)
            .multipart(form)
            .send()
            .await
            .map_err(|e| vp_core::Error::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(vp_core::Error::Delivery(format!(
                "sendVideo returned {status}: {body}"
            )));
        }

        Ok(())
    }

    /// Send a plain text message via the bot API.
    async fn send_message(&self, token: &str, chat_id: &str, text: &str) -> vp_core::Result<()> {
        let resp = self
            .client
            .post(format!("https://api.telegram.org/bot{token}/sendMessage"))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| vp_core::Error::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(vp_core::Error::Delivery(format!(
                "sendMessage returned {status}"
            )));
        }

        Ok(())
    }
}
