#[cfg(test)]
#[path = "farm_api_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::future;
use futures::stream::TryStreamExt;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatRequest;
use crate::domain::models::Language;
use crate::domain::models::Session;
use crate::domain::models::SessionTranscript;

/// Client for the farm assistant server: chat, speech and history.
pub struct FarmApi {
    url: String,
    timeout: String,
}

impl Default for FarmApi {
    fn default() -> FarmApi {
        return FarmApi {
            url: Config::get(ConfigKey::BackendUrl)
                .trim_end_matches('/')
                .to_string(),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for FarmApi {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        let res = match res {
            Ok(res) => res,
            Err(err) => {
                tracing::error!(error = ?err, "Farm assistant server is not running");
                bail!("Farm assistant server is not running");
            }
        };

        if res.status().is_server_error() {
            tracing::error!(
                status = res.status().as_u16(),
                "Farm assistant health check failed"
            );
            bail!("Farm assistant health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply> {
        let res = reqwest::Client::new()
            .post(format!("{url}/chat", url = self.url))
            .json(request)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make chat request to the farm assistant"
            );
            bail!("Failed to make chat request to the farm assistant");
        }

        let reply = res.json::<ChatReply>().await?;
        tracing::debug!(body = ?reply, "Chat response");

        return Ok(reply);
    }

    #[allow(clippy::implicit_return)]
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>> {
        let lang = language.to_string();
        let res = reqwest::Client::new()
            .get(format!("{url}/chat/tts", url = self.url))
            .query(&[("text", text), ("lang", lang.as_str())])
            .send()
            .await?;

        if !res.status().is_success() {
            bail!(format!(
                "Speech request failed with status {}",
                res.status().as_u16()
            ));
        }

        // Failures inside the speech service still answer 200, with a JSON body.
        let content_type = res
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|e| return e.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("audio/") {
            bail!(format!(
                "Speech request returned {content_type} instead of audio"
            ));
        }

        let audio = res
            .bytes_stream()
            .try_fold(Vec::<u8>::new(), |mut acc, chunk| {
                acc.extend_from_slice(&chunk);
                return future::ok(acc);
            })
            .await?;
        if audio.is_empty() {
            bail!("Speech request returned no audio");
        }
        tracing::debug!(bytes = audio.len(), "Received speech audio");

        return Ok(audio);
    }

    #[allow(clippy::implicit_return)]
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<Session>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/chat/history", url = self.url))
            .query(&[("userId", user_id)])
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to fetch chat history"
            );
            bail!("Failed to fetch chat history");
        }

        return Ok(res.json::<Vec<Session>>().await?);
    }

    #[allow(clippy::implicit_return)]
    async fn load_session(&self, session_id: &str) -> Result<SessionTranscript> {
        let res = reqwest::Client::new()
            .get(format!(
                "{url}/chat/history/{session_id}",
                url = self.url
            ))
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                session_id,
                "Failed to load chat session"
            );
            bail!("Failed to load chat session");
        }

        return Ok(res.json::<SessionTranscript>().await?);
    }
}
