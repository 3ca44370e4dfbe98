//! Optional LLM review summary through an OpenAI-compatible chat endpoint.
//!
//! Used only for the `reviews` digest. Callers treat every error as soft and
//! fall back to [`crate::summary::digest_reviews`].

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::config::RemoteSummaryConfig;
use crate::error::SetupError;
use crate::model::ScoredReview;

const MAX_PROMPT_CHARS: usize = 12_000;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

pub struct RemoteSummarizer {
    client: reqwest::Client,
    config: RemoteSummaryConfig,
}

impl RemoteSummarizer {
    pub fn new(config: RemoteSummaryConfig) -> Result<Self, SetupError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    pub async fn summarize(&self, reviews: &[ScoredReview]) -> Result<String> {
        let joined = reviews
            .iter()
            .map(ScoredReview::text)
            .collect::<Vec<_>>()
            .join(" ");
        let reviews_text: String = joined.chars().take(MAX_PROMPT_CHARS).collect();

        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {
                    "role": "system",
                    "content": "Create a concise summary of product reviews."
                },
                {
                    "role": "user",
                    "content": format!(
                        "Create a short summary (around 100 words) for these reviews: {}. Start directly with the summary, without any introductory filler.",
                        reviews_text
                    )
                }
            ]
        });

        let resp = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .context("summary request failed")?
            .error_for_status()
            .context("summary endpoint returned an error status")?;

        let parsed: ChatResponse = resp.json().await.context("decoding summary response")?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| anyhow!("summary response had no content"))?;

        debug!("Remote summary received ({} chars)", content.len());
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawReview;
    use httpmock::prelude::*;

    fn summarizer(server: &MockServer) -> RemoteSummarizer {
        let mut config = RemoteSummaryConfig::new("test-key");
        config.api_url = server.url("/v1/chat/completions");
        RemoteSummarizer::new(config).unwrap()
    }

    fn reviews() -> Vec<ScoredReview> {
        vec![ScoredReview::new(RawReview::new("Battery lasts two days", None), 0.4)]
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .body_contains("Battery lasts two days");
                then.status(200).json_body(serde_json::json!({
                    "choices": [{
                        "message": {
                            "role": "assistant",
                            "content": "  Buyers praise the battery.  "
                        }
                    }]
                }));
            })
            .await;

        let summary = summarizer(&server).summarize(&reviews()).await.unwrap();
        assert_eq!(summary, "Buyers praise the battery.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn error_status_and_empty_content_fail() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(401);
            })
            .await;
        assert!(summarizer(&server).summarize(&reviews()).await.is_err());

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(serde_json::json!({ "choices": [] }));
            })
            .await;
        assert!(summarizer(&server).summarize(&reviews()).await.is_err());
    }
}
