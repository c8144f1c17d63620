//! Gemini `generateContent` client.

use crate::domain::ports::{ConfigProvider, LlmClient, LlmResponse};
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<GeminiPromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiPromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u32>,
}

pub struct GeminiClient {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    fallback_model: Option<String>,
}

impl GeminiClient {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
            fallback_model: None,
        })
    }

    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn from_config<C: ConfigProvider>(config: &C) -> Result<Self> {
        let api_key = config
            .api_key()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| EtlError::MissingConfigError {
                field: "GOOGLE_API_KEY".to_string(),
            })?;

        let client = Self::new(
            config.api_base(),
            api_key,
            config.model(),
            config.request_timeout(),
        )?;

        Ok(match config.fallback_model() {
            Some(fallback) if fallback != config.model() => client.with_fallback_model(fallback),
            _ => client,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        // 接受 "models/gemini-2.5-pro" 與 "gemini-2.5-pro" 兩種寫法
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:generateContent", self.api_base, model)
    }

    async fn generate_with(&self, model: &str, prompt: &str) -> Result<LlmResponse> {
        let start = Instant::now();
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json"
            }
        });

        tracing::debug!("POST {} ({} prompt chars)", self.endpoint(model), prompt.len());
        let resp = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(EtlError::LlmError {
                status: status.as_u16(),
                message,
            });
        }

        let api_resp: GeminiResponse = resp.json().await?;

        if let Some(usage) = &api_resp.usage_metadata {
            tracing::debug!(
                "Token usage - prompt: {}, response: {}",
                usage.prompt_token_count.unwrap_or(0),
                usage.candidates_token_count.unwrap_or(0)
            );
        }

        let Some(candidate) = api_resp.candidates.as_ref().and_then(|c| c.first()) else {
            let reason = api_resp
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(EtlError::LlmError {
                status: status.as_u16(),
                message: format!("prompt blocked: {}", reason),
            });
        };

        let text: String = candidate
            .content
            .iter()
            .flat_map(|content| content.parts.iter())
            .filter_map(|part| part.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            tracing::warn!(
                "{} returned no text (finish reason: {})",
                model,
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            );
            return Err(EtlError::EmptyResponse {
                model: model.to_string(),
            });
        }

        tracing::info!(
            "🤖 {} responded with {} chars in {:?}",
            model,
            text.len(),
            start.elapsed()
        );

        Ok(LlmResponse {
            model: model.to_string(),
            text,
        })
    }
}

/// 只有請求沒送達或 HTTP 非 2xx 才換備援模型（2xx 的回應一律視為最終結果）
fn should_fall_back(err: &EtlError) -> bool {
    match err {
        EtlError::ApiError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
        EtlError::LlmError { status, .. } => !(200..300).contains(status),
        _ => false,
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_json(&self, prompt: &str) -> Result<LlmResponse> {
        match self.generate_with(&self.model, prompt).await {
            Err(e) if should_fall_back(&e) => {
                let Some(fallback) = &self.fallback_model else {
                    return Err(e);
                };
                tracing::warn!("{} failed ({}), falling back to {}", self.model, e, fallback);
                self.generate_with(fallback, prompt).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(server.base_url(), "test-key", "gemini-2.5-pro", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_generate_json_concatenates_parts() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/models/gemini-2.5-pro:generateContent")
                .header("x-goog-api-key", "test-key")
                .json_body_partial(r#"{"generationConfig": {"responseMimeType": "application/json"}}"#);
            then.status(200).json_body(serde_json::json!({
                "candidates": [{
                    "content": {"parts": [{"text": "{\"extraction\": "}, {"text": "[]}"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 10, "candidatesTokenCount": 4}
            }));
        });

        let resp = client(&server).generate_json("prompt").await.unwrap();

        api_mock.assert();
        assert_eq!(resp.model, "gemini-2.5-pro");
        assert_eq!(resp.text, "{\"extraction\": []}");
    }

    #[tokio::test]
    async fn test_model_prefix_is_accepted() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            }));
        });

        let client = GeminiClient::new(
            server.base_url(),
            "k",
            "models/gemini-2.5-flash",
            Duration::from_secs(5),
        )
        .unwrap();
        client.generate_json("p").await.unwrap();
        api_mock.assert();
    }

    #[tokio::test]
    async fn test_falls_back_when_primary_fails() {
        let server = MockServer::start();
        let primary = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(503).body("overloaded");
        });
        let fallback = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{\"ok\": true}"}]}}]
            }));
        });

        let client = client(&server).with_fallback_model("gemini-2.5-flash");
        let resp = client.generate_json("prompt").await.unwrap();

        primary.assert();
        fallback.assert();
        assert_eq!(resp.model, "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_error_status_without_fallback() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(403).body("API key not valid");
        });

        let err = client(&server).generate_json("prompt").await.unwrap_err();
        match err {
            EtlError::LlmError { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("API key not valid"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt_reports_reason() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(200)
                .json_body(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        });

        let err = client(&server).generate_json("prompt").await.unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_empty_text_is_an_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]
            }));
        });

        let err = client(&server).generate_json("prompt").await.unwrap_err();
        assert!(matches!(err, EtlError::EmptyResponse { model } if model == "gemini-2.5-pro"));
    }

    #[tokio::test]
    async fn test_blocked_prompt_does_not_fall_back() {
        let server = MockServer::start();
        let primary = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(200)
                .json_body(serde_json::json!({"promptFeedback": {"blockReason": "SAFETY"}}));
        });
        let fallback = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            }));
        });

        let client = client(&server).with_fallback_model("gemini-2.5-flash");
        let err = client.generate_json("prompt").await.unwrap_err();

        primary.assert();
        fallback.assert_hits(0);
        assert!(matches!(&err, EtlError::LlmError { status: 200, .. }));
        assert!(err.to_string().contains("SAFETY"));
    }

    #[tokio::test]
    async fn test_undecodable_success_body_does_not_fall_back() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(200)
                .header("content-type", "application/json")
                .body("<html>not json</html>");
        });
        let fallback = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            }));
        });

        let client = client(&server).with_fallback_model("gemini-2.5-flash");
        let err = client.generate_json("prompt").await.unwrap_err();

        fallback.assert_hits(0);
        assert!(matches!(err, EtlError::ApiError(ref e) if e.is_decode()));
    }

    #[tokio::test]
    async fn test_empty_text_does_not_fall_back() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-pro:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]
            }));
        });
        let fallback = server.mock(|when, then| {
            when.method(POST).path("/models/gemini-2.5-flash:generateContent");
            then.status(200).json_body(serde_json::json!({
                "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
            }));
        });

        let client = client(&server).with_fallback_model("gemini-2.5-flash");
        let err = client.generate_json("prompt").await.unwrap_err();

        fallback.assert_hits(0);
        assert!(matches!(err, EtlError::EmptyResponse { .. }));
    }

    #[tokio::test]
    async fn test_fallback_only_for_transport_and_status_errors() {
        let llm_error = |status| EtlError::LlmError {
            status,
            message: String::new(),
        };
        assert!(should_fall_back(&llm_error(503)));
        assert!(should_fall_back(&llm_error(404)));
        assert!(!should_fall_back(&llm_error(200)));
        assert!(!should_fall_back(&EtlError::EmptyResponse {
            model: "gemini-2.5-pro".to_string(),
        }));

        let refused = Client::new()
            .post("http://127.0.0.1:1/models/x:generateContent")
            .send()
            .await
            .unwrap_err();
        assert!(should_fall_back(&EtlError::ApiError(refused)));
    }
}
