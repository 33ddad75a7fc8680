use crate::config::Settings;
use crate::llm::error::StrategyError;
use crate::llm::{CompletionRequest, Provider, TextGenerationClient};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const RESPONSE_MIME_JSON: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_api_key()?.to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self::new(api_key, model, base_url, Duration::from_secs(timeout_secs))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn headers(&self) -> Result<HeaderMap, StrategyError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key).map_err(|e| {
            StrategyError::transport(Provider::Gemini, "request", format!("invalid API key header: {e}"))
        })?;
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    async fn generate_content(
        &self,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, StrategyError> {
        let res = self
            .http
            .post(self.url())
            .headers(self.headers()?)
            .json(req)
            .send()
            .await
            .map_err(|e| {
                StrategyError::transport(Provider::Gemini, "send", format!("Gemini request failed: {e}"))
            })?;

        let status = res.status();
        let text = res.text().await.map_err(|e| {
            StrategyError::transport(
                Provider::Gemini,
                "read",
                format!("failed to read Gemini response body: {e}"),
            )
        })?;

        if !status.is_success() {
            return Err(StrategyError::Transport {
                provider: Provider::Gemini,
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            });
        }

        serde_json::from_str::<GenerateContentResponse>(&text).map_err(|e| {
            StrategyError::Transport {
                provider: Provider::Gemini,
                stage: "decode",
                detail: format!("failed to decode Gemini response envelope: {e}"),
                raw_output: Some(text),
            }
        })
    }

    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let content = candidate.content.as_ref()?;

        let mut out = String::new();
        for part in &content.parts {
            if part.thought {
                continue;
            }
            if let Some(text) = part.text.as_deref() {
                out.push_str(text);
            }
        }

        if out.is_empty() {
            None
        } else {
            Some(out)
        }
    }
}

#[async_trait::async_trait]
impl TextGenerationClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn complete(&self, req: CompletionRequest) -> Result<Option<String>, StrategyError> {
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: req.prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: RESPONSE_MIME_JSON,
                response_schema: req.response_schema,
            },
        };

        let res = self.generate_content(&body).await?;

        if let Some(candidate) = res.candidates.first() {
            tracing::debug!(
                model = %self.model,
                finish_reason = candidate.finish_reason.as_deref().unwrap_or("unknown"),
                "Gemini generateContent returned"
            );
        } else {
            tracing::warn!(
                model = %self.model,
                block_reason = res
                    .prompt_feedback
                    .as_ref()
                    .and_then(|f| f.block_reason.as_deref())
                    .unwrap_or("none"),
                "Gemini returned no candidates"
            );
        }

        Ok(Self::response_text(&res))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,

    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,

    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,

    // Thinking models emit reasoning parts flagged with `thought: true`.
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-test";
    const GENERATE_PATH: &str = "/v1beta/models/gemini-test:generateContent";

    fn client_for(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", MODEL, server.uri(), Duration::from_secs(5)).unwrap()
    }

    fn completion_request() -> CompletionRequest {
        CompletionRequest {
            prompt: "strategy for Acme HVAC".to_string(),
            response_schema: json!({"type": "OBJECT"}),
        }
    }

    #[tokio::test]
    async fn sends_prompt_and_schema_and_returns_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_partial_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "strategy for Acme HVAC"}]}],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "{\"a\":"}, {"text": "1}"}]},
                    "finishReason": "STOP"
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let text = client_for(&server)
            .complete(completion_request())
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("{\"a\":1}"));
    }

    #[tokio::test]
    async fn skips_thought_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"parts": [
                        {"text": "thinking about furnaces", "thought": true},
                        {"text": "{}"}
                    ]}
                }]
            })))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .complete(completion_request())
            .await
            .unwrap();
        assert_eq!(text.as_deref(), Some("{}"));
    }

    #[tokio::test]
    async fn no_candidates_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let text = client_for(&server)
            .complete(completion_request())
            .await
            .unwrap();
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(
                ResponseTemplate::new(429)
                    .set_body_json(json!({"error": {"code": 429, "status": "RESOURCE_EXHAUSTED"}})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(completion_request())
            .await
            .unwrap_err();
        match err {
            StrategyError::Transport {
                stage, raw_output, ..
            } => {
                assert_eq!(stage, "http");
                assert!(raw_output.unwrap().contains("RESOURCE_EXHAUSTED"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn undecodable_envelope_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(GENERATE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete(completion_request())
            .await
            .unwrap_err();
        assert!(matches!(err, StrategyError::Transport { stage: "decode", .. }));
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let uri = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = GeminiClient::new("test-key", MODEL, uri, Duration::from_secs(2)).unwrap();
        let err = client.complete(completion_request()).await.unwrap_err();
        assert!(matches!(err, StrategyError::Transport { stage: "send", .. }));
    }

    #[test]
    fn url_joins_base_and_model() {
        let client =
            GeminiClient::new("k", "gemini-x", "https://example.test/", Duration::from_secs(1))
                .unwrap();
        assert_eq!(
            client.url(),
            "https://example.test/v1beta/models/gemini-x:generateContent"
        );
    }
}
