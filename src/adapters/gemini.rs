use crate::domain::model::AudioClip;
use crate::domain::ports::InferenceProvider;
use crate::utils::error::{Result, TrainerError};
use crate::utils::retry::{with_retry, RetryPolicy};
use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Debug)]
pub struct GeminiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: SecretString,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl GeminiConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key,
            timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData { inline_data: Blob },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Gemini `generateContent` REST 呼叫
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self> {
        if config.api_key.expose_secret().trim().is_empty() {
            return Err(TrainerError::MissingConfigError {
                field: "provider.api_key".to_string(),
            });
        }

        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn send_once(&self, body: &GenerateContentRequest<'_>, attempt: u32) -> Result<String> {
        let url = self.url();
        tracing::debug!("Making inference request to: {} (attempt {})", url, attempt);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        tracing::debug!("Inference response status: {}", status);

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&raw)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| raw.trim().to_string());
            return Err(TrainerError::InferenceError {
                message: format!("{} {}", status, detail),
                status: Some(status.as_u16()),
                transient: status.as_u16() == 429 || status.is_server_error(),
            });
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            TrainerError::inference(format!("malformed reply from provider: {}", e))
        })?;
        extract_text(parsed)
    }
}

fn transport_error(e: reqwest::Error) -> TrainerError {
    TrainerError::InferenceError {
        message: e.to_string(),
        status: None,
        transient: e.is_timeout() || e.is_connect(),
    }
}

fn extract_text(reply: GenerateContentResponse) -> Result<String> {
    let Some(candidate) = reply.candidates.into_iter().next() else {
        let reason = reply
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(TrainerError::inference(format!(
            "provider returned no verdict ({})",
            reason
        )));
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(TrainerError::inference(format!(
            "provider returned an empty verdict (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }

    Ok(text)
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    fn model_id(&self) -> &str {
        &self.config.model
    }

    async fn evaluate(&self, prompt: &str, audio: Option<&AudioClip>) -> Result<String> {
        let mut parts = vec![Part::Text { text: prompt }];
        if let Some(clip) = audio {
            parts.push(Part::InlineData {
                inline_data: Blob {
                    mime_type: clip.encoding.mime_type(),
                    data: base64::engine::general_purpose::STANDARD.encode(&clip.bytes),
                },
            });
        }
        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
        };

        let body = &body;
        with_retry(self.config.retry, "inference request", move |attempt| {
            self.send_once(body, attempt)
        })
        .await
    }
}
