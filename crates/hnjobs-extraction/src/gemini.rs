//! Gemini `generateContent` implementation of [`JobExtractor`].

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use hnjobs_core::config::ExtractionConfig;
use hnjobs_core::types::CommentId;
use hnjobs_entity::posting::JobPosting;

use crate::error::{ExtractionError, ExtractionResult, classify};
use crate::extractor::{JobExtractor, assign_ids, validate_batch};
use crate::prompt::{SYSTEM_INSTRUCTION, build_user_prompt};
use crate::schema::response_schema;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Extraction client for Google's Gemini models.
#[derive(Debug, Clone)]
pub struct GeminiExtractor {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    temperature: f32,
    max_batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

impl Content {
    fn text(role: Option<&str>, text: String) -> Self {
        Self {
            role: role.map(str::to_string),
            parts: vec![Part { text: Some(text) }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiExtractor {
    /// Build an extractor from configuration. An empty API key is rejected.
    pub fn new(config: &ExtractionConfig) -> ExtractionResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(ExtractionError::Configuration(
                "extraction.api_key is not set".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ExtractionError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
            max_batch: config.batch_limit(),
        })
    }

    /// Full `generateContent` URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_request(&self, inputs: &BTreeMap<CommentId, String>) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content::text(None, SYSTEM_INSTRUCTION.to_string()),
            contents: vec![Content::text(Some("user"), build_user_prompt(inputs))],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        }
    }
}

#[async_trait]
impl JobExtractor for GeminiExtractor {
    async fn parse_job_postings(
        &self,
        inputs: &BTreeMap<CommentId, String>,
    ) -> ExtractionResult<Vec<JobPosting>> {
        validate_batch(inputs, self.max_batch)?;

        let request = self.build_request(inputs);
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = api_error_message(&body);
            warn!(status = status.as_u16(), message = %message, "Extraction request failed");
            return Err(classify(Some(status.as_u16()), &message));
        }

        let text = response_text(&body)?;
        let postings = parse_postings(&text)?;
        let postings = assign_ids(postings, inputs);

        debug!(
            inputs = inputs.len(),
            postings = postings.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Extraction request completed"
        );

        Ok(postings)
    }
}

fn transport_error(err: reqwest::Error) -> ExtractionError {
    let message = err.to_string();
    match classify(err.status().map(|s| s.as_u16()), &message) {
        ExtractionError::Api { .. } => ExtractionError::Network(message),
        classified => classified,
    }
}

/// Pull a readable message out of an error body, falling back to the raw body.
fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => match parsed.error.status {
            Some(status) => format!("{} ({})", parsed.error.message, status),
            None => parsed.error.message,
        },
        Err(_) => body.trim().to_string(),
    }
}

/// Text of the first part of the first candidate.
fn response_text(body: &str) -> ExtractionResult<String> {
    let response: GenerateContentResponse = serde_json::from_str(body)?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ExtractionError::NoResponse)
}

/// Decode the model's JSON array, tolerating a markdown code fence.
fn parse_postings(text: &str) -> ExtractionResult<Vec<JobPosting>> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if unfenced.is_empty() {
        return Err(ExtractionError::NoResponse);
    }

    Ok(serde_json::from_str(unfenced)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ExtractionConfig {
        ExtractionConfig {
            api_key: "test-key".to_string(),
            ..ExtractionConfig::default()
        }
    }

    fn inputs(ids: &[i64]) -> BTreeMap<CommentId, String> {
        ids.iter()
            .map(|id| (CommentId(*id), format!("text {id}")))
            .collect()
    }

    #[test]
    fn test_empty_api_key_is_rejected() {
        let err = GeminiExtractor::new(&ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractionError::Configuration(_)));
    }

    #[test]
    fn test_endpoint() {
        let extractor = GeminiExtractor::new(&config()).expect("valid config");
        assert_eq!(
            extractor.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let extractor = GeminiExtractor::new(&config()).expect("valid config");
        let request = serde_json::to_value(extractor.build_request(&inputs(&[2, 1])))
            .expect("request serializes");

        assert_eq!(
            request["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(request["generationConfig"]["responseSchema"]["type"], "ARRAY");
        assert_eq!(request["contents"][0]["role"], "user");
        assert!(request["systemInstruction"].get("role").is_none());

        let prompt = request["contents"][0]["parts"][0]["text"]
            .as_str()
            .expect("prompt text");
        assert!(prompt.starts_with("1. [ID: 1]"));
    }

    // Bounds are checked before the request is built, so an unreachable
    // endpoint is never contacted.
    #[tokio::test]
    async fn test_bounds_checked_before_network() {
        let extractor = GeminiExtractor::new(&ExtractionConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..config()
        })
        .expect("valid config");

        let err = extractor
            .parse_job_postings(&BTreeMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::NoInputs));

        let ids: Vec<i64> = (1..=31).collect();
        let err = extractor.parse_job_postings(&inputs(&ids)).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MaxBatch { size: 31, max: 30 }));
    }

    #[test]
    fn test_response_text() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[]"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(response_text(body).expect("text present"), "[]");

        assert!(matches!(
            response_text(r#"{"candidates":[]}"#),
            Err(ExtractionError::NoResponse)
        ));
        assert!(matches!(
            response_text(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#),
            Err(ExtractionError::NoResponse)
        ));
        assert!(matches!(response_text("<html>"), Err(ExtractionError::Decode(_))));
    }

    #[test]
    fn test_parse_postings() {
        let text = r#"```json
[{"id":101,"is_job_posting":true,"company_name":"AcmeCo","company_description":null,
  "company_url":null,"contact":null,
  "jobs":[{"title":"Go Engineer","description":null,"role_type":null,"application_url":null,
           "location":null,"compensation":{"base_salary":null,"equity":null},"tech_stack":["Go"]}],
  "is_remote":true,"is_hybrid":false,
  "general_compensation":{"base_salary":null,"equity":null},"general_tech_stack":[]}]
```"#;
        let postings = parse_postings(text).expect("valid postings");
        assert_eq!(postings.len(), 1);
        assert_eq!(postings[0].id, Some(CommentId(101)));
        assert_eq!(postings[0].jobs[0].title, "Go Engineer");
        assert!(postings[0].is_remote);

        assert!(matches!(parse_postings(""), Err(ExtractionError::NoResponse)));
        assert!(matches!(
            parse_postings("Sure! Here are the postings"),
            Err(ExtractionError::Decode(_))
        ));
    }

    #[test]
    fn test_api_error_message() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            api_error_message(body),
            "Resource has been exhausted (RESOURCE_EXHAUSTED)"
        );
        assert_eq!(api_error_message("  upstream timeout "), "upstream timeout");
    }
}
