use crate::config::Settings;
use crate::domain::report::GroundingSource;
use crate::llm::error::{AnalysisError, ModelCallError};
use crate::llm::{ModelResponse, ModelTarget};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

// Tiering: smartest/low-quota first, then fast/medium-quota, then a model that tends to
// sit in a separate quota bucket as the safety net.
pub const PRIMARY_MODEL: &str = "gemini-3-pro-preview";
pub const SECONDARY_MODEL: &str = "gemini-3-flash-preview";
pub const TERTIARY_MODEL: &str = "gemini-2.0-flash-exp";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings
            .usable_gemini_api_key()
            .ok_or(AnalysisError::MissingApiKey)?
            .to_string();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let timeout_secs = std::env::var("GEMINI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
        })
    }

    pub fn target(&self, model: impl Into<String>) -> GeminiTarget {
        GeminiTarget {
            client: self.clone(),
            model: model.into(),
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        prompt: &str,
    ) -> anyhow::Result<GenerateContentResponse> {
        let url = format!(
            "{}/v1beta/models/{model}:generateContent",
            self.base_url.trim_end_matches('/')
        );
        // The search tool flag is what makes the model ground its answer in live
        // retrieval instead of stale training knowledge.
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            tools: vec![Tool {
                google_search: serde_json::json!({}),
            }],
        };

        let res = self
            .http
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(&req)
            .send()
            .await
            .with_context(|| format!("Gemini request failed (model={model})"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            return Err(ModelCallError {
                target: model.to_string(),
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
            }
            .into());
        }

        serde_json::from_str::<GenerateContentResponse>(&text)
            .with_context(|| format!("failed to decode Gemini response JSON: {text}"))
    }
}

/// One model tier: the shared client bound to a specific model id.
#[derive(Debug, Clone)]
pub struct GeminiTarget {
    client: GeminiClient,
    model: String,
}

#[async_trait::async_trait]
impl ModelTarget for GeminiTarget {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<ModelResponse> {
        let res = self.client.generate_content(&self.model, prompt).await?;
        Ok(ModelResponse {
            text: response_text(&res),
            sources: grounding_sources(&res),
        })
    }
}

fn response_text(res: &GenerateContentResponse) -> String {
    let Some(candidate) = res.candidates.first() else {
        return String::new();
    };
    let Some(content) = &candidate.content else {
        return String::new();
    };
    let mut out = String::new();
    for part in &content.parts {
        if let Some(text) = &part.text {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(text);
        }
    }
    out
}

fn grounding_sources(res: &GenerateContentResponse) -> Vec<GroundingSource> {
    let Some(meta) = res
        .candidates
        .first()
        .and_then(|c| c.grounding_metadata.as_ref())
    else {
        return Vec::new();
    };

    meta.grounding_chunks
        .iter()
        .filter_map(|chunk| {
            let web = chunk.web.as_ref()?;
            let uri = web.uri.clone()?;
            let title = web
                .title
                .clone()
                .filter(|t| !t.trim().is_empty())
                .or_else(|| host_of(&uri))
                .unwrap_or_else(|| uri.clone());
            Some(GroundingSource { uri, title })
        })
        .collect()
}

fn host_of(uri: &str) -> Option<String> {
    url::Url::parse(uri)
        .ok()?
        .host_str()
        .map(|h| h.to_string())
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Clone, Serialize)]
struct Tool {
    #[serde(rename = "googleSearch")]
    google_search: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    grounding_metadata: Option<GroundingMetadata>,
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
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Deserialize)]
struct GroundingChunk {
    #[serde(default)]
    web: Option<WebSource>,
}

#[derive(Debug, Clone, Deserialize)]
struct WebSource {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> GenerateContentResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn joins_candidate_parts_into_one_text() {
        let res = decode(
            r#"{"candidates":[{"content":{"parts":[{"text":"line one"},{"text":"line two"}]}}]}"#,
        );
        assert_eq!(response_text(&res), "line one\nline two");
    }

    #[test]
    fn empty_candidates_yield_empty_text_and_no_sources() {
        let res = decode("{}");
        assert_eq!(response_text(&res), "");
        assert!(grounding_sources(&res).is_empty());
    }

    #[test]
    fn grounding_chunks_map_to_sources_with_host_fallback_title() {
        let res = decode(
            r#"{"candidates":[{"content":{"parts":[{"text":"t"}]},
                "groundingMetadata":{"groundingChunks":[
                    {"web":{"uri":"https://example.com/a","title":"Example"}},
                    {"web":{"uri":"https://news.site/article"}},
                    {"web":{"title":"no uri"}},
                    {}
                ]}}]}"#,
        );
        let sources = grounding_sources(&res);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].title, "Example");
        assert_eq!(sources[1].uri, "https://news.site/article");
        assert_eq!(sources[1].title, "news.site");
    }

    #[test]
    fn request_body_carries_the_search_tool_flag() {
        let req = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: "p".to_string(),
                }],
            }],
            tools: vec![Tool {
                google_search: serde_json::json!({}),
            }],
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["tools"][0]["googleSearch"], serde_json::json!({}));
        assert_eq!(json["contents"][0]["parts"][0]["text"], "p");
    }
}
