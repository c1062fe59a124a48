use crate::config::Settings;
use crate::domain::report::{AnalysisReport, GroundingSource};
use crate::llm::error::AnalysisError;
use crate::llm::fallback::FallbackChain;
use crate::llm::gemini::{GeminiClient, PRIMARY_MODEL, SECONDARY_MODEL, TERTIARY_MODEL};
use crate::llm::{json, prompt, ModelTarget};
use std::collections::HashSet;
use std::sync::Arc;

/// Orchestrates one analysis: prompt construction, the fallback chain, payload
/// extraction, normalization onto defaults, citation dedup and timestamping. Purely
/// request/response; nothing is cached across tickers.
pub struct Analyzer {
    chain: FallbackChain,
}

impl Analyzer {
    pub fn new(chain: FallbackChain) -> Self {
        Self { chain }
    }

    /// Fails with [`AnalysisError::MissingApiKey`] (inside the anyhow chain) before any
    /// request is attempted when the credential is unusable.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = GeminiClient::from_settings(settings)?;
        let targets: Vec<Arc<dyn ModelTarget>> = configured_models()
            .into_iter()
            .map(|model| Arc::new(client.target(model)) as Arc<dyn ModelTarget>)
            .collect();
        Ok(Self::new(FallbackChain::new(
            targets,
            FallbackChain::cooldown_from_env(),
        )))
    }

    pub async fn analyze(&self, ticker: &str) -> Result<AnalysisReport, AnalysisError> {
        let ticker = ticker.trim();
        if ticker.is_empty() {
            return Err(AnalysisError::EmptyTicker);
        }
        let ticker = ticker.to_uppercase();
        tracing::info!(%ticker, "starting analysis");

        let prompt = prompt::analysis_prompt(&ticker);
        let response = self.chain.request(&prompt).await?;

        let Some(payload) = json::extract_payload(&response.text) else {
            tracing::warn!(%ticker, "model response carried no parsable payload");
            return Err(AnalysisError::UnparseableResponse {
                raw_output: response.text,
            });
        };

        let sources = dedup_sources(response.sources);
        let timestamp = chrono::Local::now().format("%H:%M:%S").to_string();
        tracing::info!(%ticker, sources = sources.len(), "analysis complete");
        Ok(payload.into_report(ticker, sources, timestamp))
    }
}

fn configured_models() -> Vec<String> {
    if let Ok(raw) = std::env::var("GEMINI_MODELS") {
        let models: Vec<String> = raw
            .split(',')
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if !models.is_empty() {
            return models;
        }
    }
    vec![
        PRIMARY_MODEL.to_string(),
        SECONDARY_MODEL.to_string(),
        TERTIARY_MODEL.to_string(),
    ]
}

/// Deduplicates citations by URI; the first occurrence wins and insertion order is kept.
fn dedup_sources(sources: Vec<GroundingSource>) -> Vec<GroundingSource> {
    let mut seen = HashSet::new();
    sources
        .into_iter()
        .filter(|s| seen.insert(s.uri.clone()))
        .collect()
}
