use serde::{Deserialize, Serialize};

/// Canonical output of one analysis run. Built fresh per request, never merged with a
/// previous report. Serializes in camelCase to match the dashboard contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub ticker: String,
    pub metrics: KeyMetrics,
    pub trade_setup: TradeSetup,
    pub checklist: Vec<ChecklistItem>,
    pub summary: String,
    pub technical_analysis: String,
    pub chart_data: Vec<ChartPoint>,
    pub news: Vec<NewsItem>,
    pub grounding_sources: Vec<GroundingSource>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub current_price: String,
    pub change_amount: String,
    pub change_percent: String,
    pub market_cap: String,
    pub volume: String,
    pub pe_ratio: String,
    /// "Buy", "Sell", "Hold", "Strong Buy" or "Strong Sell". Kept as a string because the
    /// model occasionally deviates from the exact spelling and the value is display-only.
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeSetup {
    pub verdict: Verdict,
    pub verdict_reason: String,
    pub entry_zone: String,
    pub target_price: String,
    pub stop_loss: String,
    /// Documented domain is 0-100; reproduced verbatim from the model, not clamped.
    pub confidence_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Bullish,
    Bearish,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub name: String,
    pub status: CheckStatus,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckStatus {
    Pass,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: String,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub snippet: String,
}

/// A web citation the model reports having consulted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub uri: String,
    pub title: String,
}
