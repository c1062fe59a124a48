use crate::domain::report::{
    AnalysisReport, ChartPoint, ChecklistItem, CheckStatus, GroundingSource, KeyMetrics, NewsItem,
    TradeSetup, Verdict,
};
use serde::Deserialize;

// Placeholders reproduced from the dashboard: shown when the model omits a field.
const FALLBACK_VERDICT_REASON: &str = "AI 无法生成明确结论";
const FALLBACK_SUMMARY: &str = "暂无摘要。";
const FALLBACK_TECHNICAL: &str = "暂无技术分析。";
const FALLBACK_RATING: &str = "Hold";

/// Loose mirror of the JSON payload the model is asked to emit. Every field is optional so
/// a partial answer still parses; normalization onto the documented defaults happens in
/// [`into_report`](Self::into_report).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmAnalysisPayload {
    pub metrics: Option<LlmMetrics>,
    pub trade_setup: Option<LlmTradeSetup>,
    pub checklist: Option<Vec<LlmChecklistItem>>,
    pub summary: Option<String>,
    pub technical_analysis: Option<String>,
    pub chart_data: Option<Vec<LlmChartPoint>>,
    pub news: Option<Vec<LlmNewsItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmMetrics {
    pub current_price: Option<String>,
    pub change_amount: Option<String>,
    pub change_percent: Option<String>,
    pub market_cap: Option<String>,
    pub volume: Option<String>,
    pub pe_ratio: Option<String>,
    pub rating: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LlmTradeSetup {
    pub verdict: Option<String>,
    pub verdict_reason: Option<String>,
    pub entry_zone: Option<String>,
    pub target_price: Option<String>,
    pub stop_loss: Option<String>,
    pub confidence_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmChecklistItem {
    pub name: Option<String>,
    pub status: Option<String>,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmChartPoint {
    pub time: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LlmNewsItem {
    pub title: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub snippet: Option<String>,
}

impl LlmAnalysisPayload {
    /// Merges the extracted fields onto per-field defaults so that no required collection
    /// is ever absent and the trade setup always carries a valid verdict tag.
    pub fn into_report(
        self,
        ticker: String,
        grounding_sources: Vec<GroundingSource>,
        timestamp: String,
    ) -> AnalysisReport {
        let metrics = self.metrics.unwrap_or_default();
        let setup = self.trade_setup.unwrap_or_default();

        AnalysisReport {
            ticker,
            metrics: KeyMetrics {
                current_price: metrics.current_price.unwrap_or_default(),
                change_amount: metrics.change_amount.unwrap_or_default(),
                change_percent: metrics.change_percent.unwrap_or_default(),
                market_cap: metrics.market_cap.unwrap_or_default(),
                volume: metrics.volume.unwrap_or_default(),
                pe_ratio: metrics.pe_ratio.unwrap_or_default(),
                rating: metrics
                    .rating
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_RATING.to_string()),
            },
            trade_setup: TradeSetup {
                verdict: parse_verdict(setup.verdict.as_deref()),
                verdict_reason: setup
                    .verdict_reason
                    .filter(|r| !r.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_VERDICT_REASON.to_string()),
                entry_zone: setup.entry_zone.unwrap_or_else(|| "-".to_string()),
                target_price: setup.target_price.unwrap_or_else(|| "-".to_string()),
                stop_loss: setup.stop_loss.unwrap_or_else(|| "-".to_string()),
                confidence_score: setup.confidence_score.unwrap_or(0.0),
            },
            checklist: self
                .checklist
                .unwrap_or_default()
                .into_iter()
                .map(|item| ChecklistItem {
                    name: item.name.unwrap_or_default(),
                    status: parse_check_status(item.status.as_deref()),
                    detail: item.detail.unwrap_or_default(),
                })
                .collect(),
            summary: self
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_SUMMARY.to_string()),
            technical_analysis: self
                .technical_analysis
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| FALLBACK_TECHNICAL.to_string()),
            chart_data: self
                .chart_data
                .unwrap_or_default()
                .into_iter()
                .map(|p| ChartPoint {
                    time: p.time.unwrap_or_default(),
                    price: p.price.unwrap_or(0.0),
                })
                .collect(),
            news: self
                .news
                .unwrap_or_default()
                .into_iter()
                .map(|n| NewsItem {
                    title: n.title.unwrap_or_default(),
                    source: n.source.unwrap_or_default(),
                    url: n.url.filter(|u| !u.trim().is_empty()),
                    snippet: n.snippet.unwrap_or_default(),
                })
                .collect(),
            grounding_sources,
            timestamp,
        }
    }
}

fn parse_verdict(raw: Option<&str>) -> Verdict {
    match raw.map(|v| v.trim().to_uppercase()).as_deref() {
        Some("BULLISH") => Verdict::Bullish,
        Some("BEARISH") => Verdict::Bearish,
        _ => Verdict::Neutral,
    }
}

fn parse_check_status(raw: Option<&str>) -> CheckStatus {
    match raw.map(|s| s.trim().to_uppercase()).as_deref() {
        Some("PASS") => CheckStatus::Pass,
        Some("FAIL") => CheckStatus::Fail,
        _ => CheckStatus::Warn,
    }
}
