use std::fmt;

/// Typed failure taxonomy for one analysis run. All variants are terminal for the current
/// search; the caller must re-submit.
#[derive(Debug, Clone)]
pub enum AnalysisError {
    /// The credential is absent (unset, empty, or the literal "undefined"). Fatal
    /// configuration error, surfaced before any request is attempted.
    MissingApiKey,

    /// The requested ticker was empty or whitespace.
    EmptyTicker,

    /// Every fallback tier failed. `quota_exceeded` is set when the final failure text
    /// matches a rate-limit signature, which warrants a more specific user message.
    AllTargetsExhausted {
        quota_exceeded: bool,
        last_error: String,
    },

    /// The remote call succeeded but no structured payload could be extracted.
    UnparseableResponse { raw_output: String },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingApiKey => {
                write!(f, "GEMINI_API_KEY is missing; check the environment configuration")
            }
            Self::EmptyTicker => write!(f, "ticker must be non-empty"),
            Self::AllTargetsExhausted {
                quota_exceeded,
                last_error,
            } => write!(
                f,
                "all model targets exhausted (quota_exceeded={quota_exceeded}): {last_error}"
            ),
            Self::UnparseableResponse { .. } => {
                write!(f, "no structured payload could be extracted from the model response")
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Diagnostics for one failed remote call, kept alongside the raw body so rate-limit
/// signatures buried in the response survive into the fallback decision.
#[derive(Debug, Clone)]
pub struct ModelCallError {
    pub target: String,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl fmt::Display for ModelCallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "model call failed (target={}, stage={}): {}",
            self.target, self.stage, self.detail
        )
    }
}

impl std::error::Error for ModelCallError {}

pub fn is_quota_signature(text: &str) -> bool {
    if text.contains("429") || text.contains("RESOURCE_EXHAUSTED") {
        return true;
    }
    let lower = text.to_lowercase();
    lower.contains("quota") || lower.contains("rate limit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_signatures_match() {
        assert!(is_quota_signature("HTTP 429 Too Many Requests"));
        assert!(is_quota_signature("{\"status\":\"RESOURCE_EXHAUSTED\"}"));
        assert!(is_quota_signature("Quota exceeded for project"));
        assert!(is_quota_signature("Rate limit reached, retry later"));
        assert!(!is_quota_signature("connection reset by peer"));
    }

    #[test]
    fn display_omits_raw_model_output() {
        let err = AnalysisError::UnparseableResponse {
            raw_output: "SECRET RAW BODY".to_string(),
        };
        assert!(!err.to_string().contains("SECRET"));
    }
}
