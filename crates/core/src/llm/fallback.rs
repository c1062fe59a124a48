use crate::llm::error::{is_quota_signature, AnalysisError, ModelCallError};
use crate::llm::{ModelResponse, ModelTarget};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(2);

/// Remote tiers enforce independent quota buckets; trying them in priority order with a
/// short pause masks transient 5xx/429 failures without user-initiated retry.
pub struct FallbackChain {
    targets: Vec<Arc<dyn ModelTarget>>,
    cooldown: Duration,
}

impl FallbackChain {
    pub fn new(targets: Vec<Arc<dyn ModelTarget>>, cooldown: Duration) -> Self {
        Self { targets, cooldown }
    }

    pub fn cooldown_from_env() -> Duration {
        std::env::var("FALLBACK_COOLDOWN_MS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_COOLDOWN)
    }

    /// Attempts the targets strictly in order, sleeping the cool-down after every
    /// non-final failure. Attempts are sequential, never raced.
    pub async fn request(&self, prompt: &str) -> Result<ModelResponse, AnalysisError> {
        let mut last_failure = String::from("no model targets configured");

        for (idx, target) in self.targets.iter().enumerate() {
            let attempt = idx + 1;
            match target.generate(prompt).await {
                Ok(response) => {
                    tracing::info!(target = target.name(), attempt, "model target succeeded");
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(
                        target = target.name(),
                        attempt,
                        error = %err,
                        "model target failed"
                    );
                    last_failure = failure_text(&err);
                    if attempt < self.targets.len() {
                        tokio::time::sleep(self.cooldown).await;
                    }
                }
            }
        }

        Err(AnalysisError::AllTargetsExhausted {
            quota_exceeded: is_quota_signature(&last_failure),
            last_error: last_failure,
        })
    }
}

// Rate-limit signatures often live in the response body rather than the error message,
// so fold the diagnostics' raw output into the text we classify.
fn failure_text(err: &anyhow::Error) -> String {
    let mut text = format!("{err:#}");
    if let Some(raw) = err
        .downcast_ref::<ModelCallError>()
        .and_then(|diag| diag.raw_output.as_deref())
    {
        text.push('\n');
        text.push_str(raw);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    enum Outcome {
        Text(&'static str),
        Fail(&'static str),
        HttpFail {
            detail: &'static str,
            raw: &'static str,
        },
    }

    struct FakeTarget {
        name: &'static str,
        outcome: Outcome,
        calls: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait::async_trait]
    impl ModelTarget for FakeTarget {
        fn name(&self) -> &str {
            self.name
        }

        async fn generate(&self, _prompt: &str) -> anyhow::Result<ModelResponse> {
            self.calls.lock().unwrap().push(self.name);
            match &self.outcome {
                Outcome::Text(text) => Ok(ModelResponse {
                    text: text.to_string(),
                    sources: Vec::new(),
                }),
                Outcome::Fail(msg) => Err(anyhow::anyhow!("{msg}")),
                Outcome::HttpFail { detail, raw } => Err(ModelCallError {
                    target: self.name.to_string(),
                    stage: "http",
                    detail: detail.to_string(),
                    raw_output: Some(raw.to_string()),
                }
                .into()),
            }
        }
    }

    fn chain(
        outcomes: Vec<(&'static str, Outcome)>,
        cooldown: Duration,
    ) -> (FallbackChain, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let targets = outcomes
            .into_iter()
            .map(|(name, outcome)| {
                Arc::new(FakeTarget {
                    name,
                    outcome,
                    calls: Arc::clone(&calls),
                }) as Arc<dyn ModelTarget>
            })
            .collect();
        (FallbackChain::new(targets, cooldown), calls)
    }

    #[tokio::test(start_paused = true)]
    async fn first_success_needs_no_cooldown() {
        let (chain, calls) = chain(
            vec![("pro", Outcome::Text("ok")), ("flash", Outcome::Text("never"))],
            Duration::from_secs(2),
        );
        let started = tokio::time::Instant::now();
        let res = chain.request("p").await.unwrap();
        assert_eq!(res.text, "ok");
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(*calls.lock().unwrap(), vec!["pro"]);
    }

    #[tokio::test(start_paused = true)]
    async fn third_target_answers_after_two_cooldowns_in_order() {
        let (chain, calls) = chain(
            vec![
                ("pro", Outcome::Fail("boom")),
                ("flash", Outcome::Fail("boom")),
                ("exp", Outcome::Text("third wins")),
            ],
            Duration::from_secs(2),
        );
        let started = tokio::time::Instant::now();
        let res = chain.request("p").await.unwrap();
        assert_eq!(res.text, "third wins");
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert_eq!(*calls.lock().unwrap(), vec!["pro", "flash", "exp"]);
    }

    #[tokio::test(start_paused = true)]
    async fn all_failures_end_in_exhausted_with_no_trailing_cooldown() {
        let (chain, calls) = chain(
            vec![
                ("pro", Outcome::Fail("a")),
                ("flash", Outcome::Fail("b")),
                ("exp", Outcome::Fail("network unreachable")),
            ],
            Duration::from_secs(2),
        );
        let started = tokio::time::Instant::now();
        let err = chain.request("p").await.unwrap_err();
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        assert_eq!(calls.lock().unwrap().len(), 3);
        match err {
            AnalysisError::AllTargetsExhausted {
                quota_exceeded,
                last_error,
            } => {
                assert!(!quota_exceeded);
                assert!(last_error.contains("network unreachable"));
            }
            other => panic!("expected AllTargetsExhausted, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn quota_signature_in_final_raw_body_sets_the_flag() {
        let (chain, _calls) = chain(
            vec![
                ("pro", Outcome::Fail("a")),
                (
                    "exp",
                    Outcome::HttpFail {
                        detail: "status=429 Too Many Requests",
                        raw: r#"{"error":{"status":"RESOURCE_EXHAUSTED"}}"#,
                    },
                ),
            ],
            Duration::from_millis(1),
        );
        let err = chain.request("p").await.unwrap_err();
        match err {
            AnalysisError::AllTargetsExhausted { quota_exceeded, .. } => assert!(quota_exceeded),
            other => panic!("expected AllTargetsExhausted, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_target_list_is_exhausted_immediately() {
        let chain = FallbackChain::new(Vec::new(), DEFAULT_COOLDOWN);
        let err = chain.request("p").await.unwrap_err();
        assert!(matches!(err, AnalysisError::AllTargetsExhausted { .. }));
    }
}
