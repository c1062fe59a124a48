use crate::domain::report::GroundingSource;

pub mod error;
pub mod fallback;
pub mod gemini;
pub mod json;
pub mod prompt;

/// What a single remote attempt yields: the model's free-form text plus whatever web
/// citations it reports having consulted.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub text: String,
    pub sources: Vec<GroundingSource>,
}

#[async_trait::async_trait]
pub trait ModelTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<ModelResponse>;
}
