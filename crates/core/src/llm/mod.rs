pub mod error;
pub mod gemini;
pub mod generator;
pub mod json;

use crate::llm::error::StrategyError;

#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub response_schema: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini",
        }
    }
}

/// One prompt in, one structured-output completion back.
///
/// `Ok(None)` means the service answered but carried no text payload; callers
/// decide what that means for them.
#[async_trait::async_trait]
pub trait TextGenerationClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn complete(&self, req: CompletionRequest) -> Result<Option<String>, StrategyError>;
}
