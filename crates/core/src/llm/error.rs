use crate::llm::Provider;

#[derive(Debug, Clone, thiserror::Error)]
pub enum StrategyError {
    #[error("invalid strategy request: {detail}")]
    InvalidRequest { detail: String },

    #[error("LLM transport error (provider={provider:?}, stage={stage}): {detail}")]
    Transport {
        provider: Provider,
        stage: &'static str,
        detail: String,
        raw_output: Option<String>,
    },

    #[error("no response from AI (provider={provider:?})")]
    EmptyResponse { provider: Provider },

    #[error("LLM output failed schema validation (stage={stage}): {detail}")]
    SchemaValidation {
        stage: &'static str,
        detail: String,
        raw_output: Option<String>,
    },
}

impl StrategyError {
    pub fn transport(provider: Provider, stage: &'static str, detail: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            stage,
            detail: detail.into(),
            raw_output: None,
        }
    }

    /// Short machine-readable label, used for log fields and API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest { .. } => "invalid_request",
            Self::Transport { .. } => "transport",
            Self::EmptyResponse { .. } => "empty_response",
            Self::SchemaValidation { .. } => "schema_validation",
        }
    }

    pub fn raw_output(&self) -> Option<&str> {
        match self {
            Self::Transport { raw_output, .. } | Self::SchemaValidation { raw_output, .. } => {
                raw_output.as_deref()
            }
            Self::InvalidRequest { .. } | Self::EmptyResponse { .. } => None,
        }
    }
}
