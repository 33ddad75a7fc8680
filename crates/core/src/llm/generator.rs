use crate::domain::contract::strategy_response_schema;
use crate::domain::strategy::{StrategyRequest, StrategyResult};
use crate::llm::error::StrategyError;
use crate::llm::json;
use crate::llm::{CompletionRequest, Provider, TextGenerationClient};
use std::sync::Arc;

/// Turns a client name into a validated [`StrategyResult`] with exactly one
/// completion call. Holds no state between calls.
#[derive(Clone)]
pub struct StrategyGenerator {
    client: Arc<dyn TextGenerationClient>,
}

impl StrategyGenerator {
    pub fn new(client: Arc<dyn TextGenerationClient>) -> Self {
        Self { client }
    }

    pub fn provider(&self) -> Provider {
        self.client.provider()
    }

    pub async fn generate_strategy(
        &self,
        client_name: &str,
    ) -> Result<StrategyResult, StrategyError> {
        let request = StrategyRequest::try_new(client_name)?;
        self.generate(request).await
    }

    pub async fn generate(&self, request: StrategyRequest) -> Result<StrategyResult, StrategyError> {
        let provider = self.client.provider();
        tracing::info!(
            client_name = request.client_name(),
            provider = provider.as_str(),
            "generating strategy"
        );

        let completion = CompletionRequest {
            prompt: Self::prompt(&request),
            response_schema: strategy_response_schema(),
        };

        let result = match self.client.complete(completion).await {
            Ok(Some(text)) if !text.trim().is_empty() => json::parse_strategy(&text),
            Ok(_) => Err(StrategyError::EmptyResponse { provider }),
            Err(err) => Err(err),
        };

        match &result {
            Ok(strategy) => tracing::info!(
                client_name = request.client_name(),
                conversion_killers = strategy.conversion_killers.len(),
                seo_keywords = strategy.seo_keywords.len(),
                pricing_tiers = strategy.pricing_tiers.len(),
                "strategy generated"
            ),
            Err(err) => tracing::warn!(
                client_name = request.client_name(),
                kind = err.kind(),
                error = %err,
                "strategy generation failed"
            ),
        }

        result
    }

    fn prompt(request: &StrategyRequest) -> String {
        [
            format!(
                "Using the master HVAC business framework, generate a personalized strategy for {}.",
                request.client_name()
            ),
            "Focus on the Toronto market (GTA, Etobicoke, North York).".to_string(),
            "Winter is the peak emergency season.".to_string(),
            "The goal is to move them from a static website to an AI-driven high-conversion machine."
                .to_string(),
            "Also provide service pricing tiers (furnace repair, AC installation, maintenance plans) \
             reflecting current Toronto market rates, each with a price range and what it includes."
                .to_string(),
        ]
        .join("\n")
    }
}
