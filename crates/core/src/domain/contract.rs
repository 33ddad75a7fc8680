use crate::domain::strategy::{AiScript, AuditGap, Impact, PriceTier, StrategyResult};
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Model output as it arrives on the wire. Every key is required; serde rejects
/// a payload that omits one or carries the wrong JSON type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmStrategy {
    pub conversion_killers: Vec<LlmAuditGap>,
    pub ai_script: LlmAiScript,
    pub email_hook: String,
    pub seo_keywords: Vec<String>,
    pub pricing_tiers: Vec<LlmPriceTier>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmAuditGap {
    pub title: String,
    pub description: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmAiScript {
    pub first_message: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmPriceTier {
    pub service: String,
    pub range: String,
    pub includes: Vec<String>,
}

/// Structured-output declaration sent with every completion request.
/// Uses the Gemini schema dialect (upper-case OpenAPI type names).
pub fn strategy_response_schema() -> serde_json::Value {
    let impacts: Vec<&str> = Impact::ALL.iter().map(|i| i.as_str()).collect();
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "conversionKillers": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {"type": "STRING"},
                        "description": {"type": "STRING"},
                        "impact": {"type": "STRING", "enum": impacts}
                    },
                    "required": ["title", "description", "impact"]
                }
            },
            "aiScript": {
                "type": "OBJECT",
                "properties": {
                    "firstMessage": {"type": "STRING"},
                    "features": {"type": "ARRAY", "items": {"type": "STRING"}}
                },
                "required": ["firstMessage", "features"]
            },
            "emailHook": {"type": "STRING"},
            "seoKeywords": {"type": "ARRAY", "items": {"type": "STRING"}},
            "pricingTiers": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "service": {"type": "STRING"},
                        "range": {"type": "STRING"},
                        "includes": {"type": "ARRAY", "items": {"type": "STRING"}}
                    },
                    "required": ["service", "range", "includes"]
                }
            }
        },
        "required": ["conversionKillers", "aiScript", "emailHook", "seoKeywords", "pricingTiers"]
    })
}

impl LlmStrategy {
    pub fn validate_and_into_strategy(self) -> anyhow::Result<StrategyResult> {
        let conversion_killers = self
            .conversion_killers
            .into_iter()
            .enumerate()
            .map(|(idx, gap)| gap.validate_and_into_gap(idx))
            .collect::<anyhow::Result<Vec<_>>>()?;

        let first_message = self.ai_script.first_message.trim().to_string();
        ensure!(
            !first_message.is_empty(),
            "aiScript.firstMessage must be non-empty"
        );

        let email_hook = self.email_hook.trim().to_string();
        ensure!(!email_hook.is_empty(), "emailHook must be non-empty");

        let pricing_tiers = self
            .pricing_tiers
            .into_iter()
            .enumerate()
            .map(|(idx, tier)| tier.validate_and_into_tier(idx))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(StrategyResult {
            conversion_killers,
            ai_script: AiScript {
                first_message,
                features: trim_all(self.ai_script.features),
            },
            email_hook,
            seo_keywords: trim_all(self.seo_keywords),
            pricing_tiers,
        })
    }
}

impl LlmAuditGap {
    fn validate_and_into_gap(self, idx: usize) -> anyhow::Result<AuditGap> {
        let title = self.title.trim().to_string();
        ensure!(
            !title.is_empty(),
            "conversionKillers[{idx}].title must be non-empty"
        );

        Ok(AuditGap {
            title,
            description: self.description.trim().to_string(),
            impact: self.impact,
        })
    }
}

impl LlmPriceTier {
    fn validate_and_into_tier(self, idx: usize) -> anyhow::Result<PriceTier> {
        let service = self.service.trim().to_string();
        ensure!(
            !service.is_empty(),
            "pricingTiers[{idx}].service must be non-empty"
        );

        let range = self.range.trim().to_string();
        ensure!(
            !range.is_empty(),
            "pricingTiers[{idx}].range must be non-empty"
        );

        Ok(PriceTier {
            service,
            range,
            includes: trim_all(self.includes),
        })
    }
}

fn trim_all(items: Vec<String>) -> Vec<String> {
    items.into_iter().map(|s| s.trim().to_string()).collect()
}
