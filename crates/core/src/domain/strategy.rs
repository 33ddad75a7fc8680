use crate::llm::error::StrategyError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyRequest {
    client_name: String,
}

impl StrategyRequest {
    /// Rejects empty or whitespace-only names before anything goes over the wire.
    pub fn try_new(client_name: &str) -> Result<Self, StrategyError> {
        let client_name = client_name.trim();
        if client_name.is_empty() {
            return Err(StrategyError::InvalidRequest {
                detail: "client name must be non-empty".to_string(),
            });
        }
        Ok(Self {
            client_name: client_name.to_string(),
        })
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyResult {
    pub conversion_killers: Vec<AuditGap>,
    pub ai_script: AiScript,
    pub email_hook: String,
    pub seo_keywords: Vec<String>,
    pub pricing_tiers: Vec<PriceTier>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditGap {
    pub title: String,
    pub description: String,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub const ALL: [Impact; 3] = [Impact::High, Impact::Medium, Impact::Low];

    pub fn as_str(self) -> &'static str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScript {
    pub first_message: String,
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    pub service: String,
    pub range: String,
    pub includes: Vec<String>,
}
