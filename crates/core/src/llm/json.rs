use crate::domain::contract::LlmStrategy;
use crate::domain::strategy::StrategyResult;
use crate::llm::error::StrategyError;

pub fn extract_json(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        // Remove Markdown fences (```json ... ``` or ``` ... ```), single-line or not.
        let mut inner = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        if let Some(end) = inner.rfind("```") {
            inner = &inner[..end];
        }
        return Some(inner.trim().to_string());
    }

    // Best-effort extraction: first '{' to last '}'.
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(trimmed[start..=end].trim().to_string())
}

pub fn parse_strategy(text: &str) -> Result<StrategyResult, StrategyError> {
    let json_str = extract_json(text).unwrap_or_else(|| text.trim().to_string());

    let value = serde_json::from_str::<serde_json::Value>(&json_str).map_err(|e| {
        StrategyError::SchemaValidation {
            stage: "json",
            detail: format!("LLM output is not valid JSON: {e}"),
            raw_output: Some(text.to_string()),
        }
    })?;

    let parsed = serde_json::from_value::<LlmStrategy>(value).map_err(|e| {
        StrategyError::SchemaValidation {
            stage: "contract",
            detail: format!("LLM output does not match strategy schema: {e}"),
            raw_output: Some(text.to_string()),
        }
    })?;

    parsed
        .validate_and_into_strategy()
        .map_err(|e| StrategyError::SchemaValidation {
            stage: "contract",
            detail: format!("{e:#}"),
            raw_output: Some(text.to_string()),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::strategy::Impact;
    use serde_json::json;

    const VALID: &str = r#"{"conversionKillers":[{"title":"No urgency CTA","description":"Hero lacks emergency framing","impact":"High"}],
 "aiScript":{"firstMessage":"Hi, this is Alex.","features":["24/7 dispatch"]},
 "emailHook":"Your website is losing winter leads.",
 "seoKeywords":["furnace repair toronto"],
 "pricingTiers":[{"service":"Furnace Repair","range":"$149-$380","includes":["Diagnostics","Labor"]}]}"#;

    fn assert_schema_error(result: Result<StrategyResult, StrategyError>, expected_stage: &str) {
        match result {
            Err(StrategyError::SchemaValidation { stage, .. }) => assert_eq!(stage, expected_stage),
            other => panic!("expected SchemaValidation({expected_stage}), got {other:?}"),
        }
    }

    #[test]
    fn extract_json_handles_fenced_blocks() {
        let body = "{\"a\":1}";
        let fenced = format!("```json\n{body}\n```\n");
        assert_eq!(extract_json(&fenced), Some(body.to_string()));
    }

    #[test]
    fn extract_json_handles_single_line_fences() {
        assert_eq!(extract_json("```{\"a\":1}```"), Some("{\"a\":1}".to_string()));
        assert_eq!(extract_json("```json {\"a\":1} ```"), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn extract_json_falls_back_to_braces() {
        let s = "prefix {\"a\":1} suffix";
        assert_eq!(extract_json(s), Some("{\"a\":1}".to_string()));
    }

    #[test]
    fn parse_strategy_accepts_valid_json() {
        let strategy = parse_strategy(VALID).unwrap();
        assert_eq!(strategy.conversion_killers.len(), 1);
        assert_eq!(strategy.conversion_killers[0].impact, Impact::High);
        assert_eq!(strategy.ai_script.first_message, "Hi, this is Alex.");
        assert_eq!(strategy.seo_keywords, vec!["furnace repair toronto".to_string()]);
        assert_eq!(strategy.pricing_tiers[0].range, "$149-$380");
    }

    #[test]
    fn parsing_same_payload_twice_is_equal() {
        let first = parse_strategy(VALID).unwrap();
        let second = parse_strategy(VALID).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn parse_strategy_accepts_fenced_payload() {
        let fenced = format!("```json\n{VALID}\n```");
        assert_eq!(parse_strategy(&fenced).unwrap(), parse_strategy(VALID).unwrap());
    }

    #[test]
    fn parse_strategy_accepts_single_line_fenced_payload() {
        let compact: serde_json::Value = serde_json::from_str(VALID).unwrap();
        let fenced = format!("```json{compact}```");
        assert_eq!(parse_strategy(&fenced).unwrap(), parse_strategy(VALID).unwrap());
    }

    #[test]
    fn parse_strategy_rejects_each_missing_top_level_field() {
        for key in [
            "conversionKillers",
            "aiScript",
            "emailHook",
            "seoKeywords",
            "pricingTiers",
        ] {
            let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
            value.as_object_mut().unwrap().remove(key);
            let err = parse_strategy(&value.to_string()).unwrap_err();
            match err {
                StrategyError::SchemaValidation { stage, detail, .. } => {
                    assert_eq!(stage, "contract");
                    assert!(detail.contains(key), "detail should name {key}: {detail}");
                }
                other => panic!("expected SchemaValidation for missing {key}, got {other:?}"),
            }
        }
    }

    #[test]
    fn parse_strategy_rejects_missing_nested_field() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["aiScript"].as_object_mut().unwrap().remove("features");
        assert_schema_error(parse_strategy(&value.to_string()), "contract");
    }

    #[test]
    fn parse_strategy_rejects_mistyped_field() {
        let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
        value["seoKeywords"] = json!("furnace repair toronto");
        assert_schema_error(parse_strategy(&value.to_string()), "contract");
    }

    #[test]
    fn parse_strategy_rejects_unknown_impact() {
        for impact in ["Critical", "high", ""] {
            let mut value: serde_json::Value = serde_json::from_str(VALID).unwrap();
            value["conversionKillers"][0]["impact"] = json!(impact);
            assert_schema_error(parse_strategy(&value.to_string()), "contract");
        }
    }

    #[test]
    fn parse_strategy_distinguishes_syntax_errors() {
        assert_schema_error(parse_strategy("{\"conversionKillers\": ["), "json");
        assert_schema_error(parse_strategy("not json at all"), "json");
    }
}
