//! Model pricing and per-token-type cost attribution
//!
//! Prices are USD per million tokens, keyed by pricing family. A versioned
//! model name like `claude-sonnet-4-20250514` maps to its family by stripping
//! the `claude-` prefix and the 8-digit date suffix; names that do not match
//! that pattern are looked up as-is. Unknown families are not an error; they
//! simply price to nothing.

use crate::types::{NormalizedEntry, TokenCounts};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Prices per million tokens for one model family
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPricing {
    pub input: f64,
    pub output: f64,
    pub cache_write: f64,
    pub cache_read: f64,
}

const fn pricing(input: f64, output: f64, cache_write: f64, cache_read: f64) -> TokenPricing {
    TokenPricing {
        input,
        output,
        cache_write,
        cache_read,
    }
}

/// Versioned model names end in an 8-digit date stamp
static VERSIONED_MODEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^claude-(.+)-\d{8}$").expect("valid regex"));

/// Family-keyed price table; legacy families appear under both hyphen
/// orderings ("3-5-sonnet" and "sonnet-3-5")
static FAMILY_PRICING: Lazy<HashMap<&'static str, TokenPricing>> = Lazy::new(|| {
    let opus = pricing(15.0, 75.0, 18.75, 1.5);
    let opus_4_5 = pricing(5.0, 25.0, 6.25, 0.5);
    let sonnet = pricing(3.0, 15.0, 3.75, 0.3);
    let haiku_3 = pricing(0.25, 1.25, 0.3, 0.03);
    let haiku_3_5 = pricing(0.8, 4.0, 1.0, 0.08);
    let haiku_4_5 = pricing(1.0, 5.0, 1.25, 0.1);

    HashMap::from([
        ("opus-4", opus),
        ("opus-4-1", opus),
        ("opus-4-5", opus_4_5),
        ("3-opus", opus),
        ("opus-3", opus),
        ("sonnet-4", sonnet),
        ("sonnet-4-5", sonnet),
        ("3-7-sonnet", sonnet),
        ("sonnet-3-7", sonnet),
        ("3-5-sonnet", sonnet),
        ("sonnet-3-5", sonnet),
        ("3-sonnet", sonnet),
        ("sonnet-3", sonnet),
        ("3-haiku", haiku_3),
        ("haiku-3", haiku_3),
        ("3-5-haiku", haiku_3_5),
        ("haiku-3-5", haiku_3_5),
        ("haiku-4-5", haiku_4_5),
    ])
});

/// Derive the pricing family key for a model name
///
/// `claude-sonnet-4-20250514` yields `sonnet-4`; anything not matching the
/// versioned pattern is its own key.
pub fn family_key(model_name: &str) -> &str {
    VERSIONED_MODEL
        .captures(model_name)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str())
        .unwrap_or(model_name)
}

/// Look up per-million-token pricing for a model name
pub fn get_token_pricing(model_name: &str) -> Option<TokenPricing> {
    let key = family_key(model_name);
    let found = FAMILY_PRICING.get(key).copied();
    if found.is_none() {
        debug!(model = model_name, family = key, "no pricing for model family");
    }
    found
}

/// Cost of one entry broken out by token category
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostByTokenType {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_write_cost: f64,
    pub cache_read_cost: f64,
}

impl CostByTokenType {
    fn accumulate(&mut self, tokens: &TokenCounts, price: &TokenPricing) {
        self.input_cost += tokens.input_tokens as f64 * price.input / 1_000_000.0;
        self.output_cost += tokens.output_tokens as f64 * price.output / 1_000_000.0;
        self.cache_write_cost +=
            tokens.cache_creation_tokens as f64 * price.cache_write / 1_000_000.0;
        self.cache_read_cost += tokens.cache_read_tokens as f64 * price.cache_read / 1_000_000.0;
    }
}

/// Attribute an entry's cost to token categories
///
/// With per-model breakdowns, each priced model contributes its slice;
/// unpriced models are skipped, and the result is `None` only when no
/// breakdown had known pricing. Without breakdowns, pricing is attempted only
/// for an unambiguous single-model entry.
pub fn calculate_cost_by_token_type(entry: &NormalizedEntry) -> Option<CostByTokenType> {
    if let Some(breakdowns) = entry.model_breakdowns.as_deref()
        && !breakdowns.is_empty()
    {
        let mut cost = CostByTokenType::default();
        let mut priced_any = false;
        for breakdown in breakdowns {
            if let Some(price) = get_token_pricing(&breakdown.model_name) {
                cost.accumulate(&breakdown.tokens, &price);
                priced_any = true;
            }
        }
        return priced_any.then_some(cost);
    }

    // Zero or multiple models without breakdowns is ambiguous
    let [model] = entry.models.as_slice() else {
        return None;
    };
    get_token_pricing(model).map(|price| {
        let mut cost = CostByTokenType::default();
        cost.accumulate(&entry.tokens, &price);
        cost
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ModelBreakdown;

    #[test]
    fn test_family_key_strips_date_suffix() {
        assert_eq!(family_key("claude-sonnet-4-20250514"), "sonnet-4");
        assert_eq!(family_key("claude-opus-4-1-20250805"), "opus-4-1");
        assert_eq!(family_key("claude-3-5-sonnet-20241022"), "3-5-sonnet");
    }

    #[test]
    fn test_family_key_identity_for_unversioned_names() {
        assert_eq!(family_key("sonnet-4"), "sonnet-4");
        assert_eq!(family_key("claude-sonnet-4"), "claude-sonnet-4");
        // Date-like suffix that is not 8 digits does not strip
        assert_eq!(family_key("claude-sonnet-4-2025"), "claude-sonnet-4-2025");
    }

    #[test]
    fn test_pricing_lookup() {
        let sonnet = get_token_pricing("claude-sonnet-4-20250514").unwrap();
        assert_eq!(sonnet.input, 3.0);
        assert_eq!(sonnet.output, 15.0);

        let opus = get_token_pricing("claude-opus-4-20250514").unwrap();
        assert_eq!(opus.cache_write, 18.75);

        // Legacy hyphen ordering
        assert!(get_token_pricing("claude-3-5-haiku-20241022").is_some());
        assert!(get_token_pricing("haiku-3-5").is_some());

        assert!(get_token_pricing("gpt-4o").is_none());
    }

    #[test]
    fn test_cost_by_token_type_from_breakdowns() {
        let entry = NormalizedEntry {
            model_breakdowns: Some(vec![
                ModelBreakdown {
                    model_name: "claude-sonnet-4-20250514".to_string(),
                    tokens: TokenCounts::new(1_000_000, 1_000_000, 0, 0),
                    cost: 18.0,
                },
                ModelBreakdown {
                    model_name: "totally-unknown".to_string(),
                    tokens: TokenCounts::new(1_000_000, 0, 0, 0),
                    cost: 1.0,
                },
            ]),
            ..Default::default()
        };

        let cost = calculate_cost_by_token_type(&entry).unwrap();
        // Unknown model's tokens are skipped, not priced at zero rates
        assert!((cost.input_cost - 3.0).abs() < 1e-9);
        assert!((cost.output_cost - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_none_when_no_breakdown_priced() {
        let entry = NormalizedEntry {
            model_breakdowns: Some(vec![ModelBreakdown {
                model_name: "mystery-model".to_string(),
                tokens: TokenCounts::new(100, 0, 0, 0),
                cost: 1.0,
            }]),
            ..Default::default()
        };
        assert!(calculate_cost_by_token_type(&entry).is_none());
    }

    #[test]
    fn test_single_model_fallback() {
        let entry = NormalizedEntry {
            tokens: TokenCounts::new(2_000_000, 0, 0, 1_000_000),
            models: vec!["claude-opus-4-20250514".to_string()],
            ..Default::default()
        };
        let cost = calculate_cost_by_token_type(&entry).unwrap();
        assert!((cost.input_cost - 30.0).abs() < 1e-9);
        assert!((cost.cache_read_cost - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_ambiguous_model_count_yields_none() {
        let zero = NormalizedEntry::default();
        assert!(calculate_cost_by_token_type(&zero).is_none());

        let multiple = NormalizedEntry {
            models: vec![
                "claude-opus-4-20250514".to_string(),
                "claude-sonnet-4-20250514".to_string(),
            ],
            ..Default::default()
        };
        assert!(calculate_cost_by_token_type(&multiple).is_none());
    }
}
