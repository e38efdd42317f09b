//! Report detection and wire-level report shapes
//!
//! The metering tools emit five incompatible JSON shapes, distinguished only
//! by which top-level array key is present: `daily`, `weekly`, `monthly`,
//! `sessions`, or `blocks`. [`detect`] classifies a parsed value by checking
//! those keys in order and deserializes the matched shape into the
//! corresponding [`Report`] variant. Detection performs no deep validation;
//! missing, `null`, and wrong-typed fields all fall back to their defaults,
//! so a recognized report never fails over a malformed field.

use crate::error::{CcvizError, Result};
use crate::types::{ModelBreakdown, NormalizedTotals, ReportType, TokenCounts, lenient};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The five canonical top-level report keys, in detection order
pub const REPORT_KEYS: [&str; 5] = ["daily", "weekly", "monthly", "sessions", "blocks"];

/// One day of usage in a daily report
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyRecord {
    /// Date in YYYY-MM-DD form
    #[serde(deserialize_with = "lenient")]
    pub date: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub total_cost: f64,
    #[serde(deserialize_with = "lenient")]
    pub models_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub model_breakdowns: Option<Vec<ModelBreakdown>>,
}

/// One week of usage in a weekly report
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WeeklyRecord {
    /// Week label (start-of-week date or ISO week)
    #[serde(deserialize_with = "lenient")]
    pub week: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub total_cost: f64,
    #[serde(deserialize_with = "lenient")]
    pub models_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub model_breakdowns: Option<Vec<ModelBreakdown>>,
}

/// One month of usage in a monthly report
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct MonthlyRecord {
    /// Month in YYYY-MM form
    #[serde(deserialize_with = "lenient")]
    pub month: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub total_cost: f64,
    #[serde(deserialize_with = "lenient")]
    pub models_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub model_breakdowns: Option<Vec<ModelBreakdown>>,
}

/// One session of usage in a session report
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    #[serde(deserialize_with = "lenient")]
    pub session_id: String,
    /// Project path; "Unknown Project" is a sentinel for no project
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub project_path: Option<String>,
    /// Last activity timestamp or date; sorts lexicographically
    #[serde(deserialize_with = "lenient")]
    pub last_activity: String,
    #[serde(flatten)]
    pub tokens: TokenCounts,
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub total_cost: f64,
    #[serde(deserialize_with = "lenient")]
    pub models_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub model_breakdowns: Option<Vec<ModelBreakdown>>,
}

/// Token counters nested inside a block record
///
/// Blocks name the cache counters differently from the other report kinds.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockTokenCounts {
    #[serde(deserialize_with = "lenient")]
    pub input_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub output_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub cache_creation_input_tokens: u64,
    #[serde(deserialize_with = "lenient")]
    pub cache_read_input_tokens: u64,
}

impl BlockTokenCounts {
    /// Convert to the canonical counter layout
    pub fn to_token_counts(self) -> TokenCounts {
        TokenCounts::new(
            self.input_tokens,
            self.output_tokens,
            self.cache_creation_input_tokens,
            self.cache_read_input_tokens,
        )
    }
}

/// One 5-hour billing block in a blocks report
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockRecord {
    #[serde(deserialize_with = "lenient")]
    pub id: String,
    /// Block start time as an RFC 3339 timestamp
    #[serde(deserialize_with = "lenient")]
    pub start_time: String,
    #[serde(deserialize_with = "lenient")]
    pub end_time: String,
    #[serde(deserialize_with = "lenient")]
    pub is_active: bool,
    /// Gap blocks represent inactivity and are excluded from normalization
    #[serde(deserialize_with = "lenient")]
    pub is_gap: bool,
    #[serde(deserialize_with = "lenient")]
    pub token_counts: BlockTokenCounts,
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    #[serde(rename = "costUSD", deserialize_with = "lenient")]
    pub cost_usd: f64,
    #[serde(deserialize_with = "lenient")]
    pub models: Vec<String>,
}

/// A daily report: `{ daily: [...], totals: {...} }`
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DailyReport {
    pub daily: Vec<DailyRecord>,
    #[serde(deserialize_with = "lenient")]
    pub totals: NormalizedTotals,
}

/// A weekly report: `{ weekly: [...], totals: {...} }`
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeeklyReport {
    pub weekly: Vec<WeeklyRecord>,
    #[serde(deserialize_with = "lenient")]
    pub totals: NormalizedTotals,
}

/// A monthly report: `{ monthly: [...], totals: {...} }`
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MonthlyReport {
    pub monthly: Vec<MonthlyRecord>,
    #[serde(deserialize_with = "lenient")]
    pub totals: NormalizedTotals,
}

/// A session report: `{ sessions: [...], totals: {...} }`
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionReport {
    pub sessions: Vec<SessionRecord>,
    #[serde(deserialize_with = "lenient")]
    pub totals: NormalizedTotals,
}

/// A blocks report: `{ blocks: [...] }`
///
/// Blocks reports carry no reliable totals object; totals are recomputed
/// from the non-gap blocks during normalization.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlocksReport {
    pub blocks: Vec<BlockRecord>,
}

/// A detected report, tagged by kind
///
/// New report kinds are added by extending this enum and the exhaustive
/// matches in the normalizer, never by any other dispatch mechanism.
#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    Daily(DailyReport),
    Weekly(WeeklyReport),
    Monthly(MonthlyReport),
    Session(SessionReport),
    Blocks(BlocksReport),
}

impl Report {
    /// The discriminant tag for this report
    pub fn kind(&self) -> ReportType {
        match self {
            Self::Daily(_) => ReportType::Daily,
            Self::Weekly(_) => ReportType::Weekly,
            Self::Monthly(_) => ReportType::Monthly,
            Self::Session(_) => ReportType::Session,
            Self::Blocks(_) => ReportType::Blocks,
        }
    }
}

/// Classify a parsed value into one of the five report kinds
///
/// Checks the canonical top-level keys in order; the first key whose value is
/// an array determines the kind. A key that is present but not array-valued
/// does not match. Fails with a format error for null, non-objects, objects
/// where no key matches, and records that are not objects at all; malformed
/// fields inside a record never fail detection.
pub fn detect(value: &Value) -> Result<Report> {
    let object = value
        .as_object()
        .ok_or_else(|| CcvizError::Format("input is not a JSON object".to_string()))?;

    for key in REPORT_KEYS {
        let is_array = object.get(key).map(Value::is_array).unwrap_or(false);
        if !is_array {
            continue;
        }
        let report = match key {
            "daily" => Report::Daily(deserialize_report(value)?),
            "weekly" => Report::Weekly(deserialize_report(value)?),
            "monthly" => Report::Monthly(deserialize_report(value)?),
            "sessions" => Report::Session(deserialize_report(value)?),
            "blocks" => Report::Blocks(deserialize_report(value)?),
            _ => unreachable!(),
        };
        return Ok(report);
    }

    Err(CcvizError::Format("unrecognized report shape".to_string()))
}

/// Structural failures in a recognized shape are format errors, not JSON
/// syntax errors
fn deserialize_report<T>(value: &Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value.clone())
        .map_err(|error| CcvizError::Format(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_daily() {
        let value = json!({
            "daily": [{"date": "2025-07-01", "inputTokens": 100, "totalCost": 0.5}],
            "totals": {"inputTokens": 100, "totalCost": 0.5}
        });

        let report = detect(&value).unwrap();
        assert_eq!(report.kind(), ReportType::Daily);
        let Report::Daily(daily) = report else {
            panic!("expected daily report");
        };
        assert_eq!(daily.daily.len(), 1);
        assert_eq!(daily.daily[0].date, "2025-07-01");
        assert_eq!(daily.daily[0].tokens.input_tokens, 100);
        // Missing counters default to zero
        assert_eq!(daily.daily[0].tokens.output_tokens, 0);
    }

    #[test]
    fn test_detect_each_kind() {
        for (key, kind) in [
            ("daily", ReportType::Daily),
            ("weekly", ReportType::Weekly),
            ("monthly", ReportType::Monthly),
            ("sessions", ReportType::Session),
            ("blocks", ReportType::Blocks),
        ] {
            let value = json!({ key: [] });
            assert_eq!(detect(&value).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_detect_rejects_non_object() {
        for value in [json!(null), json!(42), json!("daily"), json!([1, 2])] {
            let err = detect(&value).unwrap_err();
            assert!(err.to_string().contains("not a JSON object"), "{err}");
        }
    }

    #[test]
    fn test_null_and_mistyped_fields_fall_back_to_defaults() {
        let value = json!({
            "daily": [{"date": "2025-07-01", "inputTokens": null}],
            "totals": {}
        });
        let Report::Daily(report) = detect(&value).unwrap() else {
            panic!("expected daily report");
        };
        assert_eq!(report.daily[0].date, "2025-07-01");
        assert_eq!(report.daily[0].tokens.input_tokens, 0);

        let value = json!({
            "daily": [{"date": 123, "inputTokens": 1, "modelsUsed": "not-a-list"}],
            "totals": {"totalCost": null}
        });
        let Report::Daily(report) = detect(&value).unwrap() else {
            panic!("expected daily report");
        };
        assert_eq!(report.daily[0].date, "");
        assert_eq!(report.daily[0].tokens.input_tokens, 1);
        assert!(report.daily[0].models_used.is_empty());
        assert_eq!(report.totals.total_cost, 0.0);
    }

    #[test]
    fn test_null_totals_object_is_tolerated() {
        let value = json!({"daily": [], "totals": null});
        let Report::Daily(report) = detect(&value).unwrap() else {
            panic!("expected daily report");
        };
        assert_eq!(report.totals, NormalizedTotals::default());
    }

    #[test]
    fn test_structurally_invalid_record_is_a_format_error() {
        // A record that is not an object cannot be tolerated field by field
        let err = detect(&json!({"daily": [123], "totals": {}})).unwrap_err();
        assert!(matches!(err, CcvizError::Format(_)), "{err}");
    }

    #[test]
    fn test_detect_rejects_unrecognized_shape() {
        let err = detect(&json!({"hourly": []})).unwrap_err();
        assert!(err.to_string().contains("unrecognized"), "{err}");
    }

    #[test]
    fn test_non_array_key_does_not_match() {
        // "daily" exists but is not an array, so it never matches; the
        // array-valued "sessions" key wins instead.
        let value = json!({"daily": {"date": "2025-07-01"}, "sessions": []});
        assert_eq!(detect(&value).unwrap().kind(), ReportType::Session);

        // With no array-valued key at all, detection fails.
        let err = detect(&json!({"daily": 3})).unwrap_err();
        assert!(err.to_string().contains("unrecognized"));
    }

    #[test]
    fn test_block_record_field_names() {
        let value = json!({
            "blocks": [{
                "id": "b1",
                "startTime": "2025-07-01T10:00:00Z",
                "isGap": false,
                "tokenCounts": {
                    "inputTokens": 10,
                    "outputTokens": 20,
                    "cacheCreationInputTokens": 3,
                    "cacheReadInputTokens": 4
                },
                "totalTokens": 37,
                "costUSD": 0.12,
                "models": ["claude-sonnet-4-20250514"]
            }]
        });

        let Report::Blocks(report) = detect(&value).unwrap() else {
            panic!("expected blocks report");
        };
        let block = &report.blocks[0];
        let tokens = block.token_counts.to_token_counts();
        assert_eq!(tokens.cache_creation_tokens, 3);
        assert_eq!(tokens.cache_read_tokens, 4);
        assert!((block.cost_usd - 0.12).abs() < f64::EPSILON);
    }
}
