//! Alternate vendor schema adapter
//!
//! One metering tool emits a daily report in a different dialect: the cost
//! field is `costUSD` instead of `totalCost`, dates are human-readable
//! ("Jul 1, 2025"), cached tokens are a single `cachedTokens` counter, and
//! per-model detail is a map keyed by model name rather than an array.
//! [`adapt`] rewrites that dialect into the canonical shape so detection and
//! normalization never have to know about it.
//!
//! Anything that does not look like the alternate dialect, including arrays,
//! non-objects, and already-canonical reports, passes through unchanged.

use chrono::NaiveDate;
use serde_json::{Map, Value, json};
use tracing::debug;

/// Rewrite an alternate-dialect report into the canonical shape
///
/// Detection is a heuristic, not a version tag: the value must have a
/// non-empty `daily` array whose first element carries `costUSD` and lacks
/// `totalCost`. Non-matching values are returned as-is.
pub fn adapt(value: Value) -> Value {
    if !is_alternate_shape(&value) {
        return value;
    }
    debug!("adapting alternate vendor report shape");

    let mut value = value;
    if let Some(days) = value.get_mut("daily").and_then(Value::as_array_mut) {
        for day in days {
            if let Some(record) = day.as_object_mut() {
                rewrite_date(record);
                rewrite_cost_fields(record);
                rewrite_model_map(record);
            }
        }
    }
    if let Some(totals) = value.get_mut("totals").and_then(Value::as_object_mut) {
        rewrite_cost_fields(totals);
    }
    value
}

fn is_alternate_shape(value: &Value) -> bool {
    let Some(first) = value
        .get("daily")
        .and_then(Value::as_array)
        .and_then(|days| days.first())
        .and_then(Value::as_object)
    else {
        return false;
    };
    first.contains_key("costUSD") && !first.contains_key("totalCost")
}

/// "Mon DD, YYYY" becomes "YYYY-MM-DD"; unparseable dates pass through.
fn rewrite_date(record: &mut Map<String, Value>) {
    let Some(date) = record.get("date").and_then(Value::as_str) else {
        return;
    };
    if let Ok(parsed) = NaiveDate::parse_from_str(date, "%b %d, %Y") {
        record.insert(
            "date".to_string(),
            Value::String(parsed.format("%Y-%m-%d").to_string()),
        );
    }
}

/// `costUSD` becomes `totalCost`; `cachedTokens` becomes the cache-read
/// counter with cache-write forced to zero.
fn rewrite_cost_fields(record: &mut Map<String, Value>) {
    if let Some(cost) = record.remove("costUSD") {
        record.insert("totalCost".to_string(), cost);
    }
    if let Some(cached) = record.remove("cachedTokens") {
        record.insert("cacheReadTokens".to_string(), cached);
        record.insert("cacheCreationTokens".to_string(), json!(0));
    }
}

/// A `modelBreakdowns` map keyed by model name becomes an ordered array, and
/// `modelsUsed` is derived as the same ordered key list.
fn rewrite_model_map(record: &mut Map<String, Value>) {
    let Some(Value::Object(by_model)) = record.get("modelBreakdowns") else {
        return;
    };
    let by_model = by_model.clone();

    let mut breakdowns = Vec::with_capacity(by_model.len());
    let mut models = Vec::with_capacity(by_model.len());
    for (model_name, detail) in by_model {
        let mut detail = match detail {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        rewrite_cost_fields(&mut detail);
        // The breakdown cost field is named "cost" in the canonical shape
        if let Some(cost) = detail.remove("totalCost") {
            detail.insert("cost".to_string(), cost);
        }
        detail.insert("modelName".to_string(), Value::String(model_name.clone()));
        models.push(Value::String(model_name));
        breakdowns.push(Value::Object(detail));
    }

    record.insert("modelBreakdowns".to_string(), Value::Array(breakdowns));
    record.insert("modelsUsed".to_string(), Value::Array(models));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alternate_report() -> Value {
        json!({
            "daily": [{
                "date": "Jul 01, 2025",
                "inputTokens": 100,
                "outputTokens": 50,
                "cachedTokens": 200,
                "costUSD": 0.5,
                "modelBreakdowns": {
                    "claude-sonnet-4-20250514": {
                        "inputTokens": 60,
                        "outputTokens": 30,
                        "costUSD": 0.3
                    },
                    "claude-opus-4-20250514": {
                        "inputTokens": 40,
                        "outputTokens": 20,
                        "costUSD": 0.2
                    }
                }
            }],
            "totals": {
                "inputTokens": 100,
                "outputTokens": 50,
                "cachedTokens": 200,
                "costUSD": 0.5
            }
        })
    }

    #[test]
    fn test_adapts_alternate_shape() {
        let adapted = adapt(alternate_report());
        let day = &adapted["daily"][0];

        assert_eq!(day["date"], "2025-07-01");
        assert_eq!(day["totalCost"], 0.5);
        assert!(day.get("costUSD").is_none());
        assert_eq!(day["cacheReadTokens"], 200);
        assert_eq!(day["cacheCreationTokens"], 0);

        let breakdowns = day["modelBreakdowns"].as_array().unwrap();
        assert_eq!(breakdowns.len(), 2);
        // Map iteration order is document order, and models mirrors it
        assert_eq!(breakdowns[0]["modelName"], "claude-sonnet-4-20250514");
        assert_eq!(breakdowns[0]["cost"], 0.3);
        assert_eq!(
            day["modelsUsed"],
            json!(["claude-sonnet-4-20250514", "claude-opus-4-20250514"])
        );

        let totals = &adapted["totals"];
        assert_eq!(totals["totalCost"], 0.5);
        assert_eq!(totals["cacheReadTokens"], 200);
        assert_eq!(totals["cacheCreationTokens"], 0);
    }

    #[test]
    fn test_invalid_date_passes_through() {
        let mut report = alternate_report();
        report["daily"][0]["date"] = json!("sometime last week");
        let adapted = adapt(report);
        assert_eq!(adapted["daily"][0]["date"], "sometime last week");
    }

    #[test]
    fn test_canonical_report_is_identity() {
        let canonical = json!({
            "daily": [{"date": "2025-07-01", "inputTokens": 100, "totalCost": 0.5}],
            "totals": {"totalCost": 0.5}
        });
        assert_eq!(adapt(canonical.clone()), canonical);
    }

    #[test]
    fn test_non_matching_values_are_identity() {
        for value in [
            json!(null),
            json!([1, 2, 3]),
            json!("text"),
            json!({"daily": []}),
            json!({"sessions": [{"costUSD": 1.0}]}),
        ] {
            assert_eq!(adapt(value.clone()), value);
        }
    }

    #[test]
    fn test_adapted_report_detects_as_daily() {
        let adapted = adapt(alternate_report());
        let report = crate::detector::detect(&adapted).unwrap();
        assert_eq!(report.kind(), crate::types::ReportType::Daily);
    }
}
