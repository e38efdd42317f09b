//! Multi-source input pipeline
//!
//! Takes any number of labeled raw-text inputs, parses and classifies each,
//! and produces one merged [`DashboardData`]. Blank inputs are skipped
//! silently; a top-level JSON array is treated as a batch of reports from one
//! source; sources of different report kinds refuse to merge.

use crate::adapter::adapt;
use crate::aggregation::{merge_normalized_entries, sum_entries};
use crate::detector::{Report, detect};
use crate::error::{CcvizError, Result};
use crate::normalizer::{normalize_entries, normalize_totals};
use crate::types::{DashboardData, ReportType, SourceInput};
use serde_json::Value;
use tracing::debug;

/// One parsed source: its label plus the reports it contributed
struct ParsedSource {
    label: String,
    reports: Vec<Report>,
}

/// Parse, classify, and merge a set of raw inputs
///
/// Returns `Ok(None)` when every input was blank (whitespace-only) or
/// contributed no reports; that is not an error. Fails with the first JSON
/// syntax error in input order, or with a merge error when the detected
/// report kinds differ across inputs.
///
/// A single surviving report is normalized directly and keeps its own totals.
/// Two or more are normalized independently, merged by label, and have their
/// totals recomputed from the merged entries.
pub fn parse_inputs(inputs: &[SourceInput]) -> Result<Option<DashboardData>> {
    let mut sources = Vec::new();
    for input in inputs {
        if input.text.trim().is_empty() {
            debug!(label = %input.label, "skipping blank input");
            continue;
        }

        let value: Value = serde_json::from_str(&input.text)?;
        let reports = match value {
            // A raw array is a flattened batch of reports from one source
            Value::Array(items) => items
                .into_iter()
                .map(|item| detect(&adapt(item)))
                .collect::<Result<Vec<_>>>()?,
            other => vec![detect(&adapt(other))?],
        };
        sources.push(ParsedSource {
            label: input.label.clone(),
            reports,
        });
    }

    let kinds = distinct_kinds(&sources);
    let Some(&report_type) = kinds.first() else {
        // All inputs were blank or empty batches
        return Ok(None);
    };
    if kinds.len() > 1 {
        let names: Vec<String> = kinds.iter().map(ToString::to_string).collect();
        return Err(CcvizError::MergeMismatch(names.join(", ")));
    }

    let reports: Vec<&Report> = sources.iter().flat_map(|s| &s.reports).collect();
    debug!(
        sources = sources.len(),
        reports = reports.len(),
        kind = %report_type,
        "merging parsed sources"
    );

    let (entries, totals) = if reports.len() == 1 {
        let only = reports[0];
        (normalize_entries(only), normalize_totals(only))
    } else {
        let normalized: Vec<_> = reports.iter().map(|r| normalize_entries(r)).collect();
        let merged = merge_normalized_entries(normalized);
        let totals = sum_entries(&merged);
        (merged, totals)
    };

    let source_labels = sources
        .iter()
        .filter(|s| !s.label.is_empty())
        .map(|s| s.label.clone())
        .collect();

    Ok(Some(DashboardData {
        entries,
        totals,
        report_type,
        source_labels,
    }))
}

/// Distinct report kinds across all sources, in first-seen order
fn distinct_kinds(sources: &[ParsedSource]) -> Vec<ReportType> {
    let mut kinds: Vec<ReportType> = Vec::new();
    for source in sources {
        for report in &source.reports {
            let kind = report.kind();
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }
    kinds
}
