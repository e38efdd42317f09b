//! Generic grouping and merging of normalized entries
//!
//! One accumulation primitive serves the three use sites that need it: the
//! daily-to-monthly roll-up, the multi-source merge, and whole-report model
//! breakdown aggregation. Grouping sums the numeric fields, unions model
//! lists in first-seen order, and merges per-model breakdowns keyed by model
//! name.

use crate::types::{ModelBreakdown, NormalizedEntry, NormalizedTotals, TokenCounts};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Merges per-model breakdown records keyed by model name, preserving
/// first-seen order
#[derive(Debug, Default)]
struct BreakdownMerger {
    breakdowns: Vec<ModelBreakdown>,
    index: HashMap<String, usize>,
}

impl BreakdownMerger {
    fn extend(&mut self, breakdowns: &[ModelBreakdown]) {
        for breakdown in breakdowns {
            match self.index.get(&breakdown.model_name) {
                Some(&i) => {
                    let merged = &mut self.breakdowns[i];
                    merged.tokens += breakdown.tokens;
                    merged.cost += breakdown.cost;
                }
                None => {
                    self.index
                        .insert(breakdown.model_name.clone(), self.breakdowns.len());
                    self.breakdowns.push(breakdown.clone());
                }
            }
        }
    }

    fn into_vec(self) -> Vec<ModelBreakdown> {
        self.breakdowns
    }
}

/// Accumulator for one group of entries
#[derive(Debug, Default)]
struct EntryAccumulator {
    tokens: TokenCounts,
    total_tokens: u64,
    cost: f64,
    models: Vec<String>,
    seen_models: HashSet<String>,
    breakdowns: BreakdownMerger,
    has_breakdowns: bool,
}

impl EntryAccumulator {
    fn add(&mut self, entry: &NormalizedEntry) {
        self.tokens += entry.tokens;
        self.total_tokens += entry.total_tokens;
        self.cost += entry.cost;

        for model in &entry.models {
            if self.seen_models.insert(model.clone()) {
                self.models.push(model.clone());
            }
        }

        if let Some(breakdowns) = &entry.model_breakdowns {
            self.has_breakdowns = true;
            self.breakdowns.extend(breakdowns);
        }
    }

    fn into_entry(self, label: String) -> NormalizedEntry {
        NormalizedEntry {
            label,
            tokens: self.tokens,
            total_tokens: self.total_tokens,
            cost: self.cost,
            models: self.models,
            // Absent, not empty, when no member carried breakdowns
            model_breakdowns: self.has_breakdowns.then(|| self.breakdowns.into_vec()),
        }
    }
}

/// Group entries by a caller-supplied key
///
/// Entries whose key is `None` are excluded from every group. Each group sums
/// the token counters and cost, unions the model lists, and merges per-model
/// breakdowns by model name; the breakdown list is absent only when no member
/// carried one. The result is sorted ascending by group key using plain
/// byte-wise string comparison.
pub fn group_entries<F>(entries: &[NormalizedEntry], key_fn: F) -> Vec<NormalizedEntry>
where
    F: Fn(&NormalizedEntry) -> Option<String>,
{
    let mut groups: BTreeMap<String, EntryAccumulator> = BTreeMap::new();
    for entry in entries {
        if let Some(key) = key_fn(entry) {
            groups.entry(key).or_default().add(entry);
        }
    }

    groups
        .into_iter()
        .map(|(label, acc)| acc.into_entry(label))
        .collect()
}

/// Sum every entry's numeric fields into one totals value
pub fn sum_entries(entries: &[NormalizedEntry]) -> NormalizedTotals {
    let mut totals = NormalizedTotals::default();
    for entry in entries {
        totals.tokens += entry.tokens;
        totals.total_tokens += entry.total_tokens;
        totals.total_cost += entry.cost;
    }
    totals
}

/// Merge the per-model breakdowns of all entries, in first-seen order
///
/// Entries without breakdowns contribute nothing.
pub fn aggregate_model_breakdowns(entries: &[NormalizedEntry]) -> Vec<ModelBreakdown> {
    let mut merger = BreakdownMerger::default();
    for entry in entries {
        if let Some(breakdowns) = &entry.model_breakdowns {
            merger.extend(breakdowns);
        }
    }
    merger.into_vec()
}

/// Combine normalized entries from multiple sources
///
/// Zero sources yield nothing, a single source is returned unchanged, and
/// two or more are flattened and grouped by exact label equality. Entries
/// only merge when their label text matches exactly, date formats included.
pub fn merge_normalized_entries(sources: Vec<Vec<NormalizedEntry>>) -> Vec<NormalizedEntry> {
    match sources.len() {
        0 => Vec::new(),
        1 => sources.into_iter().next().unwrap_or_default(),
        _ => {
            let all: Vec<NormalizedEntry> = sources.into_iter().flatten().collect();
            group_entries(&all, |entry| Some(entry.label.clone()))
        }
    }
}
