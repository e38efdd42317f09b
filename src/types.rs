//! Core domain types for ccviz
//!
//! This module contains the canonical types every report kind is normalized
//! into: token counters, per-model breakdowns, normalized entries and totals,
//! and the merged dashboard result. Wire-level report shapes live in
//! [`crate::detector`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Field-level tolerance for malformed report values
///
/// `null` or a wrong-typed value deserializes as the field's default instead
/// of failing the whole report. Serde's `default` only covers missing fields,
/// so every tolerated wire field routes through this.
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::de::DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Token counts for usage tracking
///
/// Tracks all four token categories reported by the metering tools. Field
/// names serialize in the camelCase form the report JSON uses, and every
/// field defaults to zero so partially-filled records are tolerated.
///
/// # Examples
/// ```
/// use ccviz::types::TokenCounts;
///
/// let tokens = TokenCounts::new(100, 50, 10, 5);
/// assert_eq!(tokens.total(), 165);
///
/// let more = TokenCounts::new(50, 25, 5, 2);
/// let combined = tokens + more;
/// assert_eq!(combined.input_tokens, 150);
/// ```
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct TokenCounts {
    /// Input tokens used
    #[serde(deserialize_with = "lenient")]
    pub input_tokens: u64,
    /// Output tokens generated
    #[serde(deserialize_with = "lenient")]
    pub output_tokens: u64,
    /// Cache creation (cache write) tokens
    #[serde(deserialize_with = "lenient")]
    pub cache_creation_tokens: u64,
    /// Cache read tokens
    #[serde(deserialize_with = "lenient")]
    pub cache_read_tokens: u64,
}

impl TokenCounts {
    /// Create new TokenCounts
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_tokens: u64,
        cache_read_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_tokens,
            cache_read_tokens,
        }
    }

    /// Calculate total tokens
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens + self.cache_creation_tokens + self.cache_read_tokens
    }
}

impl Add for TokenCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            input_tokens: self.input_tokens + other.input_tokens,
            output_tokens: self.output_tokens + other.output_tokens,
            cache_creation_tokens: self.cache_creation_tokens + other.cache_creation_tokens,
            cache_read_tokens: self.cache_read_tokens + other.cache_read_tokens,
        }
    }
}

impl AddAssign for TokenCounts {
    fn add_assign(&mut self, other: Self) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cache_creation_tokens += other.cache_creation_tokens;
        self.cache_read_tokens += other.cache_read_tokens;
    }
}

/// The five report kinds produced by the metering tools
///
/// This is the discriminant that drives normalization: every input is
/// classified as exactly one kind, and sources of different kinds refuse
/// to merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Daily,
    Weekly,
    Monthly,
    Session,
    Blocks,
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "daily"),
            Self::Weekly => write!(f, "weekly"),
            Self::Monthly => write!(f, "monthly"),
            Self::Session => write!(f, "session"),
            Self::Blocks => write!(f, "blocks"),
        }
    }
}

/// Per-model slice of an entry
///
/// Summed breakdown fields need not exactly equal the parent entry's fields
/// (vendor rounding is tolerated).
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelBreakdown {
    /// Model identifier
    #[serde(deserialize_with = "lenient")]
    pub model_name: String,
    /// Token counts attributed to this model
    #[serde(flatten)]
    pub tokens: TokenCounts,
    /// Cost attributed to this model in USD
    #[serde(deserialize_with = "lenient")]
    pub cost: f64,
}

/// One normalized time-bucket, session, or block
///
/// The uniform shape every report kind is flattened into: a label (date,
/// month, session path, or block timestamp), the four token counters, the
/// total, the cost, and the contributing models.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedEntry {
    /// Date, month, week, session, or block label
    pub label: String,
    /// Token counts for this entry
    #[serde(flatten)]
    pub tokens: TokenCounts,
    /// Total tokens (as reported, or the sum of the four counters)
    pub total_tokens: u64,
    /// Cost in USD
    pub cost: f64,
    /// Model identifiers that contributed to this entry
    pub models: Vec<String>,
    /// Per-model detail, present only when the source carried it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_breakdowns: Option<Vec<ModelBreakdown>>,
}

/// Aggregate totals for a whole report or merge result
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NormalizedTotals {
    /// Token counts across all entries
    #[serde(flatten)]
    pub tokens: TokenCounts,
    /// Total tokens across all entries
    #[serde(deserialize_with = "lenient")]
    pub total_tokens: u64,
    /// Total cost in USD across all entries
    #[serde(deserialize_with = "lenient")]
    pub total_cost: f64,
}

/// Result of parsing and merging one or more report sources
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    /// Normalized entries, merged and sorted when multiple sources contributed
    pub entries: Vec<NormalizedEntry>,
    /// Aggregate totals
    pub totals: NormalizedTotals,
    /// Report kind shared by every contributing source
    pub report_type: ReportType,
    /// Non-empty source labels, in input order
    pub source_labels: Vec<String>,
}

/// One labeled raw input (file, paste, or stdin) prior to merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInput {
    /// Label shown for this source; empty means unlabeled
    pub label: String,
    /// Raw JSON text
    pub text: String,
}

impl SourceInput {
    /// Create a new SourceInput
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// An unlabeled input
    pub fn unlabeled(text: impl Into<String>) -> Self {
        Self::new("", text)
    }
}
