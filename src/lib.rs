//! ccviz - Normalize, merge, and share Claude Code usage reports
//!
//! This library provides functionality to:
//! - Detect and adapt the JSON report shapes emitted by usage metering tools
//!   (daily, weekly, monthly, session, and billing-block reports, plus one
//!   alternate vendor dialect)
//! - Normalize every shape into one canonical entry list with totals
//! - Merge reports from multiple sources and roll daily data up to monthly
//! - Compute percentile and descriptive statistics with exact source
//!   attribution, and per-model token costs
//! - Encode a payload into a compact URL fragment and back, so a full
//!   analysis can be shared as a link
//!
//! # Examples
//!
//! ```
//! use ccviz::pipeline::parse_inputs;
//! use ccviz::stats::{MetricKey, build_distribution};
//! use ccviz::types::SourceInput;
//!
//! # fn main() -> ccviz::Result<()> {
//! let report = r#"{
//!     "daily": [{"date": "2025-07-01", "inputTokens": 100, "totalCost": 0.5}],
//!     "totals": {"inputTokens": 100, "totalCost": 0.5}
//! }"#;
//!
//! let data = parse_inputs(&[SourceInput::unlabeled(report)])?.expect("non-blank input");
//! assert_eq!(data.entries.len(), 1);
//!
//! let distribution = build_distribution(&data.entries, MetricKey::Cost);
//! assert_eq!(distribution[0].value, 0.5);
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod aggregation;
pub mod cli;
pub mod codec;
pub mod detector;
pub mod error;
pub mod normalizer;
pub mod pipeline;
pub mod pricing;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use error::{CcvizError, Result};
pub use types::{
    DashboardData, ModelBreakdown, NormalizedEntry, NormalizedTotals, ReportType, SourceInput,
    TokenCounts,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
