//! Result persistence and post-batch reporting.
//!
//! - [`table`]: append-only CSV result tables (the persisted artifact
//!   downstream curve fitting and plotting consume)
//! - [`stats`]: summary statistics over a batch
//! - [`printer`]: compact terminal summary
//! - [`report`]: optional JSON report export

pub mod printer;
pub mod report;
pub mod stats;
pub mod table;

pub use printer::SummaryPrinter;
pub use report::export_json;
pub use stats::{BatchStats, compute_stats};
pub use table::{METRIC_HEADER, RUNTIME_HEADER, ResultTable};
