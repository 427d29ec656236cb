//! Per-tenant roll-ups: to pay, to receive, history and summary.

pub mod service;

pub use service::{AggregationService, SplitSummary};
