//! # gtt-report
//!
//! Turns raw GitLab time-tracking activity (issues plus time-log system
//! notes) into the pivot tables a report renderer consumes.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (issues, time-log records, snapshots)
//! - **config**: Calendar constants, filter/ignore configuration, validation
//! - **diag**: Structured diagnostics sink (parse failures, unmapped users)
//! - **health**: Data-health checks over the snapshot (date expectations)
//! - **parse**: Duration-token and system-note-body parsing into signed hours
//! - **calendar**: Project-relative week bucketing
//! - **resolve**: Ignore-list filters, display-name mapping, stable orderings
//! - **pivot**: The aggregation engine producing all report views
//!
//! Data flows one way: note bodies go through [`parse`] into [`models::Record`]
//! values, and the [`pivot::PivotEngine`] folds the immutable snapshot into
//! ordered tables. Fetching from the GitLab API, persistence, and chart
//! rendering are collaborators outside this crate.

pub mod calendar;
pub mod config;
pub mod diag;
pub mod health;
pub mod models;
pub mod parse;
pub mod pivot;
pub mod resolve;

pub use config::{CalendarConfig, ConfigError, FilterConfig, HealthConfig, ReportConfig};
pub use health::HealthReport;
pub use models::*;
pub use pivot::PivotEngine;
