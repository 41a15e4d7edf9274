//! Core data models for time-accounting reports.

mod issue;
mod record;
mod snapshot;

pub use issue::*;
pub use record::*;
pub use snapshot::*;
