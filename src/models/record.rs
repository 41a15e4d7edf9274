//! Time-log record model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One time-log entry extracted from a system note on an issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// The issue this entry belongs to
    pub iid: i64,

    /// Raw username of the author (grouping key; display mapping happens
    /// only at render time)
    pub user: String,

    /// The date the time was spent at
    pub date: NaiveDate,

    /// Note type as reported by the tracker
    #[serde(default)]
    pub kind: String,

    /// Signed hours: positive for logged time, negative for retracted time
    pub time: f64,

    /// Original note body, kept for diagnostics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note_body: Option<String>,
}

impl Record {
    pub fn new(iid: i64, user: impl Into<String>, date: NaiveDate, time: f64) -> Self {
        Self {
            iid,
            user: user.into(),
            date,
            kind: String::new(),
            time,
            note_body: None,
        }
    }
}
