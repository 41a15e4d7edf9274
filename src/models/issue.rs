//! Tracked issue model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A tracked ticket as loaded from the issue tracker.
///
/// `spent` and `total_estimate` are the tracker's own authoritative totals;
/// they are never derived by summing time-log records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Project-scoped issue id
    pub iid: i64,

    /// Issue title
    pub title: String,

    /// Total spent hours as reported by the tracker
    pub spent: f64,

    /// Total estimated hours as reported by the tracker
    pub total_estimate: f64,

    /// Labels attached to the issue
    pub labels: Vec<String>,

    /// Milestone name (empty when the issue has none)
    #[serde(default)]
    pub milestone: String,

    /// Lifecycle state as reported by the tracker (e.g. "opened", "closed")
    #[serde(default)]
    pub state: String,

    /// Whether the issue is closed
    #[serde(default)]
    pub closed: bool,

    /// When the issue was created
    pub created_at: NaiveDate,

    /// When the issue was last updated
    pub updated_at: NaiveDate,
}

impl Issue {
    /// Create an issue with the identifying fields set and tracker totals zeroed.
    pub fn new(iid: i64, title: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            iid,
            title: title.into(),
            spent: 0.0,
            total_estimate: 0.0,
            labels: Vec::new(),
            milestone: String::new(),
            state: String::new(),
            closed: false,
            created_at,
            updated_at: created_at,
        }
    }

    /// Builder method to set tracker totals.
    pub fn with_totals(mut self, total_estimate: f64, spent: f64) -> Self {
        self.total_estimate = total_estimate;
        self.spent = spent;
        self
    }

    /// Builder method to set the milestone.
    pub fn with_milestone(mut self, milestone: impl Into<String>) -> Self {
        self.milestone = milestone.into();
        self
    }

    /// Builder method to set labels.
    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.labels = labels;
        self
    }
}
