//! Immutable run snapshot.

use serde::{Deserialize, Serialize};

use super::{Issue, Record};

/// The fully materialized input of one report run.
///
/// Loaded once by an ingestion collaborator and only ever read afterwards.
/// Records may reference issues that are not present in `issues`; such
/// records contribute zero to any view that joins on the issue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub issues: Vec<Issue>,
    pub records: Vec<Record>,
}

impl Snapshot {
    pub fn new(issues: Vec<Issue>, records: Vec<Record>) -> Self {
        Self { issues, records }
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty() && self.records.is_empty()
    }
}
