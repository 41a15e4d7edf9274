//! Ignore-list filters, display-name resolution, and stable orderings.
//!
//! Grouping and sorting always happen on raw values (usernames, milestone
//! names, labels); display-name mapping is applied only when a renderer asks
//! for labels. Milestone ordering honors the explicitly configured order
//! when one exists, otherwise first-seen order over the non-ignored issues.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::config::FilterConfig;
use crate::diag::{DiagEvent, DiagLevel, DiagSink};
use crate::models::{Issue, Record};

/// Which ignore list a value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreKind {
    User,
    Milestone,
    Label,
}

/// Hash-set membership tests over the configured ignore lists.
#[derive(Debug, Clone)]
pub struct Filters {
    users: HashSet<String>,
    milestones: HashSet<String>,
    labels: HashSet<String>,
    milestones_in_order: Vec<String>,
}

impl Filters {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            users: config.ignore_users.iter().cloned().collect(),
            milestones: config.ignore_milestones.iter().cloned().collect(),
            labels: config.ignore_labels.iter().cloned().collect(),
            milestones_in_order: config.milestones_in_order.clone(),
        }
    }

    pub fn is_ignored(&self, kind: IgnoreKind, value: &str) -> bool {
        match kind {
            IgnoreKind::User => self.users.contains(value),
            IgnoreKind::Milestone => self.milestones.contains(value),
            IgnoreKind::Label => self.labels.contains(value),
        }
    }

    /// Milestones in report order.
    ///
    /// The configured explicit order (minus ignored entries) wins; without
    /// one, milestones appear in first-seen order over non-ignored issues.
    pub fn ordered_milestones(&self, issues: &[Issue]) -> Vec<String> {
        if !self.milestones_in_order.is_empty() {
            return self
                .milestones_in_order
                .iter()
                .filter(|m| !self.is_ignored(IgnoreKind::Milestone, m))
                .cloned()
                .collect();
        }

        let mut seen = HashSet::new();
        let mut milestones = Vec::new();
        for issue in issues {
            if self.is_ignored(IgnoreKind::Milestone, &issue.milestone) {
                continue;
            }
            if seen.insert(issue.milestone.clone()) {
                milestones.push(issue.milestone.clone());
            }
        }
        milestones
    }

    /// Raw usernames of non-ignored records, deduplicated and sorted
    /// ascending. Raw names are the grouping and sort keys everywhere.
    pub fn ordered_users(&self, records: &[Record]) -> Vec<String> {
        let mut users: Vec<String> = records
            .iter()
            .filter(|r| !self.is_ignored(IgnoreKind::User, &r.user))
            .map(|r| r.user.clone())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        users.sort();
        users
    }

    /// Labels in first-seen order across issues, minus ignored ones.
    pub fn ordered_labels(&self, issues: &[Issue]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut labels = Vec::new();
        for issue in issues {
            for label in &issue.labels {
                if self.is_ignored(IgnoreKind::Label, label) {
                    continue;
                }
                if seen.insert(label.clone()) {
                    labels.push(label.clone());
                }
            }
        }
        labels
    }
}

/// Maps raw usernames to display names for rendering.
///
/// An unmapped username falls back to the raw name and is reported once per
/// distinct name per run.
#[derive(Debug)]
pub struct NameResolver {
    mapping: HashMap<String, String>,
    warned: Mutex<HashSet<String>>,
}

impl NameResolver {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            mapping: config.username_mapping.clone(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn display_name(&self, raw: &str, sink: &dyn DiagSink) -> String {
        if let Some(name) = self.mapping.get(raw) {
            return name.clone();
        }
        let mut warned = self.warned.lock().expect("name resolver poisoned");
        if warned.insert(raw.to_string()) {
            sink.emit(
                DiagEvent::new(DiagLevel::Warn, "no display-name mapping for user")
                    .with("user", raw),
            );
        }
        raw.to_string()
    }

    /// Map a whole ordered username list for rendering.
    pub fn display_names(&self, raw: &[String], sink: &dyn DiagSink) -> Vec<String> {
        raw.iter().map(|u| self.display_name(u, sink)).collect()
    }
}
