//! The aggregation engine behind every report view.
//!
//! One engine instance wraps an immutable snapshot and computes each view as
//! a pure function; views share the user/milestone orderings and the
//! user-by-week join, and may be called in any order (or concurrently — the
//! engine holds no mutable state). Values are rounded only at the edges;
//! cumulative series are summed unrounded so rounding error never compounds
//! across weeks.

mod rows;

pub use rows::*;

use std::collections::HashMap;

use crate::calendar;
use crate::config::{CalendarConfig, FilterConfig};
use crate::diag::{DiagEvent, DiagLevel, DiagSink};
use crate::models::{Issue, Snapshot};
use crate::resolve::{Filters, IgnoreKind};

/// Round to a fixed number of decimal places for display.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Pivot engine over one immutable snapshot.
pub struct PivotEngine<'a> {
    snapshot: &'a Snapshot,
    calendar: &'a CalendarConfig,
    filters: Filters,
    sink: &'a dyn DiagSink,
    ignore_empty_issues: bool,
    decimals: u32,
}

impl<'a> PivotEngine<'a> {
    pub fn new(
        snapshot: &'a Snapshot,
        calendar: &'a CalendarConfig,
        filter_config: &FilterConfig,
        sink: &'a dyn DiagSink,
    ) -> Self {
        Self {
            snapshot,
            calendar,
            filters: Filters::new(filter_config),
            sink,
            ignore_empty_issues: filter_config.ignore_empty_issues,
            decimals: filter_config.round_to_decimals,
        }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    fn round(&self, value: f64) -> f64 {
        round_to(value, self.decimals)
    }

    /// Estimate and spent per issue, in snapshot order. Issues with a zero
    /// estimate are dropped unless `ignore_empty_issues` is off.
    pub fn by_issue(&self) -> Vec<IssueRow> {
        self.snapshot
            .issues
            .iter()
            .filter(|i| i.total_estimate > 0.0 || !self.ignore_empty_issues)
            .map(|i| IssueRow {
                iid: i.iid,
                title: i.title.clone(),
                estimate: self.round(i.total_estimate),
                spent: self.round(i.spent),
            })
            .collect()
    }

    /// Estimate and spent totals per non-ignored milestone.
    pub fn by_milestone(&self) -> Vec<MilestoneRow> {
        let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
        for issue in &self.snapshot.issues {
            if self.filters.is_ignored(IgnoreKind::Milestone, &issue.milestone) {
                continue;
            }
            let entry = sums.entry(issue.milestone.as_str()).or_default();
            entry.0 += issue.total_estimate;
            entry.1 += issue.spent;
        }

        self.filters
            .ordered_milestones(&self.snapshot.issues)
            .into_iter()
            .map(|milestone| {
                let (estimate, spent) = sums.get(milestone.as_str()).copied().unwrap_or_default();
                MilestoneRow {
                    milestone,
                    estimate: self.round(estimate),
                    spent: self.round(spent),
                }
            })
            .collect()
    }

    /// Total logged hours per non-ignored user, users sorted by raw name.
    pub fn by_user(&self) -> Vec<UserRow> {
        let mut sums: HashMap<&str, f64> = HashMap::new();
        for record in &self.snapshot.records {
            if self.filters.is_ignored(IgnoreKind::User, &record.user) {
                continue;
            }
            *sums.entry(record.user.as_str()).or_default() += record.time;
        }

        self.filters
            .ordered_users(&self.snapshot.records)
            .into_iter()
            .map(|user| {
                let spent = self.round(sums.get(user.as_str()).copied().unwrap_or_default());
                UserRow { user, spent }
            })
            .collect()
    }

    /// Unrounded per-user week sums; shared by the matrix and cumulative
    /// views. Records bucketed past the project end are dropped.
    fn raw_user_week(&self) -> (Vec<String>, Vec<Vec<f64>>) {
        let users = self.filters.ordered_users(&self.snapshot.records);
        let weeks = calendar::total_weeks(self.calendar) as usize;
        let index: HashMap<&str, usize> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), i))
            .collect();

        let mut sums = vec![vec![0.0; weeks]; users.len()];
        for record in &self.snapshot.records {
            let Some(&u) = index.get(record.user.as_str()) else {
                continue;
            };
            let week = calendar::week_number(record.date, self.calendar.project_start) as usize;
            if week <= weeks {
                sums[u][week - 1] += record.time;
            }
        }
        (users, sums)
    }

    /// Users-by-weeks matrix over weeks `1..=total_weeks`, zero-filled and
    /// rounded per cell.
    pub fn by_user_by_week(&self) -> WeekMatrix {
        let (users, raw) = self.raw_user_week();
        let hours = raw
            .into_iter()
            .map(|row| row.into_iter().map(|v| self.round(v)).collect())
            .collect();
        WeekMatrix {
            users,
            weeks: calendar::total_weeks(self.calendar),
            hours,
        }
    }

    /// Stacked per-user series for layered-area rendering.
    ///
    /// Users are stacked in reverse name order onto a running per-week
    /// baseline, then the emitted list is reversed again: the first series
    /// carries the full cumulative total (drawn first, bottom layer) and the
    /// last series is a single user's own raw week sums (top layer).
    pub fn by_user_by_week_cumulative(&self) -> Vec<UserSeries> {
        let (users, raw) = self.raw_user_week();
        let weeks = calendar::total_weeks(self.calendar) as usize;

        let mut baseline = vec![0.0; weeks];
        let mut series: Vec<UserSeries> = Vec::with_capacity(users.len());
        for (user, raw_row) in users.iter().zip(raw.iter()).rev() {
            let stacked: Vec<f64> = raw_row
                .iter()
                .zip(baseline.iter())
                .map(|(own, below)| own + below)
                .collect();
            baseline.clone_from(&stacked);
            series.push(UserSeries {
                user: user.clone(),
                hours: stacked,
            });
        }
        series.reverse();
        series
    }

    /// Estimate and spent totals per non-ignored label, full fan-out: an
    /// issue contributes its whole totals to every label it carries.
    pub fn by_label(&self) -> Vec<LabelRow> {
        let mut sums: HashMap<&str, (f64, f64)> = HashMap::new();
        for issue in &self.snapshot.issues {
            for label in &issue.labels {
                if self.filters.is_ignored(IgnoreKind::Label, label) {
                    continue;
                }
                let entry = sums.entry(label.as_str()).or_default();
                entry.0 += issue.total_estimate;
                entry.1 += issue.spent;
            }
        }

        self.filters
            .ordered_labels(&self.snapshot.issues)
            .into_iter()
            .map(|label| {
                let (estimate, spent) = sums.get(label.as_str()).copied().unwrap_or_default();
                LabelRow {
                    label,
                    estimate: self.round(estimate),
                    spent: self.round(spent),
                }
            })
            .collect()
    }

    /// Unrounded user-by-milestone sums from the record-to-issue join.
    /// Records whose issue is missing contribute nothing (a deleted or
    /// out-of-range issue is not an error).
    fn raw_user_milestone(&self) -> (Vec<String>, Vec<String>, Vec<Vec<f64>>) {
        let users = self.filters.ordered_users(&self.snapshot.records);
        let milestones = self.filters.ordered_milestones(&self.snapshot.issues);

        let user_index: HashMap<&str, usize> = users
            .iter()
            .enumerate()
            .map(|(i, u)| (u.as_str(), i))
            .collect();
        let milestone_index: HashMap<&str, usize> = milestones
            .iter()
            .enumerate()
            .map(|(i, m)| (m.as_str(), i))
            .collect();
        let issue_by_iid: HashMap<i64, &Issue> = self
            .snapshot
            .issues
            .iter()
            .map(|i| (i.iid, i))
            .collect();

        let mut sums = vec![vec![0.0; milestones.len()]; users.len()];
        for record in &self.snapshot.records {
            let Some(&u) = user_index.get(record.user.as_str()) else {
                continue;
            };
            let Some(issue) = issue_by_iid.get(&record.iid) else {
                continue;
            };
            let Some(&m) = milestone_index.get(issue.milestone.as_str()) else {
                continue;
            };
            sums[u][m] += record.time;
        }
        (users, milestones, sums)
    }

    /// Logged hours per user per milestone (user-major).
    pub fn by_user_by_milestone(&self) -> CrossTab {
        let (users, milestones, raw) = self.raw_user_milestone();
        let hours = raw
            .into_iter()
            .map(|row| row.into_iter().map(|v| self.round(v)).collect())
            .collect();
        CrossTab {
            rows: users,
            cols: milestones,
            hours,
        }
    }

    /// Logged hours per milestone per user (milestone-major transpose).
    pub fn by_milestone_by_user(&self) -> CrossTab {
        let (users, milestones, raw) = self.raw_user_milestone();
        let hours = (0..milestones.len())
            .map(|m| (0..users.len()).map(|u| self.round(raw[u][m])).collect())
            .collect();
        CrossTab {
            rows: milestones,
            cols: users,
            hours,
        }
    }

    /// Issues carrying more than one non-ignored label, with their label
    /// lists. Such issues appear once per label in [`Self::by_label`], which
    /// skews label totals; the set is reported to the diagnostics sink and
    /// returned for any consumer that wants it.
    pub fn multi_label_issues(&self) -> Vec<MultiLabelIssue> {
        let mut flagged = Vec::new();
        for issue in &self.snapshot.issues {
            let labels: Vec<String> = issue
                .labels
                .iter()
                .filter(|l| !self.filters.is_ignored(IgnoreKind::Label, l))
                .cloned()
                .collect();
            if labels.len() > 1 {
                flagged.push(MultiLabelIssue {
                    iid: issue.iid,
                    title: issue.title.clone(),
                    labels,
                });
            }
        }

        if !flagged.is_empty() {
            self.sink
                .warn("some issues carry more than one reported label; label totals will overlap");
            for issue in &flagged {
                self.sink.emit(
                    DiagEvent::new(DiagLevel::Info, "issue is reported once per label")
                        .with("iid", issue.iid)
                        .with("title", issue.title.as_str())
                        .with("labels", issue.labels.clone()),
                );
            }
        }
        flagged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;
    use crate::models::{Issue, Record};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixture() -> Snapshot {
        let created = date(2021, 2, 22);
        let issues = vec![
            Issue::new(1, "Login page", created)
                .with_totals(10.0, 8.0)
                .with_milestone("Sprint 1")
                .with_labels(vec!["ui".to_string()]),
            Issue::new(2, "Crash on save", created)
                .with_totals(6.0, 7.5)
                .with_milestone("Sprint 1")
                .with_labels(vec!["bug".to_string(), "ui".to_string()]),
            Issue::new(3, "Spike", created)
                .with_totals(0.0, 2.0)
                .with_milestone("Sprint 2"),
            Issue::new(4, "Internal chores", created)
                .with_totals(4.0, 4.0)
                .with_milestone("Backlog")
                .with_labels(vec!["ops".to_string()]),
        ];
        let records = vec![
            Record::new(1, "anna", date(2021, 2, 23), 3.0),
            Record::new(2, "anna", date(2021, 3, 1), 2.5),
            Record::new(1, "zoe", date(2021, 2, 24), 1.5),
            Record::new(3, "zoe", date(2021, 3, 2), 2.0),
            Record::new(2, "zoe", date(2021, 3, 8), -0.5),
            Record::new(1, "bot", date(2021, 2, 23), 5.0),
            // references no issue: counts for the user, never for milestones
            Record::new(99, "anna", date(2021, 2, 25), 4.0),
        ];
        Snapshot::new(issues, records)
    }

    fn filter_config() -> FilterConfig {
        FilterConfig {
            ignore_users: vec!["bot".to_string()],
            ignore_milestones: vec!["Backlog".to_string()],
            ..FilterConfig::default()
        }
    }

    fn engine<'a>(snapshot: &'a Snapshot, sink: &'a MemorySink) -> PivotEngine<'a> {
        // default calendar: 2021-02-22 .. 2021-06-10, 8h days, 5d weeks
        static CALENDAR: std::sync::OnceLock<CalendarConfig> = std::sync::OnceLock::new();
        let calendar = CALENDAR.get_or_init(CalendarConfig::default);
        PivotEngine::new(snapshot, calendar, &filter_config(), sink)
    }

    #[test]
    fn test_by_issue_drops_zero_estimates_by_default() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let rows = engine(&snapshot, &sink).by_issue();
        assert_eq!(
            rows.iter().map(|r| r.iid).collect::<Vec<_>>(),
            vec![1, 2, 4]
        );
        assert_eq!(rows[0].estimate, 10.0);
        assert_eq!(rows[1].spent, 7.5);
    }

    #[test]
    fn test_by_issue_keeps_zero_estimates_when_configured() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let calendar = CalendarConfig::default();
        let config = FilterConfig {
            ignore_empty_issues: false,
            ..filter_config()
        };
        let engine = PivotEngine::new(&snapshot, &calendar, &config, &sink);
        assert_eq!(engine.by_issue().len(), 4);
    }

    #[test]
    fn test_by_milestone_sums_and_order() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let rows = engine(&snapshot, &sink).by_milestone();
        assert_eq!(
            rows,
            vec![
                MilestoneRow {
                    milestone: "Sprint 1".to_string(),
                    estimate: 16.0,
                    spent: 15.5,
                },
                MilestoneRow {
                    milestone: "Sprint 2".to_string(),
                    estimate: 0.0,
                    spent: 2.0,
                },
            ]
        );
    }

    #[test]
    fn test_by_user_sums_signed_time() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let rows = engine(&snapshot, &sink).by_user();
        // anna: 3 + 2.5 + 4 (record without an issue still counts here)
        // zoe: 1.5 + 2 - 0.5; bot is ignored
        assert_eq!(
            rows,
            vec![
                UserRow {
                    user: "anna".to_string(),
                    spent: 9.5,
                },
                UserRow {
                    user: "zoe".to_string(),
                    spent: 3.0,
                },
            ]
        );
    }

    #[test]
    fn test_by_user_by_week_matrix() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let matrix = engine(&snapshot, &sink).by_user_by_week();
        assert_eq!(matrix.users, vec!["anna", "zoe"]);
        assert_eq!(matrix.weeks, 16);
        assert_eq!(matrix.hours[0][0], 7.0); // anna week 1: 3 + 4
        assert_eq!(matrix.hours[0][1], 2.5); // anna week 2
        assert_eq!(matrix.hours[1][0], 1.5); // zoe week 1
        assert_eq!(matrix.hours[1][1], 2.0); // zoe week 2
        assert_eq!(matrix.hours[1][2], -0.5); // zoe week 3
        assert_eq!(matrix.hours[0][15], 0.0); // zero-filled tail
    }

    #[test]
    fn test_week_sums_reconcile_with_by_user() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);
        let matrix = engine.by_user_by_week();
        for (user_row, week_row) in engine.by_user().iter().zip(matrix.hours.iter()) {
            let total: f64 = week_row.iter().sum();
            assert!(
                (total - user_row.spent).abs() < 1e-9,
                "user {} weeks {} vs total {}",
                user_row.user,
                total,
                user_row.spent
            );
        }
    }

    #[test]
    fn test_records_past_project_end_leave_the_week_matrix() {
        // 2021-06-14 is the first day past week 16 of the default calendar
        let snapshot = Snapshot::new(
            vec![Issue::new(1, "Login page", date(2021, 2, 22)).with_totals(10.0, 8.0)],
            vec![
                Record::new(1, "anna", date(2021, 2, 23), 3.0),
                Record::new(1, "anna", date(2021, 6, 14), 2.0),
            ],
        );
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);

        let matrix = engine.by_user_by_week();
        let bucketed: f64 = matrix.hours[0].iter().sum();
        assert_eq!(bucketed, 3.0);

        // by_user still counts the out-of-range record
        assert_eq!(engine.by_user()[0].spent, 5.0);
    }

    #[test]
    fn test_cumulative_layering() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);
        let series = engine.by_user_by_week_cumulative();
        let matrix = engine.by_user_by_week();

        // bottom layer first: full totals, then progressively fewer users
        assert_eq!(series[0].user, "anna");
        assert_eq!(series[1].user, "zoe");

        // the last series is that user's own raw sums
        for w in 0..matrix.weeks as usize {
            assert!((series[1].hours[w] - matrix.hours[1][w]).abs() < 1e-9);
        }
        // the first series is the sum over all users at every week
        for w in 0..matrix.weeks as usize {
            let total: f64 = matrix.hours.iter().map(|row| row[w]).sum();
            assert!((series[0].hours[w] - total).abs() < 1e-9);
        }
    }

    #[test]
    fn test_by_label_fan_out() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let rows = engine(&snapshot, &sink).by_label();
        assert_eq!(
            rows.iter().map(|r| r.label.as_str()).collect::<Vec<_>>(),
            vec!["ui", "bug", "ops"]
        );
        // issue 2 is credited in full to both "ui" and "bug"
        assert_eq!(rows[0].estimate, 16.0);
        assert_eq!(rows[0].spent, 15.5);
        assert_eq!(rows[1].estimate, 6.0);
        assert_eq!(rows[1].spent, 7.5);
        assert_eq!(rows[2].spent, 4.0);
    }

    #[test]
    fn test_by_user_by_milestone_join() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let tab = engine(&snapshot, &sink).by_user_by_milestone();
        assert_eq!(tab.rows, vec!["anna", "zoe"]);
        assert_eq!(tab.cols, vec!["Sprint 1", "Sprint 2"]);
        // anna's orphan record (iid 99) contributes nothing here
        assert_eq!(tab.hours, vec![vec![5.5, 0.0], vec![1.0, 2.0]]);
    }

    #[test]
    fn test_by_milestone_by_user_is_transpose() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);
        let by_user = engine.by_user_by_milestone();
        let by_milestone = engine.by_milestone_by_user();
        assert_eq!(by_milestone.rows, by_user.cols);
        assert_eq!(by_milestone.cols, by_user.rows);
        for (m, row) in by_milestone.hours.iter().enumerate() {
            for (u, value) in row.iter().enumerate() {
                assert_eq!(*value, by_user.hours[u][m]);
            }
        }
    }

    #[test]
    fn test_multi_label_issues_side_channel() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let flagged = engine(&snapshot, &sink).multi_label_issues();
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].iid, 2);
        assert_eq!(flagged[0].labels, vec!["bug", "ui"]);
        assert_eq!(sink.count(DiagLevel::Warn), 1);
        assert_eq!(sink.count(DiagLevel::Info), 1);
    }

    #[test]
    fn test_multi_label_quiet_when_none() {
        let snapshot = Snapshot::new(
            vec![Issue::new(1, "only one label", date(2021, 3, 1))
                .with_totals(1.0, 1.0)
                .with_labels(vec!["ui".to_string()])],
            vec![],
        );
        let sink = MemorySink::new();
        assert!(engine(&snapshot, &sink).multi_label_issues().is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_empty_snapshot_yields_empty_views() {
        let snapshot = Snapshot::default();
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);
        assert!(engine.by_issue().is_empty());
        assert!(engine.by_milestone().is_empty());
        assert!(engine.by_user().is_empty());
        assert!(engine.by_user_by_week().users.is_empty());
        assert!(engine.by_user_by_week_cumulative().is_empty());
        assert!(engine.by_label().is_empty());
        assert!(engine.by_user_by_milestone().rows.is_empty());
        assert!(engine.by_milestone_by_user().rows.is_empty());
    }

    #[test]
    fn test_views_are_deterministic() {
        let snapshot = fixture();
        let sink = MemorySink::new();
        let engine = engine(&snapshot, &sink);
        assert_eq!(engine.by_issue(), engine.by_issue());
        assert_eq!(engine.by_milestone(), engine.by_milestone());
        assert_eq!(engine.by_user(), engine.by_user());
        assert_eq!(engine.by_user_by_week(), engine.by_user_by_week());
        assert_eq!(
            engine.by_user_by_week_cumulative(),
            engine.by_user_by_week_cumulative()
        );
        assert_eq!(engine.by_label(), engine.by_label());
        assert_eq!(engine.by_user_by_milestone(), engine.by_user_by_milestone());
        assert_eq!(engine.by_milestone_by_user(), engine.by_milestone_by_user());
    }

    #[test]
    fn test_rounding_applied_at_the_edges() {
        let snapshot = Snapshot::new(
            vec![Issue::new(1, "thirds", date(2021, 3, 1))
                .with_totals(1.0, 0.0)
                .with_milestone("Sprint 1")],
            vec![
                Record::new(1, "anna", date(2021, 2, 23), 1.0 / 3.0),
                Record::new(1, "anna", date(2021, 2, 23), 1.0 / 3.0),
            ],
        );
        let sink = MemorySink::new();
        let rows = engine(&snapshot, &sink).by_user();
        assert_eq!(rows[0].spent, 0.67);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(1.236, 2), 1.24);
        assert_eq!(round_to(-1.236, 2), -1.24);
        assert_eq!(round_to(10.0, 0), 10.0);
    }
}
