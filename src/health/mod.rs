//! Data-health checks over the loaded snapshot.
//!
//! Time logs entered by hand drift: someone books hours on the wrong day, or
//! a note's date fails to parse and a placeholder lands in the data. These
//! checks compare each issue's records against per-issue date expectations
//! from [`HealthConfig`] and report offenders to the diagnostics sink, one
//! error per failed check plus one warning per offending record. Findings
//! are also returned so a report collaborator can list them.

use chrono::NaiveDate;
use serde::Serialize;

use crate::config::HealthConfig;
use crate::diag::{DiagEvent, DiagLevel, DiagSink};
use crate::models::{Issue, Record, Snapshot};

/// Placeholder date a caller may substitute when a spent-note date fails to
/// parse. Records carrying it are flagged by the zero-date check.
pub fn zero_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1, 1, 1).unwrap()
}

/// Which expectation a record violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthCheck {
    /// Record date differs from the issue's configured happening date
    HappeningDate,
    /// Record date precedes the issue's configured minimum date
    MinimumDate,
    /// Record date exceeds the issue's configured maximum date
    MaximumDate,
    /// Record carries the zero placeholder date
    ZeroDate,
}

/// One offending record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthFinding {
    pub check: HealthCheck,
    pub iid: i64,
    pub user: String,
    pub date: NaiveDate,
    pub time: f64,
}

/// Runs the configured checks over one immutable snapshot.
pub struct HealthReport<'a> {
    snapshot: &'a Snapshot,
    config: &'a HealthConfig,
    sink: &'a dyn DiagSink,
}

impl<'a> HealthReport<'a> {
    pub fn new(snapshot: &'a Snapshot, config: &'a HealthConfig, sink: &'a dyn DiagSink) -> Self {
        Self {
            snapshot,
            config,
            sink,
        }
    }

    /// Check every issue's records and return all findings, in issue order.
    pub fn run(&self) -> Vec<HealthFinding> {
        let mut findings = Vec::new();
        for issue in &self.snapshot.issues {
            let issue_records: Vec<&Record> = self
                .snapshot
                .records
                .iter()
                .filter(|r| r.iid == issue.iid)
                .collect();
            self.check_happening_date(issue, &issue_records, &mut findings);
            self.check_minimum_date(issue, &issue_records, &mut findings);
            self.check_maximum_date(issue, &issue_records, &mut findings);
            self.check_zero_dates(issue, &issue_records, &mut findings);
        }
        findings
    }

    fn expected(map: &std::collections::HashMap<String, NaiveDate>, issue: &Issue) -> Option<NaiveDate> {
        map.get(&issue.iid.to_string()).copied()
    }

    fn report(
        &self,
        check: HealthCheck,
        message: &str,
        issue: &Issue,
        offenders: &[&Record],
        findings: &mut Vec<HealthFinding>,
    ) {
        if offenders.is_empty() {
            return;
        }
        self.sink.emit(
            DiagEvent::new(DiagLevel::Error, message)
                .with("iid", issue.iid)
                .with("title", issue.title.as_str())
                .with("count", offenders.len() as i64),
        );
        for record in offenders {
            let mut event = DiagEvent::new(DiagLevel::Warn, "offending time log")
                .with("user", record.user.as_str())
                .with("date", record.date.to_string())
                .with("hours", record.time);
            if check == HealthCheck::ZeroDate {
                if let Some(body) = &record.note_body {
                    event = event.with("body", body.as_str());
                }
            }
            self.sink.emit(event);
            findings.push(HealthFinding {
                check,
                iid: issue.iid,
                user: record.user.clone(),
                date: record.date,
                time: record.time,
            });
        }
    }

    fn check_happening_date(
        &self,
        issue: &Issue,
        records: &[&Record],
        findings: &mut Vec<HealthFinding>,
    ) {
        let Some(expected) = Self::expected(&self.config.issue_happening_date, issue) else {
            return;
        };
        let offenders: Vec<&Record> = records
            .iter()
            .filter(|r| r.date != expected)
            .copied()
            .collect();
        self.report(
            HealthCheck::HappeningDate,
            "records do not match the issue's happening date",
            issue,
            &offenders,
            findings,
        );
    }

    fn check_minimum_date(
        &self,
        issue: &Issue,
        records: &[&Record],
        findings: &mut Vec<HealthFinding>,
    ) {
        let Some(minimum) = Self::expected(&self.config.issue_minimum_date, issue) else {
            return;
        };
        let offenders: Vec<&Record> = records
            .iter()
            .filter(|r| r.date < minimum)
            .copied()
            .collect();
        self.report(
            HealthCheck::MinimumDate,
            "records precede the issue's minimum date",
            issue,
            &offenders,
            findings,
        );
    }

    fn check_maximum_date(
        &self,
        issue: &Issue,
        records: &[&Record],
        findings: &mut Vec<HealthFinding>,
    ) {
        let Some(maximum) = Self::expected(&self.config.issue_maximum_date, issue) else {
            return;
        };
        let offenders: Vec<&Record> = records
            .iter()
            .filter(|r| r.date > maximum)
            .copied()
            .collect();
        self.report(
            HealthCheck::MaximumDate,
            "records exceed the issue's maximum date",
            issue,
            &offenders,
            findings,
        );
    }

    fn check_zero_dates(
        &self,
        issue: &Issue,
        records: &[&Record],
        findings: &mut Vec<HealthFinding>,
    ) {
        if !self.config.check_zero_dates {
            return;
        }
        let zero = zero_date();
        let offenders: Vec<&Record> = records
            .iter()
            .filter(|r| r.date == zero)
            .copied()
            .collect();
        self.report(
            HealthCheck::ZeroDate,
            "records carry the zero placeholder date",
            issue,
            &offenders,
            findings,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diag::MemorySink;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn snapshot() -> Snapshot {
        let issues = vec![
            Issue::new(1, "Kickoff workshop", date(2021, 2, 22)),
            Issue::new(2, "Crash on save", date(2021, 2, 22)),
        ];
        let records = vec![
            Record::new(1, "anna", date(2021, 3, 1), 4.0),
            Record::new(1, "zoe", date(2021, 3, 2), 2.0),
            Record::new(2, "anna", date(2021, 2, 20), 1.0),
            Record::new(2, "zoe", date(2021, 6, 20), 1.5),
        ];
        Snapshot::new(issues, records)
    }

    #[test]
    fn test_happening_date_flags_other_days() {
        let snapshot = snapshot();
        let mut config = HealthConfig::default();
        config
            .issue_happening_date
            .insert("1".to_string(), date(2021, 3, 1));
        let sink = MemorySink::new();

        let findings = HealthReport::new(&snapshot, &config, &sink).run();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].check, HealthCheck::HappeningDate);
        assert_eq!(findings[0].user, "zoe");
        assert_eq!(sink.count(DiagLevel::Error), 1);
        assert_eq!(sink.count(DiagLevel::Warn), 1);
    }

    #[test]
    fn test_minimum_and_maximum_dates() {
        let snapshot = snapshot();
        let mut config = HealthConfig::default();
        config
            .issue_minimum_date
            .insert("2".to_string(), date(2021, 2, 22));
        config
            .issue_maximum_date
            .insert("2".to_string(), date(2021, 6, 10));
        let sink = MemorySink::new();

        let findings = HealthReport::new(&snapshot, &config, &sink).run();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].check, HealthCheck::MinimumDate);
        assert_eq!(findings[0].date, date(2021, 2, 20));
        assert_eq!(findings[1].check, HealthCheck::MaximumDate);
        assert_eq!(findings[1].date, date(2021, 6, 20));
    }

    #[test]
    fn test_zero_date_check_reports_note_body() {
        let mut record = Record::new(1, "anna", zero_date(), 0.5);
        record.note_body = Some("added 30m of time spent at someday".to_string());
        let snapshot = Snapshot::new(
            vec![Issue::new(1, "Kickoff workshop", date(2021, 2, 22))],
            vec![record],
        );
        let config = HealthConfig::default();
        let sink = MemorySink::new();

        let findings = HealthReport::new(&snapshot, &config, &sink).run();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].check, HealthCheck::ZeroDate);
        let warns: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| e.level == DiagLevel::Warn)
            .collect();
        assert!(warns[0].context.iter().any(|(k, _)| k == "body"));
    }

    #[test]
    fn test_zero_date_check_can_be_disabled() {
        let snapshot = Snapshot::new(
            vec![Issue::new(1, "Kickoff workshop", date(2021, 2, 22))],
            vec![Record::new(1, "anna", zero_date(), 0.5)],
        );
        let config = HealthConfig {
            check_zero_dates: false,
            ..HealthConfig::default()
        };
        let sink = MemorySink::new();
        assert!(HealthReport::new(&snapshot, &config, &sink).run().is_empty());
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_unconfigured_issues_are_quiet() {
        let snapshot = snapshot();
        let config = HealthConfig::default();
        let sink = MemorySink::new();
        assert!(HealthReport::new(&snapshot, &config, &sink).run().is_empty());
        assert!(sink.events().is_empty());
    }
}
