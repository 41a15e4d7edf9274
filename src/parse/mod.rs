//! Duration-token and system-note-body parsing.
//!
//! GitLab writes time-tracking activity as system notes:
//!
//! - `added 1h 30m of time spent at 2021-03-01`
//! - `subtracted 2h of time spent at 2021-03-04`
//! - `changed time estimate to 1d 4h`
//!
//! The duration token grammar is whole-string anchored; a token that does
//! not match (or an empty token) yields 0.0 hours rather than an error. The
//! sign of a token is the literal `-` marker; the sign of a spent note comes
//! from its verb (`subtracted` negates).

use chrono::NaiveDate;
use regex::Regex;
use thiserror::Error;

use crate::config::CalendarConfig;
use crate::diag::{DiagEvent, DiagLevel, DiagSink};

/// Non-fatal parse failures. Callers decide the fallback (skip the note,
/// substitute a placeholder date, ...).
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body does not look like a time-spent system note at all.
    #[error("note body is not a time-spent note")]
    NotSpentNote,

    /// The body matched but its date part did not parse.
    #[error("could not parse spent-at date '{raw}'")]
    SpentDate { raw: String },
}

/// The extracted payload of a time-spent note.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpentEntry {
    pub date: NaiveDate,
    /// Signed hours; negative when the note retracts time.
    pub hours: f64,
}

/// Parses duration tokens and time-tracking note bodies into signed hours.
///
/// Patterns are compiled once at construction; unit conversion follows the
/// calendar constants (`1d` = `hours_per_day` hours, and so on).
pub struct TimeNoteParser {
    calendar: CalendarConfig,
    duration_re: Regex,
    spent_re: Regex,
    estimate_re: Regex,
}

impl TimeNoteParser {
    pub fn new(calendar: &CalendarConfig) -> Self {
        let duration_re = Regex::new(
            r"^\s*(?P<sign>-)?\s*(?:(?P<months>\d+)mo\s*)?(?:(?P<weeks>\d+)w\s*)?(?:(?P<days>\d+)d\s*)?(?:(?P<hours>\d+)h\s*)?(?:(?P<minutes>\d+)m\s*)?(?:(?P<seconds>\d+)s\s*)?$",
        )
        .unwrap();
        let spent_re =
            Regex::new(r"^(?P<verb>added|subtracted)\s+(?P<spent>.+?)\s+of time spent at\s+(?P<at>.+)$")
                .unwrap();
        let estimate_re = Regex::new(r"^changed time estimate to\s+(?P<estimate>.+)$").unwrap();

        Self {
            calendar: calendar.clone(),
            duration_re,
            spent_re,
            estimate_re,
        }
    }

    /// Parse a compound duration token (`3mo 2w 1d 4h 30m 10s`, optionally
    /// preceded by `-`) into signed hours. Unmatched input yields 0.0.
    pub fn parse_duration(&self, token: &str) -> f64 {
        let caps = match self.duration_re.captures(token.trim()) {
            Some(caps) => caps,
            None => return 0.0,
        };

        let group = |name: &str| -> f64 {
            caps.name(name)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(0.0)
        };
        let sign = if caps.name("sign").is_some() { -1.0 } else { 1.0 };

        let days_per_week = f64::from(self.calendar.days_per_week);
        let total_days = group("months") * f64::from(self.calendar.weeks_per_month) * days_per_week
            + group("weeks") * days_per_week
            + group("days");

        let hours = total_days * f64::from(self.calendar.hours_per_day)
            + group("hours")
            + group("minutes") / 60.0
            + group("seconds") / 3600.0;

        sign * hours
    }

    /// Extract date and signed hours from a time-spent system note.
    ///
    /// An unparsable date is reported to `sink` and returned as
    /// [`ParseError::SpentDate`]; the run continues.
    pub fn parse_spent_note(
        &self,
        body: &str,
        sink: &dyn DiagSink,
    ) -> Result<SpentEntry, ParseError> {
        let caps = self
            .spent_re
            .captures(body.trim())
            .ok_or(ParseError::NotSpentNote)?;

        let raw_date = caps["at"].trim().to_string();
        let date = match NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d") {
            Ok(date) => date,
            Err(_) => {
                sink.emit(
                    DiagEvent::new(DiagLevel::Error, "could not parse spent-at date")
                        .with("date", raw_date.as_str())
                        .with("body", body),
                );
                return Err(ParseError::SpentDate { raw: raw_date });
            }
        };

        // the verb alone carries the sign; a stray marker in the amount
        // token must not cancel it out
        let sign = if &caps["verb"] == "subtracted" { -1.0 } else { 1.0 };
        let hours = sign * self.parse_duration(&caps["spent"]).abs();

        Ok(SpentEntry { date, hours })
    }

    /// Extract the absolute hour value from an estimate-change system note.
    ///
    /// Estimates carry no sign; a body that is not an estimate note yields
    /// 0.0. This is independent of the tracker's authoritative
    /// `Issue::total_estimate` and the two need not agree.
    pub fn parse_estimate_note(&self, body: &str) -> f64 {
        match self.estimate_re.captures(body.trim()) {
            Some(caps) => self.parse_duration(&caps["estimate"]).abs(),
            None => 0.0,
        }
    }
}
