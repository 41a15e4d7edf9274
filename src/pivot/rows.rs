//! Row types produced by the pivot views.
//!
//! Everything a chart renderer needs is in these ordered, serializable
//! tables; the engine never hands out its internal maps.

use serde::Serialize;

/// One issue with its rounded tracker totals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IssueRow {
    pub iid: i64,
    pub title: String,
    pub estimate: f64,
    pub spent: f64,
}

/// Estimate/spent totals for one milestone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MilestoneRow {
    pub milestone: String,
    pub estimate: f64,
    pub spent: f64,
}

/// Total logged hours for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserRow {
    pub user: String,
    pub spent: f64,
}

/// Estimate/spent totals for one label (full fan-out: an issue with several
/// reported labels is counted once per label).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRow {
    pub label: String,
    pub estimate: f64,
    pub spent: f64,
}

/// Users-by-weeks matrix, zero-filled. `hours[u][w]` is user `users[u]` in
/// week `w + 1`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekMatrix {
    pub users: Vec<String>,
    pub weeks: u32,
    pub hours: Vec<Vec<f64>>,
}

/// One user's per-week series, used for layered-area rendering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserSeries {
    pub user: String,
    pub hours: Vec<f64>,
}

/// A generic rows-by-columns cross-tabulation (user x milestone and its
/// transpose). `hours[r][c]` belongs to `rows[r]` and `cols[c]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossTab {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub hours: Vec<Vec<f64>>,
}

/// An issue whose label set makes it show up in more than one label total.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiLabelIssue {
    pub iid: i64,
    pub title: String,
    pub labels: Vec<String>,
}
