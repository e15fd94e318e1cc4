// AnalyticsSnapshot — the per-user aggregate stored at user:{id}:analytics.
//
// The public fields are what the dashboard renders. The bookkeeping fields
// below them (running totals, per-type counts, timing sums, last update) are
// what lets the aggregator recompute every derived field from the snapshot
// alone, without replaying history.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::event::VariantType;
use super::preferences::{DEFAULT_DAILY_GOAL, DEFAULT_WEEKLY_GOAL};

/// Number of trailing days kept in `weekly_series`.
pub const SERIES_DAYS: usize = 7;

/// One calendar day in the trailing series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayEntry {
    pub day: NaiveDate,
    pub approved_count: u32,
    pub goal_for_day: u32,
    /// Approvals plus skips recorded on this day.
    #[serde(default)]
    pub event_count: u32,
}

impl DayEntry {
    pub fn goal_met(&self) -> bool {
        self.approved_count >= self.goal_for_day
    }

    /// Whether anything at all was recorded on this day.
    pub fn has_activity(&self) -> bool {
        self.event_count > 0 || self.approved_count > 0
    }

    /// Short weekday label ("Mon", "Tue", ...) for charts.
    pub fn label(&self) -> String {
        self.day.format("%a").to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyticsSnapshot {
    pub total_approved_this_week: u32,
    pub weekly_goal: u32,
    pub daily_goal: u32,
    /// approved / (approved + skipped); 0 when nothing has been recorded.
    pub approval_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_time_to_comment_minutes: Option<f64>,
    pub daily_streak: u32,
    /// Oldest to newest, exactly SERIES_DAYS entries once rolled.
    pub weekly_series: Vec<DayEntry>,
    /// Integer percentages per variant type; sums to 100 or to 0.
    pub type_distribution: BTreeMap<VariantType, u32>,

    // --- bookkeeping ---
    pub approved_total: u64,
    pub skipped_total: u64,
    pub type_counts: BTreeMap<VariantType, u64>,
    pub timed_approvals: u64,
    pub timed_minutes_total: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl Default for AnalyticsSnapshot {
    fn default() -> Self {
        Self {
            total_approved_this_week: 0,
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            daily_goal: DEFAULT_DAILY_GOAL,
            approval_rate: 0.0,
            avg_time_to_comment_minutes: None,
            daily_streak: 0,
            weekly_series: Vec::new(),
            type_distribution: VariantType::ALL.iter().map(|t| (*t, 0)).collect(),
            approved_total: 0,
            skipped_total: 0,
            type_counts: BTreeMap::new(),
            timed_approvals: 0,
            timed_minutes_total: 0.0,
            last_updated: None,
        }
    }
}

impl AnalyticsSnapshot {
    /// Fraction (0..=1) of series days that met their goal.
    pub fn goal_completion(&self) -> f64 {
        if self.weekly_series.is_empty() {
            return 0.0;
        }
        let met = self.weekly_series.iter().filter(|d| d.goal_met()).count();
        met as f64 / self.weekly_series.len() as f64
    }

    /// Approvals recorded on the newest day of the series.
    pub fn approved_today(&self) -> u32 {
        self.weekly_series
            .last()
            .map(|d| d.approved_count)
            .unwrap_or(0)
    }

    /// Fraction (0..=1, capped) of the weekly goal reached so far.
    pub fn weekly_progress(&self) -> f64 {
        if self.weekly_goal == 0 {
            return 0.0;
        }
        (self.total_approved_this_week as f64 / self.weekly_goal as f64).min(1.0)
    }
}
