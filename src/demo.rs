// Demo account — seeds a user with default preferences and a week of history.
//
// Backs `ingrow demo`. Seeding overwrites whatever the user had, so the demo
// dashboard always opens on the same shape of data.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::analytics::aggregator::{local_day, week_start};
use crate::analytics::snapshot::SERIES_DAYS;
use crate::analytics::{self, AnalyticsSnapshot, DayEntry, UserPreferences, VariantType};
use crate::error::CoreResult;
use crate::pipeline::retry::retry_store;
use crate::pipeline::ApprovalPipeline;
use crate::store::{self, keys};

/// Approvals per day, oldest first; the last entry is today.
pub const DEMO_SERIES: [u32; SERIES_DAYS] = [4, 6, 3, 5, 7, 2, 1];
pub const DEMO_SKIPPED: u64 = 10;
pub const DEMO_AVG_MINUTES: f64 = 11.0;

/// The seeded snapshot for `preferences` as of `now`.
pub fn demo_snapshot(
    preferences: &UserPreferences,
    now: DateTime<Utc>,
) -> CoreResult<AnalyticsSnapshot> {
    let tz = preferences.timezone();
    let today = local_day(now, tz);

    let weekly_series: Vec<DayEntry> = DEMO_SERIES
        .iter()
        .enumerate()
        .map(|(i, count)| DayEntry {
            day: today - Duration::days((SERIES_DAYS - 1 - i) as i64),
            approved_count: *count,
            goal_for_day: preferences.daily_goal(),
            event_count: *count,
        })
        .collect();

    let approved_total: u64 = DEMO_SERIES.iter().map(|c| u64::from(*c)).sum();
    let total_approved_this_week = weekly_series
        .iter()
        .filter(|d| d.day >= week_start(today))
        .map(|d| d.approved_count)
        .sum();

    let seeded = AnalyticsSnapshot {
        total_approved_this_week,
        weekly_series,
        approved_total,
        skipped_total: DEMO_SKIPPED,
        type_counts: BTreeMap::from([
            (VariantType::Insight, 13),
            (VariantType::Question, 10),
            (VariantType::Compliment, 5),
        ]),
        timed_approvals: approved_total,
        timed_minutes_total: DEMO_AVG_MINUTES * approved_total as f64,
        last_updated: Some(now),
        ..AnalyticsSnapshot::default()
    };

    // Goals, streak, rate and distribution all come from the aggregator.
    analytics::roll_forward(&seeded, preferences, now, tz)
}

/// Write default preferences and the seeded snapshot for `user_id`.
pub async fn seed(
    pipeline: &ApprovalPipeline,
    user_id: &str,
    now: DateTime<Utc>,
) -> CoreResult<AnalyticsSnapshot> {
    let preferences = pipeline
        .update_preferences(user_id, UserPreferences::default())
        .await?;
    let snapshot = demo_snapshot(&preferences, now)?;

    let key = keys::analytics(user_id);
    let kv = pipeline.store().as_ref();
    retry_store(pipeline.policy(), "seed_analytics", || {
        store::set_typed(kv, &key, &snapshot)
    })
    .await?;

    info!(
        user_id,
        approved_total = snapshot.approved_total,
        "Seeded demo account"
    );
    Ok(snapshot)
}
