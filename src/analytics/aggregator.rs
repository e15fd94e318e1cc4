// Analytics aggregator — folds one CommentEvent into a user's snapshot.
//
// `apply` is a pure function of (event, snapshot, preferences, now, tz): no
// clock reads, no store access. That makes it safe to re-run against a fresh
// snapshot when the optimistic write in the pipeline loses a race.
//
// Day and week boundaries are computed in the user's timezone. The 7-day
// window is anchored on "today" and slides forward as today advances; the
// approved-this-week counter resets once a Monday 00:00 local boundary has
// been crossed since the last update.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Utc};

use super::event::{CommentEvent, Outcome, VariantType};
use super::preferences::UserPreferences;
use super::snapshot::{AnalyticsSnapshot, DayEntry, SERIES_DAYS};
use crate::error::{CoreError, CoreResult};

/// Fold `event` into `current` and return the new snapshot.
pub fn apply(
    user_id: &str,
    event: &CommentEvent,
    current: &AnalyticsSnapshot,
    preferences: &UserPreferences,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> CoreResult<AnalyticsSnapshot> {
    if event.user_id != user_id {
        return Err(CoreError::validation(format!(
            "event for user {} cannot be applied to user {user_id}",
            event.user_id
        )));
    }

    let mut next = roll_forward(current, preferences, now, tz)?;
    let today = next
        .weekly_series
        .last()
        .map(|d| d.day)
        .unwrap_or_else(|| local_day(now, tz));

    // Clock skew can put an event slightly in the future; it lands on today.
    let event_day = local_day(event.occurred_at, tz).min(today);

    let entry = next.weekly_series.iter_mut().find(|d| d.day == event_day);
    match event.outcome {
        Outcome::Approved => {
            if let Some(entry) = entry {
                entry.approved_count = entry.approved_count.saturating_add(1);
                entry.event_count = entry.event_count.saturating_add(1);
            }
            if event_day >= week_start(today) {
                next.total_approved_this_week = next.total_approved_this_week.saturating_add(1);
            }
            *next.type_counts.entry(event.variant_type).or_insert(0) += 1;
            next.approved_total += 1;
            if let Some(minutes) = event.minutes_to_comment {
                next.timed_approvals += 1;
                next.timed_minutes_total += minutes;
            }
        }
        Outcome::Skipped => {
            if let Some(entry) = entry {
                entry.event_count = entry.event_count.saturating_add(1);
            }
            next.skipped_total += 1;
        }
    }

    recompute_derived(&mut next);
    next.last_updated = Some(match current.last_updated {
        Some(prev) if prev > now => prev,
        _ => now,
    });
    Ok(next)
}

/// Re-anchor the series on today and apply the week reset without an event.
///
/// Used by `apply` and by the read path so a dashboard opened on a new day
/// shows a current window even before the first action of the day.
pub fn roll_forward(
    current: &AnalyticsSnapshot,
    preferences: &UserPreferences,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> CoreResult<AnalyticsSnapshot> {
    preferences.validate()?;
    let daily_goal = preferences.daily_goal();

    // Never move the window backwards because of a skewed clock.
    let mut today = local_day(now, tz);
    if let Some(newest) = current.weekly_series.last() {
        today = today.max(newest.day);
    }

    let mut next = current.clone();
    next.daily_goal = daily_goal;
    next.weekly_goal = preferences.weekly_goal();
    next.weekly_series = (0..SERIES_DAYS as i64)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let (approved_count, event_count) = current
                .weekly_series
                .iter()
                .find(|d| d.day == day)
                .map(|d| (d.approved_count, d.event_count))
                .unwrap_or((0, 0));
            DayEntry {
                day,
                approved_count,
                goal_for_day: daily_goal,
                event_count,
            }
        })
        .collect();

    if let Some(last) = current.last_updated {
        if week_start(today) > week_start(local_day(last, tz)) {
            next.total_approved_this_week = 0;
        }
    }

    recompute_derived(&mut next);
    Ok(next)
}

/// Calendar day of `ts` in `tz`.
pub fn local_day(ts: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// Monday of the week containing `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(day.weekday().num_days_from_monday() as i64)
}

/// Consecutive trailing days meeting `daily_goal`, ending today.
///
/// A day under goal ends the streak. The one exception is today before any
/// event has been recorded: it is skipped rather than counted as a failure,
/// so the streak earned through yesterday still shows early in the day.
pub fn compute_streak(series: &[DayEntry], daily_goal: u32) -> u32 {
    let mut days = series.iter().rev();
    let mut streak = 0;

    if let Some(today) = days.next() {
        if today.approved_count >= daily_goal {
            streak += 1;
        } else if today.has_activity() {
            return 0;
        }
    }
    for day in days {
        if day.approved_count < daily_goal {
            break;
        }
        streak += 1;
    }
    streak
}

/// Integer percentages per type using the largest-remainder method.
///
/// Every type appears in the result. With no approvals every entry is 0;
/// otherwise the entries sum to exactly 100.
pub fn type_distribution(counts: &BTreeMap<VariantType, u64>) -> BTreeMap<VariantType, u32> {
    let mut out: BTreeMap<VariantType, u32> = VariantType::ALL.iter().map(|t| (*t, 0)).collect();
    let total: u64 = counts.values().sum();
    if total == 0 {
        return out;
    }

    // (type, count, floor percent, remainder numerator)
    let mut shares: Vec<(VariantType, u64, u64, u64)> = VariantType::ALL
        .iter()
        .map(|t| {
            let count = counts.get(t).copied().unwrap_or(0);
            let scaled = count * 100;
            (*t, count, scaled / total, scaled % total)
        })
        .collect();

    let assigned: u64 = shares.iter().map(|s| s.2).sum();
    let leftover = 100u64.saturating_sub(assigned) as usize;

    // Largest remainder first; ties go to the bigger bucket, then enum order.
    shares.sort_by(|a, b| b.3.cmp(&a.3).then(b.1.cmp(&a.1)).then(a.0.cmp(&b.0)));
    for (i, (t, _, floor, _)) in shares.iter().enumerate() {
        let bump = u64::from(i < leftover);
        out.insert(*t, (floor + bump) as u32);
    }
    out
}

/// approved / (approved + skipped), 0 when both are 0.
pub fn approval_rate(approved: u64, skipped: u64) -> f64 {
    let denominator = approved + skipped;
    if denominator == 0 {
        0.0
    } else {
        approved as f64 / denominator as f64
    }
}

fn recompute_derived(snapshot: &mut AnalyticsSnapshot) {
    snapshot.type_distribution = type_distribution(&snapshot.type_counts);
    snapshot.daily_streak = compute_streak(&snapshot.weekly_series, snapshot.daily_goal);
    snapshot.approval_rate = approval_rate(snapshot.approved_total, snapshot.skipped_total);
    snapshot.avg_time_to_comment_minutes = if snapshot.timed_approvals > 0 {
        Some(snapshot.timed_minutes_total / snapshot.timed_approvals as f64)
    } else {
        None
    };
}
