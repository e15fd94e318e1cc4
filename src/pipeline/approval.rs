// Approval pipeline — records a user action and folds it into analytics.
//
// Per action:
//   1. look up when drafts were generated for the post (time-to-comment)
//   2. validate and stamp the action into a CommentEvent
//   3. load preferences and refuse to aggregate against bad goals
//   4. optimistic read-modify-write of the analytics snapshot
//   5. approvals only: store the ApprovalRecord under approvals:{postId}
//   6. best-effort bump of the per-day counters under daily:{date}
//
// If step 4 exhausts its retries the action is reported as not recorded and
// nothing has been written. Steps 5 and 6 only log on failure.
// Nothing deduplicates resubmissions: two identical approvals count twice.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::retry::{read_modify_write, retry_store, with_timeout, RetryPolicy};
use crate::analytics::aggregator::local_day;
use crate::analytics::{
    self, AnalyticsSnapshot, CommentEvent, Outcome, RawAction, UserPreferences, VariantType,
};
use crate::comments::GeneratedComments;
use crate::error::CoreResult;
use crate::store::{self, keys, KeyValueStore};

/// Stored at user:{id}:approvals:{postId}; the latest approval per post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRecord {
    pub post_id: String,
    pub comment_content: String,
    pub variant_type: VariantType,
    pub was_edited: bool,
    pub approved_at: DateTime<Utc>,
    pub user_id: String,
}

/// Stored at user:{id}:daily:{date}.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyStats {
    pub approvals: u32,
    pub skips: u32,
}

/// Result of a successfully recorded action.
#[derive(Debug, Clone)]
pub struct RecordedAction {
    pub event: CommentEvent,
    pub approval: Option<ApprovalRecord>,
    pub snapshot: AnalyticsSnapshot,
}

/// Store-facing half of the analytics core. Cheap to clone.
#[derive(Clone)]
pub struct ApprovalPipeline {
    store: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
}

impl ApprovalPipeline {
    pub fn new(store: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Stored preferences, or the sign-up defaults if none were saved.
    pub async fn preferences(&self, user_id: &str) -> CoreResult<UserPreferences> {
        let key = keys::preferences(user_id);
        let stored: Option<(i64, UserPreferences)> =
            retry_store(&self.policy, "get_preferences", || {
                store::get_typed(self.store.as_ref(), &key)
            })
            .await?;
        Ok(stored.map(|(_, prefs)| prefs).unwrap_or_default())
    }

    /// Validate and persist preferences. Takes effect on the next aggregation.
    pub async fn update_preferences(
        &self,
        user_id: &str,
        preferences: UserPreferences,
    ) -> CoreResult<UserPreferences> {
        preferences.validate()?;
        let key = keys::preferences(user_id);
        retry_store(&self.policy, "set_preferences", || {
            store::set_typed(self.store.as_ref(), &key, &preferences)
        })
        .await?;
        info!(
            user_id,
            daily_goal = preferences.daily_goal,
            weekly_goal = preferences.weekly_goal,
            "Preferences updated"
        );
        Ok(preferences)
    }

    /// The user's snapshot as of `now`, re-anchored on today.
    ///
    /// Read-only: the rolled window is returned, not written back.
    pub async fn snapshot(&self, user_id: &str, now: DateTime<Utc>) -> CoreResult<AnalyticsSnapshot> {
        let preferences = self.preferences(user_id).await?;
        let key = keys::analytics(user_id);
        let stored: Option<(i64, AnalyticsSnapshot)> =
            retry_store(&self.policy, "get_analytics", || {
                store::get_typed(self.store.as_ref(), &key)
            })
            .await?;
        let current = stored.map(|(_, s)| s).unwrap_or_default();
        analytics::roll_forward(&current, &preferences, now, preferences.timezone())
    }

    /// Record one approve/skip action for `user_id`.
    pub async fn record_action(
        &self,
        user_id: &str,
        mut action: RawAction,
        now: DateTime<Utc>,
    ) -> CoreResult<RecordedAction> {
        if let Some(post_id) = action.post_id.as_deref().map(str::trim) {
            if !post_id.is_empty() {
                action.minutes_to_comment = self.minutes_since_generation(user_id, post_id, now).await;
            }
        }

        let comment_content = action.comment_content.clone().unwrap_or_default();
        let event = analytics::record(user_id, action, now)?;

        let preferences = self.preferences(user_id).await?;
        preferences.validate()?;

        let snapshot = self.commit_event(&event, &preferences, now).await?;

        // Only written once the snapshot has committed.
        let approval = match event.outcome {
            Outcome::Approved => {
                let record = ApprovalRecord {
                    post_id: event.post_id.clone(),
                    comment_content,
                    variant_type: event.variant_type,
                    was_edited: event.was_edited,
                    approved_at: event.occurred_at,
                    user_id: user_id.to_string(),
                };
                let key = keys::approval(user_id, &event.post_id);
                let written = retry_store(&self.policy, "set_approval", || {
                    store::set_typed(self.store.as_ref(), &key, &record)
                })
                .await;
                if let Err(e) = written {
                    warn!(user_id, post_id = %event.post_id, error = %e, "Failed to store approval record");
                }
                Some(record)
            }
            Outcome::Skipped => None,
        };

        if let Err(e) = self.bump_daily(&event, &preferences).await {
            warn!(user_id, post_id = %event.post_id, error = %e, "Failed to update daily stats");
        }

        info!(
            user_id,
            post_id = %event.post_id,
            outcome = ?event.outcome,
            variant = %event.variant_type,
            approved_this_week = snapshot.total_approved_this_week,
            streak = snapshot.daily_streak,
            "Recorded comment action"
        );

        Ok(RecordedAction {
            event,
            approval,
            snapshot,
        })
    }

    /// Fold an already-validated event into the stored snapshot.
    ///
    /// The aggregation re-runs against the latest stored value whenever the
    /// compare-and-set loses to a concurrent writer for the same user.
    pub async fn commit_event(
        &self,
        event: &CommentEvent,
        preferences: &UserPreferences,
        now: DateTime<Utc>,
    ) -> CoreResult<AnalyticsSnapshot> {
        let tz = preferences.timezone();
        let key = keys::analytics(&event.user_id);
        read_modify_write(
            self.store.as_ref(),
            &self.policy,
            &key,
            |current: Option<AnalyticsSnapshot>| {
                analytics::apply(
                    &event.user_id,
                    event,
                    &current.unwrap_or_default(),
                    preferences,
                    now,
                    tz,
                )
            },
        )
        .await
    }

    /// Per-day counters for the local day the event fell on.
    pub async fn daily_stats(
        &self,
        user_id: &str,
        day: chrono::NaiveDate,
    ) -> CoreResult<DailyStats> {
        let key = keys::daily(user_id, day);
        let stored: Option<(i64, DailyStats)> = retry_store(&self.policy, "get_daily", || {
            store::get_typed(self.store.as_ref(), &key)
        })
        .await?;
        Ok(stored.map(|(_, s)| s).unwrap_or_default())
    }

    async fn bump_daily(
        &self,
        event: &CommentEvent,
        preferences: &UserPreferences,
    ) -> CoreResult<DailyStats> {
        let day = local_day(event.occurred_at, preferences.timezone());
        let key = keys::daily(&event.user_id, day);
        read_modify_write(
            self.store.as_ref(),
            &self.policy,
            &key,
            |current: Option<DailyStats>| {
                let mut stats = current.unwrap_or_default();
                match event.outcome {
                    Outcome::Approved => stats.approvals = stats.approvals.saturating_add(1),
                    Outcome::Skipped => stats.skips = stats.skips.saturating_add(1),
                }
                Ok(stats)
            },
        )
        .await
    }

    /// Timing is optional; a failed lookup just leaves it out.
    async fn minutes_since_generation(
        &self,
        user_id: &str,
        post_id: &str,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        let key = keys::comments(user_id, post_id);
        let lookup = store::get_typed::<GeneratedComments>(self.store.as_ref(), &key);
        match with_timeout(&self.policy, lookup).await {
            Ok(Some((_, generated))) => generated.minutes_until(now),
            Ok(None) => None,
            Err(e) => {
                warn!(user_id, post_id, error = %e, "Could not read draft generation time");
                None
            }
        }
    }

    /// Persist freshly generated drafts so a later approval can be timed.
    pub async fn store_generated(
        &self,
        user_id: &str,
        generated: &GeneratedComments,
    ) -> CoreResult<()> {
        let key = keys::comments(user_id, &generated.post_id);
        retry_store(&self.policy, "set_comments", || {
            store::set_typed(self.store.as_ref(), &key, generated)
        })
        .await?;
        Ok(())
    }
}
