// User preferences — goals, notification toggles, and the user's timezone.
//
// Stored at user:{id}:preferences. Missing fields fall back to the same
// defaults a freshly signed-up account gets.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub const DEFAULT_DAILY_GOAL: u32 = 5;
pub const DEFAULT_WEEKLY_GOAL: u32 = 35;
pub const DEFAULT_MAX_PUSH_PER_DAY: u32 = 2;

/// Accepted range for the timezone offset, in minutes east of UTC.
/// UTC-12:00 through UTC+14:00.
const MIN_OFFSET_MINUTES: i32 = -12 * 60;
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPreferences {
    /// Signed so that a bad settings payload is reported as a config error
    /// rather than a JSON parse failure.
    pub daily_goal: i64,
    pub weekly_goal: i64,
    pub push_enabled: bool,
    pub digest_enabled: bool,
    pub reminder_enabled: bool,
    pub max_push_per_day: u32,
    /// Minutes east of UTC; day and week boundaries are computed here.
    pub timezone_offset_minutes: i32,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            daily_goal: DEFAULT_DAILY_GOAL as i64,
            weekly_goal: DEFAULT_WEEKLY_GOAL as i64,
            push_enabled: true,
            digest_enabled: true,
            reminder_enabled: true,
            max_push_per_day: DEFAULT_MAX_PUSH_PER_DAY,
            timezone_offset_minutes: 0,
        }
    }
}

impl UserPreferences {
    /// Goals must be positive before anything is compared against them.
    pub fn validate(&self) -> CoreResult<()> {
        if self.daily_goal < 1 {
            return Err(CoreError::config(format!(
                "dailyGoal must be at least 1 (got {})",
                self.daily_goal
            )));
        }
        if self.weekly_goal < 1 {
            return Err(CoreError::config(format!(
                "weeklyGoal must be at least 1 (got {})",
                self.weekly_goal
            )));
        }
        if !(MIN_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&self.timezone_offset_minutes) {
            return Err(CoreError::config(format!(
                "timezoneOffsetMinutes must be between {MIN_OFFSET_MINUTES} and {MAX_OFFSET_MINUTES}"
            )));
        }
        Ok(())
    }

    /// The configured timezone. Falls back to UTC for an out-of-range offset;
    /// `validate` rejects those before they get stored.
    pub fn timezone(&self) -> FixedOffset {
        self.timezone_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn daily_goal(&self) -> u32 {
        self.daily_goal.clamp(1, u32::MAX as i64) as u32
    }

    pub fn weekly_goal(&self) -> u32 {
        self.weekly_goal.clamp(1, u32::MAX as i64) as u32
    }
}
