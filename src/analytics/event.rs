// Event recording — turns a raw approve/skip action into a CommentEvent.
//
// The user id always comes from the validated credential, never from the
// request body, and occurred_at is stamped here rather than trusted from the
// client. Each call yields exactly one event; resubmitting the same action
// produces a second event (there is no dedup key).

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Category of a generated comment draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariantType {
    Insight,
    Question,
    Compliment,
    Unknown,
}

impl VariantType {
    pub const ALL: [VariantType; 4] = [
        VariantType::Insight,
        VariantType::Question,
        VariantType::Compliment,
        VariantType::Unknown,
    ];

    /// Lenient parse: absent or unrecognized labels become `Unknown`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("insight") => VariantType::Insight,
            Some("question") => VariantType::Question,
            Some("compliment") => VariantType::Compliment,
            _ => VariantType::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VariantType::Insight => "insight",
            VariantType::Question => "question",
            VariantType::Compliment => "compliment",
            VariantType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the user did with a draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Approved,
    Skipped,
}

impl Outcome {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "approved" => Some(Outcome::Approved),
            "skipped" => Some(Outcome::Skipped),
            _ => None,
        }
    }
}

/// A user action as it arrives from the HTTP layer, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAction {
    pub post_id: Option<String>,
    pub comment_content: Option<String>,
    pub variant_type: Option<String>,
    pub was_edited: Option<bool>,
    pub outcome: Option<String>,
    /// Filled in by the pipeline from the stored generation record.
    #[serde(skip)]
    pub minutes_to_comment: Option<f64>,
}

/// Canonical, immutable record of one user action on one post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentEvent {
    pub user_id: String,
    pub post_id: String,
    pub variant_type: VariantType,
    pub was_edited: bool,
    pub outcome: Outcome,
    pub occurred_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_to_comment: Option<f64>,
}

/// Validate a raw action and stamp it with `now`.
pub fn record(user_id: &str, action: RawAction, now: DateTime<Utc>) -> CoreResult<CommentEvent> {
    if user_id.trim().is_empty() {
        return Err(CoreError::auth("Authenticated user id is empty"));
    }

    let post_id = action
        .post_id
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .ok_or_else(|| CoreError::validation("Post ID is required"))?;

    let outcome = match action.outcome.as_deref() {
        Some(raw) => Outcome::parse(raw)
            .ok_or_else(|| CoreError::validation(format!("Unrecognized outcome: {raw}")))?,
        None => return Err(CoreError::validation("Outcome is required")),
    };

    if outcome == Outcome::Approved
        && action
            .comment_content
            .as_deref()
            .is_none_or(|c| c.trim().is_empty())
    {
        return Err(CoreError::validation("Post ID and comment content required"));
    }

    Ok(CommentEvent {
        user_id: user_id.to_string(),
        post_id,
        variant_type: VariantType::parse_lenient(action.variant_type.as_deref()),
        was_edited: action.was_edited.unwrap_or(false),
        outcome,
        occurred_at: now,
        minutes_to_comment: action.minutes_to_comment.filter(|m| m.is_finite() && *m >= 0.0),
    })
}
