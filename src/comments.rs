// Comment drafts — three template variants per post.
//
// Drafts are fixed templates filled in with the author's first name and a
// hook chosen from the post text; there is no model behind them. What does
// matter downstream is `generated_at`: the approval pipeline measures
// time-to-comment from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::analytics::VariantType;
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentVariant {
    pub id: String,
    #[serde(rename = "type")]
    pub variant_type: VariantType,
    pub label: String,
    pub content: String,
    pub confidence: f64,
}

/// Stored at user:{id}:comments:{postId}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedComments {
    pub post_id: String,
    pub variants: Vec<CommentVariant>,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedComments {
    /// Minutes elapsed between generation and `at`; None if `at` is earlier.
    pub fn minutes_until(&self, at: DateTime<Utc>) -> Option<f64> {
        let elapsed = at.signed_duration_since(self.generated_at);
        if elapsed.num_milliseconds() < 0 {
            return None;
        }
        Some(elapsed.num_milliseconds() as f64 / 60_000.0)
    }
}

/// Build the insight / question / compliment drafts for a post.
pub fn generate_variants(
    post_id: &str,
    post_content: &str,
    author_name: Option<&str>,
    now: DateTime<Utc>,
) -> CoreResult<GeneratedComments> {
    if post_id.trim().is_empty() || post_content.trim().is_empty() {
        return Err(CoreError::validation("Post ID and content required"));
    }

    let first_name = author_name
        .and_then(|n| n.split_whitespace().next())
        .unwrap_or("there");

    // Posts that cite numbers get a metrics-flavoured hook.
    let cites_numbers = post_content.chars().any(|c| c.is_ascii_digit() || c == '%');
    let hook = if cites_numbers {
        "Love seeing real metrics behind an implementation!"
    } else {
        "Love how clearly you framed this!"
    };

    let variants = vec![
        CommentVariant {
            id: "1".to_string(),
            variant_type: VariantType::Insight,
            label: "Add Insight".to_string(),
            content: "This aligns with what we're seeing in the market. We took a similar \
                      approach last year and the results were comparable, especially once the \
                      team bought in."
                .to_string(),
            confidence: 0.87,
        },
        CommentVariant {
            id: "2".to_string(),
            variant_type: VariantType::Question,
            label: "Ask Question".to_string(),
            content: format!(
                "Great share, {first_name}! I'm curious about the rollout: what was the \
                 hardest part to get right?"
            ),
            confidence: 0.92,
        },
        CommentVariant {
            id: "3".to_string(),
            variant_type: VariantType::Compliment,
            label: "Compliment + Add".to_string(),
            content: format!(
                "{hook} Your approach mirrors what we've seen work elsewhere. Thanks for \
                 sharing the specifics, {first_name}."
            ),
            confidence: 0.85,
        },
    ];

    Ok(GeneratedComments {
        post_id: post_id.trim().to_string(),
        variants,
        generated_at: now,
    })
}
