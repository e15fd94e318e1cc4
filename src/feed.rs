// Feed ranking — orders candidate posts for the Fast Lane view.
//
// High-priority authors first, then medium, then low; within a priority the
// most recent post wins. Posts without a `postedAt` sort after dated ones.
// The sort is stable, so equal posts keep their input order.
//
// `analyze` turns a pasted LinkedIn post URL into a Fast Lane entry. There is
// no scraper behind it: the post body is fixture text, only the URL is real.

use std::cmp::Ordering;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::pipeline::retry::{retry_store, RetryPolicy};
use crate::store::{self, keys, KeyValueStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    fn rank(self) -> u8 {
        match self {
            Priority::High => 0,
            Priority::Medium => 1,
            Priority::Low => 2,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub initials: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u32,
    pub comments: u32,
    pub shares: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    pub id: String,
    pub author: PostAuthor,
    pub content: String,
    /// Human-readable age ("2 hours ago"), display only.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub engagement: Engagement,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub score: u32,
}

/// Stable sort by priority, then `posted_at` descending.
pub fn rank(mut posts: Vec<FeedPost>) -> Vec<FeedPost> {
    posts.sort_by(compare);
    posts
}

fn compare(a: &FeedPost, b: &FeedPost) -> Ordering {
    a.priority
        .rank()
        .cmp(&b.priority.rank())
        .then_with(|| match (a.posted_at, b.posted_at) {
            (Some(x), Some(y)) => y.cmp(&x),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
}

/// Shown to users who have no stored feed yet.
pub fn sample_feed(now: DateTime<Utc>) -> Vec<FeedPost> {
    vec![
        FeedPost {
            id: "1".to_string(),
            author: PostAuthor {
                name: "Sarah Chen".to_string(),
                title: "VP of Marketing at TechCorp".to_string(),
                avatar: String::new(),
                initials: "SC".to_string(),
            },
            content: "Just launched our new AI-powered customer service platform. The results \
                      after 30 days are incredible: 40% reduction in response time, 25% increase \
                      in customer satisfaction."
                .to_string(),
            timestamp: "2 hours ago".to_string(),
            posted_at: Some(now - Duration::hours(2)),
            engagement: Engagement {
                likes: 284,
                comments: 67,
                shares: 23,
            },
            priority: Priority::High,
            url: "https://linkedin.com/posts/sarahchen/ai-customer-service".to_string(),
            score: 95,
        },
        FeedPost {
            id: "2".to_string(),
            author: PostAuthor {
                name: "Michael Rodriguez".to_string(),
                title: "CEO at StartupX".to_string(),
                avatar: String::new(),
                initials: "MR".to_string(),
            },
            content: "Unpopular opinion: The best product managers are not the ones with the most \
                      features shipped, but the ones who kill the most features before they get \
                      built."
                .to_string(),
            timestamp: "4 hours ago".to_string(),
            posted_at: Some(now - Duration::hours(4)),
            engagement: Engagement {
                likes: 156,
                comments: 89,
                shares: 12,
            },
            priority: Priority::High,
            url: "https://linkedin.com/posts/mrodriguez/product-management".to_string(),
            score: 87,
        },
    ]
}

/// Build the Fast Lane entry for a pasted post URL.
pub fn analyzed_post(url: &str, now: DateTime<Utc>) -> CoreResult<FeedPost> {
    let url = url.trim();
    if !url.contains("linkedin.com") {
        return Err(CoreError::validation("Valid LinkedIn URL required"));
    }

    Ok(FeedPost {
        id: format!(
            "fastlane-{}-{:08x}",
            now.timestamp_millis(),
            rand::random::<u32>()
        ),
        author: PostAuthor {
            name: "Jennifer Martinez".to_string(),
            title: "Senior Product Designer at UXCorp".to_string(),
            avatar: String::new(),
            initials: "JM".to_string(),
        },
        content: "Design systems aren't just about components and tokens. They're about \
                  creating a shared language between design and engineering."
            .to_string(),
        timestamp: "30 minutes ago".to_string(),
        posted_at: Some(now - Duration::minutes(30)),
        engagement: Engagement {
            likes: 127,
            comments: 34,
            shares: 8,
        },
        priority: Priority::High,
        url: url.to_string(),
        score: 92,
    })
}

/// Analyze a post URL and store the result under user:{id}:fastlane:{postId}.
pub async fn analyze(
    kv: &dyn KeyValueStore,
    policy: &RetryPolicy,
    user_id: &str,
    url: &str,
    now: DateTime<Utc>,
) -> CoreResult<FeedPost> {
    let post = analyzed_post(url, now)?;
    let key = keys::fastlane(user_id, &post.id);
    retry_store(policy, "set_fastlane", || store::set_typed(kv, &key, &post)).await?;
    info!(user_id, post_id = %post.id, url = %post.url, "Analyzed Fast Lane post");
    Ok(post)
}
