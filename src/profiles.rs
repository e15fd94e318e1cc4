// Tracked LinkedIn profiles — the authors whose posts feed the Fast Lane.
//
// Stored as one list per user under user:{id}:tracked_profiles and written
// through the same compare-and-set loop as the analytics snapshot, so two
// concurrent "track" calls can't both slip in as the 20th profile.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, CoreResult};
use crate::feed::Priority;
use crate::pipeline::retry::{read_modify_write, retry_store, RetryPolicy};
use crate::store::{self, keys, KeyValueStore};

pub const MAX_TRACKED_PROFILES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedProfile {
    pub id: String,
    pub name: String,
    pub title: String,
    pub avatar: String,
    pub initials: String,
    pub priority: Priority,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl TrackedProfile {
    /// Build a profile entry from a LinkedIn URL.
    pub fn from_url(url: &str, now: DateTime<Utc>) -> CoreResult<Self> {
        let url = url.trim();
        if url.is_empty() || !url.contains("linkedin.com") {
            return Err(CoreError::validation("Valid LinkedIn profile URL required"));
        }

        let name = display_name(url).unwrap_or_else(|| "LinkedIn Member".to_string());
        let initials = initials(&name);

        Ok(Self {
            id: format!(
                "profile-{}-{:08x}",
                now.timestamp_millis(),
                rand::random::<u32>()
            ),
            name,
            title: String::new(),
            avatar: String::new(),
            initials,
            priority: Priority::Medium,
            url: url.to_string(),
            added_at: now,
        })
    }
}

/// Add a profile to the user's tracked list.
pub async fn track(
    kv: &dyn KeyValueStore,
    policy: &RetryPolicy,
    user_id: &str,
    profile_url: &str,
    now: DateTime<Utc>,
) -> CoreResult<TrackedProfile> {
    let profile = TrackedProfile::from_url(profile_url, now)?;
    let key = keys::tracked_profiles(user_id);

    read_modify_write(
        kv,
        policy,
        &key,
        |current: Option<Vec<TrackedProfile>>| {
            let mut profiles = current.unwrap_or_default();
            if profiles.len() >= MAX_TRACKED_PROFILES {
                return Err(CoreError::validation("Maximum 20 profiles allowed"));
            }
            profiles.push(profile.clone());
            Ok(profiles)
        },
    )
    .await?;

    info!(user_id, url = %profile.url, "Tracking profile");
    Ok(profile)
}

pub async fn list(
    kv: &dyn KeyValueStore,
    policy: &RetryPolicy,
    user_id: &str,
) -> CoreResult<Vec<TrackedProfile>> {
    let key = keys::tracked_profiles(user_id);
    let stored: Option<(i64, Vec<TrackedProfile>)> =
        retry_store(policy, "get_tracked_profiles", || store::get_typed(kv, &key)).await?;
    Ok(stored.map(|(_, p)| p).unwrap_or_default())
}

/// "https://www.linkedin.com/in/jane-doe-4a2b1c/" -> "Jane Doe".
///
/// Slug segments containing digits are LinkedIn's disambiguation suffix.
fn display_name(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let slug = path
        .split('/')
        .skip_while(|segment| *segment != "in")
        .nth(1)
        .filter(|s| !s.is_empty())?;

    let words: Vec<String> = slug
        .split(['-', '_'])
        .filter(|w| !w.is_empty() && !w.chars().any(|c| c.is_ascii_digit()))
        .map(capitalize)
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|w| w.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_from_slug() {
        assert_eq!(
            display_name("https://www.linkedin.com/in/jane-doe-4a2b1c/").as_deref(),
            Some("Jane Doe")
        );
        assert_eq!(
            display_name("https://linkedin.com/in/mrodriguez?trk=feed").as_deref(),
            Some("Mrodriguez")
        );
        assert_eq!(display_name("https://linkedin.com/company/acme"), None);
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Jane Marie Doe"), "JM");
        assert_eq!(initials("Mrodriguez"), "M");
        assert_eq!(initials(""), "");
    }

    #[test]
    fn test_non_linkedin_rejected() {
        let err = TrackedProfile::from_url("https://example.com/in/jane", Utc::now()).unwrap_err();
        assert_eq!(err, CoreError::validation("Valid LinkedIn profile URL required"));
    }

    #[test]
    fn test_ids_unique_within_one_instant() {
        let now = Utc::now();
        let a = TrackedProfile::from_url("https://linkedin.com/in/jane-doe", now).unwrap();
        let b = TrackedProfile::from_url("https://linkedin.com/in/jane-doe", now).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with(&format!("profile-{}-", now.timestamp_millis())));
    }

    #[test]
    fn test_fallback_name() {
        let profile = TrackedProfile::from_url("https://linkedin.com/feed/", Utc::now()).unwrap();
        assert_eq!(profile.name, "LinkedIn Member");
        assert_eq!(profile.initials, "LM");
        assert_eq!(profile.priority, Priority::Medium);
    }
}
