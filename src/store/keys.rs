// Key layout — one namespace per user.
//
//   user:{id}:preferences
//   user:{id}:analytics
//   user:{id}:daily:{YYYY-MM-DD}
//   user:{id}:approvals:{postId}
//   user:{id}:comments:{postId}
//   user:{id}:tracked_profiles
//   user:{id}:feed_posts
//   user:{id}:fastlane:{postId}

use chrono::NaiveDate;

pub fn user_prefix(user_id: &str) -> String {
    format!("user:{user_id}:")
}

pub fn preferences(user_id: &str) -> String {
    format!("user:{user_id}:preferences")
}

pub fn analytics(user_id: &str) -> String {
    format!("user:{user_id}:analytics")
}

pub fn daily(user_id: &str, day: NaiveDate) -> String {
    format!("user:{user_id}:daily:{}", day.format("%Y-%m-%d"))
}

pub fn approval(user_id: &str, post_id: &str) -> String {
    format!("user:{user_id}:approvals:{post_id}")
}

pub fn comments(user_id: &str, post_id: &str) -> String {
    format!("user:{user_id}:comments:{post_id}")
}

pub fn tracked_profiles(user_id: &str) -> String {
    format!("user:{user_id}:tracked_profiles")
}

pub fn feed_posts(user_id: &str) -> String {
    format!("user:{user_id}:feed_posts")
}

pub fn fastlane(user_id: &str, post_id: &str) -> String {
    format!("user:{user_id}:fastlane:{post_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_key_uses_iso_date() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(daily("abc", day), "user:abc:daily:2026-03-07");
    }

    #[test]
    fn test_keys_share_user_prefix() {
        let prefix = user_prefix("u1");
        assert!(analytics("u1").starts_with(&prefix));
        assert!(approval("u1", "p9").starts_with(&prefix));
        assert!(!analytics("u10").starts_with(&prefix));
    }
}
