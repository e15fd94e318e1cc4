// Local bearer tokens — stateless HMAC-SHA256, no session table.
//
// Token format: {user_b64}.{timestamp_secs}.{nonce_hex}.{hmac_hex}
//
// user_b64 is the user id in unpadded URL-safe base64, so ids may contain
// dots. The HMAC covers everything before the last dot, signed with
// INGROW_SESSION_SECRET. Tokens are valid for INGROW_SESSION_TTL_SECS.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use super::IdentityProvider;
use crate::error::{CoreError, CoreResult};

type HmacSha256 = Hmac<Sha256>;

pub struct HmacIdentity {
    secret: String,
    ttl_secs: u64,
}

impl HmacIdentity {
    pub fn new(secret: &str, ttl_secs: u64) -> Self {
        Self {
            secret: secret.to_string(),
            ttl_secs,
        }
    }

    /// Issue a token for `user_id`, timestamped now.
    pub fn issue(&self, user_id: &str) -> CoreResult<String> {
        self.issue_at(user_id, unix_now())
    }

    pub fn issue_at(&self, user_id: &str, timestamp: u64) -> CoreResult<String> {
        if user_id.trim().is_empty() {
            return Err(CoreError::validation("User id is required"));
        }

        let mut nonce_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = hex::encode(nonce_bytes);

        let user = URL_SAFE_NO_PAD.encode(user_id.as_bytes());
        let payload = format!("{user}.{timestamp}.{nonce}");
        let sig = hex::encode(self.mac(&payload)?.finalize().into_bytes());

        Ok(format!("{payload}.{sig}"))
    }

    /// The user id in `token` if the HMAC checks out and the token is younger
    /// than the TTL as of `now_secs`.
    pub fn verify_at(&self, token: &str, now_secs: u64) -> Option<String> {
        let (payload, provided_sig) = token.rsplit_once('.')?;

        let parts: Vec<&str> = payload.split('.').collect();
        let [user_b64, timestamp_str, _nonce] = parts.as_slice() else {
            return None;
        };

        // Verify HMAC (constant time)
        let sig_bytes = hex::decode(provided_sig).ok()?;
        self.mac(payload).ok()?.verify_slice(&sig_bytes).ok()?;

        // Verify age
        let timestamp = timestamp_str.parse::<u64>().ok()?;
        if now_secs.saturating_sub(timestamp) >= self.ttl_secs {
            return None;
        }

        let user_bytes = URL_SAFE_NO_PAD.decode(user_b64).ok()?;
        String::from_utf8(user_bytes).ok().filter(|u| !u.is_empty())
    }

    fn mac(&self, payload: &str) -> CoreResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| CoreError::Internal(format!("invalid signing key: {e}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

#[async_trait]
impl IdentityProvider for HmacIdentity {
    async fn authenticate(&self, token: &str) -> CoreResult<String> {
        self.verify_at(token, unix_now())
            .ok_or_else(|| CoreError::auth("Invalid authorization"))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test_secret_32_bytes_long_enough!";

    #[test]
    fn test_token_roundtrip() {
        let identity = HmacIdentity::new(SECRET, 3600);
        let token = identity.issue("user-123").unwrap();
        assert_eq!(identity.verify_at(&token, unix_now()).as_deref(), Some("user-123"));
    }

    #[test]
    fn test_user_id_with_dots() {
        let identity = HmacIdentity::new(SECRET, 3600);
        let token = identity.issue("jane.doe@example.com").unwrap();
        assert_eq!(
            identity.verify_at(&token, unix_now()).as_deref(),
            Some("jane.doe@example.com")
        );
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = HmacIdentity::new("correct_secret", 3600).issue("u").unwrap();
        assert!(HmacIdentity::new("wrong_secret", 3600)
            .verify_at(&token, unix_now())
            .is_none());
    }

    #[test]
    fn test_tampered_user_rejected() {
        let identity = HmacIdentity::new(SECRET, 3600);
        let token = identity.issue("alice").unwrap();
        let (_, rest) = token.split_once('.').unwrap();
        let forged = format!("{}.{rest}", URL_SAFE_NO_PAD.encode("mallory"));
        assert!(identity.verify_at(&forged, unix_now()).is_none());
    }

    #[test]
    fn test_expired_token_rejected() {
        let identity = HmacIdentity::new(SECRET, 60);
        let token = identity.issue_at("u", 1_000).unwrap();
        assert!(identity.verify_at(&token, 1_059).is_some());
        assert!(identity.verify_at(&token, 1_060).is_none());
    }

    #[test]
    fn test_malformed_token_rejected() {
        let identity = HmacIdentity::new(SECRET, 3600);
        assert!(identity.verify_at("not.a.valid.token.format", unix_now()).is_none());
        assert!(identity.verify_at("", unix_now()).is_none());
        assert!(identity.verify_at("onlytwoparts.here", unix_now()).is_none());
    }

    #[test]
    fn test_blank_user_not_issued() {
        let identity = HmacIdentity::new(SECRET, 3600);
        assert!(matches!(identity.issue("  "), Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_authenticate_maps_to_auth_error() {
        let identity = HmacIdentity::new(SECRET, 3600);
        let err = identity.authenticate("garbage").await.unwrap_err();
        assert_eq!(err, CoreError::auth("Invalid authorization"));
    }
}
