use std::env;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::pipeline::RetryPolicy;

/// Default session lifetime for locally issued tokens: 7 days.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 604_800;

/// Which identity provider validates bearer tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum IdentityBackend {
    /// HMAC tokens issued by `ingrow token` (default).
    Local,
    /// Supabase-style auth server at IDENTITY_URL.
    Remote,
}

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    /// PostgreSQL connection URL (when set and starts with postgres://, uses Postgres backend)
    pub database_url: Option<String>,
    /// Secret for HMAC session token signing (INGROW_SESSION_SECRET env var)
    pub session_secret: String,
    pub session_ttl_secs: u64,
    /// Base URL of the remote identity provider; selects the remote backend when set.
    pub identity_url: Option<String>,
    /// Sent as the `apikey` header to the remote identity provider.
    pub identity_api_key: String,
    /// Per store round trip.
    pub store_timeout: Duration,
    pub store_max_retries: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the signing secret, which only
    /// `serve` and `token` need (see `require_identity`).
    pub fn load() -> Result<Self> {
        let session_ttl_secs = parse_env("INGROW_SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?;
        let store_timeout_ms = parse_env("INGROW_STORE_TIMEOUT_MS", 2_000u64)?;
        let store_max_retries = parse_env("INGROW_STORE_MAX_RETRIES", 5u32)?;

        Ok(Self {
            db_path: env::var("INGROW_DB_PATH").unwrap_or_else(|_| "./ingrow.db".to_string()),
            database_url: env::var("DATABASE_URL").ok(),
            session_secret: env::var("INGROW_SESSION_SECRET").unwrap_or_default(),
            session_ttl_secs,
            identity_url: env::var("IDENTITY_URL").ok().filter(|u| !u.trim().is_empty()),
            identity_api_key: env::var("IDENTITY_API_KEY").unwrap_or_default(),
            store_timeout: Duration::from_millis(store_timeout_ms),
            store_max_retries,
        })
    }

    pub fn identity_backend(&self) -> IdentityBackend {
        if self.identity_url.is_some() {
            IdentityBackend::Remote
        } else {
            IdentityBackend::Local
        }
    }

    /// True when DATABASE_URL points at PostgreSQL.
    pub fn uses_postgres(&self) -> bool {
        self.database_url
            .as_deref()
            .is_some_and(|u| u.starts_with("postgres://") || u.starts_with("postgresql://"))
    }

    /// Retry policy for store writes, from the store tuning variables.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.store_max_retries,
            op_timeout: self.store_timeout,
            ..RetryPolicy::default()
        }
    }

    /// Check that the configured identity backend has what it needs.
    /// Call this before serving requests.
    pub fn require_identity(&self) -> Result<()> {
        match self.identity_backend() {
            IdentityBackend::Local => self.require_session_secret(),
            IdentityBackend::Remote => {
                if self.identity_api_key.is_empty() {
                    anyhow::bail!(
                        "IDENTITY_URL is set but IDENTITY_API_KEY is not. Add it to your .env file.\n\
                         See .env.example for the required variables."
                    );
                }
                Ok(())
            }
        }
    }

    /// Check that the local token signing secret is configured.
    /// Call this before issuing or verifying local tokens.
    pub fn require_session_secret(&self) -> Result<()> {
        if self.session_secret.len() < 16 {
            anyhow::bail!(
                "INGROW_SESSION_SECRET not set (or shorter than 16 bytes). Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}
