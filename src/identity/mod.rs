// Identity — turns an opaque bearer credential into a user id.
//
// Two providers: locally issued HMAC tokens (the default, see `ingrow token`)
// and a remote Supabase-style auth server selected by IDENTITY_URL. Both are
// used through `Arc<dyn IdentityProvider>` so the web layer can't tell them
// apart.

pub mod local;
pub mod remote;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::{Config, IdentityBackend};
use crate::error::CoreResult;

pub use local::HmacIdentity;
pub use remote::RemoteIdentity;

/// Validates a bearer credential.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The stable user id behind `token`, or `CoreError::Auth`.
    async fn authenticate(&self, token: &str) -> CoreResult<String>;
}

/// Build the provider selected by configuration.
pub fn from_config(config: &Config) -> Result<Arc<dyn IdentityProvider>> {
    config.require_identity()?;
    match (config.identity_backend(), config.identity_url.as_deref()) {
        (IdentityBackend::Remote, Some(url)) => Ok(Arc::new(RemoteIdentity::new(
            url,
            &config.identity_api_key,
        )?)),
        _ => Ok(Arc::new(HmacIdentity::new(
            &config.session_secret,
            config.session_ttl_secs,
        ))),
    }
}
