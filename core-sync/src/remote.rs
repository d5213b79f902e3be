//! RPC boundary to the remote backend.
//!
//! The backend owns all credential material and performs the actual
//! platform API work; this core only ever sees opaque outcomes. Every
//! method is fallible: transport failures surface as
//! [`SyncError::Remote`](crate::error::SyncError::Remote) and are treated
//! as transient by callers.

use crate::error::Result;
use crate::state::SyncStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_auth::{AuthorizationCode, Platform};
use std::collections::HashMap;

/// Operations the remote backend performs on behalf of this core.
#[async_trait]
pub trait MusicRemote: Send + Sync {
    /// Exchange an authorization code for backend-held credentials.
    ///
    /// Returns the backend's validity verdict: `false` means the exchange
    /// ran but the resulting credentials are unusable.
    async fn exchange_auth_code(&self, platform: Platform, code: &AuthorizationCode)
        -> Result<bool>;

    /// Revoke the backend-held credentials for one platform.
    async fn revoke_credentials(&self, platform: Platform) -> Result<()>;

    /// Revoke the backend-held credentials for every platform at once.
    async fn revoke_all_credentials(&self) -> Result<()>;

    /// Refresh the credentials for one platform.
    ///
    /// Returns `false` when the backend rejected the refresh and the user
    /// must reauthorize.
    async fn refresh_credentials(&self, platform: Platform) -> Result<bool>;

    /// Platforms the backend currently holds valid credentials for.
    async fn list_connected_platforms(&self) -> Result<Vec<Platform>>;

    /// Run a content sync for one platform on the backend.
    async fn sync_platform_content(&self, platform: Platform) -> Result<()>;

    /// Run a backend-side sync across every connected platform.
    async fn sync_all_platforms(&self) -> Result<()>;

    /// The backend's view of each platform's sync status.
    async fn get_sync_statuses(&self) -> Result<HashMap<Platform, SyncStatus>>;

    /// Timestamp of the most recent successful sync; `None` platform means
    /// the most recent across all platforms.
    async fn get_last_sync_time(&self, platform: Option<Platform>)
        -> Result<Option<DateTime<Utc>>>;
}
