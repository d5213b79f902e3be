//! Platform account linking.
//!
//! [`ConnectionManager`] drives the full connect path (authorization
//! handshake, code exchange on the backend, local state update) and the
//! disconnect path. Disconnects always reset local state: a failed remote
//! revoke is reported through the event bus, never by refusing to unlink.

use crate::error::{Result, SyncError};
use crate::remote::MusicRemote;
use crate::store::StateStore;
use core_auth::{AuthorizationFlow, Platform, PlatformAuth};
use core_runtime::events::{ConnectionEvent, CoreEvent, EventBus};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Tunables for connection workflows.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// How long to wait for the authorization redirect before giving up.
    pub auth_timeout: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            auth_timeout: Duration::from_secs(300),
        }
    }
}

/// Links and unlinks platform accounts.
pub struct ConnectionManager {
    flow: Arc<AuthorizationFlow>,
    remote: Arc<dyn MusicRemote>,
    store: Arc<StateStore>,
    events: EventBus,
    config: ConnectionConfig,
    cancel: Mutex<CancellationToken>,
}

impl ConnectionManager {
    pub fn new(
        flow: Arc<AuthorizationFlow>,
        remote: Arc<dyn MusicRemote>,
        store: Arc<StateStore>,
        events: EventBus,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            flow,
            remote,
            store,
            events,
            config,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Link a platform account.
    ///
    /// Runs the authorization handshake, forwards the code to the backend
    /// for the credential exchange, and on success marks the platform
    /// connected. Any failure leaves the platform unconnected; cancellation
    /// and timeout keep their distinct error variants so the caller can
    /// tell them apart from real failures.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn connect(&self, platform: Platform) -> Result<PlatformAuth> {
        let current = self
            .store
            .get(platform)
            .await
            .ok_or(SyncError::NotConnected { platform })?;
        if !current.is_enabled {
            return Err(SyncError::PlatformDisabled { platform });
        }

        self.emit(ConnectionEvent::Connecting {
            platform: platform.to_string(),
        });

        let cancel = self.current_token();
        let code = match self
            .flow
            .begin_authorization(platform, self.config.auth_timeout, &cancel)
            .await
        {
            Ok(code) => code,
            Err(e) => {
                self.emit_error(Some(platform), &e.to_string(), e.is_recoverable());
                return Err(e.into());
            }
        };

        let valid = self
            .remote
            .exchange_auth_code(platform, &code)
            .await
            .map_err(|e| {
                self.emit_error(Some(platform), &e.to_string(), true);
                e
            })?;
        if !valid {
            self.emit_error(Some(platform), "backend rejected the exchanged code", false);
            return Err(SyncError::CredentialsRejected { platform });
        }

        self.store
            .update(platform, |state| state.mark_connected())
            .await?;

        info!("platform connected");
        self.emit(ConnectionEvent::Connected {
            platform: platform.to_string(),
        });
        Ok(PlatformAuth::new(platform, true))
    }

    /// Unlink a platform account.
    ///
    /// The backend revoke is attempted first; whatever its outcome, local
    /// state is reset and `Disconnected` is emitted. A revoke failure is
    /// logged and reported as a recoverable `ConnectionError` event.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn disconnect(&self, platform: Platform) -> Result<()> {
        if let Err(e) = self.remote.revoke_credentials(platform).await {
            warn!(error = %e, "remote revoke failed; resetting local state anyway");
            self.emit_error(Some(platform), &e.to_string(), true);
        }

        self.store
            .update(platform, |state| {
                state.disconnect();
                Ok(())
            })
            .await?;

        info!("platform disconnected");
        self.emit(ConnectionEvent::Disconnected {
            platform: platform.to_string(),
        });
        Ok(())
    }

    /// Unlink every connected platform.
    ///
    /// Each platform is disconnected independently; every local state is
    /// reset. Returns the platforms whose remote revoke failed.
    #[instrument(skip(self))]
    pub async fn disconnect_all(&self) -> Result<Vec<Platform>> {
        let connected = self.store.connected_platforms().await;
        let mut revoke_failures = Vec::new();

        for platform in connected {
            if let Err(e) = self.remote.revoke_credentials(platform).await {
                warn!(platform = %platform, error = %e, "remote revoke failed");
                self.emit_error(Some(platform), &e.to_string(), true);
                revoke_failures.push(platform);
            }
            self.store
                .update(platform, |state| {
                    state.disconnect();
                    Ok(())
                })
                .await?;
            self.emit(ConnectionEvent::Disconnected {
                platform: platform.to_string(),
            });
        }

        Ok(revoke_failures)
    }

    /// Refresh the backend-held credentials for a connected platform.
    ///
    /// A rejected refresh marks the platform's credentials invalid (the
    /// user must reconnect); a transport error leaves state untouched so
    /// the caller can retry.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn refresh_token(&self, platform: Platform) -> Result<PlatformAuth> {
        let current = self
            .store
            .get(platform)
            .await
            .ok_or(SyncError::NotConnected { platform })?;
        if !current.is_connected {
            return Err(SyncError::NotConnected { platform });
        }

        match self.remote.refresh_credentials(platform).await {
            Ok(true) => {
                self.emit(ConnectionEvent::TokenRefreshed {
                    platform: platform.to_string(),
                });
                Ok(PlatformAuth::new(platform, true))
            }
            Ok(false) => {
                self.store
                    .update(platform, |state| {
                        state.credentials_invalidated(
                            "credential refresh rejected; reconnect required",
                        )
                    })
                    .await?;
                self.emit_error(Some(platform), "credential refresh rejected", false);
                Err(SyncError::CredentialsRejected { platform })
            }
            Err(e) => {
                warn!(error = %e, "credential refresh failed; state unchanged");
                Err(e)
            }
        }
    }

    /// Seed local state from the backend's view of already-linked platforms.
    ///
    /// Used at session start so previously linked platforms show up
    /// connected without a fresh authorization. Returns the restored set.
    #[instrument(skip(self))]
    pub async fn restore_connections(&self) -> Result<Vec<Platform>> {
        let connected = self.remote.list_connected_platforms().await?;
        let statuses = self.remote.get_sync_statuses().await?;

        for &platform in &connected {
            let last_sync = self.remote.get_last_sync_time(Some(platform)).await?;
            let backend_status = statuses.get(&platform).copied();
            self.store
                .update(platform, move |state| {
                    state.mark_connected()?;
                    // A completed history restores as Completed with its
                    // timestamp; everything else starts the session at Idle.
                    if let (Some(crate::state::SyncStatus::Completed), Some(at)) =
                        (backend_status, last_sync)
                    {
                        state.restore_completed(at);
                    }
                    Ok(())
                })
                .await?;
        }

        info!(count = connected.len(), "restored platform connections");
        Ok(connected)
    }

    /// Tear the session down: abort any in-flight authorization and close
    /// the redirect gateway so no listener outlives the session.
    pub fn shutdown(&self) {
        self.cancel_authorization();
        self.flow.gateway().close();
    }

    /// Cancel any in-flight authorization and re-arm for the next attempt.
    pub fn cancel_authorization(&self) {
        let token = match self.cancel.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, CancellationToken::new()),
            Err(_) => return,
        };
        token.cancel();
    }

    fn current_token(&self) -> CancellationToken {
        match self.cancel.lock() {
            Ok(guard) => guard.clone(),
            Err(_) => CancellationToken::new(),
        }
    }

    fn emit(&self, event: ConnectionEvent) {
        // No subscribers is fine; events are advisory.
        let _ = self.events.emit(CoreEvent::Connection(event));
    }

    fn emit_error(&self, platform: Option<Platform>, message: &str, recoverable: bool) {
        self.emit(ConnectionEvent::ConnectionError {
            platform: platform.map(|p| p.to_string()),
            message: message.to_string(),
            recoverable,
        });
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .finish()
    }
}
