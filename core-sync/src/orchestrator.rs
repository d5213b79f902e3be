//! Sync coordination.
//!
//! [`SyncOrchestrator`] runs content syncs against the backend, one platform
//! at a time or fanned out across the connected set. Each platform's sync is
//! its own task, so a failure or panic in one never takes down its siblings;
//! the batch result is an aggregate [`SyncReport`], never a single fatal
//! error.

use crate::error::{Result, SyncError};
use crate::remote::MusicRemote;
use crate::store::StateStore;
use chrono::Utc;
use core_auth::Platform;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use futures::future::join_all;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

/// Tunables for sync workflows.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Per-platform deadline for one sync run.
    pub sync_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            sync_timeout: Duration::from_secs(600),
        }
    }
}

/// Aggregate outcome of a batch sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Platforms whose sync completed.
    pub completed: Vec<Platform>,
    /// Platforms whose sync failed, with the cause.
    pub failed: Vec<(Platform, String)>,
    /// Platforms whose sync was cancelled mid-flight.
    pub cancelled: Vec<Platform>,
}

impl SyncReport {
    /// True when every platform in the batch completed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.cancelled.is_empty()
    }
}

/// Coordinates per-platform sync runs with timeouts and cancellation.
pub struct SyncOrchestrator {
    remote: Arc<dyn MusicRemote>,
    store: Arc<StateStore>,
    events: EventBus,
    config: SyncConfig,
    cancel: Mutex<CancellationToken>,
}

impl SyncOrchestrator {
    pub fn new(
        remote: Arc<dyn MusicRemote>,
        store: Arc<StateStore>,
        events: EventBus,
        config: SyncConfig,
    ) -> Self {
        Self {
            remote,
            store,
            events,
            config,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Sync one platform's content.
    ///
    /// The remote call races against the session cancellation token and the
    /// configured timeout. The remote arm is polled first, so a sync that
    /// has already finished wins over a simultaneous cancellation and its
    /// result is kept. Cancellation lands the platform back at `Idle`;
    /// failure and timeout land it at `Error` with the cause recorded.
    #[instrument(skip(self), fields(platform = %platform))]
    pub async fn sync_platform(&self, platform: Platform) -> Result<()> {
        let current = self
            .store
            .get(platform)
            .await
            .ok_or(SyncError::NotConnected { platform })?;
        if !current.is_connected {
            return Err(SyncError::NotConnected { platform });
        }

        self.store
            .update(platform, |state| state.begin_sync())
            .await?;
        self.emit(SyncEvent::Started {
            platform: platform.to_string(),
        });

        let cancel = self.current_token();
        let outcome = tokio::select! {
            biased;

            result = self.remote.sync_platform_content(platform) => result,
            _ = cancel.cancelled() => {
                self.store
                    .update(platform, |state| state.cancel_sync())
                    .await?;
                info!("sync cancelled");
                self.emit(SyncEvent::Cancelled {
                    platform: platform.to_string(),
                });
                return Err(SyncError::Cancelled);
            }
            _ = tokio::time::sleep(self.config.sync_timeout) => {
                Err(SyncError::TimedOut {
                    platform,
                    secs: self.config.sync_timeout.as_secs(),
                })
            }
        };

        match outcome {
            Ok(()) => {
                self.store
                    .update(platform, |state| state.complete_sync(Utc::now()))
                    .await?;
                info!("sync completed");
                self.emit(SyncEvent::Completed {
                    platform: platform.to_string(),
                });
                Ok(())
            }
            Err(e) => {
                let cause = e.to_string();
                warn!(error = %cause, "sync failed");
                self.store
                    .update(platform, |state| state.fail_sync(cause.clone()))
                    .await?;
                self.emit(SyncEvent::Failed {
                    platform: platform.to_string(),
                    message: cause,
                });
                Err(e)
            }
        }
    }

    /// Sync every connected platform concurrently.
    ///
    /// One task per platform; each platform's state reflects its own
    /// outcome. A platform that fails (or whose task panics) never affects
    /// its siblings. The report aggregates all outcomes.
    #[instrument(skip(self))]
    pub async fn sync_all(self: &Arc<Self>) -> SyncReport {
        let connected = self.store.connected_platforms().await;

        let handles: Vec<_> = connected
            .into_iter()
            .map(|platform| {
                let orchestrator = Arc::clone(self);
                let handle =
                    tokio::spawn(async move { orchestrator.sync_platform(platform).await });
                (platform, handle)
            })
            .collect();

        let mut report = SyncReport::default();
        let results = join_all(handles.into_iter().map(|(platform, handle)| async move {
            (platform, handle.await)
        }))
        .await;

        for (platform, joined) in results {
            match joined {
                Ok(Ok(())) => report.completed.push(platform),
                Ok(Err(SyncError::Cancelled)) => report.cancelled.push(platform),
                Ok(Err(e)) => report.failed.push((platform, e.to_string())),
                Err(join_err) => {
                    warn!(platform = %platform, error = %join_err, "sync task aborted");
                    report.failed.push((platform, join_err.to_string()));
                }
            }
        }

        self.emit(SyncEvent::BatchFinished {
            succeeded: report.completed.len() as u32,
            failed: report.failed.len() as u32,
            cancelled: report.cancelled.len() as u32,
        });
        info!(
            succeeded = report.completed.len(),
            failed = report.failed.len(),
            cancelled = report.cancelled.len(),
            "sync batch finished"
        );
        report
    }

    /// Cancel every in-flight sync and re-arm for the next run.
    pub fn cancel_sync(&self) {
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

    fn emit(&self, event: SyncEvent) {
        let _ = self.events.emit(CoreEvent::Sync(event));
    }
}

impl std::fmt::Debug for SyncOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncOrchestrator")
            .field("config", &self.config)
            .finish()
    }
}
