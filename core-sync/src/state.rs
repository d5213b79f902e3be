//! Per-platform sync state and its transition rules.
//!
//! Every mutation of a [`PlatformSyncState`] goes through a named transition
//! method; illegal transitions return
//! [`SyncError::InvalidStateTransition`] instead of silently corrupting the
//! record. The methods are pure state updates with no I/O, which keeps the
//! rules testable without a runtime.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Utc};
use core_auth::Platform;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Synchronization status of a single platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    /// Never connected, or fully reset after a disconnect.
    NotSynced,
    /// Connected, no sync running.
    Idle,
    /// A sync is currently running.
    InProgress,
    /// The most recent sync finished successfully.
    Completed,
    /// The most recent sync (or a credential check) failed.
    Error,
}

impl SyncStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotSynced => "not_synced",
            SyncStatus::Idle => "idle",
            SyncStatus::InProgress => "in_progress",
            SyncStatus::Completed => "completed",
            SyncStatus::Error => "error",
        }
    }

    /// Whether a new sync may start from this status.
    pub fn can_begin_sync(&self) -> bool {
        !matches!(self, SyncStatus::InProgress)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, SyncStatus::InProgress)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "not_synced" => Ok(SyncStatus::NotSynced),
            "idle" => Ok(SyncStatus::Idle),
            "in_progress" => Ok(SyncStatus::InProgress),
            "completed" => Ok(SyncStatus::Completed),
            "error" => Ok(SyncStatus::Error),
            other => Err(SyncError::Remote {
                platform: None,
                message: format!("unknown sync status '{}'", other),
            }),
        }
    }
}

/// Connection and sync record for one platform.
///
/// Invariants upheld by the transition methods:
/// - `error_message` is `Some` exactly when `sync_status == Error`
/// - `last_sync_time` changes only on a transition into `Completed`
/// - a disconnected platform is never `InProgress`, `Completed`, or `Error`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformSyncState {
    pub platform: Platform,
    /// Whether this platform is available in the current build/config.
    pub is_enabled: bool,
    pub is_connected: bool,
    pub sync_status: SyncStatus,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl PlatformSyncState {
    pub fn new(platform: Platform, is_enabled: bool) -> Self {
        Self {
            platform,
            is_enabled,
            is_connected: false,
            sync_status: SyncStatus::NotSynced,
            last_sync_time: None,
            error_message: None,
        }
    }

    fn invalid(&self, to: SyncStatus, reason: &str) -> SyncError {
        SyncError::InvalidStateTransition {
            from: self.sync_status.to_string(),
            to: to.to_string(),
            reason: format!("{} ({})", reason, self.platform),
        }
    }

    /// Mark the platform as connected, landing at `Idle`.
    ///
    /// Legal from every status except `InProgress`; connecting never
    /// interrupts a running sync.
    pub fn mark_connected(&mut self) -> Result<()> {
        if self.sync_status.is_in_progress() {
            return Err(self.invalid(SyncStatus::Idle, "cannot connect while a sync is running"));
        }
        self.is_connected = true;
        self.sync_status = SyncStatus::Idle;
        self.error_message = None;
        Ok(())
    }

    /// Start a sync: `NotSynced | Idle | Completed | Error → InProgress`.
    pub fn begin_sync(&mut self) -> Result<()> {
        if !self.is_connected {
            return Err(self.invalid(SyncStatus::InProgress, "platform is not connected"));
        }
        if !self.sync_status.can_begin_sync() {
            return Err(self.invalid(SyncStatus::InProgress, "a sync is already running"));
        }
        self.sync_status = SyncStatus::InProgress;
        self.error_message = None;
        Ok(())
    }

    /// Finish a sync successfully: `InProgress → Completed`.
    pub fn complete_sync(&mut self, at: DateTime<Utc>) -> Result<()> {
        if !self.sync_status.is_in_progress() {
            return Err(self.invalid(SyncStatus::Completed, "no sync is running"));
        }
        self.sync_status = SyncStatus::Completed;
        self.last_sync_time = Some(at);
        self.error_message = None;
        Ok(())
    }

    /// Record a sync failure: `InProgress → Error` with a cause.
    ///
    /// `last_sync_time` keeps the timestamp of the last successful sync.
    pub fn fail_sync(&mut self, message: impl Into<String>) -> Result<()> {
        if !self.sync_status.is_in_progress() {
            return Err(self.invalid(SyncStatus::Error, "no sync is running"));
        }
        self.sync_status = SyncStatus::Error;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Abort a running sync cleanly: `InProgress → Idle`.
    ///
    /// Cancellation is not an error; no `error_message` is recorded.
    pub fn cancel_sync(&mut self) -> Result<()> {
        if !self.sync_status.is_in_progress() {
            return Err(self.invalid(SyncStatus::Idle, "no sync is running"));
        }
        self.sync_status = SyncStatus::Idle;
        self.error_message = None;
        Ok(())
    }

    /// Mark connected-but-unusable credentials: `Idle | Completed | Error →
    /// Error` while staying connected. Used when a refresh is rejected.
    pub fn credentials_invalidated(&mut self, message: impl Into<String>) -> Result<()> {
        if !self.is_connected {
            return Err(self.invalid(SyncStatus::Error, "platform is not connected"));
        }
        if self.sync_status.is_in_progress() {
            return Err(self.invalid(SyncStatus::Error, "a sync is running"));
        }
        self.sync_status = SyncStatus::Error;
        self.error_message = Some(message.into());
        Ok(())
    }

    /// Restore a completed-sync record reported by the backend.
    ///
    /// Only meaningful right after [`mark_connected`](Self::mark_connected)
    /// during session restore; a no-op unless the platform sits at `Idle`.
    pub fn restore_completed(&mut self, at: DateTime<Utc>) {
        if self.is_connected && self.sync_status == SyncStatus::Idle {
            self.sync_status = SyncStatus::Completed;
            self.last_sync_time = Some(at);
        }
    }

    /// Reset to the never-connected baseline. Legal from any state.
    pub fn disconnect(&mut self) {
        self.is_connected = false;
        self.sync_status = SyncStatus::NotSynced;
        self.last_sync_time = None;
        self.error_message = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(platform: Platform) -> PlatformSyncState {
        let mut state = PlatformSyncState::new(platform, true);
        state.mark_connected().unwrap();
        state
    }

    fn assert_invariants(state: &PlatformSyncState) {
        assert_eq!(
            state.error_message.is_some(),
            state.sync_status == SyncStatus::Error
        );
        if !state.is_connected {
            assert!(matches!(
                state.sync_status,
                SyncStatus::NotSynced | SyncStatus::Idle
            ));
        }
    }

    #[test]
    fn test_new_state_baseline() {
        let state = PlatformSyncState::new(Platform::Spotify, true);
        assert!(!state.is_connected);
        assert_eq!(state.sync_status, SyncStatus::NotSynced);
        assert!(state.last_sync_time.is_none());
        assert_invariants(&state);
    }

    #[test]
    fn test_full_sync_lifecycle() {
        let mut state = connected(Platform::Spotify);
        assert_eq!(state.sync_status, SyncStatus::Idle);

        state.begin_sync().unwrap();
        assert_eq!(state.sync_status, SyncStatus::InProgress);

        let at = Utc::now();
        state.complete_sync(at).unwrap();
        assert_eq!(state.sync_status, SyncStatus::Completed);
        assert_eq!(state.last_sync_time, Some(at));
        assert_invariants(&state);
    }

    #[test]
    fn test_begin_sync_requires_connection() {
        let mut state = PlatformSyncState::new(Platform::Melon, true);
        let err = state.begin_sync().unwrap_err();
        assert!(matches!(err, SyncError::InvalidStateTransition { .. }));
        assert_eq!(state.sync_status, SyncStatus::NotSynced);
    }

    #[test]
    fn test_begin_sync_rejected_while_in_progress() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        assert!(state.begin_sync().is_err());
        assert_eq!(state.sync_status, SyncStatus::InProgress);
    }

    #[test]
    fn test_begin_sync_clears_previous_error() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        state.fail_sync("rate limited").unwrap();
        assert_eq!(state.error_message.as_deref(), Some("rate limited"));

        state.begin_sync().unwrap();
        assert!(state.error_message.is_none());
        assert_invariants(&state);
    }

    #[test]
    fn test_fail_sync_preserves_last_sync_time() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        let at = Utc::now();
        state.complete_sync(at).unwrap();

        state.begin_sync().unwrap();
        state.fail_sync("network down").unwrap();
        assert_eq!(state.sync_status, SyncStatus::Error);
        assert_eq!(state.last_sync_time, Some(at));
        assert_invariants(&state);
    }

    #[test]
    fn test_complete_requires_in_progress() {
        let mut state = connected(Platform::Spotify);
        assert!(state.complete_sync(Utc::now()).is_err());
        assert!(state.fail_sync("nope").is_err());
        assert!(state.last_sync_time.is_none());
    }

    #[test]
    fn test_cancel_returns_to_idle_without_error() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        state.cancel_sync().unwrap();
        assert_eq!(state.sync_status, SyncStatus::Idle);
        assert!(state.error_message.is_none());
        assert_invariants(&state);
    }

    #[test]
    fn test_mark_connected_rejected_during_sync() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        assert!(state.mark_connected().is_err());
        assert_eq!(state.sync_status, SyncStatus::InProgress);
    }

    #[test]
    fn test_credentials_invalidated_from_idle() {
        let mut state = connected(Platform::Spotify);
        state.credentials_invalidated("refresh rejected").unwrap();
        assert_eq!(state.sync_status, SyncStatus::Error);
        assert!(state.is_connected);
        assert_invariants(&state);
    }

    #[test]
    fn test_credentials_invalidated_requires_connection() {
        let mut state = PlatformSyncState::new(Platform::Spotify, true);
        assert!(state.credentials_invalidated("nope").is_err());
    }

    #[test]
    fn test_disconnect_resets_everything() {
        let mut state = connected(Platform::Spotify);
        state.begin_sync().unwrap();
        state.complete_sync(Utc::now()).unwrap();

        state.disconnect();
        assert_eq!(state, PlatformSyncState::new(Platform::Spotify, true));
        assert_invariants(&state);
    }

    #[test]
    fn test_reconnect_after_disconnect_matches_first_connect() {
        let mut round_trip = connected(Platform::Spotify);
        round_trip.begin_sync().unwrap();
        round_trip.complete_sync(Utc::now()).unwrap();
        round_trip.disconnect();
        round_trip.mark_connected().unwrap();

        assert_eq!(round_trip, connected(Platform::Spotify));
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in [
            SyncStatus::NotSynced,
            SyncStatus::Idle,
            SyncStatus::InProgress,
            SyncStatus::Completed,
            SyncStatus::Error,
        ] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("sideways".parse::<SyncStatus>().is_err());
    }
}
