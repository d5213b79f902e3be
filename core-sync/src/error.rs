use core_auth::{AuthError, Platform};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Platform {platform} is not connected")]
    NotConnected { platform: Platform },

    #[error("Platform {platform} is disabled")]
    PlatformDisabled { platform: Platform },

    #[error("Invalid state transition from {from} to {to}: {reason}")]
    InvalidStateTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("Remote backend rejected credentials for {platform}")]
    CredentialsRejected { platform: Platform },

    #[error("Remote operation failed: {message}")]
    Remote {
        platform: Option<Platform>,
        message: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Sync for {platform} timed out after {secs} seconds")]
    TimedOut { platform: Platform, secs: u64 },

    #[error(transparent)]
    Auth(AuthError),
}

impl From<AuthError> for SyncError {
    fn from(e: AuthError) -> Self {
        // Cancellation stays a first-class outcome across the crate
        // boundary instead of hiding inside the auth wrapper.
        match e {
            AuthError::Cancelled => SyncError::Cancelled,
            other => SyncError::Auth(other),
        }
    }
}

impl SyncError {
    /// Whether retrying the same operation can reasonably succeed.
    pub fn is_recoverable(&self) -> bool {
        match self {
            SyncError::Remote { .. }
            | SyncError::Cancelled
            | SyncError::TimedOut { .. } => true,
            SyncError::Auth(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
