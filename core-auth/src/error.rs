use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Unknown platform: {0}")]
    UnknownPlatform(String),

    #[error("Invalid authorization config for {platform}: {reason}")]
    InvalidConfig { platform: String, reason: String },

    #[error("Callback listener registration failed: {0}")]
    ListenerRegistration(String),

    #[error("Failed to launch external user agent: {0}")]
    LaunchFailed(String),

    #[error("Authorization callback carried no code")]
    MissingCode,

    #[error("Authorization callback state did not match")]
    StateMismatch,

    #[error("Authorization cancelled")]
    Cancelled,

    #[error("Authorization timed out after {secs} seconds")]
    TimedOut { secs: u64 },
}

impl AuthError {
    /// Whether the caller can sensibly retry the authorization attempt.
    ///
    /// Cancellation and timeout are recoverable; configuration and listener
    /// failures are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AuthError::Cancelled
                | AuthError::TimedOut { .. }
                | AuthError::MissingCode
                | AuthError::LaunchFailed(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
