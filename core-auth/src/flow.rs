//! The authorization-code handshake.
//!
//! [`AuthorizationFlow::begin_authorization`] builds the authorization URL,
//! registers a callback listener, launches the external user agent, and
//! suspends until the platform calls back, the attempt is cancelled, or the
//! timeout elapses. The code-for-credentials exchange happens elsewhere;
//! the flow's job ends when it hands back a verified [`AuthorizationCode`].

use crate::callback::RedirectGateway;
use crate::config::AuthConfigRegistry;
use crate::error::{AuthError, Result};
use crate::types::{AuthorizationCode, Platform};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bridge_traits::ExternalUserAgent;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// Drives redirect-based authorization against the configured platforms.
pub struct AuthorizationFlow {
    registry: AuthConfigRegistry,
    gateway: Arc<RedirectGateway>,
    user_agent: Arc<dyn ExternalUserAgent>,
}

impl AuthorizationFlow {
    pub fn new(
        registry: AuthConfigRegistry,
        gateway: Arc<RedirectGateway>,
        user_agent: Arc<dyn ExternalUserAgent>,
    ) -> Self {
        Self {
            registry,
            gateway,
            user_agent,
        }
    }

    /// The gateway the host delivers redirect callbacks to.
    pub fn gateway(&self) -> &Arc<RedirectGateway> {
        &self.gateway
    }

    /// Run one authorization attempt for `platform`.
    ///
    /// The callback listener is registered before the user agent launches,
    /// so a fast redirect can never race past the waiter. The wait resolves
    /// with the first of: callback delivery, cancellation, or timeout. The
    /// callback arm is polled first, so a callback that has already arrived
    /// wins over a concurrent cancellation.
    ///
    /// # Errors
    ///
    /// - [`AuthError::InvalidConfig`] when the platform has no usable config
    /// - [`AuthError::LaunchFailed`] when the user agent cannot open the URL
    /// - [`AuthError::StateMismatch`] when the echoed CSRF state differs
    /// - [`AuthError::MissingCode`] when the callback carried no code
    /// - [`AuthError::Cancelled`] on cancellation or a superseded listener
    /// - [`AuthError::TimedOut`] when the callback never arrives
    #[instrument(skip(self, cancel), fields(platform = %platform))]
    pub async fn begin_authorization(
        &self,
        platform: Platform,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<AuthorizationCode> {
        let config = self.registry.get(platform)?;
        config.validate()?;

        let state = generate_state();
        let url = config.authorization_url(&state)?;

        // Listener goes in before the launch; the guard deregisters it on
        // every exit path.
        let (mut rx, _guard) = self.gateway.register(platform)?;

        debug!("launching external user agent for authorization");
        self.user_agent
            .launch(&url)
            .await
            .map_err(|e| AuthError::LaunchFailed(e.to_string()))?;

        tokio::select! {
            biased;

            result = &mut rx => {
                let callback = result.map_err(|_| AuthError::Cancelled)?;
                if callback.state.as_deref() != Some(state.as_str()) {
                    warn!("authorization callback carried a mismatched state value");
                    return Err(AuthError::StateMismatch);
                }
                let code = callback.code.ok_or(AuthError::MissingCode)?;
                debug!("authorization callback accepted");
                Ok(AuthorizationCode::new(code))
            }
            _ = cancel.cancelled() => {
                debug!("authorization attempt cancelled");
                Err(AuthError::Cancelled)
            }
            _ = tokio::time::sleep(timeout) => {
                warn!(timeout_secs = timeout.as_secs(), "authorization attempt timed out");
                Err(AuthError::TimedOut { secs: timeout.as_secs() })
            }
        }
    }
}

impl std::fmt::Debug for AuthorizationFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationFlow")
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Generate a random URL-safe CSRF state value.
fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
