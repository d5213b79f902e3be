//! External User-Agent Abstraction
//!
//! Launches an authorization URL in a user-visible browser context.
//!
//! The OAuth authorization-code handshake requires handing control to an
//! external user agent (system browser on desktop, a browser tab on mobile)
//! and waiting for the platform to call back on the registered redirect URI.
//! This trait covers only the launch; the callback is delivered back to the
//! core by the host through the redirect gateway.

use async_trait::async_trait;

use crate::error::Result;

/// Opens URLs in an external, user-visible browser context.
///
/// Implementations must not block on the user completing (or abandoning)
/// the authorization page; `launch` returns as soon as the user agent has
/// been handed the URL.
#[async_trait]
pub trait ExternalUserAgent: Send + Sync {
    /// Open `url` in the host's browser or in-app browser tab.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot present a browser (headless
    /// environment, missing handler for the URL scheme, etc.). Failure to
    /// launch never implies anything about the later redirect callback.
    async fn launch(&self, url: &str) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    struct HeadlessAgent;

    #[async_trait]
    impl ExternalUserAgent for HeadlessAgent {
        async fn launch(&self, _url: &str) -> Result<()> {
            Err(BridgeError::NotAvailable("no display".to_string()))
        }
    }

    #[tokio::test]
    async fn headless_agent_reports_unavailable() {
        let agent = HeadlessAgent;
        let err = agent.launch("https://example.com/auth").await.unwrap_err();
        assert!(matches!(err, BridgeError::NotAvailable(_)));
    }
}
