//! Redirect callback routing.
//!
//! The host application receives the OAuth redirect (deep link or loopback
//! request) and hands the parsed parameters to [`RedirectGateway::deliver`].
//! An in-flight authorization registers a one-shot listener keyed by
//! platform; delivery wakes exactly one waiter and later deliveries for the
//! same platform are dropped.
//!
//! Registering again for a platform that already has a pending listener
//! replaces it: the superseded waiter's channel closes and its attempt
//! resolves as cancelled. This keeps "user clicked Connect twice" from
//! leaving two listeners racing for one callback.

use crate::error::{AuthError, Result};
use crate::types::Platform;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use url::Url;

/// Parameters carried by an OAuth redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectCallback {
    /// The authorization code, when the platform granted one.
    pub code: Option<String>,
    /// The CSRF state value echoed back by the platform.
    pub state: Option<String>,
}

impl RedirectCallback {
    pub fn new(code: Option<String>, state: Option<String>) -> Self {
        Self { code, state }
    }

    /// Parse a redirect URL into its callback parameters.
    ///
    /// Unknown query parameters are ignored. A URL with no `code` parameter
    /// still parses; the missing code is reported when the flow inspects the
    /// callback.
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| AuthError::ListenerRegistration(format!("invalid redirect URL: {}", e)))?;

        let mut code = None;
        let mut state = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "code" => code = Some(value.into_owned()),
                "state" => state = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(Self { code, state })
    }
}

struct PendingListener {
    id: u64,
    sender: oneshot::Sender<RedirectCallback>,
}

#[derive(Default)]
struct GatewayState {
    closed: bool,
    next_id: u64,
    pending: HashMap<Platform, PendingListener>,
}

/// Routes redirect callbacks to the authorization attempt waiting for them.
///
/// Methods are synchronous and hold the lock only briefly, so the host can
/// call [`deliver`](Self::deliver) from any thread that receives the
/// platform redirect.
#[derive(Default)]
pub struct RedirectGateway {
    state: Mutex<GatewayState>,
}

impl RedirectGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a one-shot listener for the next callback on `platform`.
    ///
    /// Returns the receiver the flow awaits plus a guard that deregisters
    /// the listener when dropped, so an abandoned attempt never leaves a
    /// stale entry behind.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::ListenerRegistration`] once the gateway has been
    /// closed for shutdown.
    pub fn register(
        self: &Arc<Self>,
        platform: Platform,
    ) -> Result<(oneshot::Receiver<RedirectCallback>, ListenerGuard)> {
        let (tx, rx) = oneshot::channel();
        let id = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| AuthError::ListenerRegistration("gateway lock poisoned".to_string()))?;
            if state.closed {
                return Err(AuthError::ListenerRegistration(
                    "gateway is closed".to_string(),
                ));
            }
            state.next_id += 1;
            let id = state.next_id;
            // Replacing drops any previous sender, which resolves the
            // superseded attempt's receiver as closed.
            state.pending.insert(platform, PendingListener { id, sender: tx });
            id
        };

        let guard = ListenerGuard {
            gateway: Arc::clone(self),
            platform,
            id,
        };
        Ok((rx, guard))
    }

    /// Deliver a callback to the listener pending on `platform`.
    ///
    /// Returns `true` when a waiter consumed the callback; `false` when no
    /// listener was pending (late or duplicate redirects are dropped here).
    pub fn deliver(&self, platform: Platform, callback: RedirectCallback) -> bool {
        let listener = match self.state.lock() {
            Ok(mut state) => state.pending.remove(&platform),
            Err(_) => None,
        };
        match listener {
            Some(listener) => listener.sender.send(callback).is_ok(),
            None => false,
        }
    }

    /// Close the gateway, rejecting future registrations and waking every
    /// pending attempt as cancelled.
    pub fn close(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.closed = true;
            state.pending.clear();
        }
    }

    /// Number of listeners currently pending.
    pub fn pending_count(&self) -> usize {
        self.state.lock().map(|s| s.pending.len()).unwrap_or(0)
    }

    fn deregister(&self, platform: Platform, id: u64) {
        if let Ok(mut state) = self.state.lock() {
            // Only remove the entry if it still belongs to this attempt;
            // a newer registration for the same platform stays.
            if state.pending.get(&platform).map(|l| l.id) == Some(id) {
                state.pending.remove(&platform);
            }
        }
    }
}

impl std::fmt::Debug for RedirectGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedirectGateway")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Deregisters its listener on drop, unless a newer registration for the
/// same platform has already replaced it.
pub struct ListenerGuard {
    gateway: Arc<RedirectGateway>,
    platform: Platform,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.gateway.deregister(self.platform, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_extracts_code_and_state() {
        let cb =
            RedirectCallback::from_url("tunelink://callback?code=abc&state=xyz&extra=1").unwrap();
        assert_eq!(cb.code.as_deref(), Some("abc"));
        assert_eq!(cb.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_from_url_missing_code_still_parses() {
        let cb = RedirectCallback::from_url("tunelink://callback?state=xyz").unwrap();
        assert!(cb.code.is_none());
        assert_eq!(cb.state.as_deref(), Some("xyz"));
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(RedirectCallback::from_url("not a url").is_err());
    }

    #[tokio::test]
    async fn test_deliver_wakes_registered_listener() {
        let gateway = Arc::new(RedirectGateway::new());
        let (rx, _guard) = gateway.register(Platform::Spotify).unwrap();

        let delivered = gateway.deliver(
            Platform::Spotify,
            RedirectCallback::new(Some("code".to_string()), Some("st".to_string())),
        );
        assert!(delivered);

        let cb = rx.await.unwrap();
        assert_eq!(cb.code.as_deref(), Some("code"));
        assert_eq!(gateway.pending_count(), 0);
    }

    #[test]
    fn test_deliver_without_listener_is_dropped() {
        let gateway = RedirectGateway::new();
        assert!(!gateway.deliver(Platform::Melon, RedirectCallback::new(None, None)));
    }

    #[tokio::test]
    async fn test_second_delivery_is_dropped() {
        let gateway = Arc::new(RedirectGateway::new());
        let (rx, _guard) = gateway.register(Platform::Spotify).unwrap();

        assert!(gateway.deliver(
            Platform::Spotify,
            RedirectCallback::new(Some("first".to_string()), None)
        ));
        assert!(!gateway.deliver(
            Platform::Spotify,
            RedirectCallback::new(Some("second".to_string()), None)
        ));

        assert_eq!(rx.await.unwrap().code.as_deref(), Some("first"));
    }

    #[tokio::test]
    async fn test_reregister_supersedes_previous_listener() {
        let gateway = Arc::new(RedirectGateway::new());
        let (old_rx, _old_guard) = gateway.register(Platform::Spotify).unwrap();
        let (new_rx, _new_guard) = gateway.register(Platform::Spotify).unwrap();

        // The superseded receiver resolves as closed.
        assert!(old_rx.await.is_err());
        assert_eq!(gateway.pending_count(), 1);

        assert!(gateway.deliver(
            Platform::Spotify,
            RedirectCallback::new(Some("code".to_string()), None)
        ));
        assert!(new_rx.await.is_ok());
    }

    #[test]
    fn test_guard_drop_deregisters_only_own_listener() {
        let gateway = Arc::new(RedirectGateway::new());
        let (_rx1, guard1) = gateway.register(Platform::Spotify).unwrap();
        let (_rx2, _guard2) = gateway.register(Platform::Spotify).unwrap();

        // Dropping the superseded guard must not evict the live listener.
        drop(guard1);
        assert_eq!(gateway.pending_count(), 1);
    }

    #[test]
    fn test_guard_drop_cleans_up() {
        let gateway = Arc::new(RedirectGateway::new());
        {
            let (_rx, _guard) = gateway.register(Platform::Melon).unwrap();
            assert_eq!(gateway.pending_count(), 1);
        }
        assert_eq!(gateway.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_close_rejects_registration_and_wakes_pending() {
        let gateway = Arc::new(RedirectGateway::new());
        let (rx, _guard) = gateway.register(Platform::Spotify).unwrap();

        gateway.close();
        assert!(rx.await.is_err());
        assert!(gateway.register(Platform::Melon).is_err());
    }
}
