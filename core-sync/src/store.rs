//! Shared, observable platform state.
//!
//! The store is the single writer-serialized home of every
//! [`PlatformSyncState`]. Mutations go through [`StateStore::update`], which
//! applies a transition closure under the lock and, on success, publishes a
//! fresh immutable snapshot to `watch` subscribers. Readers never see a
//! half-applied transition.

use crate::error::Result;
use crate::state::PlatformSyncState;
use core_auth::Platform;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Immutable snapshot of every tracked platform, as published to observers.
pub type PlatformStates = Arc<HashMap<Platform, PlatformSyncState>>;

/// Serialized owner of all per-platform state.
#[derive(Debug)]
pub struct StateStore {
    states: Mutex<HashMap<Platform, PlatformSyncState>>,
    publisher: watch::Sender<PlatformStates>,
}

impl StateStore {
    /// Create a store tracking every platform, enabling the given subset.
    pub fn new(enabled: &[Platform]) -> Self {
        let states: HashMap<Platform, PlatformSyncState> = Platform::all()
            .into_iter()
            .map(|p| (p, PlatformSyncState::new(p, enabled.contains(&p))))
            .collect();
        let (publisher, _) = watch::channel(Arc::new(states.clone()));
        Self {
            states: Mutex::new(states),
            publisher,
        }
    }

    /// Create a store with every platform enabled.
    pub fn with_all_enabled() -> Self {
        Self::new(&Platform::all())
    }

    /// Apply a transition to one platform's state.
    ///
    /// The closure runs under the lock; when it succeeds a new snapshot is
    /// published. When it fails the state is left exactly as the closure
    /// left it (transition methods only mutate on success) and nothing is
    /// published.
    pub async fn update<F>(&self, platform: Platform, f: F) -> Result<PlatformSyncState>
    where
        F: FnOnce(&mut PlatformSyncState) -> Result<()>,
    {
        let mut states = self.states.lock().await;
        let state = states
            .get_mut(&platform)
            .ok_or_else(|| crate::error::SyncError::NotConnected { platform })?;
        f(state)?;
        let updated = state.clone();
        self.publisher.send_replace(Arc::new(states.clone()));
        Ok(updated)
    }

    /// Current state of one platform.
    pub async fn get(&self, platform: Platform) -> Option<PlatformSyncState> {
        self.states.lock().await.get(&platform).cloned()
    }

    /// Snapshot of every platform's current state.
    pub async fn snapshot(&self) -> PlatformStates {
        Arc::new(self.states.lock().await.clone())
    }

    /// Platforms currently marked connected.
    pub async fn connected_platforms(&self) -> Vec<Platform> {
        self.states
            .lock()
            .await
            .values()
            .filter(|s| s.is_connected)
            .map(|s| s.platform)
            .collect()
    }

    /// Subscribe to state snapshots. The receiver immediately holds the
    /// current snapshot and is notified after every successful update.
    pub fn subscribe(&self) -> watch::Receiver<PlatformStates> {
        self.publisher.subscribe()
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::with_all_enabled()
    }
}
