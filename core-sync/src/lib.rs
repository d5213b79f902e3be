//! # Connection & Synchronization Module
//!
//! Tracks per-platform connection and sync state, and coordinates the two
//! long-running workflows built on top of it:
//!
//! - [`ConnectionManager`] links and unlinks platform accounts, driving the
//!   authorization handshake from `core-auth` and the credential RPCs on
//!   the [`MusicRemote`] backend.
//! - [`SyncOrchestrator`] runs content synchronization, one platform at a
//!   time or fanned out across every connected platform, with per-platform
//!   fault isolation, timeouts, and cooperative cancellation.
//!
//! All observable state lives in the [`StateStore`], which publishes a
//! fresh snapshot to `watch` subscribers after every transition.

pub mod connection;
pub mod error;
pub mod orchestrator;
pub mod remote;
pub mod state;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionManager};
pub use error::{Result, SyncError};
pub use orchestrator::{SyncConfig, SyncOrchestrator, SyncReport};
pub use remote::MusicRemote;
pub use state::{PlatformSyncState, SyncStatus};
pub use store::{PlatformStates, StateStore};
