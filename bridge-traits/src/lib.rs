//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host shell.
//!
//! ## Overview
//!
//! This crate defines the contract between the TuneLink core and the
//! host application embedding it. Each trait represents a capability the
//! core requires but that must be implemented differently per host
//! (desktop, mobile, test harness).
//!
//! ## Traits
//!
//! - [`ExternalUserAgent`](browser::ExternalUserAgent) - Hand an
//!   authorization URL to the system browser or an in-app browser tab.
//!
//! The OAuth redirect itself flows back into the core through
//! `core_auth::RedirectGateway::deliver`; this crate only covers the
//! outbound hop.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Host
//! implementations should convert platform-specific failures into
//! `BridgeError` with actionable messages.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! across async tasks behind an `Arc`.

pub mod browser;
pub mod error;

pub use browser::ExternalUserAgent;
pub use error::{BridgeError, Result};
