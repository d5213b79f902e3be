//! # Authorization Module
//!
//! Drives the redirect-based OAuth authorization-code handshake for the
//! supported music-streaming platforms.
//!
//! ## Overview
//!
//! This crate owns the platform identity enumeration, the per-platform
//! authorization configuration, and the [`AuthorizationFlow`] that launches
//! the external user agent and suspends until the platform calls back with
//! an authorization code (or the attempt is cancelled or times out).
//!
//! The actual code-for-credentials exchange happens on the remote backend;
//! this crate never stores or transmits raw tokens.
//!
//! ## Features
//!
//! - Fixed platform enumeration with strict identifier validation
//! - Authorization URL construction with a random CSRF `state` parameter
//! - One-shot redirect callback listeners with guaranteed deregistration
//! - Timeout and cooperative cancellation on the callback wait

pub mod callback;
pub mod config;
pub mod error;
pub mod flow;
pub mod types;

pub use callback::{RedirectCallback, RedirectGateway};
pub use config::{AuthConfigRegistry, PlatformAuthConfig};
pub use error::{AuthError, Result};
pub use flow::AuthorizationFlow;
pub use types::{AuthorizationCode, Platform, PlatformAuth};
