//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the TuneLink core:
//! - Event bus system for state-change notifications
//! - Logging and tracing bootstrap
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the other core crates depend
//! on. It establishes the event broadcasting mechanism and the logging
//! conventions used throughout the system.

pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
pub use events::{ConnectionEvent, CoreEvent, EventBus, EventStream, SyncEvent};
