//! Workspace facade crate.
//!
//! This crate exists so host applications can depend on `tunelink-workspace`
//! and reach every member crate through a single dependency instead of wiring
//! each one individually. All functionality lives in the member crates.

pub use bridge_traits;
pub use core_auth;
pub use core_runtime;
pub use core_sync;
