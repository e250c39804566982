//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-playback`, `provider-offline`).
//! Host applications can depend on `echo-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(any(feature = "desktop-shims", feature = "offline"))]
pub use core_service;

#[cfg(feature = "playback-only")]
pub use core_playback;

#[cfg(feature = "offline")]
pub use provider_offline;
