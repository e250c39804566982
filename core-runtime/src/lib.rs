//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the Echo playback core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//!
//! ## Overview
//!
//! Every other core crate depends on this one. It establishes the logging
//! conventions, the configuration builder hosts use to inject their bridges,
//! and the broadcast event bus that carries host-facing summaries.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
