//! # Veritas Common Library
//!
//! Shared code for the Veritas fact-checking service:
//! - Error type and result alias
//! - TOML configuration loading
//! - Pipeline event types and EventBus
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;

pub use error::{Error, Result};
