//! Shared utilities for lodestar crates
//!
//! - [`listeners`]: publish/subscribe listener sets with explicit subscription tokens
//! - [`logging`]: `tracing` subscriber bootstrap and error cause-chain formatting

pub mod listeners;
pub mod logging;

pub use listeners::{ListenerSet, SubscriptionId};
pub use logging::{format_error, LogLevel, LogOptions, LoggingError};
