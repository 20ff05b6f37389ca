//! Abeca Common
//!
//! Common utilities for the abeca key stack.
//!
//! This crate provides:
//! - Component-based structured logging with CA instance context
//! - Level-checked logging macros that forward to [`Logger`]

pub mod logging;
pub mod macros;

pub use logging::{Component, LogLevel, Logger, LoggingConfig};
