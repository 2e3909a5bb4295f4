//! Core types shared across MCPM
//!
//! Currently this is the error taxonomy: [`McpmError`] for typed failures,
//! [`ErrorContext`] for user-facing presentation and [`user_friendly_error`] to turn any
//! `anyhow::Error` into something printable with a suggestion.

pub mod error;

pub use error::{EXIT_CANCELLED, EXIT_FAILURE, ErrorContext, McpmError, user_friendly_error};
