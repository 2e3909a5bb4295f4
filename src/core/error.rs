//! Error handling for MCPM
//!
//! This module provides the typed error taxonomy and user-friendly error reporting for
//! MCPM. The error system follows two principles:
//! 1. **Strongly-typed errors** so callers can branch on the failure kind
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Error Categories
//!
//! - **Not found**: [`McpmError::ServerNotFound`] - a server is absent from the lockfile.
//!   Fatal to the operation that asked for it, never to the process.
//! - **Missing secret**: [`McpmError::SecretNotFound`] - no value stored for a server/key.
//! - **Decryption**: [`McpmError::DecryptionFailed`] - wrong master password or a corrupt
//!   vault entry. Hard failure in secret-management commands.
//! - **File system**: [`McpmError::FileSystemError`] and [`McpmError::PermissionDenied`] -
//!   an unrecoverable environment problem, always propagated.
//! - **Configuration**: [`McpmError::ConfigError`], [`McpmError::UnknownClient`]
//! - **Cancellation**: [`McpmError::Cancelled`] - the user aborted an interactive prompt.
//!   Distinguished from failure so the binary can exit with a different code.
//!
//! Partial sync failures are not an error variant. They are collected in a
//! [`crate::sync::executor::SyncReport`].
//!
//! # Examples
//!
//! ```rust,no_run
//! use mcpm_cli::core::{McpmError, user_friendly_error};
//!
//! let error = McpmError::ServerNotFound { name: "filesystem".to_string() };
//! let context = user_friendly_error(anyhow::Error::from(error));
//! context.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

use crate::vault::crypto::CryptoError;

/// Process exit code used when the user cancels an interactive prompt.
pub const EXIT_CANCELLED: i32 = 130;

/// Process exit code for every other failure.
pub const EXIT_FAILURE: i32 = 1;

/// The main error type for MCPM operations.
#[derive(Error, Debug, Clone)]
pub enum McpmError {
    /// Server is not recorded in the lockfile
    #[error("Server '{name}' not found in lockfile")]
    ServerNotFound {
        /// Name of the server that was looked up
        name: String,
    },

    /// No secret stored under this server and key
    #[error("Secret '{key}' not found for server '{server}'")]
    SecretNotFound {
        /// Server the secret was looked up for
        server: String,
        /// Secret key name
        key: String,
    },

    /// Secret could not be decrypted
    ///
    /// Produced for a wrong master password as well as for a damaged vault entry;
    /// `reason` tells the two apart for display.
    #[error("Failed to decrypt secret '{key}' for server '{server}'")]
    DecryptionFailed {
        /// Server the secret belongs to
        server: String,
        /// Secret key name
        key: String,
        /// Underlying crypto failure description
        reason: String,
    },

    /// Unknown client identifier
    #[error("Unknown client: {name}")]
    UnknownClient {
        /// The identifier that failed to parse
        name: String,
    },

    /// Client is known but was not detected on this machine
    #[error("Client '{name}' is not installed or its configuration could not be read")]
    ClientUnavailable {
        /// Client identifier
        name: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// File system error
    #[error("File system error during {operation}: {path}")]
    FileSystemError {
        /// The operation that failed
        operation: String,
        /// The path involved
        path: String,
    },

    /// Permission denied
    #[error("Permission denied: {operation} on {path}")]
    PermissionDenied {
        /// The operation that was attempted
        operation: String,
        /// The path that was inaccessible
        path: String,
    },

    /// Interactive prompt was aborted by the user
    #[error("Operation cancelled")]
    Cancelled,

    /// Other error with a free-form message
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

impl McpmError {
    /// Wrap a [`CryptoError`] raised while decrypting `server`/`key`.
    pub fn decryption(server: &str, key: &str, err: &CryptoError) -> Self {
        Self::DecryptionFailed {
            server: server.to_string(),
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    /// Exit code the binary should use for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Cancelled => EXIT_CANCELLED,
            _ => EXIT_FAILURE,
        }
    }
}

/// Error wrapper with user-facing suggestion and details.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying MCPM error
    pub error: McpmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: McpmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Exit code matching the wrapped error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }

    /// Print the error to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error to a user-friendly [`ErrorContext`].
///
/// Recognizes [`McpmError`], [`CryptoError`] and [`std::io::Error`] anywhere in the
/// error chain; everything else is shown with its full cause chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    for cause in error.chain() {
        if let Some(mcpm_error) = cause.downcast_ref::<McpmError>() {
            return create_error_context(mcpm_error.clone());
        }
    }

    if let Some(crypto_error) = error.downcast_ref::<CryptoError>() {
        return ErrorContext::new(McpmError::DecryptionFailed {
            server: "unknown".to_string(),
            key: "unknown".to_string(),
            reason: crypto_error.to_string(),
        })
        .with_suggestion("Check the master password and try again");
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(McpmError::PermissionDenied {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check file ownership and permissions")
                .with_details("MCPM needs read and write access to client configuration files");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(McpmError::FileSystemError {
                    operation: "file access".to_string(),
                    path: "unknown".to_string(),
                })
                .with_suggestion("Check that the file or directory exists and the path is correct");
            }
            _ => {}
        }
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(McpmError::Other {
        message,
    })
}

fn create_error_context(error: McpmError) -> ErrorContext {
    match &error {
        McpmError::ServerNotFound { name } => {
            let name = name.clone();
            ErrorContext::new(error)
                .with_suggestion(format!(
                    "Run 'mcpm list' to see installed servers, or install '{name}' first"
                ))
                .with_details("Only servers recorded in mcpm.lock can be synced")
        }
        McpmError::DecryptionFailed { reason, .. } => {
            let reason = reason.clone();
            ErrorContext::new(error)
                .with_suggestion("Check the master password. Secrets cannot be recovered without it")
                .with_details(reason)
        }
        McpmError::SecretNotFound { server, .. } => {
            let server = server.clone();
            ErrorContext::new(error)
                .with_suggestion(format!("Run 'mcpm secrets list {server}' to see stored keys"))
        }
        McpmError::UnknownClient { .. } => ErrorContext::new(error).with_suggestion(
            "Valid clients: claude-desktop, claude-code, cursor, vscode, windsurf, zed",
        ),
        McpmError::ClientUnavailable { .. } => ErrorContext::new(error)
            .with_suggestion("Install the client or set its config path in ~/.mcpm/config.toml"),
        McpmError::ConfigError { .. } => ErrorContext::new(error)
            .with_suggestion("Fix the TOML syntax in the config file, or delete it to use defaults"),
        McpmError::PermissionDenied { .. } => {
            ErrorContext::new(error).with_suggestion("Check file ownership and permissions")
        }
        _ => ErrorContext::new(error),
    }
}
