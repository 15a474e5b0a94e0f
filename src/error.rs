//! Unified error handling for the dictfleet crate
//!
//! Each component keeps its own error enum; this module folds them into a single
//! [`Error`] so the startup path can report one tagged failure and pick a
//! termination status for it.
//!
//! # Architecture
//!
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping the domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use dictfleet::error::Error;
//!
//! fn report(err: &Error) -> ! {
//!     tracing::error!(category = ?err.category(), "{err}");
//!     std::process::exit(err.exit_code());
//! }
//! ```

use std::io;
use std::net::SocketAddr;
use thiserror::Error;

// Re-export domain-specific errors for convenience
pub use crate::autocomplete::AutocompleteError;
pub use crate::config::ConfigError;
pub use crate::discovery::DiscoveryError;
pub use crate::engine::HeaderError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Invalid flags or configuration file
    Config,
    /// Dictionary discovery failures
    Discovery,
    /// Listener bind failures
    Network,
    /// Other I/O failures
    Io,
}

impl ErrorCategory {
    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Config => "configuration error",
            Self::Discovery => "discovery error",
            Self::Network => "network error",
            Self::Io => "I/O error",
        }
    }
}

/// Unified error type for the dictfleet crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Dictionary discovery failed or found nothing
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// A listener could not bind its address
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Config(_) => ErrorCategory::Config,
            Self::Discovery(_) => ErrorCategory::Discovery,
            Self::Bind { .. } => ErrorCategory::Network,
            Self::Io(_) => ErrorCategory::Io,
        }
    }

    /// Process exit status used when this error aborts startup
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Config => 2,
            ErrorCategory::Discovery => 3,
            ErrorCategory::Network => 4,
            ErrorCategory::Io => 1,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
