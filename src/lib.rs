//! dictfleet - serve a directory of MDict dictionaries over HTTP
//!
//! Every dictionary bundle found under the configured root gets its own
//! listener; a single front door aggregates their metadata and offers word
//! autocomplete from a side SQLite index.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`discovery`] - Locating dictionary bundles on disk
//! - [`engine`] - Per-dictionary lookup engines
//! - [`fleet`] - One listener per dictionary on sequential ports
//! - [`autocomplete`] - Lazily opened read-only word index
//! - [`frontdoor`] - Aggregating entry point
//! - [`lifecycle`] - Signal handling and coordinated shutdown
//! - [`http`] - Listener handles, ETag validators, file reads
//!
//! # Example
//!
//! ```no_run
//! use dictfleet::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut config = Config::default();
//!     config.server.dir = Some("/srv/mdict".into());
//!     let report = dictfleet::commands::serve(config).await?;
//!     assert!(report.is_clean());
//!     Ok(())
//! }
//! ```

pub mod autocomplete;
pub mod commands;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod fleet;
pub mod frontdoor;
pub mod http;
pub mod lifecycle;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::autocomplete::AutocompleteIndex;
    pub use crate::config::Config;
    pub use crate::discovery::{Bundle, BundleRegistry};
    pub use crate::engine::{LookupEngine, LookupRequest, ResourceEngine};
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::fleet::{Fleet, ServerHandle};
    pub use crate::frontdoor::FrontDoor;
    pub use crate::lifecycle::{LifecycleCoordinator, ShutdownReport};
}

// Direct re-exports for convenience
pub use discovery::{scan, Bundle};
