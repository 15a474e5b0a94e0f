pub mod serve;

// Re-export command functions for convenience
pub use serve::{serve, serve_until, start};
