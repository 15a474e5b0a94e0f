//! Per-dictionary lookup engines
//!
//! Each fleet member owns one engine bound to one bundle. The fleet only needs
//! two things from it: answer a request, and describe the dictionary for the
//! front door's aggregated info.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;

use crate::discovery::Bundle;
use crate::error::Result;

pub mod header;
pub mod resource;

pub use header::{DictHeader, HeaderError};
pub use resource::ResourceEngine;

/// A request routed to an engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupRequest {
    /// Percent-decoded path without the leading slash
    pub path: String,

    /// Decoded query parameters
    pub query: HashMap<String, String>,
}

impl LookupRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: HashMap::new(),
        }
    }
}

/// Resolves requests against one dictionary
#[async_trait]
pub trait LookupEngine: Send + Sync {
    /// Answer a request for this dictionary
    async fn lookup(&self, request: LookupRequest) -> Response;

    /// Descriptor aggregated by the front door's `/api/info`
    fn describe(&self) -> serde_json::Value;
}

/// Builds the engine for a bundle served on a given port
pub trait EngineFactory: Send + Sync {
    fn create(&self, bundle: Arc<Bundle>, port: u16) -> Result<Arc<dyn LookupEngine>>;
}

impl<F> EngineFactory for F
where
    F: Fn(Arc<Bundle>, u16) -> Result<Arc<dyn LookupEngine>> + Send + Sync,
{
    fn create(&self, bundle: Arc<Bundle>, port: u16) -> Result<Arc<dyn LookupEngine>> {
        self(bundle, port)
    }
}
