//! Front door: the single aggregating entry point
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Front door                 │
//! │  POST /api/info   fleet descriptors      │
//! │  GET  /api/wq     autocomplete index     │
//! │  GET  /*          static UI content      │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Every response carries permissive CORS headers and a weak ETag.

pub mod api;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::middleware::from_fn;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::autocomplete::AutocompleteIndex;
use crate::config::Config;
use crate::error::Result;
use crate::http::{weak_etag, RunningServer};

pub use api::create_router;

/// Shared front door state; read-only apart from the index's lazy connection
#[derive(Clone)]
pub struct FrontDoorState {
    /// Fleet descriptors, collected once after launch
    pub descriptors: Arc<Vec<serde_json::Value>>,

    /// Autocomplete index
    pub autocomplete: Arc<AutocompleteIndex>,

    /// Static UI directory
    pub static_dir: Option<Arc<PathBuf>>,

    /// Server start time
    pub start_time: Instant,
}

/// Front door server
pub struct FrontDoor {
    enable_request_logging: bool,
    state: FrontDoorState,
}

impl FrontDoor {
    pub fn new(
        config: &Config,
        descriptors: Vec<serde_json::Value>,
        autocomplete: Arc<AutocompleteIndex>,
    ) -> Self {
        Self {
            enable_request_logging: config.server.enable_request_logging,
            state: FrontDoorState {
                descriptors: Arc::new(descriptors),
                autocomplete,
                static_dir: config.server.static_dir.clone().map(Arc::new),
                start_time: Instant::now(),
            },
        }
    }

    pub fn state(&self) -> FrontDoorState {
        self.state.clone()
    }

    /// Build the router with all routes and layers
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone())
            .layer(from_fn(weak_etag))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );

        if self.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Serve on an already bound listener
    pub fn start(&self, listener: TcpListener) -> Result<RunningServer> {
        let server = RunningServer::spawn(listener, self.build_router())?;
        tracing::info!(addr = %server.local_addr(), "Front door started");
        Ok(server)
    }
}
