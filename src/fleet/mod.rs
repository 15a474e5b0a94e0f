//! One HTTP listener per dictionary
//!
//! Member `i` of the registry listens on `base_port + i`. Ports are never
//! negotiated with the operating system: if any of them is taken the whole
//! launch fails and nothing is served.
//!
//! ```text
//! registry[0] ──► 127.0.0.1:44000  GET /*  ──► engine[0].lookup
//! registry[1] ──► 127.0.0.1:44001  GET /*  ──► engine[1].lookup
//! ...
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::middleware::from_fn;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use futures::future::join_all;
use tower_http::trace::TraceLayer;

use crate::config::{Config, ConfigError};
use crate::discovery::Bundle;
use crate::engine::{EngineFactory, LookupEngine, LookupRequest};
use crate::error::Result;
use crate::http::{self, weak_etag, CloseOutcome, RunningServer};

/// Ports for `count` members starting at `base`, in order
pub fn allocate_ports(base: u16, count: usize) -> std::result::Result<Vec<u16>, ConfigError> {
    (0..count)
        .map(|i| {
            u16::try_from(i)
                .ok()
                .and_then(|offset| base.checked_add(offset))
                .ok_or_else(|| ConfigError::InvalidValue {
                    field: "base_port".to_string(),
                    reason: format!("{count} dictionaries do not fit above port {base}"),
                })
        })
        .collect()
}

/// Router for one member: every GET path goes to the engine
pub fn member_router(engine: Arc<dyn LookupEngine>, request_logging: bool) -> Router {
    let mut router = Router::new()
        .route("/", get(lookup_root))
        .route("/{*path}", get(lookup_path))
        .layer(from_fn(weak_etag))
        .with_state(engine);

    if request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router
}

async fn lookup_root(
    State(engine): State<Arc<dyn LookupEngine>>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    engine
        .lookup(LookupRequest {
            path: String::new(),
            query,
        })
        .await
}

async fn lookup_path(
    State(engine): State<Arc<dyn LookupEngine>>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    engine.lookup(LookupRequest { path, query }).await
}

/// One running fleet member
pub struct ServerHandle {
    pub port: u16,
    pub bundle: Arc<Bundle>,
    pub engine: Arc<dyn LookupEngine>,
    pub server: RunningServer,
}

impl ServerHandle {
    /// Label used in logs and shutdown reports
    pub fn label(&self) -> String {
        format!("{} ({})", self.bundle.name(), self.port)
    }
}

/// All running members in registry order
pub struct Fleet {
    members: Vec<ServerHandle>,
}

impl Fleet {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[ServerHandle] {
        &self.members
    }

    pub fn ports(&self) -> Vec<u16> {
        self.members.iter().map(|m| m.port).collect()
    }

    /// Each member's `describe()`, in registry order
    pub fn descriptors(&self) -> Vec<serde_json::Value> {
        self.members.iter().map(|m| m.engine.describe()).collect()
    }

    /// Close every member concurrently, each bounded by `timeout`.
    ///
    /// Outcomes are labelled and returned in registry order.
    pub async fn close(self, timeout: Duration) -> Vec<(String, CloseOutcome)> {
        join_all(self.members.into_iter().map(|member| async move {
            let name = member.label();
            (name, member.server.close(timeout).await)
        }))
        .await
    }
}

/// Start one listener per bundle.
///
/// Every listener is bound before any of them is served, so a bind failure
/// leaves nothing running.
pub async fn launch<F>(bundles: &[Bundle], config: &Config, factory: &F) -> Result<Fleet>
where
    F: EngineFactory + ?Sized,
{
    let ports = allocate_ports(config.server.base_port, bundles.len())?;

    let mut bound = Vec::with_capacity(bundles.len());
    for (bundle, port) in bundles.iter().zip(ports) {
        let bundle = Arc::new(bundle.clone());
        let engine = factory.create(bundle.clone(), port)?;
        let listener = http::bind(SocketAddr::new(config.server.host, port)).await?;
        bound.push((port, bundle, engine, listener));
    }

    let mut members = Vec::with_capacity(bound.len());
    for (port, bundle, engine, listener) in bound {
        let router = member_router(engine.clone(), config.server.enable_request_logging);
        let server = RunningServer::spawn(listener, router)?;
        tracing::info!(
            dictionary = %bundle.name(),
            mdx = %bundle.main_file,
            addr = %server.local_addr(),
            "Dictionary listener started"
        );
        members.push(ServerHandle {
            port,
            bundle,
            engine,
            server,
        });
    }

    Ok(Fleet { members })
}
