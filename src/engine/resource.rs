//! File-backed engine
//!
//! Serves the files stored next to a dictionary (stylesheets, scripts, images)
//! and describes the dictionary from its MDX header. Entry decoding is not done
//! here; entry lookups answer `501`. The dictionary archives themselves and any
//! hidden path (the autocomplete index) are never served.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::{DictHeader, LookupEngine, LookupRequest};
use crate::discovery::{Bundle, AUX_EXTENSION, MAIN_EXTENSION};
use crate::http::files;

/// Query parameter naming an entry lookup
pub const WORD_PARAM: &str = "word";

/// Engine serving a bundle's directory
pub struct ResourceEngine {
    bundle: Arc<Bundle>,
    port: u16,
    header: Option<DictHeader>,
    hidden: Vec<PathBuf>,
}

impl ResourceEngine {
    /// Build the engine, reading the MDX header if it is readable
    pub fn open(bundle: Arc<Bundle>, port: u16) -> Self {
        let header = match DictHeader::read(&bundle.main_path()) {
            Ok(header) => Some(header),
            Err(e) => {
                tracing::warn!(
                    mdx = %bundle.main_path().display(),
                    error = %e,
                    "Unreadable MDX header, serving without metadata"
                );
                None
            }
        };

        Self {
            bundle,
            port,
            header,
            hidden: Vec::new(),
        }
    }

    /// Never serve `path`, even when it sits inside the bundle directory
    pub fn hiding(mut self, path: impl Into<PathBuf>) -> Self {
        self.hidden.push(path.into());
        self
    }

    /// Archives and hidden paths are answered as missing
    fn is_private(&self, request_path: &str) -> bool {
        let Some(path) = files::resolve(&self.bundle.root, request_path) else {
            return false;
        };

        let archive = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                e.eq_ignore_ascii_case(MAIN_EXTENSION) || e.eq_ignore_ascii_case(AUX_EXTENSION)
            });

        archive || self.hidden.iter().any(|h| same_file(h, &path))
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn header(&self) -> Option<&DictHeader> {
        self.header.as_ref()
    }
}

#[async_trait]
impl LookupEngine for ResourceEngine {
    async fn lookup(&self, request: LookupRequest) -> Response {
        if let Some(word) = request.query.get(WORD_PARAM) {
            tracing::debug!(port = self.port, word = %word, "Entry lookup not supported");
            return (
                StatusCode::NOT_IMPLEMENTED,
                Json(json!({ "error": "Entry lookup is not available for this dictionary" })),
            )
                .into_response();
        }

        if request.path.is_empty() {
            return Json(self.describe()).into_response();
        }

        if self.is_private(&request.path) {
            tracing::debug!(port = self.port, path = %request.path, "Refused private file");
            return files::not_found();
        }

        files::serve_file(&self.bundle.root, &request.path).await
    }

    fn describe(&self) -> serde_json::Value {
        let header = self.header.clone().unwrap_or_default();
        json!({
            "name": self.bundle.name(),
            "port": self.port,
            "dir": self.bundle.root.display().to_string(),
            "mdx": self.bundle.main_file,
            "mdd": self.bundle.aux_files,
            "title": header.title.unwrap_or_else(|| self.bundle.name()),
            "description": header.description,
            "engineVersion": header.engine_version,
            "encoding": header.encoding,
        })
    }
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
