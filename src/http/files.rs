//! Raw file reads confined to a base directory
//!
//! Small files are read into memory. Anything larger than
//! [`STREAM_THRESHOLD`] is streamed from disk and tagged from its metadata, so
//! the ETag layer never buffers it.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tokio_util::io::ReaderStream;

/// Content type used when the extension is unknown
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Files larger than this are streamed
pub const STREAM_THRESHOLD: u64 = 1024 * 1024;

/// Guess a content type from the file extension
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("webp") => "image/webp",
        Some("ico") => "image/x-icon",
        Some("mp3") => "audio/mpeg",
        Some("wav") => "audio/wav",
        Some("ogg" | "spx") => "audio/ogg",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("otf") => "font/otf",
        _ => FALLBACK_MIME_TYPE,
    }
}

/// Join a decoded request path onto `base`.
///
/// Returns `None` for anything that could leave `base`: parent components,
/// absolute paths, drive prefixes.
pub fn resolve(base: &Path, request_path: &str) -> Option<PathBuf> {
    let relative = request_path.trim_start_matches('/');
    if relative.contains('\\') {
        return None;
    }

    let mut resolved = base.to_path_buf();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    Some(resolved)
}

/// Contents of a file opened for serving
#[derive(Debug)]
pub enum FileContent {
    /// Read fully into memory
    Bytes(Vec<u8>),

    /// Open handle streamed on demand, with a validator built from metadata
    Stream {
        file: tokio::fs::File,
        len: u64,
        tag: String,
    },
}

/// A file opened from disk
#[derive(Debug)]
pub struct FileBody {
    pub content: FileContent,
    pub content_type: &'static str,
}

/// Open `request_path` under `base`; `Ok(None)` when there is no such file.
pub async fn read_file(base: &Path, request_path: &str) -> io::Result<Option<FileBody>> {
    let Some(path) = resolve(base, request_path) else {
        return Ok(None);
    };

    let meta = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta,
        Ok(_) => return Ok(None),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e),
    };

    let content = if meta.len() > STREAM_THRESHOLD {
        FileContent::Stream {
            file: tokio::fs::File::open(&path).await?,
            len: meta.len(),
            tag: metadata_tag(&meta),
        }
    } else {
        FileContent::Bytes(tokio::fs::read(&path).await?)
    };

    Ok(Some(FileBody {
        content,
        content_type: content_type_for(&path),
    }))
}

/// Weak validator from size and modification time
pub fn metadata_tag(meta: &Metadata) -> String {
    let modified = meta
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("W/\"{:x}-{:x}\"", meta.len(), modified)
}

/// Serve `request_path` under `base` as an HTTP response
pub async fn serve_file(base: &Path, request_path: &str) -> Response {
    match read_file(base, request_path).await {
        Ok(Some(FileBody {
            content: FileContent::Bytes(bytes),
            content_type,
        })) => ([(CONTENT_TYPE, content_type)], bytes).into_response(),
        Ok(Some(FileBody {
            content: FileContent::Stream { file, len, tag },
            content_type,
        })) => {
            let mut response = Body::from_stream(ReaderStream::new(file)).into_response();
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
            headers.insert(CONTENT_LENGTH, HeaderValue::from(len));
            if let Ok(value) = HeaderValue::from_str(&tag) {
                headers.insert(ETAG, value);
            }
            response
        }
        Ok(None) => not_found(),
        Err(e) => {
            tracing::error!(error = %e, path = %request_path, "File read failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "File read failed" })),
            )
                .into_response()
        }
    }
}

/// JSON 404 response
pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
