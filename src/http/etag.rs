//! Weak ETag validators
//!
//! Buffered responses are hashed and tagged with `W/"<sha256 prefix>"`.
//! Responses that already carry a validator (streamed files) pass through
//! untouched. A successful `GET`/`HEAD` whose `If-None-Match` matches gets an
//! empty `304 Not Modified` instead of the body.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header::{CONTENT_LENGTH, ETAG, IF_NONE_MATCH};
use axum::http::response::Parts;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};

/// Compute the weak validator for a response body
pub fn weak_tag(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let hex: String = digest.iter().take(16).map(|b| format!("{b:02x}")).collect();
    format!("W/\"{hex}\"")
}

/// Weak comparison of an `If-None-Match` header value against `tag`
pub fn matches(if_none_match: &str, tag: &str) -> bool {
    let opaque = strip_weak(tag);
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || strip_weak(candidate) == opaque)
}

fn strip_weak(tag: &str) -> &str {
    tag.strip_prefix("W/").unwrap_or(tag)
}

/// Middleware attaching weak ETags and answering conditional requests
pub async fn weak_etag(request: Request, next: Next) -> Response {
    let conditional = matches!(*request.method(), Method::GET | Method::HEAD);
    let if_none_match = request
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let response = next.run(request).await;
    let fresh = |status: StatusCode, tag: &str| {
        conditional
            && status.is_success()
            && if_none_match.as_deref().is_some_and(|v| matches(v, tag))
    };

    if let Some(existing) = response.headers().get(ETAG) {
        let is_fresh = existing
            .to_str()
            .is_ok_and(|tag| fresh(response.status(), tag));
        if is_fresh {
            let (parts, _body) = response.into_parts();
            return not_modified(parts);
        }
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let tag = weak_tag(&bytes);
    if let Ok(value) = HeaderValue::from_str(&tag) {
        parts.headers.insert(ETAG, value);
    }

    if fresh(parts.status, &tag) {
        return not_modified(parts);
    }

    Response::from_parts(parts, Body::from(bytes))
}

fn not_modified(mut parts: Parts) -> Response {
    parts.status = StatusCode::NOT_MODIFIED;
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::empty())
}
