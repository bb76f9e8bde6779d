//! Request routing dispatch module
//!
//! Entry point for HTTP request processing. Every path goes through one
//! handler which branches on method first and query parameters second.

use crate::config::AppState;
use crate::handler::static_files;
use crate::http::{self, query, QueryParams};
use crate::logger::{self, AccessLogEntry};
use crate::storage::{self, listing};
use http_body_util::Full;
use hyper::body::{Body as _, Bytes};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Query flag selecting the JSON listing
const JSON_PARAM: &str = "json";
/// Query parameter naming the digest algorithm for the listing
const HASH_PARAM: &str = "hash";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    /// Percent-decoded request path
    pub path: &'a str,
    /// Request path as received, used when building redirects
    pub raw_path: &'a str,
    pub query: Option<&'a str>,
    pub is_head: bool,
    pub if_none_match: Option<String>,
    pub if_modified_since: Option<String>,
    pub range_header: Option<String>,
}

/// Main entry point for HTTP request handling
///
/// The request body is never read, so any body type is accepted.
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: Option<SocketAddr>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let (parts, _) = req.into_parts();
    let raw_path = parts.uri.path();
    let decoded_path = query::decode_path(raw_path).unwrap_or_else(|| raw_path.to_string());
    let params = QueryParams::parse(parts.uri.query());

    let header = |name: &str| {
        parts
            .headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let ctx = RequestContext {
        path: &decoded_path,
        raw_path,
        query: parts.uri.query(),
        is_head: parts.method == Method::HEAD,
        if_none_match: header("if-none-match"),
        if_modified_since: header("if-modified-since"),
        range_header: header("range"),
    };

    let response = route_request(&parts.method, &ctx, &params, state.root()).await;

    if state.access_log() {
        let mut entry = AccessLogEntry::new(
            remote_addr.map_or_else(|| "-".to_string(), |a| a.ip().to_string()),
            parts.method.to_string(),
            raw_path.to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = format_version(parts.version);
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.referer = header("referer");
        entry.user_agent = header("user-agent");
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, state.access_log_format());
    }

    Ok(response)
}

/// Dispatch on method, then on the `json`/`hash` query parameters
async fn route_request(
    method: &Method,
    ctx: &RequestContext<'_>,
    params: &QueryParams,
    root: &Path,
) -> Response<Full<Bytes>> {
    // 1. DELETE removes the named file whatever the query says
    if *method == Method::DELETE {
        return delete_response(root, ctx.path).await;
    }

    // 2. JSON listing, hashed when an algorithm is given
    if params.contains(JSON_PARAM) {
        let algorithm = params.first(HASH_PARAM).unwrap_or_default();
        return listing_response(root, algorithm, ctx.is_head).await;
    }

    // 3. Everything else is plain static serving
    static_files::serve(ctx, root).await
}

async fn listing_response(root: &Path, algorithm: &str, is_head: bool) -> Response<Full<Bytes>> {
    let records = match storage::list_files(root, algorithm).await {
        Ok(records) => records,
        Err(e) => {
            logger::log_error(&format!("Listing failed: {e}"));
            return http::build_text_response(e.status(), &e.to_string());
        }
    };

    logger::log_debug(&format!(
        "Listed {} entries (hash: {})",
        records.len(),
        if algorithm.is_empty() { "none" } else { algorithm }
    ));

    match listing::to_json(&records) {
        Ok(body) => http::build_json_response(body, is_head),
        Err(e) => {
            logger::log_error(&format!("Failed to encode listing: {e}"));
            http::build_text_response(StatusCode::INTERNAL_SERVER_ERROR, &e.to_string())
        }
    }
}

async fn delete_response(root: &Path, path: &str) -> Response<Full<Bytes>> {
    match storage::delete_file(root, path).await {
        Ok(()) => {
            logger::log_info(&format!("Deleted {}", path.trim_start_matches('/')));
            http::build_empty_response()
        }
        Err(e) => {
            if e.status().is_server_error() {
                logger::log_error(&e.to_string());
            } else {
                logger::log_debug(&e.to_string());
            }
            http::build_text_response(e.status(), &e.to_string())
        }
    }
}

fn format_version(version: hyper::Version) -> String {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
    .to_string()
}
