// API module entry
// Master code management API for the keypad lock

mod handlers;
mod response;
mod types;

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use crate::config::AppState;
use crate::logger;
use crate::logger::AccessLogEntry;

/// API route handler
///
/// Dispatches to handler functions based on request path and method,
/// and writes one access-log line per request when enabled.
pub async fn handle_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );

    let response = dispatch(req, &state).await?;

    if state.cached_access_log.load(Ordering::Relaxed) {
        entry.status = response.status().as_u16();
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry);
    }

    Ok(response)
}

/// Dispatch a request to its handler
async fn dispatch(
    req: Request<hyper::body::Incoming>,
    state: &Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        (Method::GET, "/api/code") => handlers::code_status(state).await,
        (Method::POST, "/api/code") => {
            if let Some(rejected) = check_body_size(&req, state.config.http.max_body_size) {
                return Ok(rejected);
            }
            handlers::change_code(req, Arc::clone(state)).await
        }
        (Method::OPTIONS, "/api/code") => Ok(response::preflight()),
        // Probes for the device supervisor
        (Method::GET, "/healthz" | "/readyz") => Ok(response::health()),
        (method, "/api/code") => {
            logger::log_warning(&format!("Method not allowed: {method}"));
            Ok(response::method_not_allowed())
        }
        _ => Ok(response::not_found()),
    }
}

/// Validate Content-Length and return 413 when the body is too large
fn check_body_size(
    req: &Request<hyper::body::Incoming>,
    max_body_size: u64,
) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get("content-length")?;
    let size_str = content_length.to_str().ok()?;

    match size_str.parse::<u64>() {
        Ok(size) if size > max_body_size => {
            logger::log_warning(&format!(
                "Request body too large: {size} bytes (max: {max_body_size})"
            ));
            Some(response::payload_too_large())
        }
        Ok(_) => None,
        Err(_) => {
            logger::log_warning(&format!(
                "Invalid Content-Length value: '{size_str}', skipping size check"
            ));
            None
        }
    }
}
