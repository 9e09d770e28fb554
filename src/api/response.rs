// API response utility functions module

use crate::logger;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;

/// Attach the fixed CORS header set
///
/// The keypad UI is served from a different origin than the device, so
/// every response answers cross-origin requests.
fn with_cors(builder: Builder) -> Builder {
    builder
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET,POST,OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
}

/// Build JSON response
#[allow(clippy::unnecessary_wraps)]
pub fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let json = match serde_json::to_string(body) {
        Ok(json) => json,
        Err(e) => {
            logger::log_error(&format!("Failed to serialize response: {e}"));
            return Ok(fallback_error());
        }
    };

    Ok(with_cors(Response::builder().status(status))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            logger::log_error(&format!("Failed to build response: {e}"));
            fallback_error()
        }))
}

/// 200 acknowledgement for a successful code change
pub fn success() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::OK))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"ok":true}"#)))
        .unwrap_or_else(|_| fallback_error())
}

/// Build an error response carrying an `err` tag and optional hint
pub fn error_response(status: StatusCode, err: &str, hint: Option<&str>) -> Response<Full<Bytes>> {
    let body = match hint {
        Some(hint) => serde_json::json!({ "ok": false, "err": err, "hint": hint }),
        None => serde_json::json!({ "ok": false, "err": err }),
    };

    with_cors(Response::builder().status(status))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap_or_else(|_| fallback_error())
}

/// 204 No Content response for CORS preflight requests
pub fn preflight() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::NO_CONTENT))
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|_| fallback_error())
}

/// 200 health probe response
pub fn health() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::OK))
        .header("Content-Type", "text/plain")
        .body(Full::new(Bytes::from("ok")))
        .unwrap_or_else(|_| fallback_error())
}

/// 404 Not Found response
pub fn not_found() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::NOT_FOUND))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(
            r#"{"error":"Not Found","available_endpoints":["/api/code"]}"#,
        )))
        .unwrap_or_else(|_| fallback_error())
}

/// 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::METHOD_NOT_ALLOWED))
        .header("Allow", "GET, POST, OPTIONS")
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"error":"Method Not Allowed"}"#)))
        .unwrap_or_else(|_| fallback_error())
}

/// 413 Payload Too Large response
pub fn payload_too_large() -> Response<Full<Bytes>> {
    with_cors(Response::builder().status(StatusCode::PAYLOAD_TOO_LARGE))
        .header("Content-Type", "application/json")
        .body(Full::new(Bytes::from(r#"{"error":"Payload Too Large"}"#)))
        .unwrap_or_else(|_| fallback_error())
}

/// Last-resort response when the builder itself fails
fn fallback_error() -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(
        r#"{"error":"Internal server error"}"#,
    )));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    fn assert_cors_headers(response: &Response<Full<Bytes>>) {
        let headers = response.headers();
        assert_eq!(headers.get("Access-Control-Allow-Origin").unwrap(), "*");
        assert_eq!(
            headers.get("Access-Control-Allow-Methods").unwrap(),
            "GET,POST,OPTIONS"
        );
        assert_eq!(
            headers.get("Access-Control-Allow-Headers").unwrap(),
            "Content-Type"
        );
    }

    async fn body_string(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_preflight_is_empty_204_with_cors() {
        let response = preflight();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_cors_headers(&response);
        assert!(body_string(response).await.is_empty());
    }

    #[tokio::test]
    async fn test_error_response_with_hint() {
        let response = error_response(StatusCode::BAD_REQUEST, "fmt", Some("4-8 cifre"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_cors_headers(&response);

        let body = body_string(response).await;
        assert!(body.contains(r#""err":"fmt""#));
        assert!(body.contains(r#""hint":"4-8 cifre""#));
        assert!(body.contains(r#""ok":false"#));
    }

    #[tokio::test]
    async fn test_error_response_without_hint() {
        let response = error_response(StatusCode::FORBIDDEN, "current", None);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = body_string(response).await;
        assert!(body.contains(r#""err":"current""#));
        assert!(!body.contains("hint"));
    }

    #[tokio::test]
    async fn test_success_body() {
        let response = success();
        assert_eq!(response.status(), StatusCode::OK);
        assert_cors_headers(&response);
        assert_eq!(body_string(response).await, r#"{"ok":true}"#);
    }

    #[test]
    fn test_fallbacks_carry_cors() {
        assert_cors_headers(&not_found());
        assert_cors_headers(&method_not_allowed());
        assert_cors_headers(&payload_too_large());
        assert_cors_headers(&health());
    }
}
