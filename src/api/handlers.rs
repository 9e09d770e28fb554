// Master code endpoint handlers module

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, Response, StatusCode};
use std::convert::Infallible;
use std::sync::Arc;

use super::response::{error_response, json_response, success};
use super::types::{is_valid_code, ChangeCodeRequest, CodeStatus};
use crate::config::AppState;
use crate::logger;
use crate::store::{ChangeError, CodeStore};

/// Outcome of a change-code attempt
#[derive(Debug, PartialEq, Eq)]
pub enum ChangeOutcome {
    /// New code validated and persisted
    Accepted,
    /// Request carried no body
    NoBody,
    /// Body was not valid JSON
    InvalidJson,
    /// New code is not 4-8 ASCII digits
    BadFormat,
    /// `new` and `confirm` differ
    ConfirmMismatch,
    /// Stored code does not match `current`
    WrongCurrent,
    /// Record file could not be written
    SaveFailed,
}

/// `GET /api/code` - report whether a code is set and its length
pub async fn code_status(state: &Arc<AppState>) -> Result<Response<Full<Bytes>>, Infallible> {
    let (set, len) = state.store.status().await;
    json_response(StatusCode::OK, &CodeStatus { set, len })
}

/// `POST /api/code` - validate and persist a new master code
pub async fn change_code(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = match req.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            // An unreadable body is handled like an absent one
            logger::log_warning(&format!("Failed to read request body: {e}"));
            Bytes::new()
        }
    };

    let outcome = apply_change(&state.store, &body).await;
    Ok(respond(&outcome))
}

/// Run the change-code validation pipeline against the store
///
/// Checks short-circuit at the first failure, in order: body present,
/// JSON parse, new-code format, confirmation match, current-code match,
/// persistence.
pub async fn apply_change(store: &CodeStore, body: &[u8]) -> ChangeOutcome {
    if body.is_empty() {
        return ChangeOutcome::NoBody;
    }

    let request: ChangeCodeRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(_) => return ChangeOutcome::InvalidJson,
    };

    if !is_valid_code(&request.new_code) {
        return ChangeOutcome::BadFormat;
    }

    if request.new_code != request.confirm {
        return ChangeOutcome::ConfirmMismatch;
    }

    match store.change(&request.current, &request.new_code).await {
        Ok(()) => {
            logger::log_code_changed();
            ChangeOutcome::Accepted
        }
        Err(ChangeError::CurrentMismatch) => ChangeOutcome::WrongCurrent,
        Err(ChangeError::Persist(e)) => {
            logger::log_error(&e);
            ChangeOutcome::SaveFailed
        }
    }
}

/// Map a change outcome onto its HTTP response
fn respond(outcome: &ChangeOutcome) -> Response<Full<Bytes>> {
    match outcome {
        ChangeOutcome::Accepted => success(),
        ChangeOutcome::NoBody => error_response(StatusCode::BAD_REQUEST, "no_body", None),
        ChangeOutcome::InvalidJson => error_response(StatusCode::BAD_REQUEST, "json", None),
        ChangeOutcome::BadFormat => {
            error_response(StatusCode::BAD_REQUEST, "fmt", Some("4-8 cifre"))
        }
        ChangeOutcome::ConfirmMismatch => error_response(StatusCode::BAD_REQUEST, "confirm", None),
        ChangeOutcome::WrongCurrent => error_response(StatusCode::FORBIDDEN, "current", None),
        ChangeOutcome::SaveFailed => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "save", None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_store(name: &str) -> CodeStore {
        let path: PathBuf =
            std::env::temp_dir().join(format!("lockpad-api-{}-{name}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        CodeStore::open(&path.to_string_lossy())
    }

    #[tokio::test]
    async fn test_empty_body_is_no_body() {
        let store = temp_store("no-body.json");
        assert_eq!(apply_change(&store, b"").await, ChangeOutcome::NoBody);
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid_json() {
        let store = temp_store("garbage.json");
        assert_eq!(
            apply_change(&store, b"not json at all").await,
            ChangeOutcome::InvalidJson
        );
    }

    #[tokio::test]
    async fn test_format_rejections() {
        let store = temp_store("format.json");
        for body in [
            br#"{"new":"123","confirm":"123"}"#.as_slice(),
            br#"{"new":"123456789","confirm":"123456789"}"#.as_slice(),
            br#"{"new":"12a4","confirm":"12a4"}"#.as_slice(),
            br#"{"confirm":"1234"}"#.as_slice(),
        ] {
            assert_eq!(apply_change(&store, body).await, ChangeOutcome::BadFormat);
        }
        assert_eq!(store.status().await, (false, 0));
    }

    #[tokio::test]
    async fn test_format_checked_before_confirm() {
        let store = temp_store("fmt-order.json");
        // Both checks would fail; format wins
        assert_eq!(
            apply_change(&store, br#"{"new":"12a4","confirm":"9999"}"#).await,
            ChangeOutcome::BadFormat
        );
    }

    #[tokio::test]
    async fn test_confirm_mismatch() {
        let store = temp_store("confirm.json");
        assert_eq!(
            apply_change(&store, br#"{"new":"1234","confirm":"1235"}"#).await,
            ChangeOutcome::ConfirmMismatch
        );
        assert_eq!(store.status().await, (false, 0));
    }

    #[tokio::test]
    async fn test_first_time_setup_accepts_any_current() {
        let store = temp_store("first-time.json");
        assert_eq!(
            apply_change(&store, br#"{"current":"whatever","new":"1234","confirm":"1234"}"#).await,
            ChangeOutcome::Accepted
        );
        assert_eq!(store.status().await, (true, 4));
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_wrong_current_after_setup() {
        let store = temp_store("wrong-current.json");
        apply_change(&store, br#"{"new":"1234","confirm":"1234"}"#).await;

        assert_eq!(
            apply_change(&store, br#"{"current":"0000","new":"56789","confirm":"56789"}"#).await,
            ChangeOutcome::WrongCurrent
        );
        assert_eq!(store.status().await, (true, 4));
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_missing_current_after_setup_is_rejected() {
        let store = temp_store("missing-current.json");
        apply_change(&store, br#"{"new":"1234","confirm":"1234"}"#).await;

        assert_eq!(
            apply_change(&store, br#"{"new":"56789","confirm":"56789"}"#).await,
            ChangeOutcome::WrongCurrent
        );
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_change_with_correct_current() {
        let store = temp_store("change.json");
        apply_change(&store, br#"{"new":"1234","confirm":"1234"}"#).await;

        assert_eq!(
            apply_change(&store, br#"{"current":"1234","new":"56789","confirm":"56789"}"#).await,
            ChangeOutcome::Accepted
        );
        assert_eq!(store.status().await, (true, 5));
        let _ = std::fs::remove_file(store.path());
    }

    #[tokio::test]
    async fn test_save_failure_maps_to_save_failed() {
        let path = std::env::temp_dir()
            .join(format!("lockpad-api-missing-dir-{}", std::process::id()))
            .join("code.json");
        let store = CodeStore::open(&path.to_string_lossy());

        assert_eq!(
            apply_change(&store, br#"{"new":"1234","confirm":"1234"}"#).await,
            ChangeOutcome::SaveFailed
        );
    }

    #[test]
    fn test_outcome_status_codes() {
        assert_eq!(respond(&ChangeOutcome::Accepted).status(), 200);
        assert_eq!(respond(&ChangeOutcome::NoBody).status(), 400);
        assert_eq!(respond(&ChangeOutcome::InvalidJson).status(), 400);
        assert_eq!(respond(&ChangeOutcome::BadFormat).status(), 400);
        assert_eq!(respond(&ChangeOutcome::ConfirmMismatch).status(), 400);
        assert_eq!(respond(&ChangeOutcome::WrongCurrent).status(), 403);
        assert_eq!(respond(&ChangeOutcome::SaveFailed).status(), 500);
    }
}
