//! Transport layer (HTTP log drain).
//!
//! Exposes the drain handler and the line framing it streams request bodies
//! through before lines reach the parser.

pub mod drain;
pub mod lines;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use drainpipe_core::error::{ClientCode, DrainError};

/// HTTP status for a client-facing error code.
pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest
        | ClientCode::MissingParameter
        | ClientCode::DecodeError
        | ClientCode::UnsupportedUnit
        | ClientCode::UnsupportedVersion => StatusCode::BAD_REQUEST,
        ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// `<CODE>: <message>` as a plain-text body.
pub fn error_response(e: &DrainError) -> Response {
    let code = e.client_code();
    (status_for(code), format!("{}: {e}", code.as_str())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_shaped_errors_are_400() {
        let e = DrainError::MissingParameter("app_name".into());
        assert_eq!(error_response(&e).status(), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ClientCode::Internal), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
