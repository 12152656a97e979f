//! Shared error type across drainpipe crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed request.
    BadRequest,
    /// A required request parameter is absent or ambiguous.
    MissingParameter,
    /// A line matched the drain grammar but a field failed to decode.
    DecodeError,
    /// A metric value carried a unit we do not understand.
    UnsupportedUnit,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::MissingParameter => "MISSING_PARAMETER",
            ClientCode::DecodeError => "DECODE_ERROR",
            ClientCode::UnsupportedUnit => "UNSUPPORTED_UNIT",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, DrainError>;

/// Unified error type used by core and collector.
#[derive(Debug, Error)]
pub enum DrainError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("missing parameter: {0}")]
    MissingParameter(String),
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("unsupported unit: {0}")]
    UnsupportedUnit(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl DrainError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            DrainError::BadRequest(_) => ClientCode::BadRequest,
            DrainError::MissingParameter(_) => ClientCode::MissingParameter,
            DrainError::Decode(_) => ClientCode::DecodeError,
            DrainError::UnsupportedUnit(_) => ClientCode::UnsupportedUnit,
            DrainError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            DrainError::Internal(_) => ClientCode::Internal,
        }
    }
}
