//! Error classes shared across the dealer boundary.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Numeric error class carried in error chunks.
///
/// The named classes mirror the server taxonomy; anything else is
/// preserved verbatim as [`ErrorCode::Other`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u32", from = "u32")]
pub enum ErrorCode {
    Request,
    Location,
    Server,
    App,
    Resource,
    Timeout,
    Deadline,
    Other(u32),
}

impl ErrorCode {
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::Request => 400,
            ErrorCode::Location => 404,
            ErrorCode::Server => 500,
            ErrorCode::App => 502,
            ErrorCode::Resource => 503,
            ErrorCode::Timeout => 504,
            ErrorCode::Deadline => 520,
            ErrorCode::Other(code) => code,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Request => "request_error",
            ErrorCode::Location => "location_error",
            ErrorCode::Server => "server_error",
            ErrorCode::App => "app_error",
            ErrorCode::Resource => "resource_error",
            ErrorCode::Timeout => "timeout_error",
            ErrorCode::Deadline => "deadline_error",
            ErrorCode::Other(_) => "unknown_error",
        }
    }
}

impl From<u32> for ErrorCode {
    fn from(code: u32) -> Self {
        match code {
            400 => ErrorCode::Request,
            404 => ErrorCode::Location,
            500 => ErrorCode::Server,
            502 => ErrorCode::App,
            503 => ErrorCode::Resource,
            504 => ErrorCode::Timeout,
            520 => ErrorCode::Deadline,
            other => ErrorCode::Other(other),
        }
    }
}

impl From<ErrorCode> for u32 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_str(), self.code())
    }
}

/// Terminal failure captured on a receiver: the error class plus the
/// human-readable message the transport carried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ResponseError {
    pub code: ErrorCode,
    pub message: String,
}

impl ResponseError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_roundtrips_through_u32() {
        assert_eq!(ErrorCode::from(520), ErrorCode::Deadline);
        assert_eq!(u32::from(ErrorCode::Deadline), 520);
        assert_eq!(ErrorCode::from(7), ErrorCode::Other(7));
        assert_eq!(u32::from(ErrorCode::Other(7)), 7);
    }

    #[test]
    fn response_error_display_includes_class_and_message() {
        let error = ResponseError::new(ErrorCode::Deadline, "unhandled message expired");
        assert_eq!(
            error.to_string(),
            "deadline_error (520): unhandled message expired"
        );
    }
}
