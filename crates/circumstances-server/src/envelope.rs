//! Uniform response envelope.
//!
//! Every response body is either `{"success": [{"path", "data"}]}` or
//! `{"error": {"code", "message"}}`.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

/// One successful result and the resource path it refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSuccess<T> {
    /// Resource path
    pub path: String,
    /// Result payload
    pub data: T,
}

/// Error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Machine-readable code, e.g. `"409 CONFLICT"`
    pub code: String,
    /// Human-readable message
    pub message: String,
}

/// Response envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Successful results
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<Vec<ApiSuccess<T>>>,

    /// Error detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    /// Envelope holding a single success entry
    pub fn success(path: impl Into<String>, data: T) -> Self {
        Self {
            success: Some(vec![ApiSuccess {
                path: path.into(),
                data,
            }]),
            error: None,
        }
    }

    /// Envelope holding an error
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }

    /// First success entry, if any
    pub fn first(&self) -> Option<&ApiSuccess<T>> {
        self.success.as_ref().and_then(|s| s.first())
    }
}

/// `"<status> <NAME>"` form of a status, e.g. `"404 NOT_FOUND"`
pub fn status_code_name(status: StatusCode) -> String {
    let name = status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_ascii_uppercase()
        .replace([' ', '-'], "_");
    format!("{} {}", status.as_u16(), name)
}

/// Reason phrase of a status, e.g. `"Not Found"`
pub fn reason_phrase(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}
