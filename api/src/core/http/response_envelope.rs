//! JSON body shared by every non-webhook route:
//! `{"success": bool, "data"?: T, "error"?: {"code", "message", "details"?}}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    /// Stable, machine-readable code, e.g. `SERVER_CONFIG_ERROR`.
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ApiErrorDetail>,
}

/// Points the operator at the input or setting behind an error.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct ApiErrorDetail {
    /// Environment variable or body field, e.g. `PUBLIC_BASE_URL`.
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl ApiResponse<()> {
    pub fn failure(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
                details: Vec::new(),
            }),
        }
    }

    /// Appends a detail to the error; no-op on a success envelope.
    pub fn with_detail(mut self, path: impl Into<String>, hint: Option<String>) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.details.push(ApiErrorDetail {
                path: path.into(),
                hint,
            });
        }
        self
    }
}
