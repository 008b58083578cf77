//! Shared response envelope types for API handlers.
//!
//! Successful responses use `{ "success": true, "data": ... }` for payloads
//! and `{ "success": true, "message": ... }` for acknowledgements. Use these
//! instead of ad-hoc `serde_json::json!` calls to get compile-time type
//! safety and consistent serialization.

use serde::Serialize;

/// Standard `{ "success": true, "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Standard `{ "success": true, "message": ... }` acknowledgement envelope.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}
