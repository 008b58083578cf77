//! Route definitions for the `/notifications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /preferences    -> get_preferences (creates-if-absent)
/// PUT    /preferences    -> update_preferences
/// POST   /device-token   -> register_device_token
/// DELETE /device-token   -> remove_device_token (idempotent)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/preferences",
            get(notification::get_preferences).put(notification::update_preferences),
        )
        .route(
            "/device-token",
            post(notification::register_device_token).delete(notification::remove_device_token),
        )
}
