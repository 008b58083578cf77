//! Handlers for the `/notifications` resource.
//!
//! All endpoints require authentication via [`AuthUser`]. The preference
//! record is created lazily on first access, so clients never see a 404
//! for their own preferences.
//!
//! Writes are read-modify-write over the user's document: fetch (creating
//! if absent), merge or mutate in the domain model, persist. Concurrent
//! edits to one user's record are last-write-wins.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use finch_core::notifications::{
    DevicePlatform, NotificationPreference, UpdatePreferences,
};
use finch_db::repositories::NotificationPreferenceRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /notifications/device-token`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterDeviceToken {
    pub token: String,
    pub platform: DevicePlatform,
}

/// Body for `DELETE /notifications/device-token`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveDeviceToken {
    pub token: String,
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications/preferences
///
/// Return the authenticated user's preference record, creating it with
/// full defaults if this is the first access.
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<NotificationPreference>>> {
    let row = NotificationPreferenceRepo::get_or_create(&state.pool, auth.user_id).await?;

    Ok(Json(DataResponse::new(row.into_domain())))
}

/// PUT /api/v1/notifications/preferences
///
/// Merge a partial update into the user's preference record. Unknown
/// channel or type keys and malformed times are rejected before the
/// stored record is touched.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(update): Json<UpdatePreferences>,
) -> AppResult<Json<DataResponse<NotificationPreference>>> {
    let row = NotificationPreferenceRepo::get_or_create(&state.pool, auth.user_id).await?;
    let mut pref = row.into_domain();
    pref.apply_update(update);

    let saved = NotificationPreferenceRepo::save(
        &state.pool,
        auth.user_id,
        &pref.channels,
        &pref.quiet_hours,
    )
    .await?;

    tracing::info!(user_id = auth.user_id, "Notification preferences updated");

    Ok(Json(DataResponse::new(saved.into_domain())))
}

// ---------------------------------------------------------------------------
// Device tokens
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/device-token
///
/// Register a push device token. Re-registering an existing token touches
/// it in place (and reactivates it) rather than duplicating.
pub async fn register_device_token(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RegisterDeviceToken>,
) -> AppResult<Json<MessageResponse>> {
    let row = NotificationPreferenceRepo::get_or_create(&state.pool, auth.user_id).await?;
    let mut pref = row.into_domain();
    pref.register_device_token(&input.token, input.platform, Utc::now())?;

    NotificationPreferenceRepo::save_device_tokens(&state.pool, auth.user_id, &pref.device_tokens)
        .await?;

    tracing::info!(
        user_id = auth.user_id,
        platform = ?input.platform,
        "Device token registered"
    );

    Ok(Json(MessageResponse::new("Device token registered")))
}

/// DELETE /api/v1/notifications/device-token
///
/// Remove a device token. Removing a token that was never registered is a
/// successful no-op.
pub async fn remove_device_token(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<RemoveDeviceToken>,
) -> AppResult<Json<MessageResponse>> {
    let row = NotificationPreferenceRepo::get_or_create(&state.pool, auth.user_id).await?;
    let mut pref = row.into_domain();
    pref.remove_device_token(&input.token);

    NotificationPreferenceRepo::save_device_tokens(&state.pool, auth.user_id, &pref.device_tokens)
        .await?;

    tracing::info!(user_id = auth.user_id, "Device token removed");

    Ok(Json(MessageResponse::new("Device token removed")))
}
