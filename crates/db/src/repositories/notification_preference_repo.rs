//! Repository for the `notification_preferences` table.
//!
//! All writes are last-write-wins at row granularity: concurrent edits to
//! the same user's record can lose updates, and that is a documented
//! property of the store, not a bug to paper over here. The one exception
//! is [`NotificationPreferenceRepo::get_or_create`], which upserts in a
//! single round-trip so racing first accesses cannot violate the
//! one-row-per-user invariant.

use finch_core::notifications::{ChannelSettings, DeviceToken, NotificationPreference, QuietHours};
use finch_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::notification::NotificationPreferenceRow;

/// Column list for `notification_preferences` queries.
const PREF_COLUMNS: &str =
    "id, user_id, channels, quiet_hours, device_tokens, created_at, updated_at";

/// Owns the per-user preference documents.
pub struct NotificationPreferenceRepo;

impl NotificationPreferenceRepo {
    /// Fetch a user's preference row, if one exists.
    pub async fn get_for_user(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<NotificationPreferenceRow>, sqlx::Error> {
        let query = format!("SELECT {PREF_COLUMNS} FROM notification_preferences WHERE user_id = $1");
        sqlx::query_as::<_, NotificationPreferenceRow>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Fetch the user's preference row, creating it with full defaults on
    /// first access.
    ///
    /// The no-op `DO UPDATE SET user_id = EXCLUDED.user_id` makes the
    /// insert return the existing row on conflict without touching its
    /// payload, so two racing first accesses both get the same record and
    /// the unique constraint is never surfaced to callers.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<NotificationPreferenceRow, sqlx::Error> {
        let defaults = NotificationPreference::new(user_id);
        let query = format!(
            "INSERT INTO notification_preferences \
                (user_id, channels, quiet_hours, device_tokens) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING {PREF_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreferenceRow>(&query)
            .bind(user_id)
            .bind(Json(&defaults.channels))
            .bind(Json(&defaults.quiet_hours))
            .bind(Json(&defaults.device_tokens))
            .fetch_one(pool)
            .await
    }

    /// Persist the full preference payload for a user. Last write wins.
    pub async fn save(
        pool: &PgPool,
        user_id: DbId,
        channels: &ChannelSettings,
        quiet_hours: &QuietHours,
    ) -> Result<NotificationPreferenceRow, sqlx::Error> {
        let query = format!(
            "UPDATE notification_preferences \
             SET channels = $2, quiet_hours = $3, updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {PREF_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreferenceRow>(&query)
            .bind(user_id)
            .bind(Json(channels))
            .bind(Json(quiet_hours))
            .fetch_one(pool)
            .await
    }

    /// Persist the device-token registry for a user. Last write wins.
    pub async fn save_device_tokens(
        pool: &PgPool,
        user_id: DbId,
        tokens: &[DeviceToken],
    ) -> Result<NotificationPreferenceRow, sqlx::Error> {
        let query = format!(
            "UPDATE notification_preferences \
             SET device_tokens = $2, updated_at = NOW() \
             WHERE user_id = $1 \
             RETURNING {PREF_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationPreferenceRow>(&query)
            .bind(user_id)
            .bind(Json(tokens))
            .fetch_one(pool)
            .await
    }
}
