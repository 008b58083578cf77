//! Notification preference row model.

use finch_core::notifications::{ChannelSettings, DeviceToken, NotificationPreference, QuietHours};
use finch_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `notification_preferences` table.
///
/// The preference payload lives in JSONB columns typed against the domain
/// structs, so the database never sees a shape the domain model cannot
/// represent.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationPreferenceRow {
    pub id: DbId,
    pub user_id: DbId,
    pub channels: Json<ChannelSettings>,
    pub quiet_hours: Json<QuietHours>,
    pub device_tokens: Json<Vec<DeviceToken>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationPreferenceRow {
    /// Unwrap the JSONB payloads into the domain record.
    pub fn into_domain(self) -> NotificationPreference {
        NotificationPreference {
            user_id: self.user_id,
            channels: self.channels.0,
            quiet_hours: self.quiet_hours.0,
            device_tokens: self.device_tokens.0,
        }
    }
}
