//! Integration tests for the notification preference repository.
//!
//! Exercises the repository layer against a real database:
//! - Lazy creation with full defaults
//! - One-row-per-user invariant under concurrent first access
//! - Preference update round-trips
//! - Device-token registry persistence

use chrono::Utc;
use finch_core::notifications::{
    Channel, DevicePlatform, NotificationType, UpdatePreferences,
};
use finch_db::repositories::NotificationPreferenceRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Lazy creation
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn get_or_create_returns_defaults_for_new_user(pool: PgPool) {
    let row = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let pref = row.into_domain();

    assert_eq!(pref.user_id, 1);
    assert!(pref.channels.email.enabled);
    assert_eq!(
        pref.channels.email.types[&NotificationType::Marketing],
        false
    );
    assert_eq!(
        pref.channels.email.types[&NotificationType::GoalReminder],
        true
    );
    assert!(!pref.quiet_hours.enabled);
    assert!(pref.device_tokens.is_empty());
}

#[sqlx::test]
async fn get_or_create_is_idempotent(pool: PgPool) {
    let first = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let second = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notification_preferences")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test]
async fn concurrent_first_accesses_create_one_row(pool: PgPool) {
    let (a, b) = tokio::join!(
        NotificationPreferenceRepo::get_or_create(&pool, 42),
        NotificationPreferenceRepo::get_or_create(&pool, 42),
    );

    assert_eq!(a.unwrap().id, b.unwrap().id);
}

#[sqlx::test]
async fn records_for_different_users_are_independent(pool: PgPool) {
    let a = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let b = NotificationPreferenceRepo::get_or_create(&pool, 2)
        .await
        .unwrap();

    assert_ne!(a.id, b.id);

    // Disabling push for user 1 must not leak into user 2.
    let mut pref = a.into_domain();
    let update: UpdatePreferences = serde_json::from_value(serde_json::json!({
        "channels": { "push": { "enabled": false } }
    }))
    .unwrap();
    pref.apply_update(update);
    NotificationPreferenceRepo::save(&pool, 1, &pref.channels, &pref.quiet_hours)
        .await
        .unwrap();

    let other = NotificationPreferenceRepo::get_for_user(&pool, 2)
        .await
        .unwrap()
        .unwrap()
        .into_domain();
    assert!(other.channels.push.enabled);
}

// ---------------------------------------------------------------------------
// Preference updates
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn quiet_hours_update_round_trips(pool: PgPool) {
    let row = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let mut pref = row.into_domain();

    let update: UpdatePreferences = serde_json::from_value(serde_json::json!({
        "quietHours": { "enabled": true, "start": "21:30", "end": "07:15" }
    }))
    .unwrap();
    pref.apply_update(update);

    let saved = NotificationPreferenceRepo::save(&pool, 1, &pref.channels, &pref.quiet_hours)
        .await
        .unwrap()
        .into_domain();

    assert!(saved.quiet_hours.enabled);
    assert_eq!(saved.quiet_hours.start.to_string(), "21:30");
    assert_eq!(saved.quiet_hours.end.to_string(), "07:15");
    assert_eq!(saved.quiet_hours.timezone, "UTC");

    // And the stored row agrees on a fresh read.
    let reread = NotificationPreferenceRepo::get_for_user(&pool, 1)
        .await
        .unwrap()
        .unwrap()
        .into_domain();
    assert_eq!(reread.quiet_hours, saved.quiet_hours);
}

#[sqlx::test]
async fn channel_patch_preserves_sibling_channels(pool: PgPool) {
    let row = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let mut pref = row.into_domain();
    let email_before = pref.channels.email.clone();

    let update: UpdatePreferences = serde_json::from_value(serde_json::json!({
        "channels": { "push": { "enabled": false, "frequency": "daily" } }
    }))
    .unwrap();
    pref.apply_update(update);

    let saved = NotificationPreferenceRepo::save(&pool, 1, &pref.channels, &pref.quiet_hours)
        .await
        .unwrap()
        .into_domain();

    assert!(!saved.channels.push.enabled);
    assert_eq!(saved.channels.email, email_before);
    assert!(!saved.is_channel_type_enabled(Channel::Push, NotificationType::GoalAchieved));
}

#[sqlx::test]
async fn save_for_missing_user_returns_row_not_found(pool: PgPool) {
    let pref = finch_core::notifications::NotificationPreference::new(999);

    let err = NotificationPreferenceRepo::save(&pool, 999, &pref.channels, &pref.quiet_hours)
        .await
        .unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}

// ---------------------------------------------------------------------------
// Device tokens
// ---------------------------------------------------------------------------

#[sqlx::test]
async fn device_token_registry_round_trips(pool: PgPool) {
    let row = NotificationPreferenceRepo::get_or_create(&pool, 1)
        .await
        .unwrap();
    let mut pref = row.into_domain();

    pref.register_device_token("tok-a", DevicePlatform::Ios, Utc::now())
        .unwrap();
    pref.register_device_token("tok-b", DevicePlatform::Web, Utc::now())
        .unwrap();
    NotificationPreferenceRepo::save_device_tokens(&pool, 1, &pref.device_tokens)
        .await
        .unwrap();

    let mut reread = NotificationPreferenceRepo::get_for_user(&pool, 1)
        .await
        .unwrap()
        .unwrap()
        .into_domain();
    assert_eq!(reread.device_tokens.len(), 2);
    assert_eq!(reread.device_tokens[0].platform, DevicePlatform::Ios);

    reread.remove_device_token("tok-a");
    NotificationPreferenceRepo::save_device_tokens(&pool, 1, &reread.device_tokens)
        .await
        .unwrap();

    let final_state = NotificationPreferenceRepo::get_for_user(&pool, 1)
        .await
        .unwrap()
        .unwrap()
        .into_domain();
    assert_eq!(final_state.device_tokens.len(), 1);
    assert_eq!(final_state.device_tokens[0].token, "tok-b");
}
