//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod notification_preference_repo;

pub use notification_preference_repo::NotificationPreferenceRepo;
