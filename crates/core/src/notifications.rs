//! Notification preference model and delivery-eligibility predicates.
//!
//! One [`NotificationPreference`] record exists per user. It holds a
//! channel x type delivery matrix, a quiet-hours window, and a registry of
//! push device tokens, and answers the single question a delivery service
//! must ask before sending anything: is delivery of type T on channel C
//! currently permitted for this user?
//!
//! The channel and type sets are closed enums rather than string-keyed
//! maps, so an unknown channel or type is unrepresentable past the serde
//! boundary. Types absent from a channel's override map read as enabled
//! (default-open), which lets new notification types reach existing users
//! without a data migration.
//!
//! Delivery services that fail to load a record (store unavailable) must
//! fail closed: "cannot determine eligibility" means "do not send", never
//! the reverse, or user opt-outs would be violated during outages.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{NaiveTime, Timelike};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Channels and notification types
// ---------------------------------------------------------------------------

/// A delivery medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Channel {
    Email,
    Push,
    InApp,
}

impl Channel {
    /// All delivery channels.
    pub const ALL: &'static [Channel] = &[Channel::Email, Channel::Push, Channel::InApp];
}

/// An event category a notification can be sent for.
///
/// The set is closed; adding a variant here is the only way to introduce a
/// new type, and existing user records pick it up as enabled automatically
/// (see [`ChannelConfig::is_type_enabled`]).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    GoalReminder,
    GoalAchieved,
    GoalMilestone,
    IncomeAdded,
    ExpenseAlert,
    SavingsMilestone,
    BillReminder,
    SecurityAlert,
    AccountUpdate,
    Marketing,
    System,
}

impl NotificationType {
    /// All notification types.
    pub const ALL: &'static [NotificationType] = &[
        NotificationType::GoalReminder,
        NotificationType::GoalAchieved,
        NotificationType::GoalMilestone,
        NotificationType::IncomeAdded,
        NotificationType::ExpenseAlert,
        NotificationType::SavingsMilestone,
        NotificationType::BillReminder,
        NotificationType::SecurityAlert,
        NotificationType::AccountUpdate,
        NotificationType::Marketing,
        NotificationType::System,
    ];

    /// Whether this type is enabled on a freshly created record.
    ///
    /// Marketing is the only opt-in type; everything else is opt-out.
    pub fn default_enabled(self) -> bool {
        !matches!(self, NotificationType::Marketing)
    }
}

/// Digest cadence for a channel.
///
/// Stored and round-tripped, but not consulted by the eligibility
/// predicate: digest batching is a scheduling layer above this model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Immediate,
    Daily,
    Weekly,
    Never,
}

/// Platform a push device token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePlatform {
    Ios,
    Android,
    Web,
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Accepted wall-clock format for quiet-hours bounds.
static TIME_OF_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid regex"));

/// A wall-clock time of day with minute precision, no date component.
///
/// Serializes as `"HH:MM"`. Ordering is by minutes since midnight, which
/// matches lexicographic comparison of the zero-padded form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Build from components. Fails on an out-of-range hour or minute.
    pub fn new(hour: u8, minute: u8) -> Result<Self, CoreError> {
        if hour > 23 || minute > 59 {
            return Err(CoreError::Validation(format!(
                "Invalid time of day: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }
}

impl FromStr for TimeOfDay {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !TIME_OF_DAY_RE.is_match(s) {
            return Err(CoreError::Validation(format!(
                "Invalid time format: '{s}' (expected HH:MM, 24-hour)"
            )));
        }
        // The regex guarantees both halves parse.
        let (h, m) = s.split_once(':').expect("regex guarantees a colon");
        Self::new(h.parse().expect("regex-checked"), m.parse().expect("regex-checked"))
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = CoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeOfDay> for String {
    fn from(t: TimeOfDay) -> Self {
        t.to_string()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl From<NaiveTime> for TimeOfDay {
    /// Truncates seconds; quiet-hours bounds have minute precision.
    fn from(t: NaiveTime) -> Self {
        Self {
            hour: t.hour() as u8,
            minute: t.minute() as u8,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-channel configuration
// ---------------------------------------------------------------------------

fn default_true() -> bool {
    true
}

/// The full per-type override table for a new record: every type present,
/// enabled per [`NotificationType::default_enabled`].
fn default_type_table() -> BTreeMap<NotificationType, bool> {
    NotificationType::ALL
        .iter()
        .map(|ty| (*ty, ty.default_enabled()))
        .collect()
}

/// Delivery configuration for a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub frequency: Frequency,
    /// Per-type overrides. A type absent from the map reads as enabled.
    #[serde(default)]
    pub types: BTreeMap<NotificationType, bool>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            frequency: Frequency::default(),
            types: default_type_table(),
        }
    }
}

impl ChannelConfig {
    /// Whether `ty` may be delivered on this channel.
    ///
    /// Only an explicit `false` override disables a type; a missing entry
    /// is enabled (default-open), so types added to the enum after a
    /// record was created are on for that user without a migration.
    pub fn is_type_enabled(&self, ty: NotificationType) -> bool {
        self.enabled && *self.types.get(&ty).unwrap_or(&true)
    }
}

/// Fixed per-channel configuration set, one field per channel, so the
/// channel set stays closed and compiler-checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSettings {
    #[serde(default)]
    pub email: ChannelConfig,
    #[serde(default)]
    pub push: ChannelConfig,
    #[serde(default)]
    pub in_app: ChannelConfig,
}

impl ChannelSettings {
    pub fn get(&self, channel: Channel) -> &ChannelConfig {
        match channel {
            Channel::Email => &self.email,
            Channel::Push => &self.push,
            Channel::InApp => &self.in_app,
        }
    }

    pub fn get_mut(&mut self, channel: Channel) -> &mut ChannelConfig {
        match channel {
            Channel::Email => &mut self.email,
            Channel::Push => &mut self.push,
            Channel::InApp => &mut self.in_app,
        }
    }
}

// ---------------------------------------------------------------------------
// Quiet hours
// ---------------------------------------------------------------------------

/// A user-configured daily window during which nothing is sent, regardless
/// of channel/type eligibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuietHours {
    #[serde(default)]
    pub enabled: bool,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    /// IANA timezone identifier. Stored and returned to clients, but NOT
    /// applied by [`QuietHours::contains`]: the caller supplies the
    /// time-of-day in whatever zone it intends to evaluate against.
    pub timezone: String,
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: TimeOfDay { hour: 22, minute: 0 },
            end: TimeOfDay { hour: 8, minute: 0 },
            timezone: "UTC".to_owned(),
        }
    }
}

impl QuietHours {
    /// Whether `now` falls inside the window. Both bounds are inclusive.
    ///
    /// A window whose start is later than its end wraps past midnight
    /// (e.g. 22:00-08:00 covers 23:30 and 07:00 but not 12:00).
    pub fn contains(&self, now: TimeOfDay) -> bool {
        if !self.enabled {
            return false;
        }
        if self.start <= self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}

// ---------------------------------------------------------------------------
// Device tokens
// ---------------------------------------------------------------------------

/// Maximum device tokens kept per user. Registering past the cap evicts
/// the token with the oldest `last_used`, so storage stays bounded while
/// active devices are never displaced by stale ones.
pub const MAX_DEVICE_TOKENS: usize = 20;

/// A platform-issued push delivery address for one installed app instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceToken {
    pub token: String,
    pub platform: DevicePlatform,
    pub last_used: Timestamp,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// The preference record
// ---------------------------------------------------------------------------

/// A user's full notification preference state. At most one exists per
/// user; absence means "all defaults" and the store creates the record
/// lazily on first access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreference {
    pub user_id: DbId,
    pub channels: ChannelSettings,
    pub quiet_hours: QuietHours,
    pub device_tokens: Vec<DeviceToken>,
}

impl NotificationPreference {
    /// A fresh record with all defaults (every type table fully
    /// materialized, quiet hours disabled, no device tokens).
    pub fn new(user_id: DbId) -> Self {
        Self {
            user_id,
            channels: ChannelSettings::default(),
            quiet_hours: QuietHours::default(),
            device_tokens: Vec::new(),
        }
    }

    /// Whether `ty` is enabled on `channel` for this user, ignoring quiet
    /// hours.
    pub fn is_channel_type_enabled(&self, channel: Channel, ty: NotificationType) -> bool {
        self.channels.get(channel).is_type_enabled(ty)
    }

    /// Whether `now` falls inside the user's quiet-hours window.
    ///
    /// `now` is used as supplied; the stored `quietHours.timezone` is not
    /// applied (see [`QuietHours::timezone`]).
    pub fn is_in_quiet_hours(&self, now: NaiveTime) -> bool {
        self.quiet_hours.contains(now.into())
    }

    /// The single predicate a delivery service should consult before
    /// sending: the channel/type pair is enabled AND the user is not in
    /// quiet hours. `frequency` is not consulted here.
    pub fn is_delivery_eligible(
        &self,
        channel: Channel,
        ty: NotificationType,
        now: NaiveTime,
    ) -> bool {
        self.is_channel_type_enabled(channel, ty) && !self.is_in_quiet_hours(now)
    }

    /// Register (or touch) a device token.
    ///
    /// Re-registering an existing token updates it in place: `last_used`
    /// is bumped, the platform is overwritten, and a previously
    /// deactivated token is revived. A new token is appended; at
    /// [`MAX_DEVICE_TOKENS`] the least-recently-used entry is evicted
    /// first.
    pub fn register_device_token(
        &mut self,
        token: &str,
        platform: DevicePlatform,
        now: Timestamp,
    ) -> Result<(), CoreError> {
        if token.is_empty() {
            return Err(CoreError::Validation(
                "Device token must not be empty".to_owned(),
            ));
        }

        if let Some(existing) = self.device_tokens.iter_mut().find(|t| t.token == token) {
            existing.platform = platform;
            existing.last_used = now;
            existing.is_active = true;
            return Ok(());
        }

        if self.device_tokens.len() >= MAX_DEVICE_TOKENS {
            if let Some((idx, _)) = self
                .device_tokens
                .iter()
                .enumerate()
                .min_by_key(|(_, t)| t.last_used)
            {
                self.device_tokens.remove(idx);
            }
        }

        self.device_tokens.push(DeviceToken {
            token: token.to_owned(),
            platform,
            last_used: now,
            is_active: true,
        });
        Ok(())
    }

    /// Remove a device token. Removing a token that is not registered is a
    /// no-op, not an error.
    pub fn remove_device_token(&mut self, token: &str) {
        self.device_tokens.retain(|t| t.token != token);
    }

    /// Merge a partial update into this record.
    ///
    /// The merge is shallow per channel: each supplied field replaces its
    /// counterpart, fields left out are untouched, and a supplied `types`
    /// map is merged entry-wise so toggling one type never clobbers the
    /// others' explicit overrides.
    pub fn apply_update(&mut self, update: UpdatePreferences) {
        if let Some(channels) = update.channels {
            for channel in Channel::ALL {
                let patch = match channel {
                    Channel::Email => &channels.email,
                    Channel::Push => &channels.push,
                    Channel::InApp => &channels.in_app,
                };
                if let Some(patch) = patch {
                    let config = self.channels.get_mut(*channel);
                    if let Some(enabled) = patch.enabled {
                        config.enabled = enabled;
                    }
                    if let Some(frequency) = patch.frequency {
                        config.frequency = frequency;
                    }
                    if let Some(types) = &patch.types {
                        config.types.extend(types.iter().map(|(k, v)| (*k, *v)));
                    }
                }
            }
        }

        if let Some(quiet) = update.quiet_hours {
            if let Some(enabled) = quiet.enabled {
                self.quiet_hours.enabled = enabled;
            }
            if let Some(start) = quiet.start {
                self.quiet_hours.start = start;
            }
            if let Some(end) = quiet.end {
                self.quiet_hours.end = end;
            }
            if let Some(timezone) = quiet.timezone {
                self.quiet_hours.timezone = timezone;
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Partial-update DTOs
// ---------------------------------------------------------------------------

/// Partial update for a preference record. Every field is optional;
/// unknown keys are rejected at deserialization rather than silently
/// stored, and malformed times fail to parse into [`TimeOfDay`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferences {
    pub channels: Option<UpdateChannels>,
    pub quiet_hours: Option<UpdateQuietHours>,
}

/// Per-channel patches. A channel left out is untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateChannels {
    pub email: Option<UpdateChannelConfig>,
    pub push: Option<UpdateChannelConfig>,
    pub in_app: Option<UpdateChannelConfig>,
}

/// Patch for a single channel's configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateChannelConfig {
    pub enabled: Option<bool>,
    pub frequency: Option<Frequency>,
    pub types: Option<BTreeMap<NotificationType, bool>>,
}

/// Patch for the quiet-hours window.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateQuietHours {
    pub enabled: Option<bool>,
    pub start: Option<TimeOfDay>,
    pub end: Option<TimeOfDay>,
    pub timezone: Option<String>,
}
