//! The shared notification contract.
//!
//! One definition consumed by both the scheduling and processing entry
//! points — the same JSON shape is accepted on submission and re-published
//! verbatim at drain time, so the two sides can never drift.

use serde::{Deserialize, Serialize};

use crate::error::{ChimeError, Result};

/// Minimum length for caller-supplied identity fields.
const MIN_ID_LEN: usize = 5;

/// A schedule-or-cancel notification request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRequest {
    pub unique_properties: UniqueProperties,
    pub message: MessageContent,
    pub schedule_type: ScheduleType,
    pub notification_type: NotificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_notification_settings: Option<SmsSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notification_settings: Option<EmailSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notification_settings: Option<PushSettings>,
    /// ISO-8601 instant, bare `HH:MM`, or the literal `now`.
    pub send_time_utc: String,
    #[serde(default)]
    pub enable_adaptive_timing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adaptive_timing_callback_url: Option<String>,
}

/// Caller-defined identity of one logical notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UniqueProperties {
    pub user_id: String,
    pub message_id: String,
}

/// Message content. Split into parts for push; other channels recombine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    pub body: String,
    /// Optional last-moment body override, fetched at dispatch time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_callback_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleType {
    /// Deleted from its slot after a successful drain hand-off.
    OneTime,
    /// Stays in its slot forever; fires daily until cancelled.
    Recurring,
}

/// Delivery channel. `None` means cancel-if-scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    None,
    Push,
    Sms,
    Email,
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotificationType::None => write!(f, "none"),
            NotificationType::Push => write!(f, "push"),
            NotificationType::Sms => write!(f, "sms"),
            NotificationType::Email => write!(f, "email"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SmsSettings {
    pub phone_number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailSettings {
    pub to_email_address: String,
    pub from_email_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsubscribe_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSettings {
    pub device_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,
}

impl NotificationRequest {
    /// Validate the request against the shared contract.
    ///
    /// Fails with `Validation` and leaves all state untouched. Both the
    /// scheduler and the processor call this — the processor re-validates
    /// because a persisted request may outlive the contract it was written
    /// under.
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: &str| Err(ChimeError::Validation(msg.to_string()));

        if self.unique_properties.user_id.len() < MIN_ID_LEN {
            return fail("uniqueProperties.userId must be at least 5 characters");
        }
        if self.unique_properties.message_id.len() < MIN_ID_LEN {
            return fail("uniqueProperties.messageId must be at least 5 characters");
        }
        if self.message.title.is_empty() {
            return fail("message.title must not be empty");
        }
        if self.message.body.is_empty() {
            return fail("message.body must not be empty");
        }
        if self.send_time_utc.is_empty() {
            return fail("sendTimeUtc must not be empty");
        }
        match self.notification_type {
            NotificationType::Sms => {
                if self
                    .sms_notification_settings
                    .as_ref()
                    .is_none_or(|s| s.phone_number.is_empty())
                {
                    return fail("smsNotificationSettings.phoneNumber is required for sms");
                }
            }
            NotificationType::Email => {
                let ok = self
                    .email_notification_settings
                    .as_ref()
                    .is_some_and(|s| {
                        !s.to_email_address.is_empty() && !s.from_email_address.is_empty()
                    });
                if !ok {
                    return fail(
                        "emailNotificationSettings.toEmailAddress and fromEmailAddress are required for email",
                    );
                }
            }
            NotificationType::Push => {
                if self
                    .push_notification_settings
                    .as_ref()
                    .is_none_or(|s| s.device_token.is_empty())
                {
                    return fail("pushNotificationSettings.deviceToken is required for push");
                }
            }
            NotificationType::None => {}
        }
        if self.enable_adaptive_timing
            && self
                .adaptive_timing_callback_url
                .as_ref()
                .is_none_or(|u| u.is_empty())
        {
            return fail("adaptiveTimingCallbackUrl is required when enableAdaptiveTiming is set");
        }
        Ok(())
    }

    /// The dedup key for this request.
    pub fn uid(&self) -> String {
        generate_uid(
            &self.unique_properties.user_id,
            &self.unique_properties.message_id,
        )
    }

    pub fn user_id(&self) -> &str {
        &self.unique_properties.user_id
    }
}

/// Derive the dedup key `{userId}-{sanitizedMessageId}`.
///
/// Two requests with the same key are the same logical notification no
/// matter what else differs.
pub fn generate_uid(user_id: &str, message_id: &str) -> String {
    format!("{user_id}-{}", sanitize_message_id(message_id))
}

/// Strip whitespace, then every non-alphanumeric character. Case is kept.
fn sanitize_message_id(message_id: &str) -> String {
    message_id
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_alphanumeric())
        .collect()
}
