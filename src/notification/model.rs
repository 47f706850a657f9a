use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserSummary;

/// Kind of event a notification records. `Message` is reserved for the
/// messaging feature; nothing emits it here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    Follow,
    Like,
    Comment,
    Message,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Follow => "follow",
            NotificationType::Like => "like",
            NotificationType::Comment => "comment",
            NotificationType::Message => "message",
        }
    }

    pub fn from_str(raw: &str) -> Result<Self, String> {
        match raw {
            "follow" => Ok(NotificationType::Follow),
            "like" => Ok(NotificationType::Like),
            "comment" => Ok(NotificationType::Comment),
            "message" => Ok(NotificationType::Message),
            _ => Err(format!("Invalid notification type: {}", raw)),
        }
    }
}

/// Database row for a notification
#[derive(Debug, Clone, FromRow)]
pub struct Notification {
    pub id: i64,
    pub receiver_id: Uuid,
    pub sender_id: Uuid,
    pub notification_type: String,
    pub entity_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Notification as returned to the receiver, with the sender joined in.
/// Also the payload published to the real-time delivery channel.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub sender: UserSummary,
    #[schema(example = "42")]
    pub entity_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Notification not found")]
    NotFound,

    #[error("Not authorized to perform this action")]
    Forbidden,

    #[error("Internal server error: {0}")]
    InternalError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_str_roundtrip() {
        for nt in [
            NotificationType::Follow,
            NotificationType::Like,
            NotificationType::Comment,
            NotificationType::Message,
        ] {
            assert_eq!(NotificationType::from_str(nt.as_str()).unwrap(), nt);
        }
        assert!(NotificationType::from_str("poke").is_err());
    }

    #[test]
    fn test_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&NotificationType::Follow).unwrap(),
            "\"follow\""
        );
        let parsed: NotificationType = serde_json::from_str("\"like\"").unwrap();
        assert_eq!(parsed, NotificationType::Like);
    }
}
