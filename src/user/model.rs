use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const MAX_BIO_LENGTH: usize = 200;

/// Database row for a user. Never serialized; responses go through
/// `UserProfile` or `UserSummary`, which leave the password hash behind.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: String,
    pub cover_image: String,
    pub is_private: bool,
    pub is_verified: bool,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public identity attached to posts, comments, likes and notifications.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    #[schema(example = "jane_doe")]
    pub username: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    pub profile_image: String,
    pub is_verified: bool,
}

/// Full profile view, with derived follower counts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = String, format = "uuid")]
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: String,
    pub cover_image: String,
    pub is_private: bool,
    pub is_verified: bool,
    pub role: String,
    #[schema(example = "128")]
    pub followers_count: i64,
    #[schema(example = "96")]
    pub following_count: i64,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

/// Partial profile update; absent fields are left untouched.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub gender: Option<String>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_birth: Option<NaiveDate>,
    pub profile_image: Option<String>,
    pub cover_image: Option<String>,
    pub is_private: Option<bool>,
    pub password: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("User not found")]
    NotFound,

    #[error("You cannot follow yourself")]
    SelfFollow,

    #[error("You already follow this user")]
    AlreadyFollowing,

    #[error("You are not following this user")]
    NotFollowing,

    #[error("Username already in use")]
    UsernameTaken,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

pub fn validate_gender(gender: &str) -> Result<(), String> {
    match gender {
        "male" | "female" | "other" => Ok(()),
        _ => Err("Gender must be one of \"male\", \"female\" or \"other\"".to_string()),
    }
}

pub fn validate_bio(bio: &str) -> Result<(), String> {
    if bio.chars().count() > MAX_BIO_LENGTH {
        Err(format!("Bio must be at most {} characters", MAX_BIO_LENGTH))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_gender() {
        assert!(validate_gender("male").is_ok());
        assert!(validate_gender("female").is_ok());
        assert!(validate_gender("other").is_ok());
        assert!(validate_gender("unknown").is_err());
        assert!(validate_gender("Male").is_err());
    }

    #[test]
    fn test_validate_bio_length() {
        assert!(validate_bio("").is_ok());
        assert!(validate_bio(&"x".repeat(200)).is_ok());
        assert!(validate_bio(&"x".repeat(201)).is_err());
    }

    #[test]
    fn test_user_summary_serializes_camel_case() {
        let summary = UserSummary {
            id: Uuid::nil(),
            username: "jane_doe".to_string(),
            full_name: "Jane Doe".to_string(),
            profile_image: "default-profile.png".to_string(),
            is_verified: false,
        };
        let body = serde_json::to_value(&summary).unwrap();
        assert_eq!(body["fullName"], "Jane Doe");
        assert_eq!(body["profileImage"], "default-profile.png");
        assert_eq!(body["isVerified"], false);
        assert!(body.get("password").is_none());
        assert!(body.get("passwordHash").is_none());
    }
}
