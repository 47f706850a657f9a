use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::like::model::LikeError;
use crate::user::model::UserSummary;

pub const MAX_CAPTION_LENGTH: usize = 2200;
pub const MAX_MEDIA_PER_POST: usize = 10;

/// Database row for a post. Counts and media are never stored here; they are
/// derived views computed at read time.
#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: i64,
    pub user_id: Uuid,
    pub caption: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }
}

/// Database row for a media attachment
#[derive(Debug, Clone, FromRow)]
pub struct Media {
    pub id: i64,
    pub post_id: i64,
    pub media_type: String,
    pub media_url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// A media descriptor already resolved by the CDN collaborator; the core
/// stores the returned url and type, never raw bytes.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub media_type: MediaType,
    #[schema(example = "https://cdn.example.com/posts/abc123.jpg")]
    pub media_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub id: i64,
    pub media_type: MediaType,
    pub media_url: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[schema(example = "Golden hour at the pier")]
    pub caption: Option<String>,
    pub media: Vec<MediaUpload>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    pub caption: String,
}

/// A post joined with its author, ordered media and derived counts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i64,
    pub caption: String,
    pub author: UserSummary,
    pub media: Vec<MediaResponse>,
    #[schema(example = "17")]
    pub likes_count: i64,
    #[schema(example = "4")]
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A post the caller liked, stamped with when they liked it.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostResponse {
    #[serde(flatten)]
    pub post: PostResponse,
    pub liked_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Post not found")]
    NotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<LikeError> for PostError {
    fn from(err: LikeError) -> Self {
        match err {
            LikeError::DatabaseError(e) => PostError::DatabaseError(e),
            LikeError::PostNotFound => PostError::NotFound,
            other => PostError::InternalError(other.to_string()),
        }
    }
}

pub fn validate_caption(caption: &str) -> Result<(), String> {
    if caption.chars().count() > MAX_CAPTION_LENGTH {
        Err(format!(
            "Caption must be at most {} characters",
            MAX_CAPTION_LENGTH
        ))
    } else {
        Ok(())
    }
}

pub fn validate_media(media: &[MediaUpload]) -> Result<(), String> {
    if media.is_empty() {
        return Err("At least one media file is required".to_string());
    }
    if media.len() > MAX_MEDIA_PER_POST {
        return Err(format!(
            "Maximum {} media files allowed per post",
            MAX_MEDIA_PER_POST
        ));
    }
    if media.iter().any(|m| m.media_url.trim().is_empty()) {
        return Err("Media URL cannot be empty".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upload(url: &str) -> MediaUpload {
        MediaUpload {
            media_type: MediaType::Image,
            media_url: url.to_string(),
        }
    }

    #[test]
    fn test_validate_caption_bounds() {
        assert!(validate_caption("").is_ok());
        assert!(validate_caption(&"x".repeat(2200)).is_ok());
        assert!(validate_caption(&"x".repeat(2201)).is_err());
    }

    #[test]
    fn test_validate_media_count() {
        assert!(validate_media(&[]).is_err());
        let one: Vec<MediaUpload> = vec![upload("https://cdn.example.com/a.jpg")];
        assert!(validate_media(&one).is_ok());
        let ten: Vec<MediaUpload> = (0..10).map(|_| upload("https://cdn.example.com/a.jpg")).collect();
        assert!(validate_media(&ten).is_ok());
        let eleven: Vec<MediaUpload> = (0..11).map(|_| upload("https://cdn.example.com/a.jpg")).collect();
        assert!(validate_media(&eleven).is_err());
    }

    #[test]
    fn test_validate_media_rejects_blank_url() {
        assert!(validate_media(&[upload("   ")]).is_err());
    }

    #[test]
    fn test_media_type_serde() {
        assert_eq!(serde_json::to_string(&MediaType::Image).unwrap(), "\"image\"");
        let parsed: MediaType = serde_json::from_str("\"video\"").unwrap();
        assert_eq!(parsed, MediaType::Video);
        assert!(serde_json::from_str::<MediaType>("\"gif\"").is_err());
    }

    #[test]
    fn test_liked_post_flattens_post_fields() {
        let response = LikedPostResponse {
            post: PostResponse {
                id: 7,
                caption: "caption".to_string(),
                author: UserSummary {
                    id: Uuid::nil(),
                    username: "jane_doe".to_string(),
                    full_name: "Jane Doe".to_string(),
                    profile_image: "default-profile.png".to_string(),
                    is_verified: false,
                },
                media: vec![],
                likes_count: 1,
                comments_count: 0,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            liked_at: Utc::now(),
        };
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(body["id"], 7);
        assert_eq!(body["likesCount"], 1);
        assert!(body.get("likedAt").is_some());
        assert!(body.get("post").is_none());
    }
}
