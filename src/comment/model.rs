use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::like::model::LikeError;
use crate::user::model::UserSummary;

pub const MAX_COMMENT_LENGTH: usize = 500;

/// Database model for a comment
#[derive(Debug, FromRow, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a new comment
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[schema(example = "42")]
    pub post_id: i64,

    /// The comment text
    #[schema(example = "This is a great shot!")]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// Response format for a single comment, decorated with its author and
/// live like count.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: i64,
    pub post_id: i64,
    pub content: String,
    pub author: UserSummary,
    #[schema(example = "3")]
    pub likes_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Possible comment errors
#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Comment not found")]
    NotFound,

    #[error("Post not found")]
    PostNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Not authorized to perform this action")]
    Forbidden,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl From<LikeError> for CommentError {
    fn from(err: LikeError) -> Self {
        match err {
            LikeError::DatabaseError(e) => CommentError::DatabaseError(e),
            LikeError::CommentNotFound => CommentError::NotFound,
            other => CommentError::InternalError(other.to_string()),
        }
    }
}

/// 1..=500 characters after trimming.
pub fn validate_content(content: &str) -> Result<&str, String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Content is required".to_string());
    }
    if trimmed.chars().count() > MAX_COMMENT_LENGTH {
        return Err(format!(
            "Content must be at most {} characters",
            MAX_COMMENT_LENGTH
        ));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_content_bounds() {
        assert_eq!(validate_content("hello").unwrap(), "hello");
        assert!(validate_content("").is_err());
        assert!(validate_content("   ").is_err());
        assert!(validate_content(&"x".repeat(500)).is_ok());
        assert!(validate_content(&"x".repeat(501)).is_err());
    }

    #[test]
    fn test_validate_content_trims() {
        assert_eq!(validate_content("  padded  ").unwrap(), "padded");
        // Content that only fits after trimming is accepted
        let padded = format!("  {}  ", "x".repeat(500));
        assert!(validate_content(&padded).is_ok());
    }

    #[test]
    fn test_create_request_wire_format() {
        let req: CreateCommentRequest =
            serde_json::from_str(r#"{"postId": 42, "content": "nice"}"#).unwrap();
        assert_eq!(req.post_id, 42);
        assert_eq!(req.content, "nice");
    }
}
