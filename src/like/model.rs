use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::user::model::UserSummary;

/// Discriminant for the polymorphic like target. A like row holds an opaque
/// `target_id` that only this tag makes resolvable; every dereference must
/// match on it exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TargetType {
    Post,
    Comment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Post => "post",
            TargetType::Comment => "comment",
        }
    }

    pub fn from_str(raw: &str) -> Result<Self, LikeError> {
        match raw {
            "post" => Ok(TargetType::Post),
            "comment" => Ok(TargetType::Comment),
            _ => Err(LikeError::InvalidTargetType),
        }
    }

    /// "Post not found" / "Comment not found"
    pub fn not_found_error(&self) -> LikeError {
        match self {
            TargetType::Post => LikeError::PostNotFound,
            TargetType::Comment => LikeError::CommentNotFound,
        }
    }
}

impl std::fmt::Display for TargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Database row for a like. `target_type` stays a plain string at the row
/// level; services only ever hand out the typed discriminant.
#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub id: i64,
    pub user_id: Uuid,
    pub target_id: i64,
    pub target_type: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeRequest {
    #[schema(example = "42")]
    pub target_id: i64,
    pub target_type: TargetType,
}

/// Result of a toggle or a like-state check.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStateResponse {
    pub is_liked: bool,
    #[schema(example = "17")]
    pub likes_count: i64,
    pub target_id: i64,
    pub target_type: TargetType,
}

/// One liker in a likes listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeWithUser {
    pub id: i64,
    pub user: UserSummary,
    pub liked_at: DateTime<Utc>,
}

/// Caption-level view of a post inside recent-like items.
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostBrief {
    pub id: i64,
    pub caption: String,
}

/// A recent like on one of the caller's posts.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentLike {
    pub id: i64,
    pub user: UserSummary,
    pub post: PostBrief,
    pub liked_at: DateTime<Utc>,
}

/// Aggregate like statistics for a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStats {
    pub likes_received: i64,
    pub posts_liked: i64,
    pub comments_liked: i64,
    pub total_likes_given: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum LikeError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Target type must be either \"post\" or \"comment\"")]
    InvalidTargetType,

    #[error("Post not found")]
    PostNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Internal server error: {0}")]
    InternalError(String),
}
