use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::like::model::{
    Like, LikeError, LikeStateResponse, LikeStats, LikeWithUser, PostBrief, RecentLike, TargetType,
};
use crate::notification::model::NotificationType;
use crate::notification::service::NotificationService;
use crate::pagination::Pagination;
use crate::user::model::UserSummary;

pub const LIKES_PER_PAGE: i64 = 20;
pub const RECENT_LIKES_LIMIT: i64 = 20;

#[derive(Clone)]
pub struct LikeService {
    pool: PgPool,
    notification_service: Arc<NotificationService>,
}

impl LikeService {
    pub fn new(pool: PgPool, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    /// Resolve a target against the collection its discriminant names and
    /// return the owner's user id. NotFound is specific to the target type.
    pub async fn target_owner(
        &self,
        target_id: i64,
        target_type: TargetType,
    ) -> Result<Uuid, LikeError> {
        let owner = match target_type {
            TargetType::Post => {
                sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM global.posts WHERE id = $1")
                    .bind(target_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            TargetType::Comment => {
                sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM global.comments WHERE id = $1")
                    .bind(target_id)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        owner.ok_or_else(|| target_type.not_found_error())
    }

    /// Flip the presence of a like and report the settled state.
    ///
    /// A like is never mutated: it is created or deleted. When a concurrent
    /// request wins the insert race, the unique constraint on
    /// (user_id, target_id, target_type) fires and the outcome is still
    /// "liked" — races never surface as errors. The returned count is always
    /// a fresh aggregate, never an adjusted counter.
    pub async fn toggle_like(
        &self,
        user_id: Uuid,
        target_id: i64,
        target_type: TargetType,
    ) -> Result<LikeStateResponse, LikeError> {
        let target_owner = self.target_owner(target_id, target_type).await?;

        let existing = sqlx::query_as::<_, Like>(
            "SELECT * FROM global.likes WHERE user_id = $1 AND target_id = $2 AND target_type = $3",
        )
        .bind(user_id)
        .bind(target_id)
        .bind(target_type.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let is_liked = match existing {
            Some(like) => {
                sqlx::query("DELETE FROM global.likes WHERE id = $1")
                    .bind(like.id)
                    .execute(&self.pool)
                    .await?;
                false
            }
            None => {
                let inserted = sqlx::query(
                    "INSERT INTO global.likes (user_id, target_id, target_type) VALUES ($1, $2, $3)",
                )
                .bind(user_id)
                .bind(target_id)
                .bind(target_type.as_str())
                .execute(&self.pool)
                .await;

                match inserted {
                    Ok(_) => {
                        if target_owner != user_id {
                            self.send_like_notification(target_owner, user_id, target_id);
                        }
                        true
                    }
                    // Lost a race against an identical like; the target is
                    // liked either way and the winner already notified.
                    Err(sqlx::Error::Database(db)) if db.is_unique_violation() => true,
                    Err(e) => return Err(e.into()),
                }
            }
        };

        let likes_count = self.count_for(target_id, target_type).await?;

        info!(
            "User {} toggled {} {} to liked={} (count {})",
            user_id, target_type, target_id, is_liked, likes_count
        );

        Ok(LikeStateResponse {
            is_liked,
            likes_count,
            target_id,
            target_type,
        })
    }

    /// Count of extant likes for a target. Always a live aggregate.
    pub async fn count_for(
        &self,
        target_id: i64,
        target_type: TargetType,
    ) -> Result<i64, LikeError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE target_id = $1 AND target_type = $2",
        )
        .bind(target_id)
        .bind(target_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Whether a user has liked a target.
    pub async fn has_liked(
        &self,
        user_id: Uuid,
        target_id: i64,
        target_type: TargetType,
    ) -> Result<bool, LikeError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.likes WHERE user_id = $1 AND target_id = $2 AND target_type = $3)",
        )
        .bind(user_id)
        .bind(target_id)
        .bind(target_type.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Current like state of a target for a user, with the live count.
    pub async fn check(
        &self,
        user_id: Uuid,
        target_id: i64,
        target_type: TargetType,
    ) -> Result<LikeStateResponse, LikeError> {
        self.target_owner(target_id, target_type).await?;

        let is_liked = self.has_liked(user_id, target_id, target_type).await?;
        let likes_count = self.count_for(target_id, target_type).await?;

        Ok(LikeStateResponse {
            is_liked,
            likes_count,
            target_id,
            target_type,
        })
    }

    /// Likers of a target with their identity, newest like first.
    pub async fn list_likes(
        &self,
        target_id: i64,
        target_type: TargetType,
        pagination: Pagination,
    ) -> Result<(Vec<LikeWithUser>, i64), LikeError> {
        self.target_owner(target_id, target_type).await?;

        let rows = sqlx::query(
            r#"
            SELECT l.id as like_id, l.created_at as liked_at,
                   u.id, u.username, u.full_name, u.profile_image, u.is_verified
            FROM global.likes l
            JOIN global.users u ON u.id = l.user_id
            WHERE l.target_id = $1 AND l.target_type = $2
            ORDER BY l.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(target_id)
        .bind(target_type.as_str())
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let likes = rows
            .into_iter()
            .map(|row| LikeWithUser {
                id: row.get("like_id"),
                user: UserSummary {
                    id: row.get("id"),
                    username: row.get("username"),
                    full_name: row.get("full_name"),
                    profile_image: row.get("profile_image"),
                    is_verified: row.get("is_verified"),
                },
                liked_at: row.get("liked_at"),
            })
            .collect();

        let total = self.count_for(target_id, target_type).await?;

        Ok((likes, total))
    }

    /// Latest likes on the caller's posts by other users.
    pub async fn recent_likes(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<RecentLike>, LikeError> {
        let rows = sqlx::query(
            r#"
            SELECT l.id as like_id, l.created_at as liked_at,
                   u.id, u.username, u.full_name, u.profile_image, u.is_verified,
                   p.id as post_id, p.caption
            FROM global.likes l
            JOIN global.posts p ON p.id = l.target_id
            JOIN global.users u ON u.id = l.user_id
            WHERE l.target_type = 'post' AND p.user_id = $1 AND l.user_id != $1
            ORDER BY l.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let recent = rows
            .into_iter()
            .map(|row| RecentLike {
                id: row.get("like_id"),
                user: UserSummary {
                    id: row.get("id"),
                    username: row.get("username"),
                    full_name: row.get("full_name"),
                    profile_image: row.get("profile_image"),
                    is_verified: row.get("is_verified"),
                },
                post: PostBrief {
                    id: row.get("post_id"),
                    caption: row.get("caption"),
                },
                liked_at: row.get("liked_at"),
            })
            .collect();

        Ok(recent)
    }

    /// Like statistics for a user: received on own posts, given by target
    /// kind, and the overall given total.
    pub async fn like_stats(&self, user_id: Uuid) -> Result<LikeStats, LikeError> {
        let likes_received = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM global.likes
            WHERE target_type = 'post'
              AND target_id IN (SELECT id FROM global.posts WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let posts_liked = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE user_id = $1 AND target_type = 'post'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let comments_liked = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE user_id = $1 AND target_type = 'comment'",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(LikeStats {
            likes_received,
            posts_liked,
            comments_liked,
            total_likes_given: posts_liked + comments_liked,
        })
    }

    fn send_like_notification(&self, receiver_id: Uuid, sender_id: Uuid, target_id: i64) {
        let notification_service = self.notification_service.clone();
        tokio::spawn(async move {
            if let Err(e) = notification_service
                .create(receiver_id, sender_id, NotificationType::Like, Some(target_id))
                .await
            {
                error!("Failed to send like notification: {:?}", e);
            }
        });
    }
}

// Store-backed tests; run with a live Postgres via
// `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("failed to connect to test database")
    }

    fn service(pool: &PgPool) -> LikeService {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        LikeService::new(pool.clone(), notifications)
    }

    async fn create_user(pool: &PgPool) -> Uuid {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO global.users (id, username, password_hash, full_name) VALUES ($1, $2, 'x', 'Test User')",
        )
        .bind(id)
        .bind(format!("u_{}", id.simple()))
        .execute(pool)
        .await
        .unwrap();
        id
    }

    async fn create_post(pool: &PgPool, user_id: Uuid) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO global.posts (user_id, caption) VALUES ($1, 'test post') RETURNING id",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn create_comment(pool: &PgPool, post_id: i64, user_id: Uuid) -> i64 {
        sqlx::query_scalar(
            "INSERT INTO global.comments (post_id, user_id, content) VALUES ($1, $2, 'test comment') RETURNING id",
        )
        .bind(post_id)
        .bind(user_id)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[tokio::test]
    #[ignore]
    async fn test_toggle_is_an_involution() {
        let pool = test_pool().await;
        let likes = service(&pool);

        let author = create_user(&pool).await;
        let liker = create_user(&pool).await;
        let post_id = create_post(&pool, author).await;

        let before = likes.count_for(post_id, TargetType::Post).await.unwrap();

        let first = likes
            .toggle_like(liker, post_id, TargetType::Post)
            .await
            .unwrap();
        assert!(first.is_liked);
        assert_eq!(first.likes_count, before + 1);

        let second = likes
            .toggle_like(liker, post_id, TargetType::Post)
            .await
            .unwrap();
        assert!(!second.is_liked);
        assert_eq!(second.likes_count, before);
    }

    #[tokio::test]
    #[ignore]
    async fn test_comment_like_example() {
        // A likes comment C (0 likes) -> {isLiked: true, likesCount: 1};
        // liking again -> {isLiked: false, likesCount: 0}.
        let pool = test_pool().await;
        let likes = service(&pool);

        let author = create_user(&pool).await;
        let liker = create_user(&pool).await;
        let post_id = create_post(&pool, author).await;
        let comment_id = create_comment(&pool, post_id, author).await;

        let first = likes
            .toggle_like(liker, comment_id, TargetType::Comment)
            .await
            .unwrap();
        assert!(first.is_liked);
        assert_eq!(first.likes_count, 1);

        let second = likes
            .toggle_like(liker, comment_id, TargetType::Comment)
            .await
            .unwrap();
        assert!(!second.is_liked);
        assert_eq!(second.likes_count, 0);
    }

    #[tokio::test]
    #[ignore]
    async fn test_count_always_matches_rows() {
        let pool = test_pool().await;
        let likes = service(&pool);

        let author = create_user(&pool).await;
        let post_id = create_post(&pool, author).await;

        for _ in 0..3 {
            let liker = create_user(&pool).await;
            likes
                .toggle_like(liker, post_id, TargetType::Post)
                .await
                .unwrap();
        }

        let rows = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE target_id = $1 AND target_type = 'post'",
        )
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(
            likes.count_for(post_id, TargetType::Post).await.unwrap(),
            rows
        );
        assert_eq!(rows, 3);
    }

    #[tokio::test]
    #[ignore]
    async fn test_uniqueness_constraint_blocks_duplicates() {
        let pool = test_pool().await;
        let likes = service(&pool);

        let author = create_user(&pool).await;
        let liker = create_user(&pool).await;
        let post_id = create_post(&pool, author).await;

        likes
            .toggle_like(liker, post_id, TargetType::Post)
            .await
            .unwrap();

        // A second raw insert of the same triple must hit the constraint
        let duplicate = sqlx::query(
            "INSERT INTO global.likes (user_id, target_id, target_type) VALUES ($1, $2, 'post')",
        )
        .bind(liker)
        .bind(post_id)
        .execute(&pool)
        .await;

        match duplicate {
            Err(sqlx::Error::Database(db)) => assert!(db.is_unique_violation()),
            other => panic!("expected unique violation, got {:?}", other),
        }

        assert_eq!(likes.count_for(post_id, TargetType::Post).await.unwrap(), 1);
    }

    #[tokio::test]
    #[ignore]
    async fn test_check_reports_state_without_side_effects() {
        let pool = test_pool().await;
        let likes = service(&pool);

        let author = create_user(&pool).await;
        let liker = create_user(&pool).await;
        let post_id = create_post(&pool, author).await;

        let state = likes.check(liker, post_id, TargetType::Post).await.unwrap();
        assert!(!state.is_liked);
        assert_eq!(state.likes_count, 0);

        likes
            .toggle_like(liker, post_id, TargetType::Post)
            .await
            .unwrap();

        let state = likes.check(liker, post_id, TargetType::Post).await.unwrap();
        assert!(state.is_liked);
        assert_eq!(state.likes_count, 1);
        assert!(likes.has_liked(liker, post_id, TargetType::Post).await.unwrap());
    }

    #[tokio::test]
    #[ignore]
    async fn test_missing_target_is_type_specific() {
        let pool = test_pool().await;
        let likes = service(&pool);
        let liker = create_user(&pool).await;

        let err = likes
            .toggle_like(liker, i64::MAX, TargetType::Post)
            .await
            .unwrap_err();
        assert!(matches!(err, LikeError::PostNotFound));

        let err = likes
            .toggle_like(liker, i64::MAX, TargetType::Comment)
            .await
            .unwrap_err();
        assert!(matches!(err, LikeError::CommentNotFound));
    }
}
