use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::comment::model::{validate_content, Comment, CommentError, CommentResponse};
use crate::like::model::TargetType;
use crate::like::service::LikeService;
use crate::notification::model::NotificationType;
use crate::notification::service::NotificationService;
use crate::pagination::Pagination;
use crate::user::model::UserSummary;

pub const COMMENTS_PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct CommentService {
    pool: PgPool,
    like_service: Arc<LikeService>,
    notification_service: Arc<NotificationService>,
}

impl CommentService {
    pub fn new(
        pool: PgPool,
        like_service: Arc<LikeService>,
        notification_service: Arc<NotificationService>,
    ) -> Self {
        Self {
            pool,
            like_service,
            notification_service,
        }
    }

    /// Join a comment with its author and live like count.
    async fn compose(&self, comment: Comment) -> Result<CommentResponse, CommentError> {
        let author = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, full_name, profile_image, is_verified FROM global.users WHERE id = $1",
        )
        .bind(comment.user_id)
        .fetch_one(&self.pool)
        .await?;

        let likes_count = self
            .like_service
            .count_for(comment.id, TargetType::Comment)
            .await?;

        Ok(CommentResponse {
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            author,
            likes_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        })
    }

    async fn compose_all(
        &self,
        comments: Vec<Comment>,
    ) -> Result<Vec<CommentResponse>, CommentError> {
        let mut responses = Vec::with_capacity(comments.len());
        for comment in comments {
            responses.push(self.compose(comment).await?);
        }
        Ok(responses)
    }

    /// Create a comment on an existing post.
    pub async fn create_comment(
        &self,
        user_id: Uuid,
        post_id: i64,
        content: &str,
    ) -> Result<CommentResponse, CommentError> {
        let content = validate_content(content).map_err(CommentError::ValidationError)?;

        let post_owner =
            sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM global.posts WHERE id = $1")
                .bind(post_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(CommentError::PostNotFound)?;

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO global.comments (post_id, user_id, content)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.pool)
        .await?;

        info!("Created comment {} on post {}", comment.id, post_id);

        // Notify the post owner unless they commented on their own post
        if post_owner != user_id {
            let notification_service = self.notification_service.clone();
            let comment_id = comment.id;
            tokio::spawn(async move {
                if let Err(e) = notification_service
                    .create(post_owner, user_id, NotificationType::Comment, Some(comment_id))
                    .await
                {
                    error!("Failed to send comment notification: {:?}", e);
                }
            });
        }

        self.compose(comment).await
    }

    /// Comments in a post's thread, oldest first (chronological reading
    /// order; every other listing in the system is newest first).
    pub async fn get_post_comments(
        &self,
        post_id: i64,
        pagination: Pagination,
    ) -> Result<(Vec<CommentResponse>, i64), CommentError> {
        let post_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.posts WHERE id = $1)",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        if !post_exists {
            return Err(CommentError::PostNotFound);
        }

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM global.comments
            WHERE post_id = $1
            ORDER BY created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(post_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((self.compose_all(comments).await?, total))
    }

    pub async fn get_comment(&self, comment_id: i64) -> Result<CommentResponse, CommentError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM global.comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CommentError::NotFound)?;

        self.compose(comment).await
    }

    /// Edit a comment's content. Author only; bumps updated_at.
    pub async fn update_comment(
        &self,
        comment_id: i64,
        user_id: Uuid,
        content: &str,
    ) -> Result<CommentResponse, CommentError> {
        let content = validate_content(content).map_err(CommentError::ValidationError)?;

        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM global.comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CommentError::NotFound)?;

        if comment.user_id != user_id {
            return Err(CommentError::Forbidden);
        }

        let updated = sqlx::query_as::<_, Comment>(
            r#"
            UPDATE global.comments
            SET content = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(content)
        .bind(comment_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Comment {} updated by user {}", comment_id, user_id);
        self.compose(updated).await
    }

    /// Delete a comment and its likes in one transaction. Author or admin.
    pub async fn delete_comment(
        &self,
        comment_id: i64,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<(), CommentError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM global.comments WHERE id = $1")
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(CommentError::NotFound)?;

        if comment.user_id != user_id && !is_admin {
            return Err(CommentError::Forbidden);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin cascade transaction: {}", e);
            CommentError::DatabaseError(e)
        })?;

        sqlx::query("DELETE FROM global.likes WHERE target_type = 'comment' AND target_id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.comments WHERE id = $1")
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit cascade for comment {}: {}", comment_id, e);
            CommentError::DatabaseError(e)
        })?;

        info!("Comment {} deleted by user {}", comment_id, user_id);
        Ok(())
    }

    /// A user's comments across all posts, newest first.
    pub async fn get_user_comments(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<CommentResponse>, i64), CommentError> {
        let user_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !user_exists {
            return Err(CommentError::UserNotFound);
        }

        let comments = sqlx::query_as::<_, Comment>(
            r#"
            SELECT * FROM global.comments
            WHERE user_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((self.compose_all(comments).await?, total))
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

    fn services(pool: &PgPool) -> (CommentService, Arc<LikeService>) {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        let likes = Arc::new(LikeService::new(pool.clone(), notifications.clone()));
        (
            CommentService::new(pool.clone(), likes.clone(), notifications),
            likes,
        )
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

    #[tokio::test]
    #[ignore]
    async fn test_comment_on_missing_post_rejected() {
        let pool = test_pool().await;
        let (comments, _) = services(&pool);
        let user = create_user(&pool).await;

        assert!(matches!(
            comments.create_comment(user, i64::MAX, "hello").await.unwrap_err(),
            CommentError::PostNotFound
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_thread_reads_oldest_first() {
        let pool = test_pool().await;
        let (comments, _) = services(&pool);
        let owner = create_user(&pool).await;
        let commenter = create_user(&pool).await;
        let post_id = create_post(&pool, owner).await;

        for i in 0..5 {
            comments
                .create_comment(commenter, post_id, &format!("comment {}", i))
                .await
                .unwrap();
        }

        let (thread, total) = comments
            .get_post_comments(post_id, Pagination { page: 1, limit: 10 })
            .await
            .unwrap();

        assert_eq!(total, 5);
        for pair in thread.windows(2) {
            assert!(pair[0].created_at <= pair[1].created_at);
        }

        // The same comments listed per user come back newest first
        let (mine, _) = comments
            .get_user_comments(commenter, Pagination { page: 1, limit: 10 })
            .await
            .unwrap();
        for pair in mine.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_update_is_author_only_and_bumps_updated_at() {
        let pool = test_pool().await;
        let (comments, _) = services(&pool);
        let owner = create_user(&pool).await;
        let author = create_user(&pool).await;
        let stranger = create_user(&pool).await;
        let post_id = create_post(&pool, owner).await;

        let created = comments
            .create_comment(author, post_id, "original")
            .await
            .unwrap();

        assert!(matches!(
            comments
                .update_comment(created.id, stranger, "hijacked")
                .await
                .unwrap_err(),
            CommentError::Forbidden
        ));

        let updated = comments
            .update_comment(created.id, author, "edited")
            .await
            .unwrap();
        assert_eq!(updated.content, "edited");
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    #[ignore]
    async fn test_delete_cascades_comment_likes() {
        let pool = test_pool().await;
        let (comments, likes) = services(&pool);
        let owner = create_user(&pool).await;
        let author = create_user(&pool).await;
        let liker = create_user(&pool).await;
        let post_id = create_post(&pool, owner).await;

        let created = comments
            .create_comment(author, post_id, "soon gone")
            .await
            .unwrap();

        likes
            .toggle_like(liker, created.id, TargetType::Comment)
            .await
            .unwrap();

        comments.delete_comment(created.id, author, false).await.unwrap();

        assert!(matches!(
            comments.get_comment(created.id).await.unwrap_err(),
            CommentError::NotFound
        ));

        let likes_left = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE target_id = $1 AND target_type = 'comment'",
        )
        .bind(created.id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(likes_left, 0);
    }

    #[tokio::test]
    #[ignore]
    async fn test_admin_can_delete_any_comment() {
        let pool = test_pool().await;
        let (comments, _) = services(&pool);
        let owner = create_user(&pool).await;
        let author = create_user(&pool).await;
        let admin = create_user(&pool).await;
        let post_id = create_post(&pool, owner).await;

        let created = comments
            .create_comment(author, post_id, "moderated away")
            .await
            .unwrap();

        assert!(matches!(
            comments
                .delete_comment(created.id, admin, false)
                .await
                .unwrap_err(),
            CommentError::Forbidden
        ));

        comments.delete_comment(created.id, admin, true).await.unwrap();
    }
}
