use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::like::model::TargetType;
use crate::like::service::LikeService;
use crate::pagination::Pagination;
use crate::post::model::{
    validate_caption, validate_media, CreatePostRequest, LikedPostResponse, Media, MediaResponse,
    MediaType, Post, PostError, PostResponse,
};
use crate::user::model::UserSummary;

pub const FEED_POSTS_PER_PAGE: i64 = 10;
pub const USER_POSTS_PER_PAGE: i64 = 12;
pub const LIKED_POSTS_PER_PAGE: i64 = 10;

#[derive(Clone)]
pub struct PostService {
    pool: PgPool,
    like_service: Arc<LikeService>,
}

impl PostService {
    pub fn new(pool: PgPool, like_service: Arc<LikeService>) -> Self {
        Self { pool, like_service }
    }

    /// Join a post with its author, ordered media and derived counts.
    /// Counts are live aggregates; nothing here reads a stored counter.
    async fn compose(&self, post: Post) -> Result<PostResponse, PostError> {
        let author = sqlx::query_as::<_, UserSummary>(
            "SELECT id, username, full_name, profile_image, is_verified FROM global.users WHERE id = $1",
        )
        .bind(post.user_id)
        .fetch_one(&self.pool)
        .await?;

        let media = sqlx::query_as::<_, Media>(
            "SELECT * FROM global.media WHERE post_id = $1 ORDER BY position ASC, id ASC",
        )
        .bind(post.id)
        .fetch_all(&self.pool)
        .await?;

        let media = media
            .into_iter()
            .map(|m| {
                let media_type = match m.media_type.as_str() {
                    "video" => MediaType::Video,
                    _ => MediaType::Image,
                };
                MediaResponse {
                    id: m.id,
                    media_type,
                    media_url: m.media_url,
                }
            })
            .collect();

        let likes_count = self.like_service.count_for(post.id, TargetType::Post).await?;

        let comments_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE post_id = $1",
        )
        .bind(post.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(PostResponse {
            id: post.id,
            caption: post.caption,
            author,
            media,
            likes_count,
            comments_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }

    async fn compose_all(&self, posts: Vec<Post>) -> Result<Vec<PostResponse>, PostError> {
        let mut responses = Vec::with_capacity(posts.len());
        for post in posts {
            responses.push(self.compose(post).await?);
        }
        Ok(responses)
    }

    /// Create a post with its media attachments in one transaction. Media
    /// descriptors come pre-resolved from the CDN collaborator.
    pub async fn create_post(
        &self,
        user_id: Uuid,
        request: CreatePostRequest,
    ) -> Result<PostResponse, PostError> {
        validate_media(&request.media).map_err(PostError::ValidationError)?;

        let caption = request
            .caption
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string();
        validate_caption(&caption).map_err(PostError::ValidationError)?;

        let mut tx = self.pool.begin().await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO global.posts (user_id, caption)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&caption)
        .fetch_one(&mut *tx)
        .await?;

        for (position, media) in request.media.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO global.media (post_id, media_type, media_url, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(post.id)
            .bind(media.media_type.as_str())
            .bind(media.media_url.trim())
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!("Created post {} for user {}", post.id, user_id);
        self.compose(post).await
    }

    pub async fn get_post(&self, post_id: i64) -> Result<PostResponse, PostError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM global.posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PostError::NotFound)?;

        self.compose(post).await
    }

    /// Feed: posts by the caller and everyone they follow, newest first.
    pub async fn get_feed(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<PostResponse>, i64), PostError> {
        let user_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !user_exists {
            return Err(PostError::UserNotFound);
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM global.posts
            WHERE user_id = $1
               OR user_id IN (SELECT followee_id FROM global.follows WHERE follower_id = $1)
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
            r#"
            SELECT COUNT(*) FROM global.posts
            WHERE user_id = $1
               OR user_id IN (SELECT followee_id FROM global.follows WHERE follower_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((self.compose_all(posts).await?, total))
    }

    /// A single user's posts, newest first.
    pub async fn get_user_posts(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<PostResponse>, i64), PostError> {
        let user_exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM global.users WHERE id = $1)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        if !user_exists {
            return Err(PostError::UserNotFound);
        }

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM global.posts
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

        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM global.posts WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((self.compose_all(posts).await?, total))
    }

    /// Caption edits are owner-only; admins may delete but not edit.
    pub async fn update_post(
        &self,
        post_id: i64,
        user_id: Uuid,
        caption: &str,
    ) -> Result<PostResponse, PostError> {
        let caption = caption.trim();
        if caption.is_empty() {
            return Err(PostError::ValidationError(
                "Caption cannot be empty".to_string(),
            ));
        }
        validate_caption(caption).map_err(PostError::ValidationError)?;

        let post = sqlx::query_as::<_, Post>("SELECT * FROM global.posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PostError::NotFound)?;

        if post.user_id != user_id {
            return Err(PostError::Forbidden);
        }

        let updated = sqlx::query_as::<_, Post>(
            r#"
            UPDATE global.posts
            SET caption = $1, updated_at = now()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(caption)
        .bind(post_id)
        .fetch_one(&self.pool)
        .await?;

        info!("Post {} updated by user {}", post_id, user_id);
        self.compose(updated).await
    }

    /// Delete a post and every dependent record in one transaction.
    ///
    /// Comment ids are collected before anything is deleted: likes on those
    /// comments have no foreign key tying them to the post, so deleting the
    /// comments first would strand them. Any failure rolls the whole
    /// cascade back and the post stays intact.
    pub async fn delete_post(
        &self,
        post_id: i64,
        user_id: Uuid,
        is_admin: bool,
    ) -> Result<(), PostError> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM global.posts WHERE id = $1")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PostError::NotFound)?;

        if post.user_id != user_id && !is_admin {
            return Err(PostError::Forbidden);
        }

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to begin cascade transaction: {}", e);
            PostError::DatabaseError(e)
        })?;

        let comment_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM global.comments WHERE post_id = $1")
                .bind(post_id)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query(
            "DELETE FROM global.likes WHERE target_type = 'comment' AND target_id = ANY($1)",
        )
        .bind(&comment_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM global.likes WHERE target_type = 'post' AND target_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.comments WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.media WHERE post_id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.posts WHERE id = $1")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit cascade for post {}: {}", post_id, e);
            PostError::DatabaseError(e)
        })?;

        info!(
            "Post {} deleted by user {} (cascaded {} comments)",
            post_id,
            user_id,
            comment_ids.len()
        );
        Ok(())
    }

    /// Posts the user has liked, newest like first.
    pub async fn get_liked_posts(
        &self,
        user_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<LikedPostResponse>, i64), PostError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.user_id, p.caption, p.created_at, p.updated_at,
                   l.created_at as liked_at
            FROM global.likes l
            JOIN global.posts p ON p.id = l.target_id
            WHERE l.user_id = $1 AND l.target_type = 'post'
            ORDER BY l.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut liked = Vec::with_capacity(rows.len());
        for row in rows {
            let post = Post {
                id: row.get("id"),
                user_id: row.get("user_id"),
                caption: row.get("caption"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            };
            let liked_at: DateTime<Utc> = row.get("liked_at");
            liked.push(LikedPostResponse {
                post: self.compose(post).await?,
                liked_at,
            });
        }

        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM global.likes l
            JOIN global.posts p ON p.id = l.target_id
            WHERE l.user_id = $1 AND l.target_type = 'post'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((liked, total))
    }
}

// Store-backed tests; run with a live Postgres via
// `DATABASE_URL=... cargo test -- --ignored`.
#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::service::NotificationService;
    use crate::post::model::{MediaUpload, MediaType};
    use sqlx::postgres::PgPoolOptions;

    async fn test_pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("failed to connect to test database")
    }

    fn services(pool: &PgPool) -> (PostService, Arc<LikeService>) {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        let likes = Arc::new(LikeService::new(pool.clone(), notifications));
        (PostService::new(pool.clone(), likes.clone()), likes)
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

    fn image(url: &str) -> MediaUpload {
        MediaUpload {
            media_type: MediaType::Image,
            media_url: url.to_string(),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_create_post_composes_media_in_order() {
        let pool = test_pool().await;
        let (posts, _) = services(&pool);
        let owner = create_user(&pool).await;

        let created = posts
            .create_post(
                owner,
                CreatePostRequest {
                    caption: Some("  ordered media  ".to_string()),
                    media: vec![
                        image("https://cdn.example.com/1.jpg"),
                        image("https://cdn.example.com/2.jpg"),
                        image("https://cdn.example.com/3.jpg"),
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(created.caption, "ordered media");
        assert_eq!(created.likes_count, 0);
        assert_eq!(created.comments_count, 0);
        let urls: Vec<&str> = created.media.iter().map(|m| m.media_url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://cdn.example.com/1.jpg",
                "https://cdn.example.com/2.jpg",
                "https://cdn.example.com/3.jpg"
            ]
        );
    }

    #[tokio::test]
    #[ignore]
    async fn test_cascade_delete_leaves_no_dependents() {
        // Deleting post P with comment C1 (liked by B) and no direct
        // post-likes removes every media, comment and like record that
        // referenced P or C1.
        let pool = test_pool().await;
        let (posts, likes) = services(&pool);
        let owner = create_user(&pool).await;
        let commenter = create_user(&pool).await;

        let created = posts
            .create_post(
                owner,
                CreatePostRequest {
                    caption: Some("doomed".to_string()),
                    media: vec![image("https://cdn.example.com/a.jpg")],
                },
            )
            .await
            .unwrap();
        let post_id = created.id;

        let comment_id: i64 = sqlx::query_scalar(
            "INSERT INTO global.comments (post_id, user_id, content) VALUES ($1, $2, 'c1') RETURNING id",
        )
        .bind(post_id)
        .bind(commenter)
        .fetch_one(&pool)
        .await
        .unwrap();

        likes
            .toggle_like(commenter, comment_id, TargetType::Comment)
            .await
            .unwrap();

        posts.delete_post(post_id, owner, false).await.unwrap();

        let media_left = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.media WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        let comments_left = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.comments WHERE post_id = $1",
        )
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        let post_likes_left = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE target_id = $1 AND target_type = 'post'",
        )
        .bind(post_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        let comment_likes_left = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.likes WHERE target_id = $1 AND target_type = 'comment'",
        )
        .bind(comment_id)
        .fetch_one(&pool)
        .await
        .unwrap();

        assert_eq!(media_left, 0);
        assert_eq!(comments_left, 0);
        assert_eq!(post_likes_left, 0);
        assert_eq!(comment_likes_left, 0);

        assert!(matches!(
            posts.get_post(post_id).await.unwrap_err(),
            PostError::NotFound
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_delete_requires_owner_or_admin() {
        let pool = test_pool().await;
        let (posts, _) = services(&pool);
        let owner = create_user(&pool).await;
        let stranger = create_user(&pool).await;

        let created = posts
            .create_post(
                owner,
                CreatePostRequest {
                    caption: None,
                    media: vec![image("https://cdn.example.com/a.jpg")],
                },
            )
            .await
            .unwrap();

        let err = posts.delete_post(created.id, stranger, false).await.unwrap_err();
        assert!(matches!(err, PostError::Forbidden));

        // Still there, then an admin override takes it down
        assert!(posts.get_post(created.id).await.is_ok());
        posts.delete_post(created.id, stranger, true).await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_user_posts_pages_are_disjoint() {
        let pool = test_pool().await;
        let (posts, _) = services(&pool);
        let owner = create_user(&pool).await;

        for i in 0..25 {
            posts
                .create_post(
                    owner,
                    CreatePostRequest {
                        caption: Some(format!("post {}", i)),
                        media: vec![image("https://cdn.example.com/a.jpg")],
                    },
                )
                .await
                .unwrap();
        }

        let page = |n: i64| Pagination { page: n, limit: 10 };

        let (first, total) = posts.get_user_posts(owner, page(1)).await.unwrap();
        let (second, _) = posts.get_user_posts(owner, page(2)).await.unwrap();
        let (third, _) = posts.get_user_posts(owner, page(3)).await.unwrap();

        assert_eq!(total, 25);
        assert_eq!(first.len(), 10);
        assert_eq!(second.len(), 10);
        assert_eq!(third.len(), 5);

        let first_ids: Vec<i64> = first.iter().map(|p| p.id).collect();
        let second_ids: Vec<i64> = second.iter().map(|p| p.id).collect();
        assert!(first_ids.iter().all(|id| !second_ids.contains(id)));

        // Newest first across the whole listing
        let all: Vec<&PostResponse> = first.iter().chain(&second).chain(&third).collect();
        for pair in all.windows(2) {
            assert!(pair[0].created_at >= pair[1].created_at);
        }

        let meta = crate::pagination::PageMeta::new(page(3), total);
        assert!(!meta.has_more);
        let meta = crate::pagination::PageMeta::new(page(2), total);
        assert!(meta.has_more);
    }
}
