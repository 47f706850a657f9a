use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::service::{hash_password, validate_username};
use crate::notification::model::NotificationType;
use crate::notification::service::NotificationService;
use crate::user::model::{
    validate_bio, validate_gender, UpdateProfileRequest, User, UserError, UserProfile, UserSummary,
};

#[derive(Clone)]
pub struct UserService {
    pool: PgPool,
    notification_service: Arc<NotificationService>,
}

impl UserService {
    pub fn new(pool: PgPool, notification_service: Arc<NotificationService>) -> Self {
        Self {
            pool,
            notification_service,
        }
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<User, UserError> {
        sqlx::query_as::<_, User>("SELECT * FROM global.users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(UserError::NotFound)
    }

    /// Full profile with derived follower/following counts.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserProfile, UserError> {
        let user = self.fetch_user(user_id).await?;

        let followers_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.follows WHERE followee_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        let following_count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.follows WHERE follower_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserProfile {
            id: user.id,
            username: user.username,
            full_name: user.full_name,
            bio: user.bio,
            gender: user.gender,
            date_of_birth: user.date_of_birth,
            profile_image: user.profile_image,
            cover_image: user.cover_image,
            is_private: user.is_private,
            is_verified: user.is_verified,
            role: user.role,
            followers_count,
            following_count,
            created_at: user.created_at,
        })
    }

    /// Apply a partial profile update. Only the owner reaches this path.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: UpdateProfileRequest,
    ) -> Result<UserProfile, UserError> {
        let mut user = self.fetch_user(user_id).await?;

        if let Some(username) = update.username {
            validate_username(&username).map_err(UserError::ValidationError)?;
            user.username = username.to_lowercase();
        }
        if let Some(full_name) = update.full_name {
            if full_name.trim().is_empty() {
                return Err(UserError::ValidationError(
                    "Full name cannot be empty".to_string(),
                ));
            }
            user.full_name = full_name.trim().to_string();
        }
        if let Some(bio) = update.bio {
            validate_bio(&bio).map_err(UserError::ValidationError)?;
            user.bio = Some(bio);
        }
        if let Some(gender) = update.gender {
            validate_gender(&gender).map_err(UserError::ValidationError)?;
            user.gender = Some(gender);
        }
        if let Some(date_of_birth) = update.date_of_birth {
            user.date_of_birth = Some(date_of_birth);
        }
        if let Some(profile_image) = update.profile_image {
            user.profile_image = profile_image;
        }
        if let Some(cover_image) = update.cover_image {
            user.cover_image = cover_image;
        }
        if let Some(is_private) = update.is_private {
            user.is_private = is_private;
        }
        if let Some(password) = update.password {
            if password.len() < 6 {
                return Err(UserError::ValidationError(
                    "Password must be at least 6 characters".to_string(),
                ));
            }
            user.password_hash = hash_password(&password)
                .map_err(|e| UserError::InternalError(e.message()))?;
        }

        let result = sqlx::query(
            r#"
            UPDATE global.users
            SET username = $1, full_name = $2, bio = $3, gender = $4, date_of_birth = $5,
                profile_image = $6, cover_image = $7, is_private = $8, password_hash = $9,
                updated_at = now()
            WHERE id = $10
            "#,
        )
        .bind(&user.username)
        .bind(&user.full_name)
        .bind(&user.bio)
        .bind(&user.gender)
        .bind(user.date_of_birth)
        .bind(&user.profile_image)
        .bind(&user.cover_image)
        .bind(user.is_private)
        .bind(&user.password_hash)
        .bind(user_id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(UserError::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        }

        info!("Profile updated for user {}", user_id);
        self.get_profile(user_id).await
    }

    /// Delete an account and everything that hangs off it, in one
    /// transaction. Likes on the user's comments and on comments under the
    /// user's posts are enumerated before those comments go away, same as
    /// the post cascade.
    pub async fn delete_account(&self, user_id: Uuid) -> Result<(), UserError> {
        // Existence check before mutating anything
        self.fetch_user(user_id).await?;

        let mut tx = self.pool.begin().await?;

        let own_post_ids: Vec<i64> =
            sqlx::query_scalar("SELECT id FROM global.posts WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&mut *tx)
                .await?;

        // Comments under the user's posts (any author) plus the user's own
        // comments elsewhere; both sets lose their likes.
        let affected_comment_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM global.comments WHERE post_id = ANY($1) OR user_id = $2",
        )
        .bind(&own_post_ids)
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM global.likes WHERE target_type = 'comment' AND target_id = ANY($1)",
        )
        .bind(&affected_comment_ids)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM global.likes WHERE target_type = 'post' AND target_id = ANY($1)")
            .bind(&own_post_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.likes WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.comments WHERE id = ANY($1)")
            .bind(&affected_comment_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.media WHERE post_id = ANY($1)")
            .bind(&own_post_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.posts WHERE id = ANY($1)")
            .bind(&own_post_ids)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.follows WHERE follower_id = $1 OR followee_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.notifications WHERE receiver_id = $1 OR sender_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM global.users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Account {} deleted", user_id);
        Ok(())
    }

    /// Follow another user. One row in global.follows covers both directions
    /// of the relationship; the primary key turns a duplicate follow into a
    /// Conflict.
    pub async fn follow(&self, user_id: Uuid, target_id: Uuid) -> Result<String, UserError> {
        if user_id == target_id {
            return Err(UserError::SelfFollow);
        }

        let target_username =
            sqlx::query_scalar::<_, String>("SELECT username FROM global.users WHERE id = $1")
                .bind(target_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(UserError::NotFound)?;

        let inserted = sqlx::query(
            "INSERT INTO global.follows (follower_id, followee_id) VALUES ($1, $2)",
        )
        .bind(user_id)
        .bind(target_id)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                return Err(UserError::AlreadyFollowing);
            }
            Err(e) => return Err(e.into()),
        }

        info!("User {} now follows {}", user_id, target_id);

        // Fire-and-forget follow notification
        let notification_service = self.notification_service.clone();
        tokio::spawn(async move {
            if let Err(e) = notification_service
                .create(target_id, user_id, NotificationType::Follow, None)
                .await
            {
                error!("Failed to send follow notification: {:?}", e);
            }
        });

        Ok(target_username)
    }

    pub async fn unfollow(&self, user_id: Uuid, target_id: Uuid) -> Result<String, UserError> {
        let target_username =
            sqlx::query_scalar::<_, String>("SELECT username FROM global.users WHERE id = $1")
                .bind(target_id)
                .fetch_optional(&self.pool)
                .await?
                .ok_or(UserError::NotFound)?;

        let result = sqlx::query(
            "DELETE FROM global.follows WHERE follower_id = $1 AND followee_id = $2",
        )
        .bind(user_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFollowing);
        }

        info!("User {} unfollowed {}", user_id, target_id);
        Ok(target_username)
    }

    /// Followers of a user, in follow order.
    pub async fn followers(&self, user_id: Uuid) -> Result<Vec<UserSummary>, UserError> {
        self.fetch_user(user_id).await?;

        let followers = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.profile_image, u.is_verified
            FROM global.follows f
            JOIN global.users u ON u.id = f.follower_id
            WHERE f.followee_id = $1
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(followers)
    }

    /// Users someone follows, in follow order.
    pub async fn following(&self, user_id: Uuid) -> Result<Vec<UserSummary>, UserError> {
        self.fetch_user(user_id).await?;

        let following = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT u.id, u.username, u.full_name, u.profile_image, u.is_verified
            FROM global.follows f
            JOIN global.users u ON u.id = f.followee_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(following)
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

    fn service(pool: &PgPool) -> UserService {
        let notifications = Arc::new(NotificationService::new(pool.clone(), None));
        UserService::new(pool.clone(), notifications)
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

    #[tokio::test]
    #[ignore]
    async fn test_self_follow_rejected() {
        let pool = test_pool().await;
        let users = service(&pool);
        let a = create_user(&pool).await;

        assert!(matches!(
            users.follow(a, a).await.unwrap_err(),
            UserError::SelfFollow
        ));
    }

    #[tokio::test]
    #[ignore]
    async fn test_duplicate_follow_is_conflict_and_leaves_graph_unchanged() {
        let pool = test_pool().await;
        let users = service(&pool);
        let a = create_user(&pool).await;
        let b = create_user(&pool).await;

        users.follow(a, b).await.unwrap();
        assert!(matches!(
            users.follow(a, b).await.unwrap_err(),
            UserError::AlreadyFollowing
        ));

        let followers = users.followers(b).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, a);
    }

    #[tokio::test]
    #[ignore]
    async fn test_unfollow_without_follow_is_conflict() {
        let pool = test_pool().await;
        let users = service(&pool);
        let a = create_user(&pool).await;
        let b = create_user(&pool).await;

        assert!(matches!(
            users.unfollow(a, b).await.unwrap_err(),
            UserError::NotFollowing
        ));
        assert!(users.followers(b).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore]
    async fn test_follow_then_unfollow_restores_graph() {
        let pool = test_pool().await;
        let users = service(&pool);
        let a = create_user(&pool).await;
        let b = create_user(&pool).await;

        users.follow(a, b).await.unwrap();

        // One relationship row serves both directions
        assert_eq!(users.followers(b).await.unwrap().len(), 1);
        assert_eq!(users.following(a).await.unwrap().len(), 1);

        users.unfollow(a, b).await.unwrap();

        assert!(users.followers(b).await.unwrap().is_empty());
        assert!(users.following(a).await.unwrap().is_empty());

        let profile = users.get_profile(b).await.unwrap();
        assert_eq!(profile.followers_count, 0);
    }

    #[tokio::test]
    #[ignore]
    async fn test_follow_missing_user_not_found() {
        let pool = test_pool().await;
        let users = service(&pool);
        let a = create_user(&pool).await;

        assert!(matches!(
            users.follow(a, Uuid::new_v4()).await.unwrap_err(),
            UserError::NotFound
        ));
    }
}
