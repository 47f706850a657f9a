use sqlx::{PgPool, Row};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::cache::redis::RedisCache;
use crate::notification::model::{
    Notification, NotificationError, NotificationResponse, NotificationType,
};
use crate::pagination::Pagination;
use crate::user::model::UserSummary;

pub const NOTIFICATIONS_PER_PAGE: i64 = 20;

#[derive(Debug, Clone)]
pub struct NotificationService {
    pool: PgPool,
    redis_cache: Option<RedisCache>,
}

impl NotificationService {
    pub fn new(pool: PgPool, redis_cache: Option<RedisCache>) -> Self {
        Self { pool, redis_cache }
    }

    /// Persist a notification and best-effort publish it to the receiver's
    /// real-time channel. Delivery failure is logged and swallowed; it must
    /// never fail the action that triggered the notification.
    pub async fn create(
        &self,
        receiver_id: Uuid,
        sender_id: Uuid,
        notification_type: NotificationType,
        entity_id: Option<i64>,
    ) -> Result<i64, NotificationError> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO global.notifications (receiver_id, sender_id, notification_type, entity_id)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(receiver_id)
        .bind(sender_id)
        .bind(notification_type.as_str())
        .bind(entity_id)
        .fetch_one(&self.pool)
        .await?;

        info!(
            "Created notification {} for receiver {} of type {:?}",
            notification.id, receiver_id, notification_type
        );

        if let Some(cache) = &self.redis_cache {
            // Join the sender in so the client can render without a roundtrip
            let sender = sqlx::query_as::<_, UserSummary>(
                "SELECT id, username, full_name, profile_image, is_verified FROM global.users WHERE id = $1",
            )
            .bind(sender_id)
            .fetch_one(&self.pool)
            .await?;

            let payload = NotificationResponse {
                id: notification.id,
                notification_type,
                sender,
                entity_id: notification.entity_id,
                is_read: notification.is_read,
                created_at: notification.created_at,
            };

            match serde_json::to_string(&payload) {
                Ok(json) => {
                    if let Err(e) = cache.publish_notification(&receiver_id, &json).await {
                        warn!("Failed to publish notification {}: {}", notification.id, e);
                    }
                }
                Err(e) => {
                    error!("Failed to serialize notification payload: {}", e);
                }
            }
        }

        Ok(notification.id)
    }

    /// Notifications for a receiver, newest first.
    pub async fn list_for(
        &self,
        receiver_id: Uuid,
        pagination: Pagination,
    ) -> Result<(Vec<NotificationResponse>, i64), NotificationError> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.notification_type, n.entity_id, n.is_read, n.created_at,
                   u.id as sender_id, u.username, u.full_name, u.profile_image, u.is_verified
            FROM global.notifications n
            JOIN global.users u ON u.id = n.sender_id
            WHERE n.receiver_id = $1
            ORDER BY n.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(receiver_id)
        .bind(pagination.limit)
        .bind(pagination.offset())
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_type: String = row.get("notification_type");
            let notification_type = NotificationType::from_str(&raw_type)
                .map_err(NotificationError::InternalError)?;

            notifications.push(NotificationResponse {
                id: row.get("id"),
                notification_type,
                sender: UserSummary {
                    id: row.get("sender_id"),
                    username: row.get("username"),
                    full_name: row.get("full_name"),
                    profile_image: row.get("profile_image"),
                    is_verified: row.get("is_verified"),
                },
                entity_id: row.get("entity_id"),
                is_read: row.get("is_read"),
                created_at: row.get("created_at"),
            });
        }

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM global.notifications WHERE receiver_id = $1",
        )
        .bind(receiver_id)
        .fetch_one(&self.pool)
        .await?;

        Ok((notifications, total))
    }

    /// Mark a notification read. Only its receiver may do so; the flag only
    /// ever goes false -> true.
    pub async fn mark_as_read(
        &self,
        notification_id: i64,
        user_id: Uuid,
    ) -> Result<(), NotificationError> {
        let receiver_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT receiver_id FROM global.notifications WHERE id = $1",
        )
        .bind(notification_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(NotificationError::NotFound)?;

        if receiver_id != user_id {
            return Err(NotificationError::Forbidden);
        }

        sqlx::query("UPDATE global.notifications SET is_read = true WHERE id = $1")
            .bind(notification_id)
            .execute(&self.pool)
            .await?;

        info!("Notification {} marked as read", notification_id);
        Ok(())
    }
}
