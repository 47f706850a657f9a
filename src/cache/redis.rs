use redis::{AsyncCommands, Client, RedisError};
use tracing::info;

/// Channel prefix for per-user notification delivery.
pub const NOTIFICATION_CHANNEL_PREFIX: &str = "notifications:user";

/// Thin wrapper around the Redis client.
///
/// Redis is used here purely as the transport to the real-time delivery
/// collaborator: notification payloads are published to a per-user channel
/// and whatever is subscribed on the other side handles fan-out. Publishing
/// is always best-effort.
#[derive(Debug, Clone)]
pub struct RedisCache {
    client: Client,
}

impl RedisCache {
    pub fn new(client: Client) -> Self {
        // Connection validation happens on first use
        Self { client }
    }

    pub fn get_client(&self) -> &Client {
        &self.client
    }

    /// Publish a JSON payload to a user's notification channel.
    pub async fn publish_notification(
        &self,
        user_id: &uuid::Uuid,
        json_payload: &str,
    ) -> Result<(), RedisError> {
        let channel = format!("{}:{}", NOTIFICATION_CHANNEL_PREFIX, user_id);
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.publish::<_, _, ()>(&channel, json_payload).await?;
        info!("Published notification to channel {}", channel);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_channel_format() {
        let user_id = uuid::Uuid::parse_str("123e4567-e89b-12d3-a456-426614174000").unwrap();
        let channel = format!("{}:{}", NOTIFICATION_CHANNEL_PREFIX, user_id);
        assert_eq!(
            channel,
            "notifications:user:123e4567-e89b-12d3-a456-426614174000"
        );
    }
}
