use axum::{
    middleware,
    routing::{get, put},
    Router,
};
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::notification::controller::{get_notifications, mark_notification_read};
use crate::notification::service::NotificationService;

/// Create a router for notification routes
pub fn routes(notification_service: Arc<NotificationService>) -> Router {
    Router::new()
        .route("/api/notifications", get(get_notifications))
        .route("/api/notifications/:id/read", put(mark_notification_read))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(notification_service))
}
