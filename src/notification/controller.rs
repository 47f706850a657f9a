use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::auth::middleware::AuthUser;
use crate::notification::model::{NotificationError, NotificationResponse};
use crate::notification::service::{NotificationService, NOTIFICATIONS_PER_PAGE};
use crate::pagination::{PageMeta, PageQuery, Pagination};
use crate::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub pagination: PageMeta,
}

fn notification_error_to_response(err: NotificationError) -> Response {
    let (status, message, code) = match err {
        NotificationError::NotFound => {
            (StatusCode::NOT_FOUND, "Notification not found", "NOT_FOUND")
        }
        NotificationError::Forbidden => (
            StatusCode::FORBIDDEN,
            "Not authorized to perform this action",
            "FORBIDDEN",
        ),
        NotificationError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
        NotificationError::InternalError(msg) => {
            error!("Internal error: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
    };

    (status, Json(ApiResponse::failure(message, code))).into_response()
}

/// Get the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/notifications",
    params(PageQuery),
    responses(
        (status = 200, description = "Notifications retrieved successfully", body = NotificationsListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn get_notifications(
    user: AuthUser,
    Extension(notification_service): Extension<Arc<NotificationService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, NOTIFICATIONS_PER_PAGE);

    match notification_service.list_for(user.user_id, pagination).await {
        Ok((notifications, total)) => {
            let response = NotificationsListResponse {
                notifications,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => {
            error!("Error fetching notifications: {:?}", e);
            notification_error_to_response(e)
        }
    }
}

/// Mark one of the caller's notifications as read
#[utoipa::path(
    put,
    path = "/api/notifications/{id}/read",
    params(
        ("id" = i64, Path, description = "The ID of the notification to mark read")
    ),
    responses(
        (status = 200, description = "Notification marked as read"),
        (status = 403, description = "Notification belongs to another user"),
        (status = 404, description = "Notification not found")
    ),
    security(("bearer_auth" = [])),
    tag = "notifications"
)]
pub async fn mark_notification_read(
    Path(notification_id): Path<i64>,
    user: AuthUser,
    Extension(notification_service): Extension<Arc<NotificationService>>,
) -> Response {
    info!(
        "Marking notification {} as read for user {}",
        notification_id, user.user_id
    );

    match notification_service
        .mark_as_read(notification_id, user.user_id)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::message_only("Notification marked as read")),
        )
            .into_response(),
        Err(e) => notification_error_to_response(e),
    }
}
