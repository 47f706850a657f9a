use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

use crate::auth::middleware::AuthUser;
use crate::like::model::{
    LikeError, LikeWithUser, RecentLike, TargetType, ToggleLikeRequest,
};
use crate::like::service::{LikeService, LIKES_PER_PAGE, RECENT_LIKES_LIMIT};
use crate::pagination::{PageMeta, PageQuery, Pagination};
use crate::post::model::LikedPostResponse;
use crate::post::service::{PostService, LIKED_POSTS_PER_PAGE};
use crate::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikesListResponse {
    pub likes: Vec<LikeWithUser>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikedPostsResponse {
    pub liked_posts: Vec<LikedPostResponse>,
    pub pagination: PageMeta,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentLikesResponse {
    pub recent_likes: Vec<RecentLike>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct RecentLikesQuery {
    #[param(example = "20")]
    limit: Option<String>,
}

fn like_error_to_response(err: LikeError) -> Response {
    let (status, message, code) = match &err {
        LikeError::InvalidTargetType => (
            StatusCode::BAD_REQUEST,
            "Target type must be either \"post\" or \"comment\"",
            "INVALID_TARGET_TYPE",
        ),
        LikeError::PostNotFound => (StatusCode::NOT_FOUND, "Post not found", "POST_NOT_FOUND"),
        LikeError::CommentNotFound => (
            StatusCode::NOT_FOUND,
            "Comment not found",
            "COMMENT_NOT_FOUND",
        ),
        LikeError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
        LikeError::InternalError(msg) => {
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

/// Like or unlike a post or comment
///
/// Toggles presence of the caller's like on the target and returns the
/// settled state with a freshly computed count.
#[utoipa::path(
    post,
    path = "/api/likes",
    request_body = ToggleLikeRequest,
    responses(
        (status = 200, description = "Like toggled", body = LikeStateResponse),
        (status = 400, description = "Invalid target type"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Target not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn toggle_like(
    user: AuthUser,
    Extension(like_service): Extension<Arc<LikeService>>,
    Json(request): Json<ToggleLikeRequest>,
) -> Response {
    info!(
        "User {} toggling like on {} {}",
        user.user_id, request.target_type, request.target_id
    );

    match like_service
        .toggle_like(user.user_id, request.target_id, request.target_type)
        .await
    {
        Ok(state) => {
            let message = if state.is_liked {
                format!("{} liked successfully", state.target_type)
            } else {
                format!("{} unliked successfully", state.target_type)
            };
            (StatusCode::OK, Json(ApiResponse::with_message(message, state))).into_response()
        }
        Err(e) => like_error_to_response(e),
    }
}

/// List who liked a post or comment, newest first
#[utoipa::path(
    get,
    path = "/api/likes/{targetType}/{targetId}",
    params(
        ("targetType" = String, Path, description = "\"post\" or \"comment\""),
        ("targetId" = i64, Path, description = "Target ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Likes retrieved successfully", body = LikesListResponse),
        (status = 400, description = "Invalid target type"),
        (status = 404, description = "Target not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn get_likes(
    Path((raw_target_type, target_id)): Path<(String, i64)>,
    _user: AuthUser,
    Extension(like_service): Extension<Arc<LikeService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let target_type = match TargetType::from_str(&raw_target_type) {
        Ok(target_type) => target_type,
        Err(e) => return like_error_to_response(e),
    };

    let pagination = Pagination::from_query(&query, LIKES_PER_PAGE);

    match like_service
        .list_likes(target_id, target_type, pagination)
        .await
    {
        Ok((likes, total)) => {
            let response = LikesListResponse {
                likes,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => like_error_to_response(e),
    }
}

/// Check whether the caller liked a target, with the live count
#[utoipa::path(
    get,
    path = "/api/likes/check/{targetType}/{targetId}",
    params(
        ("targetType" = String, Path, description = "\"post\" or \"comment\""),
        ("targetId" = i64, Path, description = "Target ID")
    ),
    responses(
        (status = 200, description = "Like state retrieved", body = LikeStateResponse),
        (status = 400, description = "Invalid target type"),
        (status = 404, description = "Target not found")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn check_like(
    Path((raw_target_type, target_id)): Path<(String, i64)>,
    user: AuthUser,
    Extension(like_service): Extension<Arc<LikeService>>,
) -> Response {
    let target_type = match TargetType::from_str(&raw_target_type) {
        Ok(target_type) => target_type,
        Err(e) => return like_error_to_response(e),
    };

    match like_service.check(user.user_id, target_id, target_type).await {
        Ok(state) => (StatusCode::OK, Json(ApiResponse::data(state))).into_response(),
        Err(e) => like_error_to_response(e),
    }
}

/// Posts the caller has liked, newest like first
#[utoipa::path(
    get,
    path = "/api/likes/me/posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Liked posts retrieved", body = LikedPostsResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn get_liked_posts(
    user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, LIKED_POSTS_PER_PAGE);

    match post_service.get_liked_posts(user.user_id, pagination).await {
        Ok((liked_posts, total)) => {
            let response = LikedPostsResponse {
                liked_posts,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => {
            error!("Error fetching liked posts: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::failure("Internal server error", "INTERNAL_ERROR")),
            )
                .into_response()
        }
    }
}

/// Latest likes on the caller's posts by other users
#[utoipa::path(
    get,
    path = "/api/likes/recent",
    params(RecentLikesQuery),
    responses(
        (status = 200, description = "Recent likes retrieved", body = RecentLikesResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn get_recent_likes(
    user: AuthUser,
    Extension(like_service): Extension<Arc<LikeService>>,
    Query(query): Query<RecentLikesQuery>,
) -> Response {
    let limit = query
        .limit
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v >= 1)
        .unwrap_or(RECENT_LIKES_LIMIT);

    match like_service.recent_likes(user.user_id, limit).await {
        Ok(recent_likes) => (
            StatusCode::OK,
            Json(ApiResponse::data(RecentLikesResponse { recent_likes })),
        )
            .into_response(),
        Err(e) => like_error_to_response(e),
    }
}

/// Aggregate like statistics for the caller
#[utoipa::path(
    get,
    path = "/api/likes/stats",
    responses(
        (status = 200, description = "Like statistics retrieved", body = LikeStats),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "likes"
)]
pub async fn get_like_stats(
    user: AuthUser,
    Extension(like_service): Extension<Arc<LikeService>>,
) -> Response {
    match like_service.like_stats(user.user_id).await {
        Ok(stats) => (StatusCode::OK, Json(ApiResponse::data(stats))).into_response(),
        Err(e) => like_error_to_response(e),
    }
}
