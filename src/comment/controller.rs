use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::comment::model::{
    CommentError, CommentResponse, CreateCommentRequest, UpdateCommentRequest,
};
use crate::comment::service::{CommentService, COMMENTS_PER_PAGE};
use crate::pagination::{PageMeta, PageQuery, Pagination};
use crate::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentsListResponse {
    pub comments: Vec<CommentResponse>,
    pub pagination: PageMeta,
}

fn comment_error_to_response(err: CommentError) -> Response {
    let (status, message, code) = match &err {
        CommentError::NotFound => (StatusCode::NOT_FOUND, "Comment not found", "NOT_FOUND"),
        CommentError::PostNotFound => {
            (StatusCode::NOT_FOUND, "Post not found", "POST_NOT_FOUND")
        }
        CommentError::UserNotFound => {
            (StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND")
        }
        CommentError::Forbidden => (
            StatusCode::FORBIDDEN,
            "Not authorized to perform this action",
            "FORBIDDEN",
        ),
        CommentError::ValidationError(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(msg.clone(), "VALIDATION_ERROR")),
            )
                .into_response();
        }
        CommentError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
        CommentError::InternalError(msg) => {
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

/// Create a new comment on a post
#[utoipa::path(
    post,
    path = "/api/comments",
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Comment created successfully", body = CommentResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn create_comment(
    user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Json(request): Json<CreateCommentRequest>,
) -> Response {
    info!(
        "Creating comment for post: {}, user: {}",
        request.post_id, user.user_id
    );

    match comment_service
        .create_comment(user.user_id, request.post_id, &request.content)
        .await
    {
        Ok(comment) => {
            info!("Successfully created comment with ID: {}", comment.id);
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message(
                    "Comment created successfully",
                    comment,
                )),
            )
                .into_response()
        }
        Err(e) => comment_error_to_response(e),
    }
}

/// Get a post's comment thread
///
/// Oldest first, unlike every other listing: threads read chronologically.
#[utoipa::path(
    get,
    path = "/api/posts/{id}/comments",
    params(
        ("id" = i64, Path, description = "The ID of the post to get comments for"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = CommentsListResponse),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn get_post_comments(
    Path(post_id): Path<i64>,
    _user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, COMMENTS_PER_PAGE);

    match comment_service.get_post_comments(post_id, pagination).await {
        Ok((comments, total)) => {
            let response = CommentsListResponse {
                comments,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => comment_error_to_response(e),
    }
}

/// Get a single comment
#[utoipa::path(
    get,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment retrieved successfully", body = CommentResponse),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn get_comment(
    Path(comment_id): Path<i64>,
    _user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
) -> Response {
    match comment_service.get_comment(comment_id).await {
        Ok(comment) => (StatusCode::OK, Json(ApiResponse::data(comment))).into_response(),
        Err(e) => comment_error_to_response(e),
    }
}

/// Edit a comment (author only)
#[utoipa::path(
    put,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = UpdateCommentRequest,
    responses(
        (status = 200, description = "Comment updated successfully", body = CommentResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the comment author"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn update_comment(
    Path(comment_id): Path<i64>,
    user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Json(request): Json<UpdateCommentRequest>,
) -> Response {
    info!(
        "Updating comment {}, requested by user {}",
        comment_id, user.user_id
    );

    match comment_service
        .update_comment(comment_id, user.user_id, &request.content)
        .await
    {
        Ok(comment) => (
            StatusCode::OK,
            Json(ApiResponse::with_message(
                "Comment updated successfully",
                comment,
            )),
        )
            .into_response(),
        Err(e) => comment_error_to_response(e),
    }
}

/// Delete a comment and its likes
///
/// Author or admin.
#[utoipa::path(
    delete,
    path = "/api/comments/{id}",
    params(("id" = i64, Path, description = "The ID of the comment to delete")),
    responses(
        (status = 200, description = "Comment deleted successfully"),
        (status = 403, description = "Not the comment author or an admin"),
        (status = 404, description = "Comment not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn delete_comment(
    Path(comment_id): Path<i64>,
    user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
) -> Response {
    info!(
        "Deleting comment: {}, requested by user: {}",
        comment_id, user.user_id
    );

    match comment_service
        .delete_comment(comment_id, user.user_id, user.is_admin())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::message_only("Comment deleted successfully")),
        )
            .into_response(),
        Err(e) => comment_error_to_response(e),
    }
}

/// Get a user's comments across all posts, newest first
#[utoipa::path(
    get,
    path = "/api/users/{id}/comments",
    params(
        ("id" = String, Path, description = "User ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Comments retrieved successfully", body = CommentsListResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "comments"
)]
pub async fn get_user_comments(
    Path(user_id): Path<Uuid>,
    _user: AuthUser,
    Extension(comment_service): Extension<Arc<CommentService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, COMMENTS_PER_PAGE);

    match comment_service.get_user_comments(user_id, pagination).await {
        Ok((comments, total)) => {
            let response = CommentsListResponse {
                comments,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => comment_error_to_response(e),
    }
}
