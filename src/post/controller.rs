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
use crate::pagination::{PageMeta, PageQuery, Pagination};
use crate::post::model::{CreatePostRequest, PostError, PostResponse, UpdatePostRequest};
use crate::post::service::{PostService, FEED_POSTS_PER_PAGE, USER_POSTS_PER_PAGE};
use crate::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostsListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: PageMeta,
}

fn post_error_to_response(err: PostError) -> Response {
    let (status, message, code) = match &err {
        PostError::NotFound => (StatusCode::NOT_FOUND, "Post not found", "NOT_FOUND"),
        PostError::UserNotFound => (StatusCode::NOT_FOUND, "User not found", "USER_NOT_FOUND"),
        PostError::Forbidden => (
            StatusCode::FORBIDDEN,
            "Not authorized to perform this action",
            "FORBIDDEN",
        ),
        PostError::ValidationError(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(msg.clone(), "VALIDATION_ERROR")),
            )
                .into_response();
        }
        PostError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
        PostError::InternalError(msg) => {
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

/// Create a new post
///
/// Media descriptors must already be resolved to CDN URLs; a post carries
/// between 1 and 10 of them.
#[utoipa::path(
    post,
    path = "/api/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created successfully", body = PostResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn create_post(
    user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
    Json(request): Json<CreatePostRequest>,
) -> Response {
    info!("Creating post for user {}", user.user_id);

    match post_service.create_post(user.user_id, request).await {
        Ok(post) => {
            info!("Successfully created post with ID: {}", post.id);
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message("Post created successfully", post)),
            )
                .into_response()
        }
        Err(e) => post_error_to_response(e),
    }
}

/// Get the caller's feed
///
/// Posts by the caller and everyone they follow, newest first.
#[utoipa::path(
    get,
    path = "/api/posts",
    params(PageQuery),
    responses(
        (status = 200, description = "Feed retrieved successfully", body = PostsListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_feed(
    user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, FEED_POSTS_PER_PAGE);

    match post_service.get_feed(user.user_id, pagination).await {
        Ok((posts, total)) => {
            let response = PostsListResponse {
                posts,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => post_error_to_response(e),
    }
}

/// Get a single post with its media and counts
#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post retrieved successfully", body = PostResponse),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_post(
    Path(post_id): Path<i64>,
    _user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
) -> Response {
    match post_service.get_post(post_id).await {
        Ok(post) => (StatusCode::OK, Json(ApiResponse::data(post))).into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Get a user's posts, newest first
#[utoipa::path(
    get,
    path = "/api/users/{id}/posts",
    params(
        ("id" = String, Path, description = "User ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Posts retrieved successfully", body = PostsListResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn get_user_posts(
    Path(user_id): Path<Uuid>,
    _user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
    Query(query): Query<PageQuery>,
) -> Response {
    let pagination = Pagination::from_query(&query, USER_POSTS_PER_PAGE);

    match post_service.get_user_posts(user_id, pagination).await {
        Ok((posts, total)) => {
            let response = PostsListResponse {
                posts,
                pagination: PageMeta::new(pagination, total),
            };
            (StatusCode::OK, Json(ApiResponse::data(response))).into_response()
        }
        Err(e) => post_error_to_response(e),
    }
}

/// Update a post's caption (owner only)
#[utoipa::path(
    put,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = UpdatePostRequest,
    responses(
        (status = 200, description = "Post updated successfully", body = PostResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Not the post owner"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn update_post(
    Path(post_id): Path<i64>,
    user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
    Json(request): Json<UpdatePostRequest>,
) -> Response {
    info!("Updating post {} for user {}", post_id, user.user_id);

    match post_service
        .update_post(post_id, user.user_id, &request.caption)
        .await
    {
        Ok(post) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("Post updated successfully", post)),
        )
            .into_response(),
        Err(e) => post_error_to_response(e),
    }
}

/// Delete a post and everything attached to it
///
/// Owner or admin. Media, comments and likes (including likes on the
/// cascaded comments) all go in one transaction.
#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post deleted successfully"),
        (status = 403, description = "Not the post owner or an admin"),
        (status = 404, description = "Post not found")
    ),
    security(("bearer_auth" = [])),
    tag = "posts"
)]
pub async fn delete_post(
    Path(post_id): Path<i64>,
    user: AuthUser,
    Extension(post_service): Extension<Arc<PostService>>,
) -> Response {
    info!("Deleting post {}, requested by user {}", post_id, user.user_id);

    match post_service
        .delete_post(post_id, user.user_id, user.is_admin())
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::message_only("Post deleted successfully")),
        )
            .into_response(),
        Err(e) => post_error_to_response(e),
    }
}
