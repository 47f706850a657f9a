use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::user::model::{UpdateProfileRequest, UserError};
use crate::user::service::UserService;

fn user_error_to_response(err: UserError) -> Response {
    let (status, message, code) = match &err {
        UserError::NotFound => (StatusCode::NOT_FOUND, "User not found", "NOT_FOUND"),
        UserError::SelfFollow => (
            StatusCode::BAD_REQUEST,
            "You cannot follow yourself",
            "SELF_FOLLOW",
        ),
        UserError::AlreadyFollowing => (
            StatusCode::BAD_REQUEST,
            "You already follow this user",
            "ALREADY_FOLLOWING",
        ),
        UserError::NotFollowing => (
            StatusCode::BAD_REQUEST,
            "You are not following this user",
            "NOT_FOLLOWING",
        ),
        UserError::UsernameTaken => (
            StatusCode::BAD_REQUEST,
            "Username already in use",
            "USERNAME_TAKEN",
        ),
        UserError::ValidationError(msg) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::failure(msg.clone(), "VALIDATION_ERROR")),
            )
                .into_response();
        }
        UserError::DatabaseError(e) => {
            error!("Database error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                "INTERNAL_ERROR",
            )
        }
        UserError::InternalError(msg) => {
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

/// Get the caller's own profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Profile retrieved successfully", body = UserProfile),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_my_profile(
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.get_profile(user.user_id).await {
        Ok(profile) => (StatusCode::OK, Json(ApiResponse::data(profile))).into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// Get any user's profile by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Profile retrieved successfully", body = UserProfile),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_user_profile(
    Path(user_id): Path<Uuid>,
    _user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.get_profile(user_id).await {
        Ok(profile) => (StatusCode::OK, Json(ApiResponse::data(profile))).into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// Update the caller's profile
#[utoipa::path(
    put,
    path = "/api/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn update_profile(
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
    Json(update): Json<UpdateProfileRequest>,
) -> Response {
    info!("Profile update requested by user {}", user.user_id);

    match user_service.update_profile(user.user_id, update).await {
        Ok(profile) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("Profile updated", profile)),
        )
            .into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// Delete the caller's account and all of its content
#[utoipa::path(
    delete,
    path = "/api/users/me",
    responses(
        (status = 200, description = "Account deleted"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn delete_account(
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    info!("Account deletion requested by user {}", user.user_id);

    match user_service.delete_account(user.user_id).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::message_only("Account deleted")),
        )
            .into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// Follow a user
#[utoipa::path(
    post,
    path = "/api/users/{id}/follow",
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Now following the user"),
        (status = 400, description = "Self-follow or already following"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn follow_user(
    Path(target_id): Path<Uuid>,
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.follow(user.user_id, target_id).await {
        Ok(username) => (
            StatusCode::OK,
            Json(ApiResponse::message_only(format!(
                "You are now following {}",
                username
            ))),
        )
            .into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// Unfollow a user
#[utoipa::path(
    post,
    path = "/api/users/{id}/unfollow",
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "No longer following the user"),
        (status = 400, description = "Not currently following"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn unfollow_user(
    Path(target_id): Path<Uuid>,
    user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.unfollow(user.user_id, target_id).await {
        Ok(username) => (
            StatusCode::OK,
            Json(ApiResponse::message_only(format!(
                "You unfollowed {}",
                username
            ))),
        )
            .into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// List a user's followers in follow order
#[utoipa::path(
    get,
    path = "/api/users/{id}/followers",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Followers retrieved", body = [UserSummary]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_followers(
    Path(user_id): Path<Uuid>,
    _user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.followers(user_id).await {
        Ok(followers) => (StatusCode::OK, Json(ApiResponse::data(followers))).into_response(),
        Err(e) => user_error_to_response(e),
    }
}

/// List who a user follows in follow order
#[utoipa::path(
    get,
    path = "/api/users/{id}/following",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "Following list retrieved", body = [UserSummary]),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn get_following(
    Path(user_id): Path<Uuid>,
    _user: AuthUser,
    Extension(user_service): Extension<Arc<UserService>>,
) -> Response {
    match user_service.following(user_id).await {
        Ok(following) => (StatusCode::OK, Json(ApiResponse::data(following))).into_response(),
        Err(e) => user_error_to_response(e),
    }
}
