use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::user::controller::{
    delete_account, follow_user, get_followers, get_following, get_my_profile, get_user_profile,
    unfollow_user, update_profile,
};
use crate::user::service::UserService;

/// Create a router for user profile and social graph routes
pub fn routes(user_service: Arc<UserService>) -> Router {
    Router::new()
        // Order matters here - more specific routes first
        .route("/api/users/me", get(get_my_profile))
        .route("/api/users/me", put(update_profile))
        .route("/api/users/me", delete(delete_account))
        .route("/api/users/:id", get(get_user_profile))
        .route("/api/users/:id/follow", post(follow_user))
        .route("/api/users/:id/unfollow", post(unfollow_user))
        .route("/api/users/:id/followers", get(get_followers))
        .route("/api/users/:id/following", get(get_following))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(user_service))
}
