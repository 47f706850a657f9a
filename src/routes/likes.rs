use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::like::controller::{
    check_like, get_like_stats, get_liked_posts, get_likes, get_recent_likes, toggle_like,
};
use crate::like::service::LikeService;
use crate::post::service::PostService;

/// Create a router for like routes
///
/// The liked-posts listing composes full post views, so this router carries
/// the post service alongside the like service.
pub fn routes(like_service: Arc<LikeService>, post_service: Arc<PostService>) -> Router {
    Router::new()
        .route("/api/likes", post(toggle_like))
        // Order matters here - more specific routes first
        .route("/api/likes/me/posts", get(get_liked_posts))
        .route("/api/likes/recent", get(get_recent_likes))
        .route("/api/likes/stats", get(get_like_stats))
        .route("/api/likes/check/:target_type/:target_id", get(check_like))
        .route("/api/likes/:target_type/:target_id", get(get_likes))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(like_service))
        .layer(axum::extract::Extension(post_service))
}
