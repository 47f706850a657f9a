use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::post::controller::{
    create_post, delete_post, get_feed, get_post, get_user_posts, update_post,
};
use crate::post::service::PostService;

/// Create a router for post routes
pub fn routes(post_service: Arc<PostService>) -> Router {
    Router::new()
        .route("/api/posts", post(create_post))
        .route("/api/posts", get(get_feed))
        .route("/api/posts/:id", get(get_post))
        .route("/api/posts/:id", put(update_post))
        .route("/api/posts/:id", delete(delete_post))
        .route("/api/users/:id/posts", get(get_user_posts))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(post_service))
}
