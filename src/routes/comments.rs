use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

use crate::auth::middleware::auth_middleware;
use crate::comment::controller::{
    create_comment, delete_comment, get_comment, get_post_comments, get_user_comments,
    update_comment,
};
use crate::comment::service::CommentService;

/// Create a router for comment routes
pub fn routes(comment_service: Arc<CommentService>) -> Router {
    Router::new()
        .route("/api/comments", post(create_comment))
        .route("/api/comments/:id", get(get_comment))
        .route("/api/comments/:id", put(update_comment))
        .route("/api/comments/:id", delete(delete_comment))
        .route("/api/posts/:id/comments", get(get_post_comments))
        .route("/api/users/:id/comments", get(get_user_comments))
        .route_layer(middleware::from_fn(auth_middleware))
        .layer(axum::extract::Extension(comment_service))
}
