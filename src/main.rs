mod api_doc;
mod auth;
mod cache;
mod comment;
mod db;
mod like;
mod notification;
mod pagination;
mod post;
mod response;
mod routes;
mod user;

use axum::{routing::get, Router};
use dotenv::dotenv;
use redis::Client;
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api_doc::ApiDoc;
use crate::cache::redis::RedisCache;
use crate::comment::service::CommentService;
use crate::like::service::LikeService;
use crate::notification::service::NotificationService;
use crate::post::service::PostService;
use crate::user::service::UserService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    tracing_subscriber::fmt::init();

    // Load .env file if it exists
    dotenv().ok();

    // Create connection pool
    let database_url = std::env::var("DATABASE_URL")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    // Check if the database is initialized
    if !db::check_db_initialized(&pool).await {
        db::init_db(&pool).await?;
    }

    // Redis is optional: without it, real-time notification delivery is
    // skipped and notifications are persisted only.
    let redis_cache = match std::env::var("REDIS_URL").ok() {
        Some(url) => {
            info!("Initializing Redis with URL: {}", url);
            match Client::open(url) {
                Ok(client) => Some(RedisCache::new(client)),
                Err(e) => {
                    error!("Failed to connect to Redis: {}", e);
                    None
                }
            }
        }
        None => {
            info!("No Redis URL configured, proceeding without real-time delivery");
            None
        }
    };

    // Create service instances
    let notification_service = Arc::new(NotificationService::new(
        pool.clone(),
        redis_cache.clone(),
    ));
    let like_service = Arc::new(LikeService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let user_service = Arc::new(UserService::new(
        pool.clone(),
        notification_service.clone(),
    ));
    let post_service = Arc::new(PostService::new(pool.clone(), like_service.clone()));
    let comment_service = Arc::new(CommentService::new(
        pool.clone(),
        like_service.clone(),
        notification_service.clone(),
    ));

    // Build the router
    let app = Router::new()
        // API documentation
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Health routes
        .merge(routes::health::routes(pool.clone()))
        // Auth routes
        .merge(routes::auth::routes(pool.clone()))
        // User and social graph routes
        .merge(routes::users::routes(user_service.clone()))
        // Post routes
        .merge(routes::posts::routes(post_service.clone()))
        // Comment routes
        .merge(routes::comments::routes(comment_service.clone()))
        // Like routes
        .merge(routes::likes::routes(
            like_service.clone(),
            post_service.clone(),
        ))
        // Notification routes
        .merge(routes::notifications::routes(notification_service.clone()))
        // Add welcome route
        .route("/", get(|| async { "Welcome to Social Feed Backend API" }))
        .layer(TraceLayer::new_for_http());

    // Try different ports
    let mut port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let max_tries = 5;
    for attempt in 1..=max_tries {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        match axum::Server::try_bind(&addr) {
            Ok(server) => {
                println!(
                    "🚀 Server started successfully at http://localhost:{}",
                    port
                );
                println!("📄 API Documentation: http://localhost:{}/docs", port);
                return server
                    .serve(app.into_make_service())
                    .await
                    .map_err(|e| e.into());
            }
            Err(_) => {
                if attempt == max_tries {
                    return Err("Failed to bind to any port".into());
                }
                port += 1;
            }
        }
    }

    Err("Failed to bind to any port".into())
}
