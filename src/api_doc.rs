use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Security scheme configuration for OpenAPI
pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);

        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

/// API documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Social Feed Backend API",
        version = "0.1.0",
        description = "REST API for the social feed backend"
    ),
    paths(
        // Health check endpoints
        crate::routes::health::health_check,
        crate::routes::health::protected_health_check,
        // Authentication endpoints
        crate::auth::controller::register,
        crate::auth::controller::login,
        // User and social graph endpoints
        crate::user::controller::get_my_profile,
        crate::user::controller::get_user_profile,
        crate::user::controller::update_profile,
        crate::user::controller::delete_account,
        crate::user::controller::follow_user,
        crate::user::controller::unfollow_user,
        crate::user::controller::get_followers,
        crate::user::controller::get_following,
        // Post endpoints
        crate::post::controller::create_post,
        crate::post::controller::get_feed,
        crate::post::controller::get_post,
        crate::post::controller::get_user_posts,
        crate::post::controller::update_post,
        crate::post::controller::delete_post,
        // Comment endpoints
        crate::comment::controller::create_comment,
        crate::comment::controller::get_post_comments,
        crate::comment::controller::get_comment,
        crate::comment::controller::update_comment,
        crate::comment::controller::delete_comment,
        crate::comment::controller::get_user_comments,
        // Like endpoints
        crate::like::controller::toggle_like,
        crate::like::controller::get_likes,
        crate::like::controller::check_like,
        crate::like::controller::get_liked_posts,
        crate::like::controller::get_recent_likes,
        crate::like::controller::get_like_stats,
        // Notification endpoints
        crate::notification::controller::get_notifications,
        crate::notification::controller::mark_notification_read
    ),
    components(
        schemas(
            // Auth schemas
            crate::auth::controller::RegisterRequest,
            crate::auth::controller::LoginRequest,
            crate::auth::controller::AuthResponse,
            // Health schemas
            crate::routes::health::HealthResponse,
            // User schemas
            crate::user::model::UserSummary,
            crate::user::model::UserProfile,
            crate::user::model::UpdateProfileRequest,
            // Post schemas
            crate::post::model::MediaType,
            crate::post::model::MediaUpload,
            crate::post::model::MediaResponse,
            crate::post::model::CreatePostRequest,
            crate::post::model::UpdatePostRequest,
            crate::post::model::PostResponse,
            crate::post::model::LikedPostResponse,
            crate::post::controller::PostsListResponse,
            // Comment schemas
            crate::comment::model::CreateCommentRequest,
            crate::comment::model::UpdateCommentRequest,
            crate::comment::model::CommentResponse,
            crate::comment::controller::CommentsListResponse,
            // Like schemas
            crate::like::model::TargetType,
            crate::like::model::ToggleLikeRequest,
            crate::like::model::LikeStateResponse,
            crate::like::model::LikeWithUser,
            crate::like::model::PostBrief,
            crate::like::model::RecentLike,
            crate::like::model::LikeStats,
            crate::like::controller::LikesListResponse,
            crate::like::controller::LikedPostsResponse,
            crate::like::controller::RecentLikesResponse,
            // Notification schemas
            crate::notification::model::NotificationType,
            crate::notification::model::NotificationResponse,
            crate::notification::controller::NotificationsListResponse,
            // Shared schemas
            crate::pagination::PageMeta
        )
    ),
    tags(
        (name = "authentication", description = "Authentication endpoints"),
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "User profile and social graph endpoints"),
        (name = "posts", description = "Post management and feed endpoints"),
        (name = "comments", description = "Comment management endpoints"),
        (name = "likes", description = "Like and engagement endpoints"),
        (name = "notifications", description = "Notification endpoints")
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;
