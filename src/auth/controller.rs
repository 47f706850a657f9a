use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info};
use utoipa::ToSchema;

use super::service::{self, AuthError, AuthResult, LoginData, RegisterData};
use crate::response::ApiResponse;

// Request DTOs
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[schema(example = "jane_doe")]
    pub username: String,
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub token: String,
}

fn to_response(result: AuthResult) -> AuthResponse {
    AuthResponse {
        user_id: result.user_id.to_string(),
        username: result.username,
        full_name: result.full_name,
        role: result.role,
        token: result.token,
    }
}

fn handle_error(err: AuthError) -> Response {
    let status = err.status_code();
    let message = err.message();

    if status == StatusCode::INTERNAL_SERVER_ERROR {
        error!("Auth internal error: {}", message);
    } else {
        info!("Auth error: {} ({})", message, status);
    }

    let code = match err {
        AuthError::InvalidInput(_) => "VALIDATION_ERROR",
        AuthError::AlreadyExists(_) => "ALREADY_EXISTS",
        AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
        _ => "INTERNAL_ERROR",
    };

    (status, Json(ApiResponse::failure(message, code))).into_response()
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered successfully", body = AuthResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username already in use")
    ),
    tag = "authentication"
)]
pub async fn register(State(pool): State<PgPool>, Json(req): Json<RegisterRequest>) -> Response {
    info!("Registration request received for username: {}", req.username);

    let data = RegisterData {
        username: req.username,
        password: req.password,
        full_name: req.full_name,
    };

    match service::register(&pool, data).await {
        Ok(result) => {
            let response = to_response(result);
            info!("User registered successfully: {}", response.user_id);
            (
                StatusCode::CREATED,
                Json(ApiResponse::with_message(
                    "User registered successfully",
                    response,
                )),
            )
                .into_response()
        }
        Err(error) => handle_error(error),
    }
}

/// Login with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "authentication"
)]
pub async fn login(State(pool): State<PgPool>, Json(req): Json<LoginRequest>) -> Response {
    info!("Login request received for username: {}", req.username);

    let data = LoginData {
        username: req.username,
        password: req.password,
    };

    match service::login(&pool, data).await {
        Ok(result) => {
            let response = to_response(result);
            info!("User login successful: {}", response.user_id);
            (
                StatusCode::OK,
                Json(ApiResponse::with_message("Login successful", response)),
            )
                .into_response()
        }
        Err(error) => handle_error(error),
    }
}
