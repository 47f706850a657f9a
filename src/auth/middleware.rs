use axum::{
    async_trait,
    extract::FromRequestParts,
    headers::{authorization::Bearer, Authorization},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Json, Response},
    RequestPartsExt, TypedHeader,
};
use tracing::error;
use uuid::Uuid;

use super::jwt::{validate_token, Role};
use crate::response::ApiResponse;

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::failure(message, "UNAUTHORIZED")),
    )
        .into_response()
}

/// Authentication middleware to protect routes
pub async fn auth_middleware<B>(req: Request<B>, next: Next<B>) -> Result<Response, Response> {
    let (mut parts, body) = req.into_parts();

    // Extract the token from the Authorization header
    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(e) => {
            error!("Authorization header extraction failed: {:?}", e);
            return Err(unauthorized(
                "Missing or invalid Authorization header. Please provide a Bearer token",
            ));
        }
    };

    // Validate the token
    let claims = match validate_token(bearer.token()) {
        Ok(claims) => claims,
        Err(e) => {
            error!("Token validation failed: {:?}", e);
            return Err(unauthorized("Invalid token. Please login again"));
        }
    };

    // Parse the user ID
    let user_id = match Uuid::parse_str(&claims.sub) {
        Ok(user_id) => user_id,
        Err(e) => {
            error!("User ID parsing failed: {:?}", e);
            return Err(unauthorized("Invalid user identifier in token"));
        }
    };

    // Create AuthUser and insert into request extensions
    parts.extensions.insert(AuthUser {
        user_id,
        role: claims.role,
    });

    let req = Request::from_parts(parts, body);
    Ok(next.run(req).await)
}

/// Extractor for authenticated user
#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin() {
        let admin = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Admin,
        };
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::User,
        };
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
