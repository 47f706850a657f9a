use axum::http::StatusCode;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User roles. Admins may delete any post or comment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn from_str(role: &str) -> Result<Self, String> {
        match role.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", role)),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// JWT Claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub role: Role,  // User role
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
}

/// Generate a JWT token for a user
pub fn generate_token(user_id: &Uuid, role: Role) -> Result<String, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let now = Utc::now();
    let expiry = now + Duration::days(7);

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: expiry.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .map_err(|_| JwtError::TokenCreation)
}

/// Validate a JWT token and extract claims
pub fn validate_token(token: &str) -> Result<Claims, JwtError> {
    let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| JwtError::MissingSecret)?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|_e| JwtError::InvalidToken)?;

    Ok(token_data.claims)
}

#[derive(Debug)]
pub enum JwtError {
    MissingSecret,
    TokenCreation,
    InvalidToken,
}

impl fmt::Display for JwtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JwtError::MissingSecret => write!(f, "JWT secret is missing or not set"),
            JwtError::TokenCreation => write!(f, "Failed to create JWT token"),
            JwtError::InvalidToken => write!(f, "Invalid or expired JWT token"),
        }
    }
}

impl From<JwtError> for StatusCode {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::MissingSecret => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::TokenCreation => StatusCode::INTERNAL_SERVER_ERROR,
            JwtError::InvalidToken => StatusCode::UNAUTHORIZED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_role_from_str() {
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("ADMIN").unwrap(), Role::Admin);
        assert!(Role::from_str("moderator").is_err());
    }

    #[test]
    fn test_role_as_str() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn test_token_roundtrip() {
        env::set_var("JWT_SECRET", "test_secret");

        let user_id = Uuid::new_v4();
        let token = generate_token(&user_id, Role::User).expect("Token generation failed");
        assert!(!token.is_empty());

        let claims = validate_token(&token).expect("Token validation failed");
        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.role, Role::User);
    }

    #[test]
    fn test_admin_role_survives_roundtrip() {
        env::set_var("JWT_SECRET", "test_secret");

        let user_id = Uuid::new_v4();
        let token = generate_token(&user_id, Role::Admin).unwrap();
        let claims = validate_token(&token).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        env::set_var("JWT_SECRET", "test_secret");

        for token in ["", "not.a.jwt.token", "missing.segments", "eyJhbGciOiJIUzI1NiJ9"] {
            let result = validate_token(token);
            assert!(result.is_err(), "Token '{}' should be rejected", token);
            match result {
                Err(JwtError::InvalidToken) => {}
                _ => panic!("Expected InvalidToken error for '{}'", token),
            }
        }
    }

    #[test]
    fn test_tampered_token_rejected() {
        env::set_var("JWT_SECRET", "test_secret");
        let user_id = Uuid::new_v4();

        let token = generate_token(&user_id, Role::User).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        assert_eq!(parts.len(), 3, "JWT should have 3 parts");

        let tampered = format!("{}.{}tampered.{}", parts[0], parts[1], parts[2]);
        assert!(matches!(validate_token(&tampered), Err(JwtError::InvalidToken)));
    }

    #[test]
    fn test_missing_secret() {
        env::remove_var("JWT_SECRET");
        let result = generate_token(&Uuid::new_v4(), Role::User);
        match result {
            Err(JwtError::MissingSecret) => {}
            _ => panic!("Expected MissingSecret error"),
        }
        env::set_var("JWT_SECRET", "test_secret");
    }

    #[test]
    fn test_jwt_error_status_codes() {
        assert_eq!(
            StatusCode::from(JwtError::MissingSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::TokenCreation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            StatusCode::from(JwtError::InvalidToken),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_claims_expiry_window() {
        env::set_var("JWT_SECRET", "test_secret");
        let user_id = Uuid::new_v4();

        let now = Utc::now().timestamp() as usize;
        let claims = validate_token(&generate_token(&user_id, Role::User).unwrap()).unwrap();

        assert!(
            claims.iat <= now + 1 && claims.iat >= now - 1,
            "Issued at time should be close to current time"
        );

        let expected_expiry = now + 7 * 24 * 60 * 60;
        assert!(
            claims.exp <= expected_expiry + 5 && claims.exp >= expected_expiry - 5,
            "Expiry should be approximately 7 days from now"
        );
    }
}
