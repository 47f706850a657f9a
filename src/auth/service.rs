use argon2::{
    password_hash::PasswordVerifier,
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::http::StatusCode;
use sqlx::PgPool;
use tracing::{error, info};
use uuid::Uuid;

use super::jwt::{generate_token, Role};

const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_USERNAME_LENGTH: usize = 30;

// Input data structures
pub struct RegisterData {
    pub username: String,
    pub password: String,
    pub full_name: String,
}

pub struct LoginData {
    pub username: String,
    pub password: String,
}

// Result data structure
pub struct AuthResult {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: String,
    pub role: String,
    pub token: String,
}

// Service errors
#[derive(Debug)]
pub enum AuthError {
    InvalidInput(String),
    AlreadyExists(String),
    InvalidCredentials,
    DatabaseError(String),
    TokenError,
    InternalError(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyExists(_) => StatusCode::CONFLICT,
            Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::DatabaseError(_) | Self::TokenError | Self::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(msg) => msg.clone(),
            Self::AlreadyExists(msg) => msg.clone(),
            Self::InvalidCredentials => "Invalid username or password".to_string(),
            Self::DatabaseError(_) => "Internal server error".to_string(),
            Self::TokenError => "Failed to generate auth token".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
        }
    }
}

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(format!(
            "Username must be at most {} characters",
            MAX_USERNAME_LENGTH
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err("Username may only contain letters, digits, '_' and '.'".to_string());
    }
    Ok(())
}

/// Hash a password with a fresh salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Password hashing failed: {}", e);
            AuthError::InternalError(format!("Password hashing failed: {}", e))
        })
}

// User registration service
pub async fn register(pool: &PgPool, data: RegisterData) -> Result<AuthResult, AuthError> {
    // Validate input
    validate_username(&data.username).map_err(AuthError::InvalidInput)?;

    if data.password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::InvalidInput(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }

    if data.full_name.trim().is_empty() {
        return Err(AuthError::InvalidInput(
            "Full name is required".to_string(),
        ));
    }

    // Usernames are stored lowercase
    let username = data.username.to_lowercase();

    let existing_user =
        sqlx::query_as::<_, (Uuid,)>("SELECT id FROM global.users WHERE username = $1")
            .bind(&username)
            .fetch_optional(pool)
            .await
            .map_err(|e| {
                error!("Database error while checking existing user: {}", e);
                AuthError::DatabaseError(e.to_string())
            })?;

    if existing_user.is_some() {
        return Err(AuthError::AlreadyExists(
            "Username already in use".to_string(),
        ));
    }

    let password_hash = hash_password(&data.password)?;

    // Accounts always start as plain users; admins are promoted out of band.
    let role = Role::User;

    let user_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO global.users (id, username, password_hash, full_name, role) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(user_id)
    .bind(&username)
    .bind(&password_hash)
    .bind(data.full_name.trim())
    .bind(role.as_str())
    .execute(pool)
    .await
    .map_err(|e| {
        error!("Failed to insert new user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    info!("User created successfully with ID: {}", user_id);

    let token = generate_token(&user_id, role).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    Ok(AuthResult {
        user_id,
        username,
        full_name: data.full_name.trim().to_string(),
        role: role.as_str().to_string(),
        token,
    })
}

// User login service
pub async fn login(pool: &PgPool, data: LoginData) -> Result<AuthResult, AuthError> {
    let username = data.username.to_lowercase();
    info!("Attempting login for user: {}", username);

    let user = sqlx::query_as::<_, (Uuid, String, String, String, String)>(
        "SELECT id, username, full_name, password_hash, role FROM global.users WHERE username = $1",
    )
    .bind(&username)
    .fetch_optional(pool)
    .await
    .map_err(|e| {
        error!("Database error while fetching user: {}", e);
        AuthError::DatabaseError(e.to_string())
    })?;

    let (user_id, username, full_name, password_hash, role_str) = match user {
        Some(user) => user,
        None => return Err(AuthError::InvalidCredentials),
    };

    // Verify password
    let parsed_hash = argon2::password_hash::PasswordHash::new(&password_hash).map_err(|e| {
        error!("Failed to parse password hash: {}", e);
        AuthError::InvalidCredentials
    })?;

    Argon2::default()
        .verify_password(data.password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)?;

    let role = Role::from_str(&role_str).map_err(|e| {
        error!("Invalid role stored for user {}: {}", user_id, e);
        AuthError::InternalError(e)
    })?;

    let token = generate_token(&user_id, role).map_err(|e| {
        error!("Token generation failed: {:?}", e);
        AuthError::TokenError
    })?;

    info!("Login successful for user ID: {}", user_id);

    Ok(AuthResult {
        user_id,
        username,
        full_name,
        role: role_str,
        token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jane_doe.99").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("has spaces").is_err());
        assert!(validate_username(&"x".repeat(31)).is_err());
        assert!(validate_username(&"x".repeat(30)).is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("hunter2secret").expect("hashing failed");
        let parsed = argon2::password_hash::PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"hunter2secret", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong-password", &parsed)
            .is_err());
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(
            AuthError::InvalidInput(String::new()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::AlreadyExists(String::new()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::DatabaseError(String::new()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_sanitized_error_messages() {
        // Store failures must never leak detail to clients
        let msg = AuthError::DatabaseError("connection refused at 10.0.0.5".to_string()).message();
        assert_eq!(msg, "Internal server error");
    }
}
