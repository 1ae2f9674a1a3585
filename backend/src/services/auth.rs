//! Authentication service for admin login and session tokens

use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    db: PgPool,
    jwt_secret: String,
    access_token_expiry: i64,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub username: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Session token issued on login
#[derive(Debug, Serialize)]
pub struct SessionToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// User info from database
#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AuthService {
    /// Create a new AuthService instance
    pub fn new(db: PgPool, config: &Config) -> Self {
        Self {
            db,
            jwt_secret: config.jwt.secret.clone(),
            access_token_expiry: config.jwt.access_token_expiry,
        }
    }

    /// Authenticate a user with username and password.
    ///
    /// Unknown users, inactive users and wrong passwords all fail with the
    /// same `InvalidCredentials` error.
    pub async fn login(&self, username: &str, password: &str) -> AppResult<SessionToken> {
        let user = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, password_hash, is_active, is_staff, is_superuser
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

        if !user.is_active {
            tracing::debug!(%username, "Login attempt for inactive user");
            return Err(AppError::InvalidCredentials);
        }

        let valid = verify(password, &user.password_hash)
            .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))?;

        if !valid {
            return Err(AppError::InvalidCredentials);
        }

        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = $1")
            .bind(user.id)
            .execute(&self.db)
            .await?;

        tracing::info!(user_id = %user.id, %username, "User logged in");
        self.generate_token(&user)
    }

    /// Validate a session token and return its claims
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AppError::TokenExpired,
            _ => AppError::InvalidToken,
        })?;

        Ok(token_data.claims)
    }

    /// Create the configured administrator unless the username is taken
    pub async fn ensure_admin_user(&self, username: &str, password: &str) -> AppResult<()> {
        shared::validate_username(username).map_err(|m| AppError::invalid("username", m))?;
        shared::validate_password(password).map_err(|m| AppError::invalid("password", m))?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.db)
        .await?;

        if exists {
            tracing::debug!(%username, "Admin user already present");
            return Ok(());
        }

        let password_hash = hash(password, DEFAULT_COST)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, is_active, is_staff, is_superuser)
            VALUES ($1, $2, TRUE, TRUE, TRUE)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(username)
        .bind(&password_hash)
        .execute(&self.db)
        .await?;

        tracing::info!(%username, "Admin user created");
        Ok(())
    }

    /// Generate a signed session token for a user
    fn generate_token(&self, user: &UserRow) -> AppResult<SessionToken> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.access_token_expiry);

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))?;

        Ok(SessionToken {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }
}
