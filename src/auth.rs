use actix_web::web;
use actix_web::HttpMessage;
use actix_web::{dev::ServiceRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use bcrypt::{hash, verify};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{map_unique_violation, ApiError, ApiResult};

// ======== USER MODEL ========

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

// ======== USER ROLE ========

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Admin,
    User,
}

impl UserRole {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "admin" => Some(UserRole::Admin),
            "user" => Some(UserRole::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::User => "user",
        }
    }

    pub fn can_update_reservation_status(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ======== REQUEST/RESPONSE STRUCTS ========

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub role: UserRole,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            role: UserRole::from_str(&user.role).unwrap_or(UserRole::User),
            username: user.username,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub username: String,
    pub role: UserRole,
    pub exp: i64,
    pub iat: i64,
}

// ======== AUTH SERVICE ========

pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiration_hours: i64,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(jwt_secret: &str, token_expiration_hours: i64, bcrypt_cost: u32) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiration_hours,
            bcrypt_cost,
        }
    }

    pub fn hash_password(&self, password: &str) -> ApiResult<String> {
        validate_password_strength(password)?;
        hash(password, self.bcrypt_cost)
            .map_err(|_| ApiError::InternalServerError("Failed to hash password".to_string()))
    }

    pub fn verify_password(&self, password: &str, hash: &str) -> ApiResult<bool> {
        verify(password, hash)
            .map_err(|_| ApiError::InternalServerError("Password verification failed".to_string()))
    }

    pub fn token_lifetime_seconds(&self) -> i64 {
        self.token_expiration_hours * 3600
    }

    pub fn generate_token(&self, user: &User) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.token_expiration_hours);

        let claims = Claims {
            sub: user.id.clone(),
            username: user.username.clone(),
            role: UserRole::from_str(&user.role).unwrap_or(UserRole::User),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| ApiError::AuthError("Failed to generate token".to_string()))
    }

    pub fn verify_token(&self, token: &str) -> ApiResult<Claims> {
        let validation = Validation::default();
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    ApiError::AuthError("Token expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::InvalidToken => {
                    ApiError::AuthError("Invalid token".to_string())
                }
                _ => ApiError::AuthError("Token verification failed".to_string()),
            })
    }
}

// ======== PASSWORD VALIDATION ========

fn validate_password_strength(password: &str) -> ApiResult<()> {
    if password.len() < 8 {
        return Err(ApiError::ValidationError(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(ApiError::ValidationError(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(ApiError::ValidationError(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ApiError::ValidationError(
            "Password must contain at least one digit".to_string(),
        ));
    }
    Ok(())
}

// ======== USER METHODS ========

impl User {
    pub async fn find_by_username(pool: &SqlitePool, username: &str) -> ApiResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_one(pool)
            .await
            .map_err(|_| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn create(
        pool: &SqlitePool,
        username: &str,
        password: &str,
        role: UserRole,
        auth_service: &AuthService,
    ) -> ApiResult<User> {
        let password_hash = auth_service.hash_password(password)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash,
            role: role.as_str().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.created_at)
        .execute(pool)
        .await
        .map_err(|e| map_unique_violation(e, ApiError::username_taken(username)))?;

        Ok(user)
    }
}

// ======== HELPER FUNCTIONS ========

pub fn get_current_user(req: &HttpRequest) -> ApiResult<Claims> {
    req.extensions()
        .get::<Claims>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("No user information found".to_string()))
}

pub fn check_permission<F>(claims: &Claims, check: F) -> ApiResult<()>
where
    F: Fn(&UserRole) -> bool,
{
    if check(&claims.role) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Insufficient permissions".to_string()))
    }
}

/// Shortcut for admin-only handlers.
pub fn require_admin(req: &HttpRequest) -> ApiResult<Claims> {
    let claims = get_current_user(req)?;
    if claims.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }
    Ok(claims)
}

// ======== JWT MIDDLEWARE ========

pub async fn jwt_middleware(
    req: ServiceRequest,
    credentials: BearerAuth,
) -> Result<ServiceRequest, (actix_web::Error, ServiceRequest)> {
    let token = credentials.token();

    let auth_service = match req.app_data::<web::Data<std::sync::Arc<AuthService>>>() {
        Some(svc) => svc,
        None => {
            log::error!("AuthService not found in app data");
            return Err((
                ApiError::InternalServerError("Auth service not available".to_string()).into(),
                req,
            ));
        }
    };

    match auth_service.verify_token(token) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(req)
        }
        Err(err) => {
            log::warn!("JWT verification failed: {}", err);
            Err((err.into(), req))
        }
    }
}

// ======== DEFAULT ADMIN ========

/// Create the initial admin account when the users table is empty. The
/// password comes from DEFAULT_ADMIN_PASSWORD or is generated and logged once.
pub async fn ensure_default_admin(pool: &SqlitePool, auth_service: &AuthService) -> ApiResult<()> {
    let user_count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    if user_count.0 > 0 {
        return Ok(());
    }

    let (password, generated) = match std::env::var("DEFAULT_ADMIN_PASSWORD") {
        Ok(p) if !p.is_empty() => (p, false),
        _ => (generate_admin_password(), true),
    };

    User::create(pool, "admin", &password, UserRole::Admin, auth_service).await?;

    if generated {
        log::warn!(
            "Created default admin account with generated password: {} (change it immediately)",
            password
        );
    } else {
        log::info!("Created default admin account");
    }

    Ok(())
}

fn generate_admin_password() -> String {
    use rand::{distributions::Alphanumeric, thread_rng, Rng};
    // Alphanumeric alone will not satisfy the strength check reliably,
    // so pin the required character classes.
    let tail: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(12)
        .map(char::from)
        .collect();
    format!("Aa1{}", tail)
}

// ======== TESTS ========

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AuthService {
        AuthService::new("test-secret-that-is-long-enough-000", 24, 4)
    }

    fn user_with_role(role: &str) -> User {
        User {
            id: "u-1".to_string(),
            username: "tester".to_string(),
            password_hash: String::new(),
            role: role.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn password_strength_rules() {
        assert!(validate_password_strength("Abcdef12").is_ok());
        assert!(validate_password_strength("short1A").is_err());
        assert!(validate_password_strength("alllowercase1").is_err());
        assert!(validate_password_strength("ALLUPPERCASE1").is_err());
        assert!(validate_password_strength("NoDigitsHere").is_err());
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let svc = service();
        let user = user_with_role("admin");
        let token = svc.generate_token(&user).unwrap();
        let claims = svc.verify_token(&token).unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.username, "tester");
        assert_eq!(claims.role, UserRole::Admin);
    }

    #[test]
    fn garbage_token_is_rejected() {
        let svc = service();
        assert!(svc.verify_token("not-a-jwt").is_err());
    }

    #[test]
    fn hash_and_verify() {
        let svc = service();
        let hashed = svc.hash_password("Abcdef12").unwrap();
        assert!(svc.verify_password("Abcdef12", &hashed).unwrap());
        assert!(!svc.verify_password("Wrong123", &hashed).unwrap());
    }

    #[test]
    fn role_permissions() {
        assert!(UserRole::Admin.can_update_reservation_status());
        assert!(!UserRole::User.can_update_reservation_status());
    }

    #[test]
    fn unknown_role_falls_back_to_user() {
        let info: UserInfo = user_with_role("superuser").into();
        assert_eq!(info.role, UserRole::User);
    }

    #[test]
    fn generated_admin_password_passes_strength_check() {
        assert!(validate_password_strength(&generate_admin_password()).is_ok());
    }
}
