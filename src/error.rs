use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unauthorized(String),
    Forbidden(String),
    InternalServerError(String),
    ValidationError(String),
    UnsupportedFormat(String),
    DatabaseError(sqlx::Error),
    AuthError(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::UnsupportedFormat(msg) => write!(f, "Unsupported Format: {}", msg),
            ApiError::DatabaseError(err) => write!(f, "Database Error: {}", err),
            ApiError::AuthError(msg) => write!(f, "Auth Error: {}", msg),
        }
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse {
            success: false,
            error: self.to_string(),
        };

        match self {
            ApiError::BadRequest(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::NotFound(_) => HttpResponse::NotFound().json(error_response),
            ApiError::Conflict(_) => HttpResponse::Conflict().json(error_response),
            ApiError::Unauthorized(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::Forbidden(_) => HttpResponse::Forbidden().json(error_response),
            ApiError::ValidationError(_) => HttpResponse::UnprocessableEntity().json(error_response),
            ApiError::UnsupportedFormat(_) => HttpResponse::BadRequest().json(error_response),
            ApiError::DatabaseError(_) => HttpResponse::InternalServerError().json(error_response),
            ApiError::AuthError(_) => HttpResponse::Unauthorized().json(error_response),
            ApiError::InternalServerError(_) => HttpResponse::InternalServerError().json(error_response),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::DatabaseError(err)
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::ValidationError(err.to_string())
    }
}

// Domain-specific constructors
impl ApiError {
    pub fn student_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Student with ID '{}' not found", id))
    }

    pub fn session_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Sit-in session with ID '{}' not found", id))
    }

    pub fn reservation_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Reservation with ID '{}' not found", id))
    }

    pub fn announcement_not_found(id: i64) -> Self {
        ApiError::NotFound(format!("Announcement with ID '{}' not found", id))
    }

    pub fn active_session_exists(student_id: i64) -> Self {
        ApiError::Conflict(format!(
            "Student '{}' already has an active sit-in session",
            student_id
        ))
    }

    pub fn username_taken(username: &str) -> Self {
        ApiError::Conflict(format!("Username '{}' already exists", username))
    }

    pub fn invalid_date(value: &str) -> Self {
        ApiError::ValidationError(format!("Invalid date '{}', expected YYYY-MM-DD", value))
    }

    pub fn unsupported_format(value: &str) -> Self {
        ApiError::UnsupportedFormat(format!(
            "Unsupported export format '{}'. Valid formats: csv, excel, pdf",
            value
        ))
    }
}

/// Map a UNIQUE-constraint failure to a domain error, pass everything else through.
pub fn map_unique_violation(err: sqlx::Error, conflict: ApiError) -> ApiError {
    match &err {
        sqlx::Error::Database(db) if db.message().contains("UNIQUE constraint failed") => conflict,
        _ => ApiError::DatabaseError(err),
    }
}
