// src/auth_handlers.rs - Authentication route handlers

use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{
    get_current_user, AuthService, LoginRequest, LoginResponse, RegisterRequest, User, UserInfo,
    UserRole,
};
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::AppState;

pub async fn login(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let user = User::find_by_username(&app_state.db_pool, &request.username)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid username or password".to_string()))?;

    if !auth_service.verify_password(&request.password, &user.password_hash)? {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let token = auth_service.generate_token(&user)?;

    let response = LoginResponse {
        token,
        expires_in: auth_service.token_lifetime_seconds(),
        user: user.clone().into(),
    };

    log::info!("User {} logged in", user.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        response,
        "Login successful".to_string(),
    )))
}

/// Self-registration always yields the `user` role. The admin account is
/// bootstrapped at startup, never through this endpoint.
pub async fn register(
    app_state: web::Data<Arc<AppState>>,
    auth_service: web::Data<Arc<AuthService>>,
    request: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let user = User::create(
        &app_state.db_pool,
        &request.username,
        &request.password,
        UserRole::User,
        &auth_service,
    )
    .await?;

    let token = auth_service.generate_token(&user)?;

    let response = LoginResponse {
        token,
        expires_in: auth_service.token_lifetime_seconds(),
        user: user.into(),
    };

    log::info!("New user registered: {}", response.user.username);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        response,
        "User registered successfully".to_string(),
    )))
}

pub async fn get_profile(http_request: HttpRequest) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;

    let user_info = UserInfo {
        id: claims.sub,
        username: claims.username,
        role: claims.role,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(user_info)))
}

/// Tokens are stateless; logout exists so clients have a uniform endpoint
/// to call before discarding the token.
pub async fn logout(http_request: HttpRequest) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    log::info!("User {} logged out", claims.username);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Logged out".to_string(),
    )))
}
