// src/announcement_handlers.rs - Admin announcements shown on the dashboard

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use std::sync::Arc;
use validator::Validate;

use crate::auth::require_admin;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{Announcement, AnnouncementRequest};
use crate::AppState;

pub async fn list_announcements(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let announcements: Vec<Announcement> =
        sqlx::query_as("SELECT * FROM announcements ORDER BY date_posted DESC")
            .fetch_all(&app_state.db_pool)
            .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(announcements)))
}

pub async fn create_announcement(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<AnnouncementRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = require_admin(&http_request)?;

    request.validate()?;

    let result = sqlx::query(
        "INSERT INTO announcements (content, posted_by, date_posted) VALUES (?, ?, ?)",
    )
    .bind(&request.content)
    .bind(&claims.username)
    .bind(Utc::now())
    .execute(&app_state.db_pool)
    .await?;

    let announcement: Announcement = sqlx::query_as("SELECT * FROM announcements WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Admin {} posted announcement {}", claims.username, announcement.id);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        announcement,
        "Announcement posted".to_string(),
    )))
}

pub async fn update_announcement(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    request: web::Json<AnnouncementRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = require_admin(&http_request)?;

    request.validate()?;
    let announcement_id = path.into_inner();

    let result = sqlx::query("UPDATE announcements SET content = ? WHERE id = ?")
        .bind(&request.content)
        .bind(announcement_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::announcement_not_found(announcement_id));
    }

    let announcement: Announcement = sqlx::query_as("SELECT * FROM announcements WHERE id = ?")
        .bind(announcement_id)
        .fetch_one(&app_state.db_pool)
        .await?;

    log::info!("Admin {} edited announcement {}", claims.username, announcement_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        announcement,
        "Announcement updated".to_string(),
    )))
}

pub async fn delete_announcement(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = require_admin(&http_request)?;

    let announcement_id = path.into_inner();

    let result = sqlx::query("DELETE FROM announcements WHERE id = ?")
        .bind(announcement_id)
        .execute(&app_state.db_pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::announcement_not_found(announcement_id));
    }

    log::info!("Admin {} deleted announcement {}", claims.username, announcement_id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Announcement deleted".to_string(),
    )))
}
