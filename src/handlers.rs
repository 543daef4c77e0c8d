// src/handlers.rs - Response envelope, health check and dashboard statistics

use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiResult;
use crate::models::{Announcement, LabelCount};
use crate::query_builders::{self, SitInFilter};
use crate::AppState;

// ==================== API RESPONSE ====================

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

// ==================== HEALTH ====================

pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "sitin",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ==================== DASHBOARD ====================

#[derive(Serialize)]
pub struct DashboardStats {
    pub registered_students: i64,
    pub active_sessions: i64,
    pub total_sit_ins: i64,
    pub purpose_counts: Vec<LabelCount>,
    pub announcements: Vec<Announcement>,
}

pub async fn dashboard_stats(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let pool = &app_state.db_pool;

    let registered_students: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM students")
        .fetch_one(pool)
        .await?;
    let active_sessions: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sit_ins WHERE status = 'active'")
            .fetch_one(pool)
            .await?;
    let total_sit_ins: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM sit_ins")
        .fetch_one(pool)
        .await?;

    let purpose_counts = query_builders::purpose_counts(pool, &SitInFilter::default()).await?;

    let announcements: Vec<Announcement> =
        sqlx::query_as("SELECT * FROM announcements ORDER BY date_posted DESC LIMIT 10")
            .fetch_all(pool)
            .await?;

    let stats = DashboardStats {
        registered_students: registered_students.0,
        active_sessions: active_sessions.0,
        total_sit_ins: total_sit_ins.0,
        purpose_counts,
        announcements,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}
