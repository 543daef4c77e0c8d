// src/feedback_handlers.rs - Student feedback on laboratory sessions

use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::{CreateFeedbackRequest, Feedback};
use crate::query_builders::{self, FeedbackFilter};
use crate::AppState;

/// Store feedback. Unlike check-in, an unknown student is not created on
/// the fly; feedback only makes sense for students who have visited.
pub async fn submit_feedback(
    pool: &SqlitePool,
    request: &CreateFeedbackRequest,
) -> ApiResult<Feedback> {
    let student: Option<(i64,)> = sqlx::query_as("SELECT id FROM students WHERE id = ?")
        .bind(request.student_id)
        .fetch_optional(pool)
        .await?;
    if student.is_none() {
        return Err(ApiError::student_not_found(request.student_id));
    }

    let lab: Option<(i64,)> = sqlx::query_as("SELECT id FROM laboratories WHERE id = ?")
        .bind(request.lab_id)
        .fetch_optional(pool)
        .await?;
    if lab.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown laboratory '{}'",
            request.lab_id
        )));
    }

    let result = sqlx::query(
        "INSERT INTO feedback (student_id, lab_id, message, date_submitted) VALUES (?, ?, ?, ?)",
    )
    .bind(request.student_id)
    .bind(request.lab_id)
    .bind(&request.message)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    let feedback: Feedback = sqlx::query_as("SELECT * FROM feedback WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(pool)
        .await?;

    log::info!(
        "Feedback {} submitted by student {} for lab {}",
        feedback.id,
        feedback.student_id,
        feedback.lab_id
    );

    Ok(feedback)
}

pub async fn create_feedback(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<CreateFeedbackRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let feedback = submit_feedback(&app_state.db_pool, &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        feedback,
        "Feedback submitted".to_string(),
    )))
}

pub async fn list_feedback(
    app_state: web::Data<Arc<AppState>>,
    filter: web::Query<FeedbackFilter>,
) -> ApiResult<HttpResponse> {
    let records = query_builders::fetch_feedback(&app_state.db_pool, &filter).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}
