// src/lab_handlers.rs - Laboratory reference data

use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::Laboratory;
use crate::AppState;

pub async fn list_laboratories(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let labs: Vec<Laboratory> = sqlx::query_as("SELECT * FROM laboratories ORDER BY id")
        .fetch_all(&app_state.db_pool)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(labs)))
}
