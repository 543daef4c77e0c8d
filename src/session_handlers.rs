// src/session_handlers.rs - HTTP surface for sit-in sessions, records and export

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::ApiResult;
use crate::export::{self, ExportFormat, ReportRange};
use crate::handlers::ApiResponse;
use crate::models::{CheckInRequest, LabelCount, SitInRecord};
use crate::query_builders::{self, SitInFilter};
use crate::sessions;
use crate::AppState;

/// Record joined row plus the derived duration, as the clients consume it.
#[derive(Serialize)]
pub struct RecordView {
    #[serde(flatten)]
    pub record: SitInRecord,
    pub duration_minutes: i64,
}

impl From<SitInRecord> for RecordView {
    fn from(record: SitInRecord) -> Self {
        let duration_minutes = record.duration_minutes();
        Self {
            record,
            duration_minutes,
        }
    }
}

fn to_views(records: Vec<SitInRecord>) -> Vec<RecordView> {
    records.into_iter().map(RecordView::from).collect()
}

// ==================== LIFECYCLE ====================

pub async fn check_in(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<CheckInRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let session = sessions::check_in(&app_state.db_pool, &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        session,
        "Student checked in".to_string(),
    )))
}

pub async fn get_active_sessions(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let records = sessions::active_sessions(&app_state.db_pool).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(to_views(records))))
}

pub async fn check_out(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let session_id = path.into_inner();
    let session = sessions::check_out(&app_state.db_pool, session_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        session,
        "Student checked out".to_string(),
    )))
}

// ==================== RECORDS & REPORTS ====================

#[derive(Serialize)]
pub struct RecordsResponse {
    pub records: Vec<RecordView>,
    pub purpose_counts: Vec<LabelCount>,
    pub lab_counts: Vec<LabelCount>,
}

/// Record view with chart aggregates. The aggregates are computed over the
/// same filtered set as the listed rows.
pub async fn get_records(
    app_state: web::Data<Arc<AppState>>,
    filter: web::Query<SitInFilter>,
) -> ApiResult<HttpResponse> {
    let pool = &app_state.db_pool;

    let records = query_builders::fetch_records(pool, &filter).await?;
    let purpose_counts = query_builders::purpose_counts(pool, &filter).await?;
    let lab_counts = query_builders::lab_counts(pool, &filter).await?;

    let response = RecordsResponse {
        records: to_views(records),
        purpose_counts,
        lab_counts,
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(response)))
}

/// Date-range report view; same filter machinery, rows only.
pub async fn get_reports(
    app_state: web::Data<Arc<AppState>>,
    filter: web::Query<SitInFilter>,
) -> ApiResult<HttpResponse> {
    let records = query_builders::fetch_records(&app_state.db_pool, &filter).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(to_views(records))))
}

// ==================== EXPORT ====================

// Query extraction cannot flatten SitInFilter here (urlencoded
// deserialization chokes on flattened non-string fields), so the filter
// fields are spelled out next to the format key.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub format: String,
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub lab_id: Option<i64>,
    pub purpose: Option<String>,
    pub student: Option<String>,
    pub status: Option<String>,
}

impl ExportQuery {
    fn filter(&self) -> SitInFilter {
        SitInFilter {
            date: self.date.clone(),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            lab_id: self.lab_id,
            purpose: self.purpose.clone(),
            student: self.student.clone(),
            status: self.status.clone(),
        }
    }
}

pub async fn export_records(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<ExportQuery>,
) -> ApiResult<HttpResponse> {
    let format = ExportFormat::from_key(&query.format)?;
    let records = query_builders::fetch_records(&app_state.db_pool, &query.filter()).await?;
    let range = ReportRange {
        from: query.start_date.clone(),
        to: query.end_date.clone(),
    };
    let body = export::render(format, &records, &range)?;

    log::info!(
        "Exported {} sit-in records as {}",
        records.len(),
        format.filename()
    );

    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", format.filename()),
        ))
        .body(body))
}
