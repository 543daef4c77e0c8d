// src/reservation_handlers.rs - HTTP surface for reservations

use actix_web::{web, HttpRequest, HttpResponse};
use std::sync::Arc;
use validator::Validate;

use crate::auth::{check_permission, get_current_user};
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{CreateReservationRequest, UpdateReservationStatusRequest};
use crate::reservations;
use crate::AppState;

pub async fn create_reservation(
    app_state: web::Data<Arc<AppState>>,
    request: web::Json<CreateReservationRequest>,
) -> ApiResult<HttpResponse> {
    request.validate()?;

    let reservation = reservations::create_reservation(&app_state.db_pool, &request).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        reservation,
        "Reservation created".to_string(),
    )))
}

pub async fn list_reservations(app_state: web::Data<Arc<AppState>>) -> ApiResult<HttpResponse> {
    let records = reservations::list_reservations(&app_state.db_pool).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn update_reservation_status(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
    request: web::Json<UpdateReservationStatusRequest>,
    http_request: HttpRequest,
) -> ApiResult<HttpResponse> {
    let claims = get_current_user(&http_request)?;
    check_permission(&claims, |role| role.can_update_reservation_status())?;

    let reservation_id = path.into_inner();
    let reservation =
        reservations::update_status(&app_state.db_pool, reservation_id, &request.status).await?;

    log::info!(
        "Admin {} set reservation {} to {}",
        claims.username,
        reservation_id,
        reservation.status
    );

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        reservation,
        "Reservation status updated".to_string(),
    )))
}
