// src/reservations.rs - Advance reservation management

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    CreateReservationRequest, Reservation, ReservationRecord, ReservationStatus, Student,
};

const RECORD_COLUMNS: &str = r#"
    r.id, r.student_id, st.name AS student_name,
    r.lab_id, l.name AS lab_name, r.purpose,
    r.date, r.start_time, r.end_time, r.status, r.date_created
"#;

/// Create a pending reservation. A first-time student is registered on the
/// fly when a name is supplied, mirroring check-in; without a name an
/// unknown student is an error. Overlapping reservations for the same lab
/// and time slot are deliberately not rejected.
pub async fn create_reservation(
    pool: &SqlitePool,
    request: &CreateReservationRequest,
) -> ApiResult<Reservation> {
    let mut tx = pool.begin().await?;

    let lab: Option<(i64,)> = sqlx::query_as("SELECT id FROM laboratories WHERE id = ?")
        .bind(request.lab_id)
        .fetch_optional(&mut *tx)
        .await?;
    if lab.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Unknown laboratory '{}'",
            request.lab_id
        )));
    }

    let existing: Option<Student> = sqlx::query_as("SELECT * FROM students WHERE id = ?")
        .bind(request.student_id)
        .fetch_optional(&mut *tx)
        .await?;

    if existing.is_none() {
        let name = request
            .student_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::student_not_found(request.student_id))?;

        sqlx::query(
            "INSERT INTO students (id, name, program, year_level, date_registered)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(request.student_id)
        .bind(name)
        .bind(crate::models::infer_program(&request.purpose))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        log::info!("Auto-registered student {} ({})", request.student_id, name);
    }

    let result = sqlx::query(
        "INSERT INTO reservations
             (student_id, lab_id, purpose, date, start_time, end_time, status, date_created)
         VALUES (?, ?, ?, ?, ?, ?, 'pending', ?)",
    )
    .bind(request.student_id)
    .bind(request.lab_id)
    .bind(&request.purpose)
    .bind(request.date)
    .bind(request.start_time)
    .bind(request.end_time)
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    let reservation: Reservation = sqlx::query_as("SELECT * FROM reservations WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!(
        "Reservation {} created for student {} in lab {} on {}",
        reservation.id,
        reservation.student_id,
        reservation.lab_id,
        reservation.date
    );

    Ok(reservation)
}

/// All reservations joined with student and lab names, ordered by the
/// reserved slot (date, then start time).
pub async fn list_reservations(pool: &SqlitePool) -> ApiResult<Vec<ReservationRecord>> {
    let records = sqlx::query_as::<_, ReservationRecord>(&format!(
        r#"SELECT {RECORD_COLUMNS}
           FROM reservations r
           JOIN students st ON st.id = r.student_id
           JOIN laboratories l ON l.id = r.lab_id
           ORDER BY r.date ASC, r.start_time ASC"#
    ))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Set a reservation's status. Only approved/rejected/completed may be
/// assigned; any current status may be overwritten.
pub async fn update_status(
    pool: &SqlitePool,
    reservation_id: i64,
    status: &str,
) -> ApiResult<Reservation> {
    if !ReservationStatus::is_assignable(status) {
        return Err(ApiError::ValidationError(format!(
            "Invalid status '{}'. Valid statuses: approved, rejected, completed",
            status
        )));
    }

    let result = sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
        .bind(status)
        .bind(reservation_id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::reservation_not_found(reservation_id));
    }

    let reservation: Reservation = sqlx::query_as("SELECT * FROM reservations WHERE id = ?")
        .bind(reservation_id)
        .fetch_one(pool)
        .await?;

    log::info!("Reservation {} set to {}", reservation_id, status);

    Ok(reservation)
}
