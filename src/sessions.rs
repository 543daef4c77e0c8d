// src/sessions.rs - Sit-in session lifecycle: check-in, check-out, active view

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::{map_unique_violation, ApiError, ApiResult};
use crate::models::{infer_program, CheckInRequest, SitInRecord, SitInSession, Student};

const RECORD_COLUMNS: &str = r#"
    s.id, s.student_id, st.name AS student_name, s.purpose,
    s.lab_id, l.name AS lab_name, s.login_time, s.logout_time,
    s.status, s.session_remaining
"#;

/// Start a sit-in session. Runs as one transaction: reject if the student
/// already has an active session, create the student row on first visit,
/// insert the session. The partial unique index on active sessions backs
/// this up under concurrent check-ins.
pub async fn check_in(pool: &SqlitePool, request: &CheckInRequest) -> ApiResult<SitInSession> {
    let mut tx = pool.begin().await?;

    let active: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM sit_ins WHERE student_id = ? AND status = 'active'")
            .bind(request.student_id)
            .fetch_optional(&mut *tx)
            .await?;

    if active.is_some() {
        return Err(ApiError::active_session_exists(request.student_id));
    }

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
        sqlx::query(
            "INSERT INTO students (id, name, program, year_level, date_registered)
             VALUES (?, ?, ?, 1, ?)",
        )
        .bind(request.student_id)
        .bind(&request.student_name)
        .bind(infer_program(&request.purpose))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        log::info!(
            "Auto-registered student {} ({})",
            request.student_id,
            request.student_name
        );
    }

    let login_time = Utc::now();
    let result = sqlx::query(
        "INSERT INTO sit_ins (student_id, lab_id, purpose, login_time, status, session_remaining)
         VALUES (?, ?, ?, ?, 'active', ?)",
    )
    .bind(request.student_id)
    .bind(request.lab_id)
    .bind(&request.purpose)
    .bind(login_time)
    .bind(request.session_remaining)
    .execute(&mut *tx)
    .await
    .map_err(|e| map_unique_violation(e, ApiError::active_session_exists(request.student_id)))?;

    let session: SitInSession = sqlx::query_as("SELECT * FROM sit_ins WHERE id = ?")
        .bind(result.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    log::info!(
        "Student {} checked in to lab {} (session {})",
        request.student_id,
        request.lab_id,
        session.id
    );

    Ok(session)
}

/// End a session: stamp the logout time and mark it completed. Checking out
/// an already-completed session refreshes the logout time rather than
/// failing; an unknown id is an error.
pub async fn check_out(pool: &SqlitePool, session_id: i64) -> ApiResult<SitInSession> {
    let result = sqlx::query(
        "UPDATE sit_ins SET logout_time = ?, status = 'completed' WHERE id = ?",
    )
    .bind(Utc::now())
    .bind(session_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::session_not_found(session_id));
    }

    let session: SitInSession = sqlx::query_as("SELECT * FROM sit_ins WHERE id = ?")
        .bind(session_id)
        .fetch_one(pool)
        .await?;

    log::info!("Session {} checked out", session_id);

    Ok(session)
}

/// All currently-active sessions joined with student and lab names, newest
/// check-in first.
pub async fn active_sessions(pool: &SqlitePool) -> ApiResult<Vec<SitInRecord>> {
    let records = sqlx::query_as::<_, SitInRecord>(&format!(
        r#"SELECT {RECORD_COLUMNS}
           FROM sit_ins s
           JOIN students st ON st.id = s.student_id
           JOIN laboratories l ON l.id = s.lab_id
           WHERE s.status = 'active'
           ORDER BY s.login_time DESC"#
    ))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Last few sit-ins of one student, for the search page sidebar.
pub async fn recent_activity(
    pool: &SqlitePool,
    student_id: i64,
    limit: i64,
) -> ApiResult<Vec<SitInRecord>> {
    let records = sqlx::query_as::<_, SitInRecord>(&format!(
        r#"SELECT {RECORD_COLUMNS}
           FROM sit_ins s
           JOIN students st ON st.id = s.student_id
           JOIN laboratories l ON l.id = s.lab_id
           WHERE s.student_id = ?
           ORDER BY s.login_time DESC
           LIMIT ?"#
    ))
    .bind(student_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::error::ApiError;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // One connection, otherwise each pooled connection sees its own
        // empty in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        db::seed_laboratories(&pool).await.unwrap();
        pool
    }

    fn ana_request() -> CheckInRequest {
        CheckInRequest {
            student_id: 12345,
            student_name: "Ana".to_string(),
            purpose: "Java Programming".to_string(),
            lab_id: 530,
            session_remaining: 30,
        }
    }

    #[tokio::test]
    async fn check_in_auto_registers_unknown_student() {
        let pool = test_pool().await;

        let session = check_in(&pool, &ana_request()).await.unwrap();
        assert_eq!(session.student_id, 12345);
        assert_eq!(session.status, "active");
        assert!(session.logout_time.is_none());

        let student: Student = sqlx::query_as("SELECT * FROM students WHERE id = 12345")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(student.name, "Ana");
        assert_eq!(student.program, "Java");
        assert_eq!(student.year_level, 1);
    }

    #[tokio::test]
    async fn second_active_check_in_conflicts() {
        let pool = test_pool().await;

        check_in(&pool, &ana_request()).await.unwrap();
        let err = check_in(&pool, &ana_request()).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn check_in_to_unknown_lab_is_rejected() {
        let pool = test_pool().await;

        let mut request = ana_request();
        request.lab_id = 999;
        let err = check_in(&pool, &request).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        // No student row is left behind by the aborted transaction
        let student: Option<(i64,)> = sqlx::query_as("SELECT id FROM students WHERE id = 12345")
            .fetch_optional(&pool)
            .await
            .unwrap();
        assert!(student.is_none());
    }

    #[tokio::test]
    async fn check_out_completes_session() {
        let pool = test_pool().await;

        let session = check_in(&pool, &ana_request()).await.unwrap();
        let completed = check_out(&pool, session.id).await.unwrap();

        assert_eq!(completed.status, "completed");
        let logout = completed.logout_time.unwrap();
        assert!(logout >= completed.login_time);

        // The student is free to check in again
        let again = check_in(&pool, &ana_request()).await.unwrap();
        assert_ne!(again.id, session.id);
    }

    #[tokio::test]
    async fn check_out_unknown_session_is_not_found() {
        let pool = test_pool().await;
        let err = check_out(&pool, 999).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn repeated_check_out_refreshes_logout_time() {
        let pool = test_pool().await;

        let session = check_in(&pool, &ana_request()).await.unwrap();
        let first = check_out(&pool, session.id).await.unwrap();
        let second = check_out(&pool, session.id).await.unwrap();

        assert_eq!(second.status, "completed");
        assert!(second.logout_time.unwrap() >= first.logout_time.unwrap());
    }

    #[tokio::test]
    async fn active_sessions_excludes_completed() {
        let pool = test_pool().await;

        let ana = check_in(&pool, &ana_request()).await.unwrap();
        let ben = check_in(
            &pool,
            &CheckInRequest {
                student_id: 67890,
                student_name: "Ben".to_string(),
                purpose: "Web Development".to_string(),
                lab_id: 528,
                session_remaining: 30,
            },
        )
        .await
        .unwrap();

        check_out(&pool, ana.id).await.unwrap();

        let active = active_sessions(&pool).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, ben.id);
        assert_eq!(active[0].student_name, "Ben");
        assert_eq!(active[0].lab_name, "Laboratory 528");
    }

    #[tokio::test]
    async fn recent_activity_is_limited_and_newest_first() {
        let pool = test_pool().await;

        for _ in 0..3 {
            let session = check_in(&pool, &ana_request()).await.unwrap();
            check_out(&pool, session.id).await.unwrap();
        }

        let activity = recent_activity(&pool, 12345, 2).await.unwrap();
        assert_eq!(activity.len(), 2);
        assert!(activity[0].id >= activity[1].id);
    }
}
