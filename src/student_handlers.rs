// src/student_handlers.rs - Student lookup, typed-ahead search, recent activity

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::Student;
use crate::sessions;
use crate::AppState;

const SEARCH_MIN_CHARS: usize = 2;
const SEARCH_LIMIT: i64 = 5;
const ACTIVITY_LIMIT: i64 = 5;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// Trimmed search term, or None when it is too short to search on.
fn search_term(raw: &str) -> Option<&str> {
    let term = raw.trim();
    if term.chars().count() < SEARCH_MIN_CHARS {
        None
    } else {
        Some(term)
    }
}

/// Typed-ahead search over id, name and program. Terms shorter than two
/// characters return an empty list without touching storage.
pub async fn search(pool: &SqlitePool, raw_query: &str) -> ApiResult<Vec<Student>> {
    let term = match search_term(raw_query) {
        Some(term) => term,
        None => return Ok(Vec::new()),
    };

    let pattern = format!("%{}%", term);
    let students: Vec<Student> = sqlx::query_as(
        "SELECT * FROM students
         WHERE CAST(id AS TEXT) LIKE ? OR name LIKE ? OR program LIKE ?
         ORDER BY name
         LIMIT ?",
    )
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(SEARCH_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

pub async fn search_students(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let students = search(&app_state.db_pool, &query.query).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(students)))
}

pub async fn get_student(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();

    let student: Option<Student> = sqlx::query_as("SELECT * FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(&app_state.db_pool)
        .await?;

    match student {
        Some(student) => Ok(HttpResponse::Ok().json(ApiResponse::success(student))),
        None => Err(ApiError::student_not_found(student_id)),
    }
}

/// Last few sit-ins of one student, for the search page.
pub async fn get_student_activity(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    let student_id = path.into_inner();

    // 404 for a student that was never registered
    let exists: Option<(i64,)> = sqlx::query_as("SELECT id FROM students WHERE id = ?")
        .bind(student_id)
        .fetch_optional(&app_state.db_pool)
        .await?;
    if exists.is_none() {
        return Err(ApiError::student_not_found(student_id));
    }

    let activity =
        sessions::recent_activity(&app_state.db_pool, student_id, ACTIVITY_LIMIT).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(activity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::CheckInRequest;
    use crate::sessions;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn bare_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap()
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = bare_pool().await;
        db::run_migrations(&pool).await.unwrap();
        db::seed_laboratories(&pool).await.unwrap();

        for (student_id, name, purpose) in [
            (12345, "Ana Reyes", "Java Programming"),
            (67890, "Ben Cruz", "Web Development"),
        ] {
            sessions::check_in(
                &pool,
                &CheckInRequest {
                    student_id,
                    student_name: name.to_string(),
                    purpose: purpose.to_string(),
                    lab_id: 530,
                    session_remaining: 30,
                },
            )
            .await
            .unwrap();
        }
        pool
    }

    #[test]
    fn term_shorter_than_two_chars_is_rejected() {
        assert_eq!(search_term(""), None);
        assert_eq!(search_term("a"), None);
        assert_eq!(search_term("  a  "), None);
        // one character, even when it is more than one byte
        assert_eq!(search_term("ñ"), None);
        assert_eq!(search_term("ab"), Some("ab"));
        assert_eq!(search_term("  ab "), Some("ab"));
        assert_eq!(search_term("ña"), Some("ña"));
    }

    #[tokio::test]
    async fn short_query_skips_storage() {
        // No tables exist in this pool; a query would fail loudly
        let pool = bare_pool().await;
        let students = search(&pool, "a").await.unwrap();
        assert!(students.is_empty());
    }

    #[tokio::test]
    async fn search_matches_id_name_and_program() {
        let pool = seeded_pool().await;

        let by_name = search(&pool, "Ana").await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, 12345);

        let by_id = search(&pool, "678").await.unwrap();
        assert_eq!(by_id.len(), 1);
        assert_eq!(by_id[0].name, "Ben Cruz");

        let by_program = search(&pool, "Java").await.unwrap();
        assert_eq!(by_program.len(), 1);
        assert_eq!(by_program[0].id, 12345);

        assert!(search(&pool, "zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_is_capped_at_five_results() {
        let pool = bare_pool().await;
        db::run_migrations(&pool).await.unwrap();
        db::seed_laboratories(&pool).await.unwrap();

        for student_id in 1000..1008 {
            sessions::check_in(
                &pool,
                &CheckInRequest {
                    student_id,
                    student_name: format!("Student {}", student_id),
                    purpose: "Java Programming".to_string(),
                    lab_id: 524,
                    session_remaining: 30,
                },
            )
            .await
            .unwrap();
        }

        let results = search(&pool, "Student").await.unwrap();
        assert_eq!(results.len(), 5);
    }
}
