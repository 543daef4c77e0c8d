// src/query_builders.rs - Typed filters composed onto sqlx::QueryBuilder

use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

use crate::error::{ApiError, ApiResult};
use crate::models::{FeedbackRecord, LabelCount, SitInRecord, SitInStatus};

/// Filters for the sit-in record and report views. Date strings are
/// validated before they reach SQL; an exact `date` and a range may be
/// combined, the result is the intersection.
#[derive(Debug, Default, Deserialize)]
pub struct SitInFilter {
    pub date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub lab_id: Option<i64>,
    pub purpose: Option<String>,
    pub student: Option<String>,
    pub status: Option<String>,
}

fn parse_date(value: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ApiError::invalid_date(value))
}

impl SitInFilter {
    /// Append WHERE clauses for every set field. The caller's query must
    /// already contain a WHERE, with sit_ins aliased as `s` and students
    /// joined as `st`.
    pub fn apply(&self, qb: &mut QueryBuilder<Sqlite>) -> ApiResult<()> {
        if let Some(date) = &self.date {
            let date = parse_date(date)?;
            qb.push(" AND date(s.login_time) = ")
                .push_bind(date.to_string());
        }
        if let Some(start) = &self.start_date {
            let start = parse_date(start)?;
            qb.push(" AND date(s.login_time) >= ")
                .push_bind(start.to_string());
        }
        if let Some(end) = &self.end_date {
            let end = parse_date(end)?;
            qb.push(" AND date(s.login_time) <= ")
                .push_bind(end.to_string());
        }
        if let Some(lab_id) = self.lab_id {
            qb.push(" AND s.lab_id = ").push_bind(lab_id);
        }
        if let Some(purpose) = &self.purpose {
            qb.push(" AND s.purpose LIKE ")
                .push_bind(format!("%{}%", purpose));
        }
        if let Some(student) = &self.student {
            let pattern = format!("%{}%", student);
            qb.push(" AND (CAST(s.student_id AS TEXT) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR st.name LIKE ")
                .push_bind(pattern)
                .push(")");
        }
        if let Some(status) = &self.status {
            let status = SitInStatus::from_str(status).ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "Invalid status '{}'. Valid statuses: active, completed",
                    status
                ))
            })?;
            qb.push(" AND s.status = ").push_bind(status.as_str());
        }
        Ok(())
    }
}

fn record_query() -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(
        r#"SELECT
               s.id, s.student_id, st.name AS student_name, s.purpose,
               s.lab_id, l.name AS lab_name, s.login_time, s.logout_time,
               s.status, s.session_remaining
           FROM sit_ins s
           JOIN students st ON st.id = s.student_id
           JOIN laboratories l ON l.id = s.lab_id
           WHERE 1=1"#,
    )
}

/// Sit-in rows matching the filter, newest first.
pub async fn fetch_records(pool: &SqlitePool, filter: &SitInFilter) -> ApiResult<Vec<SitInRecord>> {
    let mut qb = record_query();
    filter.apply(&mut qb)?;
    qb.push(" ORDER BY s.login_time DESC");

    let records = qb
        .build_query_as::<SitInRecord>()
        .fetch_all(pool)
        .await?;
    Ok(records)
}

/// Sit-in counts per purpose over the filtered set, for the records charts.
pub async fn purpose_counts(pool: &SqlitePool, filter: &SitInFilter) -> ApiResult<Vec<LabelCount>> {
    let mut qb = QueryBuilder::new(
        r#"SELECT s.purpose AS label, COUNT(*) AS count
           FROM sit_ins s
           JOIN students st ON st.id = s.student_id
           WHERE 1=1"#,
    );
    filter.apply(&mut qb)?;
    qb.push(" GROUP BY s.purpose ORDER BY count DESC, label ASC");

    let counts = qb.build_query_as::<LabelCount>().fetch_all(pool).await?;
    Ok(counts)
}

/// Sit-in counts per laboratory over the filtered set.
pub async fn lab_counts(pool: &SqlitePool, filter: &SitInFilter) -> ApiResult<Vec<LabelCount>> {
    let mut qb = QueryBuilder::new(
        r#"SELECT l.name AS label, COUNT(*) AS count
           FROM sit_ins s
           JOIN students st ON st.id = s.student_id
           JOIN laboratories l ON l.id = s.lab_id
           WHERE 1=1"#,
    );
    filter.apply(&mut qb)?;
    qb.push(" GROUP BY l.name ORDER BY count DESC, label ASC");

    let counts = qb.build_query_as::<LabelCount>().fetch_all(pool).await?;
    Ok(counts)
}

// ==================== FEEDBACK ====================

#[derive(Debug, Default, Deserialize)]
pub struct FeedbackFilter {
    pub lab_id: Option<i64>,
    pub student: Option<String>,
}

/// Feedback rows matching the filter, newest first.
pub async fn fetch_feedback(
    pool: &SqlitePool,
    filter: &FeedbackFilter,
) -> ApiResult<Vec<FeedbackRecord>> {
    let mut qb = QueryBuilder::new(
        r#"SELECT
               f.id, f.student_id, st.name AS student_name,
               f.lab_id, l.name AS lab_name, f.message, f.date_submitted
           FROM feedback f
           JOIN students st ON st.id = f.student_id
           JOIN laboratories l ON l.id = f.lab_id
           WHERE 1=1"#,
    );
    if let Some(lab_id) = filter.lab_id {
        qb.push(" AND f.lab_id = ").push_bind(lab_id);
    }
    if let Some(student) = &filter.student {
        let pattern = format!("%{}%", student);
        qb.push(" AND (CAST(f.student_id AS TEXT) LIKE ")
            .push_bind(pattern.clone())
            .push(" OR st.name LIKE ")
            .push_bind(pattern)
            .push(")");
    }
    qb.push(" ORDER BY f.date_submitted DESC");

    let records = qb.build_query_as::<FeedbackRecord>().fetch_all(pool).await?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::CheckInRequest;
    use crate::sessions;
    use chrono::NaiveDateTime;
    use sqlx::sqlite::SqlitePoolOptions;

    #[test]
    fn empty_filter_adds_no_clauses() {
        let filter = SitInFilter::default();
        let mut qb = record_query();
        let before = qb.sql().to_string();
        filter.apply(&mut qb).unwrap();
        assert_eq!(qb.sql(), before);
    }

    #[test]
    fn filter_composes_bound_clauses() {
        let filter = SitInFilter {
            date: Some("2024-03-15".to_string()),
            lab_id: Some(530),
            purpose: Some("Java".to_string()),
            ..Default::default()
        };
        let mut qb = record_query();
        filter.apply(&mut qb).unwrap();
        let sql = qb.sql();
        assert!(sql.contains("date(s.login_time) ="));
        assert!(sql.contains("s.lab_id ="));
        assert!(sql.contains("s.purpose LIKE"));
        // values go through binds, never into the SQL text
        assert!(!sql.contains("2024-03-15"));
        assert!(!sql.contains("530"));
    }

    #[test]
    fn malformed_date_is_a_validation_error() {
        for bad in ["15-03-2024", "2024-13-40", "yesterday", ""] {
            let filter = SitInFilter {
                date: Some(bad.to_string()),
                ..Default::default()
            };
            let mut qb = record_query();
            let err = filter.apply(&mut qb).unwrap_err();
            assert!(matches!(err, ApiError::ValidationError(_)), "{}", bad);
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let filter = SitInFilter {
            status: Some("paused".to_string()),
            ..Default::default()
        };
        let mut qb = record_query();
        assert!(filter.apply(&mut qb).is_err());
    }

    async fn seeded_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::run_migrations(&pool).await.unwrap();
        db::seed_laboratories(&pool).await.unwrap();

        // Three completed sessions on three distinct dates
        for (student_id, name, purpose, lab_id, day) in [
            (1001, "Ana", "Java Programming", 530, "2024-03-14"),
            (1002, "Ben", "Web Development", 528, "2024-03-15"),
            (1003, "Cara", "Java Programming", 530, "2024-03-16"),
        ] {
            let session = sessions::check_in(
                &pool,
                &CheckInRequest {
                    student_id,
                    student_name: name.to_string(),
                    purpose: purpose.to_string(),
                    lab_id,
                    session_remaining: 30,
                },
            )
            .await
            .unwrap();
            sessions::check_out(&pool, session.id).await.unwrap();

            let login = NaiveDateTime::parse_from_str(
                &format!("{}T10:00:00", day),
                "%Y-%m-%dT%H:%M:%S",
            )
            .unwrap()
            .and_utc();
            sqlx::query("UPDATE sit_ins SET login_time = ?, logout_time = ? WHERE id = ?")
                .bind(login)
                .bind(login + chrono::Duration::minutes(45))
                .bind(session.id)
                .execute(&pool)
                .await
                .unwrap();
        }
        pool
    }

    #[tokio::test]
    async fn exact_date_filter_selects_subset() {
        let pool = seeded_pool().await;

        let filter = SitInFilter {
            date: Some("2024-03-15".to_string()),
            ..Default::default()
        };
        let records = fetch_records(&pool, &filter).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_name, "Ben");
    }

    #[tokio::test]
    async fn student_filter_matches_id_or_name_substring() {
        let pool = seeded_pool().await;

        let by_name = SitInFilter {
            student: Some("An".to_string()),
            ..Default::default()
        };
        let records = fetch_records(&pool, &by_name).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_name, "Ana");

        let by_id = SitInFilter {
            student: Some("1002".to_string()),
            ..Default::default()
        };
        let records = fetch_records(&pool, &by_id).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].student_name, "Ben");
    }

    #[tokio::test]
    async fn range_filter_is_inclusive() {
        let pool = seeded_pool().await;

        let filter = SitInFilter {
            start_date: Some("2024-03-15".to_string()),
            end_date: Some("2024-03-16".to_string()),
            ..Default::default()
        };
        let records = fetch_records(&pool, &filter).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn aggregates_respect_the_filter() {
        let pool = seeded_pool().await;

        let all = purpose_counts(&pool, &SitInFilter::default()).await.unwrap();
        assert_eq!(all[0].label, "Java Programming");
        assert_eq!(all[0].count, 2);

        let one_day = SitInFilter {
            date: Some("2024-03-15".to_string()),
            ..Default::default()
        };
        let filtered = purpose_counts(&pool, &one_day).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].label, "Web Development");
        assert_eq!(filtered[0].count, 1);

        let labs = lab_counts(&pool, &SitInFilter::default()).await.unwrap();
        assert_eq!(labs[0].label, "Laboratory 530");
        assert_eq!(labs[0].count, 2);
    }
}
