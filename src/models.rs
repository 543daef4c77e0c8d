// src/models.rs - Entities, joined report rows and request DTOs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

// ==================== STATUS ENUMS ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SitInStatus {
    Active,
    Completed,
}

impl SitInStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(SitInStatus::Active),
            "completed" => Some(SitInStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SitInStatus::Active => "active",
            SitInStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
}

impl ReservationStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReservationStatus::Pending),
            "approved" => Some(ReservationStatus::Approved),
            "rejected" => Some(ReservationStatus::Rejected),
            "completed" => Some(ReservationStatus::Completed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Approved => "approved",
            ReservationStatus::Rejected => "rejected",
            ReservationStatus::Completed => "completed",
        }
    }

    /// Statuses an administrator may assign. `pending` is set only on creation.
    pub fn is_assignable(s: &str) -> bool {
        matches!(s, "approved" | "rejected" | "completed")
    }
}

// ==================== ENTITIES ====================

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub program: String,
    pub year_level: i64,
    pub date_registered: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Laboratory {
    pub id: i64,
    pub name: String,
    pub capacity: i64,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SitInSession {
    pub id: i64,
    pub student_id: i64,
    pub lab_id: i64,
    pub purpose: String,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub status: String,
    pub session_remaining: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Reservation {
    pub id: i64,
    pub student_id: i64,
    pub lab_id: i64,
    pub purpose: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Feedback {
    pub id: i64,
    pub student_id: i64,
    pub lab_id: i64,
    pub message: String,
    pub date_submitted: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Announcement {
    pub id: i64,
    pub content: String,
    pub posted_by: String,
    pub date_posted: DateTime<Utc>,
}

// ==================== JOINED ROWS ====================

/// Sit-in row joined with student and laboratory names, used by the records,
/// reports and export views.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SitInRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub purpose: String,
    pub lab_id: i64,
    pub lab_name: String,
    pub login_time: DateTime<Utc>,
    pub logout_time: Option<DateTime<Utc>>,
    pub status: String,
    pub session_remaining: i64,
}

impl SitInRecord {
    /// Session length in whole minutes. Sessions without a logout report 0,
    /// not "in progress".
    pub fn duration_minutes(&self) -> i64 {
        match self.logout_time {
            Some(logout) => (logout - self.login_time).num_minutes().max(0),
            None => 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ReservationRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub lab_id: i64,
    pub lab_name: String,
    pub purpose: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub status: String,
    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct FeedbackRecord {
    pub id: i64,
    pub student_id: i64,
    pub student_name: String,
    pub lab_id: i64,
    pub lab_name: String,
    pub message: String,
    pub date_submitted: DateTime<Utc>,
}

/// Label/count pair for the dashboard charts.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LabelCount {
    pub label: String,
    pub count: i64,
}

// ==================== REQUEST DTOS ====================

fn default_session_remaining() -> i64 {
    30
}

#[derive(Debug, Deserialize, Validate)]
pub struct CheckInRequest {
    pub student_id: i64,
    #[validate(length(min = 1, message = "Student name is required"))]
    pub student_name: String,
    #[validate(length(min = 1, message = "Purpose is required"))]
    pub purpose: String,
    pub lab_id: i64,
    #[serde(default = "default_session_remaining")]
    pub session_remaining: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReservationRequest {
    pub student_id: i64,
    pub student_name: Option<String>,
    pub lab_id: i64,
    #[validate(length(min = 1, message = "Purpose is required"))]
    pub purpose: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFeedbackRequest {
    pub student_id: i64,
    pub lab_id: i64,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AnnouncementRequest {
    #[validate(length(min = 1, message = "Announcement content cannot be empty"))]
    pub content: String,
}

// ==================== HELPERS ====================

/// Derive a program name from the first whitespace-delimited token of the
/// sit-in purpose ("Java Programming" -> "Java"). This is a heuristic, not a
/// validated program reference; known data-quality risk inherited from the
/// intake workflow.
pub fn infer_program(purpose: &str) -> String {
    purpose
        .split_whitespace()
        .next()
        .unwrap_or("Unknown")
        .to_string()
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn record_with(login: &str, logout: Option<&str>) -> SitInRecord {
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                .unwrap()
                .and_utc()
        };
        SitInRecord {
            id: 1,
            student_id: 12345,
            student_name: "Ana".to_string(),
            purpose: "Java Programming".to_string(),
            lab_id: 530,
            lab_name: "Laboratory 530".to_string(),
            login_time: parse(login),
            logout_time: logout.map(parse),
            status: "completed".to_string(),
            session_remaining: 30,
        }
    }

    #[test]
    fn duration_is_whole_minutes() {
        let rec = record_with("2024-01-01T10:00:00", Some("2024-01-01T10:45:00"));
        assert_eq!(rec.duration_minutes(), 45);
    }

    #[test]
    fn duration_without_logout_is_zero() {
        let rec = record_with("2024-01-01T10:00:00", None);
        assert_eq!(rec.duration_minutes(), 0);
    }

    #[test]
    fn duration_sub_minute_rounds_down() {
        let rec = record_with("2024-01-01T10:00:00", Some("2024-01-01T10:00:59"));
        assert_eq!(rec.duration_minutes(), 0);
    }

    #[test]
    fn infer_program_takes_first_token() {
        assert_eq!(infer_program("Java Programming"), "Java");
        assert_eq!(infer_program("C#"), "C#");
        assert_eq!(infer_program("  Web   Development "), "Web");
        assert_eq!(infer_program(""), "Unknown");
    }

    #[test]
    fn reservation_status_assignable_set() {
        assert!(ReservationStatus::is_assignable("approved"));
        assert!(ReservationStatus::is_assignable("rejected"));
        assert!(ReservationStatus::is_assignable("completed"));
        assert!(!ReservationStatus::is_assignable("pending"));
        assert!(!ReservationStatus::is_assignable("cancelled"));
        assert!(!ReservationStatus::is_assignable(""));
    }

    #[test]
    fn reservation_status_round_trip() {
        for s in ["pending", "approved", "rejected", "completed"] {
            assert_eq!(ReservationStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(ReservationStatus::from_str("unknown").is_none());
    }

    #[test]
    fn sit_in_status_round_trip() {
        for s in ["active", "completed"] {
            assert_eq!(SitInStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(SitInStatus::from_str("paused").is_none());
    }
}
