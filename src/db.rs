// src/db.rs - Database migrations and seed data

use anyhow::Result;
use sqlx::SqlitePool;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    // Enable foreign keys and WAL mode
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE CHECK(length(username) >= 3 AND length(username) <= 50),
            password_hash TEXT NOT NULL,
            role TEXT NOT NULL DEFAULT 'user' CHECK(role IN ('admin', 'user')),
            created_at DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Student ids are assigned by the registrar, not auto-generated
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 255),
            program TEXT NOT NULL,
            year_level INTEGER NOT NULL DEFAULT 1 CHECK(year_level >= 1),
            date_registered DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS laboratories (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 100),
            capacity INTEGER NOT NULL CHECK(capacity > 0),
            description TEXT CHECK(description IS NULL OR length(description) <= 500)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sit_ins (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            lab_id INTEGER NOT NULL,
            purpose TEXT NOT NULL CHECK(length(purpose) > 0 AND length(purpose) <= 255),
            login_time DATETIME NOT NULL,
            logout_time DATETIME,
            status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'completed')),
            session_remaining INTEGER NOT NULL DEFAULT 30,
            FOREIGN KEY (student_id) REFERENCES students (id),
            FOREIGN KEY (lab_id) REFERENCES laboratories (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reservations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            lab_id INTEGER NOT NULL,
            purpose TEXT NOT NULL CHECK(length(purpose) > 0 AND length(purpose) <= 255),
            date DATE NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending' CHECK(
                status IN ('pending', 'approved', 'rejected', 'completed')
            ),
            date_created DATETIME NOT NULL,
            FOREIGN KEY (student_id) REFERENCES students (id),
            FOREIGN KEY (lab_id) REFERENCES laboratories (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS feedback (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            student_id INTEGER NOT NULL,
            lab_id INTEGER NOT NULL,
            message TEXT NOT NULL CHECK(length(message) > 0 AND length(message) <= 2000),
            date_submitted DATETIME NOT NULL,
            FOREIGN KEY (student_id) REFERENCES students (id),
            FOREIGN KEY (lab_id) REFERENCES laboratories (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS announcements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            content TEXT NOT NULL CHECK(length(content) > 0 AND length(content) <= 2000),
            posted_by TEXT NOT NULL,
            date_posted DATETIME NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one active sit-in per student. The check-in transaction also
    // verifies this, but the index makes concurrent check-ins safe.
    sqlx::query(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_sit_ins_one_active
         ON sit_ins(student_id) WHERE status = 'active'",
    )
    .execute(pool)
    .await?;

    let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_sit_ins_student ON sit_ins(student_id)")
        .execute(pool)
        .await;
    let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_sit_ins_lab ON sit_ins(lab_id)")
        .execute(pool)
        .await;
    let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_sit_ins_login_time ON sit_ins(login_time)")
        .execute(pool)
        .await;
    let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_reservations_date ON reservations(date, start_time)")
        .execute(pool)
        .await;
    let _ = sqlx::query("CREATE INDEX IF NOT EXISTS idx_feedback_lab ON feedback(lab_id)")
        .execute(pool)
        .await;

    Ok(())
}

/// Laboratories are static reference data seeded once.
pub async fn seed_laboratories(pool: &SqlitePool) -> Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM laboratories")
        .fetch_one(pool)
        .await?;

    if existing.0 > 0 {
        return Ok(());
    }

    let labs: [(i64, &str, i64, &str); 5] = [
        (524, "Laboratory 524", 30, "General Programming Lab"),
        (526, "Laboratory 526", 25, "C# Programming Lab"),
        (528, "Laboratory 528", 30, "Web Development Lab"),
        (530, "Laboratory 530", 35, "Java Programming Lab"),
        (542, "Laboratory 542", 25, "Mobile Development Lab"),
    ];

    for (id, name, capacity, description) in labs {
        sqlx::query(
            "INSERT INTO laboratories (id, name, capacity, description) VALUES (?, ?, ?, ?)",
        )
        .bind(id)
        .bind(name)
        .bind(capacity)
        .bind(description)
        .execute(pool)
        .await?;
    }

    log::info!("Seeded {} laboratories", labs.len());
    Ok(())
}
