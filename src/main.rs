// src/main.rs - Laboratory sit-in attendance and reservation tracker

mod announcement_handlers;
mod auth;
mod auth_handlers;
mod config;
mod db;
mod error;
mod export;
mod feedback_handlers;
mod handlers;
mod lab_handlers;
mod models;
mod query_builders;
mod reservation_handlers;
mod reservations;
mod session_handlers;
mod sessions;
mod student_handlers;

use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use actix_web_httpauth::middleware::HttpAuthentication;
use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::auth::{ensure_default_admin, jwt_middleware, AuthService};
use crate::config::Config;

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sitin={level},actix_web=info")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

async fn create_pool(config: &Config) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", config.database.url))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect_with(options)
        .await?;

    Ok(pool)
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = config::load_config()?;
    setup_logging(&config.logging.level);

    log::info!("Starting sit-in tracker on {}:{}", config.server.host, config.server.port);

    let db_pool = create_pool(&config).await?;
    db::run_migrations(&db_pool).await?;
    db::seed_laboratories(&db_pool).await?;

    let auth_service = Arc::new(AuthService::new(
        &config.auth.jwt_secret,
        config.auth.token_expiration_hours,
        config.auth.bcrypt_cost,
    ));

    ensure_default_admin(&db_pool, &auth_service)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bootstrap admin account: {}", e))?;

    let allowed_origins = config.security.allowed_origins.clone();
    let bind_addr = (config.server.host.clone(), config.server.port);

    let app_state = Arc::new(AppState { db_pool, config });

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec!["Authorization", "Content-Type"])
            .max_age(3600);
        for origin in &allowed_origins {
            cors = cors.allowed_origin(origin);
        }

        let bearer_auth = HttpAuthentication::bearer(jwt_middleware);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .wrap(
                middleware::DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY"))
                    .add(("X-XSS-Protection", "1; mode=block")),
            )
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .route("/health", web::get().to(handlers::health_check))
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth_handlers::login))
                    .route("/register", web::post().to(auth_handlers::register)),
            )
            .service(
                web::scope("/api/v1")
                    .wrap(bearer_auth)
                    .route("/auth/profile", web::get().to(auth_handlers::get_profile))
                    .route("/auth/logout", web::post().to(auth_handlers::logout))
                    .route("/dashboard/stats", web::get().to(handlers::dashboard_stats))
                    .route("/students/search", web::get().to(student_handlers::search_students))
                    .route("/students/{id}", web::get().to(student_handlers::get_student))
                    .route(
                        "/students/{id}/activity",
                        web::get().to(student_handlers::get_student_activity),
                    )
                    .route("/laboratories", web::get().to(lab_handlers::list_laboratories))
                    .route("/sit-ins", web::post().to(session_handlers::check_in))
                    .route("/sit-ins", web::get().to(session_handlers::get_active_sessions))
                    .route(
                        "/sit-ins/{id}/checkout",
                        web::post().to(session_handlers::check_out),
                    )
                    .route("/sit-ins/records", web::get().to(session_handlers::get_records))
                    .route("/sit-ins/reports", web::get().to(session_handlers::get_reports))
                    .route("/sit-ins/export", web::get().to(session_handlers::export_records))
                    .route(
                        "/reservations",
                        web::post().to(reservation_handlers::create_reservation),
                    )
                    .route(
                        "/reservations",
                        web::get().to(reservation_handlers::list_reservations),
                    )
                    .route(
                        "/reservations/{id}/status",
                        web::put().to(reservation_handlers::update_reservation_status),
                    )
                    .route("/feedback", web::post().to(feedback_handlers::create_feedback))
                    .route("/feedback", web::get().to(feedback_handlers::list_feedback))
                    .route(
                        "/announcements",
                        web::get().to(announcement_handlers::list_announcements),
                    )
                    .route(
                        "/announcements",
                        web::post().to(announcement_handlers::create_announcement),
                    )
                    .route(
                        "/announcements/{id}",
                        web::put().to(announcement_handlers::update_announcement),
                    )
                    .route(
                        "/announcements/{id}",
                        web::delete().to(announcement_handlers::delete_announcement),
                    ),
            )
    })
    .bind(bind_addr)?
    .run()
    .await?;

    Ok(())
}
