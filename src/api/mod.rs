pub mod achievements;
pub mod admin;
pub mod auth;
pub mod clicker;
pub mod countdowns;
pub mod health;
pub mod messages;
pub mod mood;
pub mod quests;
pub mod shop;
pub mod stats;

use axum::{
    extract::FromRef,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;

use crate::config::Config;
use crate::services::ServiceError;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Config,
}

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::get_me))
        // Achievements
        .route("/achievements", get(achievements::list_achievements))
        .route(
            "/achievements/:id/unlock",
            post(achievements::unlock_achievement),
        )
        // Daily message
        .route("/daily-message", get(messages::get_daily_message))
        .route("/daily-message/read", post(messages::mark_read))
        // Mood calendar
        .route("/mood/today", get(mood::get_today).delete(mood::delete_today))
        .route("/mood", post(mood::save_mood))
        // Sidequests
        .route("/sidequest", get(quests::get_daily_quest))
        .route("/sidequest/solve", post(quests::solve_quest))
        // Hamsti clicker
        .route("/clicker", get(clicker::get_state))
        .route("/clicker/click", post(clicker::click))
        .route("/clicker/skin", put(clicker::set_skin))
        .route("/clicker/reset", post(clicker::reset))
        // Shop
        .route("/shop/items", get(shop::list_items))
        .route("/shop/purchase", post(shop::purchase))
        // Countdowns
        .route(
            "/countdowns",
            get(countdowns::list_countdowns).post(countdowns::create_countdown),
        )
        .route(
            "/countdowns/:id",
            put(countdowns::update_countdown).delete(countdowns::delete_countdown),
        )
        // Stats
        .route("/stats", get(stats::get_stats))
        // Admin
        .route("/admin/points", post(admin::set_points))
        .route("/admin/reset", post(admin::reset_progress))
        .with_state(state)
}

pub(crate) fn service_error(e: ServiceError) -> (StatusCode, String) {
    match e {
        ServiceError::NotFound => (StatusCode::NOT_FOUND, "Resource not found".to_string()),
        ServiceError::InvalidState(msg) => (StatusCode::BAD_REQUEST, msg),
        ServiceError::Database(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
    }
}

pub(crate) fn db_error(e: sea_orm::DbErr) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}
