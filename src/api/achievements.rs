use crate::api::service_error;
use crate::auth::Claims;
use crate::services::engine::AchievementEngine;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};

/// Lists the catalog with the caller's unlock state. Date gates run
/// first so an achievement whose day has arrived shows up unlocked on
/// the very request that renders the achievements page.
pub async fn list_achievements(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();

    let mut engine = AchievementEngine::load(&db, &claims.sub)
        .await
        .map_err(service_error)?;
    let newly_unlocked = engine.check_date_gates(&db, today).await;

    let achievements: Vec<Value> = engine
        .entries()
        .iter()
        .map(|e| {
            json!({
                "id": e.id,
                "name": e.name,
                "description": e.description,
                "rarity": e.rarity,
                "reward_points": e.reward_points,
                "type": e.kind.as_str(),
                "unlocked": e.unlocked,
                "unlocked_at": e.unlocked_at,
            })
        })
        .collect();

    Ok(Json(json!({
        "achievements": achievements,
        "unlocked_count": engine.unlocked_count(),
        "total_count": engine.total_count(),
        "points": engine.points(),
        "unlocked_achievements": newly_unlocked,
    })))
}

/// Admin-only direct unlock; the UI uses it for surprise reveals.
pub async fn unlock_achievement(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if !claims.is_admin() {
        return Err((StatusCode::FORBIDDEN, "Admin role required".to_string()));
    }

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, &claims.sub)
        .await
        .map_err(service_error)?;
    let unlocked = engine.unlock(&db, id, today).await.map_err(service_error)?;

    Ok(Json(json!({
        "unlocked_achievements": unlocked,
        "points": engine.points(),
    })))
}
