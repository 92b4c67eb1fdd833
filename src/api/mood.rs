use crate::api::db_error;
use crate::auth::Claims;
use crate::models::mood_entry::{self, Entity as MoodEntry};
use crate::models::user;
use crate::services::catalog::AchievementKind;
use crate::services::engine::AchievementEngine;
use crate::services::streak;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn get_today(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();

    let entries = MoodEntry::find()
        .filter(mood_entry::Column::UserId.eq(claims.sub.as_str()))
        .all(&db)
        .await
        .map_err(db_error)?;
    let entry = entries.iter().find(|e| e.date == today_str).cloned();
    let days = streak::collect_days(entries.iter().map(|e| e.date.as_str()));

    Ok(Json(json!({
        "entry": entry,
        "mood_streak": streak::compute_streak(&days, today),
        "entry_count": entries.len(),
    })))
}

#[derive(Deserialize)]
pub struct SaveMoodRequest {
    mood: String,
    note: Option<String>,
}

/// Saves today's mood; saving again overwrites. The streak column is
/// recomputed from the stored dates after every write, and the mood
/// achievements fire on the total number of recorded days.
pub async fn save_mood(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SaveMoodRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();

    let row = mood_entry::ActiveModel {
        user_id: Set(claims.sub.clone()),
        date: Set(today_str.clone()),
        mood: Set(payload.mood),
        note: Set(payload.note),
        ..Default::default()
    };
    let inserted = MoodEntry::insert(row)
        .on_conflict(
            OnConflict::columns([mood_entry::Column::UserId, mood_entry::Column::Date])
                .update_columns([mood_entry::Column::Mood, mood_entry::Column::Note])
                .to_owned(),
        )
        .exec(&db)
        .await;
    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(db_error(e)),
    }

    let entries = MoodEntry::find()
        .filter(mood_entry::Column::UserId.eq(claims.sub.as_str()))
        .all(&db)
        .await
        .map_err(db_error)?;
    let days = streak::collect_days(entries.iter().map(|e| e.date.as_str()));
    let mood_streak = streak::compute_streak(&days, today);
    update_streak_column(&db, &claims.sub, mood_streak as i32).await?;

    let mut unlocked = Vec::new();
    match AchievementEngine::load(&db, &claims.sub).await {
        Ok(mut engine) => {
            unlocked = engine
                .check_thresholds(&db, AchievementKind::Mood, entries.len() as i64, today)
                .await;
        }
        Err(e) => tracing::error!("achievement evaluation failed on mood save: {}", e),
    }

    Ok(Json(json!({
        "mood_streak": mood_streak,
        "entry_count": entries.len(),
        "unlocked_achievements": unlocked,
    })))
}

/// Removes today's entry (the UI offers an undo right after saving).
pub async fn delete_today(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();

    MoodEntry::delete_many()
        .filter(mood_entry::Column::UserId.eq(claims.sub.as_str()))
        .filter(mood_entry::Column::Date.eq(today_str.as_str()))
        .exec(&db)
        .await
        .map_err(db_error)?;

    // With today gone the walk starts at zero
    update_streak_column(&db, &claims.sub, 0).await?;

    Ok(Json(json!({ "mood_streak": 0 })))
}

async fn update_streak_column(
    db: &DatabaseConnection,
    user_id: &str,
    value: i32,
) -> Result<(), (StatusCode, String)> {
    let res = user::Entity::update_many()
        .col_expr(user::Column::MoodStreak, Expr::value(value))
        .filter(user::Column::UserId.eq(user_id))
        .exec(db)
        .await
        .map_err(db_error)?;
    if res.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }
    Ok(())
}
