use crate::api::db_error;
use crate::auth::Claims;
use crate::models::message::{self, Entity as Message};
use crate::models::user_daily_message::{self, Entity as UserDailyMessage};
use crate::services::catalog::AchievementKind;
use crate::services::engine::AchievementEngine;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde_json::{json, Value};

/// Returns today's message, assigning one first if none exists yet.
///
/// Assignment prefers messages the user has never received; once the
/// pool is exhausted any message can repeat. The UNIQUE(user_id,
/// assigned_at) index arbitrates concurrent first requests of the day,
/// the loser re-reads the winner's row.
pub async fn get_daily_message(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    if let Some(assignment) = find_assignment(&db, &claims.sub, &today).await? {
        return assignment_response(&db, assignment).await;
    }

    let pool = Message::find()
        .filter(message::Column::Type.eq("daily"))
        .all(&db)
        .await
        .map_err(db_error)?;
    if pool.is_empty() {
        return Err((
            StatusCode::NOT_FOUND,
            "No daily messages available".to_string(),
        ));
    }

    let seen: Vec<i32> = UserDailyMessage::find()
        .filter(user_daily_message::Column::UserId.eq(claims.sub.as_str()))
        .all(&db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|a| a.message_id)
        .collect();

    let unseen: Vec<&message::Model> =
        pool.iter().filter(|m| !seen.contains(&m.id)).collect();
    let chosen_id = {
        let mut rng = rand::thread_rng();
        let candidates = if unseen.is_empty() { pool.iter().collect() } else { unseen };
        candidates
            .choose(&mut rng)
            .map(|m| m.id)
            .unwrap_or(pool[0].id)
    };

    let row = user_daily_message::ActiveModel {
        user_id: Set(claims.sub.clone()),
        message_id: Set(chosen_id),
        status: Set("assigned".to_owned()),
        assigned_at: Set(today.clone()),
        ..Default::default()
    };
    let inserted = UserDailyMessage::insert(row)
        .on_conflict(
            OnConflict::columns([
                user_daily_message::Column::UserId,
                user_daily_message::Column::AssignedAt,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(&db)
        .await;
    match inserted {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(db_error(e)),
    }

    let assignment = find_assignment(&db, &claims.sub, &today)
        .await?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Assignment vanished after insert".to_string(),
        ))?;
    assignment_response(&db, assignment).await
}

/// Marks today's message as read. Reading is what counts for the
/// message achievements; a re-read changes nothing.
pub async fn mark_read(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();

    let assignment = find_assignment(&db, &claims.sub, &today_str)
        .await?
        .ok_or((
            StatusCode::NOT_FOUND,
            "No message assigned today".to_string(),
        ))?;

    let mut unlocked = Vec::new();
    if assignment.status != "read" {
        let mut active: user_daily_message::ActiveModel = assignment.into();
        active.status = Set("read".to_owned());
        active.update(&db).await.map_err(db_error)?;

        let read_count = UserDailyMessage::find()
            .filter(user_daily_message::Column::UserId.eq(claims.sub.as_str()))
            .filter(user_daily_message::Column::Status.eq("read"))
            .count(&db)
            .await
            .map_err(db_error)?;

        match AchievementEngine::load(&db, &claims.sub).await {
            Ok(mut engine) => {
                unlocked = engine
                    .check_thresholds(&db, AchievementKind::Message, read_count as i64, today)
                    .await;
            }
            Err(e) => tracing::error!("achievement evaluation failed on message read: {}", e),
        }
    }

    Ok(Json(json!({
        "status": "read",
        "unlocked_achievements": unlocked,
    })))
}

async fn find_assignment(
    db: &DatabaseConnection,
    user_id: &str,
    day: &str,
) -> Result<Option<user_daily_message::Model>, (StatusCode, String)> {
    UserDailyMessage::find()
        .filter(user_daily_message::Column::UserId.eq(user_id))
        .filter(user_daily_message::Column::AssignedAt.eq(day))
        .one(db)
        .await
        .map_err(db_error)
}

async fn assignment_response(
    db: &DatabaseConnection,
    assignment: user_daily_message::Model,
) -> Result<Json<Value>, (StatusCode, String)> {
    let message = Message::find_by_id(assignment.message_id)
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Assigned message missing".to_string(),
        ))?;

    Ok(Json(json!({
        "message": {
            "id": message.id,
            "text": message.text,
        },
        "status": assignment.status,
        "assigned_at": assignment.assigned_at,
    })))
}
