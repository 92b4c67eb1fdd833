use crate::api::db_error;
use crate::auth::Claims;
use crate::models::quest::{self, Entity as Quest};
use crate::models::user;
use crate::models::user_quest::{self, Entity as UserQuest};
use crate::services::catalog::AchievementKind;
use crate::services::engine::AchievementEngine;
use crate::services::{points, streak};
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use rand::seq::SliceRandom;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

/// Returns today's sidequest, assigning a fresh one if none exists.
/// Quests the user already solved are not handed out again until the
/// pool runs dry. Multiple-choice solutions stay server-side.
pub async fn get_daily_quest(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();

    if let Some(assignment) = find_assignment(&db, &claims.sub, &today).await? {
        return quest_response(&db, assignment).await;
    }

    let pool = Quest::find().all(&db).await.map_err(db_error)?;
    if pool.is_empty() {
        return Err((StatusCode::NOT_FOUND, "No quests available".to_string()));
    }

    let solved: Vec<i32> = UserQuest::find()
        .filter(user_quest::Column::UserId.eq(claims.sub.as_str()))
        .filter(user_quest::Column::Status.eq("solved"))
        .all(&db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|q| q.quest_id)
        .collect();

    let fresh: Vec<&quest::Model> = pool.iter().filter(|q| !solved.contains(&q.id)).collect();
    let chosen_id = {
        let mut rng = rand::thread_rng();
        let candidates = if fresh.is_empty() { pool.iter().collect() } else { fresh };
        candidates
            .choose(&mut rng)
            .map(|q| q.id)
            .unwrap_or(pool[0].id)
    };

    let row = user_quest::ActiveModel {
        user_id: Set(claims.sub.clone()),
        quest_id: Set(chosen_id),
        status: Set("assigned".to_owned()),
        solved_at: Set(today.clone()),
        ..Default::default()
    };
    let inserted = UserQuest::insert(row)
        .on_conflict(
            OnConflict::columns([user_quest::Column::UserId, user_quest::Column::SolvedAt])
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
    quest_response(&db, assignment).await
}

#[derive(Deserialize)]
pub struct SolveRequest {
    answer: Option<String>,
}

/// Grades today's quest. A wrong multiple-choice answer is reported
/// without consuming the quest; text and task quests accept any
/// submission. Solving credits the reward and runs the points, puzzle
/// and streak checks off the fresh values.
pub async fn solve_quest(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SolveRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();

    let assignment = find_assignment(&db, &claims.sub, &today_str)
        .await?
        .ok_or((StatusCode::NOT_FOUND, "No quest assigned today".to_string()))?;

    if assignment.status == "solved" {
        return Ok(Json(json!({
            "correct": true,
            "already_solved": true,
            "unlocked_achievements": [],
        })));
    }

    let quest = Quest::find_by_id(assignment.quest_id)
        .one(&db)
        .await
        .map_err(db_error)?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Assigned quest missing".to_string(),
        ))?;

    if quest.r#type == "mc" {
        let answer = payload.answer.as_deref().unwrap_or("");
        if Some(answer) != quest.solution.as_deref() {
            return Ok(Json(json!({ "correct": false })));
        }
    }

    let mut active: user_quest::ActiveModel = assignment.into();
    active.status = Set("solved".to_owned());
    active.update(&db).await.map_err(db_error)?;

    let balance = match points::credit(&db, &claims.sub, quest.reward_points).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("failed to credit quest reward: {}", e);
            points::balance(&db, &claims.sub).await.unwrap_or(0)
        }
    };

    let solved = UserQuest::find()
        .filter(user_quest::Column::UserId.eq(claims.sub.as_str()))
        .filter(user_quest::Column::Status.eq("solved"))
        .all(&db)
        .await
        .map_err(db_error)?;
    let solved_count = solved.len() as i64;
    let days = streak::collect_days(solved.iter().map(|q| q.solved_at.as_str()));
    let raetsel_streak = streak::compute_streak(&days, today);

    let res = user::Entity::update_many()
        .col_expr(
            user::Column::RaetselStreak,
            Expr::value(raetsel_streak as i32),
        )
        .filter(user::Column::UserId.eq(claims.sub.as_str()))
        .exec(&db)
        .await
        .map_err(db_error)?;
    if res.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    let mut unlocked = Vec::new();
    match AchievementEngine::load(&db, &claims.sub).await {
        Ok(mut engine) => {
            unlocked.extend(
                engine
                    .check_thresholds(&db, AchievementKind::Puzzle, solved_count, today)
                    .await,
            );
            let balance = engine.points().max(balance);
            unlocked.extend(
                engine
                    .check_thresholds(&db, AchievementKind::Points, balance, today)
                    .await,
            );
        }
        Err(e) => tracing::error!("achievement evaluation failed on quest solve: {}", e),
    }

    Ok(Json(json!({
        "correct": true,
        "reward_points": quest.reward_points,
        "points": balance,
        "raetsel_streak": raetsel_streak,
        "unlocked_achievements": unlocked,
    })))
}

async fn find_assignment(
    db: &DatabaseConnection,
    user_id: &str,
    day: &str,
) -> Result<Option<user_quest::Model>, (StatusCode, String)> {
    UserQuest::find()
        .filter(user_quest::Column::UserId.eq(user_id))
        .filter(user_quest::Column::SolvedAt.eq(day))
        .one(db)
        .await
        .map_err(db_error)
}

async fn quest_response(
    db: &DatabaseConnection,
    assignment: user_quest::Model,
) -> Result<Json<Value>, (StatusCode, String)> {
    let quest = Quest::find_by_id(assignment.quest_id)
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Assigned quest missing".to_string(),
        ))?;

    let options: Value = quest
        .options
        .as_deref()
        .and_then(|o| serde_json::from_str(o).ok())
        .unwrap_or(Value::Null);

    Ok(Json(json!({
        "quest": {
            "id": quest.id,
            "question": quest.question,
            "type": quest.r#type,
            "options": options,
            "reward_points": quest.reward_points,
        },
        "status": assignment.status,
        "assigned_at": assignment.solved_at,
    })))
}
