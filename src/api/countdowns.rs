use crate::api::db_error;
use crate::auth::Claims;
use crate::models::countdown::{self, Entity as Countdown};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn list_countdowns(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let countdowns = Countdown::find()
        .filter(countdown::Column::UserId.eq(claims.sub.as_str()))
        .order_by_asc(countdown::Column::TargetDate)
        .all(&db)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({ "countdowns": countdowns })))
}

#[derive(Deserialize)]
pub struct CountdownRequest {
    title: String,
    target_date: String,
}

pub async fn create_countdown(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<CountdownRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let row = countdown::ActiveModel {
        user_id: Set(claims.sub.clone()),
        title: Set(payload.title),
        target_date: Set(payload.target_date),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let saved = row.insert(&db).await.map_err(db_error)?;

    Ok(Json(json!({ "countdown": saved })))
}

pub async fn update_countdown(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
    Json(payload): Json<CountdownRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let existing = find_owned(&db, &claims.sub, id).await?;

    let mut active: countdown::ActiveModel = existing.into();
    active.title = Set(payload.title);
    active.target_date = Set(payload.target_date);
    let saved = active.update(&db).await.map_err(db_error)?;

    Ok(Json(json!({ "countdown": saved })))
}

pub async fn delete_countdown(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Path(id): Path<i32>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let existing = find_owned(&db, &claims.sub, id).await?;
    let existing: countdown::ActiveModel = existing.into();
    existing.delete(&db).await.map_err(db_error)?;

    Ok(Json(json!({ "deleted": id })))
}

async fn find_owned(
    db: &DatabaseConnection,
    user_id: &str,
    id: i32,
) -> Result<countdown::Model, (StatusCode, String)> {
    Countdown::find_by_id(id)
        .filter(countdown::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Countdown not found".to_string()))
}
