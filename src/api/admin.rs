use crate::api::{db_error, service_error};
use crate::auth::Claims;
use crate::models::countdown::{self, Entity as Countdown};
use crate::models::mood_entry::{self, Entity as MoodEntry};
use crate::models::user::{self, Entity as User};
use crate::models::user_achievement::{self, Entity as UserAchievement};
use crate::models::user_daily_message::{self, Entity as UserDailyMessage};
use crate::models::user_quest::{self, Entity as UserQuest};
use crate::models::user_shop_item::{self, Entity as UserShopItem};
use crate::services::points;
use axum::{extract::State, http::StatusCode, Json};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct SetPointsRequest {
    points: i64,
}

pub async fn set_points(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SetPointsRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&claims)?;

    points::set_balance(&db, &claims.sub, payload.points)
        .await
        .map_err(service_error)?;

    tracing::info!("admin set balance to {}", payload.points);
    Ok(Json(json!({ "points": payload.points })))
}

/// Wipes every bit of progress and puts the profile back to zero. Only
/// the catalog tables (achievements, messages, quests, shop items) stay.
pub async fn reset_progress(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_admin(&claims)?;

    let user_id = claims.sub.as_str();

    UserAchievement::delete_many()
        .filter(user_achievement::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;
    UserDailyMessage::delete_many()
        .filter(user_daily_message::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;
    UserQuest::delete_many()
        .filter(user_quest::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;
    MoodEntry::delete_many()
        .filter(mood_entry::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;
    UserShopItem::delete_many()
        .filter(user_shop_item::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;
    Countdown::delete_many()
        .filter(countdown::Column::UserId.eq(user_id))
        .exec(&db)
        .await
        .map_err(db_error)?;

    let profile = User::find_by_id(claims.sub.clone())
        .one(&db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;
    let mut active: user::ActiveModel = profile.into();
    active.points = Set(0);
    active.hamsti_clicks = Set(0);
    active.hamsti_skin = Set("hamsti_skin_1".to_owned());
    active.login_streak = Set(0);
    active.mood_streak = Set(0);
    active.raetsel_streak = Set(0);
    active.last_login_date = Set(None);
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(&db).await.map_err(db_error)?;

    tracing::warn!("admin reset: all progress wiped");
    Ok(Json(json!({ "reset": true })))
}

fn require_admin(claims: &Claims) -> Result<(), (StatusCode, String)> {
    if claims.is_admin() {
        Ok(())
    } else {
        Err((StatusCode::FORBIDDEN, "Admin role required".to_string()))
    }
}
