use crate::api::db_error;
use crate::auth::Claims;
use crate::models::achievement::Entity as Achievement;
use crate::models::countdown::{self, Entity as Countdown};
use crate::models::mood_entry::{self, Entity as MoodEntry};
use crate::models::user::Entity as User;
use crate::models::user_achievement::{self, Entity as UserAchievement};
use crate::models::user_daily_message::{self, Entity as UserDailyMessage};
use crate::models::user_quest::{self, Entity as UserQuest};
use crate::models::user_shop_item::{self, Entity as UserShopItem};
use axum::{extract::State, http::StatusCode, Json};
use sea_orm::*;
use serde_json::{json, Value};

/// Aggregate numbers for the profile page, all derived from their
/// source tables rather than from the denormalized columns.
pub async fn get_stats(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let profile = User::find_by_id(claims.sub.clone())
        .one(&db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    let unlocked = UserAchievement::find()
        .filter(user_achievement::Column::UserId.eq(claims.sub.as_str()))
        .count(&db)
        .await
        .map_err(db_error)?;
    let total = Achievement::find().count(&db).await.map_err(db_error)?;

    let messages_read = UserDailyMessage::find()
        .filter(user_daily_message::Column::UserId.eq(claims.sub.as_str()))
        .filter(user_daily_message::Column::Status.eq("read"))
        .count(&db)
        .await
        .map_err(db_error)?;

    let quests_solved = UserQuest::find()
        .filter(user_quest::Column::UserId.eq(claims.sub.as_str()))
        .filter(user_quest::Column::Status.eq("solved"))
        .count(&db)
        .await
        .map_err(db_error)?;

    let mood_entries = MoodEntry::find()
        .filter(mood_entry::Column::UserId.eq(claims.sub.as_str()))
        .count(&db)
        .await
        .map_err(db_error)?;

    let countdowns = Countdown::find()
        .filter(countdown::Column::UserId.eq(claims.sub.as_str()))
        .count(&db)
        .await
        .map_err(db_error)?;

    let items_owned = UserShopItem::find()
        .filter(user_shop_item::Column::UserId.eq(claims.sub.as_str()))
        .count(&db)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({
        "points": profile.points,
        "hamsti_clicks": profile.hamsti_clicks,
        "login_streak": profile.login_streak,
        "mood_streak": profile.mood_streak,
        "raetsel_streak": profile.raetsel_streak,
        "achievements_unlocked": unlocked,
        "achievements_total": total,
        "messages_read": messages_read,
        "quests_solved": quests_solved,
        "mood_entries": mood_entries,
        "countdowns": countdowns,
        "items_owned": items_owned,
    })))
}
