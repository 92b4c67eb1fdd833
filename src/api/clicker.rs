use crate::api::db_error;
use crate::auth::Claims;
use crate::models::user::{self, Entity as User};
use crate::models::user_shop_item::{self, Entity as UserShopItem};
use crate::services::catalog::AchievementKind;
use crate::services::engine::AchievementEngine;
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

/// Skin every profile owns without buying anything.
const DEFAULT_SKIN: &str = "hamsti_skin_1";

pub async fn get_state(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let profile = load_profile(&db, &claims.sub).await?;
    let skins = owned_skins(&db, &claims.sub).await?;

    Ok(Json(json!({
        "clicks": profile.hamsti_clicks,
        "skin": profile.hamsti_skin,
        "owned_skins": skins,
    })))
}

/// One tap. The counter bump is a single SQL increment so rapid taps
/// from two open tabs never lose clicks; the achievement check reads
/// the counter back afterwards.
pub async fn click(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let today = Utc::now().date_naive();

    let res = User::update_many()
        .col_expr(
            user::Column::HamstiClicks,
            Expr::col(user::Column::HamstiClicks).add(1),
        )
        .filter(user::Column::UserId.eq(claims.sub.as_str()))
        .exec(&db)
        .await
        .map_err(db_error)?;
    if res.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    let profile = load_profile(&db, &claims.sub).await?;

    let mut unlocked = Vec::new();
    match AchievementEngine::load(&db, &claims.sub).await {
        Ok(mut engine) => {
            unlocked = engine
                .check_thresholds(&db, AchievementKind::HamstiClicker, profile.hamsti_clicks, today)
                .await;
        }
        Err(e) => tracing::error!("achievement evaluation failed on click: {}", e),
    }

    Ok(Json(json!({
        "clicks": profile.hamsti_clicks,
        "unlocked_achievements": unlocked,
    })))
}

#[derive(Deserialize)]
pub struct SetSkinRequest {
    skin: String,
}

/// Switches the active skin; only the default or a purchased skin may
/// be worn.
pub async fn set_skin(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<SetSkinRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    if payload.skin != DEFAULT_SKIN {
        let owned = UserShopItem::find()
            .filter(user_shop_item::Column::UserId.eq(claims.sub.as_str()))
            .filter(user_shop_item::Column::ItemId.eq(payload.skin.as_str()))
            .one(&db)
            .await
            .map_err(db_error)?;
        if owned.is_none() {
            return Err((StatusCode::BAD_REQUEST, "Skin not owned".to_string()));
        }
    }

    let profile = load_profile(&db, &claims.sub).await?;
    let mut active: user::ActiveModel = profile.into();
    active.hamsti_skin = Set(payload.skin.clone());
    active.updated_at = Set(chrono::Utc::now().to_rfc3339());
    active.update(&db).await.map_err(db_error)?;

    Ok(Json(json!({ "skin": payload.skin })))
}

/// Back to zero clicks and the default skin.
pub async fn reset(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let res = User::update_many()
        .col_expr(user::Column::HamstiClicks, Expr::value(0i64))
        .col_expr(user::Column::HamstiSkin, Expr::value(DEFAULT_SKIN))
        .filter(user::Column::UserId.eq(claims.sub.as_str()))
        .exec(&db)
        .await
        .map_err(db_error)?;
    if res.rows_affected == 0 {
        return Err((StatusCode::NOT_FOUND, "User not found".to_string()));
    }

    Ok(Json(json!({ "clicks": 0, "skin": DEFAULT_SKIN })))
}

async fn load_profile(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<user::Model, (StatusCode, String)> {
    User::find_by_id(user_id.to_owned())
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))
}

async fn owned_skins(
    db: &DatabaseConnection,
    user_id: &str,
) -> Result<Vec<String>, (StatusCode, String)> {
    let mut skins = vec![DEFAULT_SKIN.to_string()];
    let owned = UserShopItem::find()
        .filter(user_shop_item::Column::UserId.eq(user_id))
        .filter(user_shop_item::Column::ItemId.starts_with("hamsti_skin_"))
        .all(db)
        .await
        .map_err(db_error)?;
    skins.extend(owned.into_iter().map(|o| o.item_id));
    Ok(skins)
}
