use crate::api::{db_error, service_error};
use crate::auth::Claims;
use crate::models::shop_item::{self, Entity as ShopItem};
use crate::models::user_shop_item::{self, Entity as UserShopItem};
use crate::services::points;
use axum::{extract::State, http::StatusCode, Json};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

pub async fn list_items(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let items = ShopItem::find()
        .order_by_desc(shop_item::Column::RarityOrder)
        .order_by_asc(shop_item::Column::Title)
        .all(&db)
        .await
        .map_err(db_error)?;

    let owned: Vec<String> = UserShopItem::find()
        .filter(user_shop_item::Column::UserId.eq(claims.sub.as_str()))
        .all(&db)
        .await
        .map_err(db_error)?
        .into_iter()
        .map(|o| o.item_id)
        .collect();

    let balance = points::balance(&db, &claims.sub)
        .await
        .map_err(service_error)?;

    let items: Vec<Value> = items
        .into_iter()
        .map(|item| {
            let is_owned = owned.contains(&item.id);
            json!({
                "id": item.id,
                "title": item.title,
                "description": item.description,
                "icon": item.icon,
                "color": item.color,
                "rarity": item.rarity,
                "cost": item.mausi_points_cost,
                "category": item.category,
                "owned": is_owned,
            })
        })
        .collect();

    Ok(Json(json!({ "items": items, "points": balance })))
}

#[derive(Deserialize)]
pub struct PurchaseRequest {
    item_id: String,
}

/// Buys an item. The balance is read fresh inside the request, the
/// ownership insert is conflict-proof and the deduction is an atomic
/// decrement, so a double-submitted purchase charges once.
pub async fn purchase(
    claims: Claims,
    State(db): State<DatabaseConnection>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let item = ShopItem::find_by_id(payload.item_id.clone())
        .one(&db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "Item not found".to_string()))?;

    // Ownership first: a re-purchase must report "already owned" even
    // when the balance no longer covers the price
    let owned = UserShopItem::find()
        .filter(user_shop_item::Column::UserId.eq(claims.sub.as_str()))
        .filter(user_shop_item::Column::ItemId.eq(item.id.as_str()))
        .one(&db)
        .await
        .map_err(db_error)?;
    if owned.is_some() {
        return Err((StatusCode::BAD_REQUEST, "Item already owned".to_string()));
    }

    let balance = points::balance(&db, &claims.sub)
        .await
        .map_err(service_error)?;
    if balance < item.mausi_points_cost {
        return Err((StatusCode::BAD_REQUEST, "Not enough points".to_string()));
    }

    let row = user_shop_item::ActiveModel {
        user_id: Set(claims.sub.clone()),
        item_id: Set(item.id.clone()),
        unlocked_at: Set(chrono::Utc::now().to_rfc3339()),
        ..Default::default()
    };
    let inserted = UserShopItem::insert(row)
        .on_conflict(
            OnConflict::columns([
                user_shop_item::Column::UserId,
                user_shop_item::Column::ItemId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(&db)
        .await;
    match inserted {
        Ok(_) => {}
        Err(DbErr::RecordNotInserted) => {
            return Err((StatusCode::BAD_REQUEST, "Item already owned".to_string()))
        }
        Err(e) => return Err(db_error(e)),
    }

    let balance = points::credit(&db, &claims.sub, -item.mausi_points_cost)
        .await
        .map_err(service_error)?;

    tracing::info!("item purchased: {} for {} points", item.id, item.mausi_points_cost);

    Ok(Json(json!({
        "item_id": item.id,
        "points": balance,
    })))
}
