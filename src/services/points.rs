//! Point balance mutations.
//!
//! Every balance change goes through a single SQL `points = points + ?`
//! update so concurrent credits cannot double-apply a delta. There is no
//! read-modify-write path.

use sea_orm::sea_query::Expr;
use sea_orm::*;

use super::ServiceError;
use crate::models::user;

/// Adds `delta` (which may be negative) to the user's balance and
/// returns the new balance.
pub async fn credit(
    db: &DatabaseConnection,
    user_id: &str,
    delta: i64,
) -> Result<i64, ServiceError> {
    let res = user::Entity::update_many()
        .col_expr(
            user::Column::Points,
            Expr::col(user::Column::Points).add(delta),
        )
        .filter(user::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::NotFound);
    }
    balance(db, user_id).await
}

pub async fn balance(db: &DatabaseConnection, user_id: &str) -> Result<i64, ServiceError> {
    let user = user::Entity::find_by_id(user_id.to_owned())
        .one(db)
        .await?
        .ok_or(ServiceError::NotFound)?;
    Ok(user.points)
}

/// Absolute set, used only by the admin panel.
pub async fn set_balance(
    db: &DatabaseConnection,
    user_id: &str,
    points: i64,
) -> Result<(), ServiceError> {
    let res = user::Entity::update_many()
        .col_expr(user::Column::Points, Expr::value(points))
        .filter(user::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if res.rows_affected == 0 {
        return Err(ServiceError::NotFound);
    }
    Ok(())
}
