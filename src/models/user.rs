use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The single-tenant profile row. Points and hamsti_clicks are the only
/// counters mutated in place; every other activity count is derived by
/// querying its table. The three streak columns are denormalized for
/// display and recomputed on each qualifying write.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub points: i64,
    pub hamsti_clicks: i64,
    pub hamsti_skin: String,
    pub login_streak: i32,
    pub mood_streak: i32,
    pub raetsel_streak: i32,
    pub last_login_date: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
