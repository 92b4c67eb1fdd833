use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One mood entry per (user, date); the write path upserts on that key so
/// the streak walk never sees two entries for the same day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_mood_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub date: String, // YYYY-MM-DD
    pub mood: String,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
