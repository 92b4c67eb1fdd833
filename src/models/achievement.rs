use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog entry. `condition` is a JSON object with a single key/value
/// pair whose key depends on `type`; it is decoded once at load time by
/// `services::catalog`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "achievements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub rarity: String, // 'common', 'rare', 'epic', 'legendary'
    pub reward_points: i64,
    pub r#type: String, // 'login', 'message', 'mood', 'puzzle', 'hamsti_clicker', 'points', 'date', 'meta'
    pub condition: String, // JSON object
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_achievement::Entity")]
    UserAchievement,
}

impl Related<super::user_achievement::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAchievement.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
