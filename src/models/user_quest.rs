use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Quest assignment/solve record. `solved_at` carries the assignment date
/// while status is 'assigned' and stays put when it flips to 'solved';
/// the quest streak walks over solved dates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_quests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub quest_id: i32,
    pub status: String, // 'assigned', 'solved'
    pub solved_at: String, // YYYY-MM-DD
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::quest::Entity",
        from = "Column::QuestId",
        to = "super::quest::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Quest,
}

impl Related<super::quest::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
