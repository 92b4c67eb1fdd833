use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily message assignment. The UNIQUE(user_id, assigned_at) index keeps
/// at most one message per calendar day, which the message-streak walk
/// relies on.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_daily_messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: String,
    pub message_id: i32,
    pub status: String, // 'assigned', 'read'
    pub assigned_at: String, // YYYY-MM-DD
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::message::Entity",
        from = "Column::MessageId",
        to = "super::message::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Message,
}

impl Related<super::message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Message.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
