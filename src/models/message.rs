use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "messages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub text: String,
    pub r#type: String, // 'daily'
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_daily_message::Entity")]
    UserDailyMessage,
}

impl Related<super::user_daily_message::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserDailyMessage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
