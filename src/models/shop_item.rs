use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shop_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub rarity: String,
    pub rarity_order: i32,
    pub mausi_points_cost: i64,
    pub category: String, // 'romantic', 'treats', 'experiences', 'special'
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_shop_item::Entity")]
    UserShopItem,
}

impl Related<super::user_shop_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserShopItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
