pub mod achievement;
pub mod countdown;
pub mod message;
pub mod mood_entry;
pub mod quest;
pub mod shop_item;
pub mod user;
pub mod user_achievement;
pub mod user_daily_message;
pub mod user_quest;
pub mod user_shop_item;
