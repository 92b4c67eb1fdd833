//! Feature flow tests that drive the handlers directly: daily message,
//! mood calendar, sidequests and the shop, all against an in-memory
//! database.

use axum::extract::{Json, State};
use chrono::Utc;
use mausiverse::api::{clicker, messages, mood, quests, shop};
use mausiverse::auth::{Claims, ROLE_MAUS};
use mausiverse::db;
use mausiverse::models::{achievement, message, quest, shop_item, user, user_achievement};
use mausiverse::services::engine::{DAILY_BURST_NAME, DAILY_BURST_THRESHOLD};
use mausiverse::services::points;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use serde_json::json;

const USER: &str = "maus-user";

async fn setup_test_db() -> DatabaseConnection {
    let db = db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB");
    let now = Utc::now().to_rfc3339();
    let profile = user::ActiveModel {
        user_id: Set(USER.to_string()),
        password_hash: Set("$argon2id$dummy".to_string()),
        points: Set(0),
        hamsti_clicks: Set(0),
        hamsti_skin: Set("hamsti_skin_1".to_string()),
        login_streak: Set(0),
        mood_streak: Set(0),
        raetsel_streak: Set(0),
        last_login_date: Set(None),
        created_at: Set(now.clone()),
        updated_at: Set(now),
    };
    user::Entity::insert(profile)
        .exec(&db)
        .await
        .expect("Failed to create profile");
    db
}

fn claims() -> Claims {
    Claims {
        sub: USER.to_string(),
        role: ROLE_MAUS.to_string(),
        exp: usize::MAX,
    }
}

#[tokio::test]
async fn daily_message_sticks_for_the_day_and_reads_once() {
    let db = setup_test_db().await;
    for text in ["Hallo Maus!", "Schönen Tag!"] {
        let row = message::ActiveModel {
            text: Set(text.to_string()),
            r#type: Set("daily".to_string()),
            ..Default::default()
        };
        message::Entity::insert(row).exec(&db).await.expect("seed message");
    }

    let first = messages::get_daily_message(claims(), State(db.clone()))
        .await
        .expect("assign")
        .0;
    let second = messages::get_daily_message(claims(), State(db.clone()))
        .await
        .expect("reload")
        .0;
    assert_eq!(first["message"]["id"], second["message"]["id"]);
    assert_eq!(first["status"], "assigned");

    let read = messages::mark_read(claims(), State(db.clone()))
        .await
        .expect("read")
        .0;
    assert_eq!(read["status"], "read");

    // Re-reading changes nothing
    let reread = messages::mark_read(claims(), State(db.clone()))
        .await
        .expect("reread")
        .0;
    assert_eq!(reread["unlocked_achievements"], json!([]));
}

#[tokio::test]
async fn mood_save_overwrite_and_delete() {
    let db = setup_test_db().await;

    let saved = mood::save_mood(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "mood": "happy" })).expect("payload")),
    )
    .await
    .expect("save")
    .0;
    assert_eq!(saved["mood_streak"], 1);
    assert_eq!(saved["entry_count"], 1);

    // Same day again: overwrite, not a second entry
    let saved = mood::save_mood(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "mood": "tired", "note": "long day" })).expect("payload")),
    )
    .await
    .expect("overwrite")
    .0;
    assert_eq!(saved["entry_count"], 1);

    let today = mood::get_today(claims(), State(db.clone()))
        .await
        .expect("get")
        .0;
    assert_eq!(today["entry"]["mood"], "tired");

    let deleted = mood::delete_today(claims(), State(db.clone()))
        .await
        .expect("delete")
        .0;
    assert_eq!(deleted["mood_streak"], 0);

    let today = mood::get_today(claims(), State(db.clone()))
        .await
        .expect("get")
        .0;
    assert_eq!(today["entry"], json!(null));
}

#[tokio::test]
async fn quest_grading_and_single_reward() {
    let db = setup_test_db().await;
    let row = quest::ActiveModel {
        question: Set("Wie viele Beine hat ein Hamster?".to_string()),
        r#type: Set("mc".to_string()),
        options: Set(Some(r#"["2", "4", "6"]"#.to_string())),
        solution: Set(Some("4".to_string())),
        reward_points: Set(10),
        ..Default::default()
    };
    quest::Entity::insert(row).exec(&db).await.expect("seed quest");

    let assigned = quests::get_daily_quest(claims(), State(db.clone()))
        .await
        .expect("assign")
        .0;
    assert_eq!(assigned["status"], "assigned");
    // Solutions never leave the server
    assert!(assigned["quest"].get("solution").is_none());

    let wrong = quests::solve_quest(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "answer": "6" })).expect("payload")),
    )
    .await
    .expect("wrong answer")
    .0;
    assert_eq!(wrong["correct"], false);
    assert_eq!(points::balance(&db, USER).await.expect("balance"), 0);

    let right = quests::solve_quest(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "answer": "4" })).expect("payload")),
    )
    .await
    .expect("right answer")
    .0;
    assert_eq!(right["correct"], true);
    assert_eq!(right["points"], 10);
    assert_eq!(right["raetsel_streak"], 1);

    // Solving again does not pay twice
    let again = quests::solve_quest(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "answer": "4" })).expect("payload")),
    )
    .await
    .expect("resolve")
    .0;
    assert_eq!(again["already_solved"], true);
    assert_eq!(points::balance(&db, USER).await.expect("balance"), 10);
}

#[tokio::test]
async fn shop_purchase_guards_and_deducts() {
    let db = setup_test_db().await;
    let item = shop_item::ActiveModel {
        id: Set("date_night".to_string()),
        title: Set("Date-Abend".to_string()),
        description: Set(None),
        icon: Set(None),
        color: Set(None),
        rarity: Set("epic".to_string()),
        rarity_order: Set(3),
        mausi_points_cost: Set(100),
        category: Set("romantic".to_string()),
    };
    shop_item::Entity::insert(item).exec(&db).await.expect("seed item");

    let payload = || {
        Json(serde_json::from_value(json!({ "item_id": "date_night" })).expect("payload"))
    };

    // Too poor
    let err = shop::purchase(claims(), State(db.clone()), payload())
        .await
        .expect_err("must fail");
    assert_eq!(err.1, "Not enough points");

    points::set_balance(&db, USER, 150).await.expect("fund");

    let bought = shop::purchase(claims(), State(db.clone()), payload())
        .await
        .expect("purchase")
        .0;
    assert_eq!(bought["points"], 50);

    let err = shop::purchase(claims(), State(db.clone()), payload())
        .await
        .expect_err("must fail");
    assert_eq!(err.1, "Item already owned");

    let listing = shop::list_items(claims(), State(db.clone()))
        .await
        .expect("list")
        .0;
    assert_eq!(listing["items"][0]["owned"], true);
    assert_eq!(listing["points"], 50);
}

#[tokio::test]
async fn handler_driven_unlocks_land_in_the_daily_burst_window() {
    let db = setup_test_db().await;
    for i in 0..DAILY_BURST_THRESHOLD {
        let row = achievement::ActiveModel {
            name: Set(format!("Mood {}", i)),
            description: Set(None),
            rarity: Set("common".to_string()),
            reward_points: Set(0),
            r#type: Set("mood".to_string()),
            condition: Set(r#"{"days": 1}"#.to_string()),
            ..Default::default()
        };
        achievement::Entity::insert(row).exec(&db).await.expect("seed achievement");
    }
    let meta = achievement::ActiveModel {
        name: Set(DAILY_BURST_NAME.to_string()),
        description: Set(None),
        rarity: Set("legendary".to_string()),
        reward_points: Set(100),
        r#type: Set("meta".to_string()),
        condition: Set("{}".to_string()),
        ..Default::default()
    };
    achievement::Entity::insert(meta).exec(&db).await.expect("seed meta");

    // One mood save unlocks all ten, which must count as today's unlocks
    // and fire the burst meta in the same pass
    let saved = mood::save_mood(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "mood": "happy" })).expect("payload")),
    )
    .await
    .expect("save")
    .0;

    let names: Vec<&str> = saved["unlocked_achievements"]
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|u| u["name"].as_str())
        .collect();
    assert!(names.contains(&DAILY_BURST_NAME));
    assert_eq!(names.len() as u64, DAILY_BURST_THRESHOLD + 1);

    // Every stored timestamp carries the same day the handlers anchor on
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    let unlocks = user_achievement::Entity::find()
        .filter(user_achievement::Column::UserId.eq(USER))
        .all(&db)
        .await
        .expect("unlocks");
    assert!(unlocks.iter().all(|u| u.achieved_at.starts_with(&today)));
}

#[tokio::test]
async fn clicker_counts_and_skin_requires_ownership() {
    let db = setup_test_db().await;

    for _ in 0..3 {
        clicker::click(claims(), State(db.clone())).await.expect("click");
    }
    let state = clicker::get_state(claims(), State(db.clone()))
        .await
        .expect("state")
        .0;
    assert_eq!(state["clicks"], 3);
    assert_eq!(state["skin"], "hamsti_skin_1");

    let err = clicker::set_skin(
        claims(),
        State(db.clone()),
        Json(serde_json::from_value(json!({ "skin": "hamsti_skin_2" })).expect("payload")),
    )
    .await
    .expect_err("must fail");
    assert_eq!(err.1, "Skin not owned");

    let reset = clicker::reset(claims(), State(db.clone()))
        .await
        .expect("reset")
        .0;
    assert_eq!(reset["clicks"], 0);
}
