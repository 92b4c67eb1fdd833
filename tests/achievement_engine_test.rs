//! Engine-level tests against an in-memory database: batch threshold
//! unlocks, idempotent unlocking, date gates and the meta rules.

use chrono::{Duration, Utc};
use mausiverse::db;
use mausiverse::models::{achievement, user, user_achievement};
use mausiverse::services::catalog::AchievementKind;
use mausiverse::services::engine::{
    AchievementEngine, COMPLETION_NAME, COMPLETION_THRESHOLD, DAILY_BURST_NAME,
    DAILY_BURST_THRESHOLD,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set};

const USER: &str = "maus-user";

async fn setup_test_db() -> DatabaseConnection {
    db::init_db("sqlite::memory:")
        .await
        .expect("Failed to init DB")
}

async fn create_profile(db: &DatabaseConnection) {
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
        .exec(db)
        .await
        .expect("Failed to create profile");
}

async fn create_achievement(
    db: &DatabaseConnection,
    name: &str,
    kind: &str,
    condition: &str,
    reward: i64,
) -> i32 {
    let row = achievement::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        rarity: Set("common".to_string()),
        reward_points: Set(reward),
        r#type: Set(kind.to_string()),
        condition: Set(condition.to_string()),
        ..Default::default()
    };
    achievement::Entity::insert(row)
        .exec(db)
        .await
        .expect("Failed to create achievement")
        .last_insert_id
}

async fn unlock_count(db: &DatabaseConnection) -> u64 {
    user_achievement::Entity::find()
        .filter(user_achievement::Column::UserId.eq(USER))
        .count(db)
        .await
        .expect("Failed to count unlocks")
}

#[tokio::test]
async fn reaching_a_value_fires_every_threshold_up_to_it() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    create_achievement(&db, "One", "puzzle", r#"{"solved": 1}"#, 5).await;
    create_achievement(&db, "Three", "puzzle", r#"{"solved": 3}"#, 5).await;
    create_achievement(&db, "Seven", "puzzle", r#"{"solved": 7}"#, 5).await;
    create_achievement(&db, "Thirty", "puzzle", r#"{"solved": 30}"#, 5).await;

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");
    let unlocked = engine
        .check_thresholds(&db, AchievementKind::Puzzle, 7, today)
        .await;

    let names: Vec<&str> = unlocked.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(names, vec!["One", "Three", "Seven"]);
    assert_eq!(unlock_count(&db).await, 3);
    // Three unlocks at 5 points each
    assert_eq!(engine.points(), 15);
}

#[tokio::test]
async fn rechecking_never_unlocks_twice() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    create_achievement(&db, "One", "puzzle", r#"{"solved": 1}"#, 10).await;

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");
    assert_eq!(
        engine
            .check_thresholds(&db, AchievementKind::Puzzle, 2, today)
            .await
            .len(),
        1
    );
    assert!(engine
        .check_thresholds(&db, AchievementKind::Puzzle, 5, today)
        .await
        .is_empty());

    // A freshly loaded engine sees the stored unlock too
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");
    assert!(engine
        .check_thresholds(&db, AchievementKind::Puzzle, 5, today)
        .await
        .is_empty());

    assert_eq!(unlock_count(&db).await, 1);
    assert_eq!(engine.points(), 10);
}

#[tokio::test]
async fn direct_unlock_is_idempotent() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    let id = create_achievement(&db, "Surprise", "date", r#"{"date_unlock": "2099-01-01"}"#, 20).await;

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");
    let first = engine.unlock(&db, id, today).await.expect("unlock");
    assert_eq!(first.len(), 1);
    let again = engine.unlock(&db, id, today).await.expect("unlock");
    assert!(again.is_empty());

    assert_eq!(unlock_count(&db).await, 1);
    assert_eq!(engine.points(), 20);
}

#[tokio::test]
async fn date_gates_open_on_and_after_their_day() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    let today = Utc::now().date_naive();
    let yesterday = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
    let tomorrow = (today + Duration::days(1)).format("%Y-%m-%d").to_string();
    let today_str = today.format("%Y-%m-%d").to_string();

    create_achievement(
        &db,
        "Past",
        "date",
        &format!(r#"{{"date_unlock": "{}"}}"#, yesterday),
        5,
    )
    .await;
    create_achievement(
        &db,
        "Today",
        "date",
        &format!(r#"{{"date_unlock": "{}"}}"#, today_str),
        5,
    )
    .await;
    create_achievement(
        &db,
        "Future",
        "date",
        &format!(r#"{{"date_unlock": "{}"}}"#, tomorrow),
        5,
    )
    .await;

    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");
    let unlocked = engine.check_date_gates(&db, today).await;
    let mut names: Vec<&str> = unlocked.iter().map(|u| u.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Past", "Today"]);

    // Second run is a no-op
    assert!(engine.check_date_gates(&db, today).await.is_empty());
    assert_eq!(unlock_count(&db).await, 2);
}

#[tokio::test]
async fn daily_burst_fires_at_ten_unlocks_in_one_day() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    let mut ids = Vec::new();
    for i in 0..DAILY_BURST_THRESHOLD {
        ids.push(create_achievement(&db, &format!("Filler {}", i), "puzzle", r#"{"solved": 999}"#, 0).await);
    }
    create_achievement(&db, DAILY_BURST_NAME, "meta", "{}", 100).await;

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");

    for id in &ids[..ids.len() - 1] {
        let batch = engine.unlock(&db, *id, today).await.expect("unlock");
        assert_eq!(batch.len(), 1, "meta must not fire before the tenth");
    }

    let batch = engine.unlock(&db, ids[ids.len() - 1], today).await.expect("unlock");
    let names: Vec<&str> = batch.iter().map(|u| u.name.as_str()).collect();
    assert!(names.contains(&DAILY_BURST_NAME));
    assert_eq!(unlock_count(&db).await, DAILY_BURST_THRESHOLD + 1);
}

#[tokio::test]
async fn completion_meta_fires_once_at_sixty() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    let mut ids = Vec::new();
    for i in 0..COMPLETION_THRESHOLD {
        ids.push(create_achievement(&db, &format!("Filler {}", i), "puzzle", r#"{"solved": 999}"#, 0).await);
    }
    create_achievement(&db, COMPLETION_NAME, "meta", "{}", 200).await;

    let today = Utc::now().date_naive();
    let mut engine = AchievementEngine::load(&db, USER).await.expect("load");

    let mut meta_unlocks = 0;
    for id in &ids {
        let batch = engine.unlock(&db, *id, today).await.expect("unlock");
        meta_unlocks += batch.iter().filter(|u| u.name == COMPLETION_NAME).count();
    }

    assert_eq!(meta_unlocks, 1);
    assert_eq!(unlock_count(&db).await, COMPLETION_THRESHOLD + 1);
}

#[tokio::test]
async fn losing_the_unlock_race_surfaces_the_winning_timestamp() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    let id = create_achievement(&db, "Contested", "puzzle", r#"{"solved": 1}"#, 5).await;

    let today = Utc::now().date_naive();
    let mut stale = AchievementEngine::load(&db, USER).await.expect("load");

    // A second engine wins the unlock while the first still sees it locked
    let mut winner = AchievementEngine::load(&db, USER).await.expect("load");
    assert_eq!(winner.unlock(&db, id, today).await.expect("unlock").len(), 1);

    let batch = stale.unlock(&db, id, today).await.expect("unlock");
    assert!(batch.is_empty());

    let entry = stale
        .entries()
        .iter()
        .find(|e| e.id == id)
        .expect("entry present");
    assert!(entry.unlocked);
    assert!(
        entry.unlocked_at.is_some(),
        "an unlock observed from another writer must carry its timestamp"
    );
    assert_eq!(unlock_count(&db).await, 1);
}

#[tokio::test]
async fn unknown_types_are_skipped_not_fatal() {
    let db = setup_test_db().await;
    create_profile(&db).await;
    create_achievement(&db, "Mystery", "telepathy", r#"{"thoughts": 1}"#, 5).await;
    create_achievement(&db, "Normal", "puzzle", r#"{"solved": 1}"#, 5).await;

    let engine = AchievementEngine::load(&db, USER).await.expect("load");
    assert_eq!(engine.total_count(), 1);
}
