use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Single-tenant profile table
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS users (
            user_id TEXT PRIMARY KEY,
            password_hash TEXT NOT NULL,
            points INTEGER NOT NULL DEFAULT 0,
            hamsti_clicks INTEGER NOT NULL DEFAULT 0,
            hamsti_skin TEXT NOT NULL DEFAULT 'hamsti_skin_1',
            login_streak INTEGER NOT NULL DEFAULT 0,
            mood_streak INTEGER NOT NULL DEFAULT 0,
            raetsel_streak INTEGER NOT NULL DEFAULT 0,
            last_login_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Achievement catalog; the meta rules look achievements up by name,
    // so names are unique
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            rarity TEXT NOT NULL DEFAULT 'common',
            reward_points INTEGER NOT NULL DEFAULT 0,
            type TEXT NOT NULL,
            condition TEXT NOT NULL DEFAULT '{}'
        )
        "#
        .to_owned(),
    ))
    .await?;

    // Unlock records; the UNIQUE pair index is what makes the unlock
    // sink idempotent under concurrent writers
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_achievements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            achievement_id INTEGER NOT NULL,
            achieved_at TEXT NOT NULL,
            UNIQUE(user_id, achievement_id),
            FOREIGN KEY (achievement_id) REFERENCES achievements(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            text TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'daily'
        )
        "#
        .to_owned(),
    ))
    .await?;

    // One message per user per calendar day
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_daily_messages (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            message_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'assigned',
            assigned_at TEXT NOT NULL,
            UNIQUE(user_id, assigned_at),
            FOREIGN KEY (message_id) REFERENCES messages(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS quests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            question TEXT NOT NULL,
            type TEXT NOT NULL DEFAULT 'mc',
            options TEXT,
            solution TEXT,
            reward_points INTEGER NOT NULL DEFAULT 0
        )
        "#
        .to_owned(),
    ))
    .await?;

    // solved_at doubles as the assignment date while status is 'assigned'
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_quests (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            quest_id INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'assigned',
            solved_at TEXT NOT NULL,
            UNIQUE(user_id, solved_at),
            FOREIGN KEY (quest_id) REFERENCES quests(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    // One mood entry per user per day; saving twice overwrites
    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_mood_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            date TEXT NOT NULL,
            mood TEXT NOT NULL,
            note TEXT,
            UNIQUE(user_id, date)
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS shop_items (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            icon TEXT,
            color TEXT,
            rarity TEXT NOT NULL DEFAULT 'common',
            rarity_order INTEGER NOT NULL DEFAULT 0,
            mausi_points_cost INTEGER NOT NULL DEFAULT 0,
            category TEXT NOT NULL DEFAULT 'special'
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS user_shop_items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            item_id TEXT NOT NULL,
            unlocked_at TEXT NOT NULL,
            UNIQUE(user_id, item_id),
            FOREIGN KEY (item_id) REFERENCES shop_items(id) ON DELETE CASCADE
        )
        "#
        .to_owned(),
    ))
    .await?;

    db.execute(Statement::from_string(
        db.get_database_backend(),
        r#"
        CREATE TABLE IF NOT EXISTS countdowns (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            title TEXT NOT NULL,
            target_date TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#
        .to_owned(),
    ))
    .await?;

    Ok(())
}
