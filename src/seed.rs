use crate::auth::hash_password;
use crate::models::{achievement, message, quest, shop_item, user};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;

/// The single profile row everything hangs off.
pub const PROFILE_USER_ID: &str = "maus-user";

fn ignore_conflict(res: Result<InsertResult<impl ActiveModelTrait>, DbErr>) -> Result<(), DbErr> {
    match res {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

/// Creates the profile row if it is missing. Runs on every startup;
/// without it there is nothing to log in to.
pub async fn ensure_profile_user(db: &DatabaseConnection, gate_password: &str) -> Result<(), DbErr> {
    let password_hash = hash_password(gate_password).unwrap();

    let profile = user::ActiveModel {
        user_id: Set(PROFILE_USER_ID.to_owned()),
        password_hash: Set(password_hash),
        points: Set(0),
        hamsti_clicks: Set(0),
        hamsti_skin: Set("hamsti_skin_1".to_owned()),
        login_streak: Set(0),
        mood_streak: Set(0),
        raetsel_streak: Set(0),
        last_login_date: Set(None),
        created_at: Set(chrono::Utc::now().to_rfc3339()),
        updated_at: Set(chrono::Utc::now().to_rfc3339()),
    };
    ignore_conflict(
        user::Entity::insert(profile)
            .on_conflict(
                OnConflict::column(user::Column::UserId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await,
    )?;

    Ok(())
}

pub async fn seed_demo_data(db: &DatabaseConnection, gate_password: &str) -> Result<(), DbErr> {
    // 1. Profile user
    ensure_profile_user(db, gate_password).await?;

    // 2. Achievement catalog
    // (name, description, rarity, reward, type, condition)
    let achievements = vec![
        ("Erster Besuch", "Zum ersten Mal eingeloggt", "common", 5, "login", r#"{"days": 1}"#),
        ("Treue Maus", "3 Tage in Folge eingeloggt", "common", 10, "login", r#"{"days": 3}"#),
        ("Stammgast", "7 Tage in Folge eingeloggt", "rare", 20, "login", r#"{"days": 7}"#),
        ("Immer da", "30 Tage in Folge eingeloggt", "epic", 50, "login", r#"{"days": 30}"#),
        ("Erste Botschaft", "Die erste Tagesnachricht gelesen", "common", 5, "message", r#"{"messages_read": 1}"#),
        ("Brieffreundin", "10 Tagesnachrichten gelesen", "rare", 15, "message", r#"{"messages_read": 10}"#),
        ("Liebesbriefe", "30 Tagesnachrichten gelesen", "epic", 40, "message", r#"{"messages_read": 30}"#),
        ("Gefühlsstart", "Die erste Stimmung eingetragen", "common", 5, "mood", r#"{"days": 1}"#),
        ("Gefühlswoche", "7 Stimmungen eingetragen", "rare", 20, "mood", r#"{"days": 7}"#),
        ("Seelenkalender", "30 Stimmungen eingetragen", "epic", 50, "mood", r#"{"days": 30}"#),
        ("Rätselanfängerin", "Das erste Rätsel gelöst", "common", 5, "puzzle", r#"{"solved": 1}"#),
        ("Rätselfuchs", "7 Rätsel gelöst", "rare", 20, "puzzle", r#"{"solved": 7}"#),
        ("Rätselmeisterin", "30 Rätsel gelöst", "epic", 50, "puzzle", r#"{"solved": 30}"#),
        ("Hamsti-Freundin", "Hamsti 100 Mal gestreichelt", "common", 10, "hamsti_clicker", r#"{"clicks": 100}"#),
        ("Hamsti-Flüsterin", "Hamsti 1000 Mal gestreichelt", "rare", 25, "hamsti_clicker", r#"{"clicks": 1000}"#),
        ("Hamsti-Göttin", "Hamsti 10000 Mal gestreichelt", "legendary", 100, "hamsti_clicker", r#"{"clicks": 10000}"#),
        ("Punktesammlerin", "100 Mausi-Punkte gesammelt", "common", 10, "points", r#"{"points_earned": 100}"#),
        ("Punktejägerin", "500 Mausi-Punkte gesammelt", "rare", 25, "points", r#"{"points_earned": 500}"#),
        ("Punktemagnat", "2000 Mausi-Punkte gesammelt", "epic", 60, "points", r#"{"points_earned": 2000}"#),
        ("Jahrestag", "Ein besonderer Tag ist gekommen", "legendary", 50, "date", r#"{"date_unlock": "2025-10-01"}"#),
        ("Überfliegerin", "10 Achievements an einem Tag freigeschaltet", "legendary", 100, "meta", "{}"),
        ("bro zieht durch", "60 Achievements freigeschaltet", "legendary", 200, "meta", "{}"),
    ];

    for (name, description, rarity, reward, kind, condition) in achievements {
        let row = achievement::ActiveModel {
            name: Set(name.to_owned()),
            description: Set(Some(description.to_owned())),
            rarity: Set(rarity.to_owned()),
            reward_points: Set(reward),
            r#type: Set(kind.to_owned()),
            condition: Set(condition.to_owned()),
            ..Default::default()
        };
        ignore_conflict(
            achievement::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(achievement::Column::Name)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(db)
                .await,
        )?;
    }

    // 3. Daily messages - only seed when the pool is empty, the texts
    // have no natural unique key
    if message::Entity::find().count(db).await? == 0 {
        let texts = vec![
            "Guten Morgen, Maus! Heute wird ein schöner Tag.",
            "Du schaffst das heute, da bin ich mir sicher.",
            "Denk dran: eine kleine Pause wirkt Wunder.",
            "Hamsti und ich denken an dich!",
            "Du bist die beste Maus im ganzen Mausiversum.",
            "Heute gibt es bestimmt etwas zu lachen.",
            "Vergiss nicht zu trinken, kleine Maus!",
        ];
        for text in texts {
            let row = message::ActiveModel {
                text: Set(text.to_owned()),
                r#type: Set("daily".to_owned()),
                ..Default::default()
            };
            message::Entity::insert(row).exec(db).await?;
        }
    }

    // 4. Sidequests
    if quest::Entity::find().count(db).await? == 0 {
        let quests = vec![
            (
                "Wie viele Beine hat ein Hamster?",
                "mc",
                Some(r#"["2", "4", "6", "8"]"#),
                Some("4"),
                10,
            ),
            (
                "Was frisst Hamsti am liebsten?",
                "mc",
                Some(r#"["Körner", "Pizza", "Steine", "Luft"]"#),
                Some("Körner"),
                10,
            ),
            (
                "Schreib auf, was dich heute glücklich gemacht hat.",
                "text",
                None,
                None,
                15,
            ),
            ("Mach heute einen kleinen Spaziergang.", "task", None, None, 15),
            (
                "Wie heißt unser Hamster?",
                "mc",
                Some(r#"["Hansi", "Hamsti", "Harald", "Helga"]"#),
                Some("Hamsti"),
                10,
            ),
        ];
        for (question, kind, options, solution, reward) in quests {
            let row = quest::ActiveModel {
                question: Set(question.to_owned()),
                r#type: Set(kind.to_owned()),
                options: Set(options.map(|s| s.to_owned())),
                solution: Set(solution.map(|s| s.to_owned())),
                reward_points: Set(reward),
                ..Default::default()
            };
            quest::Entity::insert(row).exec(db).await?;
        }
    }

    // 5. Shop items
    // (id, title, description, icon, rarity, rarity_order, cost, category)
    let items = vec![
        ("date_night", "Date-Abend", "Ein Abend nur für uns zwei", "🌙", "epic", 3, 300, "romantic"),
        ("breakfast_in_bed", "Frühstück ans Bett", "Einmal Frühstück ans Bett geliefert", "🥐", "rare", 2, 150, "treats"),
        ("movie_choice", "Filmwahl", "Du suchst den nächsten Film aus", "🎬", "common", 1, 80, "treats"),
        ("massage", "Massage", "15 Minuten Massage", "💆", "rare", 2, 200, "romantic"),
        ("day_trip", "Tagesausflug", "Ein Ausflug deiner Wahl", "🚗", "legendary", 4, 500, "experiences"),
        ("hamsti_skin_2", "Goldener Hamsti", "Ein neues Fell für Hamsti", "🐹", "epic", 3, 400, "special"),
        ("hamsti_skin_3", "Regenbogen-Hamsti", "Hamsti in allen Farben", "🌈", "legendary", 4, 800, "special"),
    ];

    for (id, title, description, icon, rarity, rarity_order, cost, category) in items {
        let row = shop_item::ActiveModel {
            id: Set(id.to_owned()),
            title: Set(title.to_owned()),
            description: Set(Some(description.to_owned())),
            icon: Set(Some(icon.to_owned())),
            color: Set(None),
            rarity: Set(rarity.to_owned()),
            rarity_order: Set(rarity_order),
            mausi_points_cost: Set(cost),
            category: Set(category.to_owned()),
        };
        ignore_conflict(
            shop_item::Entity::insert(row)
                .on_conflict(
                    OnConflict::column(shop_item::Column::Id)
                        .do_nothing()
                        .to_owned(),
                )
                .exec(db)
                .await,
        )?;
    }

    Ok(())
}
