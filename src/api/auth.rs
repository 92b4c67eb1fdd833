use crate::api::{db_error, AppState};
use crate::auth::{create_jwt, verify_password, Claims, ROLE_ADMIN, ROLE_MAUS};
use crate::models::user::{self, Entity as User};
use crate::seed::PROFILE_USER_ID;
use crate::services::catalog::AchievementKind;
use crate::services::engine::AchievementEngine;
use crate::services::points;
use axum::{extract::State, http::StatusCode, Json};
use chrono::{Duration, Utc};
use sea_orm::*;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
pub struct LoginRequest {
    password: String,
}

/// Single-tenant gate: one profile row, two passwords. The gate password
/// is verified against the stored hash, the admin password comes from
/// the environment and grants the admin role on top of the same profile.
///
/// The first successful login of a calendar day advances the login
/// streak, earns a point and runs the achievement checks; later logins
/// on the same day only hand out a fresh token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let db = &state.db;

    let profile = User::find_by_id(PROFILE_USER_ID.to_owned())
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Profile user missing".to_string(),
        ))?;

    let role = if verify_password(&payload.password, &profile.password_hash).unwrap_or(false) {
        ROLE_MAUS
    } else if payload.password == state.config.admin_password {
        ROLE_ADMIN
    } else {
        tracing::warn!("login rejected: wrong password");
        return Err((StatusCode::UNAUTHORIZED, "Invalid password".to_string()));
    };

    let today = Utc::now().date_naive();
    let today_str = today.format("%Y-%m-%d").to_string();
    let mut unlocked = Vec::new();

    if profile.last_login_date.as_deref() != Some(today_str.as_str()) {
        let yesterday = (today - Duration::days(1)).format("%Y-%m-%d").to_string();
        let new_streak = if profile.last_login_date.as_deref() == Some(yesterday.as_str()) {
            profile.login_streak + 1
        } else {
            1
        };

        let mut active: user::ActiveModel = profile.clone().into();
        active.login_streak = Set(new_streak);
        active.last_login_date = Set(Some(today_str));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(db).await.map_err(db_error)?;

        // First login of the day earns a point
        if let Err(e) = points::credit(db, PROFILE_USER_ID, 1).await {
            tracing::error!("failed to credit daily login point: {}", e);
        }

        // Achievement failures never block the login itself
        match AchievementEngine::load(db, PROFILE_USER_ID).await {
            Ok(mut engine) => {
                unlocked.extend(
                    engine
                        .check_thresholds(db, AchievementKind::Login, new_streak as i64, today)
                        .await,
                );
                unlocked.extend(engine.check_date_gates(db, today).await);
                let balance = engine.points();
                unlocked.extend(
                    engine
                        .check_thresholds(db, AchievementKind::Points, balance, today)
                        .await,
                );
            }
            Err(e) => tracing::error!("achievement evaluation failed on login: {}", e),
        }
    }

    let token = create_jwt(PROFILE_USER_ID, role)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e))?;

    let profile = User::find_by_id(PROFILE_USER_ID.to_owned())
        .one(db)
        .await
        .map_err(db_error)?
        .ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Profile user missing".to_string(),
        ))?;

    tracing::info!("login successful with role '{}'", role);

    Ok(Json(json!({
        "token": token,
        "role": role,
        "user": profile,
        "unlocked_achievements": unlocked,
    })))
}

pub async fn get_me(
    claims: Claims,
    State(db): State<DatabaseConnection>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let profile = User::find_by_id(claims.sub.clone())
        .one(&db)
        .await
        .map_err(db_error)?
        .ok_or((StatusCode::NOT_FOUND, "User not found".to_string()))?;

    Ok(Json(json!({ "user": profile, "role": claims.role })))
}
