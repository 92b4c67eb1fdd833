//! Achievement Catalog - typed view over the `achievements` table.
//!
//! Conditions are stored as a JSON object with a single key/value pair
//! whose meaning depends on the achievement type. They are decoded once
//! here when the catalog loads, so the evaluators never do string
//! matching at check time.

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::achievement;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AchievementKind {
    Login,
    Message,
    Mood,
    Puzzle,
    HamstiClicker,
    Points,
    Date,
    Meta,
}

impl AchievementKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "login" => Some(Self::Login),
            "message" => Some(Self::Message),
            "mood" => Some(Self::Mood),
            "puzzle" => Some(Self::Puzzle),
            "hamsti_clicker" => Some(Self::HamstiClicker),
            "points" => Some(Self::Points),
            "date" => Some(Self::Date),
            "meta" => Some(Self::Meta),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Message => "message",
            Self::Mood => "mood",
            Self::Puzzle => "puzzle",
            Self::HamstiClicker => "hamsti_clicker",
            Self::Points => "points",
            Self::Date => "date",
            Self::Meta => "meta",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Numeric threshold keyed by the measured quantity, e.g.
    /// `{"messages_read": 10}` or `{"days": 7}`.
    Threshold { field: String, value: i64 },
    /// Calendar gate, `{"date_unlock": "YYYY-MM-DD"}`.
    DateUnlock(NaiveDate),
    /// Empty or malformed condition; never fires on its own (meta
    /// achievements land here, they are unlocked by the meta rules).
    Unsatisfiable,
}

impl Condition {
    pub fn decode(kind: AchievementKind, raw: &str) -> Condition {
        let value: Value = match serde_json::from_str(raw) {
            Ok(v) => v,
            Err(_) => return Condition::Unsatisfiable,
        };
        let obj = match value.as_object() {
            Some(o) if !o.is_empty() => o,
            _ => return Condition::Unsatisfiable,
        };
        // The catalog schema guarantees a single key/value pair; extra
        // keys are ignored, only the first is read.
        let Some((key, val)) = obj.iter().next() else {
            return Condition::Unsatisfiable;
        };
        match kind {
            AchievementKind::Date => match (key.as_str(), val.as_str()) {
                ("date_unlock", Some(s)) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map(Condition::DateUnlock)
                    .unwrap_or(Condition::Unsatisfiable),
                _ => Condition::Unsatisfiable,
            },
            _ => match val.as_i64() {
                Some(n) => Condition::Threshold {
                    field: key.clone(),
                    value: n,
                },
                None => Condition::Unsatisfiable,
            },
        }
    }

    /// Whether `current` satisfies this condition for an activity of
    /// `kind`. Points and message achievements are gated on their
    /// specific condition field; every other kind accepts any numeric
    /// condition. Thresholds are `>=`, never `==`.
    pub fn satisfied_by(&self, kind: AchievementKind, current: i64) -> bool {
        match self {
            Condition::Threshold { field, value } => {
                let field_ok = match kind {
                    AchievementKind::Points => field == "points_earned",
                    AchievementKind::Message => field == "messages_read",
                    _ => true,
                };
                field_ok && current >= *value
            }
            _ => false,
        }
    }
}

/// One decoded catalog row plus the user's unlock state.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub rarity: String,
    pub reward_points: i64,
    pub kind: AchievementKind,
    pub condition: Condition,
    pub unlocked: bool,
    pub unlocked_at: Option<String>,
}

impl CatalogEntry {
    /// Returns None for rows with an unrecognized type discriminator;
    /// those can never be evaluated and are dropped with a warning.
    pub fn from_model(model: &achievement::Model) -> Option<CatalogEntry> {
        let kind = match AchievementKind::parse(&model.r#type) {
            Some(k) => k,
            None => {
                tracing::warn!(
                    "achievement {} ('{}') has unknown type '{}', skipping",
                    model.id,
                    model.name,
                    model.r#type
                );
                return None;
            }
        };
        let condition = Condition::decode(kind, &model.condition);
        if condition == Condition::Unsatisfiable && kind != AchievementKind::Meta {
            tracing::warn!(
                "achievement {} ('{}') has an undecodable condition: {}",
                model.id,
                model.name,
                model.condition
            );
        }
        Some(CatalogEntry {
            id: model.id,
            name: model.name.clone(),
            description: model.description.clone(),
            rarity: model.rarity.clone(),
            reward_points: model.reward_points,
            kind,
            condition,
            unlocked: false,
            unlocked_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn decodes_numeric_threshold() {
        let cond = Condition::decode(AchievementKind::Message, r#"{"messages_read": 10}"#);
        assert_eq!(
            cond,
            Condition::Threshold {
                field: "messages_read".to_string(),
                value: 10
            }
        );
    }

    #[test]
    fn decodes_date_gate() {
        let cond = Condition::decode(AchievementKind::Date, r#"{"date_unlock": "2024-06-01"}"#);
        assert_eq!(cond, Condition::DateUnlock(date("2024-06-01")));
    }

    #[test]
    fn empty_and_garbage_conditions_are_unsatisfiable() {
        assert_eq!(
            Condition::decode(AchievementKind::Meta, "{}"),
            Condition::Unsatisfiable
        );
        assert_eq!(
            Condition::decode(AchievementKind::Mood, "not json"),
            Condition::Unsatisfiable
        );
        assert_eq!(
            Condition::decode(AchievementKind::Mood, r#"{"days": "seven"}"#),
            Condition::Unsatisfiable
        );
    }

    #[test]
    fn threshold_is_greater_or_equal() {
        let cond = Condition::Threshold {
            field: "messages_read".to_string(),
            value: 10,
        };
        assert!(!cond.satisfied_by(AchievementKind::Message, 9));
        assert!(cond.satisfied_by(AchievementKind::Message, 10));
        assert!(cond.satisfied_by(AchievementKind::Message, 15));
    }

    #[test]
    fn points_and_message_require_their_field_names() {
        let wrong_field = Condition::Threshold {
            field: "days".to_string(),
            value: 5,
        };
        assert!(!wrong_field.satisfied_by(AchievementKind::Points, 100));
        assert!(!wrong_field.satisfied_by(AchievementKind::Message, 100));
        // Other kinds accept any numeric condition key.
        assert!(wrong_field.satisfied_by(AchievementKind::Mood, 5));
        assert!(wrong_field.satisfied_by(AchievementKind::HamstiClicker, 5));
    }

    #[test]
    fn date_conditions_never_fire_as_thresholds() {
        let cond = Condition::DateUnlock(date("2024-06-01"));
        assert!(!cond.satisfied_by(AchievementKind::Date, i64::MAX));
    }
}
