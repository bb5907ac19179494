//! crates/study_focus_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Field names follow the camelCase JSON shape the records are persisted in,
//! and deserialization is lenient towards older records.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::gamification::level_for_xp;

//=========================================================================================
// Priority
//=========================================================================================

/// How urgent a task is. Unknown strings read back as `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    /// Ordering value used by every priority sort: high=3, medium=2, low=1.
    pub fn weight(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Priority::Low,
            "high" => Priority::High,
            _ => Priority::Medium,
        }
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Task
//=========================================================================================

/// A single to-do item, embedded in exactly one `UserRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    // Older records stored the title under `text`.
    #[serde(alias = "text", default, deserialize_with = "lenient::text")]
    pub title: String,
    #[serde(
        default,
        deserialize_with = "lenient::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::priority")]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient::due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::flag")]
    pub completed: bool,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// The fields a caller supplies when adding a task.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    pub fn new(title: impl Into<String>, priority: Priority) -> Self {
        Self {
            title: title.into(),
            description: None,
            priority,
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn due(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }
}

/// Replacement values for an existing task. Every field is overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskUpdate {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
}

//=========================================================================================
// Study sessions
//=========================================================================================

/// One completed work interval of the study timer. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    #[serde(default, deserialize_with = "lenient::text")]
    pub id: String,
    /// Length in whole minutes, always > 0 for sessions created here.
    /// Missing or non-numeric values in stored records read as 0.
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub duration: u32,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub date: DateTime<Utc>,
}

//=========================================================================================
// Badges
//=========================================================================================

/// An insertion-ordered set of badge names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Badges(Vec<String>);

impl Badges {
    /// Adds `name` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|b| b == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<String> for Badges {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut badges = Badges::default();
        for name in iter {
            badges.insert(name);
        }
        badges
    }
}

impl<'de> Deserialize<'de> for Badges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Anything that is not an array of strings reads back as no badges.
        let value = Value::deserialize(deserializer)?;
        let names = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
            _ => Badges::default(),
        };
        Ok(names)
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// A registered user together with everything they own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub email: String,
    #[serde(
        default,
        rename = "passwordHash",
        alias = "password",
        deserialize_with = "lenient::text"
    )]
    pub password_hash: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub tasks: Vec<Task>,
    #[serde(default, deserialize_with = "lenient::list")]
    pub study_sessions: Vec<StudySession>,
    #[serde(default, deserialize_with = "lenient::counter")]
    pub xp: u64,
    /// Cached projection of `xp`; see `normalize`.
    #[serde(default = "first_level", deserialize_with = "lenient::level")]
    pub level: u32,
    #[serde(default)]
    pub badges: Badges,
    /// Fields this version does not know about, kept so saving does not drop them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn first_level() -> u32 {
    1
}

impl UserRecord {
    /// Creates an empty account with no progression.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at,
            tasks: Vec::new(),
            study_sessions: Vec::new(),
            xp: 0,
            level: 1,
            badges: Badges::default(),
            extra: Map::new(),
        }
    }

    /// Load-time migration: the level is always re-derived from xp.
    pub fn normalize(&mut self) {
        self.level = level_for_xp(self.xp);
    }

    /// The minimal identifying record stored as the session pointer.
    pub fn pointer(&self) -> SessionPointer {
        SessionPointer {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Identifies the signed-in user. Holds no secret material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionPointer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
}

//=========================================================================================
// Ids
//=========================================================================================

/// Builds a timestamp-derived id that sorts after every id already in use.
///
/// Ids look like `<prefix><millis>`; when `now` would collide with (or fall
/// behind) the newest existing id, the counter is bumped past it.
pub(crate) fn timestamp_id<'a>(
    prefix: &str,
    existing: impl IntoIterator<Item = &'a str>,
    now: DateTime<Utc>,
) -> String {
    let newest = existing
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix)?.parse::<i64>().ok())
        .max();
    let millis = now.timestamp_millis();
    let next = match newest {
        Some(newest) if newest >= millis => newest + 1,
        _ => millis,
    };
    format!("{prefix}{next}")
}

//=========================================================================================
// Lenient deserializers for older records
//=========================================================================================

mod lenient {
    use super::*;
    use serde::de::DeserializeOwned;

    /// Strings as-is, numbers in their decimal form, anything else empty.
    pub(super) fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        Ok(optional_text(deserializer)?.unwrap_or_default())
    }

    pub(super) fn optional_text<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(super) fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(Value::deserialize(deserializer)?.as_bool().unwrap_or(false))
    }

    pub(super) fn priority<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Priority, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => Priority::from(s),
            _ => Priority::default(),
        })
    }

    /// Non-numeric or negative values read back as 0.
    pub(super) fn counter<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(value
            .as_u64()
            .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0))
    }

    pub(super) fn minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let raw = counter(deserializer)?;
        Ok(u32::try_from(raw).unwrap_or(u32::MAX))
    }

    pub(super) fn level<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        Ok(minutes(deserializer)?.max(1))
    }

    /// RFC 3339 strings or epoch milliseconds; anything else reads as the epoch.
    pub(super) fn timestamp<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let parsed = match Value::deserialize(deserializer)? {
            Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|ts| ts.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        };
        Ok(parsed.unwrap_or_default())
    }

    /// Anything but an array reads as empty; unreadable items are dropped.
    pub(super) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };
        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!(error = %e, "dropping unreadable list item");
                    None
                }
            })
            .collect())
    }

    /// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates, `""` and null.
    pub(super) fn due_date<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(s) => parse_due_date(&s),
            _ => None,
        })
    }

    pub(super) fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(day) => Some(day.and_time(NaiveTime::MIN).and_utc()),
            Err(_) => {
                tracing::warn!(due_date = raw, "unreadable due date, treating as undated");
                None
            }
        }
    }
}

/// Parses a due date the way stored records are read: RFC 3339 or `YYYY-MM-DD`.
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    lenient::parse_due_date(raw)
}
