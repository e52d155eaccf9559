use std::{fmt, num::ParseIntError, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned to a todo at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(u64);

impl TodoId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Key under which the record for this id lives in the store.
    pub fn record_key(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(Self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied when creating a todo.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTodo {
    pub title: String,
    pub content: Option<String>,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Replacement fields for an existing todo.
///
/// A missing or empty field keeps the stored value, so a patch cannot clear
/// `content` back to nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl TodoPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            content: None,
        }
    }

    pub fn content(content: impl Into<String>) -> Self {
        Self {
            title: None,
            content: Some(content.into()),
        }
    }
}

impl Todo {
    /// Produces the updated record, leaving `id` and `created_at` untouched.
    pub fn patched(&self, patch: TodoPatch, now: DateTime<Utc>) -> Todo {
        let title = non_empty(patch.title).unwrap_or_else(|| self.title.clone());
        let content = non_empty(patch.content).or_else(|| self.content.clone());

        Todo {
            id: self.id,
            title,
            content,
            created_at: self.created_at,
            updated_at: now.max(self.updated_at),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap()
    }

    fn sample() -> Todo {
        Todo {
            id: TodoId::new(7),
            title: "write docs".into(),
            content: Some("README first".into()),
            created_at: at(10),
            updated_at: at(20),
        }
    }

    #[test]
    fn id_parses_from_decimal() {
        assert_eq!("42".parse::<TodoId>().unwrap(), TodoId::new(42));
        assert!(" 42 ".parse::<TodoId>().is_err());
        assert!("abc".parse::<TodoId>().is_err());
        assert_eq!(TodoId::new(42).record_key(), "42");
    }

    #[test]
    fn record_serializes_with_camel_case_fields() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["id"], 7);
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
    }

    #[test]
    fn empty_patch_fields_fall_back_to_previous_values() {
        let patch = TodoPatch {
            title: Some(String::new()),
            content: Some(String::new()),
        };
        let updated = sample().patched(patch, at(30));

        assert_eq!(updated.title, "write docs");
        assert_eq!(updated.content.as_deref(), Some("README first"));
        assert_eq!(updated.updated_at, at(30));
    }

    #[test]
    fn patch_never_moves_updated_at_backwards() {
        let updated = sample().patched(TodoPatch::title("renamed"), at(5));

        assert_eq!(updated.title, "renamed");
        assert_eq!(updated.created_at, at(10));
        assert_eq!(updated.updated_at, at(20));
    }
}
