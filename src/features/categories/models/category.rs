use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;

/// Category status, stored as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type, ToSchema)]
#[repr(i16)]
#[serde(rename_all = "snake_case")]
pub enum CategoryStatus {
    Enabled = 1,
    Disabled = 2,
}

impl CategoryStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(CategoryStatus::Enabled),
            2 => Some(CategoryStatus::Disabled),
            _ => None,
        }
    }

    /// Parse a status from a form/JSON value.
    ///
    /// Accepts the integer code (`1`, `"2"`) or the name in any case
    /// (`"enabled"`, `"Disabled"`).
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().and_then(Self::from_code),
            serde_json::Value::String(s) => {
                let s = s.trim();
                if let Ok(code) = s.parse::<i64>() {
                    return Self::from_code(code);
                }
                match s.to_ascii_lowercase().as_str() {
                    "enabled" => Some(CategoryStatus::Enabled),
                    "disabled" => Some(CategoryStatus::Disabled),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoryStatus::Enabled => "Enabled",
            CategoryStatus::Disabled => "Disabled",
        }
    }
}

impl std::fmt::Display for CategoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CategoryStatus::Enabled => write!(f, "enabled"),
            CategoryStatus::Disabled => write!(f, "disabled"),
        }
    }
}

/// Database model for category
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// List row: a category joined with its parent's name
#[derive(Debug, Clone, FromRow)]
pub struct CategoryListRow {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub parent_id: Option<i64>,
    pub parent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable fields of a category, already shape-checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryInput {
    pub name: String,
    pub status: CategoryStatus,
    pub parent_id: Option<i64>,
}

impl CategoryInput {
    pub fn new(name: impl Into<String>, status: CategoryStatus, parent_id: Option<i64>) -> Self {
        Self {
            name: name.into(),
            status,
            parent_id,
        }
    }
}
