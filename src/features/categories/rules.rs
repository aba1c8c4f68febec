//! Field rules and messages shared by the request DTOs, the service and the stores.

use crate::shared::constants::CATEGORY_NAME_MAX_LENGTH;
use crate::shared::validation::FieldErrors;

pub const FIELD_NAME: &str = "name";
pub const FIELD_STATUS: &str = "status";
pub const FIELD_PARENT_ID: &str = "parent_id";

pub const NAME_REQUIRED: &str = "The name field is required.";
pub const NAME_TOO_LONG: &str = "The name field must not be greater than 255 characters.";
pub const NAME_TAKEN: &str = "The name has already been taken.";
pub const STATUS_REQUIRED: &str = "The status field is required.";
pub const STATUS_INVALID: &str = "The selected status is invalid.";
pub const PARENT_INVALID: &str = "The selected parent id is invalid.";
pub const SELF_PARENT: &str = "Category cannot be its own parent";
pub const DESCENDANT_PARENT: &str = "Cannot assign a descendant as parent";

/// Checks a category name, returning the message for the first broken rule
pub fn check_name(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some(NAME_REQUIRED)
    } else if name.chars().count() as u64 > CATEGORY_NAME_MAX_LENGTH {
        Some(NAME_TOO_LONG)
    } else {
        None
    }
}

pub fn name_taken() -> FieldErrors {
    FieldErrors::single(FIELD_NAME, NAME_TAKEN)
}

pub fn parent_invalid() -> FieldErrors {
    FieldErrors::single(FIELD_PARENT_ID, PARENT_INVALID)
}

pub fn self_parent() -> FieldErrors {
    FieldErrors::single(FIELD_PARENT_ID, SELF_PARENT)
}

pub fn descendant_parent() -> FieldErrors {
    FieldErrors::single(FIELD_PARENT_ID, DESCENDANT_PARENT)
}

/// Parse a parent reference from a form/JSON value.
///
/// `null` and `""` mean "no parent"; anything that cannot be an id is a
/// `parent_id` field error.
pub fn parse_parent_id(value: Option<&serde_json::Value>) -> Result<Option<i64>, FieldErrors> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => n.as_i64().map(Some).ok_or_else(parent_invalid),
        Some(serde_json::Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| parent_invalid()),
        Some(_) => Err(parent_invalid()),
    }
}
