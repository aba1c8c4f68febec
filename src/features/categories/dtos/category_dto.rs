use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::categories::models::{
    Category, CategoryInput, CategoryListRow, CategoryStatus,
};
use crate::features::categories::rules;
use crate::features::categories::services::hierarchy::TreeIndex;
use crate::shared::validation::FieldErrors;

/// Request DTO for creating or updating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CategoryPayloadDto {
    /// Category name, unique among its siblings
    #[validate(
        required(message = "The name field is required."),
        length(max = 255, message = "The name field must not be greater than 255 characters.")
    )]
    pub name: Option<String>,

    /// `1`/`"enabled"` or `2`/`"disabled"`
    #[validate(required(message = "The status field is required."))]
    #[schema(value_type = Option<i16>, example = 1)]
    pub status: Option<serde_json::Value>,

    /// Parent category id; null or empty for a root category
    #[schema(value_type = Option<i64>)]
    pub parent_id: Option<serde_json::Value>,
}

impl CategoryPayloadDto {
    /// Check the request shape and turn it into service input.
    ///
    /// Blank names count as missing. Store-dependent rules (parent exists,
    /// sibling uniqueness, cycles) are left to the service.
    pub fn into_input(mut self) -> Result<CategoryInput, FieldErrors> {
        self.name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let mut errors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        let status = self.status.as_ref().and_then(|value| {
            let status = CategoryStatus::from_value(value);
            if status.is_none() {
                errors.add(rules::FIELD_STATUS, rules::STATUS_INVALID);
            }
            status
        });

        let parent_id = rules::parse_parent_id(self.parent_id.as_ref()).unwrap_or_else(|e| {
            errors.merge(e);
            None
        });

        if !errors.is_empty() {
            return Err(errors);
        }

        match (self.name, status) {
            (Some(name), Some(status)) => Ok(CategoryInput::new(name, status, parent_id)),
            (None, _) => Err(FieldErrors::single(rules::FIELD_NAME, rules::NAME_REQUIRED)),
            (_, None) => Err(FieldErrors::single(
                rules::FIELD_STATUS,
                rules::STATUS_REQUIRED,
            )),
        }
    }
}

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub status_label: String,
    pub parent_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            status: c.status,
            status_label: c.status.label().to_string(),
            parent_id: c.parent_id,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Row of the paginated category list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryListItemDto {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub status_label: String,
    pub parent_id: Option<i64>,
    pub parent_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CategoryListRow> for CategoryListItemDto {
    fn from(r: CategoryListRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            status: r.status,
            status_label: r.status.label().to_string(),
            parent_id: r.parent_id,
            parent_name: r.parent_name,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRefDto {
    pub id: i64,
    pub name: String,
}

impl From<&Category> for CategoryRefDto {
    fn from(c: &Category) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
        }
    }
}

/// Category with its position in the tree
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryDetailDto {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub status_label: String,
    pub parent_id: Option<i64>,
    /// Root-to-self names joined with " > "
    pub full_path: String,
    /// Root first, excluding the category itself
    pub ancestors: Vec<CategoryRefDto>,
    pub children: Vec<CategoryRefDto>,
    /// Number of categories anywhere below this one
    pub descendant_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One selectable parent in the category form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HierarchyOptionDto {
    /// `null` for the "no parent" entry
    pub id: Option<i64>,
    pub label: String,
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: i64,
    pub name: String,
    pub status: CategoryStatus,
    pub children: Vec<CategoryTreeDto>,
}

impl CategoryTreeDto {
    /// Build tree from the roots of an index
    pub fn build_tree(index: &TreeIndex) -> Vec<CategoryTreeDto> {
        index
            .children_of(None)
            .map(|root| Self::build_node(root, index))
            .collect()
    }

    fn build_node(category: &Category, index: &TreeIndex) -> CategoryTreeDto {
        let children = index
            .children_of(Some(category.id))
            .map(|child| Self::build_node(child, index))
            .collect();

        CategoryTreeDto {
            id: category.id,
            name: category.name.clone(),
            status: category.status,
            children,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> CategoryPayloadDto {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_into_input_accepts_valid_payload() {
        let input = payload(json!({ "name": "  Beds ", "status": 1, "parent_id": "4" }))
            .into_input()
            .unwrap();

        assert_eq!(input, CategoryInput::new("Beds", CategoryStatus::Enabled, Some(4)));
    }

    #[test]
    fn test_into_input_requires_name_and_status() {
        let errors = payload(json!({})).into_input().unwrap_err();

        assert_eq!(errors.messages("name"), [rules::NAME_REQUIRED]);
        assert_eq!(errors.messages("status"), [rules::STATUS_REQUIRED]);
    }

    #[test]
    fn test_into_input_treats_blank_name_as_missing() {
        let errors = payload(json!({ "name": "   ", "status": 1 }))
            .into_input()
            .unwrap_err();

        assert_eq!(errors.messages("name"), [rules::NAME_REQUIRED]);
    }

    #[test]
    fn test_into_input_rejects_long_name() {
        let errors = payload(json!({ "name": "a".repeat(256), "status": 1 }))
            .into_input()
            .unwrap_err();

        assert_eq!(errors.messages("name"), [rules::NAME_TOO_LONG]);
    }

    #[test]
    fn test_into_input_rejects_unknown_status_and_parent() {
        let errors = payload(json!({
            "name": "Test Category",
            "status": "invalid_status",
            "parent_id": "abc"
        }))
        .into_input()
        .unwrap_err();

        assert_eq!(errors.messages("status"), [rules::STATUS_INVALID]);
        assert_eq!(errors.messages("parent_id"), [rules::PARENT_INVALID]);
        assert!(!errors.contains("name"));
    }
}
