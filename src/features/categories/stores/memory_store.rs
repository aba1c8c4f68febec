use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::core::error::{AppError, Result};
use crate::features::categories::models::{Category, CategoryInput, CategoryListRow};
use crate::features::categories::rules;
use crate::features::categories::stores::CategoryStore;

/// In-process store with the same constraints as the `categories` table
#[derive(Default)]
pub struct MemoryCategoryStore {
    state: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    next_id: i64,
    rows: BTreeMap<i64, Category>,
}

impl MemoryState {
    fn sorted(&self) -> Vec<Category> {
        let mut rows: Vec<Category> = self.rows.values().cloned().collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        rows
    }

    fn name_taken(&self, name: &str, parent_id: Option<i64>, exclude_id: Option<i64>) -> bool {
        self.rows.values().any(|c| {
            c.name == name && c.parent_id == parent_id && Some(c.id) != exclude_id
        })
    }

    fn check_constraints(&self, id: Option<i64>, input: &CategoryInput) -> Result<()> {
        if let Some(parent_id) = input.parent_id {
            if Some(parent_id) == id {
                return Err(AppError::Validation(rules::self_parent()));
            }
            if !self.rows.contains_key(&parent_id) {
                return Err(AppError::Validation(rules::parent_invalid()));
            }
        }
        if self.name_taken(&input.name, input.parent_id, id) {
            return Err(AppError::Validation(rules::name_taken()));
        }
        Ok(())
    }
}

impl MemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Point `id` at `parent_id` without any checks, to simulate corrupted data
    pub async fn force_parent(&self, id: i64, parent_id: Option<i64>) {
        let mut state = self.state.write().await;
        if let Some(row) = state.rows.get_mut(&id) {
            row.parent_id = parent_id;
        }
    }
}

#[async_trait]
impl CategoryStore for MemoryCategoryStore {
    async fn find(&self, id: i64) -> Result<Option<Category>> {
        Ok(self.state.read().await.rows.get(&id).cloned())
    }

    async fn count(&self) -> Result<i64> {
        Ok(self.state.read().await.rows.len() as i64)
    }

    async fn all(&self) -> Result<Vec<Category>> {
        Ok(self.state.read().await.sorted())
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<Category>> {
        Ok(self
            .state
            .read()
            .await
            .sorted()
            .into_iter()
            .filter(|c| c.parent_id == Some(parent_id))
            .collect())
    }

    async fn name_taken(
        &self,
        name: &str,
        parent_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .name_taken(name, parent_id, exclude_id))
    }

    async fn insert(&self, input: &CategoryInput) -> Result<Category> {
        let mut state = self.state.write().await;
        state.check_constraints(None, input)?;

        state.next_id += 1;
        let now = Utc::now();
        let category = Category {
            id: state.next_id,
            name: input.name.clone(),
            status: input.status,
            parent_id: input.parent_id,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(category.id, category.clone());
        Ok(category)
    }

    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>> {
        let mut state = self.state.write().await;
        if !state.rows.contains_key(&id) {
            return Ok(None);
        }
        state.check_constraints(Some(id), input)?;

        let Some(row) = state.rows.get_mut(&id) else {
            return Ok(None);
        };
        row.name = input.name.clone();
        row.status = input.status;
        row.parent_id = input.parent_id;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete_reassigning_children(&self, id: i64) -> Result<Option<u64>> {
        // One write guard across read, reassign and delete
        let mut state = self.state.write().await;
        let Some(parent_id) = state.rows.get(&id).map(|c| c.parent_id) else {
            return Ok(None);
        };

        let child_ids: Vec<i64> = state
            .rows
            .values()
            .filter(|c| c.parent_id == Some(id))
            .map(|c| c.id)
            .collect();

        for child_id in &child_ids {
            let name = &state.rows[child_id].name;
            if state.name_taken(name, parent_id, Some(id)) {
                return Err(AppError::Conflict(format!(
                    "Cannot delete category {}: child '{}' would clash with an existing sibling",
                    id, name
                )));
            }
        }

        let now = Utc::now();
        for child_id in &child_ids {
            if let Some(child) = state.rows.get_mut(child_id) {
                child.parent_id = parent_id;
                child.updated_at = now;
            }
        }
        state.rows.remove(&id);

        Ok(Some(child_ids.len() as u64))
    }

    async fn page(&self, offset: i64, limit: i64) -> Result<(Vec<CategoryListRow>, i64)> {
        let state = self.state.read().await;
        let total = state.rows.len() as i64;

        let rows = state
            .sorted()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .map(|c| CategoryListRow {
                parent_name: c
                    .parent_id
                    .and_then(|pid| state.rows.get(&pid))
                    .map(|p| p.name.clone()),
                id: c.id,
                name: c.name,
                status: c.status,
                parent_id: c.parent_id,
                created_at: c.created_at,
                updated_at: c.updated_at,
            })
            .collect();

        Ok((rows, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::categories::models::CategoryStatus;

    fn input(name: &str, parent_id: Option<i64>) -> CategoryInput {
        CategoryInput::new(name, CategoryStatus::Enabled, parent_id)
    }

    #[tokio::test]
    async fn test_insert_enforces_sibling_uniqueness() {
        let store = MemoryCategoryStore::new();
        let root = store.insert(&input("Bedroom", None)).await.unwrap();
        store.insert(&input("Beds", Some(root.id))).await.unwrap();

        let err = store.insert(&input("Beds", Some(root.id))).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref e) if e.contains("name")));

        // same name as a root is a different bucket
        assert!(store.insert(&input("Beds", None)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_moves_children_in_one_step() {
        let store = MemoryCategoryStore::new();
        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        let beds = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();
        let panel = store.insert(&input("Panel Bed", Some(beds.id))).await.unwrap();

        let moved = store.delete_reassigning_children(beds.id).await.unwrap();
        assert_eq!(moved, Some(1));

        let panel = store.find(panel.id).await.unwrap().unwrap();
        assert_eq!(panel.parent_id, Some(bedroom.id));
        assert!(store.find(beds.id).await.unwrap().is_none());
        assert_eq!(store.delete_reassigning_children(beds.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_child_named_like_deleted_row() {
        let store = MemoryCategoryStore::new();
        let living = store.insert(&input("Living Room", None)).await.unwrap();
        let outer = store.insert(&input("Tables", Some(living.id))).await.unwrap();
        let inner = store.insert(&input("Tables", Some(outer.id))).await.unwrap();

        assert_eq!(store.delete_reassigning_children(outer.id).await.unwrap(), Some(1));
        assert_eq!(
            store.find(inner.id).await.unwrap().unwrap().parent_id,
            Some(living.id)
        );
    }

    #[tokio::test]
    async fn test_delete_clash_leaves_tree_untouched() {
        let store = MemoryCategoryStore::new();
        let bedroom = store.insert(&input("Bedroom", None)).await.unwrap();
        let beds = store.insert(&input("Beds", Some(bedroom.id))).await.unwrap();
        store.insert(&input("Tables", Some(bedroom.id))).await.unwrap();
        let nested = store.insert(&input("Tables", Some(beds.id))).await.unwrap();

        let err = store.delete_reassigning_children(beds.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.find(beds.id).await.unwrap().is_some());
        assert_eq!(
            store.find(nested.id).await.unwrap().unwrap().parent_id,
            Some(beds.id)
        );
    }
}
