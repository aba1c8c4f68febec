//! Persistence seam for the category tree.
//!
//! The service owns every invariant check; stores only persist rows and
//! keep the delete-with-reassignment sequence atomic.

#[cfg(test)]
mod memory_store;
mod pg_store;

use async_trait::async_trait;

use crate::core::error::Result;
use crate::features::categories::models::{Category, CategoryInput, CategoryListRow};

#[cfg(test)]
pub use memory_store::MemoryCategoryStore;
pub use pg_store::PgCategoryStore;

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Look up one category by id
    async fn find(&self, id: i64) -> Result<Option<Category>>;

    /// Total number of categories
    async fn count(&self) -> Result<i64>;

    /// Every category, ordered by name then id
    async fn all(&self) -> Result<Vec<Category>>;

    /// Direct children of `parent_id`, ordered by name then id
    async fn children(&self, parent_id: i64) -> Result<Vec<Category>>;

    /// Whether `name` is used by a sibling under `parent_id` (`None` = roots),
    /// ignoring the row `exclude_id`
    async fn name_taken(
        &self,
        name: &str,
        parent_id: Option<i64>,
        exclude_id: Option<i64>,
    ) -> Result<bool>;

    async fn insert(&self, input: &CategoryInput) -> Result<Category>;

    /// Overwrite the writable fields; `None` when the row does not exist
    async fn update(&self, id: i64, input: &CategoryInput) -> Result<Option<Category>>;

    /// In one transaction: move the children of `id` to its parent, then
    /// delete it. Returns the number of children moved, `None` when the row
    /// does not exist.
    async fn delete_reassigning_children(&self, id: i64) -> Result<Option<u64>>;

    /// One page of categories joined with their parent's name, plus the total
    async fn page(&self, offset: i64, limit: i64) -> Result<(Vec<CategoryListRow>, i64)>;
}
