use std::sync::Arc;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryListItemDto, CategoryRefDto, CategoryResponseDto, CategoryTreeDto,
    HierarchyOptionDto,
};
use crate::features::categories::models::{Category, CategoryInput, CategoryStatus};
use crate::features::categories::rules;
use crate::features::categories::services::hierarchy::{
    dangling_parent, join_path, TreeIndex, WalkGuard,
};
use crate::features::categories::stores::CategoryStore;
use crate::shared::constants::NO_PARENT_LABEL;
use crate::shared::types::PaginationQuery;
use crate::shared::validation::FieldErrors;

/// Demo hierarchy: (name, status, parent name)
const DEMO_CATEGORIES: &[(&str, CategoryStatus, Option<&str>)] = &[
    ("Bedroom", CategoryStatus::Enabled, None),
    ("Beds", CategoryStatus::Enabled, Some("Bedroom")),
    ("Panel Bed", CategoryStatus::Enabled, Some("Beds")),
    ("Night Stand", CategoryStatus::Enabled, Some("Bedroom")),
    ("Dresser", CategoryStatus::Disabled, Some("Bedroom")),
    ("Living Room", CategoryStatus::Enabled, None),
    ("Sofas", CategoryStatus::Enabled, Some("Living Room")),
    ("Loveseats", CategoryStatus::Enabled, Some("Living Room")),
    ("Tables", CategoryStatus::Enabled, Some("Living Room")),
    ("Coffee Table", CategoryStatus::Enabled, Some("Tables")),
    ("Side Table", CategoryStatus::Disabled, Some("Tables")),
    ("Kitchen", CategoryStatus::Enabled, None),
    ("Appliances", CategoryStatus::Enabled, Some("Kitchen")),
    ("Cookware", CategoryStatus::Enabled, Some("Kitchen")),
];

fn not_found(id: i64) -> AppError {
    AppError::NotFound(format!("Category {} not found", id))
}

/// Service for category tree operations
///
/// All invariants (sibling-unique names, existing parents, no self or
/// descendant parents) are checked here before anything reaches the store.
pub struct CategoryService {
    store: Arc<dyn CategoryStore>,
    page_size: i64,
}

impl CategoryService {
    pub fn new(store: Arc<dyn CategoryStore>, page_size: i64) -> Self {
        Self { store, page_size }
    }

    /// Page size used when a list request does not ask for one
    pub fn default_page_size(&self) -> i64 {
        self.page_size
    }

    /// Create a category
    pub async fn create(&self, input: CategoryInput) -> Result<CategoryResponseDto> {
        self.check_fields(&input, None).await?;

        let category = self.store.insert(&input).await?;

        tracing::info!(
            "Category created: id={}, name={:?}, parent_id={:?}",
            category.id,
            category.name,
            category.parent_id
        );

        Ok(category.into())
    }

    /// Update name, status and parent of a category
    pub async fn update(&self, id: i64, input: CategoryInput) -> Result<CategoryResponseDto> {
        self.find(id).await?;

        if input.parent_id == Some(id) {
            return Err(AppError::Validation(rules::self_parent()));
        }

        self.check_fields(&input, Some(id)).await?;

        if let Some(parent_id) = input.parent_id {
            // The proposed parent's ancestors must not include the category itself
            let lineage = self.lineage(parent_id).await?;
            if lineage.iter().any(|c| c.id == id) {
                return Err(AppError::Validation(rules::descendant_parent()));
            }
        }

        let category = self
            .store
            .update(id, &input)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            "Category updated: id={}, name={:?}, parent_id={:?}, status={}",
            category.id,
            category.name,
            category.parent_id,
            category.status
        );

        Ok(category.into())
    }

    /// Delete a category, moving its children up to its own parent
    pub async fn delete(&self, id: i64) -> Result<()> {
        let moved = self
            .store
            .delete_reassigning_children(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            "Category deleted: id={}, reassigned_children={}",
            id,
            moved
        );

        Ok(())
    }

    /// Get a category with its ancestors, children and descendant count.
    ///
    /// Everything comes from one snapshot of the table.
    pub async fn get(&self, id: i64) -> Result<CategoryDetailDto> {
        let index = TreeIndex::new(self.store.all().await?);
        let mut lineage = index.lineage(id)?;
        let category = lineage.pop().ok_or_else(|| not_found(id))?;

        Ok(CategoryDetailDto {
            id: category.id,
            name: category.name.clone(),
            status: category.status,
            status_label: category.status.label().to_string(),
            parent_id: category.parent_id,
            full_path: join_path(
                lineage
                    .iter()
                    .chain(std::iter::once(&category))
                    .map(|c| c.name.as_str()),
            ),
            ancestors: lineage.iter().map(|c| CategoryRefDto::from(*c)).collect(),
            children: index
                .children_of(Some(id))
                .map(CategoryRefDto::from)
                .collect(),
            descendant_count: index.descendant_ids(id).len(),
            created_at: category.created_at,
            updated_at: category.updated_at,
        })
    }

    /// Names from the root down to the category, joined with " > "
    pub async fn full_path(&self, id: i64) -> Result<String> {
        let lineage = self.lineage(id).await?;
        Ok(join_path(lineage.iter().map(|c| c.name.as_str())))
    }

    /// Ancestors of a category, root first, excluding the category itself
    pub async fn ancestors(&self, id: i64) -> Result<Vec<Category>> {
        let mut lineage = self.lineage(id).await?;
        lineage.pop();
        Ok(lineage)
    }

    /// Direct children of a category
    pub async fn children(&self, id: i64) -> Result<Vec<Category>> {
        self.find(id).await?;
        self.store.children(id).await
    }

    /// Ids of every category below `id`
    pub async fn descendant_ids(&self, id: i64) -> Result<Vec<i64>> {
        self.find(id).await?;
        let index = TreeIndex::new(self.store.all().await?);
        Ok(index.descendant_ids(id))
    }

    /// Parent choices for the category form.
    ///
    /// Starts with the "no parent" entry; `exclude` (the category being
    /// edited) is left out. Descendants are still offered, `update` rejects
    /// them.
    pub async fn hierarchy_options(
        &self,
        exclude: Option<i64>,
    ) -> Result<Vec<HierarchyOptionDto>> {
        let index = TreeIndex::new(self.store.all().await?);

        let mut options = vec![HierarchyOptionDto {
            id: None,
            label: NO_PARENT_LABEL.to_string(),
        }];
        options.extend(
            index
                .path_options(exclude)?
                .into_iter()
                .map(|(id, label)| HierarchyOptionDto {
                    id: Some(id),
                    label,
                }),
        );

        Ok(options)
    }

    /// List categories by name, one page at a time
    pub async fn list(
        &self,
        pagination: &PaginationQuery,
    ) -> Result<(Vec<CategoryListItemDto>, i64)> {
        let (rows, total) = self
            .store
            .page(pagination.offset(), pagination.limit())
            .await?;

        Ok((rows.into_iter().map(|r| r.into()).collect(), total))
    }

    /// Whole tree, roots first, siblings by name
    pub async fn tree(&self) -> Result<Vec<CategoryTreeDto>> {
        let index = TreeIndex::new(self.store.all().await?);
        Ok(CategoryTreeDto::build_tree(&index))
    }

    /// Insert the demo furniture hierarchy into an empty store.
    ///
    /// Returns how many categories were created (0 when data already exists).
    pub async fn seed_defaults(&self) -> Result<usize> {
        if self.store.count().await? > 0 {
            tracing::info!("Categories already present, skipping demo seed");
            return Ok(0);
        }

        let mut ids: Vec<(&str, i64)> = Vec::with_capacity(DEMO_CATEGORIES.len());
        for (name, status, parent) in DEMO_CATEGORIES {
            let parent_id = parent.and_then(|p| {
                ids.iter()
                    .find(|(seeded, _)| *seeded == p)
                    .map(|(_, id)| *id)
            });
            let created = self
                .create(CategoryInput::new(*name, *status, parent_id))
                .await?;
            ids.push((*name, created.id));
        }

        tracing::info!("Seeded {} demo categories", ids.len());
        Ok(ids.len())
    }

    async fn find(&self, id: i64) -> Result<Category> {
        self.store.find(id).await?.ok_or_else(|| not_found(id))
    }

    /// Field rules that need the store: the parent exists and the name is
    /// free among the future siblings
    async fn check_fields(&self, input: &CategoryInput, exclude_id: Option<i64>) -> Result<()> {
        let mut errors = FieldErrors::new();

        if let Some(message) = rules::check_name(&input.name) {
            errors.add(rules::FIELD_NAME, message);
        }

        let parent_exists = match input.parent_id {
            Some(parent_id) => self.store.find(parent_id).await?.is_some(),
            None => true,
        };
        if !parent_exists {
            errors.merge(rules::parent_invalid());
        }

        if !errors.contains(rules::FIELD_NAME)
            && parent_exists
            && self
                .store
                .name_taken(&input.name, input.parent_id, exclude_id)
                .await?
        {
            errors.merge(rules::name_taken());
        }

        errors.into_result().map_err(AppError::Validation)
    }

    /// Categories from the root down to `id`, following parent ids through
    /// the store. Bounded by the category count.
    async fn lineage(&self, id: i64) -> Result<Vec<Category>> {
        let limit = self.store.count().await?.max(0) as usize;
        let mut guard = WalkGuard::new(id, limit);
        let mut chain: Vec<Category> = Vec::new();
        let mut current = Some(id);

        while let Some(current_id) = current {
            let node = match self.store.find(current_id).await? {
                Some(node) => node,
                None => {
                    return Err(match chain.last() {
                        Some(child) => dangling_parent(child.id, current_id),
                        None => not_found(current_id),
                    })
                }
            };
            guard.visit(current_id)?;
            current = node.parent_id;
            chain.push(node);
        }

        chain.reverse();
        Ok(chain)
    }
}
