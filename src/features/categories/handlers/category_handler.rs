use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::core::error::Result;
use crate::core::extractor::{AppJson, AppQuery};
use crate::features::categories::dtos::{
    CategoryDetailDto, CategoryListItemDto, CategoryPayloadDto, CategoryRefDto,
    CategoryResponseDto, CategoryTreeDto, HierarchyOptionDto,
};
use crate::features::categories::services::CategoryService;
use crate::shared::types::{ApiResponse, Meta, PaginationQuery};

/// Query params for listing categories
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCategoriesQuery {
    /// Page number (1-indexed, default: 1)
    #[param(minimum = 1)]
    pub page: Option<i64>,

    /// Items per page (default: CATEGORY_PAGE_SIZE, max: 100)
    #[param(minimum = 1, maximum = 100)]
    pub page_size: Option<i64>,
}

/// Query params for the parent selector
#[derive(Debug, Deserialize, IntoParams)]
pub struct HierarchyOptionsQuery {
    /// Category being edited; left out of the options
    pub exclude: Option<i64>,
}

/// List categories, paginated and ordered by name
#[utoipa::path(
    get,
    path = "/api/categories",
    params(ListCategoriesQuery),
    responses(
        (status = 200, description = "Page of categories", body = ApiResponse<Vec<CategoryListItemDto>>),
        (status = 400, description = "Invalid query parameters")
    ),
    tag = "categories"
)]
pub async fn list_categories(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<ListCategoriesQuery>,
) -> Result<Json<ApiResponse<Vec<CategoryListItemDto>>>> {
    let pagination = PaginationQuery::new(
        query.page.unwrap_or(1),
        query
            .page_size
            .unwrap_or_else(|| service.default_page_size()),
    );

    let (items, total) = service.list(&pagination).await?;

    Ok(Json(ApiResponse::success(
        Some(items),
        None,
        Some(Meta::paginated(total, &pagination)),
    )))
}

/// Parent choices for the category form
///
/// First entry is the "no parent" option with a null id; the rest are full
/// paths sorted case-insensitively.
#[utoipa::path(
    get,
    path = "/api/categories/options",
    params(HierarchyOptionsQuery),
    responses(
        (status = 200, description = "Selectable parents", body = ApiResponse<Vec<HierarchyOptionDto>>)
    ),
    tag = "categories"
)]
pub async fn list_hierarchy_options(
    State(service): State<Arc<CategoryService>>,
    AppQuery(query): AppQuery<HierarchyOptionsQuery>,
) -> Result<Json<ApiResponse<Vec<HierarchyOptionDto>>>> {
    let options = service.hierarchy_options(query.exclude).await?;
    Ok(Json(ApiResponse::success(Some(options), None, None)))
}

/// Whole category tree
#[utoipa::path(
    get,
    path = "/api/categories/tree",
    responses(
        (status = 200, description = "Category tree", body = ApiResponse<Vec<CategoryTreeDto>>)
    ),
    tag = "categories"
)]
pub async fn get_category_tree(
    State(service): State<Arc<CategoryService>>,
) -> Result<Json<ApiResponse<Vec<CategoryTreeDto>>>> {
    let tree = service.tree().await?;
    Ok(Json(ApiResponse::success(Some(tree), None, None)))
}

/// Get category by id, with its path, ancestors and children
#[utoipa::path(
    get,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category found", body = ApiResponse<CategoryDetailDto>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<CategoryDetailDto>>> {
    let category = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(category), None, None)))
}

/// Full path of a category, root first, joined with " > "
#[utoipa::path(
    get,
    path = "/api/categories/{id}/path",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Full path", body = ApiResponse<String>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn get_category_path(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<String>>> {
    let path = service.full_path(id).await?;
    Ok(Json(ApiResponse::success(Some(path), None, None)))
}

/// Ancestors of a category, root first
#[utoipa::path(
    get,
    path = "/api/categories/{id}/ancestors",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Ancestors", body = ApiResponse<Vec<CategoryRefDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_category_ancestors(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CategoryRefDto>>>> {
    let ancestors = service.ancestors(id).await?;
    let data = ancestors.iter().map(CategoryRefDto::from).collect();
    Ok(Json(ApiResponse::success(Some(data), None, None)))
}

/// Direct children of a category, by name
#[utoipa::path(
    get,
    path = "/api/categories/{id}/children",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Children", body = ApiResponse<Vec<CategoryRefDto>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_category_children(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<CategoryRefDto>>>> {
    let children = service.children(id).await?;
    let data = children.iter().map(CategoryRefDto::from).collect();
    Ok(Json(ApiResponse::success(Some(data), None, None)))
}

/// Ids of every category below this one
#[utoipa::path(
    get,
    path = "/api/categories/{id}/descendants",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Descendant ids", body = ApiResponse<Vec<i64>>),
        (status = 404, description = "Category not found")
    ),
    tag = "categories"
)]
pub async fn list_category_descendants(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Vec<i64>>>> {
    let ids = service.descendant_ids(id).await?;
    Ok(Json(ApiResponse::success(Some(ids), None, None)))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CategoryPayloadDto,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<CategoryResponseDto>),
        (status = 400, description = "Malformed JSON"),
        (status = 422, description = "Validation error")
    ),
    tag = "categories"
)]
pub async fn create_category(
    State(service): State<Arc<CategoryService>>,
    AppJson(dto): AppJson<CategoryPayloadDto>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryResponseDto>>)> {
    let category = service.create(dto.into_input()?).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(category),
            Some("Category created successfully".to_string()),
            None,
        )),
    ))
}

/// Update a category
///
/// Rejects a parent equal to the category itself or any of its descendants.
#[utoipa::path(
    put,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    request_body = CategoryPayloadDto,
    responses(
        (status = 200, description = "Category updated", body = ApiResponse<CategoryResponseDto>),
        (status = 404, description = "Category not found"),
        (status = 422, description = "Validation error")
    ),
    tag = "categories"
)]
pub async fn update_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<CategoryPayloadDto>,
) -> Result<Json<ApiResponse<CategoryResponseDto>>> {
    let category = service.update(id, dto.into_input()?).await?;

    Ok(Json(ApiResponse::success(
        Some(category),
        Some("Category updated successfully".to_string()),
        None,
    )))
}

/// Delete a category
///
/// Children move up to the deleted category's parent (or become roots).
#[utoipa::path(
    delete,
    path = "/api/categories/{id}",
    params(
        ("id" = i64, Path, description = "Category ID")
    ),
    responses(
        (status = 200, description = "Category deleted"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "A child's name would clash with a sibling under the new parent")
    ),
    tag = "categories"
)]
pub async fn delete_category(
    State(service): State<Arc<CategoryService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;

    Ok(Json(ApiResponse::success(
        None,
        Some("Category deleted successfully".to_string()),
        None,
    )))
}
