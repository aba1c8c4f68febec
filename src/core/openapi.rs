use utoipa::{Modify, OpenApi};

use crate::features::categories::{
    dtos as categories_dtos, handlers as categories_handlers, models as categories_models,
};
use crate::shared::types::{ApiResponse, Meta};
use crate::shared::validation::FieldErrors;

#[derive(OpenApi)]
#[openapi(
    paths(
        categories_handlers::list_categories,
        categories_handlers::create_category,
        categories_handlers::list_hierarchy_options,
        categories_handlers::get_category_tree,
        categories_handlers::get_category,
        categories_handlers::get_category_path,
        categories_handlers::list_category_ancestors,
        categories_handlers::list_category_children,
        categories_handlers::list_category_descendants,
        categories_handlers::update_category,
        categories_handlers::delete_category,
    ),
    components(
        schemas(
            // Shared
            Meta,
            FieldErrors,
            // Categories
            categories_models::CategoryStatus,
            categories_dtos::CategoryPayloadDto,
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryListItemDto,
            categories_dtos::CategoryRefDto,
            categories_dtos::CategoryDetailDto,
            categories_dtos::HierarchyOptionDto,
            categories_dtos::CategoryTreeDto,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<categories_dtos::CategoryDetailDto>,
            ApiResponse<Vec<categories_dtos::CategoryRefDto>>,
            ApiResponse<Vec<categories_dtos::CategoryListItemDto>>,
            ApiResponse<Vec<categories_dtos::HierarchyOptionDto>>,
            ApiResponse<Vec<categories_dtos::CategoryTreeDto>>,
        )
    ),
    tags(
        (name = "categories", description = "Category tree administration"),
    ),
    info(
        title = "Category Console API",
        version = "0.1.0",
        description = "API documentation for the category console",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
