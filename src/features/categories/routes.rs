use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/api/categories/options",
            get(handlers::list_hierarchy_options),
        )
        .route("/api/categories/tree", get(handlers::get_category_tree))
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route("/api/categories/{id}/path", get(handlers::get_category_path))
        .route(
            "/api/categories/{id}/ancestors",
            get(handlers::list_category_ancestors),
        )
        .route(
            "/api/categories/{id}/children",
            get(handlers::list_category_children),
        )
        .route(
            "/api/categories/{id}/descendants",
            get(handlers::list_category_descendants),
        )
        .with_state(service)
}
