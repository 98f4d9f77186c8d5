use std::sync::Arc;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::features::categories::handlers;
use crate::features::categories::services::CategoryService;

/// Create routes for the categories feature
///
/// Note: This feature is public (no authentication required)
pub fn routes(service: Arc<CategoryService>) -> Router {
    Router::new()
        .route(
            "/api/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/api/categories/tree", get(handlers::get_category_tree))
        .route(
            "/api/categories/slug/{slug}",
            get(handlers::get_category_by_slug),
        )
        .route(
            "/api/categories/{id}",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/api/categories/{id}/children",
            get(handlers::list_category_children),
        )
        .route(
            "/api/categories/{id}/toggle-visibility",
            patch(handlers::toggle_category_visibility),
        )
        .route(
            "/api/categories/{id}/sort",
            patch(handlers::update_category_sort_order),
        )
        .route(
            "/api/categories/{id}/move-up",
            post(handlers::move_category_up),
        )
        .route(
            "/api/categories/{id}/move-down",
            post(handlers::move_category_down),
        )
        .with_state(service)
}
