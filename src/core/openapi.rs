use utoipa::{Modify, OpenApi};

use crate::features::categories::{dtos as categories_dtos, handlers as categories_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Categories
        categories_handlers::list_categories,
        categories_handlers::get_category_tree,
        categories_handlers::get_category_by_slug,
        categories_handlers::get_category,
        categories_handlers::list_category_children,
        categories_handlers::create_category,
        categories_handlers::update_category,
        categories_handlers::delete_category,
        categories_handlers::toggle_category_visibility,
        categories_handlers::update_category_sort_order,
        categories_handlers::move_category_up,
        categories_handlers::move_category_down,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Categories
            categories_dtos::CategoryResponseDto,
            categories_dtos::CategoryTreeDto,
            categories_dtos::CreateCategoryDto,
            categories_dtos::UpdateCategoryDto,
            categories_dtos::UpdateSortOrderDto,
            categories_dtos::MoveResultDto,
            categories_dtos::CategorySortBy,
            categories_dtos::SortDirection,
            ApiResponse<categories_dtos::CategoryResponseDto>,
            ApiResponse<Vec<categories_dtos::CategoryResponseDto>>,
            ApiResponse<Vec<categories_dtos::CategoryTreeDto>>,
            ApiResponse<categories_dtos::MoveResultDto>,
        )
    ),
    tags(
        (name = "categories", description = "Hierarchical categories with sibling ordering"),
    ),
    info(
        title = "Catalog API",
        version = "0.1.0",
        description = "API documentation for the catalog service",
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
