use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::categories::models::{Category, CategoryChanges};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::shared::validation::SLUG_REGEX;

// =============================================================================
// RESPONSES
// =============================================================================

/// Response DTO for category
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponseDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponseDto {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            parent_id: c.parent_id,
            name: c.name,
            slug: c.slug,
            description: c.description,
            icon: c.icon,
            image: c.image,
            sort_order: c.sort_order,
            is_visible: c.is_visible,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Outcome of a move-up / move-down request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MoveResultDto {
    /// False when the category was already first / last among its siblings
    pub moved: bool,
}

/// Which nodes a tree view keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeVisibility {
    /// Public view: a hidden category drops out together with its whole subtree
    VisibleOnly,
    /// Admin view: every reachable category
    All,
}

impl TreeVisibility {
    fn includes(self, category: &Category) -> bool {
        match self {
            TreeVisibility::VisibleOnly => category.is_visible,
            TreeVisibility::All => true,
        }
    }
}

/// Response DTO for category tree (hierarchical structure)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(no_recursion)]
pub struct CategoryTreeDto {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub sort_order: i32,
    pub is_visible: bool,
    /// Depth in the tree, 0 for roots
    pub level: u32,
    pub children: Vec<CategoryTreeDto>,
}

type ChildIndex = HashMap<Option<Uuid>, Vec<Category>>;

impl CategoryTreeDto {
    /// Build a forest from the flat category table.
    ///
    /// Siblings are ordered by `(sort_order, id)`. Rows whose parent does not
    /// exist are dropped (with their descendants). Rows caught in a parent
    /// cycle are never reachable from a root, so they are skipped as well.
    pub fn build_tree(categories: Vec<Category>, visibility: TreeVisibility) -> Vec<CategoryTreeDto> {
        let known: HashSet<Uuid> = categories.iter().map(|c| c.id).collect();

        let mut index: ChildIndex = HashMap::new();
        for category in categories {
            if let Some(parent_id) = category.parent_id {
                if !known.contains(&parent_id) {
                    tracing::warn!(
                        category_id = %category.id,
                        parent_id = %parent_id,
                        "Dropping orphaned category from tree"
                    );
                    continue;
                }
            }
            index.entry(category.parent_id).or_default().push(category);
        }

        for siblings in index.values_mut() {
            siblings.sort_by_key(|c| (c.sort_order, c.id));
        }

        Self::build_level(None, 0, &mut index, visibility)
    }

    // Each sibling group is removed from the index when consumed, so a
    // malformed table can never make this recurse forever.
    fn build_level(
        parent_id: Option<Uuid>,
        level: u32,
        index: &mut ChildIndex,
        visibility: TreeVisibility,
    ) -> Vec<CategoryTreeDto> {
        let Some(siblings) = index.remove(&parent_id) else {
            return Vec::new();
        };

        siblings
            .into_iter()
            .filter(|c| visibility.includes(c))
            .map(|category| {
                let children = Self::build_level(Some(category.id), level + 1, index, visibility);
                Self::from_parts(category, level, children)
            })
            .collect()
    }

    fn from_parts(category: Category, level: u32, children: Vec<CategoryTreeDto>) -> Self {
        CategoryTreeDto {
            id: category.id,
            parent_id: category.parent_id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            icon: category.icon,
            image: category.image,
            sort_order: category.sort_order,
            is_visible: category.is_visible,
            level,
            children,
        }
    }
}

// =============================================================================
// QUERIES
// =============================================================================

/// Query params for the tree endpoint
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryTreeQuery {
    /// Include hidden categories and their subtrees (admin view). Default: false
    #[serde(default)]
    pub include_hidden: bool,
}

impl CategoryTreeQuery {
    pub fn visibility(&self) -> TreeVisibility {
        if self.include_hidden {
            TreeVisibility::All
        } else {
            TreeVisibility::VisibleOnly
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sort fields for categories
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CategorySortBy {
    #[default]
    SortOrder,
    Name,
    CreatedAt,
    UpdatedAt,
}

impl CategorySortBy {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CategorySortBy::SortOrder => "sort_order",
            CategorySortBy::Name => "name",
            CategorySortBy::CreatedAt => "created_at",
            CategorySortBy::UpdatedAt => "updated_at",
        }
    }
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

/// Query params for listing categories
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct CategoryQueryParams {
    /// Page number (1-indexed). Omit to get every matching row
    #[param(minimum = 1)]
    pub page: Option<i64>,
    /// Items per page, used only together with `page`
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    /// Case-insensitive search in name or description
    pub search: Option<String>,
    /// Case-insensitive filter on name
    pub name: Option<String>,
    /// Only direct children of this category
    pub parent_id: Option<Uuid>,
    /// Filter by visibility
    pub is_visible: Option<bool>,
    /// Sort by field (default: sort_order)
    #[serde(default)]
    pub sort_by: CategorySortBy,
    /// Sort direction (default: asc)
    #[serde(default)]
    pub sort: SortDirection,
}

impl Default for CategoryQueryParams {
    fn default() -> Self {
        Self {
            page: None,
            page_size: DEFAULT_PAGE_SIZE,
            search: None,
            name: None,
            parent_id: None,
            is_visible: None,
            sort_by: CategorySortBy::default(),
            sort: SortDirection::default(),
        }
    }
}

impl CategoryQueryParams {
    /// Rows to skip; saturates instead of overflowing on huge page numbers
    pub fn offset(&self) -> i64 {
        match self.page {
            Some(page) => (page.max(1) - 1).saturating_mul(self.page_len()),
            None => 0,
        }
    }

    /// Page length, or `None` (no limit) when no page was requested
    pub fn limit(&self) -> Option<i64> {
        self.page.map(|_| self.page_len())
    }

    fn page_len(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    /// `search` as an ILIKE pattern, blank treated as absent
    pub fn search_pattern(&self) -> Option<String> {
        like_pattern(self.search.as_deref())
    }

    /// `name` as an ILIKE pattern, blank treated as absent
    pub fn name_pattern(&self) -> Option<String> {
        like_pattern(self.name.as_deref())
    }
}

fn like_pattern(term: Option<&str>) -> Option<String> {
    term.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s))
}

// =============================================================================
// REQUESTS
// =============================================================================

/// Request DTO for creating a category
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// URL-safe identifier; derived from the name when omitted
    #[validate(
        length(min = 1, max = 100, message = "Slug must be 1-100 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug must be lowercase alphanumeric segments separated by single hyphens"
        )
    )]
    pub slug: Option<String>,

    pub description: Option<String>,

    pub parent_id: Option<Uuid>,

    /// Defaults to 0
    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,

    /// Defaults to true
    pub is_visible: Option<bool>,

    #[validate(length(max = 255, message = "Icon must not exceed 255 characters"))]
    pub icon: Option<String>,

    #[validate(length(max = 255, message = "Image must not exceed 255 characters"))]
    pub image: Option<String>,
}

/// Request DTO for a partial category update
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryDto {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(
        length(min = 1, max = 100, message = "Slug must be 1-100 characters"),
        regex(
            path = *SLUG_REGEX,
            message = "Slug must be lowercase alphanumeric segments separated by single hyphens"
        )
    )]
    pub slug: Option<String>,

    pub description: Option<String>,

    /// Omit to keep the current parent, `null` to move the category to the root level
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<Uuid>)]
    pub parent_id: Option<Option<Uuid>>,

    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: Option<i32>,

    pub is_visible: Option<bool>,

    #[validate(length(max = 255, message = "Icon must not exceed 255 characters"))]
    pub icon: Option<String>,

    #[validate(length(max = 255, message = "Image must not exceed 255 characters"))]
    pub image: Option<String>,
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`)
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl From<UpdateCategoryDto> for CategoryChanges {
    fn from(dto: UpdateCategoryDto) -> Self {
        Self {
            name: dto.name,
            slug: dto.slug,
            description: dto.description,
            parent_id: dto.parent_id,
            sort_order: dto.sort_order,
            is_visible: dto.is_visible,
            icon: dto.icon,
            image: dto.image,
        }
    }
}

/// Request DTO for overwriting a category's sort order
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateSortOrderDto {
    #[validate(range(min = 0, message = "Sort order must not be negative"))]
    pub sort_order: i32,
}
