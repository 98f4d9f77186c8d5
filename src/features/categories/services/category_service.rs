use std::sync::Arc;

use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{
    CategoryQueryParams, CategoryResponseDto, CategoryTreeDto, CreateCategoryDto,
    TreeVisibility, UpdateCategoryDto,
};
use crate::features::categories::models::{Category, MoveDirection, NewCategory, SiblingSwap};
use crate::features::categories::repositories::CategoryRepository;
use crate::shared::validation::slugify;

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Category with id {} not found", id))
}

/// Service for category operations: flat listing, tree views and sibling ordering.
///
/// Holds no copy of the table; every read goes to the repository.
pub struct CategoryService {
    repository: Arc<dyn CategoryRepository>,
}

impl CategoryService {
    pub fn new(repository: Arc<dyn CategoryRepository>) -> Self {
        Self { repository }
    }

    /// List categories with pagination and filters
    pub async fn list(
        &self,
        params: &CategoryQueryParams,
    ) -> Result<(Vec<CategoryResponseDto>, i64)> {
        let (categories, total) = self.repository.find_page(params).await?;
        Ok((categories.into_iter().map(Into::into).collect(), total))
    }

    /// Build the category forest from the current table contents
    pub async fn list_tree(&self, visibility: TreeVisibility) -> Result<Vec<CategoryTreeDto>> {
        let categories = self.repository.find_all().await?;
        Ok(CategoryTreeDto::build_tree(categories, visibility))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<CategoryResponseDto> {
        self.find(id).await.map(Into::into)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<CategoryResponseDto> {
        self.repository
            .find_by_slug(slug)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Category '{}' not found", slug)))
    }

    /// Direct children of a category, in sibling order
    pub async fn list_children(&self, id: Uuid) -> Result<Vec<CategoryResponseDto>> {
        self.find(id).await?;
        let children = self.repository.find_children(id).await?;
        Ok(children.into_iter().map(Into::into).collect())
    }

    /// Create a new category. The slug is derived from the name when omitted.
    pub async fn create(&self, dto: CreateCategoryDto) -> Result<CategoryResponseDto> {
        let slug = match dto.slug {
            Some(slug) => slug,
            None => slugify(&dto.name),
        };
        if slug.is_empty() {
            return Err(AppError::Validation(
                "slug is required when the name contains no ASCII letters or digits".to_string(),
            ));
        }

        self.ensure_slug_available(&slug, None).await?;
        if let Some(parent_id) = dto.parent_id {
            self.ensure_parent_exists(parent_id).await?;
        }

        let category = self
            .repository
            .insert(NewCategory {
                id: Uuid::now_v7(),
                name: dto.name,
                slug,
                description: dto.description,
                parent_id: dto.parent_id,
                sort_order: dto.sort_order.unwrap_or(0),
                is_visible: dto.is_visible.unwrap_or(true),
                icon: dto.icon,
                image: dto.image,
            })
            .await?;

        tracing::info!(category_id = %category.id, slug = %category.slug, "Category created");

        Ok(category.into())
    }

    /// Partial update. The repository rejects a parent change that would
    /// create a cycle; sibling sort orders are left as they are.
    pub async fn update(&self, id: Uuid, dto: UpdateCategoryDto) -> Result<CategoryResponseDto> {
        let existing = self.find(id).await?;

        if let Some(slug) = dto.slug.as_deref() {
            if slug != existing.slug {
                self.ensure_slug_available(slug, Some(id)).await?;
            }
        }

        let category = self
            .repository
            .update(id, dto.into())
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(category_id = %category.id, "Category updated");

        Ok(category.into())
    }

    /// Delete a childless category
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.find(id).await?;

        if self.repository.count_children(id).await? > 0 {
            return Err(AppError::Conflict(
                "Cannot delete category with children".to_string(),
            ));
        }

        if !self.repository.delete(id).await? {
            return Err(not_found(id));
        }

        tracing::info!(category_id = %id, "Category deleted");

        Ok(())
    }

    pub async fn toggle_visibility(&self, id: Uuid) -> Result<CategoryResponseDto> {
        let category = self
            .repository
            .toggle_visibility(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        tracing::info!(
            category_id = %id,
            is_visible = category.is_visible,
            "Category visibility toggled"
        );

        Ok(category.into())
    }

    /// Overwrite the sort order without renumbering siblings
    pub async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<CategoryResponseDto> {
        self.repository
            .set_sort_order(id, sort_order)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found(id))
    }

    /// Move one position earlier among siblings; `false` if already first
    pub async fn move_up(&self, id: Uuid) -> Result<bool> {
        self.move_sibling(id, MoveDirection::Up).await
    }

    /// Move one position later among siblings; `false` if already last
    pub async fn move_down(&self, id: Uuid) -> Result<bool> {
        self.move_sibling(id, MoveDirection::Down).await
    }

    async fn move_sibling(&self, id: Uuid, direction: MoveDirection) -> Result<bool> {
        match self.repository.swap_with_sibling(id, direction).await? {
            SiblingSwap::Swapped => Ok(true),
            SiblingSwap::AtEdge => Ok(false),
            SiblingSwap::Missing => Err(not_found(id)),
        }
    }

    async fn find(&self, id: Uuid) -> Result<Category> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn ensure_slug_available(&self, slug: &str, except: Option<Uuid>) -> Result<()> {
        match self.repository.find_by_slug(slug).await? {
            Some(other) if Some(other.id) != except => Err(AppError::Conflict(format!(
                "Category slug '{}' already exists",
                slug
            ))),
            _ => Ok(()),
        }
    }

    async fn ensure_parent_exists(&self, parent_id: Uuid) -> Result<()> {
        if self.repository.find_by_id(parent_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Parent category {} does not exist",
                parent_id
            )));
        }
        Ok(())
    }
}
