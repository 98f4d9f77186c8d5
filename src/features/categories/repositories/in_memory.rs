use std::cmp::Ordering;
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::{CategoryQueryParams, CategorySortBy, SortDirection};
use crate::features::categories::models::{
    Category, CategoryChanges, MoveDirection, NewCategory, SiblingSwap,
};
use crate::features::categories::repositories::sibling_order::plan_sibling_move;
use crate::features::categories::repositories::CategoryRepository;

/// Test double that mirrors the table constraints of the Postgres schema
/// (unique slug, existing parent, restrict-on-delete). Multi-step checks
/// run under the write lock, the way the Postgres side runs them in one
/// transaction.
#[derive(Default)]
pub struct InMemoryCategoryRepository {
    rows: RwLock<Vec<Category>>,
}

impl InMemoryCategoryRepository {
    pub fn with_rows(rows: Vec<Category>) -> Self {
        Self {
            rows: RwLock::new(rows),
        }
    }

    pub async fn row_count(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn sort_order_of(&self, id: Uuid) -> Option<i32> {
        self.rows
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.sort_order)
    }
}

fn display_order(a: &Category, b: &Category) -> Ordering {
    (a.sort_order, a.id).cmp(&(b.sort_order, b.id))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn matches(category: &Category, params: &CategoryQueryParams) -> bool {
    let search = params.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let name = params.name.as_deref().map(str::trim).filter(|s| !s.is_empty());

    search.map_or(true, |term| {
        contains_ci(&category.name, term)
            || category
                .description
                .as_deref()
                .is_some_and(|d| contains_ci(d, term))
    }) && name.map_or(true, |term| contains_ci(&category.name, term))
        && params.parent_id.map_or(true, |p| category.parent_id == Some(p))
        && params.is_visible.map_or(true, |v| category.is_visible == v)
}

fn ensure_unique_slug(rows: &[Category], slug: &str, except: Option<Uuid>) -> Result<()> {
    if rows.iter().any(|c| c.slug == slug && Some(c.id) != except) {
        return Err(AppError::Conflict(
            "A category with this slug already exists".to_string(),
        ));
    }
    Ok(())
}

fn ensure_parent_exists(rows: &[Category], parent_id: Option<Uuid>) -> Result<()> {
    match parent_id {
        Some(pid) if !rows.iter().any(|c| c.id == pid) => Err(AppError::BadRequest(
            "Parent category does not exist".to_string(),
        )),
        _ => Ok(()),
    }
}

fn ensure_acyclic(rows: &[Category], id: Uuid, parent_id: Uuid) -> Result<()> {
    if parent_id == id {
        return Err(AppError::BadRequest(
            "A category cannot be its own parent".to_string(),
        ));
    }

    let mut visited = HashSet::new();
    let mut cursor = Some(parent_id);
    while let Some(current) = cursor {
        if current == id {
            return Err(AppError::BadRequest(
                "Cannot move a category under one of its own descendants".to_string(),
            ));
        }
        if !visited.insert(current) {
            break;
        }
        cursor = rows.iter().find(|c| c.id == current).and_then(|c| c.parent_id);
    }
    Ok(())
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>> {
        let mut rows = self.rows.read().await.clone();
        rows.sort_by(display_order);
        Ok(rows)
    }

    async fn find_page(&self, params: &CategoryQueryParams) -> Result<(Vec<Category>, i64)> {
        let mut rows: Vec<Category> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| matches(c, params))
            .cloned()
            .collect();

        rows.sort_by(|a, b| {
            let ordering = match params.sort_by {
                CategorySortBy::SortOrder => a.sort_order.cmp(&b.sort_order),
                CategorySortBy::Name => a.name.cmp(&b.name),
                CategorySortBy::CreatedAt => a.created_at.cmp(&b.created_at),
                CategorySortBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
            }
            .then(a.id.cmp(&b.id));
            match params.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total = rows.len() as i64;
        let skip = usize::try_from(params.offset()).unwrap_or(usize::MAX);
        let take = params
            .limit()
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
        let page = rows.into_iter().skip(skip).take(take).collect();

        Ok((page, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        Ok(self.rows.read().await.iter().find(|c| c.id == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|c| c.slug == slug)
            .cloned())
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Category>> {
        let mut children: Vec<Category> = self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by(display_order);
        Ok(children)
    }

    async fn count_children(&self, id: Uuid) -> Result<i64> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .filter(|c| c.parent_id == Some(id))
            .count() as i64)
    }

    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let mut rows = self.rows.write().await;
        ensure_unique_slug(&rows, &category.slug, None)?;
        ensure_parent_exists(&rows, category.parent_id)?;

        let now = Utc::now();
        let row = Category {
            id: category.id,
            name: category.name,
            slug: category.slug,
            description: category.description,
            parent_id: category.parent_id,
            sort_order: category.sort_order,
            is_visible: category.is_visible,
            icon: category.icon,
            image: category.image,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>> {
        let mut rows = self.rows.write().await;
        if let Some(slug) = &changes.slug {
            ensure_unique_slug(&rows, slug, Some(id))?;
        }
        if let Some(parent_id) = changes.parent_id {
            ensure_parent_exists(&rows, parent_id)?;
        }
        if let Some(Some(parent_id)) = changes.parent_id {
            ensure_acyclic(&rows, id, parent_id)?;
        }

        let Some(row) = rows.iter_mut().find(|c| c.id == id) else {
            return Ok(None);
        };

        if let Some(name) = changes.name {
            row.name = name;
        }
        if let Some(slug) = changes.slug {
            row.slug = slug;
        }
        if let Some(description) = changes.description {
            row.description = Some(description);
        }
        if let Some(parent_id) = changes.parent_id {
            row.parent_id = parent_id;
        }
        if let Some(sort_order) = changes.sort_order {
            row.sort_order = sort_order;
        }
        if let Some(is_visible) = changes.is_visible {
            row.is_visible = is_visible;
        }
        if let Some(icon) = changes.icon {
            row.icon = Some(icon);
        }
        if let Some(image) = changes.image {
            row.image = Some(image);
        }
        row.updated_at = Utc::now();

        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|c| c.parent_id == Some(id)) {
            return Err(AppError::Conflict(
                "Cannot delete category with children".to_string(),
            ));
        }

        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() < before)
    }

    async fn toggle_visibility(&self, id: Uuid) -> Result<Option<Category>> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|c| c.id == id).map(|row| {
            row.is_visible = !row.is_visible;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<Option<Category>> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|c| c.id == id).map(|row| {
            row.sort_order = sort_order;
            row.updated_at = Utc::now();
            row.clone()
        }))
    }

    async fn swap_with_sibling(&self, id: Uuid, direction: MoveDirection) -> Result<SiblingSwap> {
        // The write lock plays the role of the transaction
        let mut rows = self.rows.write().await;

        let Some(parent_id) = rows.iter().find(|c| c.id == id).map(|c| c.parent_id) else {
            return Ok(SiblingSwap::Missing);
        };

        let siblings: Vec<(Uuid, i32)> = rows
            .iter()
            .filter(|c| c.parent_id == parent_id)
            .map(|c| (c.id, c.sort_order))
            .collect();
        let Some(changes) = plan_sibling_move(&siblings, id, direction) else {
            return Ok(SiblingSwap::AtEdge);
        };

        let now = Utc::now();
        for (row_id, sort_order) in changes {
            if let Some(row) = rows.iter_mut().find(|c| c.id == row_id) {
                row.sort_order = sort_order;
                row.updated_at = now;
            }
        }

        Ok(SiblingSwap::Swapped)
    }
}
