use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::categories::dtos::CategoryQueryParams;
use crate::features::categories::models::{
    Category, CategoryChanges, MoveDirection, NewCategory, SiblingSwap,
};
use crate::features::categories::repositories::sibling_order::plan_sibling_move;

/// Storage for the `categories` table
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Every row, ordered by `(sort_order, id)`
    async fn find_all(&self) -> Result<Vec<Category>>;

    /// One page of rows matching the filters, plus the total match count
    async fn find_page(&self, params: &CategoryQueryParams) -> Result<(Vec<Category>, i64)>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>>;

    /// Direct children, ordered by `(sort_order, id)`
    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Category>>;

    async fn count_children(&self, id: Uuid) -> Result<i64>;

    async fn insert(&self, category: NewCategory) -> Result<Category>;

    /// Returns `None` when no row has the given id. A parent change that
    /// would make the category its own ancestor fails with `BadRequest`;
    /// the check and the write are atomic.
    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>>;

    /// Returns whether a row was removed
    async fn delete(&self, id: Uuid) -> Result<bool>;

    async fn toggle_visibility(&self, id: Uuid) -> Result<Option<Category>>;

    async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<Option<Category>>;

    /// Move one step among siblings in display order `(sort_order, id)`.
    /// Tied values in the group are spread apart first; every change in
    /// the group is applied together or not at all.
    async fn swap_with_sibling(&self, id: Uuid, direction: MoveDirection) -> Result<SiblingSwap>;
}

/// Advisory lock held by every parent change until its transaction ends
const HIERARCHY_LOCK_KEY: i64 = 0x6361_7465_676f_7279;

const SWAP_ATTEMPTS: usize = 3;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, parent_id, sort_order, is_visible, \
     icon, image, created_at, updated_at";

/// Convert database error to more specific AppError with user-friendly messages
fn handle_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        // Unique constraint violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23505")) {
            return AppError::Conflict("A category with this slug already exists".to_string());
        }

        // Foreign key violation
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23503")) {
            return AppError::BadRequest("Parent category does not exist".to_string());
        }

        // Check constraint violation (own parent)
        if db_err.code() == Some(std::borrow::Cow::Borrowed("23514")) {
            return AppError::BadRequest("A category cannot be its own parent".to_string());
        }
    }

    tracing::error!("Category query failed: {:?}", e);
    AppError::Database(e)
}

/// PostgreSQL implementation of [`CategoryRepository`]
pub struct PgCategoryRepository {
    pool: PgPool,
}

impl PgCategoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn find_all(&self) -> Result<Vec<Category>> {
        let query = format!(
            "SELECT {} FROM categories ORDER BY sort_order, id",
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn find_page(&self, params: &CategoryQueryParams) -> Result<(Vec<Category>, i64)> {
        let search = params.search_pattern();
        let name = params.name_pattern();

        let where_clause = r#"
            WHERE ($1::text IS NULL OR name ILIKE $1 OR description ILIKE $1)
              AND ($2::text IS NULL OR name ILIKE $2)
              AND ($3::uuid IS NULL OR parent_id = $3)
              AND ($4::boolean IS NULL OR is_visible = $4)
        "#;

        let count_query = format!("SELECT COUNT(*) FROM categories {}", where_clause);
        let total: i64 = sqlx::query_scalar(&count_query)
            .bind(&search)
            .bind(&name)
            .bind(params.parent_id)
            .bind(params.is_visible)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)?;

        // Sort column and direction come from enums, never from raw input.
        // A NULL limit means LIMIT ALL.
        let query = format!(
            r#"
            SELECT {}
            FROM categories
            {}
            ORDER BY {} {}, id {}
            LIMIT $5 OFFSET $6
            "#,
            CATEGORY_COLUMNS,
            where_clause,
            params.sort_by.as_sql(),
            params.sort.as_sql(),
            params.sort.as_sql()
        );

        let categories = sqlx::query_as::<_, Category>(&query)
            .bind(&search)
            .bind(&name)
            .bind(params.parent_id)
            .bind(params.is_visible)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(handle_db_error)?;

        Ok((categories, total))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Category>> {
        let query = format!("SELECT {} FROM categories WHERE id = $1", CATEGORY_COLUMNS);

        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>> {
        let query = format!("SELECT {} FROM categories WHERE slug = $1", CATEGORY_COLUMNS);

        sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn find_children(&self, parent_id: Uuid) -> Result<Vec<Category>> {
        let query = format!(
            "SELECT {} FROM categories WHERE parent_id = $1 ORDER BY sort_order, id",
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(parent_id)
            .fetch_all(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn count_children(&self, id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE parent_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn insert(&self, category: NewCategory) -> Result<Category> {
        let query = format!(
            r#"
            INSERT INTO categories (id, name, slug, description, parent_id, sort_order, is_visible, icon, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(category.id)
            .bind(category.name)
            .bind(category.slug)
            .bind(category.description)
            .bind(category.parent_id)
            .bind(category.sort_order)
            .bind(category.is_visible)
            .bind(category.icon)
            .bind(category.image)
            .fetch_one(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn update(&self, id: Uuid, changes: CategoryChanges) -> Result<Option<Category>> {
        let mut tx = self.pool.begin().await.map_err(handle_db_error)?;

        if let Some(Some(parent_id)) = changes.parent_id {
            // Parent changes run one at a time, so two concurrent moves
            // cannot each pass the check and close a loop together
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(HIERARCHY_LOCK_KEY)
                .execute(&mut *tx)
                .await
                .map_err(handle_db_error)?;

            if parent_id == id {
                return Err(AppError::BadRequest(
                    "A category cannot be its own parent".to_string(),
                ));
            }

            let creates_cycle: bool = sqlx::query_scalar(
                r#"
                WITH RECURSIVE ancestors AS (
                    SELECT id, parent_id FROM categories WHERE id = $1
                    UNION
                    SELECT c.id, c.parent_id
                    FROM categories c
                    JOIN ancestors a ON c.id = a.parent_id
                )
                SELECT EXISTS (SELECT 1 FROM ancestors WHERE id = $2)
                "#,
            )
            .bind(parent_id)
            .bind(id)
            .fetch_one(&mut *tx)
            .await
            .map_err(handle_db_error)?;

            if creates_cycle {
                return Err(AppError::BadRequest(
                    "Cannot move a category under one of its own descendants".to_string(),
                ));
            }
        }

        let query = format!(
            r#"
            UPDATE categories
            SET name = COALESCE($1, name),
                slug = COALESCE($2, slug),
                description = COALESCE($3, description),
                parent_id = CASE WHEN $4 THEN $5 ELSE parent_id END,
                sort_order = COALESCE($6, sort_order),
                is_visible = COALESCE($7, is_visible),
                icon = COALESCE($8, icon),
                image = COALESCE($9, image),
                updated_at = NOW()
            WHERE id = $10
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        let category = sqlx::query_as::<_, Category>(&query)
            .bind(changes.name)
            .bind(changes.slug)
            .bind(changes.description)
            .bind(changes.parent_id.is_some())
            .bind(changes.parent_id.flatten())
            .bind(changes.sort_order)
            .bind(changes.is_visible)
            .bind(changes.icon)
            .bind(changes.image)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(handle_db_error)?;

        tx.commit().await.map_err(handle_db_error)?;

        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| match handle_db_error(e) {
                // A child was inserted after the service's check; ON DELETE RESTRICT caught it
                AppError::BadRequest(_) => {
                    AppError::Conflict("Cannot delete category with children".to_string())
                }
                other => other,
            })?;

        Ok(result.rows_affected() > 0)
    }

    async fn toggle_visibility(&self, id: Uuid) -> Result<Option<Category>> {
        let query = format!(
            r#"
            UPDATE categories
            SET is_visible = NOT is_visible, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn set_sort_order(&self, id: Uuid, sort_order: i32) -> Result<Option<Category>> {
        let query = format!(
            r#"
            UPDATE categories
            SET sort_order = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            CATEGORY_COLUMNS
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(sort_order)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(handle_db_error)
    }

    async fn swap_with_sibling(&self, id: Uuid, direction: MoveDirection) -> Result<SiblingSwap> {
        for _ in 0..SWAP_ATTEMPTS {
            let mut tx = self.pool.begin().await.map_err(handle_db_error)?;

            let parent_id: Option<Option<Uuid>> =
                sqlx::query_scalar("SELECT parent_id FROM categories WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(handle_db_error)?;
            let Some(parent_id) = parent_id else {
                return Ok(SiblingSwap::Missing);
            };

            // Lock the whole sibling group in id order; concurrent moves in
            // the same group queue up behind each other instead of deadlocking
            let siblings: Vec<(Uuid, i32)> = sqlx::query_as(
                r#"
                SELECT id, sort_order
                FROM categories
                WHERE parent_id IS NOT DISTINCT FROM $1
                ORDER BY id
                FOR UPDATE
                "#,
            )
            .bind(parent_id)
            .fetch_all(&mut *tx)
            .await
            .map_err(handle_db_error)?;

            if !siblings.iter().any(|&(sibling_id, _)| sibling_id == id) {
                // Re-parented or deleted while waiting for the locks
                tx.rollback().await.map_err(handle_db_error)?;
                continue;
            }

            let Some(changes) = plan_sibling_move(&siblings, id, direction) else {
                return Ok(SiblingSwap::AtEdge);
            };

            for &(row_id, sort_order) in &changes {
                sqlx::query(
                    "UPDATE categories SET sort_order = $1, updated_at = NOW() WHERE id = $2",
                )
                .bind(sort_order)
                .bind(row_id)
                .execute(&mut *tx)
                .await
                .map_err(handle_db_error)?;
            }

            tx.commit().await.map_err(handle_db_error)?;

            tracing::debug!(
                category_id = %id,
                rows_changed = changes.len(),
                "Moved category among its siblings"
            );

            return Ok(SiblingSwap::Swapped);
        }

        Err(AppError::Conflict(
            "Category was moved concurrently, please retry".to_string(),
        ))
    }
}
