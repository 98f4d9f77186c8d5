use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for category
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub icon: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row values for inserting a category
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    pub is_visible: bool,
    pub icon: Option<String>,
    pub image: Option<String>,
}

/// Partial update of a category row. `None` leaves a column untouched;
/// `parent_id: Some(None)` detaches the category to the root level.
#[derive(Debug, Clone, Default)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent_id: Option<Option<Uuid>>,
    pub sort_order: Option<i32>,
    pub is_visible: Option<bool>,
    pub icon: Option<String>,
    pub image: Option<String>,
}

/// Direction of a single-step sibling move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Result of swapping a category with its neighbouring sibling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SiblingSwap {
    /// Sort orders of the pair were exchanged
    Swapped,
    /// Already first (up) or last (down) among its siblings
    AtEdge,
    /// No category with the given id
    Missing,
}
