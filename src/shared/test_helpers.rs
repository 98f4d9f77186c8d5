use std::sync::Arc;

use axum::Router;
use chrono::Utc;
use fake::faker::lorem::en::Word;
use fake::Fake;
use uuid::Uuid;

use crate::features::categories::models::Category;
use crate::features::categories::repositories::InMemoryCategoryRepository;
use crate::features::categories::{routes, CategoryService};

/// Deterministic id; ordering of the ids follows `n`
pub fn id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

/// A visible category row with a generated name and a slug unique to its id
pub fn category_fixture(id: Uuid, parent_id: Option<Uuid>, sort_order: i32) -> Category {
    let now = Utc::now();
    Category {
        id,
        name: Word().fake::<String>(),
        slug: format!("category-{}", id.simple()),
        description: None,
        parent_id,
        sort_order,
        is_visible: true,
        icon: None,
        image: None,
        created_at: now,
        updated_at: now,
    }
}

/// Service backed by an in-memory table seeded with `rows`
pub fn category_service(rows: Vec<Category>) -> (Arc<CategoryService>, Arc<InMemoryCategoryRepository>) {
    let repository = Arc::new(InMemoryCategoryRepository::with_rows(rows));
    let service = Arc::new(CategoryService::new(repository.clone()));
    (service, repository)
}

/// Category routes over an in-memory table seeded with `rows`
pub fn category_router(rows: Vec<Category>) -> (Router, Arc<InMemoryCategoryRepository>) {
    let (service, repository) = category_service(rows);
    (routes::routes(service), repository)
}
