//! Hierarchical product categories.
//!
//! Categories form a forest through `parent_id`. Siblings are ordered by
//! `(sort_order, id)` and can be reordered by swapping with a neighbour.
//! Hidden categories take their whole subtree out of the public tree.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Paginated flat list with filters |
//! | GET | `/api/categories/tree` | Nested tree (`include_hidden` for admin view) |
//! | GET | `/api/categories/slug/{slug}` | Get by slug |
//! | GET | `/api/categories/{id}` | Get by ID |
//! | GET | `/api/categories/{id}/children` | Direct children |
//! | POST | `/api/categories` | Create |
//! | PUT | `/api/categories/{id}` | Partial update |
//! | DELETE | `/api/categories/{id}` | Delete a childless category |
//! | PATCH | `/api/categories/{id}/toggle-visibility` | Flip visibility |
//! | PATCH | `/api/categories/{id}/sort` | Overwrite sort order |
//! | POST | `/api/categories/{id}/move-up` | Swap with previous sibling |
//! | POST | `/api/categories/{id}/move-down` | Swap with next sibling |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;

pub use repositories::PgCategoryRepository;
pub use services::CategoryService;
