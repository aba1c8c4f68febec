//! Administrative management of a self-referential category tree.
//!
//! Categories nest under a single optional parent. Names are unique among
//! siblings, a category can never be moved below itself, and deleting a
//! category moves its children up one level.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/categories` | Paginated list ordered by name |
//! | POST | `/api/categories` | Create category |
//! | GET | `/api/categories/options` | Parent selector entries |
//! | GET | `/api/categories/tree` | Whole tree |
//! | GET | `/api/categories/{id}` | Category with path, ancestors, children |
//! | GET | `/api/categories/{id}/path` | Full path, root first |
//! | GET | `/api/categories/{id}/ancestors` | Ancestors, root first |
//! | GET | `/api/categories/{id}/children` | Direct children |
//! | GET | `/api/categories/{id}/descendants` | Ids of all descendants |
//! | PUT | `/api/categories/{id}` | Update category |
//! | DELETE | `/api/categories/{id}` | Delete category, reassigning children |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod rules;
pub mod services;
pub mod stores;

pub use services::CategoryService;
