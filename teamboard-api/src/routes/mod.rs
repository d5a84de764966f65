/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Signup, login and token refresh
/// - `users`: User profiles
/// - `projects`: Project registry
/// - `project_users`: Project memberships
/// - `tasks`: Tasks and their conversation log
///
/// Reads return the bare resource, mutations wrap it as
/// `{ "message": ..., "<resource>": ... }` and listings return
/// `{ "items": [...], "total": n }`.

use serde::Deserialize;
use teamboard_shared::models::pagination::PageRequest;

pub mod auth;
pub mod health;
pub mod project_users;
pub mod projects;
pub mod tasks;
pub mod users;

/// `?page=&limit=` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl From<PageQuery> for PageRequest {
    fn from(query: PageQuery) -> Self {
        PageRequest::new(query.page, query.limit)
    }
}
