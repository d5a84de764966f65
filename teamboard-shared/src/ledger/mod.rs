/// Domain operations
///
/// Every operation takes the storage backend and, when it acts on behalf of
/// a user, the caller's [`AuthContext`](crate::auth::middleware::AuthContext)
/// as explicit arguments. Project-scoped operations ask the Access Guard
/// before reading or writing.
///
/// - [`membership`]: who belongs to which project, with which role
/// - [`projects`]: the project registry
/// - [`tasks`]: tasks, their status, assignment and conversation log
/// - [`users`]: signup, login, token refresh and profiles
///
/// Lookups by id fail with `NotFound` before the guard runs, so a missing
/// record reads as missing to everyone.
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::middleware::AuthContext;
/// use teamboard_shared::ledger::{membership, projects};
/// use teamboard_shared::models::membership::ProjectRole;
/// use teamboard_shared::models::project::{CreateProject, ProjectStatus};
/// use teamboard_shared::store::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), teamboard_shared::error::LedgerError> {
/// let store = MemoryStore::new();
/// let owner = AuthContext::new(Uuid::new_v4());
///
/// let created = projects::create_project(&store, &owner, CreateProject {
///     name: "Apollo".to_string(),
///     description: String::new(),
///     status: ProjectStatus::Active,
///     created_by: Uuid::nil(),
/// }).await?;
///
/// assert_eq!(created.membership.role, ProjectRole::Admin);
/// assert!(membership::is_member(&store, &owner, created.project.id, owner.user_id).await?);
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod projects;
pub mod tasks;
pub mod users;

use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::models::project::Project;
use crate::store::Store;

/// Loads a project or fails with `NotFound`
pub(crate) async fn require_project(store: &dyn Store, id: Uuid) -> LedgerResult<Project> {
    store
        .find_project(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Project", id))
}
