/// Storage abstraction behind the ledgers
///
/// The ledgers never talk to PostgreSQL directly. They go through the
/// [`Store`] trait, which has two implementations:
///
/// - [`postgres::PgStore`]: the production backend, built on the sqlx models
/// - [`memory::MemoryStore`]: an in-process backend used by tests and demos
///
/// Both backends keep the same observable behaviour: listings come back in
/// creation order, the (project, user) pair is unique, user emails are unique
/// ignoring case, and multi-row writes are atomic.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use teamboard_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), teamboard_shared::store::StoreError> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
/// store.ping().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::models::membership::{
    CreateMembership, Membership, ProjectMember, ProjectRole, TeamMember, UserProject,
};
use crate::models::pagination::{Page, PageRequest};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::task::{ConversationMessage, CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Constraint name reported when a (project, user) pair already exists
pub const MEMBERSHIP_UNIQUE_CONSTRAINT: &str = "project_members_project_user_key";

/// Constraint name reported when an email is already registered
pub const USER_EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

/// Storage failure
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// Anything else the database reported
    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::UniqueViolation(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Result alias for storage calls
pub type StoreResult<T> = Result<T, StoreError>;

/// What happens to a project's tasks and memberships when it is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CascadePolicy {
    /// Only the project row goes; tasks and memberships keep their dangling
    /// project id
    #[default]
    Retain,

    /// Tasks and memberships are deleted in the same transaction
    Cascade,
}

impl FromStr for CascadePolicy {
    type Err = String;

    /// Accepts the usual boolean spellings as well as the policy names
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "cascade" => Ok(CascadePolicy::Cascade),
            "false" | "0" | "no" | "retain" | "" => Ok(CascadePolicy::Retain),
            other => Err(format!("Invalid cascade policy '{}'", other)),
        }
    }
}

/// User persistence
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user; a taken email yields `UniqueViolation`
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Case-insensitive lookup
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>>;

    async fn update_user(&self, id: Uuid, patch: UpdateUser) -> StoreResult<Option<User>>;

    /// Deletes a user together with all of their memberships
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    async fn record_login(&self, id: Uuid) -> StoreResult<()>;
}

/// Project persistence
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Inserts the project and its creator's admin membership atomically
    async fn create_project(&self, data: CreateProject) -> StoreResult<(Project, Membership)>;

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>>;

    async fn list_projects(&self, page: PageRequest) -> StoreResult<Page<Project>>;

    async fn list_projects_by_status(&self, status: ProjectStatus) -> StoreResult<Vec<Project>>;

    async fn update_project(&self, id: Uuid, patch: UpdateProject)
        -> StoreResult<Option<Project>>;

    /// Deletes the project, applying `policy` to its dependents
    async fn delete_project(&self, id: Uuid, policy: CascadePolicy) -> StoreResult<bool>;
}

/// Membership persistence
#[async_trait]
pub trait MembershipStore: Send + Sync {
    /// Inserts a membership; an existing pair yields `UniqueViolation`
    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership>;

    async fn find_membership(&self, id: Uuid) -> StoreResult<Option<Membership>>;

    async fn find_membership_for(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>>;

    async fn role_of(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectRole>>;

    /// Number of memberships of `project_id` holding exactly `role`
    async fn count_role(&self, project_id: Uuid, role: ProjectRole) -> StoreResult<i64>;

    async fn update_membership_role(
        &self,
        id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<Option<Membership>>;

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool>;

    /// Members of a project with their display fields, in membership order
    async fn list_project_members(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ProjectMember>>;

    async fn list_user_projects(&self, user_id: Uuid) -> StoreResult<Vec<UserProject>>;

    /// Distinct users sharing a project with `user_id`, excluding them
    async fn list_team_members(&self, user_id: Uuid) -> StoreResult<Vec<TeamMember>>;
}

/// Task persistence
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks of every project `member_id` belongs to, in creation order
    async fn list_tasks(&self, member_id: Uuid, page: PageRequest) -> StoreResult<Page<Task>>;

    async fn list_project_tasks(
        &self,
        project_id: Uuid,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>>;

    async fn update_task(&self, id: Uuid, patch: UpdateTask) -> StoreResult<Option<Task>>;

    async fn append_task_message(
        &self,
        id: Uuid,
        message: ConversationMessage,
    ) -> StoreResult<Option<Task>>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool>;
}

/// Everything the ledgers need from a backend
#[async_trait]
pub trait Store: UserStore + ProjectStore + MembershipStore + TaskStore {
    /// Cheap liveness probe used by `/health`
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}
