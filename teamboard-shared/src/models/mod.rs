/// Database models for Teamboard
///
/// Each model owns its table and exposes CRUD operations as associated
/// functions over a `PgPool` (or any `PgExecutor` where the call has to join
/// a transaction).
///
/// # Models
///
/// - `user`: User accounts and credentials
/// - `project`: Projects and their lifecycle status
/// - `membership`: User-project relationships with roles
/// - `task`: Tasks with status, assignment and conversation log
/// - `pagination`: Page request/response contract shared by all listings
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::project::{Project, CreateProject, ProjectStatus};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let project = Project::create(&pool, CreateProject {
///     name: "Apollo".to_string(),
///     description: "Moonshot".to_string(),
///     status: ProjectStatus::Active,
///     created_by: Uuid::new_v4(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod membership;
pub mod pagination;
pub mod project;
pub mod task;
pub mod user;
