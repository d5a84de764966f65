/// PostgreSQL backend
///
/// Thin adapter from the [`Store`](super::Store) traits onto the sqlx model
/// functions. Multi-row writes (project creation, cascading project deletion,
/// user deletion) run inside one transaction.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{
    CascadePolicy, MembershipStore, ProjectStore, Store, StoreResult, TaskStore, UserStore,
};
use crate::db::pool::health_check;
use crate::models::membership::{
    CreateMembership, Membership, ProjectMember, ProjectRole, TeamMember, UserProject,
};
use crate::models::pagination::{Page, PageRequest};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::task::{ConversationMessage, CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for migrations and shutdown
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        let items = User::list(&self.pool, page.limit(), page.offset()).await?;
        let total = User::count(&self.pool).await?;
        Ok(Page::new(items, total))
    }

    async fn update_user(&self, id: Uuid, patch: UpdateUser) -> StoreResult<Option<User>> {
        Ok(User::update(&self.pool, id, patch).await?)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let memberships = Membership::delete_by_user(&mut *tx, id).await?;
        let deleted = User::delete(&mut *tx, id).await?;

        tx.commit().await?;

        debug!(user_id = %id, memberships, deleted, "User delete committed");
        Ok(deleted)
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        User::update_last_login(&self.pool, id).await?;
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project(&self, data: CreateProject) -> StoreResult<(Project, Membership)> {
        let mut tx = self.pool.begin().await?;

        let project = Project::create(&mut *tx, data).await?;
        let membership = Membership::create(
            &mut *tx,
            CreateMembership {
                project_id: project.id,
                user_id: project.created_by,
                role: ProjectRole::Admin,
            },
        )
        .await?;

        tx.commit().await?;

        Ok((project, membership))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(Project::find_by_id(&self.pool, id).await?)
    }

    async fn list_projects(&self, page: PageRequest) -> StoreResult<Page<Project>> {
        let items = Project::list(&self.pool, page.limit(), page.offset()).await?;
        let total = Project::count(&self.pool).await?;
        Ok(Page::new(items, total))
    }

    async fn list_projects_by_status(&self, status: ProjectStatus) -> StoreResult<Vec<Project>> {
        Ok(Project::list_by_status(&self.pool, status).await?)
    }

    async fn update_project(
        &self,
        id: Uuid,
        patch: UpdateProject,
    ) -> StoreResult<Option<Project>> {
        Ok(Project::update(&self.pool, id, patch).await?)
    }

    async fn delete_project(&self, id: Uuid, policy: CascadePolicy) -> StoreResult<bool> {
        match policy {
            CascadePolicy::Retain => Ok(Project::delete(&self.pool, id).await?),
            CascadePolicy::Cascade => {
                let mut tx = self.pool.begin().await?;

                let deleted = Project::delete(&mut *tx, id).await?;
                if deleted {
                    let tasks = Task::delete_by_project(&mut *tx, id).await?;
                    let members = Membership::delete_by_project(&mut *tx, id).await?;
                    debug!(project_id = %id, tasks, members, "Cascaded project delete");
                }

                tx.commit().await?;
                Ok(deleted)
            }
        }
    }
}

#[async_trait]
impl MembershipStore for PgStore {
    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        Ok(Membership::create(&self.pool, data).await?)
    }

    async fn find_membership(&self, id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(Membership::find_by_id(&self.pool, id).await?)
    }

    async fn find_membership_for(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(Membership::find(&self.pool, project_id, user_id).await?)
    }

    async fn role_of(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectRole>> {
        Ok(Membership::get_role(&self.pool, project_id, user_id).await?)
    }

    async fn count_role(&self, project_id: Uuid, role: ProjectRole) -> StoreResult<i64> {
        Ok(Membership::count_with_role(&self.pool, project_id, role).await?)
    }

    async fn update_membership_role(
        &self,
        id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<Option<Membership>> {
        Ok(Membership::update_role(&self.pool, id, role).await?)
    }

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(Membership::delete(&self.pool, project_id, user_id).await?)
    }

    async fn list_project_members(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ProjectMember>> {
        let items =
            Membership::list_by_project(&self.pool, project_id, page.limit(), page.offset())
                .await?;
        let total = Membership::count_by_project(&self.pool, project_id).await?;
        Ok(Page::new(items, total))
    }

    async fn list_user_projects(&self, user_id: Uuid) -> StoreResult<Vec<UserProject>> {
        Ok(Membership::list_by_user(&self.pool, user_id).await?)
    }

    async fn list_team_members(&self, user_id: Uuid) -> StoreResult<Vec<TeamMember>> {
        Ok(Membership::list_team_members(&self.pool, user_id).await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn list_tasks(&self, member_id: Uuid, page: PageRequest) -> StoreResult<Page<Task>> {
        let items = Task::list_for_member(&self.pool, member_id, page.limit(), page.offset()).await?;
        let total = Task::count_for_member(&self.pool, member_id).await?;
        Ok(Page::new(items, total))
    }

    async fn list_project_tasks(
        &self,
        project_id: Uuid,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_project(&self.pool, project_id, status).await?)
    }

    async fn update_task(&self, id: Uuid, patch: UpdateTask) -> StoreResult<Option<Task>> {
        Ok(Task::update(&self.pool, id, patch).await?)
    }

    async fn append_task_message(
        &self,
        id: Uuid,
        message: ConversationMessage,
    ) -> StoreResult<Option<Task>> {
        Ok(Task::append_message(&self.pool, id, message).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        Ok(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
