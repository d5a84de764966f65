/// In-memory backend
///
/// Keeps every table in a `Vec` behind one `tokio::sync::RwLock`. Rows are
/// appended on insert, so iteration order is creation order, matching the
/// `ORDER BY created_at, id` of the PostgreSQL backend. Writes that touch
/// several tables take the write lock once, which makes them atomic.
///
/// Used by the test suites and handy for running the API without a database.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use std::collections::BTreeSet;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CascadePolicy, MembershipStore, ProjectStore, Store, StoreError, StoreResult, TaskStore,
    UserStore, MEMBERSHIP_UNIQUE_CONSTRAINT, USER_EMAIL_UNIQUE_CONSTRAINT,
};
use crate::models::membership::{
    CreateMembership, Membership, ProjectMember, ProjectRole, TeamMember, UserProject,
};
use crate::models::pagination::{Page, PageRequest};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::models::task::{ConversationMessage, CreateTask, Task, TaskStatus, UpdateTask};
use crate::models::user::{CreateUser, UpdateUser, User};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    projects: Vec<Project>,
    memberships: Vec<Membership>,
    tasks: Vec<Task>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn insert_membership(&mut self, data: CreateMembership) -> StoreResult<Membership> {
        let exists = self
            .memberships
            .iter()
            .any(|m| m.project_id == data.project_id && m.user_id == data.user_id);
        if exists {
            return Err(StoreError::UniqueViolation(
                MEMBERSHIP_UNIQUE_CONSTRAINT.to_string(),
            ));
        }

        let now = Utc::now();
        let membership = Membership {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            user_id: data.user_id,
            role: data.role,
            created_at: now,
            updated_at: now,
        };
        self.memberships.push(membership.clone());
        Ok(membership)
    }

    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }
}

/// Store that lives entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.email_taken(&data.email, None) {
            return Err(StoreError::UniqueViolation(
                USER_EMAIL_UNIQUE_CONSTRAINT.to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            name: data.name,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.user(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_users(&self, page: PageRequest) -> StoreResult<Page<User>> {
        Ok(Page::from_slice(&self.tables.read().await.users, page))
    }

    async fn update_user(&self, id: Uuid, patch: UpdateUser) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;

        if let Some(email) = &patch.email {
            if tables.email_taken(email, Some(id)) {
                return Err(StoreError::UniqueViolation(
                    USER_EMAIL_UNIQUE_CONSTRAINT.to_string(),
                ));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };

        if let Some(email) = patch.email {
            user.email = email;
        }
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(password_hash) = patch.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();

        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        tables.memberships.retain(|m| m.user_id != id);

        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        Ok(tables.users.len() < before)
    }

    async fn record_login(&self, id: Uuid) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if let Some(user) = tables.users.iter_mut().find(|u| u.id == id) {
            user.last_login_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, data: CreateProject) -> StoreResult<(Project, Membership)> {
        let mut tables = self.tables.write().await;

        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            description: data.description,
            status: data.status,
            created_by: data.created_by,
            created_at: now,
            updated_at: now,
        };

        let membership = tables.insert_membership(CreateMembership {
            project_id: project.id,
            user_id: project.created_by,
            role: ProjectRole::Admin,
        })?;
        tables.projects.push(project.clone());

        Ok((project, membership))
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        let tables = self.tables.read().await;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(&self, page: PageRequest) -> StoreResult<Page<Project>> {
        Ok(Page::from_slice(&self.tables.read().await.projects, page))
    }

    async fn list_projects_by_status(&self, status: ProjectStatus) -> StoreResult<Vec<Project>> {
        let tables = self.tables.read().await;
        Ok(tables
            .projects
            .iter()
            .filter(|p| p.status == status)
            .cloned()
            .collect())
    }

    async fn update_project(
        &self,
        id: Uuid,
        patch: UpdateProject,
    ) -> StoreResult<Option<Project>> {
        let mut tables = self.tables.write().await;

        let Some(project) = tables.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };

        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = description;
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        project.updated_at = Utc::now();

        Ok(Some(project.clone()))
    }

    async fn delete_project(&self, id: Uuid, policy: CascadePolicy) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.projects.len();
        tables.projects.retain(|p| p.id != id);
        let deleted = tables.projects.len() < before;

        if deleted && policy == CascadePolicy::Cascade {
            tables.tasks.retain(|t| t.project_id != id);
            tables.memberships.retain(|m| m.project_id != id);
        }

        Ok(deleted)
    }
}

#[async_trait]
impl MembershipStore for MemoryStore {
    async fn create_membership(&self, data: CreateMembership) -> StoreResult<Membership> {
        self.tables.write().await.insert_membership(data)
    }

    async fn find_membership(&self, id: Uuid) -> StoreResult<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables.memberships.iter().find(|m| m.id == id).cloned())
    }

    async fn find_membership_for(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let tables = self.tables.read().await;
        Ok(tables
            .memberships
            .iter()
            .find(|m| m.project_id == project_id && m.user_id == user_id)
            .cloned())
    }

    async fn role_of(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<Option<ProjectRole>> {
        Ok(self
            .find_membership_for(project_id, user_id)
            .await?
            .map(|m| m.role))
    }

    async fn count_role(&self, project_id: Uuid, role: ProjectRole) -> StoreResult<i64> {
        let tables = self.tables.read().await;
        let count = tables
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id && m.role == role)
            .count();
        Ok(count as i64)
    }

    async fn update_membership_role(
        &self,
        id: Uuid,
        role: ProjectRole,
    ) -> StoreResult<Option<Membership>> {
        let mut tables = self.tables.write().await;

        let Some(membership) = tables.memberships.iter_mut().find(|m| m.id == id) else {
            return Ok(None);
        };
        membership.role = role;
        membership.updated_at = Utc::now();

        Ok(Some(membership.clone()))
    }

    async fn delete_membership(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.memberships.len();
        tables
            .memberships
            .retain(|m| !(m.project_id == project_id && m.user_id == user_id));
        Ok(tables.memberships.len() < before)
    }

    async fn list_project_members(
        &self,
        project_id: Uuid,
        page: PageRequest,
    ) -> StoreResult<Page<ProjectMember>> {
        let tables = self.tables.read().await;

        let members: Vec<ProjectMember> = tables
            .memberships
            .iter()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| {
                tables.user(m.user_id).map(|u| ProjectMember {
                    id: m.id,
                    project_id: m.project_id,
                    user_id: m.user_id,
                    role: m.role,
                    created_at: m.created_at,
                    updated_at: m.updated_at,
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
            })
            .collect();

        Ok(Page::from_slice(&members, page))
    }

    async fn list_user_projects(&self, user_id: Uuid) -> StoreResult<Vec<UserProject>> {
        let tables = self.tables.read().await;

        Ok(tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                tables
                    .projects
                    .iter()
                    .find(|p| p.id == m.project_id)
                    .map(|p| UserProject {
                        id: m.id,
                        project_id: m.project_id,
                        user_id: m.user_id,
                        role: m.role,
                        created_at: m.created_at,
                        updated_at: m.updated_at,
                        project_name: p.name.clone(),
                        project_description: p.description.clone(),
                    })
            })
            .collect())
    }

    async fn list_team_members(&self, user_id: Uuid) -> StoreResult<Vec<TeamMember>> {
        let tables = self.tables.read().await;

        // Memberships of deleted projects do not make anyone a teammate
        let shared_projects: BTreeSet<Uuid> = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter(|m| tables.projects.iter().any(|p| p.id == m.project_id))
            .map(|m| m.project_id)
            .collect();

        let teammate_ids: BTreeSet<Uuid> = tables
            .memberships
            .iter()
            .filter(|m| shared_projects.contains(&m.project_id) && m.user_id != user_id)
            .map(|m| m.user_id)
            .collect();

        let mut members: Vec<TeamMember> = teammate_ids
            .into_iter()
            .filter_map(|id| {
                tables.user(id).map(|u| TeamMember {
                    user_id: u.id,
                    name: u.name.clone(),
                    email: u.email.clone(),
                })
            })
            .collect();
        members.sort_by(|a, b| a.name.cmp(&b.name).then(a.user_id.cmp(&b.user_id)));

        Ok(members)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: data.status,
            due_at: data.due_at,
            assigned_to: data.assigned_to,
            priority: data.priority,
            conversation: Json(data.conversation),
            created_at: now,
            updated_at: now,
        };

        self.tables.write().await.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let tables = self.tables.read().await;
        Ok(tables.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list_tasks(&self, member_id: Uuid, page: PageRequest) -> StoreResult<Page<Task>> {
        let tables = self.tables.read().await;

        let joined: BTreeSet<Uuid> = tables
            .memberships
            .iter()
            .filter(|m| m.user_id == member_id)
            .map(|m| m.project_id)
            .collect();

        let visible: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| joined.contains(&t.project_id))
            .cloned()
            .collect();

        Ok(Page::from_slice(&visible, page))
    }

    async fn list_project_tasks(
        &self,
        project_id: Uuid,
        status: Option<TaskStatus>,
    ) -> StoreResult<Vec<Task>> {
        let tables = self.tables.read().await;
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect())
    }

    async fn update_task(&self, id: Uuid, patch: UpdateTask) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;

        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(due_at) = patch.due_at {
            task.due_at = due_at;
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(conversation) = patch.conversation {
            task.conversation = Json(conversation);
        }
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn append_task_message(
        &self,
        id: Uuid,
        message: ConversationMessage,
    ) -> StoreResult<Option<Task>> {
        let mut tables = self.tables.write().await;

        let Some(task) = tables.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.conversation.0.push(message);
        task.updated_at = Utc::now();

        Ok(Some(task.clone()))
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;

        let before = tables.tasks.len();
        tables.tasks.retain(|t| t.id != id);
        Ok(tables.tasks.len() < before)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(email: &str, name: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            password_hash: "$argon2id$test".to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_email_uniqueness_ignores_case() {
        let store = MemoryStore::new();
        store
            .create_user(new_user("ada@example.com", "Ada"))
            .await
            .unwrap();

        let err = store
            .create_user(new_user("ADA@example.com", "Ada again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(ref c) if c == USER_EMAIL_UNIQUE_CONSTRAINT));

        let found = store.find_user_by_email("Ada@Example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_membership_pair_is_unique() {
        let store = MemoryStore::new();
        let data = CreateMembership {
            project_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            role: ProjectRole::Viewer,
        };

        store.create_membership(data.clone()).await.unwrap();
        let err = store.create_membership(data.clone()).await.unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation(_)));

        let tables = store.tables.read().await;
        assert_eq!(tables.memberships.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_user_removes_memberships() {
        let store = MemoryStore::new();
        let user = store
            .create_user(new_user("grace@example.com", "Grace"))
            .await
            .unwrap();
        store
            .create_project(CreateProject {
                name: "Compiler".to_string(),
                description: String::new(),
                status: ProjectStatus::Active,
                created_by: user.id,
            })
            .await
            .unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(store.list_user_projects(user.id).await.unwrap().is_empty());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_project_respects_policy() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();

        let mut ids = Vec::new();
        for name in ["Retained", "Cascaded"] {
            let (project, _) = store
                .create_project(CreateProject {
                    name: name.to_string(),
                    description: String::new(),
                    status: ProjectStatus::Active,
                    created_by: owner,
                })
                .await
                .unwrap();
            store
                .create_task(CreateTask {
                    project_id: project.id,
                    title: "Task".to_string(),
                    description: String::new(),
                    status: TaskStatus::NotStarted,
                    due_at: Utc::now(),
                    assigned_to: owner,
                    priority: None,
                    conversation: Vec::new(),
                })
                .await
                .unwrap();
            ids.push(project.id);
        }

        assert!(store.delete_project(ids[0], CascadePolicy::Retain).await.unwrap());
        assert!(store.delete_project(ids[1], CascadePolicy::Cascade).await.unwrap());

        assert_eq!(store.list_project_tasks(ids[0], None).await.unwrap().len(), 1);
        assert!(store.role_of(ids[0], owner).await.unwrap().is_some());

        assert!(store.list_project_tasks(ids[1], None).await.unwrap().is_empty());
        assert!(store.role_of(ids[1], owner).await.unwrap().is_none());
    }
}
