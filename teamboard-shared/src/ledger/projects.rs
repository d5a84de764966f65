/// Project registry
///
/// Creation makes the caller the project's first admin in the same atomic
/// write. Reads need any membership, changes and deletion need admin.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::require_project;
use crate::auth::authorization::authorize;
use crate::auth::middleware::AuthContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::membership::{Membership, ProjectRole};
use crate::models::pagination::{Page, PageRequest};
use crate::models::project::{CreateProject, Project, ProjectStatus, UpdateProject};
use crate::store::{CascadePolicy, Store};

/// A new project together with its creator's admin membership
#[derive(Debug, Clone, Serialize)]
pub struct CreatedProject {
    pub project: Project,
    pub membership: Membership,
}

/// Creates a project owned by the caller
///
/// Any client-supplied creator is overwritten with the caller.
pub async fn create_project(
    store: &dyn Store,
    auth: &AuthContext,
    mut data: CreateProject,
) -> LedgerResult<CreatedProject> {
    data.validate()?;
    data.created_by = auth.user_id;

    let (project, membership) = store.create_project(data).await?;

    info!(
        project_id = %project.id,
        created_by = %auth.user_id,
        status = %project.status,
        "Project created"
    );

    Ok(CreatedProject { project, membership })
}

/// Fetches one project; requires any membership
pub async fn get_project(store: &dyn Store, auth: &AuthContext, id: Uuid) -> LedgerResult<Project> {
    let project = require_project(store, id).await?;
    authorize(store, auth, id, Some(ProjectRole::Viewer)).await?;
    Ok(project)
}

/// Pages through all projects in creation order
pub async fn list_projects(store: &dyn Store, page: PageRequest) -> LedgerResult<Page<Project>> {
    Ok(store.list_projects(page).await?)
}

/// All projects with the given status, unpaginated
pub async fn list_projects_by_status(
    store: &dyn Store,
    status: ProjectStatus,
) -> LedgerResult<Vec<Project>> {
    Ok(store.list_projects_by_status(status).await?)
}

/// Merges a patch into a project; requires admin
pub async fn update_project(
    store: &dyn Store,
    auth: &AuthContext,
    id: Uuid,
    patch: UpdateProject,
) -> LedgerResult<Project> {
    patch.validate()?;

    require_project(store, id).await?;
    authorize(store, auth, id, Some(ProjectRole::Admin)).await?;

    let project = store
        .update_project(id, patch)
        .await?
        .ok_or_else(|| LedgerError::not_found("Project", id))?;

    info!(project_id = %id, updated_by = %auth.user_id, status = %project.status, "Project updated");
    Ok(project)
}

/// Deletes a project; requires admin
///
/// `policy` decides whether the project's tasks and memberships go too.
pub async fn delete_project(
    store: &dyn Store,
    auth: &AuthContext,
    id: Uuid,
    policy: CascadePolicy,
) -> LedgerResult<()> {
    require_project(store, id).await?;
    authorize(store, auth, id, Some(ProjectRole::Admin)).await?;

    if !store.delete_project(id, policy).await? {
        return Err(LedgerError::not_found("Project", id));
    }

    info!(project_id = %id, deleted_by = %auth.user_id, ?policy, "Project deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use crate::store::MembershipStore;

    fn new_project(name: &str) -> CreateProject {
        CreateProject {
            name: name.to_string(),
            description: "desc".to_string(),
            status: ProjectStatus::Active,
            created_by: Uuid::nil(),
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_admin() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());

        let created = create_project(&store, &auth, new_project("Apollo")).await.unwrap();

        assert_eq!(created.project.created_by, auth.user_id);
        assert_eq!(created.membership.user_id, auth.user_id);
        assert_eq!(created.membership.role, ProjectRole::Admin);
        assert_eq!(
            store.role_of(created.project.id, auth.user_id).await.unwrap(),
            Some(ProjectRole::Admin)
        );
    }

    #[tokio::test]
    async fn test_create_rejects_empty_name() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());

        let err = create_project(&store, &auth, new_project("")).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidFields(_)));
    }

    #[tokio::test]
    async fn test_get_missing_project_is_not_found_for_everyone() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());

        let err = get_project(&store, &auth, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_merges_only_supplied_fields() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());
        let created = create_project(&store, &auth, new_project("Apollo")).await.unwrap();

        let updated = update_project(
            &store,
            &auth,
            created.project.id,
            UpdateProject {
                status: Some(ProjectStatus::OnHold),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.status, ProjectStatus::OnHold);
        assert_eq!(updated.name, "Apollo");
        assert_eq!(updated.description, "desc");
        assert!(updated.updated_at >= created.project.updated_at);
    }

    #[tokio::test]
    async fn test_non_member_cannot_update() {
        let store = MemoryStore::new();
        let owner = AuthContext::new(Uuid::new_v4());
        let stranger = AuthContext::new(Uuid::new_v4());
        let created = create_project(&store, &owner, new_project("Apollo")).await.unwrap();

        let err = update_project(
            &store,
            &stranger,
            created.project.id,
            UpdateProject {
                name: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LedgerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());

        create_project(&store, &auth, new_project("A")).await.unwrap();
        let mut done = new_project("B");
        done.status = ProjectStatus::Completed;
        create_project(&store, &auth, done).await.unwrap();

        let completed = list_projects_by_status(&store, ProjectStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].name, "B");
    }

    #[tokio::test]
    async fn test_delete_missing_project_is_not_found() {
        let store = MemoryStore::new();
        let auth = AuthContext::new(Uuid::new_v4());

        let err = delete_project(&store, &auth, Uuid::new_v4(), CascadePolicy::Retain)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }
}
