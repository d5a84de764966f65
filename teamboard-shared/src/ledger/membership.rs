/// Membership ledger
///
/// Maps (project, user) to a role. Adding, re-roling and removing members
/// needs admin on the project; listing needs any membership.
///
/// A pair can only be added once. The ledger checks before inserting, and
/// the storage uniqueness rule catches the race where two admins add the
/// same user at once; both paths report `Conflict`.
///
/// A project always keeps at least one admin: removing or demoting the last
/// one is refused with `Conflict`.

use tracing::info;
use uuid::Uuid;

use super::require_project;
use crate::auth::authorization::{authorize, require_self};
use crate::auth::middleware::AuthContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::membership::{
    CreateMembership, Membership, ProjectMember, ProjectRole, TeamMember, UserProject,
};
use crate::models::pagination::{Page, PageRequest};
use crate::store::Store;

/// Adds a user to a project; requires admin
///
/// # Errors
///
/// - `NotFound` if the project or the user does not exist
/// - `Forbidden` if the caller is not an admin of the project
/// - `Conflict` if the user already belongs to the project
pub async fn add_member(
    store: &dyn Store,
    auth: &AuthContext,
    data: CreateMembership,
) -> LedgerResult<Membership> {
    require_project(store, data.project_id).await?;
    authorize(store, auth, data.project_id, Some(ProjectRole::Admin)).await?;

    if store.find_user(data.user_id).await?.is_none() {
        return Err(LedgerError::not_found("User", data.user_id));
    }

    if store
        .find_membership_for(data.project_id, data.user_id)
        .await?
        .is_some()
    {
        return Err(LedgerError::Conflict(format!(
            "User {} is already a member of project {}",
            data.user_id, data.project_id
        )));
    }

    let membership = store.create_membership(data).await?;

    info!(
        membership_id = %membership.id,
        project_id = %membership.project_id,
        user_id = %membership.user_id,
        role = %membership.role,
        added_by = %auth.user_id,
        "Member added"
    );

    Ok(membership)
}

/// Pages through a project's members; requires any membership
pub async fn list_members(
    store: &dyn Store,
    auth: &AuthContext,
    project_id: Uuid,
    page: PageRequest,
) -> LedgerResult<Page<ProjectMember>> {
    require_project(store, project_id).await?;
    authorize(store, auth, project_id, Some(ProjectRole::Viewer)).await?;

    Ok(store.list_project_members(project_id, page).await?)
}

/// Refuses to take away the admin role of the project's only admin
async fn ensure_not_last_admin(
    store: &dyn Store,
    membership: &Membership,
) -> LedgerResult<()> {
    if membership.role != ProjectRole::Admin {
        return Ok(());
    }

    if store.count_role(membership.project_id, ProjectRole::Admin).await? <= 1 {
        return Err(LedgerError::Conflict(format!(
            "User {} is the last admin of project {}",
            membership.user_id, membership.project_id
        )));
    }

    Ok(())
}

/// Every project a user belongs to; callers may only list their own
pub async fn list_projects_for_user(
    store: &dyn Store,
    auth: &AuthContext,
    user_id: Uuid,
) -> LedgerResult<Vec<UserProject>> {
    require_self(auth, user_id)?;
    Ok(store.list_user_projects(user_id).await?)
}

/// Users sharing at least one project with `user_id`
pub async fn list_team_members(
    store: &dyn Store,
    auth: &AuthContext,
    user_id: Uuid,
) -> LedgerResult<Vec<TeamMember>> {
    require_self(auth, user_id)?;
    Ok(store.list_team_members(user_id).await?)
}

/// Changes the role of a membership; requires admin of its project
pub async fn update_role(
    store: &dyn Store,
    auth: &AuthContext,
    membership_id: Uuid,
    role: ProjectRole,
) -> LedgerResult<Membership> {
    let existing = store
        .find_membership(membership_id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Membership", membership_id))?;

    authorize(store, auth, existing.project_id, Some(ProjectRole::Admin)).await?;

    if role != ProjectRole::Admin {
        ensure_not_last_admin(store, &existing).await?;
    }

    let membership = store
        .update_membership_role(membership_id, role)
        .await?
        .ok_or_else(|| LedgerError::not_found("Membership", membership_id))?;

    info!(
        membership_id = %membership.id,
        project_id = %membership.project_id,
        from = %existing.role,
        to = %membership.role,
        changed_by = %auth.user_id,
        "Member role changed"
    );

    Ok(membership)
}

/// Removes a user from a project; requires admin
pub async fn remove_member(
    store: &dyn Store,
    auth: &AuthContext,
    project_id: Uuid,
    user_id: Uuid,
) -> LedgerResult<bool> {
    authorize(store, auth, project_id, Some(ProjectRole::Admin)).await?;

    let not_member = || {
        LedgerError::NotFound(format!(
            "User {} is not a member of project {}",
            user_id, project_id
        ))
    };

    let existing = store
        .find_membership_for(project_id, user_id)
        .await?
        .ok_or_else(not_member)?;
    ensure_not_last_admin(store, &existing).await?;

    if !store.delete_membership(project_id, user_id).await? {
        return Err(not_member());
    }

    info!(%project_id, %user_id, removed_by = %auth.user_id, "Member removed");
    Ok(true)
}

/// Whether `user_id` belongs to `project_id`
///
/// Anyone may ask about themselves. Asking about somebody else requires
/// being a member of the project.
pub async fn is_member(
    store: &dyn Store,
    auth: &AuthContext,
    project_id: Uuid,
    user_id: Uuid,
) -> LedgerResult<bool> {
    if auth.user_id != user_id {
        authorize(store, auth, project_id, None).await?;
    }

    Ok(store.role_of(project_id, user_id).await?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::projects::create_project;
    use crate::models::project::{CreateProject, ProjectStatus};
    use crate::models::user::CreateUser;
    use crate::store::memory::MemoryStore;
    use crate::store::{MembershipStore, UserStore};

    async fn user(store: &MemoryStore, name: &str) -> AuthContext {
        let user = store
            .create_user(CreateUser {
                email: format!("{}@example.com", name),
                password_hash: "$argon2id$test".to_string(),
                name: name.to_string(),
            })
            .await
            .unwrap();
        AuthContext::new(user.id)
    }

    async fn project(store: &MemoryStore, owner: &AuthContext) -> Uuid {
        create_project(
            store,
            owner,
            CreateProject {
                name: "Apollo".to_string(),
                description: String::new(),
                status: ProjectStatus::Active,
                created_by: Uuid::nil(),
            },
        )
        .await
        .unwrap()
        .project
        .id
    }

    #[tokio::test]
    async fn test_add_member_twice_conflicts() {
        let store = MemoryStore::new();
        let admin = user(&store, "ada").await;
        let other = user(&store, "grace").await;
        let project_id = project(&store, &admin).await;

        let data = CreateMembership {
            project_id,
            user_id: other.user_id,
            role: ProjectRole::Member,
        };
        add_member(&store, &admin, data.clone()).await.unwrap();

        let err = add_member(&store, &admin, data).await.unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        let members = list_members(&store, &admin, project_id, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(members.total, 2);
    }

    #[tokio::test]
    async fn test_add_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let admin = user(&store, "ada").await;
        let project_id = project(&store, &admin).await;

        let err = add_member(
            &store,
            &admin,
            CreateMembership {
                project_id,
                user_id: Uuid::new_v4(),
                role: ProjectRole::Viewer,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_member_cannot_add_members() {
        let store = MemoryStore::new();
        let admin = user(&store, "ada").await;
        let member = user(&store, "grace").await;
        let newcomer = user(&store, "linus").await;
        let project_id = project(&store, &admin).await;

        add_member(
            &store,
            &admin,
            CreateMembership {
                project_id,
                user_id: member.user_id,
                role: ProjectRole::Member,
            },
        )
        .await
        .unwrap();

        let err = add_member(
            &store,
            &member,
            CreateMembership {
                project_id,
                user_id: newcomer.user_id,
                role: ProjectRole::Viewer,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, LedgerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_update_role_and_remove() {
        let store = MemoryStore::new();
        let admin = user(&store, "ada").await;
        let other = user(&store, "grace").await;
        let project_id = project(&store, &admin).await;

        let membership = add_member(
            &store,
            &admin,
            CreateMembership {
                project_id,
                user_id: other.user_id,
                role: ProjectRole::Viewer,
            },
        )
        .await
        .unwrap();

        let updated = update_role(&store, &admin, membership.id, ProjectRole::Member)
            .await
            .unwrap();
        assert_eq!(updated.role, ProjectRole::Member);

        assert!(remove_member(&store, &admin, project_id, other.user_id)
            .await
            .unwrap());

        let err = remove_member(&store, &admin, project_id, other.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));

        let err = update_role(&store, &admin, membership.id, ProjectRole::Admin)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_last_admin_is_kept() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let grace = user(&store, "grace").await;
        let project_id = project(&store, &ada).await;

        let own = store
            .find_membership_for(project_id, ada.user_id)
            .await
            .unwrap()
            .unwrap();

        let err = update_role(&store, &ada, own.id, ProjectRole::Viewer)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        let err = remove_member(&store, &ada, project_id, ada.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));

        // Still in charge
        assert_eq!(
            store.role_of(project_id, ada.user_id).await.unwrap(),
            Some(ProjectRole::Admin)
        );

        // With a second admin the first may step down
        add_member(
            &store,
            &ada,
            CreateMembership {
                project_id,
                user_id: grace.user_id,
                role: ProjectRole::Admin,
            },
        )
        .await
        .unwrap();

        assert!(remove_member(&store, &ada, project_id, ada.user_id)
            .await
            .unwrap());

        let grace_row = store
            .find_membership_for(project_id, grace.user_id)
            .await
            .unwrap()
            .unwrap();
        let err = update_role(&store, &grace, grace_row.id, ProjectRole::Member)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_is_member_rules() {
        let store = MemoryStore::new();
        let admin = user(&store, "ada").await;
        let outsider = user(&store, "grace").await;
        let project_id = project(&store, &admin).await;

        assert!(is_member(&store, &admin, project_id, admin.user_id).await.unwrap());
        assert!(!is_member(&store, &admin, project_id, outsider.user_id).await.unwrap());
        assert!(!is_member(&store, &outsider, project_id, outsider.user_id).await.unwrap());

        let err = is_member(&store, &outsider, project_id, admin.user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_team_members_are_distinct_and_self_only() {
        let store = MemoryStore::new();
        let ada = user(&store, "ada").await;
        let grace = user(&store, "grace").await;

        for _ in 0..2 {
            let project_id = project(&store, &ada).await;
            add_member(
                &store,
                &ada,
                CreateMembership {
                    project_id,
                    user_id: grace.user_id,
                    role: ProjectRole::Viewer,
                },
            )
            .await
            .unwrap();
        }

        let team = list_team_members(&store, &ada, ada.user_id).await.unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].user_id, grace.user_id);
        assert_eq!(team[0].email, "grace@example.com");

        let err = list_team_members(&store, &grace, ada.user_id).await.unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden(_)));

        let projects = list_projects_for_user(&store, &grace, grace.user_id).await.unwrap();
        assert_eq!(projects.len(), 2);
        assert!(projects.iter().all(|p| p.project_name == "Apollo"));
    }
}
