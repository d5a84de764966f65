/// Access Guard: project-scoped role checks
///
/// Every ledger operation that touches a project asks the guard first. The
/// guard resolves the caller's role from the membership table and compares
/// ranks; this is the only place roles are compared.
///
/// # Permission Model
///
/// | Role   | Rank | Can do                                      |
/// |--------|------|---------------------------------------------|
/// | admin  | 3    | everything, including members and deletion  |
/// | member | 2    | create, change and delete tasks             |
/// | viewer | 1    | read                                        |
///
/// Failing the guard is always *forbidden*. Token problems are
/// *unauthenticated* and never reach the guard.
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::authorization::authorize;
/// use teamboard_shared::auth::middleware::AuthContext;
/// use teamboard_shared::models::membership::ProjectRole;
/// use teamboard_shared::store::memory::MemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() {
/// let store = MemoryStore::new();
/// let auth = AuthContext::new(Uuid::new_v4());
///
/// let denied = authorize(&store, &auth, Uuid::new_v4(), Some(ProjectRole::Viewer)).await;
/// assert!(denied.is_err());
/// # }
/// ```

use tracing::debug;
use uuid::Uuid;

use super::middleware::AuthContext;
use crate::models::membership::ProjectRole;
use crate::store::{MembershipStore, StoreError};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller holds no membership in the project
    #[error("Not a member of project {0}")]
    NotMember(Uuid),

    /// Caller's role ranks below the required one
    #[error("Insufficient permissions: requires {required}, has {actual}")]
    InsufficientRole {
        required: ProjectRole,
        actual: ProjectRole,
    },

    /// Caller tried to act on someone else's account
    #[error("Not authorized to access this resource")]
    NotAuthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves the caller's role in `project_id` and checks it
///
/// With `required = None` any membership passes. Returns the caller's role
/// on success so callers can make finer decisions without a second lookup.
///
/// # Errors
///
/// - `AuthzError::NotMember` if the caller has no membership
/// - `AuthzError::InsufficientRole` if the role ranks too low
pub async fn authorize<S>(
    store: &S,
    auth: &AuthContext,
    project_id: Uuid,
    required: Option<ProjectRole>,
) -> Result<ProjectRole, AuthzError>
where
    S: MembershipStore + ?Sized,
{
    let Some(actual) = store.role_of(project_id, auth.user_id).await? else {
        debug!(user_id = %auth.user_id, %project_id, "Denied: not a project member");
        return Err(AuthzError::NotMember(project_id));
    };

    if let Some(required) = required {
        if !actual.satisfies(required) {
            debug!(
                user_id = %auth.user_id,
                %project_id,
                %required,
                %actual,
                "Denied: insufficient project role"
            );
            return Err(AuthzError::InsufficientRole { required, actual });
        }
    }

    Ok(actual)
}

/// Allows only the account owner to act on `user_id`
pub fn require_self(auth: &AuthContext, user_id: Uuid) -> Result<(), AuthzError> {
    if auth.user_id != user_id {
        debug!(caller = %auth.user_id, target = %user_id, "Denied: not the account owner");
        return Err(AuthzError::NotAuthorized);
    }

    Ok(())
}
