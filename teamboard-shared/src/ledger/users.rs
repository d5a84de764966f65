/// Identity store: signup, login, token refresh and profiles
///
/// Passwords are hashed with Argon2id before they reach storage. Signup and
/// login hand back an access/refresh token pair; the access token is what
/// the bearer middleware accepts.
///
/// Profiles are readable by any authenticated user and writable only by
/// their owner. Deleting an account removes its memberships atomically;
/// tasks assigned to the account keep pointing at it.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::authorization::require_self;
use crate::auth::jwt::{self, Claims, TokenType};
use crate::auth::middleware::AuthContext;
use crate::auth::password;
use crate::error::{LedgerError, LedgerResult};
use crate::models::pagination::{Page, PageRequest};
use crate::models::user::{CreateUser, UpdateUser, User};
use crate::store::Store;

const BAD_CREDENTIALS: &str = "Invalid email or password";

/// Signup input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,
}

/// Login input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

/// Profile patch as sent by the account owner
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    /// New plaintext password; hashed before storage
    pub password: Option<String>,
}

/// Tokens issued at signup and login
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    pub user: User,
}

/// A fresh access token issued from a refresh token
#[derive(Debug, Clone, Serialize)]
pub struct RefreshedToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

fn issue_session(user: User, secret: &str) -> LedgerResult<Session> {
    let access = Claims::new(user.id, TokenType::Access);
    let refresh = Claims::new(user.id, TokenType::Refresh);

    Ok(Session {
        access_token: jwt::create_token(&access, secret)?,
        refresh_token: jwt::create_token(&refresh, secret)?,
        token_type: "Bearer",
        expires_in: access.expires_in_seconds(),
        user,
    })
}

fn check_password(candidate: &str) -> LedgerResult<()> {
    password::validate_password_strength(candidate)
        .map_err(|message| LedgerError::validation("password", message))
}

/// Creates an account and logs it in
///
/// # Errors
///
/// - `InvalidFields`/`Validation` for a malformed email, empty name or weak
///   password
/// - `Conflict` if the email is taken (ignoring case)
pub async fn register(store: &dyn Store, secret: &str, req: RegisterUser) -> LedgerResult<Session> {
    req.validate()?;
    check_password(&req.password)?;

    if store.find_user_by_email(&req.email).await?.is_some() {
        return Err(LedgerError::Conflict(format!(
            "Email {} is already registered",
            req.email
        )));
    }

    let user = store
        .create_user(CreateUser {
            email: req.email,
            password_hash: password::hash_password(&req.password)?,
            name: req.name,
        })
        .await?;

    info!(user_id = %user.id, "User registered");
    issue_session(user, secret)
}

/// Verifies credentials and issues tokens
///
/// Unknown emails and wrong passwords produce the same error.
pub async fn login(store: &dyn Store, secret: &str, req: LoginUser) -> LedgerResult<Session> {
    req.validate()?;

    let Some(user) = store.find_user_by_email(&req.email).await? else {
        return Err(LedgerError::Unauthenticated(BAD_CREDENTIALS.to_string()));
    };

    if !password::verify_password(&req.password, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed login attempt");
        return Err(LedgerError::Unauthenticated(BAD_CREDENTIALS.to_string()));
    }

    store.record_login(user.id).await?;

    info!(user_id = %user.id, "User logged in");
    issue_session(user, secret)
}

/// Exchanges a refresh token for a new access token
///
/// The account must still exist.
pub async fn refresh(
    store: &dyn Store,
    secret: &str,
    refresh_token: &str,
) -> LedgerResult<RefreshedToken> {
    let (access_token, claims) = jwt::refresh_access_token(refresh_token, secret)
        .map_err(|e| LedgerError::Unauthenticated(e.to_string()))?;

    if store.find_user(claims.sub).await?.is_none() {
        return Err(LedgerError::Unauthenticated(
            "Account no longer exists".to_string(),
        ));
    }

    Ok(RefreshedToken {
        access_token,
        token_type: "Bearer",
        expires_in: claims.expires_in_seconds(),
    })
}

pub async fn get_user(store: &dyn Store, id: Uuid) -> LedgerResult<User> {
    store
        .find_user(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("User", id))
}

pub async fn list_users(store: &dyn Store, page: PageRequest) -> LedgerResult<Page<User>> {
    Ok(store.list_users(page).await?)
}

/// Updates the caller's own profile
pub async fn update_user(
    store: &dyn Store,
    auth: &AuthContext,
    id: Uuid,
    patch: UpdateProfile,
) -> LedgerResult<User> {
    require_self(auth, id)?;
    patch.validate()?;

    let password_hash = match patch.password.as_deref() {
        Some(new_password) => {
            check_password(new_password)?;
            Some(password::hash_password(new_password)?)
        }
        None => None,
    };

    let update = UpdateUser {
        email: patch.email,
        name: patch.name,
        password_hash,
    };
    if update.is_empty() {
        return get_user(store, id).await;
    }

    let user = store
        .update_user(id, update)
        .await?
        .ok_or_else(|| LedgerError::not_found("User", id))?;

    info!(user_id = %id, "Profile updated");
    Ok(user)
}

/// Deletes the caller's own account and all of its memberships
pub async fn delete_user(store: &dyn Store, auth: &AuthContext, id: Uuid) -> LedgerResult<()> {
    require_self(auth, id)?;

    if !store.delete_user(id).await? {
        return Err(LedgerError::not_found("User", id));
    }

    info!(user_id = %id, "User deleted");
    Ok(())
}
