/// User profile endpoints
///
/// Any authenticated user may read profiles; only the owner may change or
/// delete an account.

use crate::{app::AppState, error::ApiResult, routes::PageQuery};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};
use teamboard_shared::{
    auth::middleware::AuthContext,
    ledger::users::{self, UpdateProfile},
    models::{pagination::Page, user::User},
};
use uuid::Uuid;

/// `GET /users?page=&limit=`
pub async fn list_users(
    State(state): State<AppState>,
    _auth: AuthContext,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<User>>> {
    let Query(query) = query?;
    Ok(Json(users::list_users(state.store(), query.into()).await?))
}

/// `GET /users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    _auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<User>> {
    let Path(id) = id?;
    Ok(Json(users::get_user(state.store(), id).await?))
}

/// `PUT /users/:id`
///
/// Accepts any of `email`, `name` and `password`.
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateProfile>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = body?;

    let user = users::update_user(state.store(), &auth, id, patch).await?;
    Ok(Json(json!({ "message": "User updated", "user": user })))
}

/// `DELETE /users/:id`
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;

    users::delete_user(state.store(), &auth, id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
