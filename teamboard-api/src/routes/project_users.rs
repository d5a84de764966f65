/// Project membership endpoints
///
/// # Endpoints
///
/// - `POST /project-users` - Add a member (admin)
/// - `GET /project-users/project/:project_id?page=&limit=` - Members of a project
/// - `GET /project-users/user/:user_id` - Projects of a user (self only)
/// - `GET /project-users/team-members/:user_id` - Users sharing a project (self only)
/// - `PUT /project-users/:id/role` - Change a role (admin)
/// - `DELETE /project-users/project/:project_id/user/:user_id` - Remove a member (admin)
/// - `GET /project-users/project/:project_id/user/:user_id/check` - `{ "is_member": bool }`

use crate::{app::AppState, error::ApiResult, routes::PageQuery};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use teamboard_shared::{
    auth::middleware::AuthContext,
    ledger::membership,
    models::{
        membership::{CreateMembership, ProjectMember, ProjectRole, TeamMember, UserProject},
        pagination::Page,
    },
};
use uuid::Uuid;

/// Role change request
#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: ProjectRole,
}

/// Membership check response
#[derive(Debug, Serialize, Deserialize)]
pub struct MembershipCheck {
    pub is_member: bool,
}

pub async fn add_member(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<CreateMembership>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(data) = body?;

    let membership = membership::add_member(state.store(), &auth, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Member added", "membership": membership })),
    ))
}

pub async fn list_members(
    State(state): State<AppState>,
    auth: AuthContext,
    project_id: Result<Path<Uuid>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<ProjectMember>>> {
    let Path(project_id) = project_id?;
    let Query(query) = query?;

    Ok(Json(
        membership::list_members(state.store(), &auth, project_id, query.into()).await?,
    ))
}

pub async fn list_user_projects(
    State(state): State<AppState>,
    auth: AuthContext,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<UserProject>>> {
    let Path(user_id) = user_id?;
    Ok(Json(
        membership::list_projects_for_user(state.store(), &auth, user_id).await?,
    ))
}

pub async fn list_team_members(
    State(state): State<AppState>,
    auth: AuthContext,
    user_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<TeamMember>>> {
    let Path(user_id) = user_id?;
    Ok(Json(
        membership::list_team_members(state.store(), &auth, user_id).await?,
    ))
}

pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateRoleRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(req) = body?;

    let membership = membership::update_role(state.store(), &auth, id, req.role).await?;
    Ok(Json(json!({ "message": "Role updated", "membership": membership })))
}

pub async fn remove_member(
    State(state): State<AppState>,
    auth: AuthContext,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path((project_id, user_id)) = ids?;

    membership::remove_member(state.store(), &auth, project_id, user_id).await?;
    Ok(Json(json!({ "message": "Member removed" })))
}

pub async fn check_membership(
    State(state): State<AppState>,
    auth: AuthContext,
    ids: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> ApiResult<Json<MembershipCheck>> {
    let Path((project_id, user_id)) = ids?;

    let is_member = membership::is_member(state.store(), &auth, project_id, user_id).await?;
    Ok(Json(MembershipCheck { is_member }))
}
