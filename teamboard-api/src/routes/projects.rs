/// Project registry endpoints
///
/// # Endpoints
///
/// - `POST /projects` - Create a project; the caller becomes its admin
/// - `GET /projects?page=&limit=` - Paginated list
/// - `GET /projects/:id` - Fetch one (any member)
/// - `GET /projects/status/:status` - Filter by `active`, `completed` or `on-hold`
/// - `PUT /projects/:id` - Partial update (admin)
/// - `DELETE /projects/:id` - Delete (admin); cascade follows configuration

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::PageQuery,
};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use teamboard_shared::{
    auth::middleware::AuthContext,
    ledger::projects,
    models::{
        pagination::Page,
        project::{CreateProject, Project, ProjectStatus, UpdateProject},
    },
};
use uuid::Uuid;

pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<CreateProject>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(data) = body?;

    let created = projects::create_project(state.store(), &auth, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Project created",
            "project": created.project,
            "membership": created.membership,
        })),
    ))
}

pub async fn list_projects(
    State(state): State<AppState>,
    _auth: AuthContext,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Project>>> {
    let Query(query) = query?;
    Ok(Json(projects::list_projects(state.store(), query.into()).await?))
}

pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Project>> {
    let Path(id) = id?;
    Ok(Json(projects::get_project(state.store(), &auth, id).await?))
}

/// Unknown statuses are a bad request, not an empty list
pub async fn list_projects_by_status(
    State(state): State<AppState>,
    _auth: AuthContext,
    status: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Vec<Project>>> {
    let Path(status) = status?;
    let status = status.parse::<ProjectStatus>().map_err(ApiError::BadRequest)?;

    Ok(Json(
        projects::list_projects_by_status(state.store(), status).await?,
    ))
}

pub async fn update_project(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateProject>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = body?;

    let project = projects::update_project(state.store(), &auth, id, patch).await?;
    Ok(Json(json!({ "message": "Project updated", "project": project })))
}

pub async fn delete_project(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;

    projects::delete_project(state.store(), &auth, id, state.cascade()).await?;
    Ok(Json(json!({ "message": "Project deleted" })))
}
