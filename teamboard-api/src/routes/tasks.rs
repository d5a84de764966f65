/// Task ledger endpoints
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task (member)
/// - `GET /tasks?page=&limit=` - Paginated list
/// - `GET /tasks/:id` - Fetch one (any member of its project)
/// - `PUT /tasks/:id` - Partial update (member); a `conversation` replaces the log
/// - `POST /tasks/:id/messages` - Append one message (member)
/// - `DELETE /tasks/:id` - Delete (member)
/// - `GET /tasks/project/:project_id` - Tasks of a project
/// - `GET /tasks/project/:status/:project_id` - Tasks of a project with a status

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
    ledger::tasks::{self, NewMessage},
    models::{
        pagination::Page,
        task::{CreateTask, Task, TaskStatus, UpdateTask},
    },
};
use uuid::Uuid;

pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    body: Result<Json<CreateTask>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(data) = body?;

    let task = tasks::create_task(state.store(), &auth, data).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Task created", "task": task })),
    ))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Page<Task>>> {
    let Query(query) = query?;
    Ok(Json(tasks::list_tasks(state.store(), &auth, query.into()).await?))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Task>> {
    let Path(id) = id?;
    Ok(Json(tasks::get_task(state.store(), &auth, id).await?))
}

pub async fn list_project_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
    project_id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Path(project_id) = project_id?;
    Ok(Json(
        tasks::list_tasks_for_project(state.store(), &auth, project_id, None).await?,
    ))
}

pub async fn list_project_tasks_by_status(
    State(state): State<AppState>,
    auth: AuthContext,
    params: Result<Path<(String, Uuid)>, PathRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Path((status, project_id)) = params?;
    let status = status.parse::<TaskStatus>().map_err(ApiError::BadRequest)?;

    Ok(Json(
        tasks::list_tasks_for_project(state.store(), &auth, project_id, Some(status)).await?,
    ))
}

pub async fn update_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<UpdateTask>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;
    let Json(patch) = body?;

    let task = tasks::update_task(state.store(), &auth, id, patch).await?;
    Ok(Json(json!({ "message": "Task updated", "task": task })))
}

pub async fn post_message(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Path(id) = id?;
    let Json(message) = body?;

    let task = tasks::post_message(state.store(), &auth, id, message).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Message posted", "task": task })),
    ))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Value>> {
    let Path(id) = id?;

    tasks::delete_task(state.store(), &auth, id).await?;
    Ok(Json(json!({ "message": "Task deleted" })))
}
