/// Task ledger
///
/// Reading tasks needs any membership in the task's project; creating,
/// changing, posting to and deleting tasks needs member or above.
///
/// Status is free-form, so a task may jump straight from `not-started` to
/// `finished`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::require_project;
use crate::auth::authorization::authorize;
use crate::auth::middleware::AuthContext;
use crate::error::{LedgerError, LedgerResult};
use crate::models::membership::ProjectRole;
use crate::models::pagination::{Page, PageRequest};
use crate::models::task::{ConversationMessage, CreateTask, Task, TaskStatus, UpdateTask};
use crate::store::Store;

/// A message to append to a task's conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewMessage {
    #[validate(length(min = 1, max = 10000, message = "Content must be 1-10000 characters"))]
    pub content: Option<String>,

    pub files: Option<JsonValue>,
}

async fn require_task(store: &dyn Store, id: Uuid) -> LedgerResult<Task> {
    store
        .find_task(id)
        .await?
        .ok_or_else(|| LedgerError::not_found("Task", id))
}

/// Creates a task in a project; requires member
pub async fn create_task(
    store: &dyn Store,
    auth: &AuthContext,
    data: CreateTask,
) -> LedgerResult<Task> {
    data.validate()?;

    require_project(store, data.project_id).await?;
    authorize(store, auth, data.project_id, Some(ProjectRole::Member)).await?;

    let task = store.create_task(data).await?;

    info!(
        task_id = %task.id,
        project_id = %task.project_id,
        assigned_to = %task.assigned_to,
        created_by = %auth.user_id,
        "Task created"
    );

    Ok(task)
}

/// Fetches one task; requires any membership in its project
pub async fn get_task(store: &dyn Store, auth: &AuthContext, id: Uuid) -> LedgerResult<Task> {
    let task = require_task(store, id).await?;
    authorize(store, auth, task.project_id, Some(ProjectRole::Viewer)).await?;
    Ok(task)
}

/// Pages through the tasks of the caller's projects in creation order
///
/// Projects the caller has no membership in contribute nothing, so the
/// listing never shows a task `get_task` would refuse.
pub async fn list_tasks(
    store: &dyn Store,
    auth: &AuthContext,
    page: PageRequest,
) -> LedgerResult<Page<Task>> {
    Ok(store.list_tasks(auth.user_id, page).await?)
}

/// All tasks of a project, optionally narrowed to one status
pub async fn list_tasks_for_project(
    store: &dyn Store,
    auth: &AuthContext,
    project_id: Uuid,
    status: Option<TaskStatus>,
) -> LedgerResult<Vec<Task>> {
    require_project(store, project_id).await?;
    authorize(store, auth, project_id, Some(ProjectRole::Viewer)).await?;

    Ok(store.list_project_tasks(project_id, status).await?)
}

/// Merges a patch into a task; requires member
///
/// A supplied conversation replaces the stored one.
pub async fn update_task(
    store: &dyn Store,
    auth: &AuthContext,
    id: Uuid,
    patch: UpdateTask,
) -> LedgerResult<Task> {
    patch.validate()?;

    let existing = require_task(store, id).await?;
    authorize(store, auth, existing.project_id, Some(ProjectRole::Member)).await?;

    let replaces_conversation = patch.conversation.is_some();
    let task = store
        .update_task(id, patch)
        .await?
        .ok_or_else(|| LedgerError::not_found("Task", id))?;

    info!(
        task_id = %id,
        updated_by = %auth.user_id,
        from = %existing.status,
        to = %task.status,
        replaces_conversation,
        "Task updated"
    );

    Ok(task)
}

/// Appends one message authored by the caller; requires member
pub async fn post_message(
    store: &dyn Store,
    auth: &AuthContext,
    id: Uuid,
    message: NewMessage,
) -> LedgerResult<Task> {
    message.validate()?;
    if message.content.is_none() && message.files.is_none() {
        return Err(LedgerError::validation(
            "content",
            "A message needs content or files",
        ));
    }

    let existing = require_task(store, id).await?;
    authorize(store, auth, existing.project_id, Some(ProjectRole::Member)).await?;

    let entry = ConversationMessage {
        posted_at: Utc::now(),
        posted_by: auth.user_id,
        content: message.content,
        files: message.files,
    };

    let task = store
        .append_task_message(id, entry)
        .await?
        .ok_or_else(|| LedgerError::not_found("Task", id))?;

    info!(
        task_id = %id,
        posted_by = %auth.user_id,
        messages = task.conversation.len(),
        "Message posted"
    );

    Ok(task)
}

/// Deletes a task; requires member
pub async fn delete_task(store: &dyn Store, auth: &AuthContext, id: Uuid) -> LedgerResult<()> {
    let task = require_task(store, id).await?;
    authorize(store, auth, task.project_id, Some(ProjectRole::Member)).await?;

    if !store.delete_task(id).await? {
        return Err(LedgerError::not_found("Task", id));
    }

    info!(task_id = %id, project_id = %task.project_id, deleted_by = %auth.user_id, "Task deleted");
    Ok(())
}
