/// Task model and database operations
///
/// Tasks live inside a project, carry a status, a due time, an assignee and
/// an embedded conversation log stored as a JSONB array.
///
/// # Status
///
/// Status is free-form. Any status may replace any other:
///
/// ```text
/// not-started ⇄ started ⇄ finished
/// not-started → finished
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('not-started', 'started', 'finished');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'not-started',
///     due_at TIMESTAMPTZ NOT NULL,
///     assigned_to UUID NOT NULL,
///     priority task_priority,
///     conversation JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::task::{Task, CreateTask, TaskStatus, UpdateTask};
/// use teamboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use chrono::{Duration, Utc};
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let task = Task::create(&pool, CreateTask {
///     project_id: Uuid::new_v4(),
///     title: "Write launch notes".to_string(),
///     description: String::new(),
///     status: TaskStatus::NotStarted,
///     due_at: Utc::now() + Duration::days(3),
///     assigned_to: Uuid::new_v4(),
///     priority: None,
///     conversation: Vec::new(),
/// }).await?;
///
/// Task::update(&pool, task.id, UpdateTask {
///     status: Some(TaskStatus::Finished),
///     ..Default::default()
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;
use sqlx::postgres::{PgExecutor, PgPool};
use sqlx::types::Json;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Task progress
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    /// Nobody has picked the task up yet
    #[default]
    NotStarted,

    /// Work is in progress
    Started,

    /// Work is done
    Finished,
}

impl TaskStatus {
    /// Wire/database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::Started => "started",
            TaskStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not-started" => Ok(TaskStatus::NotStarted),
            "started" => Ok(TaskStatus::Started),
            "finished" => Ok(TaskStatus::Finished),
            other => Err(format!(
                "Unknown task status '{}': expected not-started, started or finished",
                other
            )),
        }
    }
}

/// Optional task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// One entry of a task's conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// When the message was posted
    pub posted_at: DateTime<Utc>,

    /// Author
    pub posted_by: Uuid,

    /// Message text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Attachment metadata, opaque to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<JsonValue>,
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning project (weak reference)
    pub project_id: Uuid,

    /// Short title
    pub title: String,

    /// Free-text description
    pub description: String,

    /// Progress
    pub status: TaskStatus,

    /// Due time, always UTC
    pub due_at: DateTime<Utc>,

    /// Assignee (weak reference)
    pub assigned_to: Uuid,

    /// Optional priority
    pub priority: Option<TaskPriority>,

    /// Conversation log, oldest first
    pub conversation: Json<Vec<ConversationMessage>>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last changed
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    /// Owning project
    pub project_id: Uuid,

    /// Short title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Free-text description
    #[serde(default)]
    pub description: String,

    /// Initial status (defaults to not-started)
    #[serde(default)]
    pub status: TaskStatus,

    /// Due time; offsets are normalized to UTC on deserialization
    #[serde(alias = "end_time")]
    pub due_at: DateTime<Utc>,

    /// Assignee
    pub assigned_to: Uuid,

    /// Optional priority
    #[serde(default)]
    pub priority: Option<TaskPriority>,

    /// Initial conversation log
    #[serde(default)]
    pub conversation: Vec<ConversationMessage>,
}

/// Patch for a task; only `Some` fields are merged
///
/// A supplied `conversation` replaces the stored log wholesale. Use
/// `Task::append_message` to add a single message instead.
///
/// `priority` tells an omitted field (`None`) apart from an explicit JSON
/// `null` (`Some(None)`), which clears the stored priority.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    #[serde(alias = "end_time")]
    pub due_at: Option<DateTime<Utc>>,

    pub assigned_to: Option<Uuid>,

    #[serde(
        default,
        deserialize_with = "present_or_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub priority: Option<Option<TaskPriority>>,

    pub conversation: Option<Vec<ConversationMessage>>,
}

/// Maps a present field to `Some`, keeping `null` as `Some(None)`
///
/// Paired with `#[serde(default)]`, which leaves a missing field `None`.
fn present_or_null<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

const TASK_COLUMNS: &str = "id, project_id, title, description, status, due_at, assigned_to, \
     priority, conversation, created_at, updated_at";

impl Task {
    /// Creates a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks (project_id, title, description, status, due_at, assigned_to,
                               priority, conversation)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(data.project_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.due_at)
        .bind(data.assigned_to)
        .bind(data.priority)
        .bind(Json(data.conversation))
        .fetch_one(pool)
        .await?;

        Ok(task)
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Lists tasks of every project the user is a member of, in creation order
    pub async fn list_for_member(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT t.id, t.project_id, t.title, t.description, t.status, t.due_at,
                   t.assigned_to, t.priority, t.conversation, t.created_at, t.updated_at
            FROM tasks t
            INNER JOIN project_members pm ON pm.project_id = t.project_id
            WHERE pm.user_id = $1
            ORDER BY t.created_at ASC, t.id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Counts the tasks `list_for_member` can return
    pub async fn count_for_member(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM tasks t
            INNER JOIN project_members pm ON pm.project_id = t.project_id
            WHERE pm.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Lists every task of a project, optionally with one exact status
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: Uuid,
        status: Option<TaskStatus>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = match status {
            Some(status) => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    SELECT {TASK_COLUMNS}
                    FROM tasks
                    WHERE project_id = $1 AND status = $2
                    ORDER BY created_at ASC, id ASC
                    "#
                ))
                .bind(project_id)
                .bind(status)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Task>(&format!(
                    r#"
                    SELECT {TASK_COLUMNS}
                    FROM tasks
                    WHERE project_id = $1
                    ORDER BY created_at ASC, id ASC
                    "#
                ))
                .bind(project_id)
                .fetch_all(pool)
                .await?
            }
        };

        Ok(tasks)
    }

    /// Merges a patch into a task
    ///
    /// Returns `None` if the task does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE tasks SET updated_at = NOW()");
        let mut bind_count = 1;

        let mut push = |column: &str, query: &mut String| {
            bind_count += 1;
            query.push_str(&format!(", {} = ${}", column, bind_count));
        };

        if data.title.is_some() {
            push("title", &mut query);
        }
        if data.description.is_some() {
            push("description", &mut query);
        }
        if data.status.is_some() {
            push("status", &mut query);
        }
        if data.due_at.is_some() {
            push("due_at", &mut query);
        }
        if data.assigned_to.is_some() {
            push("assigned_to", &mut query);
        }
        if data.priority.is_some() {
            push("priority", &mut query);
        }
        if data.conversation.is_some() {
            push("conversation", &mut query);
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {TASK_COLUMNS}"));

        let mut q = sqlx::query_as::<_, Task>(&query).bind(id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(status) = data.status {
            q = q.bind(status);
        }
        if let Some(due_at) = data.due_at {
            q = q.bind(due_at);
        }
        if let Some(assigned_to) = data.assigned_to {
            q = q.bind(assigned_to);
        }
        if let Some(priority) = data.priority {
            q = q.bind(priority);
        }
        if let Some(conversation) = data.conversation {
            q = q.bind(Json(conversation));
        }

        let task = q.fetch_optional(pool).await?;

        Ok(task)
    }

    /// Appends one message to the end of the conversation log
    ///
    /// The append happens in a single statement, so concurrent posters never
    /// lose each other's messages. Returns `None` if the task does not exist.
    pub async fn append_message(
        pool: &PgPool,
        id: Uuid,
        message: ConversationMessage,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks
            SET conversation = conversation || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(Json(vec![message]))
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task of a project
    pub async fn delete_by_project<'e, E>(executor: E, project_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE project_id = $1")
            .bind(project_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}
