use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::db::{StoreError, StoreResult};
use crate::tasks::repo_types::{NewTask, Task, TaskFilter, TaskRow, TaskUpdate};

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Owner's tasks matching `filter`, newest first.
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    /// Looks up by id only; ownership is the caller's concern.
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>>;

    async fn insert(&self, task: NewTask) -> StoreResult<Task>;

    /// Writes only the columns named in `update` and bumps `updated_at`.
    async fn update(&self, id: Uuid, update: &TaskUpdate) -> StoreResult<Task>;

    /// Touches only the completion flag.
    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Task>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

const TASK_COLUMNS: &str = "id, user_id, title, is_completed, due_date, tag, note, \
                            weather_city, weather_data, created_at, updated_at";

#[derive(Clone)]
pub struct PgTaskStore {
    db: PgPool,
}

impl PgTaskStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let sql = format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks
            WHERE user_id = $1
              AND ($2::boolean IS NULL OR is_completed = $2)
              AND ($3::text IS NULL OR tag = $3)
              AND ($4::text IS NULL OR title ILIKE $4 OR note ILIKE $4)
            ORDER BY created_at DESC
            "#
        );
        let rows = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(filter.is_completed)
            .bind(filter.tag.map(|t| t.as_str()))
            .bind(filter.search_pattern())
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn insert(&self, task: NewTask) -> StoreResult<Task> {
        let sql = format!(
            r#"
            INSERT INTO tasks (id, user_id, title, due_date, tag, note, weather_city, weather_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.id)
            .bind(task.user_id)
            .bind(&task.title)
            .bind(task.due_date)
            .bind(task.tag.map(|t| t.as_str()))
            .bind(&task.note)
            .bind(&task.weather_city)
            .bind(task.weather_data.map(Json))
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn update(&self, id: Uuid, update: &TaskUpdate) -> StoreResult<Task> {
        let sql = format!(
            r#"
            UPDATE tasks
               SET title = COALESCE($2, title),
                   due_date = CASE WHEN $3::boolean THEN $4::timestamptz ELSE due_date END,
                   tag = CASE WHEN $5::boolean THEN $6::text ELSE tag END,
                   note = CASE WHEN $7::boolean THEN $8::text ELSE note END,
                   weather_city = CASE WHEN $9::boolean THEN $10::text ELSE weather_city END,
                   weather_data = CASE WHEN $9::boolean THEN $11::jsonb ELSE weather_data END,
                   updated_at = now()
             WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );
        let weather = update.weather_columns();
        let set_weather = weather.is_some();
        let (city, data) = weather.unwrap_or_default();
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(update.title.as_deref())
            .bind(update.due_date.is_some())
            .bind(update.due_date.flatten())
            .bind(update.tag.is_some())
            .bind(update.tag.flatten().map(|t| t.as_str()))
            .bind(update.note.is_some())
            .bind(update.note.clone().flatten())
            .bind(set_weather)
            .bind(city)
            .bind(data.map(Json))
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn set_completed(&self, id: Uuid, completed: bool) -> StoreResult<Task> {
        let sql = format!(
            r#"
            UPDATE tasks
               SET is_completed = $2, updated_at = now()
             WHERE id = $1
            RETURNING {TASK_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .bind(completed)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let res = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if res.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
