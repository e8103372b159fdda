use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    db::StoreError,
    error::AppError,
    state::AppState,
    tasks::{
        dto::{TaskInput, TaskPatch},
        repo_types::{NewTask, Task, TaskFilter, TaskUpdate},
    },
};

fn missing_row(err: StoreError) -> AppError {
    match err {
        StoreError::NotFound => AppError::NotFound("Task"),
        other => other.into(),
    }
}

pub async fn list_tasks(
    st: &AppState,
    user_id: Uuid,
    filter: &TaskFilter,
) -> Result<Vec<Task>, AppError> {
    Ok(st.tasks.list(user_id, filter).await?)
}

/// 404 when the task does not exist, 403 when it belongs to someone else.
pub async fn get_task(st: &AppState, task_id: Uuid, user_id: Uuid) -> Result<Task, AppError> {
    let task = st
        .tasks
        .find_by_id(task_id)
        .await?
        .ok_or(AppError::NotFound("Task"))?;
    if task.user_id != user_id {
        return Err(AppError::Forbidden(
            "You do not have access to this task".into(),
        ));
    }
    Ok(task)
}

#[instrument(skip_all, fields(%user_id))]
pub async fn create_task(st: &AppState, user_id: Uuid, input: TaskInput) -> Result<Task, AppError> {
    let enrichment = st.enricher.enrich(&input.title, input.note.as_deref()).await;
    let task = st
        .tasks
        .insert(NewTask {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            due_date: input.due_date,
            tag: input.tag,
            note: input.note,
            weather_data: enrichment.city.as_ref().and(enrichment.weather),
            weather_city: enrichment.city,
        })
        .await?;
    info!(task_id = %task.id, city = ?task.weather_city, "task created");
    Ok(task)
}

/// Weather is recomputed from the merged title/note only when the patch
/// touches one of them; otherwise the stored values are kept. Only the
/// patched columns are written, so a concurrent toggle survives.
#[instrument(skip_all, fields(%task_id, %user_id))]
pub async fn update_task(
    st: &AppState,
    task_id: Uuid,
    user_id: Uuid,
    patch: TaskPatch,
) -> Result<Task, AppError> {
    let current = get_task(st, task_id, user_id).await?;
    let recompute = patch.touches_text();

    let enrichment = if recompute {
        let title = patch.title.as_deref().unwrap_or(&current.title);
        let note = match &patch.note {
            Some(note) => note.as_deref(),
            None => current.note.as_deref(),
        };
        Some(st.enricher.enrich(title, note).await)
    } else {
        None
    };

    let update = TaskUpdate {
        title: patch.title,
        due_date: patch.due_date,
        tag: patch.tag,
        note: patch.note,
        enrichment,
    };
    let task = st.tasks.update(task_id, &update).await.map_err(missing_row)?;
    info!(recomputed_weather = recompute, "task updated");
    Ok(task)
}

pub async fn delete_task(st: &AppState, task_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    get_task(st, task_id, user_id).await?;
    st.tasks.delete(task_id).await.map_err(missing_row)?;
    info!(%task_id, "task deleted");
    Ok(())
}

pub async fn toggle_task(st: &AppState, task_id: Uuid, user_id: Uuid) -> Result<Task, AppError> {
    let task = get_task(st, task_id, user_id).await?;
    let task = st
        .tasks
        .set_completed(task_id, !task.is_completed)
        .await
        .map_err(missing_row)?;
    Ok(task)
}
