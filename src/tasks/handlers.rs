use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::AuthUser,
    envelope::Envelope,
    error::AppError,
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, ListTasksQuery, UpdateTaskRequest},
        repo_types::Task,
        services,
    },
};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/tasks/:id/toggle", patch(toggle_task))
}

/// Ids that are not UUIDs cannot name a task.
fn task_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, AppError> {
    path.map(|Path(id)| id).map_err(|e| {
        warn!(error = %e.body_text(), "malformed task id");
        AppError::NotFound("Task")
    })
}

#[instrument(skip(state, user, query), fields(user_id = %user.id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> Result<Json<Envelope<Vec<Task>>>, AppError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let tasks = services::list_tasks(&state, user.id, &filter).await?;
    Ok(Envelope::data(tasks))
}

#[instrument(skip(state, user, path), fields(user_id = %user.id))]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Task>>, AppError> {
    let task = services::get_task(&state, task_id(path)?, user.id).await?;
    Ok(Envelope::data(task))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<Task>>), AppError> {
    let Json(payload) = payload?;
    let input = payload.validate()?;
    let task = services::create_task(&state, user.id, input).await?;
    Ok((StatusCode::CREATED, Envelope::data(task)))
}

#[instrument(skip(state, user, path, payload), fields(user_id = %user.id))]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> Result<Json<Envelope<Task>>, AppError> {
    let id = task_id(path)?;
    let Json(payload) = payload?;
    let patch = payload.validate()?;
    let task = services::update_task(&state, id, user.id, patch).await?;
    Ok(Envelope::data(task))
}

#[instrument(skip(state, user, path), fields(user_id = %user.id))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<()>>, AppError> {
    services::delete_task(&state, task_id(path)?, user.id).await?;
    Ok(Envelope::message("Task deleted successfully"))
}

#[instrument(skip(state, user, path), fields(user_id = %user.id))]
pub async fn toggle_task(
    State(state): State<AppState>,
    user: AuthUser,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Envelope<Task>>, AppError> {
    let task = services::toggle_task(&state, task_id(path)?, user.id).await?;
    Ok(Envelope::data(task))
}
