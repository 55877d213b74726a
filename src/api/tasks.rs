//! Task management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::task::{Task, TaskInput, TaskQuery},
};

use super::AuthenticatedUser;

/// Task listing response
#[derive(Serialize, ToSchema)]
pub struct TaskListResponse {
    pub tasks: Vec<Task>,
    pub total: i64,
    /// Number of pages at the requested page size
    pub task_pages: i64,
    pub page: i64,
    pub limit: i64,
}

/// List tasks visible to the caller, with filters and pagination
#[utoipa::path(
    get,
    path = "/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(TaskQuery),
    responses(
        (status = 200, description = "Tasks", body = TaskListResponse),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_tasks(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<TaskQuery>,
) -> AppResult<Json<TaskListResponse>> {
    let (tasks, total) = state.services.tasks.list(&claims, &query).await?;

    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    let task_pages = (total + limit - 1) / limit;

    Ok(Json(TaskListResponse {
        tasks,
        total,
        task_pages,
        page,
        limit,
    }))
}

/// Get a single task
#[utoipa::path(
    get,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 200, description = "Task", body = Task),
        (status = 404, description = "Task not found")
    )
)]
pub async fn get_task(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Task>> {
    let task = state.services.tasks.get(&claims, id).await?;
    Ok(Json(task))
}

/// Create a new task owned by the caller
#[utoipa::path(
    post,
    path = "/tasks",
    tag = "tasks",
    security(("bearer_auth" = [])),
    request_body = TaskInput,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Guests cannot create tasks")
    )
)]
pub async fn create_task(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(input): Json<TaskInput>,
) -> AppResult<(StatusCode, Json<Task>)> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let task = state.services.tasks.create(&claims, input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

/// Update an existing task
#[utoipa::path(
    put,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    request_body = TaskInput,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn update_task(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(input): Json<TaskInput>,
) -> AppResult<Json<Task>> {
    input
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let task = state.services.tasks.update(&claims, id, input).await?;
    Ok(Json(task))
}

/// Delete a task
#[utoipa::path(
    delete,
    path = "/tasks/{id}",
    tag = "tasks",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Task ID")
    ),
    responses(
        (status = 204, description = "Task deleted"),
        (status = 404, description = "Task not found")
    )
)]
pub async fn delete_task(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.tasks.delete(&claims, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
