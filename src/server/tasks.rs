use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;

use crate::auth::RequireUser;
use crate::hub::Event;
use crate::server::AppState;
use crate::server::access::{ProjectRole, require_project_access};
use crate::server::dto::CreateTaskRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::{parse_due_date, validate_task_title};
use crate::types::Task;

pub async fn create_task(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateTaskRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let project = require_project_access(store, auth.user.id, project_id, ProjectRole::Member)?;

    let title = req.title.trim();
    validate_task_title(title)?;
    let due_date = parse_due_date(req.due_date.as_deref())?;

    // Tasks default to their creator unless explicitly assigned.
    let assignee = match req.assigned_to {
        Some(id) => store.get_user(id)?.or_not_found("User not found")?.id,
        None => auth.user.id,
    };

    let task = store.create_task(project.id, title, assignee, due_date)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(task))))
}

pub async fn submit_task(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let task = store.get_task(task_id)?.or_not_found("Task not found")?;
    require_project_access(store, auth.user.id, task.project_id, ProjectRole::Member)?;

    let submitted_at = Utc::now();
    store.mark_task_submitted(task.id, auth.user.id, submitted_at)?;

    // The row is durable; delivery from here on is best-effort.
    state.hub.publish(&Event::TaskSubmitted {
        task_id: task.id,
        project_id: task.project_id,
        submitter_username: auth.user.username.clone(),
        submitted_at_date: submitted_at.format("%Y-%m-%d").to_string(),
    });

    let task = Task {
        submitted: true,
        submitted_at: Some(submitted_at),
        submitted_by: Some(auth.user.id),
        ..task
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(task)))
}

pub async fn pending_tasks(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let tasks = state.store.list_pending_tasks(auth.user.id)?;
    Ok::<_, ApiError>(Json(ApiResponse::success(tasks)))
}
