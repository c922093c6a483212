use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::error::Error;
use crate::server::AppState;
use crate::server::access::{ProjectRole, require_project_access};
use crate::server::dto::{
    CreateProjectRequest, DashboardResponse, InviteRequest, MessageView, ProjectDetailResponse,
};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt};
use crate::server::validation::validate_project_name;

/// Message backlog sizes served by the read path. Older history is not
/// paginated; the dashboard and project views are deliberately bounded.
const DASHBOARD_MESSAGE_LIMIT: i64 = 20;
const PROJECT_MESSAGE_LIMIT: i64 = 50;

pub async fn create_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let name = req.name.trim();
    validate_project_name(name)?;

    let project = state.store.create_project(name, auth.user.id, req.team)?;

    tracing::info!(
        "user {} created {} project '{}' ({})",
        auth.user.id,
        if project.is_team { "team" } else { "personal" },
        project.name,
        project.id
    );

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn join_project(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_project(id)?
        .or_not_found("Project not found")?;

    // Personal projects are never joinable; answer as if absent.
    if !project.is_team {
        return Err(ApiError::not_found("Project not found"));
    }

    state.store.add_member(project.id, auth.user.id)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn invite_member(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<InviteRequest>,
) -> impl IntoResponse {
    let project =
        require_project_access(state.store.as_ref(), auth.user.id, id, ProjectRole::Member)?;

    if !project.is_team {
        return Err(ApiError::not_found("Project not found"));
    }

    let invitee = state
        .store
        .get_user_by_username(req.username.trim())?
        .or_not_found("User not found")?;

    state.store.add_member(project.id, invitee.id)?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn dashboard(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let user_id = auth.user.id;

    let personal_projects = store.list_personal_projects(user_id)?;
    let team_projects = store.list_team_projects(user_id)?;
    let pending_tasks = store.list_pending_tasks(user_id)?;
    let recent_messages = store
        .list_recent_team_messages(user_id, DASHBOARD_MESSAGE_LIMIT)?
        .into_iter()
        .map(MessageView::from)
        .collect();
    let joinable_projects = store.list_joinable_projects(user_id)?;

    Ok::<_, ApiError>(Json(ApiResponse::success(DashboardResponse {
        personal_projects,
        team_projects,
        pending_tasks,
        recent_messages,
        joinable_projects,
    })))
}

pub async fn project_detail(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let project = require_project_access(store, auth.user.id, id, ProjectRole::Member)?;

    let tasks = store.list_project_tasks(project.id)?;
    let notes = store.list_project_notes(project.id)?;
    let messages = store
        .list_project_messages(project.id, PROJECT_MESSAGE_LIMIT)?
        .into_iter()
        .map(MessageView::from)
        .collect();

    let (members, invitable_users) = if project.is_team {
        (
            store.list_members(project.id)?,
            store.list_non_members(project.id)?,
        )
    } else {
        // The implicit member list of a personal project is just its owner.
        let owner = store.get_user(project.owner_id)?.ok_or(Error::NotFound)?;
        (vec![owner], Vec::new())
    };

    Ok::<_, ApiError>(Json(ApiResponse::success(ProjectDetailResponse {
        project,
        tasks,
        notes,
        members,
        messages,
        invitable_users,
    })))
}
