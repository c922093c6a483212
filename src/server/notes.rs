use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireUser;
use crate::server::AppState;
use crate::server::access::{ProjectRole, require_project_access};
use crate::server::dto::CreateNoteRequest;
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_filename;

/// Records a file attachment. The blob itself is stored by an external
/// collaborator; only the reference lands here.
pub async fn upload_note(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    Json(req): Json<CreateNoteRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let project = require_project_access(store, auth.user.id, project_id, ProjectRole::Member)?;

    let filename = req.filename.trim();
    validate_filename(filename)?;

    let note = store.create_note(project.id, auth.user.id, filename)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(note))))
}
