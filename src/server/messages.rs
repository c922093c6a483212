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
use crate::server::dto::{MessageView, PostMessageRequest};
use crate::server::response::{ApiError, ApiResponse};
use crate::server::validation::validate_message_text;
use crate::types::{MessageWithSender, color_class};

pub async fn post_message(
    auth: RequireUser,
    State(state): State<Arc<AppState>>,
    Path(project_id): Path<i64>,
    Json(req): Json<PostMessageRequest>,
) -> impl IntoResponse {
    let store = state.store.as_ref();
    let project = require_project_access(store, auth.user.id, project_id, ProjectRole::Member)?;

    let text = req.text.trim();
    validate_message_text(text)?;

    // Durability before delivery: persist the row, then fan out.
    let message = store.create_message(project.id, auth.user.id, text, Utc::now())?;

    state.hub.publish(&Event::NewMessage {
        sender_id: auth.user.id,
        username: auth.user.username.clone(),
        color_class: color_class(auth.user.id),
        text: message.text.clone(),
        timestamp: message.timestamp.format("%H:%M").to_string(),
    });

    let view = MessageView::from(MessageWithSender {
        message,
        username: auth.user.username,
    });

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(view))))
}
