use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{get, post},
};

use super::{accounts, events, messages, notes, projects, tasks};
use crate::hub::Hub;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub hub: Arc<Hub>,
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/register", post(accounts::register))
        .route("/api/v1/login", post(accounts::login))
        .route("/api/v1/logout", post(accounts::logout))
        .route("/api/v1/dashboard", get(projects::dashboard))
        .route("/api/v1/projects", post(projects::create_project))
        .route("/api/v1/projects/{id}", get(projects::project_detail))
        .route("/api/v1/projects/{id}/join", post(projects::join_project))
        .route("/api/v1/projects/{id}/invite", post(projects::invite_member))
        .route("/api/v1/projects/{id}/notes", post(notes::upload_note))
        .route("/api/v1/projects/{id}/tasks", post(tasks::create_task))
        .route(
            "/api/v1/projects/{id}/messages",
            post(messages::post_message),
        )
        .route("/api/v1/tasks/pending", get(tasks::pending_tasks))
        .route("/api/v1/tasks/{id}/submit", post(tasks::submit_task))
        .route("/api/v1/events", get(events::events))
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
