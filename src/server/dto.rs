use serde::{Deserialize, Serialize};

use crate::types::{MessageWithSender, Note, Project, TaskWithNames, User, color_class};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub team: bool,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: String,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub filename: String,
}

#[derive(Debug, Deserialize)]
pub struct PostMessageRequest {
    pub text: String,
}

/// Chat message shaped for rendering. Deliberately identical in field names
/// and formats to the live `new_message` broadcast, so a page-load render
/// and a live append look the same.
#[derive(Debug, Serialize)]
pub struct MessageView {
    pub id: i64,
    pub project_id: i64,
    pub sender_id: i64,
    pub username: String,
    pub color_class: &'static str,
    pub text: String,
    /// Formatted as %H:%M.
    pub timestamp: String,
}

impl From<MessageWithSender> for MessageView {
    fn from(m: MessageWithSender) -> Self {
        Self {
            id: m.message.id,
            project_id: m.message.project_id,
            sender_id: m.message.sender_id,
            username: m.username,
            color_class: color_class(m.message.sender_id),
            text: m.message.text,
            timestamp: m.message.timestamp.format("%H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub personal_projects: Vec<Project>,
    pub team_projects: Vec<Project>,
    pub pending_tasks: Vec<TaskWithNames>,
    pub recent_messages: Vec<MessageView>,
    pub joinable_projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct ProjectDetailResponse {
    pub project: Project,
    pub tasks: Vec<TaskWithNames>,
    pub notes: Vec<Note>,
    pub members: Vec<User>,
    pub messages: Vec<MessageView>,
    pub invitable_users: Vec<User>,
}
