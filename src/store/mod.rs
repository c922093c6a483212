mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every write is atomic with respect to its own rows; multi-row writes
/// (team-project membership seeding) run inside a single transaction so a
/// crash never leaves the store half-written.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn update_session_last_used(&self, id: &str) -> Result<()>;

    // Project operations. Creating a team project seeds a membership row for
    // every user existing at that instant, in the same transaction.
    fn create_project(&self, name: &str, owner_id: i64, is_team: bool) -> Result<Project>;
    fn get_project(&self, id: i64) -> Result<Option<Project>>;
    fn list_personal_projects(&self, owner_id: i64) -> Result<Vec<Project>>;
    fn list_team_projects(&self, user_id: i64) -> Result<Vec<Project>>;
    fn list_joinable_projects(&self, user_id: i64) -> Result<Vec<Project>>;

    // Membership operations (idempotent)
    fn add_member(&self, project_id: i64, user_id: i64) -> Result<()>;
    fn is_member(&self, project_id: i64, user_id: i64) -> Result<bool>;
    fn count_members(&self, project_id: i64) -> Result<i64>;
    fn list_members(&self, project_id: i64) -> Result<Vec<User>>;
    fn list_non_members(&self, project_id: i64) -> Result<Vec<User>>;

    // Task operations
    fn create_task(
        &self,
        project_id: i64,
        title: &str,
        assigned_to: i64,
        due_date: Option<NaiveDate>,
    ) -> Result<Task>;
    fn get_task(&self, id: i64) -> Result<Option<Task>>;
    fn list_project_tasks(&self, project_id: i64) -> Result<Vec<TaskWithNames>>;
    /// Non-submitted tasks assigned to `user_id` across every project the
    /// user owns or is a member of, ordered by due date ascending, nulls last.
    fn list_pending_tasks(&self, user_id: i64) -> Result<Vec<TaskWithNames>>;
    /// Marks a task submitted. Fails with `NotFound` if the task is absent
    /// and `AlreadySubmitted` if it already reached its terminal state, in
    /// which case `submitted_at`/`submitted_by` are left untouched.
    fn mark_task_submitted(&self, task_id: i64, user_id: i64, at: DateTime<Utc>) -> Result<()>;

    // Note operations
    fn create_note(&self, project_id: i64, user_id: i64, filename: &str) -> Result<Note>;
    fn list_project_notes(&self, project_id: i64) -> Result<Vec<Note>>;

    // Message operations
    fn create_message(
        &self,
        project_id: i64,
        sender_id: i64,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Message>;
    /// Latest messages for one project, newest first.
    fn list_project_messages(&self, project_id: i64, limit: i64) -> Result<Vec<MessageWithSender>>;
    /// Latest messages across every team project the user is a member of,
    /// newest first.
    fn list_recent_team_messages(&self, user_id: i64, limit: i64)
    -> Result<Vec<MessageWithSender>>;
}
