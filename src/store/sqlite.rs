use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::error!("Invalid date in database: '{}' - {}", s, e);
            None
        }
    }
}

fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
    })
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        owner_id: row.get(2)?,
        is_team: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        project_id: row.get(1)?,
        title: row.get(2)?,
        assigned_to: row.get(3)?,
        due_date: row.get::<_, Option<String>>(4)?.and_then(|s| parse_date(&s)),
        submitted: row.get(5)?,
        submitted_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_datetime(&s)),
        submitted_by: row.get(7)?,
    })
}

fn task_with_names_from_row(row: &Row<'_>) -> rusqlite::Result<TaskWithNames> {
    Ok(TaskWithNames {
        task: task_from_row(row)?,
        assignee_username: row.get(8)?,
        submitter_username: row.get(9)?,
    })
}

fn message_with_sender_from_row(row: &Row<'_>) -> rusqlite::Result<MessageWithSender> {
    Ok(MessageWithSender {
        message: Message {
            id: row.get(0)?,
            project_id: row.get(1)?,
            sender_id: row.get(2)?,
            text: row.get(3)?,
            timestamp: parse_datetime(&row.get::<_, String>(4)?),
        },
        username: row.get(5)?,
    })
}

const USER_COLUMNS: &str = "id, username, password_hash, created_at";
const PROJECT_COLUMNS: &str = "id, name, owner_id, is_team, created_at";
const TASK_COLUMNS: &str =
    "t.id, t.project_id, t.title, t.assigned_to, t.due_date, t.submitted, t.submitted_at, t.submitted_by";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn();
        let created_at = Utc::now();

        let result = conn.execute(
            "INSERT INTO users (username, password_hash, created_at) VALUES (?1, ?2, ?3)",
            params![username, password_hash, format_datetime(&created_at)],
        );
        match result {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(Error::UsernameTaken);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at,
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY username"))?;
        let rows = stmt.query_map([], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                session.expires_at.as_ref().map(format_datetime),
                session.last_used_at.as_ref().map(format_datetime),
            ],
        )?;
        Ok(())
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at
             FROM sessions WHERE token_lookup = ?1",
            params![lookup],
            |row| {
                Ok(Session {
                    id: row.get(0)?,
                    token_hash: row.get(1)?,
                    token_lookup: row.get(2)?,
                    user_id: row.get(3)?,
                    created_at: parse_datetime(&row.get::<_, String>(4)?),
                    expires_at: row
                        .get::<_, Option<String>>(5)?
                        .map(|s| parse_datetime(&s)),
                    last_used_at: row
                        .get::<_, Option<String>>(6)?
                        .map(|s| parse_datetime(&s)),
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn update_session_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE sessions SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, name: &str, owner_id: i64, is_team: bool) -> Result<Project> {
        let mut conn = self.conn();
        let created_at = Utc::now();

        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (name, owner_id, is_team, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![name, owner_id, is_team, format_datetime(&created_at)],
        )?;
        let id = tx.last_insert_rowid();

        // Team projects enroll every user existing at this instant. Users
        // registered later must join or be invited.
        if is_team {
            tx.execute(
                "INSERT OR IGNORE INTO memberships (project_id, user_id, created_at)
                 SELECT ?1, id, ?2 FROM users",
                params![id, format_datetime(&created_at)],
            )?;
        }
        tx.commit()?;

        Ok(Project {
            id,
            name: name.to_string(),
            owner_id,
            is_team,
            created_at,
        })
    }

    fn get_project(&self, id: i64) -> Result<Option<Project>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id],
            project_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_personal_projects(&self, owner_id: i64) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = ?1 AND is_team = 0 ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![owner_id], project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_team_projects(&self, user_id: i64) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT p.id, p.name, p.owner_id, p.is_team, p.created_at
             FROM projects p
             JOIN memberships m ON m.project_id = p.id AND m.user_id = ?1
             WHERE p.is_team = 1
             ORDER BY p.id",
        )?;
        let rows = stmt.query_map(params![user_id], project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_joinable_projects(&self, user_id: i64) -> Result<Vec<Project>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects
             WHERE is_team = 1
               AND NOT EXISTS (SELECT 1 FROM memberships m
                               WHERE m.project_id = projects.id AND m.user_id = ?1)
             ORDER BY id"
        ))?;
        let rows = stmt.query_map(params![user_id], project_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Membership operations

    fn add_member(&self, project_id: i64, user_id: i64) -> Result<()> {
        self.conn().execute(
            "INSERT OR IGNORE INTO memberships (project_id, user_id, created_at) VALUES (?1, ?2, ?3)",
            params![project_id, user_id, format_datetime(&Utc::now())],
        )?;
        Ok(())
    }

    fn is_member(&self, project_id: i64, user_id: i64) -> Result<bool> {
        let conn = self.conn();
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM memberships WHERE project_id = ?1 AND user_id = ?2)",
            params![project_id, user_id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn count_members(&self, project_id: i64) -> Result<i64> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM memberships WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn list_members(&self, project_id: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, u.password_hash, u.created_at
             FROM users u
             JOIN memberships m ON m.user_id = u.id
             WHERE m.project_id = ?1
             ORDER BY u.username",
        )?;
        let rows = stmt.query_map(params![project_id], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_non_members(&self, project_id: i64) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE NOT EXISTS (SELECT 1 FROM memberships m
                               WHERE m.project_id = ?1 AND m.user_id = users.id)
             ORDER BY username"
        ))?;
        let rows = stmt.query_map(params![project_id], user_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Task operations

    fn create_task(
        &self,
        project_id: i64,
        title: &str,
        assigned_to: i64,
        due_date: Option<NaiveDate>,
    ) -> Result<Task> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO tasks (project_id, title, assigned_to, due_date) VALUES (?1, ?2, ?3, ?4)",
            params![
                project_id,
                title,
                assigned_to,
                due_date.as_ref().map(format_date)
            ],
        )?;

        Ok(Task {
            id: conn.last_insert_rowid(),
            project_id,
            title: title.to_string(),
            assigned_to,
            due_date,
            submitted: false,
            submitted_at: None,
            submitted_by: None,
        })
    }

    fn get_task(&self, id: i64) -> Result<Option<Task>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = ?1"),
            params![id],
            task_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_project_tasks(&self, project_id: i64) -> Result<Vec<TaskWithNames>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS}, ua.username, us.username
             FROM tasks t
             LEFT JOIN users ua ON ua.id = t.assigned_to
             LEFT JOIN users us ON us.id = t.submitted_by
             WHERE t.project_id = ?1
             ORDER BY t.id"
        ))?;
        let rows = stmt.query_map(params![project_id], task_with_names_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_pending_tasks(&self, user_id: i64) -> Result<Vec<TaskWithNames>> {
        let conn = self.conn();
        // Tasks without a due date sort last; ISO dates compare correctly as text.
        let mut stmt = conn.prepare(&format!(
            "SELECT {TASK_COLUMNS}, ua.username, us.username
             FROM tasks t
             JOIN projects p ON p.id = t.project_id
             LEFT JOIN users ua ON ua.id = t.assigned_to
             LEFT JOIN users us ON us.id = t.submitted_by
             WHERE t.submitted = 0
               AND t.assigned_to = ?1
               AND (p.owner_id = ?1
                    OR EXISTS (SELECT 1 FROM memberships m
                               WHERE m.project_id = p.id AND m.user_id = ?1))
             ORDER BY t.due_date IS NULL, t.due_date, t.id"
        ))?;
        let rows = stmt.query_map(params![user_id], task_with_names_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn mark_task_submitted(&self, task_id: i64, user_id: i64, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE tasks SET submitted = 1, submitted_at = ?2, submitted_by = ?3
             WHERE id = ?1 AND submitted = 0",
            params![task_id, format_datetime(&at), user_id],
        )?;

        if rows == 0 {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)",
                params![task_id],
                |row| row.get(0),
            )?;
            if exists {
                return Err(Error::AlreadySubmitted);
            }
            return Err(Error::NotFound);
        }
        Ok(())
    }

    // Note operations

    fn create_note(&self, project_id: i64, user_id: i64, filename: &str) -> Result<Note> {
        let conn = self.conn();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO notes (project_id, user_id, filename, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![project_id, user_id, filename, format_datetime(&created_at)],
        )?;

        Ok(Note {
            id: conn.last_insert_rowid(),
            project_id,
            user_id,
            filename: filename.to_string(),
            created_at,
        })
    }

    fn list_project_notes(&self, project_id: i64) -> Result<Vec<Note>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, project_id, user_id, filename, created_at
             FROM notes WHERE project_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            Ok(Note {
                id: row.get(0)?,
                project_id: row.get(1)?,
                user_id: row.get(2)?,
                filename: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Message operations

    fn create_message(
        &self,
        project_id: i64,
        sender_id: i64,
        text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Message> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO messages (project_id, sender_id, text, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![project_id, sender_id, text, format_datetime(&timestamp)],
        )?;

        Ok(Message {
            id: conn.last_insert_rowid(),
            project_id,
            sender_id,
            text: text.to_string(),
            timestamp,
        })
    }

    fn list_project_messages(
        &self,
        project_id: i64,
        limit: i64,
    ) -> Result<Vec<MessageWithSender>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.project_id, m.sender_id, m.text, m.timestamp, u.username
             FROM messages m
             JOIN users u ON u.id = m.sender_id
             WHERE m.project_id = ?1
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![project_id, limit], message_with_sender_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn list_recent_team_messages(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<MessageWithSender>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT m.id, m.project_id, m.sender_id, m.text, m.timestamp, u.username
             FROM messages m
             JOIN users u ON u.id = m.sender_id
             JOIN projects p ON p.id = m.project_id
             WHERE p.is_team = 1
               AND EXISTS (SELECT 1 FROM memberships mm
                           WHERE mm.project_id = p.id AND mm.user_id = ?1)
             ORDER BY m.timestamp DESC, m.id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit], message_with_sender_from_row)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn open_store(temp: &TempDir) -> SqliteStore {
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        store
    }

    #[test]
    fn test_initialize_creates_tables() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let conn = store.conn();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();

        assert!(tables.contains(&"users".to_string()));
        assert!(tables.contains(&"projects".to_string()));
        assert!(tables.contains(&"memberships".to_string()));
        assert!(tables.contains(&"tasks".to_string()));
        assert!(tables.contains(&"notes".to_string()));
        assert!(tables.contains(&"messages".to_string()));
        assert!(tables.contains(&"sessions".to_string()));
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        store.create_user("alice", "hash-a").unwrap();
        let result = store.create_user("alice", "hash-b");
        assert!(matches!(result, Err(Error::UsernameTaken)));
    }

    #[test]
    fn test_team_creation_seeds_existing_users_only() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let carol = store.create_user("carol", "h").unwrap();

        let project = store.create_project("Launch", alice.id, true).unwrap();
        assert!(store.is_member(project.id, alice.id).unwrap());
        assert!(store.is_member(project.id, carol.id).unwrap());
        assert_eq!(store.count_members(project.id).unwrap(), 2);

        // Registered after creation: not enrolled retroactively.
        let bob = store.create_user("bob", "h").unwrap();
        assert!(!store.is_member(project.id, bob.id).unwrap());
        assert_eq!(store.count_members(project.id).unwrap(), 2);
    }

    #[test]
    fn test_personal_project_has_no_membership_rows() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let project = store.create_project("Diary", alice.id, false).unwrap();

        assert_eq!(store.count_members(project.id).unwrap(), 0);
        assert!(!store.is_member(project.id, alice.id).unwrap());
    }

    #[test]
    fn test_add_member_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let project = store.create_project("Launch", alice.id, true).unwrap();
        let bob = store.create_user("bob", "h").unwrap();

        store.add_member(project.id, bob.id).unwrap();
        store.add_member(project.id, bob.id).unwrap();
        assert_eq!(store.count_members(project.id).unwrap(), 2);
    }

    #[test]
    fn test_joinable_projects_exclude_memberships_and_personal() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();
        store.create_project("Diary", alice.id, false).unwrap();

        let bob = store.create_user("bob", "h").unwrap();
        let joinable = store.list_joinable_projects(bob.id).unwrap();
        assert_eq!(joinable.len(), 1);
        assert_eq!(joinable[0].id, team.id);

        store.add_member(team.id, bob.id).unwrap();
        assert!(store.list_joinable_projects(bob.id).unwrap().is_empty());
    }

    #[test]
    fn test_pending_tasks_order_and_filtering() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();

        let d = |s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let late = store
            .create_task(team.id, "late", alice.id, Some(d("2025-02-01")))
            .unwrap();
        let none = store.create_task(team.id, "no due", alice.id, None).unwrap();
        let early = store
            .create_task(team.id, "early", alice.id, Some(d("2025-01-10")))
            .unwrap();
        let done = store
            .create_task(team.id, "done", alice.id, Some(d("2025-01-01")))
            .unwrap();
        store
            .mark_task_submitted(done.id, alice.id, Utc::now())
            .unwrap();

        let pending = store.list_pending_tasks(alice.id).unwrap();
        let ids: Vec<i64> = pending.iter().map(|t| t.task.id).collect();
        // Due dates ascending, no due date last, submitted excluded.
        assert_eq!(ids, vec![early.id, late.id, none.id]);
    }

    #[test]
    fn test_pending_tasks_exclude_foreign_projects() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();

        // Bob registers after creation and is not a member, but a task is
        // assigned to him anyway. It must not appear in his pending view.
        let bob = store.create_user("bob", "h").unwrap();
        store.create_task(team.id, "stray", bob.id, None).unwrap();

        assert!(store.list_pending_tasks(bob.id).unwrap().is_empty());

        store.add_member(team.id, bob.id).unwrap();
        assert_eq!(store.list_pending_tasks(bob.id).unwrap().len(), 1);
    }

    #[test]
    fn test_submit_task_is_terminal() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();
        let task = store.create_task(team.id, "Write doc", alice.id, None).unwrap();

        let first_at = Utc::now();
        store.mark_task_submitted(task.id, alice.id, first_at).unwrap();

        let again = store.mark_task_submitted(task.id, alice.id, first_at + Duration::hours(1));
        assert!(matches!(again, Err(Error::AlreadySubmitted)));

        let stored = store.get_task(task.id).unwrap().unwrap();
        assert!(stored.submitted);
        assert_eq!(stored.submitted_by, Some(alice.id));
        assert_eq!(
            stored.submitted_at.map(|t| t.timestamp()),
            Some(first_at.timestamp())
        );
    }

    #[test]
    fn test_submit_missing_task() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let result = store.mark_task_submitted(999, alice.id, Utc::now());
        assert!(matches!(result, Err(Error::NotFound)));
    }

    #[test]
    fn test_project_messages_newest_first_with_limit() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();

        let base = Utc::now();
        for i in 0..5 {
            store
                .create_message(team.id, alice.id, &format!("msg {i}"), base + Duration::minutes(i))
                .unwrap();
        }

        let messages = store.list_project_messages(team.id, 3).unwrap();
        let texts: Vec<&str> = messages.iter().map(|m| m.message.text.as_str()).collect();
        assert_eq!(texts, vec!["msg 4", "msg 3", "msg 2"]);
        assert_eq!(messages[0].username, "alice");
    }

    #[test]
    fn test_recent_team_messages_scoped_to_memberships() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let team = store.create_project("Launch", alice.id, true).unwrap();
        let diary = store.create_project("Diary", alice.id, false).unwrap();

        let now = Utc::now();
        store.create_message(team.id, alice.id, "team talk", now).unwrap();
        store.create_message(diary.id, alice.id, "to self", now).unwrap();

        let recent = store.list_recent_team_messages(alice.id, 20).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].message.text, "team talk");

        // Bob joined nothing yet, so he sees nothing.
        let bob = store.create_user("bob", "h").unwrap();
        assert!(store.list_recent_team_messages(bob.id, 20).unwrap().is_empty());
    }

    #[test]
    fn test_session_roundtrip_and_delete() {
        let temp = TempDir::new().unwrap();
        let store = open_store(&temp);

        let alice = store.create_user("alice", "h").unwrap();
        let session = Session {
            id: "session-1".to_string(),
            token_hash: "hash".to_string(),
            token_lookup: "lookup01".to_string(),
            user_id: alice.id,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        };
        store.create_session(&session).unwrap();

        let fetched = store.get_session_by_lookup("lookup01").unwrap().unwrap();
        assert_eq!(fetched.user_id, alice.id);

        store.update_session_last_used("session-1").unwrap();
        let touched = store.get_session_by_lookup("lookup01").unwrap().unwrap();
        assert!(touched.last_used_at.is_some());

        assert!(store.delete_session("session-1").unwrap());
        assert!(store.get_session_by_lookup("lookup01").unwrap().is_none());
    }
}
