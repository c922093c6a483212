use chrono::NaiveDate;

use crate::error::{Error, Result};

const MAX_USERNAME_LEN: usize = 80;
const MAX_PASSWORD_LEN: usize = 120;
const MAX_PROJECT_NAME_LEN: usize = 100;
const MAX_TASK_TITLE_LEN: usize = 200;
const MAX_FILENAME_LEN: usize = 200;

fn validate_text(value: &str, entity: &str, max_len: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{entity} cannot be empty")));
    }
    if value.len() > max_len {
        return Err(Error::Validation(format!(
            "{entity} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

pub fn validate_username(name: &str) -> Result<()> {
    validate_text(name, "Username", MAX_USERNAME_LEN)?;
    if name.contains(char::is_whitespace) {
        return Err(Error::Validation(
            "Username cannot contain whitespace".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    validate_text(password, "Password", MAX_PASSWORD_LEN)
}

pub fn validate_project_name(name: &str) -> Result<()> {
    validate_text(name, "Project name", MAX_PROJECT_NAME_LEN)
}

pub fn validate_task_title(title: &str) -> Result<()> {
    validate_text(title, "Task title", MAX_TASK_TITLE_LEN)
}

pub fn validate_filename(filename: &str) -> Result<()> {
    validate_text(filename, "Filename", MAX_FILENAME_LEN)
}

pub fn validate_message_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::Validation("Message cannot be empty".to_string()));
    }
    Ok(())
}

/// Parses an optional due date. An absent or empty value means no deadline
/// (HTML date inputs post an empty string); anything else must be a valid
/// YYYY-MM-DD calendar date.
pub fn parse_due_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                Error::Validation("Due date must be formatted as YYYY-MM-DD".to_string())
            }),
    }
}
