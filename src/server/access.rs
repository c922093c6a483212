use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Project;

/// Role a project operation requires of the acting user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectRole {
    Member,
    Owner,
}

/// Tri-state access decision. The boundary collapses `Forbidden` and
/// `NotFound` into the same denial response; the distinction exists so the
/// core never lies about what it found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectAccess {
    Allowed,
    Forbidden,
    NotFound,
}

/// The one access rule every endpoint shares.
///
/// Personal projects admit only their owner. Team projects admit members,
/// and the owner always passes membership checks.
#[must_use]
pub fn evaluate(
    project: Option<&Project>,
    is_member: bool,
    user_id: i64,
    role: ProjectRole,
) -> ProjectAccess {
    let Some(project) = project else {
        return ProjectAccess::NotFound;
    };

    let allowed = match role {
        ProjectRole::Owner => project.owner_id == user_id,
        ProjectRole::Member => {
            if project.is_team {
                project.owner_id == user_id || is_member
            } else {
                project.owner_id == user_id
            }
        }
    };

    if allowed {
        ProjectAccess::Allowed
    } else {
        ProjectAccess::Forbidden
    }
}

/// Loads the project and enforces `role` for the acting user.
pub fn require_project_access(
    store: &dyn Store,
    user_id: i64,
    project_id: i64,
    role: ProjectRole,
) -> Result<Project> {
    let Some(project) = store.get_project(project_id)? else {
        return Err(Error::NotFound);
    };

    let is_member = if project.is_team {
        store.is_member(project.id, user_id)?
    } else {
        false
    };

    match evaluate(Some(&project), is_member, user_id, role) {
        ProjectAccess::Allowed => Ok(project),
        ProjectAccess::Forbidden => Err(Error::Forbidden),
        ProjectAccess::NotFound => Err(Error::NotFound),
    }
}
