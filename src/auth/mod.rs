mod helpers;
mod middleware;
mod password;
mod session;

pub use helpers::{SessionValidationError, ValidatedSession, extract_bearer_token, validate_session};
pub use middleware::{AuthError, RequireUser};
pub use password::CredentialHasher;
pub use session::{SESSION_TTL_DAYS, generate_token, parse_token};
