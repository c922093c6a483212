pub mod access;
mod accounts;
pub mod dto;
mod events;
mod messages;
mod notes;
mod projects;
pub mod response;
mod router;
mod tasks;
pub mod validation;

pub use router::{AppState, create_router};
