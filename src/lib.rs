//! # Collabd
//!
//! A collaboration server, usable both as a standalone binary and as a library.
//!
//! Users register, create personal or team projects, track tasks with due
//! dates and submission state, attach file notes, and exchange project chat.
//! Chat messages and task submissions are fanned out in real time to every
//! connected WebSocket subscriber through the [`hub::Hub`].
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! collabd = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use collabd::hub::Hub;
//! use collabd::server::{AppState, create_router};
//! use collabd::store::SqliteStore;
//!
//! let store = SqliteStore::new("./data/collabd.db").unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState {
//!     store: Arc::new(store),
//!     hub: Arc::new(Hub::new()),
//! });
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI entry point. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod hub;
pub mod server;
pub mod store;
pub mod types;
