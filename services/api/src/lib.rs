//! HTTP API of the YouTube playlist notes backend
//!
//! Users sign in with a password or Google, import YouTube playlists, tick
//! off watched videos and keep rich-text notes per video.

pub mod completion;
pub mod config;
pub mod error;
pub mod importer;
pub mod middleware;
pub mod models;
pub mod notes;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod youtube;

pub use config::AppConfig;
pub use routes::create_router;
pub use state::{AppState, Backends};
