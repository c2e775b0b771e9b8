pub mod app;
pub mod auth;
pub mod authz;
pub mod config;
pub mod db;
pub mod docs;
pub mod errors;
pub mod events;
pub mod jobs;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod users;

// Re-export commonly used items for tests
pub use app::{create_app, AppState};
