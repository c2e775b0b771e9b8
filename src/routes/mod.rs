pub mod api_keys;
pub mod auth;
pub mod health;
pub mod jobs;
pub mod organizations;
pub mod proxy;
pub mod rbac;
pub mod users;
