pub mod api_key;
pub mod job;
pub mod organization;
pub mod page;
pub mod rbac;
pub mod session;
pub mod user;
