//! Facades over the external auth service.
//!
//! Each service method checks the caller's grant, forwards the caller's
//! headers, and runs the backend call inside [`instrument`].

mod admin;
mod api_key;
pub mod backend;
mod email_password;
mod extract;
mod headers;
mod http;
pub mod instrument;
mod organization;
mod session;

pub use admin::AdminService;
pub use api_key::ApiKeyService;
pub use backend::{
    AdminBackend, ApiKeyBackend, AuthBackend, EmailPasswordBackend, OrganizationBackend, SessionBackend,
};
pub use email_password::EmailPasswordService;
pub use extract::{AuthContext, API_KEY_HEADER};
pub use headers::RequestHeaders;
pub use http::HttpAuthBackend;
pub use instrument::{instrument, redact};
pub use organization::OrganizationService;
pub use session::SessionService;
