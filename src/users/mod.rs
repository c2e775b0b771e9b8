//! User-list operations layered on the admin facade: filtering, bulk actions, export.

pub mod bulk;
pub mod export;
pub mod filter;

pub use bulk::{run_bulk, BulkAction, BulkFailure, BulkOutcome, BulkRequest, BulkTarget};
pub use export::{export_users, ExportFormat};
pub use filter::{UserFilter, UserStatus};
