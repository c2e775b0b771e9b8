//! Job definitions for the external scheduler: form validation and a typed client.
//!
//! Nothing here schedules or runs jobs.

mod client;
mod form;

pub use client::JobsClient;
pub use form::{FieldErrors, JobForm};
