mod backend;
mod client;
mod error;
mod request;
pub mod types;

pub use backend::Backend;
pub use client::HttpBackend;
pub use error::{ApiError, Result};
pub use request::{Dataset, StartSession};

/// The base url used when none is configured, the backend's development address.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
