pub mod backend;
pub mod client;
pub mod envelope;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod urls;

pub use backend::{AdminBackend, Download, ProgressFn, UploadFile};
pub use client::AdminApi;
pub use error::ApiError;
