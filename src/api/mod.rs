//! Backend HTTP access
//!
//! One shared client plus the normalization layer every call passes through.

pub mod client;
pub mod error;
pub mod response;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorKind, ApiResult};
pub use response::{normalize_error, normalize_success, NormalizedResult, TransportError};
