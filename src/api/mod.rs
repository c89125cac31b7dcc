pub mod client;
pub mod config;
pub mod errors;

pub use client::{build_url, ApiClient, RequestOptions, ResponseBody, NO_BODY};
pub use config::{ApiConfig, AppKind, API_URL_ENV, DEFAULT_TIMEOUT};
pub use errors::{ApiError, ErrorCode};
