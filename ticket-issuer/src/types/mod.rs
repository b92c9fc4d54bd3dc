mod config;
mod environment;
mod error;
mod extractors;

pub use config::{IssuerConfig, DEFAULT_ALLOWED_ORIGINS, DEFAULT_MAX_FILE_BYTES, DEFAULT_REGION};
pub use environment::Environment;
pub use error::AppError;
pub use extractors::{BearerToken, UploadRequestJson};
