//! Photobook ticket issuer
//!
//! Stateless HTTP service that validates upload requests and returns
//! short-lived presigned POST credentials for direct-to-S3 uploads.

#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

/// Ticket issuing: validation, object keys, filename normalization
pub mod issuer;

/// S3 presigned POST signing
pub mod media_storage;

/// HTTP middleware
pub mod middleware;

/// API routes
pub mod routes;

/// Server bootstrap
pub mod server;

/// Configuration, errors and extractors
pub mod types;

/// Test doubles for the clock and signer
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
