mod docs;
pub mod health;
pub mod upload_tickets;

use aide::axum::{
    routing::{get, post},
    ApiRouter,
};
use axum::middleware;

use crate::middleware::cors_middleware;

/// Creates the router with all handler routes
///
/// The ticket endpoint is also mounted at `/` for single-route
/// (serverless-style) deployments. Every route goes through the CORS
/// middleware, which needs `Extension<Arc<IssuerConfig>>` layered on top.
pub fn handler() -> ApiRouter {
    ApiRouter::new()
        .merge(docs::handler())
        .api_route("/health", get(health::handler))
        .api_route("/v1/upload-tickets", post(upload_tickets::create_upload_ticket))
        .api_route("/", post(upload_tickets::create_upload_ticket))
        .layer(middleware::from_fn(cors_middleware))
}
