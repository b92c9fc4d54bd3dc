use std::sync::Arc;

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension,
};

use crate::types::IssuerConfig;

const ALLOW_HEADERS: &str = "Content-Type,Authorization";
const ALLOW_METHODS: &str = "POST,OPTIONS";

/// CORS middleware
///
/// Reflects the request `Origin` when it is allow-listed, otherwise answers
/// with the first configured origin. Preflight (`OPTIONS`) requests are
/// answered here with 200 and an empty body.
pub async fn cors_middleware(
    Extension(config): Extension<Arc<IssuerConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let request_origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    let allow_origin = config.cors_origin(request_origin.as_deref());

    let mut response = if request.method() == Method::OPTIONS {
        let mut preflight = Response::new(Body::empty());
        *preflight.status_mut() = StatusCode::OK;
        preflight
    } else {
        next.run(request).await
    };

    apply_cors_headers(response.headers_mut(), &allow_origin);
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, allow_origin: &str) {
    let origin = HeaderValue::from_str(allow_origin).unwrap_or_else(|_| {
        tracing::warn!("Configured origin is not a valid header value: {allow_origin}");
        HeaderValue::from_static("*")
    });

    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOW_HEADERS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOW_METHODS),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}
