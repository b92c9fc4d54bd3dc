use std::sync::Arc;

use axum::{Extension, Json};
use common_types::UploadTicket;
use tracing::instrument;

use crate::{
    issuer::TicketIssuer,
    types::{AppError, BearerToken, UploadRequestJson},
};

/// Issues presigned POST credentials for a single upload
///
/// Workflow:
/// 1. Parses the JSON body (empty body is read as `{}`)
/// 2. Checks the month against the allow-list
/// 3. Checks the bearer token when a shared secret is configured
/// 4. Derives the object key and signs a POST policy scoped to it
///
/// # Returns
///
/// Returns `Ok(Json<UploadTicket>)` containing:
/// - `uploadUrl`: form POST target
/// - `fields`: form fields to send before the file part
/// - `fileUrl`: public URL of the object once uploaded
/// - `key`: object key chosen by the issuer
/// - `metadata`: notes, photographer and month echoed back
///
/// # Errors
///
/// - 400 `InvalidPayload` / `InvalidMonth`
/// - 401 `Unauthorized`
/// - 500 `ConfigurationError` / `IssuerInternalError`
#[instrument(skip_all)]
pub async fn create_upload_ticket(
    Extension(issuer): Extension<Arc<TicketIssuer>>,
    BearerToken(token): BearerToken,
    UploadRequestJson(payload): UploadRequestJson,
) -> Result<Json<UploadTicket>, AppError> {
    let ticket = issuer.issue(payload, token.as_deref()).await?;

    Ok(Json(ticket))
}
