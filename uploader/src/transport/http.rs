use async_trait::async_trait;
use common_types::{truncate_chars, ConfirmRequest, ErrorResponse, UploadRequest, UploadTicket};
use reqwest::{multipart, Body, Client, RequestBuilder, Response};

use super::UploadTransport;
use crate::config::UploaderConfig;
use crate::error::UploadError;
use crate::file::{FileBody, SelectedFile};

/// Longest error body kept from a failed response
const MAX_ERROR_BODY_CHARS: usize = 512;

/// `UploadTransport` over HTTP
///
/// Every request carries the client-wide timeout. The upload token, when
/// present on a request, is sent as `Authorization: Bearer`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    create_endpoint: String,
    confirm_endpoint: Option<String>,
}

impl HttpTransport {
    /// Creates a transport for the configured endpoints
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &UploaderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            create_endpoint: config.create_endpoint.clone(),
            confirm_endpoint: config.confirm_endpoint.clone(),
        })
    }

    fn with_bearer(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn request_ticket(&self, request: &UploadRequest) -> Result<UploadTicket, UploadError> {
        let builder = self.client.post(&self.create_endpoint).json(request);
        let response = Self::with_bearer(builder, request.upload_token.as_deref())
            .send()
            .await
            .map_err(|e| UploadError::TicketRequest(describe_send_error("upload endpoint", &e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_message(response).await;
            return Err(UploadError::TicketRequest(format!(
                "Upload endpoint returned {}: {message}",
                status.as_u16()
            )));
        }

        response.json::<UploadTicket>().await.map_err(|e| {
            UploadError::TicketRequest(format!("Upload endpoint returned an invalid ticket: {e}"))
        })
    }

    async fn write_object(
        &self,
        ticket: &UploadTicket,
        file: &SelectedFile,
        content_type: &str,
    ) -> Result<(), UploadError> {
        let part = file_part(file).await.map_err(|e| {
            UploadError::Validation(format!("Could not read {}: {e}", file.name))
        })?;

        // Policy fields first, the file part must come last
        let mut form = multipart::Form::new();
        for (name, value) in &ticket.fields {
            form = form.text(name.clone(), value.clone());
        }
        let part = part
            .file_name(file.name.clone())
            .mime_str(content_type)
            .map_err(|e| UploadError::Validation(format!("Invalid content type: {e}")))?;
        form = form.part("file", part);

        let response = self
            .client
            .post(&ticket.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::StorageWrite {
                status: None,
                body: describe_send_error("storage", &e),
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(key = %ticket.key, "Stored object");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(UploadError::StorageWrite {
            status: Some(status.as_u16()),
            body: truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS),
        })
    }

    async fn confirm(&self, request: &ConfirmRequest) -> Result<(), UploadError> {
        let Some(endpoint) = &self.confirm_endpoint else {
            return Ok(());
        };

        let builder = self.client.post(endpoint).json(request);
        let response = Self::with_bearer(builder, request.upload_token.as_deref())
            .send()
            .await
            .map_err(|e| {
                UploadError::Confirmation(describe_send_error("confirmation endpoint", &e))
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let message = error_message(response).await;
        Err(UploadError::Confirmation(format!(
            "Confirmation endpoint returned {}: {message}",
            status.as_u16()
        )))
    }

    fn has_confirm_endpoint(&self) -> bool {
        self.confirm_endpoint.is_some()
    }
}

/// File part of the storage form; path-backed files are streamed from disk
async fn file_part(file: &SelectedFile) -> std::io::Result<multipart::Part> {
    match &file.body {
        FileBody::Memory(bytes) => Ok(multipart::Part::bytes(bytes.clone())),
        FileBody::Path(path) => {
            let handle = tokio::fs::File::open(path).await?;
            let length = handle.metadata().await?.len();
            Ok(multipart::Part::stream_with_length(Body::from(handle), length))
        }
    }
}

fn describe_send_error(target: &str, error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("Timed out waiting for the {target}.")
    } else {
        format!("Could not reach the {target}: {error}")
    }
}

/// Extracts `{error}` from a JSON error body, falling back to the raw text
async fn error_message(response: Response) -> String {
    let text = response.text().await.unwrap_or_default();

    serde_json::from_str::<ErrorResponse>(&text).map_or_else(
        |_| truncate_chars(text.trim(), MAX_ERROR_BODY_CHARS),
        |body| body.error,
    )
}
