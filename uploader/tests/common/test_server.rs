use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use common_types::ConfirmRequest;
use sha2::{Digest, Sha256};
use ticket_issuer::{
    issuer::TicketIssuer,
    server,
    testing::{FixedClock, StubPostPolicySigner},
    types::{Environment, IssuerConfig},
};
use tokio::net::TcpListener;

use super::{setup_test_env, NOW_MILLIS};

/// Multipart upload as received by the storage stand-in
#[derive(Debug, Clone, Default)]
pub struct StoredUpload {
    /// Part names in the order they arrived
    pub part_names: Vec<String>,
    pub fields: HashMap<String, String>,
    pub file_name: Option<String>,
    pub file_content_type: Option<String>,
    pub file_bytes: usize,
    pub file_sha256: String,
}

#[derive(Debug, Default)]
pub struct StorageState {
    pub fail_writes: AtomicBool,
    pub fail_confirms: AtomicBool,
    pub uploads: Mutex<Vec<StoredUpload>>,
    pub confirms: Mutex<Vec<ConfirmRequest>>,
}

/// Issuer, storage and confirmation endpoints on one local port
pub struct TestServer {
    pub base_url: String,
    pub signer: Arc<StubPostPolicySigner>,
    pub storage: Arc<StorageState>,
}

impl TestServer {
    /// Starts a server whose tickets point at `storage_path`
    pub async fn start(vars: &[(&str, &str)], storage_path: &str) -> Self {
        setup_test_env();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let mut all_vars: HashMap<String, String> = HashMap::from([(
            "BUCKET_NAME".to_string(),
            "photobook-uploads".to_string(),
        )]);
        for (name, value) in vars {
            all_vars.insert((*name).to_string(), (*value).to_string());
        }
        let config = IssuerConfig::from_lookup(|name| all_vars.get(name).cloned());

        let signer = Arc::new(StubPostPolicySigner::with_upload_url(format!(
            "{base_url}{storage_path}"
        )));
        let issuer = Arc::new(TicketIssuer::new(
            Arc::new(config),
            signer.clone(),
            Arc::new(FixedClock::from_millis(NOW_MILLIS)),
        ));

        let storage = Arc::new(StorageState::default());
        let app = server::build_router(Environment::Development, issuer)
            .merge(storage_router(storage.clone()));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            signer,
            storage,
        }
    }

    pub fn create_endpoint(&self) -> String {
        format!("{}/v1/upload-tickets", self.base_url)
    }

    pub fn confirm_endpoint(&self) -> String {
        format!("{}/confirm", self.base_url)
    }

    pub fn uploads(&self) -> Vec<StoredUpload> {
        self.storage.uploads.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> Vec<ConfirmRequest> {
        self.storage.confirms.lock().unwrap().clone()
    }
}

fn storage_router(storage: Arc<StorageState>) -> Router {
    Router::new()
        .route("/storage", post(store_object))
        .route("/slow-storage", post(store_object_slowly))
        .route("/confirm", post(confirm_upload))
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
        .with_state(storage)
}

async fn store_object(State(storage): State<Arc<StorageState>>, mut multipart: Multipart) -> Response {
    let mut upload = StoredUpload::default();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        upload.part_names.push(name.clone());

        if name == "file" {
            upload.file_name = field.file_name().map(ToString::to_string);
            upload.file_content_type = field.content_type().map(ToString::to_string);
            let bytes = field.bytes().await.unwrap();
            upload.file_bytes = bytes.len();
            upload.file_sha256 = hex::encode(Sha256::digest(&bytes));
        } else {
            let value = field.text().await.unwrap();
            upload.fields.insert(name, value);
        }
    }

    if storage.fail_writes.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            "<Error><Code>InternalError</Code></Error>",
        )
            .into_response();
    }

    storage.uploads.lock().unwrap().push(upload);
    StatusCode::NO_CONTENT.into_response()
}

async fn store_object_slowly(
    State(storage): State<Arc<StorageState>>,
    multipart: Multipart,
) -> Response {
    tokio::time::sleep(Duration::from_secs(5)).await;
    store_object(State(storage), multipart).await
}

async fn confirm_upload(
    State(storage): State<Arc<StorageState>>,
    Json(request): Json<ConfirmRequest>,
) -> Response {
    if storage.fail_confirms.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "Confirmation store unavailable" })),
        )
            .into_response();
    }

    storage.confirms.lock().unwrap().push(request);
    StatusCode::OK.into_response()
}
