use std::collections::HashMap;
use std::sync::Arc;

use axum::{body::Body, http::Request, response::Response, Router};
use ticket_issuer::{
    issuer::TicketIssuer,
    server,
    testing::{FixedClock, StubPostPolicySigner},
    types::{Environment, IssuerConfig},
};
use tower::ServiceExt;

/// Fixed instant every test issues tickets at
pub const NOW_MILLIS: i64 = 1_741_944_413_000;

/// Setup test environment
pub fn setup_test_env() {
    // Initialize tracing for tests
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .try_init()
        .ok();
}

/// Base test setup with a stubbed signer and a frozen clock
pub struct TestSetup {
    pub router: Router,
    pub config: Arc<IssuerConfig>,
    pub signer: Arc<StubPostPolicySigner>,
    pub clock: Arc<FixedClock>,
}

impl TestSetup {
    /// Setup with a configured bucket and the given extra variables
    pub fn new(vars: &[(&str, &str)]) -> Self {
        let mut all_vars = vec![
            ("BUCKET_NAME", "photobook-uploads"),
            ("ALLOWED_ORIGINS", "https://photobook.example.com,http://localhost:4000"),
        ];
        all_vars.extend_from_slice(vars);
        Self::with_vars(&all_vars, Environment::Development)
    }

    /// Setup built from exactly the given variables
    pub fn with_vars(vars: &[(&str, &str)], environment: Environment) -> Self {
        setup_test_env();

        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        let config = Arc::new(IssuerConfig::from_lookup(|name| vars.get(name).cloned()));

        let signer = Arc::new(StubPostPolicySigner::default());
        let clock = Arc::new(FixedClock::from_millis(NOW_MILLIS));
        let issuer = Arc::new(TicketIssuer::new(
            config.clone(),
            signer.clone(),
            clock.clone(),
        ));

        let router = server::build_router(environment, issuer);

        Self {
            router,
            config,
            signer,
            clock,
        }
    }

    pub async fn send_post_request(
        &self,
        route: &str,
        payload: serde_json::Value,
    ) -> Result<Response, Box<dyn std::error::Error>> {
        self.send_raw_post_request(route, &payload.to_string(), &[])
            .await
    }

    pub async fn send_raw_post_request(
        &self,
        route: &str,
        body: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder()
            .uri(route)
            .method("POST")
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::from(body.to_string()))?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }

    pub async fn send_request(
        &self,
        method: &str,
        route: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, Box<dyn std::error::Error>> {
        let mut builder = Request::builder().uri(route).method(method);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty())?;

        let response = self.router.clone().oneshot(request).await?;
        Ok(response)
    }
}

/// Parse response body to JSON
pub async fn parse_response_body(response: Response) -> serde_json::Value {
    use http_body_util::BodyExt;

    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// Read the raw response body
pub async fn read_response_body(response: Response) -> Vec<u8> {
    use http_body_util::BodyExt;

    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}
