use std::sync::Arc;

use ticket_issuer::{
    issuer::{SystemClock, TicketIssuer},
    media_storage::S3PostPolicySigner,
    server,
    types::{Environment, IssuerConfig},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();

    // JSON logs for staging/production, human-readable locally
    if environment.json_logs() {
        fmt()
            .json()
            .with_env_filter(EnvFilter::from_default_env())
            .init();
    } else {
        fmt().with_env_filter(EnvFilter::from_default_env()).init();
    }

    let config = Arc::new(IssuerConfig::from_env());
    if config.bucket_name.is_none() {
        tracing::warn!("BUCKET_NAME is not set, every ticket request will fail");
    }
    tracing::info!(?environment, ?config, "Loaded issuer configuration");

    let aws_config = environment.aws_config(&config.region).await;
    let signer = Arc::new(S3PostPolicySigner::from_sdk_config(
        &aws_config,
        environment.override_aws_endpoint_url().map(ToString::to_string),
    )?);

    let issuer = Arc::new(TicketIssuer::new(config, signer, Arc::new(SystemClock)));

    server::start(environment, issuer).await
}
