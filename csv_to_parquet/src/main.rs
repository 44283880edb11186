use aws_config::BehaviorVersion;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, tracing, Error};
mod config;
mod error;
mod event_handler;
mod keys;
mod table;
use config::IngestConfig;
use event_handler::function_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::subscriber::fmt().json().init();
    dotenvy::dotenv().ok();
    let config = IngestConfig::from_env()?;
    let shared_config = aws_config::load_defaults(BehaviorVersion::v2025_01_17()).await;
    let s3_client = S3Client::new(&shared_config);
    tracing::info!("Writing clean and error objects to {}", config.clean_bucket);
    run(service_fn(|event| function_handler(event, &s3_client, &config))).await
}
