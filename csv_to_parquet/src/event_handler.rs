use aws_lambda_events::event::s3::{S3Event, S3EventRecord};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{tracing, Error, LambdaEvent};
use serde::Serialize;

use crate::config::IngestConfig;
use crate::error::IngestError;
use crate::table;

/// Returned to the invoker once the clean object is in place.
#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct IngestResult {
    pub status: String,
    #[serde(rename = "in")]
    pub input_uri: String,
    #[serde(rename = "out")]
    pub output_uri: String,
    pub rows: usize,
}

fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{}/{}", bucket, key)
}

/// S3 notification keys are form-encoded: `+` stands for a space and a
/// literal plus arrives as `%2B`. Mapping `+` before percent-decoding is
/// intentional; plain percent-decoding would leave `+` in the key and miss
/// objects whose names contain spaces.
fn decode_key(raw: &str) -> Result<String, IngestError> {
    Ok(urlencoding::decode(&raw.replace('+', " "))?.into_owned())
}

fn source_object(record: &S3EventRecord) -> Result<(String, String), IngestError> {
    let bucket = record
        .s3
        .bucket
        .name
        .clone()
        .ok_or(IngestError::MissingField("bucket name"))?;
    let raw_key = record
        .s3
        .object
        .key
        .as_deref()
        .ok_or(IngestError::MissingField("object key"))?;
    Ok((bucket, decode_key(raw_key)?))
}

async fn read_object(s3_client: &S3Client, bucket: &str, key: &str) -> Result<Vec<u8>, IngestError> {
    let output = s3_client.get_object().bucket(bucket).key(key).send().await?;
    let body = output.body.collect().await?;
    Ok(body.into_bytes().to_vec())
}

async fn write_object(
    s3_client: &S3Client,
    bucket: &str,
    key: &str,
    body: Vec<u8>,
    content_type: &str,
) -> Result<(), IngestError> {
    s3_client
        .put_object()
        .bucket(bucket)
        .key(key)
        .content_type(content_type)
        .body(ByteStream::from(body))
        .send()
        .await?;
    Ok(())
}

async fn ingest(
    s3_client: &S3Client,
    config: &IngestConfig,
    event: &S3Event,
) -> Result<IngestResult, IngestError> {
    let record = event.records.first().ok_or(IngestError::EmptyEvent)?;
    if event.records.len() > 1 {
        tracing::warn!(
            "S3 event carries {} records; only the first is processed",
            event.records.len()
        );
    }

    let (bucket_in, key_in) = source_object(record)?;
    let src_uri = s3_uri(&bucket_in, &key_in);
    tracing::info!("Reading {}", src_uri);

    let raw = read_object(s3_client, &bucket_in, &key_in).await?;
    let table = table::normalize_columns(&table::load_table(&raw)?)?;
    table::validate_columns(&table)?;

    let split = table::partition_rows(&table)?;
    tracing::info!(
        "Loaded {} rows: {} good, {} bad",
        table.num_rows(),
        split.good.num_rows(),
        split.bad.num_rows()
    );

    if split.bad.num_rows() > 0 {
        let error_key = config.paths.error_key(&key_in);
        tracing::warn!(
            "Routing {} bad rows to {}",
            split.bad.num_rows(),
            s3_uri(&config.clean_bucket, &error_key)
        );
        let csv = table::encode_csv(&split.bad)?;
        write_object(s3_client, &config.clean_bucket, &error_key, csv, "text/csv").await?;
    }

    let key_out = config.paths.clean_key(&key_in);
    let dst_uri = s3_uri(&config.clean_bucket, &key_out);
    let parquet = table::encode_parquet(&split.good)?;
    write_object(
        s3_client,
        &config.clean_bucket,
        &key_out,
        parquet,
        "application/vnd.apache.parquet",
    )
    .await?;
    tracing::info!("Wrote {} rows to {}", split.good.num_rows(), dst_uri);

    Ok(IngestResult {
        status: "ok".to_string(),
        input_uri: src_uri,
        output_uri: dst_uri,
        rows: split.good.num_rows(),
    })
}

pub(crate) async fn function_handler(
    event: LambdaEvent<S3Event>,
    s3_client: &S3Client,
    config: &IngestConfig,
) -> Result<IngestResult, Error> {
    Ok(ingest(s3_client, config, &event.payload).await?)
}
