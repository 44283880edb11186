use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::put_object::PutObjectError;
use aws_sdk_s3::primitives::ByteStreamError;

/// Everything that can abort an ingest invocation.
#[derive(Debug, thiserror::Error)]
pub(crate) enum IngestError {
    #[error("No records found in S3 event")]
    EmptyEvent,

    #[error("S3 event record has no {0}")]
    MissingField(&'static str),

    #[error("Object key is not valid UTF-8 after decoding: {0}")]
    KeyDecode(#[from] std::string::FromUtf8Error),

    /// Required columns absent after header normalization.
    #[error("Missing columns: {0:?}")]
    MissingColumns(Vec<String>),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("GetObject failed: {0}")]
    GetObject(#[from] SdkError<GetObjectError>),

    #[error("Reading object body failed: {0}")]
    ReadBody(#[from] ByteStreamError),

    #[error("PutObject failed: {0}")]
    PutObject(#[from] SdkError<PutObjectError>),
}
