use reqwest::StatusCode;
use thiserror::Error;

/// Errors surfaced to the serverless runtime when a job fails.
#[derive(Debug, Error)]
pub enum Error {
    #[error("missing required input field `{0}`")]
    MissingField(&'static str),

    #[error("invalid input field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("download of {url} failed with status {status}")]
    DownloadStatus { url: String, status: StatusCode },

    #[error("inference gave up after {attempts} attempts, last status {status}")]
    RetriesExhausted { attempts: u32, status: StatusCode },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("inference endpoint returned invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
