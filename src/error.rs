use thiserror::Error;

use crate::types::ContentType;

/// Domain failures. I/O paths wrap these in `anyhow::Error`; use
/// `downcast_ref::<CatalogError>()` to match on them.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("content metadata not found: {content_type} {content_key}")]
    ContentNotFound {
        content_key: String,
        content_type: ContentType,
    },

    #[error("no content metadata with key {0}")]
    ContentKeyNotFound(String),

    #[error("highlight set not found: {0}")]
    HighlightSetNotFound(String),

    #[error("no curation config for enterprise {0}")]
    CurationNotFound(String),

    #[error("video not found: {0}")]
    VideoNotFound(String),

    #[error("no transcript url for language '{0}'")]
    TranscriptUrlMissing(String),

    #[error("transcript summary is not available")]
    TranscriptSummaryMissing,

    #[error("metadata field '{field}' is missing or malformed")]
    MalformedMetadata { field: String },

    #[error("invalid JSON in chat completion response: {0}")]
    InvalidJsonResponse(String),

    #[error("unknown content type: {0}")]
    UnknownContentType(String),
}

impl CatalogError {
    pub(crate) fn malformed(field: impl Into<String>) -> Self {
        CatalogError::MalformedMetadata { field: field.into() }
    }
}
