//! Error types for pixelblocks.
//!
//! Uses thiserror for structured errors with context. The three failure
//! classes of an invocation (resolving a reference, transforming bytes,
//! persisting the result) each have their own enum; [`ComponentError`]
//! wraps them so a whole invocation fails with a single error value.

use crate::core::types::{ParamType, Ticket};
use thiserror::Error;

/// Errors raised by a content store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("No object stored under ticket {0}")]
    NotFound(Ticket),

    #[error("Temporary object {0} has expired")]
    Expired(Ticket),

    #[error("Storage backend failure: {0}")]
    Storage(String),
}

/// Errors raised while decoding, transforming, or encoding image bytes.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image as {format}: {error}")]
    Encode { format: String, error: String },

    #[error("Invalid value for '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

impl TransformError {
    /// Shorthand for an [`TransformError::InvalidParameter`].
    pub fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        TransformError::InvalidParameter {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for TransformError {
    fn from(err: image::ImageError) -> Self {
        TransformError::Decode(err.to_string())
    }
}

/// Errors in the shape of the request payload itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("Invalid image reference in '{field}' at index {index}: {reason}")]
    InvalidReference {
        field: String,
        index: usize,
        reason: String,
    },

    #[error("Field '{field}' must be a sequence of image references")]
    NotASequence { field: String },

    #[error("Type mismatch for '{field}': expected {expected}")]
    TypeMismatch { field: String, expected: ParamType },
}

/// Top-level error for a component invocation.
///
/// Failures are not retried or partially recovered: any error anywhere in a
/// batch rejects the whole invocation.
#[derive(Error, Debug)]
pub enum ComponentError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("Payload error: {0}")]
    Payload(#[from] PayloadError),

    #[error("Unknown component '{0}'")]
    UnknownComponent(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ComponentError {
    /// Whether the failure came from the content store.
    pub fn is_store_error(&self) -> bool {
        matches!(self, ComponentError::Store(_))
    }

    /// Whether the failure came from the image operation.
    pub fn is_transform_error(&self) -> bool {
        matches!(self, ComponentError::Transform(_))
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for image operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type alias for component invocations.
pub type ComponentResult<T> = Result<T, ComponentError>;
