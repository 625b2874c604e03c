//! Errors shared across the console's layers.

use thiserror::Error;

/// Rejections raised before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("client id cannot be empty")]
    EmptyId,
    #[error("client id '{0}' may only contain letters, digits, '-' and '_'")]
    InvalidId(String),
    #[error("client '{0}' already exists")]
    DuplicateId(String),
    #[error("password cannot be empty")]
    EmptyPassword,
    #[error("imported configuration must be a JSON object")]
    ImportNotObject,
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error("configuration does not fit the client schema: {0}")]
    InvalidConfig(String),
}
