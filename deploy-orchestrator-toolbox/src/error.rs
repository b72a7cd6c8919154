//! Unified error type

use serde::Serialize;
use thiserror::Error;

/// Toolbox error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum ToolboxError {
    /// Bad input (empty hostname, unknown record type)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// No resolver could be reached
    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Toolbox Result alias
pub type ToolboxResult<T> = std::result::Result<T, ToolboxError>;
