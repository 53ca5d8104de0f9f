//! MCP-specific error types and mapping to JSON-RPC error codes.

use crate::error::PromptshelfError;
use rmcp::model::ErrorCode;
use rmcp::ErrorData as RmcpError;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

/// Custom MCP error codes (in the -32000 to -32099 range for server errors)
pub mod error_codes {
    pub const PROMPT_NOT_FOUND: i32 = -32001;
    pub const TAXONOMY_NOT_FOUND: i32 = -32002;
    pub const VALIDATION_FAILED: i32 = -32003;
    pub const REFERENCE_INVALID: i32 = -32004;
    pub const REVISION_NOT_FOUND: i32 = -32005;
    pub const STORAGE_ERROR: i32 = -32010;
    pub const INTERNAL_ERROR: i32 = -32011;
}

/// MCP-specific error types with detailed context.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum McpError {
    #[error("Prompt not found: {id}")]
    PromptNotFound { id: String },

    #[error("No {kind} named or identified by '{id}'")]
    TaxonomyNotFound { kind: String, id: String },

    #[error("Revision {revision} not found for prompt {id}")]
    RevisionNotFound { id: String, revision: u32 },

    #[error("Validation failed for field '{field}': {message}")]
    ValidationFailed { field: String, message: String },

    #[error("Invalid value '{value}' for field '{field}'. Valid values: {}", valid.join(", "))]
    InvalidEnumValue {
        field: String,
        value: String,
        valid: Vec<String>,
    },

    #[error("Unknown {kind} '{name}'. Create it first with taxonomy_create.")]
    UnknownReference { kind: String, name: String },

    #[error("A {kind} named '{name}' already exists")]
    DuplicateName { kind: String, name: String },

    #[error("Storage error: {message}")]
    StorageError { message: String },

    #[error("Internal error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Get the JSON-RPC error code for this error type.
    pub fn error_code(&self) -> i32 {
        match self {
            McpError::PromptNotFound { .. } => error_codes::PROMPT_NOT_FOUND,
            McpError::TaxonomyNotFound { .. } => error_codes::TAXONOMY_NOT_FOUND,
            McpError::RevisionNotFound { .. } => error_codes::REVISION_NOT_FOUND,
            McpError::ValidationFailed { .. } | McpError::InvalidEnumValue { .. } => {
                error_codes::VALIDATION_FAILED
            }
            McpError::UnknownReference { .. } | McpError::DuplicateName { .. } => {
                error_codes::REFERENCE_INVALID
            }
            McpError::StorageError { .. } => error_codes::STORAGE_ERROR,
            McpError::InternalError { .. } => error_codes::INTERNAL_ERROR,
        }
    }

    /// Get the error type name for the data payload.
    pub fn error_type(&self) -> &'static str {
        match self {
            McpError::PromptNotFound { .. } => "PromptNotFound",
            McpError::TaxonomyNotFound { .. } => "TaxonomyNotFound",
            McpError::RevisionNotFound { .. } => "RevisionNotFound",
            McpError::ValidationFailed { .. } => "ValidationFailed",
            McpError::InvalidEnumValue { .. } => "InvalidEnumValue",
            McpError::UnknownReference { .. } => "UnknownReference",
            McpError::DuplicateName { .. } => "DuplicateName",
            McpError::StorageError { .. } => "StorageError",
            McpError::InternalError { .. } => "InternalError",
        }
    }

    /// Convert to rmcp ErrorData for JSON-RPC response.
    pub fn to_rmcp_error(&self) -> RmcpError {
        RmcpError {
            code: ErrorCode(self.error_code()),
            message: self.to_string().into(),
            data: Some(json!({
                "error_type": self.error_type(),
                "details": self.clone()
            })),
        }
    }
}

impl From<McpError> for RmcpError {
    fn from(err: McpError) -> Self {
        err.to_rmcp_error()
    }
}

impl From<PromptshelfError> for McpError {
    fn from(err: PromptshelfError) -> Self {
        match err {
            PromptshelfError::NotInitialized | PromptshelfError::AlreadyInitialized => {
                McpError::StorageError {
                    message: err.to_string(),
                }
            }
            PromptshelfError::PromptNotFound(id) => McpError::PromptNotFound { id },
            PromptshelfError::TaxonomyNotFound { kind, id } => {
                McpError::TaxonomyNotFound { kind, id }
            }
            PromptshelfError::RevisionNotFound { prompt, revision } => McpError::RevisionNotFound {
                id: prompt,
                revision,
            },
            PromptshelfError::DuplicateName { kind, name } => McpError::DuplicateName { kind, name },
            PromptshelfError::UnknownReference { kind, name } => {
                McpError::UnknownReference { kind, name }
            }
            PromptshelfError::Validation(message) => McpError::ValidationFailed {
                field: "input".to_string(),
                message,
            },
            PromptshelfError::Clipboard(message) => McpError::InternalError { message },
            PromptshelfError::Config(message) => McpError::StorageError {
                message: format!("Config error: {}", message),
            },
            PromptshelfError::Storage(message) => McpError::StorageError { message },
            PromptshelfError::Io(e) => McpError::StorageError {
                message: format!("IO error: {}", e),
            },
            PromptshelfError::Json(e) => McpError::InternalError {
                message: format!("JSON error: {}", e),
            },
            PromptshelfError::Yaml(e) => McpError::StorageError {
                message: format!("YAML error: {}", e),
            },
            PromptshelfError::Loro(e) => McpError::StorageError {
                message: format!("Loro error: {}", e),
            },
            PromptshelfError::LoroEncode(e) => McpError::StorageError {
                message: format!("Loro encode error: {}", e),
            },
        }
    }
}

/// Limits that only apply to MCP requests.
pub mod validation {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 100;
}
