//! Error types for recall operations.
//!
//! Errors carry a structured [`ErrorCode`] for programmatic handling and an
//! optional suggestion for the page layer to surface.

use std::collections::HashMap;
use thiserror::Error;

/// Result type alias for recall operations.
pub type RecallResult<T> = Result<T, RecallError>;

/// Main error type for all recall operations.
#[derive(Error, Debug)]
pub enum RecallError {
    /// The current user could not be resolved.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Input validation failed.
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        code: ErrorCode,
        details: HashMap<String, String>,
        suggestion: Option<String>,
    },

    /// Resource not found.
    #[error("Resource not found: {message}")]
    NotFound {
        message: String,
        code: ErrorCode,
        resource_id: Option<String>,
    },

    /// Storage query or update failed.
    #[error("Storage error: {message}")]
    Storage {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Store provider not supported (or not compiled in).
    #[error("Provider not supported: {provider}")]
    UnsupportedProvider { provider: String },

    /// Parse error.
    #[error("Parse error: {message}")]
    Parse { message: String, code: ErrorCode },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error codes for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (AUTH_xxx)
    AuthMissingUser,
    AuthInvalidKey,

    // Validation (VAL_xxx)
    ValInvalidInput,
    ValInvalidScore,
    ValUnknownKind,

    // Resources (RES_xxx)
    ResNotFound,

    // Storage (STO_xxx)
    StoConnectionFailed,
    StoQueryFailed,
    StoUpdateFailed,

    // Parse (PARSE_xxx)
    ParseInvalidJson,

    // Internal
    Internal,
}

impl ErrorCode {
    /// Get the string representation of the error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthMissingUser => "AUTH_001",
            ErrorCode::AuthInvalidKey => "AUTH_002",
            ErrorCode::ValInvalidInput => "VAL_001",
            ErrorCode::ValInvalidScore => "VAL_002",
            ErrorCode::ValUnknownKind => "VAL_003",
            ErrorCode::ResNotFound => "RES_001",
            ErrorCode::StoConnectionFailed => "STO_001",
            ErrorCode::StoQueryFailed => "STO_002",
            ErrorCode::StoUpdateFailed => "STO_003",
            ErrorCode::ParseInvalidJson => "PARSE_001",
            ErrorCode::Internal => "INT_001",
        }
    }
}

impl RecallError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            code: ErrorCode::ValInvalidInput,
            details: HashMap::new(),
            suggestion: None,
        }
    }

    /// Create a validation error for an out-of-range review score.
    pub fn invalid_score(score: u32, total: u32) -> Self {
        let mut details = HashMap::new();
        details.insert("score".to_string(), score.to_string());
        details.insert("total".to_string(), total.to_string());
        Self::Validation {
            message: format!("invalid score {}/{}", score, total),
            code: ErrorCode::ValInvalidScore,
            details,
            suggestion: Some("Score must not exceed total, and total must be positive".to_string()),
        }
    }

    /// Create a validation error for an unrecognized resource kind.
    pub fn unknown_kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        let mut details = HashMap::new();
        details.insert("kind".to_string(), kind.clone());
        Self::Validation {
            message: format!("unknown resource kind '{}'", kind),
            code: ErrorCode::ValUnknownKind,
            details,
            suggestion: Some(
                "Use one of concept-map, flashcard, multiple-choice, storyboard".to_string(),
            ),
        }
    }

    /// Create a not found error.
    pub fn not_found(resource_id: impl Into<String>) -> Self {
        let id = resource_id.into();
        Self::NotFound {
            message: format!("Resource with id '{}' not found", id),
            code: ErrorCode::ResNotFound,
            resource_id: Some(id),
        }
    }

    /// Create a storage query error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoQueryFailed,
            source: None,
        }
    }

    /// Create a storage error wrapping a backend error.
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoQueryFailed,
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage update error.
    pub fn storage_update(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            code: ErrorCode::StoUpdateFailed,
            source: None,
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            code: ErrorCode::ParseInvalidJson,
        }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
            code: ErrorCode::AuthMissingUser,
            source: None,
        }
    }

    /// Create an authentication error for a missing or wrong API key.
    pub fn invalid_api_key() -> Self {
        Self::Authentication {
            message: "invalid or missing API key".to_string(),
            code: ErrorCode::AuthInvalidKey,
            source: None,
        }
    }

    /// Get the error code.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Storage { code, .. } => *code,
            Self::Parse { code, .. } => *code,
            _ => ErrorCode::Internal,
        }
    }

    /// Get a user-friendly suggestion for resolving this error.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Authentication {
                code: ErrorCode::AuthInvalidKey,
                ..
            } => Some("Send the server key as 'Authorization: Bearer <key>'"),
            Self::Authentication { .. } => Some("Please sign in again"),
            Self::NotFound { .. } => Some("Please check the resource ID and kind"),
            Self::Validation { suggestion, .. } => suggestion.as_deref(),
            Self::Storage { .. } => Some("Please check your storage connection settings"),
            _ => None,
        }
    }

    /// Whether this error came from the storage layer.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}
