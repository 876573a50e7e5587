use serde::Serialize;
use thiserror::Error;

/// Machine-readable error codes surfaced in error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    InvalidRequest,
    InvalidMediaIds,
    InvalidUserIds,
    InvalidTags,
    AuthenticationFailed,
    FolderHasChildren,
    FolderHasMedia,
    ItemInUse,
    TagExists,
    CategoryExists,
    CategoryHasTags,
    EmailExists,
    DataIntegrity,
    InternalError,
    ServiceUnavailable,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "not_found",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidMediaIds => "invalid_media_ids",
            ErrorCode::InvalidUserIds => "invalid_user_ids",
            ErrorCode::InvalidTags => "invalid_tags",
            ErrorCode::AuthenticationFailed => "authentication_failed",
            ErrorCode::FolderHasChildren => "folder_has_children",
            ErrorCode::FolderHasMedia => "folder_has_media",
            ErrorCode::ItemInUse => "item_in_use",
            ErrorCode::TagExists => "tag_exists",
            ErrorCode::CategoryExists => "category_exists",
            ErrorCode::CategoryHasTags => "category_has_tags",
            ErrorCode::EmailExists => "email_exists",
            ErrorCode::DataIntegrity => "data_integrity",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::ServiceUnavailable => "service_unavailable",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum StashError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A referenced id set that did not fully resolve (media, users or tag names).
    #[error("{message}")]
    InvalidReference {
        code: ErrorCode,
        message: String,
        ids: Vec<String>,
    },

    #[error("{message}")]
    Conflict { code: ErrorCode, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Data integrity error: {0}")]
    DataIntegrity(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StashError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        StashError::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        StashError::InvalidRequest(message.into())
    }

    pub fn conflict(code: ErrorCode, message: impl Into<String>) -> Self {
        StashError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_reference(code: ErrorCode, message: impl Into<String>, ids: Vec<String>) -> Self {
        StashError::InvalidReference {
            code,
            message: message.into(),
            ids,
        }
    }

    /// HTTP-style status code for this error.
    pub fn status(&self) -> u16 {
        match self {
            StashError::NotFound { .. } => 404,
            StashError::InvalidRequest(_) | StashError::InvalidReference { .. } => 400,
            StashError::AuthenticationFailed(_) => 401,
            StashError::Conflict { .. } => 409,
            StashError::ServiceUnavailable(_) => 503,
            StashError::DataIntegrity(_)
            | StashError::Config(_)
            | StashError::Serialization(_) => 500,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            StashError::NotFound { .. } => ErrorCode::NotFound,
            StashError::InvalidRequest(_) => ErrorCode::InvalidRequest,
            StashError::InvalidReference { code, .. } => *code,
            StashError::Conflict { code, .. } => *code,
            StashError::AuthenticationFailed(_) => ErrorCode::AuthenticationFailed,
            StashError::ServiceUnavailable(_) => ErrorCode::ServiceUnavailable,
            StashError::DataIntegrity(_) => ErrorCode::DataIntegrity,
            StashError::Config(_) | StashError::Serialization(_) => ErrorCode::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, StashError>;
