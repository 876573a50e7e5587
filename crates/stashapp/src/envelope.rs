//! Uniform success and error wrappers returned by [`StashApi`](crate::api::StashApi).
//!
//! Success: `{success: true, data, message, timestamp, requestId}`.
//! Error: `{success: false, message, status, code, timestamp, requestId, details?}`,
//! where `details` lists the offending ids of an invalid-reference error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{ErrorCode, StashError};

pub fn new_request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
}

impl<T> Envelope<T> {
    pub fn ok(data: T, message: impl Into<String>, request_id: String) -> Self {
        Self {
            success: true,
            data,
            message: message.into(),
            timestamp: Utc::now(),
            request_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub success: bool,
    pub message: String,
    pub status: u16,
    pub code: ErrorCode,
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl ApiError {
    pub fn from_error(err: &StashError, request_id: String) -> Self {
        let details = match err {
            StashError::InvalidReference { ids, .. } => Some(ErrorDetails { ids: ids.clone() }),
            _ => None,
        };
        Self {
            success: false,
            message: err.to_string(),
            status: err.status(),
            code: err.code(),
            timestamp: Utc::now(),
            request_id,
            details,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let env = Envelope::ok(vec![1, 2], "Loaded", new_request_id());
        let json = serde_json::to_value(&env).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"][1], 2);
        assert_eq!(json["message"], "Loaded");
        assert!(json["requestId"].as_str().unwrap().starts_with("req_"));
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn error_envelope_carries_ids_for_invalid_reference() {
        let err = StashError::invalid_reference(
            ErrorCode::InvalidMediaIds,
            "Unknown media item ids: m9",
            vec!["m9".into()],
        );
        let api = ApiError::from_error(&err, "req_1".into());
        let json = serde_json::to_value(&api).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["status"], 400);
        assert_eq!(json["code"], "invalid_media_ids");
        assert_eq!(json["details"]["ids"][0], "m9");
    }

    #[test]
    fn error_envelope_omits_details_otherwise() {
        let api = ApiError::from_error(&StashError::not_found("Tag", "t1"), "req_2".into());
        let json = serde_json::to_value(&api).unwrap();
        assert!(json.get("details").is_none());
        assert_eq!(api.to_string(), "[not_found] Tag not found: t1");
    }
}
