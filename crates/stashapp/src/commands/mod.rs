//! # Command Layer
//!
//! This module contains the **core business logic** of stash: every operation
//! that reads or changes the store, together with the cross-table rules that
//! keep it consistent. Each entity has its own submodule of plain functions,
//! generic over [`DataStore`](crate::store::DataStore).
//!
//! ## Role and Responsibilities
//!
//! Commands are where integrity is enforced:
//! - Existence checks on every reference a caller supplies
//! - Cascades (tag renames rewrite media, folder deletes reassign media, ...)
//! - Usage guards (`item_in_use`, `folder_has_children`, `category_has_tags`)
//! - Tag counters, kept in step on every path that edits a media item's tags
//!
//! All checks of an operation run before its first write, so a failed command
//! leaves the store exactly as it found it. Batch media operations are the
//! exception: each item succeeds or fails on its own and the outcome lists both.
//!
//! ## What Commands Do NOT Do
//!
//! - **Envelopes**: results are plain data plus messages; wrapping is done by
//!   [`StashApi`](crate::api::StashApi)
//! - **Fault injection**: latency and simulated outages are applied by the API
//! - **Any I/O**: no stdout, no files, no terminal concerns
//!
//! ## Structured Returns
//!
//! Commands return [`CmdResult<T>`]: the operation's data and a list of
//! [`CmdMessage`]s with levels (info, success, warning, error). The API layer
//! joins every message with `"; "` into the envelope's `message`, or uses
//! `"OK"` when there are none.
//!
//! ## Testing Strategy
//!
//! **This is where the lion's share of testing lives.** Every command module
//! carries unit tests against a fresh
//! [`StoreFixture`](crate::store::memory::fixtures::StoreFixture).
//!
//! ## Command Modules
//!
//! - [`folders`]: Folder CRUD, trees, breadcrumbs, path maintenance
//! - [`media`]: Media CRUD, folder-scoped listing, batch update/delete
//! - [`collections`]: Collection CRUD, trees, items, sharing
//! - [`tags`]: Tag CRUD and rename/delete cascades
//! - [`categories`]: Tag category CRUD
//! - [`tagging`]: Batch tag add/remove on media
//! - [`users`]: Profile updates, preferences, recent lists
//! - [`auth`]: Login against the configured credentials
//! - [`helpers`]: Shared validation utilities

use serde::Serialize;

use crate::error::{ErrorCode, StashError};

pub mod auth;
pub mod categories;
pub mod collections;
pub mod folders;
pub mod helpers;
pub mod media;
pub mod tagging;
pub mod tags;
pub mod users;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CmdResult<T> {
    pub data: T,
    pub messages: Vec<CmdMessage>,
}

impl<T> CmdResult<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            messages: Vec::new(),
        }
    }

    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_message(mut self, message: CmdMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> CmdResult<U> {
        CmdResult {
            data: f(self.data),
            messages: self.messages,
        }
    }

    /// Content of the first message, if any.
    pub fn summary(&self) -> Option<&str> {
        self.messages.first().map(|m| m.content.as_str())
    }
}

/// One item that a batch operation could not apply.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub code: ErrorCode,
    pub message: String,
}

impl BatchFailure {
    pub fn from_error(id: impl Into<String>, err: &StashError) -> Self {
        Self {
            id: id.into(),
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// Per-item result of a batch operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<BatchFailure>,
}

impl BatchOutcome {
    pub fn record(&mut self, id: &str, result: crate::error::Result<()>) {
        match result {
            Ok(()) => self.succeeded.push(id.to_string()),
            Err(err) => {
                tracing::debug!(id, code = %err.code(), "batch item failed");
                self.failed.push(BatchFailure::from_error(id, &err));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_is_first_message() {
        let result = CmdResult::new(1)
            .with_message(CmdMessage::success("done"))
            .with_message(CmdMessage::info("detail"));
        assert_eq!(result.summary(), Some("done"));
        assert_eq!(result.map(|n| n + 1).data, 2);
    }

    #[test]
    fn batch_outcome_splits_results() {
        let mut outcome = BatchOutcome::default();
        outcome.record("a", Ok(()));
        outcome.record("b", Err(StashError::not_found("Media item", "b")));

        assert_eq!(outcome.succeeded, vec!["a"]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].code, ErrorCode::NotFound);
        assert_eq!(outcome.failed[0].id, "b");
    }

    #[test]
    fn message_level_serializes_lowercase() {
        let json = serde_json::to_value(CmdMessage::warning("careful")).unwrap();
        assert_eq!(json["level"], "warning");
    }
}
