//! Tag support.
//!
//! Tags live in their own table, but media items reference them by *name*.
//! The name is therefore the join key, and everything that touches a media
//! item's tag list has to keep two things in step:
//!
//! - the tag's cached `count` (number of media carrying the name)
//! - the media rows themselves, when a tag is renamed or deleted
//!
//! The helpers here are the only code that adjusts counts. Counts never go
//! below zero.
//!
//! ## Tag Naming Rules
//!
//! See [`validation`] for the full rules. Names compare case-insensitively for
//! uniqueness but are stored exactly as given.

pub mod validation;

pub use validation::{validate_tag_name, TagValidationError};

use crate::error::{Result, StashError};
use crate::model::Tag;
use crate::store::DataStore;

/// Finds a tag by name, ignoring case.
pub fn find_by_name<'a>(tags: &'a [Tag], name: &str) -> Option<&'a Tag> {
    tags.iter().find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Validates `raw` and maps a failure to `invalid_request`.
pub fn checked_name(raw: &str) -> Result<String> {
    validate_tag_name(raw)
        .map(str::to_string)
        .map_err(|e| StashError::invalid(e.to_string()))
}

/// Adjusts the count of the tag named `name` by `delta`, saturating at zero.
///
/// Names without a registered tag are ignored.
pub fn adjust_count<S: DataStore>(store: &mut S, name: &str, delta: i64) {
    store.tags_mut().update_where(
        |t| t.name == name,
        |t| {
            let next = (t.count as i64 + delta).max(0);
            t.count = u32::try_from(next).unwrap_or(u32::MAX);
        },
    );
}

/// Applies count changes for a media item whose tag list went from `before`
/// to `after`.
pub fn apply_tag_diff<S: DataStore>(store: &mut S, before: &[String], after: &[String]) {
    for removed in before.iter().filter(|t| !after.contains(t)) {
        adjust_count(store, removed, -1);
    }
    for added in after.iter().filter(|t| !before.contains(t)) {
        adjust_count(store, added, 1);
    }
}

/// Removes duplicate names, keeping the first occurrence.
pub fn dedupe(names: &mut Vec<String>) {
    let mut seen: Vec<String> = Vec::with_capacity(names.len());
    names.retain(|n| {
        if seen.contains(n) {
            false
        } else {
            seen.push(n.clone());
            true
        }
    });
}

/// Names from `names` that are not registered, in input order.
pub fn unknown_names<S: DataStore>(store: &S, names: &[String]) -> Vec<String> {
    names
        .iter()
        .filter(|n| !store.tags().all().iter().any(|t| &t.name == *n))
        .cloned()
        .collect()
}
