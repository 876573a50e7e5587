//! Batch tagging of media.
//!
//! Adds and/or removes tag names on many media items at once:
//! - every name in `add` must be a registered tag, or nothing happens
//! - ids that don't resolve are reported in `missing`, not fatal
//! - adding a name an item already has, or removing one it lacks, is a no-op
//! - each actual change moves that tag's count by one (never below zero)

use crate::commands::helpers::plural;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::store::DataStore;
use crate::tags::{adjust_count, dedupe, unknown_names};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaggingOutcome {
    pub updated_count: usize,
    /// Media ids that resolved and were processed.
    pub updated: Vec<String>,
    /// Media ids that do not exist.
    pub missing: Vec<String>,
}

pub fn apply<S: DataStore>(
    store: &mut S,
    media_ids: &[String],
    add: &[String],
    remove: &[String],
) -> Result<CmdResult<TaggingOutcome>> {
    if add.is_empty() && remove.is_empty() {
        return Err(StashError::invalid("No tags specified"));
    }
    if media_ids.is_empty() {
        return Err(StashError::invalid("No media ids specified"));
    }

    let mut add = add.to_vec();
    dedupe(&mut add);
    let mut remove = remove.to_vec();
    dedupe(&mut remove);

    let unknown = unknown_names(store, &add);
    if !unknown.is_empty() {
        return Err(StashError::invalid_reference(
            ErrorCode::InvalidTags,
            format!(
                "Tag{} not found: {}. Create {} first",
                plural(unknown.len()),
                unknown.join(", "),
                if unknown.len() == 1 { "it" } else { "them" }
            ),
            unknown,
        ));
    }

    let mut ids = media_ids.to_vec();
    dedupe(&mut ids);

    let mut outcome = TaggingOutcome::default();
    let mut changes = 0;
    for id in &ids {
        let Some(item) = store.media().get(id) else {
            outcome.missing.push(id.clone());
            continue;
        };

        let mut tags = item.tags.clone();
        let mut added = Vec::new();
        let mut removed = Vec::new();
        for name in &add {
            if !tags.contains(name) {
                tags.push(name.clone());
                added.push(name.clone());
            }
        }
        for name in &remove {
            if tags.contains(name) && !added.contains(name) {
                tags.retain(|t| t != name);
                removed.push(name.clone());
            }
        }

        if !added.is_empty() || !removed.is_empty() {
            let now = Utc::now();
            store.media_mut().update_where(
                |m| m.id == *id,
                |m| {
                    m.tags = tags.clone();
                    m.modified = now;
                },
            );
            for name in &added {
                adjust_count(store, name, 1);
            }
            for name in &removed {
                adjust_count(store, name, -1);
            }
            changes += added.len() + removed.len();
        }
        outcome.updated.push(id.clone());
    }
    outcome.updated_count = outcome.updated.len();

    tracing::debug!(
        updated = outcome.updated_count,
        missing = outcome.missing.len(),
        changes,
        "batch tagging applied"
    );

    let mut result = CmdResult::new(outcome);
    let n = result.data.updated_count;
    result.add_message(CmdMessage::success(format!(
        "Updated tags on {} media item{}",
        n,
        plural(n)
    )));
    if !result.data.missing.is_empty() {
        result.add_message(CmdMessage::warning(format!(
            "Skipped unknown media: {}",
            result.data.missing.join(", ")
        )));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::MemoryStore;

    fn store() -> MemoryStore {
        StoreFixture::new()
            .with_folder("f", "F", None)
            .with_tag("tx", "x")
            .with_tag("ty", "y")
            .with_tag("tz", "z")
            .with_media("a", "a.jpg", "f", &["z"])
            .with_media("c", "c.jpg", "f", &["x", "z"])
            .store
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn count(s: &MemoryStore, id: &str) -> u32 {
        s.tags().get(id).unwrap().count
    }

    #[test]
    fn add_to_existing_and_missing_media() {
        let mut s = store();
        let result = apply(&mut s, &ids(&["a", "b"]), &ids(&["x", "y"]), &[]).unwrap();

        assert_eq!(result.data.updated_count, 1);
        assert_eq!(result.data.updated, vec!["a"]);
        assert_eq!(result.data.missing, vec!["b"]);
        let a = s.media().get("a").unwrap();
        assert!(a.has_tag("x") && a.has_tag("y"));
        assert_eq!(count(&s, "tx"), 2);
        assert_eq!(count(&s, "ty"), 1);
    }

    #[test]
    fn adding_present_tag_is_noop_for_count() {
        let mut s = store();
        apply(&mut s, &ids(&["c"]), &ids(&["x"]), &[]).unwrap();
        assert_eq!(count(&s, "tx"), 1);
        assert_eq!(s.media().get("c").unwrap().tags, vec!["x", "z"]);
    }

    #[test]
    fn remove_skips_absent_and_decrements() {
        let mut s = store();
        apply(&mut s, &ids(&["a", "c"]), &[], &ids(&["x", "ghost"])).unwrap();
        assert_eq!(count(&s, "tx"), 0);
        assert!(!s.media().get("c").unwrap().has_tag("x"));
    }

    #[test]
    fn unknown_add_name_is_atomic() {
        let mut s = store();
        let err = apply(&mut s, &ids(&["a"]), &ids(&["x", "nope"]), &[]).unwrap_err();
        match err {
            StashError::InvalidReference { code, ids, .. } => {
                assert_eq!(code, ErrorCode::InvalidTags);
                assert_eq!(ids, vec!["nope"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(!s.media().get("a").unwrap().has_tag("x"));
        assert_eq!(count(&s, "tx"), 1);
    }

    #[test]
    fn requires_some_tags_and_ids() {
        let mut s = store();
        assert_eq!(apply(&mut s, &ids(&["a"]), &[], &[]).unwrap_err().status(), 400);
        assert_eq!(apply(&mut s, &[], &ids(&["x"]), &[]).unwrap_err().status(), 400);
    }

    #[test]
    fn counts_floor_at_zero() {
        let mut s = store();
        s.tags_mut().update_where(|t| t.id == "tz", |t| t.count = 0);
        apply(&mut s, &ids(&["a"]), &[], &ids(&["z"])).unwrap();
        assert_eq!(count(&s, "tz"), 0);
    }

    #[test]
    fn duplicate_ids_processed_once() {
        let mut s = store();
        let result = apply(&mut s, &ids(&["a", "a"]), &ids(&["y"]), &[]).unwrap();
        assert_eq!(result.data.updated_count, 1);
        assert_eq!(count(&s, "ty"), 1);
    }
}
