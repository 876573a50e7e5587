//! Tag management commands.
//!
//! This module provides CRUD operations for the tag table:
//! - `list` / `get` / `find`: reads (`find` accepts an id or a name)
//! - `create`: name must be valid and unused (case-insensitive)
//! - `update`: color/category, and a name change that behaves like `rename`
//! - `rename`: rewrites the name on every media item carrying it
//! - `delete`: strips the name from every media item, then drops the tag

use crate::commands::helpers::plural;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::model::{Record, Tag};
use crate::query::{self, Page, Query};
use crate::store::DataStore;
use crate::tags::{checked_name, dedupe, find_by_name};
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TagUpdate {
    pub name: Option<String>,
    pub color: Option<Option<String>>,
    pub category_id: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDeletion {
    pub tag: Tag,
    pub affected_media: usize,
}

pub fn list<S: DataStore>(store: &S, query: &Query) -> Result<CmdResult<Page<Tag>>> {
    let page = query::run(store.tags().all(), query)?;
    let mut result = CmdResult::new(page);
    if result.data.meta.total == 0 {
        result.add_message(CmdMessage::info("No tags defined"));
    }
    Ok(result)
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<Tag>> {
    Ok(CmdResult::new(store.tags().require(id)?.clone()))
}

/// Resolves `key` as a tag id first, then as a name (case-insensitive).
pub fn find<S: DataStore>(store: &S, key: &str) -> Result<Tag> {
    store
        .tags()
        .get(key)
        .or_else(|| find_by_name(store.tags().all(), key))
        .cloned()
        .ok_or_else(|| StashError::not_found(Tag::ENTITY, key))
}

fn ensure_unique<S: DataStore>(store: &S, name: &str, except: Option<&str>) -> Result<()> {
    if let Some(existing) = find_by_name(store.tags().all(), name) {
        if Some(existing.id.as_str()) != except {
            return Err(StashError::conflict(
                ErrorCode::TagExists,
                format!("Tag '{}' already exists", existing.name),
            ));
        }
    }
    Ok(())
}

fn ensure_category<S: DataStore>(store: &S, category_id: Option<&str>) -> Result<()> {
    if let Some(id) = category_id {
        store.categories().require(id)?;
    }
    Ok(())
}

pub fn create<S: DataStore>(store: &mut S, input: NewTag) -> Result<CmdResult<Tag>> {
    let name = checked_name(&input.name)?;
    ensure_unique(store, &name, None)?;
    ensure_category(store, input.category_id.as_deref())?;

    let mut tag = Tag::new(name);
    tag.color = input.color;
    tag.category_id = input.category_id;
    store.tags_mut().insert(tag.clone())?;

    Ok(CmdResult::new(tag.clone()).with_message(CmdMessage::success(format!("Created tag '{}'", tag.name))))
}

pub fn update<S: DataStore>(store: &mut S, id: &str, update: TagUpdate) -> Result<CmdResult<Tag>> {
    let current = store.tags().require(id)?.clone();

    let new_name = match &update.name {
        Some(raw) => {
            let name = checked_name(raw)?;
            ensure_unique(store, &name, Some(id))?;
            Some(name).filter(|n| *n != current.name)
        }
        None => None,
    };
    if let Some(Some(category)) = &update.category_id {
        ensure_category(store, Some(category))?;
    }

    let mut messages = Vec::new();
    if let Some(name) = new_name {
        messages = rename(store, id, &name)?.messages;
    }

    let mut tag = store.tags().require(id)?.clone();
    if let Some(color) = update.color {
        tag.color = color;
    }
    if let Some(category) = update.category_id {
        tag.category_id = category;
    }
    store.tags_mut().replace(tag.clone())?;

    let mut result = CmdResult::new(tag.clone());
    if messages.is_empty() {
        result.add_message(CmdMessage::success(format!("Updated tag '{}'", tag.name)));
    }
    result.messages.extend(messages);
    Ok(result)
}

/// Renames a tag and every media item's reference to it.
///
/// The tag keeps its id and count. Media that somehow already carried the new
/// name end up with a single copy.
pub fn rename<S: DataStore>(store: &mut S, id: &str, new_name: &str) -> Result<CmdResult<Tag>> {
    let new_name = checked_name(new_name)?;
    let mut tag = store.tags().require(id)?.clone();
    ensure_unique(store, &new_name, Some(id))?;

    let old_name = std::mem::replace(&mut tag.name, new_name.clone());
    if old_name == new_name {
        return Ok(CmdResult::new(tag).with_message(CmdMessage::info("Name unchanged")));
    }
    store.tags_mut().replace(tag.clone())?;

    let now = Utc::now();
    let affected = store.media_mut().update_where(
        |m| m.has_tag(&old_name),
        |m| {
            for t in m.tags.iter_mut().filter(|t| **t == old_name) {
                *t = new_name.clone();
            }
            dedupe(&mut m.tags);
            m.modified = now;
        },
    );

    tracing::info!(id, from = %old_name, to = %new_name, affected, "tag renamed");
    let mut result = CmdResult::new(tag).with_message(CmdMessage::success(format!(
        "Renamed tag '{}' to '{}'",
        old_name, new_name
    )));
    if affected > 0 {
        result.add_message(CmdMessage::info(format!(
            "Updated {} media item{}",
            affected,
            plural(affected)
        )));
    }
    Ok(result)
}

/// Deletes a tag. Cascades to all media carrying its name.
pub fn delete<S: DataStore>(store: &mut S, id: &str) -> Result<CmdResult<TagDeletion>> {
    let tag = store.tags_mut().remove(id)?;

    let now = Utc::now();
    let affected = store.media_mut().update_where(
        |m| m.has_tag(&tag.name),
        |m| {
            m.tags.retain(|t| *t != tag.name);
            m.modified = now;
        },
    );

    tracing::info!(id, name = %tag.name, affected, "tag deleted");
    let mut result = CmdResult::new(TagDeletion {
        tag: tag.clone(),
        affected_media: affected,
    })
    .with_message(CmdMessage::success(format!("Deleted tag '{}'", tag.name)));
    if affected > 0 {
        result.add_message(CmdMessage::info(format!(
            "Removed from {} media item{}",
            affected,
            plural(affected)
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
            .with_category("k1", "Places")
            .with_tag("t1", "beach")
            .with_tag("t2", "sunset")
            .with_media("m1", "a.jpg", "f", &["beach", "sunset"])
            .with_media("m2", "b.jpg", "f", &["beach"])
            .with_media("m3", "c.jpg", "f", &[])
            .store
    }

    #[test]
    fn list_empty_reports_info() {
        let s = MemoryStore::empty();
        let result = list(&s, &Query::new()).unwrap();
        assert!(result.messages[0].content.contains("No tags defined"));
    }

    #[test]
    fn create_rejects_duplicate_ignoring_case() {
        let mut s = store();
        let err = create(&mut s, NewTag { name: "BEACH".into(), ..Default::default() }).unwrap_err();
        assert_eq!(err.code(), ErrorCode::TagExists);
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn create_validates_name_and_category() {
        let mut s = store();
        assert_eq!(
            create(&mut s, NewTag { name: " ".into(), ..Default::default() }).unwrap_err().status(),
            400
        );
        let bad_cat = NewTag {
            name: "alps".into(),
            category_id: Some("k9".into()),
            ..Default::default()
        };
        assert_eq!(create(&mut s, bad_cat).unwrap_err().status(), 404);

        let ok = NewTag {
            name: " alps ".into(),
            category_id: Some("k1".into()),
            color: Some("#00f".into()),
        };
        let tag = create(&mut s, ok).unwrap().data;
        assert_eq!(tag.name, "alps");
        assert_eq!(tag.count, 0);
    }

    #[test]
    fn rename_propagates_and_keeps_count() {
        let mut s = store();
        let result = rename(&mut s, "t1", "shore").unwrap();
        assert_eq!(result.data.count, 2);
        assert_eq!(result.data.id, "t1");

        for m in s.media().all() {
            assert!(!m.has_tag("beach"));
        }
        assert!(s.media().get("m1").unwrap().has_tag("shore"));
        assert!(s.media().get("m2").unwrap().has_tag("shore"));
        assert!(!s.media().get("m3").unwrap().has_tag("shore"));
    }

    #[test]
    fn rename_to_existing_name_conflicts() {
        let mut s = store();
        let err = rename(&mut s, "t1", "Sunset").unwrap_err();
        assert_eq!(err.code(), ErrorCode::TagExists);
        assert!(s.media().get("m1").unwrap().has_tag("beach"));
    }

    #[test]
    fn rename_case_only_is_allowed() {
        let mut s = store();
        rename(&mut s, "t1", "Beach").unwrap();
        assert_eq!(s.media().get("m2").unwrap().tags, vec!["Beach"]);
    }

    #[test]
    fn rename_dedupes_stale_copies() {
        let mut s = store();
        s.media_mut()
            .update_where(|m| m.id == "m2", |m| m.tags.push("shore".into()));
        rename(&mut s, "t1", "shore").unwrap();
        assert_eq!(s.media().get("m2").unwrap().tags, vec!["shore"]);
    }

    #[test]
    fn update_with_name_behaves_like_rename() {
        let mut s = store();
        let update_set = TagUpdate {
            name: Some("coast".into()),
            color: Some(Some("#0ea5e9".into())),
            category_id: Some(Some("k1".into())),
        };
        let tag = update(&mut s, "t1", update_set).unwrap().data;
        assert_eq!(tag.name, "coast");
        assert_eq!(tag.category_id.as_deref(), Some("k1"));
        assert!(s.media().get("m2").unwrap().has_tag("coast"));
    }

    #[test]
    fn update_rejects_unknown_category_before_renaming() {
        let mut s = store();
        let update_set = TagUpdate {
            name: Some("coast".into()),
            category_id: Some(Some("k9".into())),
            ..Default::default()
        };
        assert!(update(&mut s, "t1", update_set).is_err());
        assert_eq!(s.tags().get("t1").unwrap().name, "beach");
        assert!(s.media().get("m2").unwrap().has_tag("beach"));
    }

    #[test]
    fn delete_cascades_to_media() {
        let mut s = store();
        let result = delete(&mut s, "t1").unwrap();
        assert_eq!(result.data.affected_media, 2);
        assert!(s.media().all().iter().all(|m| !m.has_tag("beach")));
        assert!(s.media().get("m1").unwrap().has_tag("sunset"));
        assert_eq!(delete(&mut s, "t1").unwrap_err().status(), 404);
    }

    #[test]
    fn find_by_id_or_name() {
        let s = store();
        assert_eq!(find(&s, "t2").unwrap().name, "sunset");
        assert_eq!(find(&s, "SUNSET").unwrap().id, "t2");
        assert!(find(&s, "ghost").is_err());
    }
}
