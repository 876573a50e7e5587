//! Media commands.
//!
//! Media items point at a folder and carry a set of tag names. Every write that
//! changes the tag set also adjusts the affected tags' counts.
//!
//! Deleting an item that any collection still lists is refused with
//! `item_in_use`; remove it from those collections first.

use crate::commands::helpers::{plural, require_name, require_some};
use crate::commands::{BatchOutcome, CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::model::{MediaItem, MediaStatus, MediaType};
use crate::query::{self, Page, Query};
use crate::store::DataStore;
use crate::tags::{apply_tag_diff, dedupe, unknown_names};
use chrono::Utc;

use super::folders::scope_ids;

/// Restricts a media listing to one folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderScope {
    pub folder: String,
    /// Include media of all descendant folders.
    pub recursive: bool,
}

impl FolderScope {
    pub fn recursive(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            recursive: true,
        }
    }

    pub fn direct(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            recursive: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub name: String,
    pub media_type: MediaType,
    pub folder: String,
    pub tags: Vec<String>,
    pub status: MediaStatus,
    pub size: u64,
}

impl NewMedia {
    pub fn new(name: impl Into<String>, media_type: MediaType, folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            media_type,
            folder: folder.into(),
            tags: Vec::new(),
            status: MediaStatus::Draft,
            size: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaUpdate {
    pub name: Option<String>,
    pub media_type: Option<MediaType>,
    pub folder: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<MediaStatus>,
    pub starred: Option<bool>,
    pub favorited: Option<bool>,
    pub size: Option<u64>,
}

impl MediaUpdate {
    pub fn is_empty(&self) -> bool {
        *self == MediaUpdate::default()
    }
}

pub fn list<S: DataStore>(
    store: &S,
    query: &Query,
    scope: Option<&FolderScope>,
) -> Result<CmdResult<Page<MediaItem>>> {
    let page = match scope {
        None => query::run(store.media().all(), query)?,
        Some(scope) => {
            store.folders().require(&scope.folder)?;
            let folders = scope_ids(store, &scope.folder, scope.recursive)?;
            let in_scope: Vec<MediaItem> = store
                .media()
                .all()
                .iter()
                .filter(|m| folders.contains(&m.folder))
                .cloned()
                .collect();
            query::run(&in_scope, query)?
        }
    };
    Ok(CmdResult::new(page))
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<MediaItem>> {
    Ok(CmdResult::new(store.media().require(id)?.clone()))
}

/// Ids of the collections listing `id`.
pub fn usage<S: DataStore>(store: &S, id: &str) -> Vec<String> {
    store
        .collections()
        .all()
        .iter()
        .filter(|c| c.contains(id))
        .map(|c| c.id.clone())
        .collect()
}

fn checked_tags<S: DataStore>(store: &S, mut tags: Vec<String>) -> Result<Vec<String>> {
    dedupe(&mut tags);
    let unknown = unknown_names(store, &tags);
    if !unknown.is_empty() {
        return Err(StashError::invalid_reference(
            ErrorCode::InvalidTags,
            format!("Unknown tag{}: {}", plural(unknown.len()), unknown.join(", ")),
            unknown,
        ));
    }
    Ok(tags)
}

pub fn create<S: DataStore>(store: &mut S, input: NewMedia) -> Result<CmdResult<MediaItem>> {
    let name = require_name(&input.name, "Media")?;
    store.folders().require(&input.folder)?;
    let tags = checked_tags(store, input.tags)?;

    let mut item = MediaItem::new(name, input.media_type, input.folder);
    item.tags = tags;
    item.status = input.status;
    item.size = input.size;

    store.media_mut().insert(item.clone())?;
    apply_tag_diff(store, &[], &item.tags);

    tracing::debug!(id = %item.id, folder = %item.folder, "media created");
    Ok(CmdResult::new(item.clone())
        .with_message(CmdMessage::success(format!("Created '{}'", item.name))))
}

pub fn update<S: DataStore>(store: &mut S, id: &str, update: MediaUpdate) -> Result<CmdResult<MediaItem>> {
    let before = store.media().require(id)?.clone();
    let mut item = before.clone();

    if let Some(raw) = &update.name {
        item.name = require_name(raw, "Media")?;
    }
    if let Some(folder) = update.folder {
        if folder != item.folder {
            store.folders().require(&folder)?;
            item.folder = folder;
        }
    }
    if let Some(tags) = update.tags {
        item.tags = checked_tags(store, tags)?;
    }
    if let Some(media_type) = update.media_type {
        item.media_type = media_type;
    }
    if let Some(status) = update.status {
        item.status = status;
    }
    if let Some(starred) = update.starred {
        item.starred = starred;
    }
    if let Some(favorited) = update.favorited {
        item.favorited = favorited;
    }
    if let Some(size) = update.size {
        item.size = size;
    }

    item.modified = Utc::now();
    store.media_mut().replace(item.clone())?;
    apply_tag_diff(store, &before.tags, &item.tags);

    Ok(CmdResult::new(item.clone())
        .with_message(CmdMessage::success(format!("Updated '{}'", item.name))))
}

/// Flips `starred` and returns the item.
pub fn toggle_starred<S: DataStore>(store: &mut S, id: &str) -> Result<CmdResult<MediaItem>> {
    let starred = !store.media().require(id)?.starred;
    let update_set = MediaUpdate {
        starred: Some(starred),
        ..Default::default()
    };
    let result = update(store, id, update_set)?;
    let verb = if starred { "Starred" } else { "Unstarred" };
    Ok(CmdResult::new(result.data.clone())
        .with_message(CmdMessage::success(format!("{} '{}'", verb, result.data.name))))
}

/// Flips `favorited` and returns the item.
pub fn toggle_favorited<S: DataStore>(store: &mut S, id: &str) -> Result<CmdResult<MediaItem>> {
    let favorited = !store.media().require(id)?.favorited;
    let update_set = MediaUpdate {
        favorited: Some(favorited),
        ..Default::default()
    };
    let result = update(store, id, update_set)?;
    let msg = if favorited {
        format!("Added '{}' to favorites", result.data.name)
    } else {
        format!("Removed '{}' from favorites", result.data.name)
    };
    Ok(CmdResult::new(result.data).with_message(CmdMessage::success(msg)))
}

pub fn delete<S: DataStore>(store: &mut S, id: &str) -> Result<CmdResult<MediaItem>> {
    let item = store.media().require(id)?.clone();

    let holders = usage(store, id);
    if !holders.is_empty() {
        return Err(StashError::conflict(
            ErrorCode::ItemInUse,
            format!(
                "'{}' is used in {} collection{}: {}",
                item.name,
                holders.len(),
                plural(holders.len()),
                holders.join(", ")
            ),
        ));
    }

    store.media_mut().remove(id)?;
    apply_tag_diff(store, &item.tags, &[]);
    store.users_mut().update_where(
        |u| u.recent_files.iter().any(|f| f == id),
        |u| u.recent_files.retain(|f| f != id),
    );

    tracing::debug!(id, "media deleted");
    Ok(CmdResult::new(item.clone())
        .with_message(CmdMessage::success(format!("Deleted '{}'", item.name))))
}

/// Applies the same update to every id, independently.
pub fn batch_update<S: DataStore>(
    store: &mut S,
    ids: &[String],
    changes: &MediaUpdate,
) -> Result<CmdResult<BatchOutcome>> {
    require_some(ids, "media ids")?;
    if changes.is_empty() {
        return Err(StashError::invalid("No changes specified"));
    }

    let mut outcome = BatchOutcome::default();
    for id in ids {
        outcome.record(id, update(store, id, changes.clone()).map(|_| ()));
    }
    Ok(batch_result(outcome, "Updated"))
}

/// Deletes every id independently; in-use or missing items are reported, not fatal.
pub fn batch_delete<S: DataStore>(store: &mut S, ids: &[String]) -> Result<CmdResult<BatchOutcome>> {
    require_some(ids, "media ids")?;

    let mut outcome = BatchOutcome::default();
    for id in ids {
        outcome.record(id, delete(store, id).map(|_| ()));
    }
    Ok(batch_result(outcome, "Deleted"))
}

fn batch_result(outcome: BatchOutcome, verb: &str) -> CmdResult<BatchOutcome> {
    let ok = outcome.succeeded.len();
    let failed = outcome.failed.len();
    let mut result = CmdResult::new(outcome);
    result.add_message(CmdMessage::success(format!(
        "{} {} media item{}",
        verb,
        ok,
        plural(ok)
    )));
    if failed > 0 {
        result.add_message(CmdMessage::warning(format!(
            "{} item{} failed",
            failed,
            plural(failed)
        )));
    }
    result
}
