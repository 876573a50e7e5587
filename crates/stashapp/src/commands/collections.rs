//! Collection commands.
//!
//! Collections group media items by id, can be shared with users and nest
//! through `parentId`. Adding items marks those media as `used`.

use crate::commands::helpers::{plural, require_all, require_name, require_some, subtract, union_into};
use crate::commands::users::find_by_email;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::hierarchy::{self, TreeNode};
use crate::model::{Collection, COLLECTION_PALETTE};
use crate::query::{self, Page, Query};
use crate::store::DataStore;
use chrono::Utc;

#[derive(Debug, Clone, Default)]
pub struct NewCollection {
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_by: String,
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub color: Option<String>,
    pub parent_id: Option<Option<String>>,
}

pub fn list<S: DataStore>(store: &S, query: &Query) -> Result<CmdResult<Page<Collection>>> {
    Ok(CmdResult::new(query::run(store.collections().all(), query)?))
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<Collection>> {
    Ok(CmdResult::new(store.collections().require(id)?.clone()))
}

pub fn tree<S: DataStore>(store: &S) -> Result<CmdResult<Vec<TreeNode<Collection>>>> {
    Ok(CmdResult::new(hierarchy::build_forest(store.collections().all())?))
}

/// Collections created by or shared with `user_id`.
pub fn visible_to<S: DataStore>(store: &S, user_id: &str, query: &Query) -> Result<CmdResult<Page<Collection>>> {
    store.users().require(user_id)?;
    let rows: Vec<Collection> = store
        .collections()
        .all()
        .iter()
        .filter(|c| c.created_by == user_id || c.shared_with.iter().any(|u| u == user_id))
        .cloned()
        .collect();
    Ok(CmdResult::new(query::run(&rows, query)?))
}

fn palette_color(existing: usize) -> String {
    COLLECTION_PALETTE[existing % COLLECTION_PALETTE.len()].to_string()
}

/// Creates a collection.
///
/// A blank `created_by` falls back to the user whose email is `default_owner`,
/// or stays empty when no such user exists. A given `created_by` must resolve.
pub fn create<S: DataStore>(
    store: &mut S,
    input: NewCollection,
    default_owner: &str,
) -> Result<CmdResult<Collection>> {
    let name = require_name(&input.name, "Collection")?;
    let owner = input.created_by.trim().to_string();
    let owner = if owner.is_empty() {
        find_by_email(store, default_owner).map(|u| u.id).unwrap_or_default()
    } else {
        require_all(store.users(), std::slice::from_ref(&owner), ErrorCode::InvalidUserIds)?;
        owner
    };
    if let Some(parent) = &input.parent_id {
        store.collections().require(parent)?;
    }

    let color = input
        .color
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| palette_color(store.collections().len()));

    let mut collection = Collection::new(name, color, owner);
    collection.description = input.description;
    collection.parent_id = input.parent_id;
    store.collections_mut().insert(collection.clone())?;

    tracing::debug!(id = %collection.id, "collection created");
    Ok(CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Created collection '{}'",
        collection.name
    ))))
}

pub fn update<S: DataStore>(store: &mut S, id: &str, update: CollectionUpdate) -> Result<CmdResult<Collection>> {
    let mut collection = store.collections().require(id)?.clone();

    if let Some(raw) = &update.name {
        collection.name = require_name(raw, "Collection")?;
    }
    if let Some(description) = update.description {
        collection.description = description;
    }
    if let Some(color) = update.color {
        collection.color = color;
    }
    if let Some(parent) = update.parent_id {
        if let Some(parent_id) = &parent {
            store.collections().require(parent_id)?;
            if hierarchy::is_self_or_descendant(store.collections().all(), id, parent_id)? {
                return Err(StashError::invalid(format!(
                    "Collection '{}' cannot be nested inside itself or its own subtree",
                    collection.name
                )));
            }
        }
        collection.parent_id = parent;
    }

    collection.modified = Utc::now();
    store.collections_mut().replace(collection.clone())?;
    Ok(CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Updated collection '{}'",
        collection.name
    ))))
}

/// Deletes a collection. Its child collections move up to its parent.
pub fn delete<S: DataStore>(store: &mut S, id: &str) -> Result<CmdResult<Collection>> {
    let collection = store.collections_mut().remove(id)?;
    let new_parent = collection.parent_id.clone();
    let now = Utc::now();
    let moved = store.collections_mut().update_where(
        |c| c.parent_id.as_deref() == Some(id),
        |c| {
            c.parent_id = new_parent.clone();
            c.modified = now;
        },
    );

    tracing::debug!(id, moved, "collection deleted");
    let mut result = CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Deleted collection '{}'",
        collection.name
    )));
    if moved > 0 {
        result.add_message(CmdMessage::info(format!(
            "Moved {} child collection{} up one level",
            moved,
            plural(moved)
        )));
    }
    Ok(result)
}

pub fn add_items<S: DataStore>(store: &mut S, id: &str, media_ids: &[String]) -> Result<CmdResult<Collection>> {
    require_some(media_ids, "media ids")?;
    let mut collection = store.collections().require(id)?.clone();
    require_all(store.media(), media_ids, ErrorCode::InvalidMediaIds)?;

    let added = union_into(&mut collection.items, media_ids);
    collection.modified = Utc::now();
    store.collections_mut().replace(collection.clone())?;
    store
        .media_mut()
        .update_where(|m| media_ids.contains(&m.id), |m| m.used = true);

    Ok(CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Added {} item{} to '{}'",
        added,
        plural(added),
        collection.name
    ))))
}

pub fn remove_items<S: DataStore>(store: &mut S, id: &str, media_ids: &[String]) -> Result<CmdResult<Collection>> {
    require_some(media_ids, "media ids")?;
    let mut collection = store.collections().require(id)?.clone();

    let removed = subtract(&mut collection.items, media_ids);
    collection.modified = Utc::now();
    store.collections_mut().replace(collection.clone())?;

    Ok(CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Removed {} item{} from '{}'",
        removed,
        plural(removed),
        collection.name
    ))))
}

pub fn share<S: DataStore>(store: &mut S, id: &str, user_ids: &[String]) -> Result<CmdResult<Collection>> {
    require_some(user_ids, "user ids")?;
    let mut collection = store.collections().require(id)?.clone();
    require_all(store.users(), user_ids, ErrorCode::InvalidUserIds)?;

    let added = union_into(&mut collection.shared_with, user_ids);
    collection.is_shared = true;
    collection.modified = Utc::now();
    store.collections_mut().replace(collection.clone())?;

    Ok(CmdResult::new(collection.clone()).with_message(CmdMessage::success(format!(
        "Shared '{}' with {} more user{}",
        collection.name,
        added,
        plural(added)
    ))))
}

pub fn unshare<S: DataStore>(store: &mut S, id: &str, user_ids: &[String]) -> Result<CmdResult<Collection>> {
    require_some(user_ids, "user ids")?;
    let mut collection = store.collections().require(id)?.clone();

    subtract(&mut collection.shared_with, user_ids);
    collection.is_shared = !collection.shared_with.is_empty();
    collection.modified = Utc::now();
    store.collections_mut().replace(collection.clone())?;

    let msg = if collection.is_shared {
        format!(
            "'{}' is still shared with {} user{}",
            collection.name,
            collection.shared_with.len(),
            plural(collection.shared_with.len())
        )
    } else {
        format!("'{}' is no longer shared", collection.name)
    };
    Ok(CmdResult::new(collection).with_message(CmdMessage::success(msg)))
}
