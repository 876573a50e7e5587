//! Folder commands.
//!
//! Folders form a forest through their `parent` pointer. Every folder carries a
//! derived `path` (ancestor names plus its own, joined by the configured
//! separator), so renames and moves rewrite the paths of the whole subtree.
//!
//! - `list` / `get` / `tree` / `breadcrumbs`: reads
//! - `create`: parent must exist
//! - `update`: rename and/or move; an impossible move is dropped with a warning
//! - `delete`: guarded by children and media unless `force`

use crate::commands::helpers::{plural, require_name};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::hierarchy::{self, TreeNode};
use crate::model::Folder;
use crate::query::{self, Page, Query};
use crate::store::DataStore;
use chrono::Utc;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct NewFolder {
    pub name: String,
    pub parent: Option<String>,
    pub color: Option<String>,
}

/// Partial update. `None` leaves a field alone; `Some(None)` clears a
/// nullable field (for `parent`, moves the folder to the root).
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub parent: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderDeletion {
    /// The folder itself followed by its removed descendants.
    pub removed: Vec<String>,
    /// Number of media items moved to the deleted folder's parent.
    pub reassigned_media: usize,
    pub reassigned_to: Option<String>,
}

pub fn list<S: DataStore>(store: &S, query: &Query) -> Result<CmdResult<Page<Folder>>> {
    let page = query::run(store.folders().all(), query)?;
    Ok(CmdResult::new(page))
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<Folder>> {
    Ok(CmdResult::new(store.folders().require(id)?.clone()))
}

pub fn tree<S: DataStore>(store: &S) -> Result<CmdResult<Vec<TreeNode<Folder>>>> {
    let forest = hierarchy::build_forest(store.folders().all())?;
    Ok(CmdResult::new(forest))
}

/// The chain from the root down to `id`, inclusive.
pub fn breadcrumbs<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<Vec<Folder>>> {
    let folder = store.folders().require(id)?.clone();
    let mut chain: Vec<Folder> = hierarchy::ancestor_ids(store.folders().all(), id)?
        .iter()
        .rev()
        .filter_map(|a| store.folders().get(a).cloned())
        .collect();
    chain.push(folder);
    Ok(CmdResult::new(chain))
}

/// Number of media items in folder `id`, including its subtree when `recursive`.
pub fn media_count<S: DataStore>(store: &S, id: &str, recursive: bool) -> Result<usize> {
    store.folders().require(id)?;
    let scope = scope_ids(store, id, recursive)?;
    Ok(store
        .media()
        .all()
        .iter()
        .filter(|m| scope.contains(&m.folder))
        .count())
}

/// `id` plus, when `recursive`, all of its transitive descendants.
pub fn scope_ids<S: DataStore>(store: &S, id: &str, recursive: bool) -> Result<Vec<String>> {
    let mut ids = vec![id.to_string()];
    if recursive {
        ids.extend(hierarchy::descendant_ids(store.folders().all(), id)?);
    }
    Ok(ids)
}

pub fn create<S: DataStore>(store: &mut S, input: NewFolder, sep: &str) -> Result<CmdResult<Folder>> {
    let name = require_name(&input.name, "Folder")?;

    let path = match &input.parent {
        Some(parent_id) => {
            let parent = store.folders().require(parent_id)?;
            format!("{}{}{}", parent.path, sep, name)
        }
        None => name.clone(),
    };

    let mut folder = Folder::new(name, input.parent, path);
    folder.color = input.color;
    store.folders_mut().insert(folder.clone())?;

    tracing::debug!(id = %folder.id, path = %folder.path, "folder created");
    Ok(CmdResult::new(folder.clone())
        .with_message(CmdMessage::success(format!("Created folder '{}'", folder.path))))
}

pub fn update<S: DataStore>(
    store: &mut S,
    id: &str,
    update: FolderUpdate,
    sep: &str,
) -> Result<CmdResult<Folder>> {
    let mut folder = store.folders().require(id)?.clone();
    let mut warnings = Vec::new();

    if let Some(raw) = &update.name {
        folder.name = require_name(raw, "Folder")?;
    }

    if let Some(new_parent) = update.parent {
        match new_parent {
            None => folder.parent = None,
            Some(parent_id) => match check_reparent(store, id, &parent_id)? {
                None => folder.parent = Some(parent_id),
                Some(reason) => {
                    tracing::warn!(id, parent = %parent_id, reason, "ignoring folder move");
                    warnings.push(CmdMessage::warning(format!(
                        "Parent not changed: {}",
                        reason
                    )));
                }
            },
        }
    }

    if let Some(color) = update.color {
        folder.color = color;
    }

    folder.modified = Utc::now();
    store.folders_mut().replace(folder)?;
    let touched = recompute_paths(store, id, sep)?;

    let folder = store.folders().require(id)?.clone();
    let mut result = CmdResult::new(folder.clone())
        .with_message(CmdMessage::success(format!("Updated folder '{}'", folder.path)));
    if touched > 1 {
        result.add_message(CmdMessage::info(format!(
            "Rewrote path of {} subfolder{}",
            touched - 1,
            plural(touched - 1)
        )));
    }
    result.messages.extend(warnings);
    Ok(result)
}

/// Why moving `id` under `parent_id` is impossible, or `None` if it's fine.
fn check_reparent<S: DataStore>(store: &S, id: &str, parent_id: &str) -> Result<Option<&'static str>> {
    if !store.folders().contains(parent_id) {
        return Ok(Some("new parent does not exist"));
    }
    if hierarchy::is_self_or_descendant(store.folders().all(), id, parent_id)? {
        return Ok(Some("a folder cannot move into itself or its own subtree"));
    }
    Ok(None)
}

/// Recomputes `path` for `id` and every descendant. Returns the number of
/// folders whose path was rewritten.
pub fn recompute_paths<S: DataStore>(store: &mut S, id: &str, sep: &str) -> Result<usize> {
    let mut targets = vec![id.to_string()];
    targets.extend(hierarchy::descendant_ids(store.folders().all(), id)?);

    let mut rewritten = 0;
    for target in &targets {
        let path = path_of(store, target, sep)?;
        rewritten += store
            .folders_mut()
            .update_where(|f| &f.id == target && f.path != path, |f| f.path = path.clone());
    }
    Ok(rewritten)
}

/// Recomputes every folder's path, e.g. after the separator changed.
pub fn rebuild_all_paths<S: DataStore>(store: &mut S, sep: &str) -> Result<usize> {
    let ids: Vec<String> = store.folders().all().iter().map(|f| f.id.clone()).collect();
    let mut rewritten = 0;
    for id in &ids {
        let path = path_of(store, id, sep)?;
        rewritten += store
            .folders_mut()
            .update_where(|f| &f.id == id && f.path != path, |f| f.path = path.clone());
    }
    Ok(rewritten)
}

fn path_of<S: DataStore>(store: &S, id: &str, sep: &str) -> Result<String> {
    let folders = store.folders();
    let mut names: Vec<&str> = hierarchy::ancestor_ids(folders.all(), id)?
        .iter()
        .rev()
        .filter_map(|a| folders.get(a).map(|f| f.name.as_str()))
        .collect();
    names.push(folders.require(id)?.name.as_str());
    Ok(names.join(sep))
}

/// Deletes a folder.
///
/// Without `force`, the folder must have no subfolders and no media. With
/// `force`, the whole subtree is removed and media from it move to the deleted
/// folder's parent. A root folder holding media cannot be force-deleted since
/// nothing would be left to receive them.
pub fn delete<S: DataStore>(store: &mut S, id: &str, force: bool) -> Result<CmdResult<FolderDeletion>> {
    let folder = store.folders().require(id)?.clone();
    let descendants = hierarchy::descendant_ids(store.folders().all(), id)?;

    let mut subtree = vec![id.to_string()];
    subtree.extend(descendants.iter().cloned());
    let media_in_subtree: Vec<String> = store
        .media()
        .all()
        .iter()
        .filter(|m| subtree.contains(&m.folder))
        .map(|m| m.id.clone())
        .collect();

    if !force {
        if !descendants.is_empty() {
            return Err(StashError::conflict(
                ErrorCode::FolderHasChildren,
                format!(
                    "Folder '{}' has {} subfolder{}; use force to delete them too",
                    folder.name,
                    descendants.len(),
                    plural(descendants.len())
                ),
            ));
        }
        if !media_in_subtree.is_empty() {
            return Err(StashError::conflict(
                ErrorCode::FolderHasMedia,
                format!(
                    "Folder '{}' contains {} media item{}",
                    folder.name,
                    media_in_subtree.len(),
                    plural(media_in_subtree.len())
                ),
            ));
        }
    }

    if folder.parent.is_none() && !media_in_subtree.is_empty() {
        return Err(StashError::conflict(
            ErrorCode::FolderHasMedia,
            format!(
                "Root folder '{}' still holds media and has no parent to receive it",
                folder.name
            ),
        ));
    }

    let reassigned = match &folder.parent {
        Some(parent) if !media_in_subtree.is_empty() => {
            let now = Utc::now();
            store.media_mut().update_where(
                |m| media_in_subtree.contains(&m.id),
                |m| {
                    m.folder = parent.clone();
                    m.modified = now;
                },
            )
        }
        _ => 0,
    };

    store.folders_mut().remove_where(|f| subtree.contains(&f.id));
    store.users_mut().update_where(
        |u| u.recent_folders.iter().any(|f| subtree.contains(f)),
        |u| u.recent_folders.retain(|f| !subtree.contains(f)),
    );

    tracing::info!(
        id,
        removed = subtree.len(),
        reassigned,
        "folder deleted"
    );

    let mut result = CmdResult::new(FolderDeletion {
        removed: subtree.clone(),
        reassigned_media: reassigned,
        reassigned_to: folder.parent.clone().filter(|_| reassigned > 0),
    })
    .with_message(CmdMessage::success(format!("Deleted folder '{}'", folder.path)));
    if subtree.len() > 1 {
        result.add_message(CmdMessage::info(format!(
            "Removed {} subfolder{}",
            subtree.len() - 1,
            plural(subtree.len() - 1)
        )));
    }
    if reassigned > 0 {
        result.add_message(CmdMessage::info(format!(
            "Moved {} media item{} to the parent folder",
            reassigned,
            plural(reassigned)
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
            .with_folder("root", "Root", None)
            .with_folder("a", "A", Some("root"))
            .with_folder("a1", "A1", Some("a"))
            .with_folder("b", "B", Some("root"))
            .with_folder("lonely", "Lonely", None)
            .store
    }

    #[test]
    fn create_derives_path_from_parent() {
        let mut s = store();
        let input = NewFolder {
            name: " Raw ".into(),
            parent: Some("a1".into()),
            color: None,
        };
        let folder = create(&mut s, input, "/").unwrap().data;
        assert_eq!(folder.name, "Raw");
        assert_eq!(folder.path, "Root/A/A1/Raw");
        assert!(folder.id.starts_with("fld-"));
    }

    #[test]
    fn create_root_folder_path_is_name() {
        let mut s = store();
        let folder = create(&mut s, NewFolder { name: "Top".into(), ..Default::default() }, "/")
            .unwrap()
            .data;
        assert_eq!(folder.path, "Top");
        assert!(folder.parent.is_none());
    }

    #[test]
    fn create_rejects_blank_name_and_missing_parent() {
        let mut s = store();
        let blank = NewFolder { name: "  ".into(), ..Default::default() };
        assert_eq!(create(&mut s, blank, "/").unwrap_err().status(), 400);

        let orphan = NewFolder {
            name: "x".into(),
            parent: Some("nope".into()),
            color: None,
        };
        assert_eq!(create(&mut s, orphan, "/").unwrap_err().status(), 404);
        assert_eq!(s.folders().len(), 5);
    }

    #[test]
    fn rename_rewrites_descendant_paths() {
        let mut s = store();
        let update = FolderUpdate { name: Some("Alpha".into()), ..Default::default() };
        let result = update_folder(&mut s, "a", update);
        assert_eq!(result.data.path, "Root/Alpha");
        assert_eq!(s.folders().get("a1").unwrap().path, "Root/Alpha/A1");
        assert!(s.folders().get("a").unwrap().modified >= s.folders().get("a").unwrap().created);
    }

    #[test]
    fn move_rewrites_paths() {
        let mut s = store();
        let update = FolderUpdate { parent: Some(Some("b".into())), ..Default::default() };
        update_folder(&mut s, "a", update);
        assert_eq!(s.folders().get("a").unwrap().parent.as_deref(), Some("b"));
        assert_eq!(s.folders().get("a1").unwrap().path, "Root/B/A/A1");
    }

    #[test]
    fn move_to_root() {
        let mut s = store();
        let update = FolderUpdate { parent: Some(None), ..Default::default() };
        update_folder(&mut s, "a", update);
        assert_eq!(s.folders().get("a1").unwrap().path, "A/A1");
    }

    #[test]
    fn move_into_own_subtree_is_dropped() {
        let mut s = store();
        let update = FolderUpdate {
            name: Some("Renamed".into()),
            parent: Some(Some("a1".into())),
            ..Default::default()
        };
        let result = update_folder(&mut s, "a", update);

        assert_eq!(result.data.parent.as_deref(), Some("root"));
        assert_eq!(result.data.name, "Renamed");
        assert!(result
            .messages
            .iter()
            .any(|m| m.level == crate::commands::MessageLevel::Warning));
        assert!(hierarchy::build_forest(s.folders().all()).is_ok());
    }

    #[test]
    fn move_onto_self_or_missing_parent_is_dropped() {
        let mut s = store();
        for target in ["a", "ghost"] {
            let update = FolderUpdate { parent: Some(Some(target.into())), ..Default::default() };
            let result = update_folder(&mut s, "a", update);
            assert_eq!(result.data.parent.as_deref(), Some("root"));
        }
    }

    #[test]
    fn delete_with_children_requires_force() {
        let mut s = store();
        let err = delete(&mut s, "a", false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FolderHasChildren);
        assert!(s.folders().contains("a"));

        let result = delete(&mut s, "a", true).unwrap();
        assert_eq!(result.data.removed, vec!["a", "a1"]);
        assert!(!s.folders().contains("a"));
        assert!(!s.folders().contains("a1"));
        assert!(s.folders().contains("b"));
    }

    #[test]
    fn delete_with_media_requires_force() {
        let mut s = StoreFixture::new()
            .with_folder("root", "Root", None)
            .with_folder("leaf", "Leaf", Some("root"))
            .with_media("m1", "a.jpg", "leaf", &[])
            .store;

        let err = delete(&mut s, "leaf", false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FolderHasMedia);
        assert_eq!(err.status(), 409);
    }

    #[test]
    fn force_delete_reassigns_media_to_parent() {
        let mut s = StoreFixture::new()
            .with_folder("root", "Root", None)
            .with_folder("a", "A", Some("root"))
            .with_folder("a1", "A1", Some("a"))
            .with_media("m1", "x.jpg", "a", &[])
            .with_media("m2", "y.jpg", "a1", &[])
            .store;

        let result = delete(&mut s, "a", true).unwrap().data;
        assert_eq!(result.reassigned_media, 2);
        assert_eq!(result.reassigned_to.as_deref(), Some("root"));
        assert!(s.media().all().iter().all(|m| m.folder == "root"));
    }

    #[test]
    fn force_delete_of_root_with_media_is_rejected() {
        let mut s = StoreFixture::new()
            .with_folder("root", "Root", None)
            .with_folder("a", "A", Some("root"))
            .with_media("m1", "x.jpg", "a", &[])
            .store;

        let err = delete(&mut s, "root", true).unwrap_err();
        assert_eq!(err.code(), ErrorCode::FolderHasMedia);
        assert_eq!(s.folders().len(), 2);
    }

    #[test]
    fn delete_empty_folder() {
        let mut s = store();
        let result = delete(&mut s, "lonely", false).unwrap();
        assert_eq!(result.data.reassigned_media, 0);
        assert!(result.data.reassigned_to.is_none());
        assert_eq!(delete(&mut s, "lonely", false).unwrap_err().status(), 404);
    }

    #[test]
    fn delete_prunes_recent_folders() {
        let mut s = StoreFixture::new()
            .with_folder("root", "Root", None)
            .with_folder("a", "A", Some("root"))
            .with_user("u1", "Ann", "ann@x.io")
            .store;
        s.users_mut()
            .update_where(|_| true, |u| u.recent_folders = vec!["a".into(), "root".into()]);

        delete(&mut s, "a", false).unwrap();
        assert_eq!(s.users().get("u1").unwrap().recent_folders, vec!["root"]);
    }

    #[test]
    fn breadcrumbs_run_root_first() {
        let s = store();
        let chain = breadcrumbs(&s, "a1").unwrap().data;
        let names: Vec<_> = chain.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Root", "A", "A1"]);
    }

    #[test]
    fn tree_nests_folders() {
        let s = store();
        let forest = tree(&s).unwrap().data;
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[0].size(), 4);
    }

    #[test]
    fn rebuild_all_paths_uses_new_separator() {
        let mut s = store();
        let n = rebuild_all_paths(&mut s, " > ").unwrap();
        assert_eq!(n, 3);
        assert_eq!(s.folders().get("a1").unwrap().path, "Root > A > A1");
    }

    #[test]
    fn media_count_is_recursive_by_default() {
        let s = StoreFixture::new()
            .with_folder("root", "Root", None)
            .with_folder("a", "A", Some("root"))
            .with_media("m1", "x.jpg", "root", &[])
            .with_media("m2", "y.jpg", "a", &[])
            .store;
        assert_eq!(media_count(&s, "root", true).unwrap(), 2);
        assert_eq!(media_count(&s, "root", false).unwrap(), 1);
    }

    fn update_folder(s: &mut MemoryStore, id: &str, u: FolderUpdate) -> CmdResult<Folder> {
        update(s, id, u, "/").unwrap()
    }
}
