//! Tag category commands.

use crate::commands::helpers::{plural, require_name};
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::model::{Tag, TagCategory};
use crate::query::{self, Page, Query};
use crate::store::DataStore;

#[derive(Debug, Clone, Default)]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

pub fn list<S: DataStore>(store: &S, query: &Query) -> Result<CmdResult<Page<TagCategory>>> {
    Ok(CmdResult::new(query::run(store.categories().all(), query)?))
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<TagCategory>> {
    Ok(CmdResult::new(store.categories().require(id)?.clone()))
}

/// Tags assigned to category `id`.
pub fn tags_in<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<Vec<Tag>>> {
    store.categories().require(id)?;
    let tags = store
        .tags()
        .all()
        .iter()
        .filter(|t| t.category_id.as_deref() == Some(id))
        .cloned()
        .collect();
    Ok(CmdResult::new(tags))
}

fn ensure_unique<S: DataStore>(store: &S, name: &str, except: Option<&str>) -> Result<()> {
    let clash = store
        .categories()
        .all()
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(name) && Some(c.id.as_str()) != except);
    match clash {
        Some(existing) => Err(StashError::conflict(
            ErrorCode::CategoryExists,
            format!("Category '{}' already exists", existing.name),
        )),
        None => Ok(()),
    }
}

pub fn create<S: DataStore>(
    store: &mut S,
    name: &str,
    description: Option<String>,
) -> Result<CmdResult<TagCategory>> {
    let name = require_name(name, "Category")?;
    ensure_unique(store, &name, None)?;

    let category = TagCategory::new(name, description);
    store.categories_mut().insert(category.clone())?;
    Ok(CmdResult::new(category.clone()).with_message(CmdMessage::success(format!(
        "Created category '{}'",
        category.name
    ))))
}

pub fn update<S: DataStore>(store: &mut S, id: &str, update: CategoryUpdate) -> Result<CmdResult<TagCategory>> {
    let mut category = store.categories().require(id)?.clone();

    if let Some(raw) = &update.name {
        let name = require_name(raw, "Category")?;
        ensure_unique(store, &name, Some(id))?;
        category.name = name;
    }
    if let Some(description) = update.description {
        category.description = description;
    }

    store.categories_mut().replace(category.clone())?;
    Ok(CmdResult::new(category.clone()).with_message(CmdMessage::success(format!(
        "Updated category '{}'",
        category.name
    ))))
}

/// Deletes a category. Tags still pointing at it block the delete unless
/// `force`, in which case they are detached.
pub fn delete<S: DataStore>(store: &mut S, id: &str, force: bool) -> Result<CmdResult<TagCategory>> {
    let category = store.categories().require(id)?.clone();
    let referencing = store
        .tags()
        .all()
        .iter()
        .filter(|t| t.category_id.as_deref() == Some(id))
        .count();

    if referencing > 0 && !force {
        return Err(StashError::conflict(
            ErrorCode::CategoryHasTags,
            format!(
                "Category '{}' is used by {} tag{}",
                category.name,
                referencing,
                plural(referencing)
            ),
        ));
    }

    let detached = store
        .tags_mut()
        .update_where(|t| t.category_id.as_deref() == Some(id), |t| t.category_id = None);
    store.categories_mut().remove(id)?;

    let mut result = CmdResult::new(category.clone()).with_message(CmdMessage::success(format!(
        "Deleted category '{}'",
        category.name
    )));
    if detached > 0 {
        result.add_message(CmdMessage::info(format!(
            "Detached {} tag{}",
            detached,
            plural(detached)
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
        let mut s = StoreFixture::new()
            .with_category("k1", "Places")
            .with_category("k2", "People")
            .with_tag("t1", "beach")
            .store;
        s.tags_mut()
            .update_where(|t| t.id == "t1", |t| t.category_id = Some("k1".into()));
        s
    }

    #[test]
    fn create_rejects_duplicate_name() {
        let mut s = store();
        let err = create(&mut s, "places", None).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CategoryExists);

        let cat = create(&mut s, "Moods", Some("How it feels".into())).unwrap().data;
        assert!(cat.id.starts_with("cat-"));
    }

    #[test]
    fn update_allows_keeping_own_name() {
        let mut s = store();
        let update_set = CategoryUpdate {
            name: Some("PLACES".into()),
            description: Some(Some("Locations".into())),
        };
        let cat = update(&mut s, "k1", update_set).unwrap().data;
        assert_eq!(cat.name, "PLACES");

        let clash = CategoryUpdate { name: Some("people".into()), ..Default::default() };
        assert_eq!(update(&mut s, "k1", clash).unwrap_err().code(), ErrorCode::CategoryExists);
    }

    #[test]
    fn delete_with_tags_requires_force() {
        let mut s = store();
        let err = delete(&mut s, "k1", false).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CategoryHasTags);
        assert!(s.categories().contains("k1"));

        delete(&mut s, "k1", true).unwrap();
        assert!(!s.categories().contains("k1"));
        assert!(s.tags().get("t1").unwrap().category_id.is_none());
    }

    #[test]
    fn delete_unused_category() {
        let mut s = store();
        let result = delete(&mut s, "k2", false).unwrap();
        assert_eq!(result.messages.len(), 1);
    }

    #[test]
    fn tags_in_lists_members() {
        let s = store();
        assert_eq!(tags_in(&s, "k1").unwrap().data.len(), 1);
        assert!(tags_in(&s, "k2").unwrap().data.is_empty());
    }
}
