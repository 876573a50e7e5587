//! User commands: profile edits, preferences and recent lists.

use crate::commands::helpers::require_name;
use crate::commands::{CmdMessage, CmdResult};
use crate::error::{ErrorCode, Result, StashError};
use crate::model::{merge_preferences, push_recent, Folder, MediaItem, Preferences, Record, User, UserRole};
use crate::query::{self, Page, Query};
use crate::store::DataStore;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
}

/// A user's recent lists, resolved to records. Entries that no longer resolve
/// are skipped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentItems {
    pub folders: Vec<Folder>,
    pub files: Vec<MediaItem>,
}

pub fn list<S: DataStore>(store: &S, query: &Query) -> Result<CmdResult<Page<User>>> {
    Ok(CmdResult::new(query::run(store.users().all(), query)?))
}

pub fn get<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<User>> {
    Ok(CmdResult::new(store.users().require(id)?.clone()))
}

pub fn find_by_email<S: DataStore>(store: &S, email: &str) -> Option<User> {
    let email = email.trim();
    store
        .users()
        .all()
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .cloned()
}

pub fn update<S: DataStore>(store: &mut S, id: &str, update: UserUpdate) -> Result<CmdResult<User>> {
    let mut user = store.users().require(id)?.clone();

    if let Some(raw) = &update.name {
        user.name = require_name(raw, "User")?;
    }
    if let Some(raw) = &update.email {
        let email = raw.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(StashError::invalid(format!("'{}' is not an email address", raw)));
        }
        if let Some(other) = find_by_email(store, email).filter(|u| u.id != id) {
            return Err(StashError::conflict(
                ErrorCode::EmailExists,
                format!("Email '{}' is already used by {}", email, other.name),
            ));
        }
        user.email = email.to_string();
    }
    if let Some(role) = update.role {
        user.role = role;
    }

    store.users_mut().replace(user.clone())?;
    Ok(CmdResult::new(user.clone()).with_message(CmdMessage::success(format!("Updated user '{}'", user.name))))
}

/// Deep-merges `patch` into the user's preferences.
pub fn update_preferences<S: DataStore>(
    store: &mut S,
    id: &str,
    patch: &serde_json::Value,
) -> Result<CmdResult<Preferences>> {
    let patch: &Preferences = patch
        .as_object()
        .ok_or_else(|| StashError::invalid("Preferences must be a JSON object"))?;

    let mut user = store.users().require(id)?.clone();
    merge_preferences(&mut user.preferences, patch);
    store.users_mut().replace(user.clone())?;

    Ok(CmdResult::new(user.preferences).with_message(CmdMessage::success("Preferences saved")))
}

pub fn record_recent_folder<S: DataStore>(store: &mut S, id: &str, folder_id: &str) -> Result<CmdResult<User>> {
    store.folders().require(folder_id)?;
    record_recent(store, id, |u| push_recent(&mut u.recent_folders, folder_id))
}

pub fn record_recent_file<S: DataStore>(store: &mut S, id: &str, media_id: &str) -> Result<CmdResult<User>> {
    store.media().require(media_id)?;
    record_recent(store, id, |u| push_recent(&mut u.recent_files, media_id))
}

fn record_recent<S: DataStore>(store: &mut S, id: &str, apply: impl FnOnce(&mut User)) -> Result<CmdResult<User>> {
    let mut user = store.users().require(id)?.clone();
    apply(&mut user);
    store.users_mut().replace(user.clone())?;
    Ok(CmdResult::new(user))
}

pub fn recent<S: DataStore>(store: &S, id: &str) -> Result<CmdResult<RecentItems>> {
    let user = store.users().require(id)?;
    let folders = resolve(store.folders().all(), &user.recent_folders);
    let files = resolve(store.media().all(), &user.recent_files);
    Ok(CmdResult::new(RecentItems { folders, files }))
}

fn resolve<T: Record>(rows: &[T], ids: &[String]) -> Vec<T> {
    ids.iter()
        .filter_map(|id| rows.iter().find(|r| r.id() == id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RECENT_CAPACITY;
    use crate::store::memory::fixtures::StoreFixture;
    use crate::store::memory::MemoryStore;
    use serde_json::json;

    fn store() -> MemoryStore {
        StoreFixture::new()
            .with_folder("f1", "One", None)
            .with_folder("f2", "Two", None)
            .with_media("m1", "a.jpg", "f1", &[])
            .with_user("u1", "Ann", "ann@x.io")
            .with_user("u2", "Ben", "ben@x.io")
            .store
    }

    #[test]
    fn update_checks_email_uniqueness() {
        let mut s = store();
        let taken = UserUpdate { email: Some("BEN@x.io".into()), ..Default::default() };
        let err = update(&mut s, "u1", taken).unwrap_err();
        assert_eq!(err.status(), 409);
        assert_eq!(err.code(), ErrorCode::EmailExists);
        assert_eq!(s.users().get("u1").unwrap().email, "ann@x.io");

        let own = UserUpdate { email: Some("Ann@X.io".into()), ..Default::default() };
        assert_eq!(update(&mut s, "u1", own).unwrap().data.email, "Ann@X.io");

        let bad = UserUpdate { email: Some("  ".into()), ..Default::default() };
        assert!(update(&mut s, "u1", bad).is_err());
    }

    #[test]
    fn update_changes_role_and_name() {
        let mut s = store();
        let changes = UserUpdate {
            name: Some(" Annie ".into()),
            role: Some(UserRole::Admin),
            ..Default::default()
        };
        let user = update(&mut s, "u1", changes).unwrap().data;
        assert_eq!(user.name, "Annie");
        assert_eq!(user.role, UserRole::Admin);
    }

    #[test]
    fn preferences_merge_deeply() {
        let mut s = store();
        update_preferences(&mut s, "u1", &json!({"grid": {"size": 3}, "theme": "dark"})).unwrap();
        let prefs = update_preferences(&mut s, "u1", &json!({"grid": {"labels": false}}))
            .unwrap()
            .data;
        assert_eq!(prefs["grid"]["size"], 3);
        assert_eq!(prefs["grid"]["labels"], false);
        assert_eq!(prefs["theme"], "dark");
    }

    #[test]
    fn preferences_must_be_object() {
        let mut s = store();
        assert_eq!(
            update_preferences(&mut s, "u1", &json!([1, 2])).unwrap_err().status(),
            400
        );
    }

    #[test]
    fn recent_folders_are_bounded_and_unique() {
        let mut s = store();
        record_recent_folder(&mut s, "u1", "f1").unwrap();
        record_recent_folder(&mut s, "u1", "f2").unwrap();
        let user = record_recent_folder(&mut s, "u1", "f1").unwrap().data;
        assert_eq!(user.recent_folders, vec!["f1", "f2"]);
        assert!(user.recent_folders.len() <= RECENT_CAPACITY);
    }

    #[test]
    fn recent_requires_existing_targets() {
        let mut s = store();
        assert_eq!(record_recent_folder(&mut s, "u1", "zz").unwrap_err().status(), 404);
        assert_eq!(record_recent_file(&mut s, "u1", "zz").unwrap_err().status(), 404);
        assert_eq!(record_recent_file(&mut s, "nobody", "m1").unwrap_err().status(), 404);
    }

    #[test]
    fn recent_resolves_records() {
        let mut s = store();
        record_recent_file(&mut s, "u1", "m1").unwrap();
        record_recent_folder(&mut s, "u1", "f2").unwrap();
        let recent = recent(&s, "u1").unwrap().data;
        assert_eq!(recent.files[0].name, "a.jpg");
        assert_eq!(recent.folders[0].name, "Two");
    }

    #[test]
    fn find_by_email_ignores_case() {
        let s = store();
        assert_eq!(find_by_email(&s, " ANN@x.io").unwrap().id, "u1");
        assert!(find_by_email(&s, "zed@x.io").is_none());
    }
}
