//! # API Facade
//!
//! The API layer is a **thin facade** over the command layer. It is the single
//! entry point for every stash operation, whichever client drives it.
//!
//! ## Role and Responsibilities
//!
//! For each call the facade:
//! - **Runs the fault harness** ([`FaultInjector::before`]) before touching the store
//! - **Normalizes inputs** (page sizes clamped to the configured maximum,
//!   tags addressed by id or name, the configured path separator)
//! - **Dispatches** to the command function
//! - **Wraps** the outcome in an [`Envelope`] or an [`ApiError`], both carrying
//!   a fresh request id
//!
//! ## What the API Does NOT Do
//!
//! - **Business logic**: that belongs in `commands/*.rs`
//! - **I/O**: no stdout, stderr or file formatting
//! - **Authorization**: login issues tokens, nothing checks them
//!
//! ## Generic Over DataStore
//!
//! `StashApi<S: DataStore>` is generic over the storage backend. The shipped
//! backend is [`MemoryStore`]; `reset` is only offered there since it reloads
//! the seed snapshot.
//!
//! ## Testing Strategy
//!
//! API tests check dispatch, envelope shape and normalization. Command
//! semantics are tested next to each command.

use crate::commands::auth::Session;
use crate::commands::categories::CategoryUpdate;
use crate::commands::collections::{CollectionUpdate, NewCollection};
use crate::commands::folders::{FolderDeletion, FolderUpdate, NewFolder};
use crate::commands::media::{FolderScope, MediaUpdate, NewMedia};
use crate::commands::tagging::TaggingOutcome;
use crate::commands::tags::{NewTag, TagDeletion, TagUpdate};
use crate::commands::users::{RecentItems, UserUpdate};
use crate::commands::{self, BatchOutcome, CmdMessage, CmdResult};
use crate::config::StashConfig;
use crate::envelope::{new_request_id, ApiError, Envelope};
use crate::error::Result;
use crate::faults::{self, FaultInjector};
use crate::hierarchy::TreeNode;
use crate::model::{Collection, Folder, MediaItem, Preferences, Tag, TagCategory, User};
use crate::query::{Page, Query};
use crate::store::memory::MemoryStore;
use crate::store::{DataStore, Seed, StoreCounts};

pub type ApiResult<T> = std::result::Result<Envelope<T>, ApiError>;

/// The main API facade for stash operations.
pub struct StashApi<S: DataStore> {
    store: S,
    config: StashConfig,
    faults: Box<dyn FaultInjector>,
}

impl<S: DataStore> StashApi<S> {
    /// Builds the API with the fault harness described by `config.faults`.
    pub fn new(store: S, config: StashConfig) -> Self {
        let faults = faults::from_config(&config.faults);
        Self {
            store,
            config,
            faults,
        }
    }

    /// Replaces the fault harness.
    pub fn with_faults(mut self, faults: Box<dyn FaultInjector>) -> Self {
        self.faults = faults;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &StashConfig {
        &self.config
    }

    /// A query for the first page at the configured default size.
    pub fn query(&self) -> Query {
        Query::new().page(1, self.config.query.default_page_size)
    }

    fn bounded(&self, query: &Query) -> Query {
        let mut query = query.clone();
        let max = self.config.query.max_page_size;
        if query.page_size > max {
            tracing::debug!(requested = query.page_size, max, "page size clamped");
            query.page_size = max;
        }
        query
    }

    fn read<T>(&self, op: &str, f: impl FnOnce(&S) -> Result<CmdResult<T>>) -> ApiResult<T> {
        let request_id = new_request_id();
        tracing::debug!(op, request_id = %request_id, "dispatch");
        let outcome = self.faults.before(op).and_then(|_| f(&self.store));
        respond(op, outcome, request_id)
    }

    fn write<T>(
        &mut self,
        op: &str,
        f: impl FnOnce(&mut S, &StashConfig) -> Result<CmdResult<T>>,
    ) -> ApiResult<T> {
        let request_id = new_request_id();
        tracing::debug!(op, request_id = %request_id, "dispatch");
        let outcome = self
            .faults
            .before(op)
            .and_then(|_| f(&mut self.store, &self.config));
        respond(op, outcome, request_id)
    }

    // --- media ---

    pub fn list_media(&self, query: &Query, scope: Option<&FolderScope>) -> ApiResult<Page<MediaItem>> {
        let query = self.bounded(query);
        self.read("media.list", |s| commands::media::list(s, &query, scope))
    }

    pub fn get_media(&self, id: &str) -> ApiResult<MediaItem> {
        self.read("media.get", |s| commands::media::get(s, id))
    }

    /// Ids of the collections that reference the item.
    pub fn media_usage(&self, id: &str) -> ApiResult<Vec<String>> {
        self.read("media.usage", |s| {
            s.media().require(id)?;
            Ok(CmdResult::new(commands::media::usage(s, id)))
        })
    }

    pub fn create_media(&mut self, input: NewMedia) -> ApiResult<MediaItem> {
        self.write("media.create", |s, _| commands::media::create(s, input))
    }

    pub fn update_media(&mut self, id: &str, update: MediaUpdate) -> ApiResult<MediaItem> {
        self.write("media.update", |s, _| commands::media::update(s, id, update))
    }

    pub fn toggle_starred(&mut self, id: &str) -> ApiResult<MediaItem> {
        self.write("media.star", |s, _| commands::media::toggle_starred(s, id))
    }

    pub fn toggle_favorited(&mut self, id: &str) -> ApiResult<MediaItem> {
        self.write("media.favorite", |s, _| commands::media::toggle_favorited(s, id))
    }

    pub fn delete_media(&mut self, id: &str) -> ApiResult<MediaItem> {
        self.write("media.delete", |s, _| commands::media::delete(s, id))
    }

    pub fn batch_update_media(&mut self, ids: &[String], update: &MediaUpdate) -> ApiResult<BatchOutcome> {
        self.write("media.batch_update", |s, _| {
            commands::media::batch_update(s, ids, update)
        })
    }

    pub fn batch_delete_media(&mut self, ids: &[String]) -> ApiResult<BatchOutcome> {
        self.write("media.batch_delete", |s, _| commands::media::batch_delete(s, ids))
    }

    // --- folders ---

    pub fn list_folders(&self, query: &Query) -> ApiResult<Page<Folder>> {
        let query = self.bounded(query);
        self.read("folders.list", |s| commands::folders::list(s, &query))
    }

    pub fn folder_tree(&self) -> ApiResult<Vec<TreeNode<Folder>>> {
        self.read("folders.tree", commands::folders::tree)
    }

    pub fn get_folder(&self, id: &str) -> ApiResult<Folder> {
        self.read("folders.get", |s| commands::folders::get(s, id))
    }

    pub fn folder_breadcrumbs(&self, id: &str) -> ApiResult<Vec<Folder>> {
        self.read("folders.breadcrumbs", |s| commands::folders::breadcrumbs(s, id))
    }

    pub fn folder_media_count(&self, id: &str, recursive: bool) -> ApiResult<usize> {
        self.read("folders.media_count", |s| {
            commands::folders::media_count(s, id, recursive).map(CmdResult::new)
        })
    }

    pub fn create_folder(&mut self, input: NewFolder) -> ApiResult<Folder> {
        self.write("folders.create", |s, c| {
            commands::folders::create(s, input, &c.folders.path_separator)
        })
    }

    pub fn update_folder(&mut self, id: &str, update: FolderUpdate) -> ApiResult<Folder> {
        self.write("folders.update", |s, c| {
            commands::folders::update(s, id, update, &c.folders.path_separator)
        })
    }

    pub fn delete_folder(&mut self, id: &str, force: bool) -> ApiResult<FolderDeletion> {
        self.write("folders.delete", |s, _| commands::folders::delete(s, id, force))
    }

    // --- collections ---

    pub fn list_collections(&self, query: &Query) -> ApiResult<Page<Collection>> {
        let query = self.bounded(query);
        self.read("collections.list", |s| commands::collections::list(s, &query))
    }

    /// Collections the user created or that are shared with them.
    pub fn collections_for_user(&self, user_id: &str, query: &Query) -> ApiResult<Page<Collection>> {
        let query = self.bounded(query);
        self.read("collections.visible", |s| {
            commands::collections::visible_to(s, user_id, &query)
        })
    }

    pub fn collection_tree(&self) -> ApiResult<Vec<TreeNode<Collection>>> {
        self.read("collections.tree", commands::collections::tree)
    }

    pub fn get_collection(&self, id: &str) -> ApiResult<Collection> {
        self.read("collections.get", |s| commands::collections::get(s, id))
    }

    pub fn create_collection(&mut self, input: NewCollection) -> ApiResult<Collection> {
        self.write("collections.create", |s, config| {
            commands::collections::create(s, input, &config.auth.email)
        })
    }

    pub fn update_collection(&mut self, id: &str, update: CollectionUpdate) -> ApiResult<Collection> {
        self.write("collections.update", |s, _| {
            commands::collections::update(s, id, update)
        })
    }

    pub fn delete_collection(&mut self, id: &str) -> ApiResult<Collection> {
        self.write("collections.delete", |s, _| commands::collections::delete(s, id))
    }

    pub fn add_to_collection(&mut self, id: &str, media_ids: &[String]) -> ApiResult<Collection> {
        self.write("collections.add_items", |s, _| {
            commands::collections::add_items(s, id, media_ids)
        })
    }

    pub fn remove_from_collection(&mut self, id: &str, media_ids: &[String]) -> ApiResult<Collection> {
        self.write("collections.remove_items", |s, _| {
            commands::collections::remove_items(s, id, media_ids)
        })
    }

    pub fn share_collection(&mut self, id: &str, user_ids: &[String]) -> ApiResult<Collection> {
        self.write("collections.share", |s, _| {
            commands::collections::share(s, id, user_ids)
        })
    }

    pub fn unshare_collection(&mut self, id: &str, user_ids: &[String]) -> ApiResult<Collection> {
        self.write("collections.unshare", |s, _| {
            commands::collections::unshare(s, id, user_ids)
        })
    }

    // --- tags ---
    //
    // Tags are addressed by id or by name.

    pub fn list_tags(&self, query: &Query) -> ApiResult<Page<Tag>> {
        let query = self.bounded(query);
        self.read("tags.list", |s| commands::tags::list(s, &query))
    }

    pub fn get_tag(&self, key: &str) -> ApiResult<Tag> {
        self.read("tags.get", |s| commands::tags::find(s, key).map(CmdResult::new))
    }

    pub fn create_tag(&mut self, input: NewTag) -> ApiResult<Tag> {
        self.write("tags.create", |s, _| commands::tags::create(s, input))
    }

    pub fn update_tag(&mut self, key: &str, update: TagUpdate) -> ApiResult<Tag> {
        self.write("tags.update", |s, _| {
            let id = commands::tags::find(s, key)?.id;
            commands::tags::update(s, &id, update)
        })
    }

    pub fn rename_tag(&mut self, key: &str, new_name: &str) -> ApiResult<Tag> {
        self.write("tags.rename", |s, _| {
            let id = commands::tags::find(s, key)?.id;
            commands::tags::rename(s, &id, new_name)
        })
    }

    pub fn delete_tag(&mut self, key: &str) -> ApiResult<TagDeletion> {
        self.write("tags.delete", |s, _| {
            let id = commands::tags::find(s, key)?.id;
            commands::tags::delete(s, &id)
        })
    }

    /// Adds and removes tag names across many media items.
    pub fn apply_tags(&mut self, media_ids: &[String], add: &[String], remove: &[String]) -> ApiResult<TaggingOutcome> {
        self.write("tags.apply", |s, _| {
            commands::tagging::apply(s, media_ids, add, remove)
        })
    }

    // --- categories ---

    pub fn list_categories(&self, query: &Query) -> ApiResult<Page<TagCategory>> {
        let query = self.bounded(query);
        self.read("categories.list", |s| commands::categories::list(s, &query))
    }

    pub fn get_category(&self, id: &str) -> ApiResult<TagCategory> {
        self.read("categories.get", |s| commands::categories::get(s, id))
    }

    pub fn category_tags(&self, id: &str) -> ApiResult<Vec<Tag>> {
        self.read("categories.tags", |s| commands::categories::tags_in(s, id))
    }

    pub fn create_category(&mut self, name: &str, description: Option<String>) -> ApiResult<TagCategory> {
        self.write("categories.create", |s, _| {
            commands::categories::create(s, name, description)
        })
    }

    pub fn update_category(&mut self, id: &str, update: CategoryUpdate) -> ApiResult<TagCategory> {
        self.write("categories.update", |s, _| {
            commands::categories::update(s, id, update)
        })
    }

    pub fn delete_category(&mut self, id: &str, force: bool) -> ApiResult<TagCategory> {
        self.write("categories.delete", |s, _| {
            commands::categories::delete(s, id, force)
        })
    }

    // --- users ---

    pub fn list_users(&self, query: &Query) -> ApiResult<Page<User>> {
        let query = self.bounded(query);
        self.read("users.list", |s| commands::users::list(s, &query))
    }

    pub fn get_user(&self, id: &str) -> ApiResult<User> {
        self.read("users.get", |s| commands::users::get(s, id))
    }

    pub fn update_user(&mut self, id: &str, update: UserUpdate) -> ApiResult<User> {
        self.write("users.update", |s, _| commands::users::update(s, id, update))
    }

    pub fn update_preferences(&mut self, id: &str, patch: &serde_json::Value) -> ApiResult<Preferences> {
        self.write("users.preferences", |s, _| {
            commands::users::update_preferences(s, id, patch)
        })
    }

    pub fn record_recent_folder(&mut self, id: &str, folder_id: &str) -> ApiResult<User> {
        self.write("users.recent_folder", |s, _| {
            commands::users::record_recent_folder(s, id, folder_id)
        })
    }

    pub fn record_recent_file(&mut self, id: &str, media_id: &str) -> ApiResult<User> {
        self.write("users.recent_file", |s, _| {
            commands::users::record_recent_file(s, id, media_id)
        })
    }

    pub fn recent(&self, id: &str) -> ApiResult<RecentItems> {
        self.read("users.recent", |s| commands::users::recent(s, id))
    }

    // --- session and housekeeping ---

    pub fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let auth = &self.config.auth;
        self.read("auth.login", |s| commands::auth::login(s, auth, email, password))
    }

    pub fn stats(&self) -> ApiResult<StoreCounts> {
        self.read("stats", |s| Ok(CmdResult::new(s.counts())))
    }
}

impl StashApi<MemoryStore> {
    /// Discards all changes and reloads the compiled-in snapshot.
    pub fn reset(&mut self) -> ApiResult<StoreCounts> {
        self.write("reset", |s, c| {
            s.reset(&Seed::builtin()?)?;
            if c.folders.path_separator != "/" {
                commands::folders::rebuild_all_paths(s, &c.folders.path_separator)?;
            }
            Ok(CmdResult::new(s.counts())
                .with_message(CmdMessage::success("Store reset to seed data")))
        })
    }
}

fn respond<T>(op: &str, outcome: Result<CmdResult<T>>, request_id: String) -> ApiResult<T> {
    match outcome {
        Ok(result) => {
            let message = if result.messages.is_empty() {
                "OK".to_string()
            } else {
                result
                    .messages
                    .iter()
                    .map(|m| m.content.as_str())
                    .collect::<Vec<_>>()
                    .join("; ")
            };
            Ok(Envelope::ok(result.data, message, request_id))
        }
        Err(err) => {
            tracing::debug!(op, code = %err.code(), "operation failed");
            Err(ApiError::from_error(&err, request_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorCode, StashError};
    use crate::faults::{NoFaults, SimulatedFaults};
    use crate::model::MediaType;
    use crate::store::memory::fixtures::StoreFixture;
    use std::cell::Cell;

    fn api() -> StashApi<MemoryStore> {
        let store = StoreFixture::new()
            .with_folder("f1", "Root", None)
            .with_folder("f2", "Child", Some("f1"))
            .with_media("m1", "a.jpg", "f1", &[])
            .with_media("m2", "b.jpg", "f2", &[])
            .with_tag("t1", "sunset")
            .with_user("u1", "Ann", "ann@x.io")
            .store;
        StashApi::new(store, StashConfig::default())
    }

    #[test]
    fn success_is_wrapped_in_envelope() {
        let env = api().get_media("m1").unwrap();
        assert!(env.success);
        assert_eq!(env.data.name, "a.jpg");
        assert_eq!(env.message, "OK");
        assert!(env.request_id.starts_with("req_"));
    }

    #[test]
    fn failures_become_api_errors() {
        let err = api().get_media("nope").unwrap_err();
        assert!(!err.success);
        assert_eq!(err.status, 404);
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[test]
    fn command_messages_become_envelope_message() {
        let mut api = api();
        let env = api.create_media(NewMedia::new("c.jpg", MediaType::Image, "f1")).unwrap();
        assert!(env.message.contains("c.jpg"));
    }

    #[test]
    fn every_command_message_is_joined_into_envelope_message() {
        let result = CmdResult::new(())
            .with_message(CmdMessage::success("moved 2 items"))
            .with_message(CmdMessage::warning("1 item skipped"));
        let env = respond("batch", Ok(result), "req_1".into()).unwrap();
        assert_eq!(env.message, "moved 2 items; 1 item skipped");
    }

    #[test]
    fn page_size_is_clamped_to_max() {
        let mut api = api();
        api.config.query.max_page_size = 1;
        let page = api.list_media(&Query::new().page(1, 50), None).unwrap().data;
        assert_eq!(page.meta.page_size, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.meta.total_pages, 2);
    }

    #[test]
    fn default_query_uses_configured_page_size() {
        let mut api = api();
        api.config.query.default_page_size = 7;
        assert_eq!(api.query().page_size, 7);
    }

    #[test]
    fn folder_scope_is_recursive() {
        let api = api();
        let scope = FolderScope::recursive("f1");
        let page = api.list_media(&api.query(), Some(&scope)).unwrap().data;
        assert_eq!(page.meta.total, 2);
    }

    #[test]
    fn folder_create_uses_configured_separator() {
        let mut api = api();
        api.config.folders.path_separator = " > ".into();
        let input = NewFolder {
            name: "Deep".into(),
            parent: Some("f2".into()),
            ..Default::default()
        };
        let folder = api.create_folder(input).unwrap().data;
        assert_eq!(folder.path, "Root/Child > Deep");
    }

    #[test]
    fn tags_are_addressed_by_name() {
        let mut api = api();
        assert_eq!(api.get_tag("SUNSET").unwrap().data.id, "t1");
        let renamed = api.rename_tag("sunset", "dusk").unwrap().data;
        assert_eq!(renamed.id, "t1");
        assert_eq!(renamed.name, "dusk");
    }

    #[test]
    fn invalid_reference_details_reach_the_error() {
        let mut api = api();
        let err = api
            .apply_tags(&["m1".into()], &["ghost".into()], &[])
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidTags);
        assert_eq!(err.details.unwrap().ids, vec!["ghost".to_string()]);
    }

    #[test]
    fn injected_fault_leaves_store_untouched() {
        let mut api = api().with_faults(Box::new(SimulatedFaults::new(1.0, 0, 0, Some(3))));
        let err = api.delete_media("m1").unwrap_err();
        assert_eq!(err.status, 503);
        assert!(api.store().media().contains("m1"));

        let mut api = api.with_faults(Box::new(NoFaults));
        assert!(api.delete_media("m1").is_ok());
    }

    struct CountingFaults<'a>(&'a Cell<usize>);

    impl FaultInjector for CountingFaults<'_> {
        fn before(&self, _op: &str) -> Result<()> {
            self.0.set(self.0.get() + 1);
            Err(StashError::ServiceUnavailable("down".into()))
        }
    }

    #[test]
    fn harness_runs_once_per_operation() {
        let calls: &'static Cell<usize> = Box::leak(Box::new(Cell::new(0)));
        let api = api().with_faults(Box::new(CountingFaults(calls)));
        let _ = api.list_tags(&Query::new());
        let _ = api.stats();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn login_uses_configured_credentials() {
        let mut api = api();
        api.config.auth.email = "ann@x.io".into();
        api.config.auth.password = "pw".into();
        assert_eq!(api.login("ann@x.io", "pw").unwrap().data.user.id, "u1");
        assert_eq!(api.login("ann@x.io", "bad").unwrap_err().status, 401);
    }

    #[test]
    fn reset_restores_seed() {
        let mut api = StashApi::new(MemoryStore::empty(), StashConfig::default());
        assert_eq!(api.stats().unwrap().data.media, 0);
        let counts = api.reset().unwrap().data;
        assert_eq!(counts.media, 12);
        assert_eq!(counts.folders, 8);
    }
}
