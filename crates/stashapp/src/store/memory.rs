use super::{DataStore, Seed, Table};
use crate::error::Result;
use crate::model::{Collection, Folder, MediaItem, Tag, TagCategory, User};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    folders: Table<Folder>,
    media: Table<MediaItem>,
    collections: Table<Collection>,
    tags: Table<Tag>,
    categories: Table<TagCategory>,
    users: Table<User>,
}

impl MemoryStore {
    /// A store with every table empty.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_seed(seed: &Seed) -> Result<Self> {
        Ok(Self {
            folders: Table::from_rows(seed.folders.clone())?,
            media: Table::from_rows(seed.media.clone())?,
            collections: Table::from_rows(seed.collections.clone())?,
            tags: Table::from_rows(seed.tags.clone())?,
            categories: Table::from_rows(seed.categories.clone())?,
            users: Table::from_rows(seed.users.clone())?,
        })
    }

    /// Store loaded with the compiled-in snapshot.
    pub fn builtin() -> Result<Self> {
        Self::from_seed(&Seed::builtin()?)
    }

    /// Discards every change and reloads `seed`.
    ///
    /// The store is left untouched if the seed is malformed.
    pub fn reset(&mut self, seed: &Seed) -> Result<()> {
        let fresh = Self::from_seed(seed)?;
        *self = fresh;
        tracing::debug!("store reset to seed snapshot");
        Ok(())
    }

    /// Empties every table.
    pub fn clear(&mut self) {
        self.folders.clear();
        self.media.clear();
        self.collections.clear();
        self.tags.clear();
        self.categories.clear();
        self.users.clear();
    }
}

impl DataStore for MemoryStore {
    fn folders(&self) -> &Table<Folder> {
        &self.folders
    }

    fn folders_mut(&mut self) -> &mut Table<Folder> {
        &mut self.folders
    }

    fn media(&self) -> &Table<MediaItem> {
        &self.media
    }

    fn media_mut(&mut self) -> &mut Table<MediaItem> {
        &mut self.media
    }

    fn collections(&self) -> &Table<Collection> {
        &self.collections
    }

    fn collections_mut(&mut self) -> &mut Table<Collection> {
        &mut self.collections
    }

    fn tags(&self) -> &Table<Tag> {
        &self.tags
    }

    fn tags_mut(&mut self) -> &mut Table<Tag> {
        &mut self.tags
    }

    fn categories(&self) -> &Table<TagCategory> {
        &self.categories
    }

    fn categories_mut(&mut self) -> &mut Table<TagCategory> {
        &mut self.categories
    }

    fn users(&self) -> &Table<User> {
        &self.users
    }

    fn users_mut(&mut self) -> &mut Table<User> {
        &mut self.users
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;
    use crate::model::{MediaType, UserRole};

    /// Builds small stores with caller-chosen ids.
    ///
    /// Media added with tags bump the counts of tags already registered, so
    /// register tags before the media that use them.
    pub struct StoreFixture {
        pub store: MemoryStore,
    }

    impl Default for StoreFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl StoreFixture {
        pub fn new() -> Self {
            Self {
                store: MemoryStore::empty(),
            }
        }

        pub fn seeded() -> Self {
            Self {
                store: MemoryStore::builtin().unwrap(),
            }
        }

        pub fn with_folder(mut self, id: &str, name: &str, parent: Option<&str>) -> Self {
            let path = match parent.and_then(|p| self.store.folders().get(p)) {
                Some(p) => format!("{}/{}", p.path, name),
                None => name.to_string(),
            };
            let mut folder = Folder::new(name.to_string(), parent.map(str::to_string), path);
            folder.id = id.to_string();
            self.store.folders_mut().insert(folder).unwrap();
            self
        }

        pub fn with_media(mut self, id: &str, name: &str, folder: &str, tags: &[&str]) -> Self {
            let mut item = MediaItem::new(name.to_string(), MediaType::Image, folder.to_string());
            item.id = id.to_string();
            item.tags = tags.iter().map(|t| t.to_string()).collect();
            for t in tags {
                self.store
                    .tags_mut()
                    .update_where(|tag| tag.name == *t, |tag| tag.count += 1);
            }
            self.store.media_mut().insert(item).unwrap();
            self
        }

        pub fn with_tag(mut self, id: &str, name: &str) -> Self {
            let mut tag = Tag::new(name.to_string());
            tag.id = id.to_string();
            self.store.tags_mut().insert(tag).unwrap();
            self
        }

        pub fn with_category(mut self, id: &str, name: &str) -> Self {
            let mut cat = TagCategory::new(name.to_string(), None);
            cat.id = id.to_string();
            self.store.categories_mut().insert(cat).unwrap();
            self
        }

        pub fn with_user(mut self, id: &str, name: &str, email: &str) -> Self {
            let mut user = User::new(name.to_string(), email.to_string(), UserRole::Editor);
            user.id = id.to_string();
            self.store.users_mut().insert(user).unwrap();
            self
        }

        pub fn with_collection(mut self, id: &str, name: &str, items: &[&str]) -> Self {
            let mut col = Collection::new(name.to_string(), "#4f46e5".into(), "usr-1".into());
            col.id = id.to_string();
            col.items = items.iter().map(|i| i.to_string()).collect();
            for i in items {
                self.store
                    .media_mut()
                    .update_where(|m| m.id == *i, |m| m.used = true);
            }
            self.store.collections_mut().insert(col).unwrap();
            self
        }
    }
}
