//! # Storage Layer
//!
//! One mutable table per entity, owned by a single store value. The
//! [`DataStore`] trait hands commands typed access to each table; the command
//! layer never sees how the tables are held.
//!
//! ## Ownership
//!
//! There is no global state. Whoever owns the store (normally
//! [`StashApi`](crate::api::StashApi)) passes it by reference to every command.
//! Each test builds its own store, so tests never share data.
//!
//! ## Write Paths
//!
//! Rows only change through [`Table::insert`], [`Table::replace`],
//! [`Table::remove`], [`Table::remove_where`] and [`Table::update_where`].
//! Cross-table rules (cascades, usage guards, tag counters) are not enforced
//! here; that is the job of `commands`.
//!
//! ## Implementations
//!
//! - [`memory::MemoryStore`]: tables in plain `Vec`s, seeded from a [`Seed`].

use serde::Serialize;

use crate::model::{Collection, Folder, MediaItem, Tag, TagCategory, User};

pub mod memory;
pub mod seed;
pub mod table;

pub use seed::Seed;
pub use table::Table;

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreCounts {
    pub folders: usize,
    pub media: usize,
    pub collections: usize,
    pub tags: usize,
    pub categories: usize,
    pub users: usize,
}

/// Typed access to the entity tables.
pub trait DataStore {
    fn folders(&self) -> &Table<Folder>;
    fn folders_mut(&mut self) -> &mut Table<Folder>;

    fn media(&self) -> &Table<MediaItem>;
    fn media_mut(&mut self) -> &mut Table<MediaItem>;

    fn collections(&self) -> &Table<Collection>;
    fn collections_mut(&mut self) -> &mut Table<Collection>;

    fn tags(&self) -> &Table<Tag>;
    fn tags_mut(&mut self) -> &mut Table<Tag>;

    fn categories(&self) -> &Table<TagCategory>;
    fn categories_mut(&mut self) -> &mut Table<TagCategory>;

    fn users(&self) -> &Table<User>;
    fn users_mut(&mut self) -> &mut Table<User>;

    fn counts(&self) -> StoreCounts {
        StoreCounts {
            folders: self.folders().len(),
            media: self.media().len(),
            collections: self.collections().len(),
            tags: self.tags().len(),
            categories: self.categories().len(),
            users: self.users().len(),
        }
    }
}
