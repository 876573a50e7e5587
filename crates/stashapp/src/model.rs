//! # Domain Model
//!
//! The five entity collections of the media library and the [`Record`] trait
//! that lets the query engine and the hierarchy builder treat them uniformly.
//!
//! ## Entities
//!
//! | Entity | Id prefix | References |
//! |--------|-----------|------------|
//! | [`Folder`] | `fld` | `parent` → Folder |
//! | [`MediaItem`] | `med` | `folder` → Folder, `tags` → Tag *names* |
//! | [`Collection`] | `col` | `items` → MediaItem, `createdBy`/`sharedWith` → User, `parentId` → Collection |
//! | [`Tag`] | `tag` | `categoryId` → TagCategory |
//! | [`TagCategory`] | `cat` | - |
//! | [`User`] | `usr` | `recentFolders` → Folder, `recentFiles` → MediaItem |
//!
//! Media items reference tags by name, not by id. This is why renaming or
//! deleting a tag has to rewrite the media table (see `commands::tags`).
//!
//! ## Identity and Timestamps
//!
//! Ids are generated by [`new_id`] and never change. `created` is stamped once;
//! `modified` is bumped by the command layer on every accepted update.
//!
//! All records serialize with camelCase field names, matching the wire format of
//! the seed snapshot and the response envelopes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::attributes::{
    AttrValue, AttributeSpec, CATEGORY_ATTRIBUTES, COLLECTION_ATTRIBUTES, FOLDER_ATTRIBUTES,
    MEDIA_ATTRIBUTES, TAG_ATTRIBUTES, USER_ATTRIBUTES,
};
use crate::error::StashError;

/// Maximum length of a user's recent folders / recent files lists.
pub const RECENT_CAPACITY: usize = 10;

/// Colors handed out to collections created without one.
pub const COLLECTION_PALETTE: &[&str] = &[
    "#4f46e5", "#0891b2", "#059669", "#d97706", "#dc2626", "#7c3aed", "#db2777", "#4b5563",
];

/// Generates a server-side id: `<prefix>-<12 hex chars>`.
pub fn new_id(prefix: &str) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &hex[..12])
}

/// A row in one of the store's tables.
///
/// `get_attr` returns `None` for attribute names the entity doesn't have.
pub trait Record: Clone {
    /// Human readable entity name used in error messages ("Folder", "Tag", ...).
    const ENTITY: &'static str;

    /// Attribute registry driving filtering, sorting and search.
    const ATTRIBUTES: &'static [AttributeSpec];

    fn id(&self) -> &str;

    fn get_attr(&self, name: &str) -> Option<AttrValue>;
}

/// A record carrying a nullable parent pointer into its own table.
pub trait TreeRecord: Record {
    fn parent_id(&self) -> Option<&str>;
}

fn text(s: &str) -> Option<AttrValue> {
    Some(AttrValue::Text(s.to_string()))
}

fn opt_text(s: &Option<String>) -> Option<AttrValue> {
    s.as_deref().map(|s| AttrValue::Text(s.to_string()))
}

fn reference(s: &Option<String>) -> Option<AttrValue> {
    Some(AttrValue::Ref(s.clone()))
}

fn list(v: &[String]) -> Option<AttrValue> {
    Some(AttrValue::List(v.to_vec()))
}

// --- Folder ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Ancestor names plus own name, joined by the configured separator.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub color: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Folder {
    pub fn new(name: String, parent: Option<String>, path: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("fld"),
            name,
            parent,
            path,
            color: None,
            created: now,
            modified: now,
        }
    }
}

impl Record for Folder {
    const ENTITY: &'static str = "Folder";
    const ATTRIBUTES: &'static [AttributeSpec] = FOLDER_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "parent" => reference(&self.parent),
            "path" => text(&self.path),
            "color" => opt_text(&self.color),
            "created" => Some(AttrValue::Date(self.created)),
            "modified" => Some(AttrValue::Date(self.modified)),
            _ => None,
        }
    }
}

impl TreeRecord for Folder {
    fn parent_id(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

// --- MediaItem ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
            MediaType::Audio => "audio",
            MediaType::Document => "document",
        }
    }
}

impl FromStr for MediaType {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            "audio" => Ok(MediaType::Audio),
            "document" => Ok(MediaType::Document),
            other => Err(StashError::invalid(format!("Unknown media type '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaStatus {
    #[default]
    Draft,
    Review,
    Approved,
    Archived,
}

impl MediaStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaStatus::Draft => "draft",
            MediaStatus::Review => "review",
            MediaStatus::Approved => "approved",
            MediaStatus::Archived => "archived",
        }
    }
}

impl FromStr for MediaStatus {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "draft" => Ok(MediaStatus::Draft),
            "review" => Ok(MediaStatus::Review),
            "approved" => Ok(MediaStatus::Approved),
            "archived" => Ok(MediaStatus::Archived),
            other => Err(StashError::invalid(format!("Unknown media status '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub folder: String,
    /// Tag names (not ids); order is irrelevant, duplicates are not kept.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: MediaStatus,
    #[serde(default)]
    pub used: bool,
    #[serde(default)]
    pub starred: bool,
    #[serde(default)]
    pub favorited: bool,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl MediaItem {
    pub fn new(name: String, media_type: MediaType, folder: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("med"),
            name,
            media_type,
            folder,
            tags: Vec::new(),
            status: MediaStatus::Draft,
            used: false,
            starred: false,
            favorited: false,
            created: now,
            modified: now,
            size: 0,
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t == name)
    }
}

impl Record for MediaItem {
    const ENTITY: &'static str = "Media item";
    const ATTRIBUTES: &'static [AttributeSpec] = MEDIA_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "type" => Some(AttrValue::Enum(self.media_type.as_str().to_string())),
            "folder" => Some(AttrValue::Ref(Some(self.folder.clone()))),
            "tags" => list(&self.tags),
            "status" => Some(AttrValue::Enum(self.status.as_str().to_string())),
            "used" => Some(AttrValue::Bool(self.used)),
            "starred" => Some(AttrValue::Bool(self.starred)),
            "favorited" => Some(AttrValue::Bool(self.favorited)),
            "created" => Some(AttrValue::Date(self.created)),
            "modified" => Some(AttrValue::Date(self.modified)),
            "size" => Some(AttrValue::Number(self.size as f64)),
            _ => None,
        }
    }
}

// --- Collection ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    /// Media item ids.
    #[serde(default)]
    pub items: Vec<String>,
    pub created_by: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Collection {
    pub fn new(name: String, color: String, created_by: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id("col"),
            name,
            description: None,
            color,
            items: Vec::new(),
            created_by,
            is_shared: false,
            shared_with: Vec::new(),
            parent_id: None,
            created: now,
            modified: now,
        }
    }

    pub fn contains(&self, media_id: &str) -> bool {
        self.items.iter().any(|i| i == media_id)
    }
}

impl Record for Collection {
    const ENTITY: &'static str = "Collection";
    const ATTRIBUTES: &'static [AttributeSpec] = COLLECTION_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "description" => opt_text(&self.description),
            "color" => text(&self.color),
            "items" => list(&self.items),
            "createdBy" => Some(AttrValue::Ref(Some(self.created_by.clone()))),
            "isShared" => Some(AttrValue::Bool(self.is_shared)),
            "sharedWith" => list(&self.shared_with),
            "parentId" => reference(&self.parent_id),
            "created" => Some(AttrValue::Date(self.created)),
            "modified" => Some(AttrValue::Date(self.modified)),
            _ => None,
        }
    }
}

impl TreeRecord for Collection {
    fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

// --- Tag ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    /// Number of media items carrying this tag's name, maintained incrementally.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub category_id: Option<String>,
    pub created: DateTime<Utc>,
}

impl Tag {
    pub fn new(name: String) -> Self {
        Self {
            id: new_id("tag"),
            name,
            color: None,
            count: 0,
            category_id: None,
            created: Utc::now(),
        }
    }
}

impl Record for Tag {
    const ENTITY: &'static str = "Tag";
    const ATTRIBUTES: &'static [AttributeSpec] = TAG_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "color" => opt_text(&self.color),
            "count" => Some(AttrValue::Number(self.count as f64)),
            "categoryId" => reference(&self.category_id),
            "created" => Some(AttrValue::Date(self.created)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl TagCategory {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: new_id("cat"),
            name,
            description,
        }
    }
}

impl Record for TagCategory {
    const ENTITY: &'static str = "Tag category";
    const ATTRIBUTES: &'static [AttributeSpec] = CATEGORY_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "description" => opt_text(&self.description),
            _ => None,
        }
    }
}

// --- User ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Editor,
    #[default]
    Viewer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Editor => "editor",
            UserRole::Viewer => "viewer",
        }
    }
}

impl FromStr for UserRole {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "editor" => Ok(UserRole::Editor),
            "viewer" => Ok(UserRole::Viewer),
            other => Err(StashError::invalid(format!("Unknown role '{}'", other))),
        }
    }
}

/// Nested key/value user settings.
pub type Preferences = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default)]
    pub preferences: Preferences,
    #[serde(default)]
    pub recent_folders: Vec<String>,
    #[serde(default)]
    pub recent_files: Vec<String>,
    pub created: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, role: UserRole) -> Self {
        Self {
            id: new_id("usr"),
            name,
            email,
            role,
            preferences: Preferences::new(),
            recent_folders: Vec::new(),
            recent_files: Vec::new(),
            created: Utc::now(),
        }
    }
}

impl Record for User {
    const ENTITY: &'static str = "User";
    const ATTRIBUTES: &'static [AttributeSpec] = USER_ATTRIBUTES;

    fn id(&self) -> &str {
        &self.id
    }

    fn get_attr(&self, name: &str) -> Option<AttrValue> {
        match name {
            "id" => text(&self.id),
            "name" => text(&self.name),
            "email" => text(&self.email),
            "role" => Some(AttrValue::Enum(self.role.as_str().to_string())),
            "created" => Some(AttrValue::Date(self.created)),
            _ => None,
        }
    }
}

/// Moves `id` to the front of a recent list, dropping duplicates and keeping
/// at most [`RECENT_CAPACITY`] entries.
pub fn push_recent(list: &mut Vec<String>, id: &str) {
    list.retain(|existing| existing != id);
    list.insert(0, id.to_string());
    list.truncate(RECENT_CAPACITY);
}

/// Recursively merges `patch` into `target`: objects merge key by key, any
/// other value replaces what was there.
pub fn merge_preferences(target: &mut Preferences, patch: &Preferences) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(serde_json::Value::Object(existing)), serde_json::Value::Object(incoming)) => {
                merge_preferences(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_id_has_prefix_and_fixed_length() {
        let id = new_id("fld");
        assert!(id.starts_with("fld-"));
        assert_eq!(id.len(), 16);
        assert_ne!(id, new_id("fld"));
    }

    #[test]
    fn media_serializes_type_field() {
        let item = MediaItem::new("a.jpg".into(), MediaType::Image, "fld-1".into());
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["status"], "draft");
        assert!(json.get("mediaType").is_none());
    }

    #[test]
    fn collection_serializes_camel_case() {
        let c = Collection::new("Picks".into(), "#fff".into(), "usr-1".into());
        let json = serde_json::to_value(&c).unwrap();
        assert_eq!(json["createdBy"], "usr-1");
        assert_eq!(json["isShared"], false);
        assert!(json["parentId"].is_null());
    }

    #[test]
    fn get_attr_exposes_wire_names() {
        let c = Collection::new("Picks".into(), "#fff".into(), "usr-1".into());
        assert_eq!(c.get_attr("isShared"), Some(AttrValue::Bool(false)));
        assert_eq!(c.get_attr("parentId"), Some(AttrValue::Ref(None)));
        assert_eq!(c.get_attr("is_shared"), None);
    }

    #[test]
    fn enums_parse_case_insensitively() {
        assert_eq!("IMAGE".parse::<MediaType>().unwrap(), MediaType::Image);
        assert_eq!("review".parse::<MediaStatus>().unwrap(), MediaStatus::Review);
        assert_eq!("Admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn push_recent_moves_to_front_without_duplicates() {
        let mut list = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        push_recent(&mut list, "c");
        assert_eq!(list, vec!["c", "a", "b"]);
    }

    #[test]
    fn push_recent_is_bounded() {
        let mut list = Vec::new();
        for i in 0..15 {
            push_recent(&mut list, &format!("f{}", i));
        }
        assert_eq!(list.len(), RECENT_CAPACITY);
        assert_eq!(list[0], "f14");
        assert_eq!(list[9], "f5");
    }

    #[test]
    fn merge_preferences_is_deep() {
        let mut prefs = json!({"theme": "dark", "grid": {"size": 3, "labels": true}})
            .as_object()
            .cloned()
            .unwrap();
        let patch = json!({"grid": {"size": 5}, "locale": "fr"})
            .as_object()
            .cloned()
            .unwrap();

        merge_preferences(&mut prefs, &patch);

        assert_eq!(prefs["theme"], "dark");
        assert_eq!(prefs["grid"]["size"], 5);
        assert_eq!(prefs["grid"]["labels"], true);
        assert_eq!(prefs["locale"], "fr");
    }
}
