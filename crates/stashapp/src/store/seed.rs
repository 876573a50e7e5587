//! The fixed snapshot a store starts from.
//!
//! The built-in snapshot lives in `fixtures/seed.json` and is compiled into
//! the binary. A store can always return to it with `reset`.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::model::{Collection, Folder, MediaItem, Tag, TagCategory, User};

const BUILTIN_SEED: &str = include_str!("../../fixtures/seed.json");

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seed {
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub media: Vec<MediaItem>,
    #[serde(default)]
    pub collections: Vec<Collection>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub categories: Vec<TagCategory>,
    #[serde(default)]
    pub users: Vec<User>,
}

impl Seed {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SEED)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_seed_parses() {
        let seed = Seed::builtin().unwrap();
        assert!(!seed.folders.is_empty());
        assert!(!seed.media.is_empty());
        assert!(!seed.users.is_empty());
    }

    #[test]
    fn builtin_seed_references_resolve() {
        let seed = Seed::builtin().unwrap();
        let folders: HashSet<_> = seed.folders.iter().map(|f| f.id.as_str()).collect();
        let media: HashSet<_> = seed.media.iter().map(|m| m.id.as_str()).collect();
        let users: HashSet<_> = seed.users.iter().map(|u| u.id.as_str()).collect();
        let tags: HashSet<_> = seed.tags.iter().map(|t| t.name.as_str()).collect();
        let categories: HashSet<_> = seed.categories.iter().map(|c| c.id.as_str()).collect();

        for f in &seed.folders {
            if let Some(p) = &f.parent {
                assert!(folders.contains(p.as_str()), "folder parent {}", p);
            }
        }
        for m in &seed.media {
            assert!(folders.contains(m.folder.as_str()), "media folder {}", m.folder);
            for t in &m.tags {
                assert!(tags.contains(t.as_str()), "media tag {}", t);
            }
        }
        for c in &seed.collections {
            assert!(users.contains(c.created_by.as_str()));
            for i in &c.items {
                assert!(media.contains(i.as_str()), "collection item {}", i);
            }
            for u in &c.shared_with {
                assert!(users.contains(u.as_str()));
            }
        }
        for t in &seed.tags {
            if let Some(c) = &t.category_id {
                assert!(categories.contains(c.as_str()));
            }
        }
    }

    #[test]
    fn builtin_seed_tag_counts_match_usage() {
        let seed = Seed::builtin().unwrap();
        for tag in &seed.tags {
            let used = seed.media.iter().filter(|m| m.has_tag(&tag.name)).count() as u32;
            assert_eq!(tag.count, used, "count of tag '{}'", tag.name);
        }
    }

    #[test]
    fn builtin_seed_items_are_marked_used() {
        let seed = Seed::builtin().unwrap();
        for c in &seed.collections {
            for id in &c.items {
                let item = seed.media.iter().find(|m| &m.id == id).unwrap();
                assert!(item.used, "{} is in a collection", id);
            }
        }
    }

    #[test]
    fn builtin_seed_paths_match_hierarchy() {
        let seed = Seed::builtin().unwrap();
        for f in &seed.folders {
            let mut names = vec![f.name.clone()];
            let mut parent = f.parent.clone();
            while let Some(p) = parent {
                let pf = seed.folders.iter().find(|x| x.id == p).unwrap();
                names.insert(0, pf.name.clone());
                parent = pf.parent.clone();
            }
            assert_eq!(f.path, names.join("/"));
        }
    }

    #[test]
    fn partial_snapshot_defaults_missing_tables() {
        let seed = Seed::from_json(r#"{"folders": []}"#).unwrap();
        assert!(seed.media.is_empty());
        assert!(Seed::from_json("not json").is_err());
    }
}
