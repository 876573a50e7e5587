//! # Rendering
//!
//! Turns API results into terminal text. Every function here returns a
//! `String`; printing is left to `commands.rs` so the layouts are testable.
//!
//! ## Tables
//!
//! List views are column tables. Column widths come from the widest cell
//! (measured with `unicode-width`, so names with wide characters line up),
//! except the name column which is capped at [`NAME_WIDTH`] and truncated with
//! an ellipsis. Styles are applied after padding so escape codes never count
//! toward a width.
//!
//! ## Trees
//!
//! Folder and collection hierarchies print with box-drawing guides, children
//! in store order.

use chrono::{DateTime, Utc};
use stashapp::commands::auth::Session;
use stashapp::commands::folders::FolderDeletion;
use stashapp::commands::tagging::TaggingOutcome;
use stashapp::commands::tags::TagDeletion;
use stashapp::commands::users::RecentItems;
use stashapp::commands::BatchOutcome;
use stashapp::envelope::ApiError;
use stashapp::hierarchy::TreeNode;
use stashapp::model::{Collection, Folder, MediaItem, Tag, TagCategory, User};
use stashapp::query::PageMeta;
use stashapp::store::StoreCounts;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::styles;

pub const NAME_WIDTH: usize = 36;
const STAR_MARKER: &str = "★";
const FAVORITE_MARKER: &str = "♥";

/// A column table; cells are plain text, styling happens per column on output.
struct Table {
    rows: Vec<Vec<String>>,
    caps: Vec<Option<usize>>,
}

impl Table {
    fn new(caps: Vec<Option<usize>>) -> Self {
        Self {
            rows: Vec::new(),
            caps,
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn render(&self, style: impl Fn(usize, &str, &str) -> String) -> String {
        let columns = self.caps.len();
        let mut widths = vec![0; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate().take(columns) {
                let w = cell.width();
                widths[i] = widths[i].max(self.caps[i].map_or(w, |cap| w.min(cap)));
            }
        }

        let mut out = String::new();
        for row in &self.rows {
            let mut line = String::new();
            for (i, cell) in row.iter().enumerate().take(columns) {
                let shown = truncate_to_width(cell, widths[i]);
                let padded = if i + 1 == columns {
                    shown.clone()
                } else {
                    format!("{}{}  ", shown, " ".repeat(widths[i].saturating_sub(shown.width())))
                };
                line.push_str(&style(i, cell, &padded));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current = 0;
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if current + w > max_width.saturating_sub(1) {
            break;
        }
        result.push(c);
        current += w;
    }
    result.push('…');
    result
}

pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(timestamp);
    Formatter::new().convert(elapsed.to_std().unwrap_or_default())
}

/// The envelope message, unless it carries nothing ("OK").
pub fn message(text: &str) -> Option<String> {
    if text == "OK" || text.is_empty() {
        return None;
    }
    let lines: Vec<String> = text
        .split("; ")
        .map(|part| {
            let lower = part.to_lowercase();
            if lower.starts_with("no ") {
                styles::INFO.apply_to(part).to_string()
            } else if lower.contains("skipped") || lower.contains("not changed") {
                styles::WARNING.apply_to(part).to_string()
            } else {
                styles::SUCCESS.apply_to(part).to_string()
            }
        })
        .collect();
    Some(lines.join("\n"))
}

pub fn error(err: &ApiError) -> String {
    format!(
        "{} {}",
        styles::ERROR.apply_to(format!("Error [{}]:", err.code)),
        err.message
    )
}

pub fn page_footer(meta: &PageMeta) -> String {
    let noun = if meta.total == 1 { "item" } else { "items" };
    let text = if meta.total_pages > 1 {
        format!(
            "Page {} of {} ({} {})",
            meta.page, meta.total_pages, meta.total, noun
        )
    } else {
        format!("{} {}", meta.total, noun)
    };
    styles::FAINT.apply_to(text).to_string()
}

fn empty(what: &str) -> String {
    format!("{}\n", styles::MUTED.apply_to(format!("No {} found.", what)))
}

// --- media ---

pub fn media_table(items: &[MediaItem], now: DateTime<Utc>) -> String {
    if items.is_empty() {
        return empty("media");
    }
    let mut table = Table::new(vec![None, None, Some(NAME_WIDTH), None, None, None, None]);
    for m in items {
        let flags = format!(
            "{}{}",
            if m.starred { STAR_MARKER } else { " " },
            if m.favorited { FAVORITE_MARKER } else { " " }
        );
        table.push(vec![
            m.id.clone(),
            flags,
            m.name.clone(),
            m.media_type.as_str().to_string(),
            m.status.as_str().to_string(),
            time_ago(m.modified, now),
            m.tags.join(" "),
        ]);
    }
    table.render(|col, raw, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        1 => styles::STAR.apply_to(cell).to_string(),
        4 => styles::status(raw).apply_to(cell).to_string(),
        5 => styles::TIME.apply_to(cell).to_string(),
        6 => styles::TAG.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

pub fn media_detail(m: &MediaItem, now: DateTime<Utc>) -> String {
    let mut out = format!(
        "{} {}\n",
        styles::TITLE.apply_to(&m.name),
        styles::ID.apply_to(&m.id)
    );
    let fields = [
        ("type", m.media_type.as_str().to_string()),
        ("status", m.status.as_str().to_string()),
        ("folder", m.folder.clone()),
        ("tags", if m.tags.is_empty() { "-".into() } else { m.tags.join(", ") }),
        ("size", format_size(m.size)),
        ("used", yes_no(m.used)),
        ("starred", yes_no(m.starred)),
        ("favorited", yes_no(m.favorited)),
        ("created", m.created.to_rfc3339()),
        ("modified", time_ago(m.modified, now)),
    ];
    out.push_str(&fields_block(&fields));
    out
}

pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

fn yes_no(flag: bool) -> String {
    let word = if flag { "yes" } else { "no" };
    word.to_string()
}

fn fields_block(fields: &[(&str, String)]) -> String {
    let width = fields.iter().map(|(k, _)| k.width()).max().unwrap_or(0);
    fields
        .iter()
        .map(|(k, v)| {
            format!(
                "  {}{}  {}\n",
                styles::MUTED.apply_to(k),
                " ".repeat(width - k.width()),
                v
            )
        })
        .collect()
}

pub fn batch_outcome(outcome: &BatchOutcome) -> String {
    let mut out = String::new();
    for id in &outcome.succeeded {
        out.push_str(&format!("  {} {}\n", styles::SUCCESS.apply_to("ok"), id));
    }
    for failure in &outcome.failed {
        out.push_str(&format!(
            "  {} {} {}\n",
            styles::ERROR.apply_to("failed"),
            failure.id,
            styles::MUTED.apply_to(format!("[{}] {}", failure.code, failure.message))
        ));
    }
    out
}

pub fn usage(id: &str, collections: &[String]) -> String {
    if collections.is_empty() {
        return format!("{} is not in any collection\n", id);
    }
    format!("{} is in: {}\n", id, collections.join(", "))
}

// --- folders and collections ---

pub fn folder_table(folders: &[Folder]) -> String {
    if folders.is_empty() {
        return empty("folders");
    }
    let mut table = Table::new(vec![None, Some(NAME_WIDTH * 2)]);
    for f in folders {
        table.push(vec![f.id.clone(), f.path.clone()]);
    }
    table.render(|col, _, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

pub fn folder_detail(folder: &Folder, crumbs: &[Folder], direct: usize, total: usize) -> String {
    let trail: Vec<&str> = crumbs.iter().map(|f| f.name.as_str()).collect();
    let mut out = format!(
        "{} {}\n",
        styles::TITLE.apply_to(&folder.name),
        styles::ID.apply_to(&folder.id)
    );
    let fields = [
        ("path", trail.join(" › ")),
        ("parent", folder.parent.clone().unwrap_or_else(|| "-".into())),
        ("color", folder.color.clone().unwrap_or_else(|| "-".into())),
        ("media", format!("{} here, {} including subfolders", direct, total)),
    ];
    out.push_str(&fields_block(&fields));
    out
}

pub fn folder_deletion(deletion: &FolderDeletion) -> String {
    let mut out = format!(
        "Removed {} folder{}\n",
        deletion.removed.len(),
        if deletion.removed.len() == 1 { "" } else { "s" }
    );
    if deletion.reassigned_media > 0 {
        out.push_str(&format!(
            "Moved {} media item{} to {}\n",
            deletion.reassigned_media,
            if deletion.reassigned_media == 1 { "" } else { "s" },
            deletion.reassigned_to.as_deref().unwrap_or("-")
        ));
    }
    out
}

/// Prints a forest with box-drawing guides; `label` renders one record.
pub fn tree<T>(nodes: &[TreeNode<T>], label: &impl Fn(&T) -> String) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&label(&node.record));
        out.push('\n');
        tree_children(&node.children, "", label, &mut out);
    }
    out
}

fn tree_children<T>(nodes: &[TreeNode<T>], prefix: &str, label: &impl Fn(&T) -> String, out: &mut String) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        let guide = if last { "└── " } else { "├── " };
        out.push_str(&format!(
            "{}{}{}\n",
            styles::FAINT.apply_to(prefix),
            styles::FAINT.apply_to(guide),
            label(&node.record)
        ));
        let next = format!("{}{}", prefix, if last { "    " } else { "│   " });
        tree_children(&node.children, &next, label, out);
    }
}

pub fn folder_label(f: &Folder) -> String {
    format!("{} {}", f.name, styles::ID.apply_to(&f.id))
}

pub fn collection_label(c: &Collection) -> String {
    format!(
        "{} {} {}",
        c.name,
        styles::ID.apply_to(&c.id),
        styles::MUTED.apply_to(format!("({} items)", c.items.len()))
    )
}

pub fn collection_table(collections: &[Collection]) -> String {
    if collections.is_empty() {
        return empty("collections");
    }
    let mut table = Table::new(vec![None, Some(NAME_WIDTH), None, None, None]);
    for c in collections {
        table.push(vec![
            c.id.clone(),
            c.name.clone(),
            format!("{} items", c.items.len()),
            c.created_by.clone(),
            if c.is_shared {
                format!("shared with {}", c.shared_with.len())
            } else {
                String::new()
            },
        ]);
    }
    table.render(|col, _, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        2 | 3 => styles::MUTED.apply_to(cell).to_string(),
        4 => styles::TAG.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

pub fn collection_detail(c: &Collection) -> String {
    let mut out = format!(
        "{} {}\n",
        styles::TITLE.apply_to(&c.name),
        styles::ID.apply_to(&c.id)
    );
    let list = |ids: &[String]| if ids.is_empty() { "-".to_string() } else { ids.join(", ") };
    let fields = [
        ("description", c.description.clone().unwrap_or_else(|| "-".into())),
        ("color", c.color.clone()),
        ("owner", c.created_by.clone()),
        ("parent", c.parent_id.clone().unwrap_or_else(|| "-".into())),
        ("items", list(&c.items)),
        ("shared", list(&c.shared_with)),
    ];
    out.push_str(&fields_block(&fields));
    out
}

// --- tags, categories ---

pub fn tag_table(tags: &[Tag]) -> String {
    if tags.is_empty() {
        return empty("tags");
    }
    let mut table = Table::new(vec![None, Some(NAME_WIDTH), None, None]);
    for t in tags {
        table.push(vec![
            t.id.clone(),
            t.name.clone(),
            t.count.to_string(),
            t.category_id.clone().unwrap_or_default(),
        ]);
    }
    table.render(|col, _, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        1 => styles::TAG.apply_to(cell).to_string(),
        3 => styles::MUTED.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

pub fn tag_detail(t: &Tag) -> String {
    let mut out = format!(
        "{} {}\n",
        styles::TAG.apply_to(&t.name),
        styles::ID.apply_to(&t.id)
    );
    let fields = [
        ("used by", format!("{} media", t.count)),
        ("color", t.color.clone().unwrap_or_else(|| "-".into())),
        ("category", t.category_id.clone().unwrap_or_else(|| "-".into())),
    ];
    out.push_str(&fields_block(&fields));
    out
}

pub fn tag_deletion(deletion: &TagDeletion) -> String {
    format!(
        "Deleted tag '{}' ({} media updated)\n",
        deletion.tag.name, deletion.affected_media
    )
}

pub fn tagging_outcome(outcome: &TaggingOutcome) -> String {
    outcome
        .updated
        .iter()
        .map(|id| format!("  {} {}\n", styles::SUCCESS.apply_to("ok"), id))
        .collect()
}

pub fn category_table(categories: &[TagCategory]) -> String {
    if categories.is_empty() {
        return empty("categories");
    }
    let mut table = Table::new(vec![None, Some(NAME_WIDTH), None]);
    for c in categories {
        table.push(vec![
            c.id.clone(),
            c.name.clone(),
            c.description.clone().unwrap_or_default(),
        ]);
    }
    table.render(|col, _, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        2 => styles::MUTED.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

// --- users ---

pub fn user_table(users: &[User]) -> String {
    if users.is_empty() {
        return empty("users");
    }
    let mut table = Table::new(vec![None, Some(NAME_WIDTH), None, None]);
    for u in users {
        table.push(vec![
            u.id.clone(),
            u.name.clone(),
            u.email.clone(),
            u.role.as_str().to_string(),
        ]);
    }
    table.render(|col, _, cell| match col {
        0 => styles::ID.apply_to(cell).to_string(),
        3 => styles::MUTED.apply_to(cell).to_string(),
        _ => cell.to_string(),
    })
}

pub fn user_detail(u: &User) -> String {
    let mut out = format!(
        "{} {}\n",
        styles::TITLE.apply_to(&u.name),
        styles::ID.apply_to(&u.id)
    );
    let prefs = if u.preferences.is_empty() {
        "-".to_string()
    } else {
        serde_json::Value::Object(u.preferences.clone()).to_string()
    };
    let fields = [
        ("email", u.email.clone()),
        ("role", u.role.as_str().to_string()),
        ("preferences", prefs),
    ];
    out.push_str(&fields_block(&fields));
    out
}

pub fn recent(items: &RecentItems) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n", styles::TITLE.apply_to("Recent folders")));
    if items.folders.is_empty() {
        out.push_str(&format!("  {}\n", styles::MUTED.apply_to("none")));
    }
    for f in &items.folders {
        out.push_str(&format!("  {} {}\n", styles::ID.apply_to(&f.id), f.path));
    }
    out.push_str(&format!("{}\n", styles::TITLE.apply_to("Recent files")));
    if items.files.is_empty() {
        out.push_str(&format!("  {}\n", styles::MUTED.apply_to("none")));
    }
    for m in &items.files {
        out.push_str(&format!("  {} {}\n", styles::ID.apply_to(&m.id), m.name));
    }
    out
}

pub fn session(s: &Session) -> String {
    format!(
        "Logged in as {} <{}>\n{} {}\n{} {}\n",
        styles::TITLE.apply_to(&s.user.name),
        s.user.email,
        styles::MUTED.apply_to("token  "),
        s.token,
        styles::MUTED.apply_to("expires"),
        s.expires_at.to_rfc3339()
    )
}

pub fn stats(counts: &StoreCounts) -> String {
    fields_block(&[
        ("folders", counts.folders.to_string()),
        ("media", counts.media.to_string()),
        ("collections", counts.collections.to_string()),
        ("tags", counts.tags.to_string()),
        ("categories", counts.categories.to_string()),
        ("users", counts.users.to_string()),
    ])
}
