//! Attribute specifications and registries.
//!
//! Each entity declares which of its fields exist, what kind of value they hold
//! and whether they can be filtered, sorted or free-text searched. The query
//! engine consults these registries to reject unknown fields and to turn raw
//! `name=value` criteria into typed [`AttrFilter`]s.

use chrono::{DateTime, NaiveDate, Utc};

use super::filter::AttrFilter;
use super::value::{parse_bool, AttrValue};
use crate::error::{Result, StashError};

/// The kind of value an attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Bool,
    Text,
    Enum,
    Number,
    Date,
    List,
    /// Nullable reference to another record by id
    Ref,
}

/// Specification for a single attribute.
#[derive(Debug, Clone)]
pub struct AttributeSpec {
    /// The attribute name used in the API (camelCase, as serialized)
    pub name: &'static str,

    /// The kind of value this attribute holds
    pub kind: AttributeKind,

    /// Whether this attribute can be used in filter criteria
    pub filterable: bool,

    /// Whether this attribute can be used as a sort key
    pub sortable: bool,

    /// Whether free-text search looks at this attribute
    pub searchable: bool,
}

impl AttributeSpec {
    /// Create a new attribute spec with default flags (all false).
    const fn new(name: &'static str, kind: AttributeKind) -> Self {
        Self {
            name,
            kind,
            filterable: false,
            sortable: false,
            searchable: false,
        }
    }

    const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }
}

use AttributeKind::*;

pub const FOLDER_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("parent", Ref).filterable().sortable(),
    AttributeSpec::new("path", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("color", Text).filterable(),
    AttributeSpec::new("created", Date).filterable().sortable(),
    AttributeSpec::new("modified", Date).filterable().sortable(),
];

pub const MEDIA_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("type", Enum).filterable().sortable(),
    AttributeSpec::new("folder", Ref).filterable().sortable(),
    AttributeSpec::new("tags", List).filterable().searchable(),
    AttributeSpec::new("status", Enum).filterable().sortable(),
    AttributeSpec::new("used", Bool).filterable().sortable(),
    AttributeSpec::new("starred", Bool).filterable().sortable(),
    AttributeSpec::new("favorited", Bool).filterable().sortable(),
    AttributeSpec::new("created", Date).filterable().sortable(),
    AttributeSpec::new("modified", Date).filterable().sortable(),
    AttributeSpec::new("size", Number).filterable().sortable(),
];

pub const COLLECTION_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("description", Text).searchable(),
    AttributeSpec::new("color", Text).filterable(),
    AttributeSpec::new("items", List).filterable(),
    AttributeSpec::new("createdBy", Ref).filterable().sortable(),
    AttributeSpec::new("isShared", Bool).filterable().sortable(),
    AttributeSpec::new("sharedWith", List).filterable(),
    AttributeSpec::new("parentId", Ref).filterable().sortable(),
    AttributeSpec::new("created", Date).filterable().sortable(),
    AttributeSpec::new("modified", Date).filterable().sortable(),
];

pub const TAG_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("color", Text).filterable(),
    AttributeSpec::new("count", Number).filterable().sortable(),
    AttributeSpec::new("categoryId", Ref).filterable().sortable(),
    AttributeSpec::new("created", Date).filterable().sortable(),
];

pub const CATEGORY_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("description", Text).searchable(),
];

pub const USER_ATTRIBUTES: &[AttributeSpec] = &[
    AttributeSpec::new("id", Text).filterable().sortable(),
    AttributeSpec::new("name", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("email", Text)
        .filterable()
        .sortable()
        .searchable(),
    AttributeSpec::new("role", Enum).filterable().sortable(),
    AttributeSpec::new("created", Date).filterable().sortable(),
];

/// Look up an attribute spec by name.
pub fn get_spec<'a>(specs: &'a [AttributeSpec], name: &str) -> Option<&'a AttributeSpec> {
    specs.iter().find(|s| s.name == name)
}

/// Names of the attributes free-text search looks at.
pub fn searchable_attrs(specs: &[AttributeSpec]) -> impl Iterator<Item = &'static str> + '_ {
    specs.iter().filter(|s| s.searchable).map(|s| s.name)
}

/// Ensures `name` is a sortable attribute of the given registry.
pub fn require_sortable(specs: &[AttributeSpec], name: &str) -> Result<()> {
    match get_spec(specs, name) {
        Some(spec) if spec.sortable => Ok(()),
        _ => Err(StashError::invalid(format!("Cannot sort by '{}'", name))),
    }
}

/// Ensures every filter targets a filterable attribute of the given registry.
pub fn require_filterable(specs: &[AttributeSpec], filters: &[AttrFilter]) -> Result<()> {
    for filter in filters {
        match get_spec(specs, &filter.attr) {
            Some(spec) if spec.filterable => {}
            _ => {
                return Err(StashError::invalid(format!(
                    "Cannot filter by '{}'",
                    filter.attr
                )))
            }
        }
    }
    Ok(())
}

/// Splits a raw `name=value` criterion.
pub fn split_criterion(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| StashError::invalid(format!("Expected name=value, got '{}'", raw)))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(StashError::invalid(format!("Missing field name in '{}'", raw)));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Turns a raw criterion into a typed filter using the registry.
///
/// | Field kind | Raw value | Filter |
/// |------------|-----------|--------|
/// | `Bool` | `true` / `false` (any case) | equality |
/// | `List` | `a,b` | any of |
/// | `Ref` | `null` / `none` | equality with no reference |
/// | any scalar | `a,b` | any of |
/// | any scalar | `a` | equality |
///
/// `dateFrom` and `dateTo` are pseudo-fields producing inclusive bounds on `created`.
pub fn parse_criterion(specs: &[AttributeSpec], name: &str, raw: &str) -> Result<AttrFilter> {
    match name {
        "dateFrom" => return Ok(AttrFilter::on_or_after("created", parse_date(raw)?)),
        "dateTo" => return Ok(AttrFilter::on_or_before("created", parse_date(raw)?)),
        _ => {}
    }

    let spec = get_spec(specs, name)
        .filter(|s| s.filterable)
        .ok_or_else(|| StashError::invalid(format!("Cannot filter by '{}'", name)))?;

    let filter = match spec.kind {
        Bool => {
            let flag = parse_bool(raw).ok_or_else(|| {
                StashError::invalid(format!("Expected true or false for '{}'", name))
            })?;
            AttrFilter::eq(name, AttrValue::Bool(flag))
        }
        List => AttrFilter::any_of(name, split_list(raw)),
        Ref if matches!(raw.to_ascii_lowercase().as_str(), "null" | "none" | "") => {
            AttrFilter::eq(name, AttrValue::Ref(None))
        }
        Number if !raw.contains(',') => {
            let n = raw.parse::<f64>().map_err(|_| {
                StashError::invalid(format!("Expected a number for '{}'", name))
            })?;
            AttrFilter::eq(name, AttrValue::Number(n))
        }
        Date => AttrFilter::eq(name, AttrValue::Date(parse_date(raw)?)),
        _ if raw.contains(',') => AttrFilter::any_of(name, split_list(raw)),
        Enum => AttrFilter::eq(name, AttrValue::Enum(raw.to_string())),
        _ => AttrFilter::eq(name, AttrValue::Text(raw.to_string())),
    };
    Ok(filter)
}

/// Parses an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_date(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| StashError::invalid(format!("Invalid date '{}'", raw)))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::FilterOp;

    #[test]
    fn media_search_fields_are_name_and_tags() {
        let fields: Vec<_> = searchable_attrs(MEDIA_ATTRIBUTES).collect();
        assert_eq!(fields, vec!["name", "tags"]);
    }

    #[test]
    fn parse_bool_criterion_coerces() {
        let f = parse_criterion(MEDIA_ATTRIBUTES, "starred", "TRUE").unwrap();
        assert_eq!(f.op, FilterOp::Eq);
        assert_eq!(f.value, AttrValue::Bool(true));

        assert!(parse_criterion(MEDIA_ATTRIBUTES, "starred", "maybe").is_err());
    }

    #[test]
    fn parse_list_criterion_is_any_of() {
        let f = parse_criterion(MEDIA_ATTRIBUTES, "tags", "x, y").unwrap();
        assert_eq!(f.op, FilterOp::AnyOf);
        assert_eq!(f.value, AttrValue::List(vec!["x".into(), "y".into()]));
    }

    #[test]
    fn parse_scalar_with_commas_is_any_of() {
        let f = parse_criterion(MEDIA_ATTRIBUTES, "type", "image,video").unwrap();
        assert_eq!(f.op, FilterOp::AnyOf);
    }

    #[test]
    fn parse_null_ref() {
        let f = parse_criterion(FOLDER_ATTRIBUTES, "parent", "null").unwrap();
        assert_eq!(f.value, AttrValue::Ref(None));
    }

    #[test]
    fn parse_date_bounds() {
        let f = parse_criterion(MEDIA_ATTRIBUTES, "dateFrom", "2024-01-01").unwrap();
        assert_eq!(f.attr, "created");
        assert_eq!(f.op, FilterOp::OnOrAfter);

        let f = parse_criterion(MEDIA_ATTRIBUTES, "dateTo", "2024-01-01T12:00:00Z").unwrap();
        assert_eq!(f.op, FilterOp::OnOrBefore);

        assert!(parse_criterion(MEDIA_ATTRIBUTES, "dateTo", "yesterday").is_err());
    }

    #[test]
    fn unknown_or_unfilterable_fields_are_rejected() {
        assert!(parse_criterion(MEDIA_ATTRIBUTES, "colour", "red").is_err());
        assert!(parse_criterion(COLLECTION_ATTRIBUTES, "description", "x").is_err());
    }

    #[test]
    fn split_criterion_requires_equals() {
        assert_eq!(
            split_criterion("type=image").unwrap(),
            ("type".to_string(), "image".to_string())
        );
        assert!(split_criterion("type").is_err());
        assert!(split_criterion("=image").is_err());
    }

    #[test]
    fn require_sortable_checks_registry() {
        assert!(require_sortable(MEDIA_ATTRIBUTES, "size").is_ok());
        assert!(require_sortable(MEDIA_ATTRIBUTES, "tags").is_err());
        assert!(require_sortable(MEDIA_ATTRIBUTES, "nope").is_err());
    }
}
