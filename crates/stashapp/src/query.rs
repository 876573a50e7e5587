//! # Query Engine
//!
//! Generic filter → sort → paginate over any record table.
//!
//! ## Pipeline
//!
//! 1. **Validation**: filter and sort fields are checked against the entity's
//!    attribute registry; unknown fields are an `invalid_request`.
//! 2. **Filtering**: every [`AttrFilter`] must match (AND). The free-text
//!    `search` term matches if any searchable attribute contains it,
//!    case-insensitively.
//! 3. **Sorting**: stable. Missing values go last in both directions.
//! 4. **Pagination**: 1-based pages; an out-of-range page is empty but carries
//!    correct metadata.
//!
//! The source table is never mutated; the returned page owns clones.

use serde::Serialize;
use std::cmp::Ordering;

use crate::attributes::{
    require_filterable, require_sortable, searchable_attrs, AttrFilter, AttrValue,
};
use crate::error::{Result, StashError};
use crate::model::Record;

pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl std::str::FromStr for SortDirection {
    type Err = StashError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(StashError::invalid(format!("Unknown sort order '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filters: Vec<AttrFilter>,
    pub search: Option<String>,
    pub sort: Option<SortSpec>,
    pub page: usize,
    pub page_size: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            search: None,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: AttrFilter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(mut self, page: usize, page_size: usize) -> Self {
        self.page = page;
        self.page_size = page_size;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
    pub has_next_page: bool,
    pub has_previous_page: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Runs the full pipeline over `records`.
pub fn run<T: Record>(records: &[T], query: &Query) -> Result<Page<T>> {
    require_filterable(T::ATTRIBUTES, &query.filters)?;
    if let Some(sort) = &query.sort {
        require_sortable(T::ATTRIBUTES, &sort.field)?;
    }

    let mut matched: Vec<T> = records
        .iter()
        .filter(|r| matches_all(*r, &query.filters))
        .filter(|r| {
            query
                .search
                .as_deref()
                .map_or(true, |term| matches_search(*r, term))
        })
        .cloned()
        .collect();

    if let Some(sort) = &query.sort {
        sort_records(&mut matched, sort);
    }

    paginate(matched, query.page, query.page_size)
}

/// True if the record satisfies every filter.
pub fn matches_all<T: Record>(record: &T, filters: &[AttrFilter]) -> bool {
    filters.iter().all(|f| f.matches(record))
}

/// True if any searchable attribute contains `term` (case-insensitive).
/// A blank term matches everything.
pub fn matches_search<T: Record>(record: &T, term: &str) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    searchable_attrs(T::ATTRIBUTES).any(|attr| AttrFilter::matches_text(attr, term).matches(record))
}

/// Stable sort by a single attribute.
pub fn sort_records<T: Record>(records: &mut [T], sort: &SortSpec) {
    records.sort_by(|a, b| {
        compare_values(
            a.get_attr(&sort.field).as_ref(),
            b.get_attr(&sort.field).as_ref(),
            sort.direction,
        )
    });
}

/// Compares two optional attribute values.
///
/// Missing values order after present ones regardless of `direction`; only the
/// ordering of two present values is reversed for descending sorts.
pub fn compare_values(
    a: Option<&AttrValue>,
    b: Option<&AttrValue>,
    direction: SortDirection,
) -> Ordering {
    let a = a.filter(|v| !v.is_missing());
    let b = b.filter(|v| !v.is_missing());
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let ord = compare_present(a, b);
            match direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        }
    }
}

/// Total order over present values.
///
/// Numeric values (numbers, and text that parses as one) rank before all other
/// text, so mixed columns like `9`, `10`, `1a` never form a cycle. Text compares
/// case-insensitively. Distinct values that still tie (`07` and `7`, `Apple` and
/// `apple`) fall back to their raw text, so only identical values compare equal.
fn compare_present(a: &AttrValue, b: &AttrValue) -> Ordering {
    match (a, b) {
        (AttrValue::Date(x), AttrValue::Date(y)) => x.cmp(y),
        (AttrValue::Bool(x), AttrValue::Bool(y)) => x.cmp(y),
        _ => {
            let (x, y) = (sort_key(a), sort_key(b));
            // "nan" and "inf" parse as floats but sort as words.
            let number = |v: &AttrValue| v.as_number().filter(|n| n.is_finite());
            match (number(a), number(b)) {
                (Some(n), Some(m)) => n.total_cmp(&m).then_with(|| x.cmp(&y)),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => x
                    .to_lowercase()
                    .cmp(&y.to_lowercase())
                    .then_with(|| x.cmp(&y)),
            }
        }
    }
}

fn sort_key(value: &AttrValue) -> String {
    match value {
        AttrValue::List(items) => items.first().cloned().unwrap_or_default(),
        other => other.as_str().unwrap_or_default().to_string(),
    }
}

/// Slices one page out of `items`.
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Result<Page<T>> {
    if page == 0 {
        return Err(StashError::invalid("page must be 1 or greater"));
    }
    if page_size == 0 {
        return Err(StashError::invalid("pageSize must be 1 or greater"));
    }

    let total = items.len();
    let total_pages = total.div_ceil(page_size);
    let start = (page - 1).saturating_mul(page_size);
    let items: Vec<T> = items.into_iter().skip(start).take(page_size).collect();

    Ok(Page {
        items,
        meta: PageMeta {
            page,
            page_size,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_previous_page: page > 1,
        },
    })
}
