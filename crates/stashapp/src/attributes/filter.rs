//! Attribute filtering.
//!
//! `AttrFilter` expresses a filter condition that can be applied to any
//! [`Record`], independent of the entity type.

use chrono::{DateTime, Utc};

use super::AttrValue;
use crate::model::Record;

/// Filter operation for comparing attribute values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact equality match (booleans coerced from strings).
    Eq,
    /// Not equal.
    Ne,
    /// The attribute shares at least one value with the filter list.
    /// Scalar attributes count as a one-element set.
    AnyOf,
    /// List attribute contains ALL filter values (AND logic).
    ContainsAll,
    /// Case-insensitive substring match (any element for lists).
    Matches,
    /// Date attribute is at or after the filter date.
    OnOrAfter,
    /// Date attribute is at or before the filter date.
    OnOrBefore,
}

/// A filter condition on an attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrFilter {
    /// The attribute name (e.g., "starred", "type", "tags")
    pub attr: String,
    pub op: FilterOp,
    /// The value to compare against
    pub value: AttrValue,
}

impl AttrFilter {
    pub fn new(attr: impl Into<String>, op: FilterOp, value: AttrValue) -> Self {
        Self {
            attr: attr.into(),
            op,
            value,
        }
    }

    pub fn eq(attr: impl Into<String>, value: AttrValue) -> Self {
        Self::new(attr, FilterOp::Eq, value)
    }

    pub fn ne(attr: impl Into<String>, value: AttrValue) -> Self {
        Self::new(attr, FilterOp::Ne, value)
    }

    pub fn any_of(attr: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(attr, FilterOp::AnyOf, AttrValue::List(values))
    }

    pub fn contains_all(attr: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(attr, FilterOp::ContainsAll, AttrValue::List(values))
    }

    pub fn matches_text(attr: impl Into<String>, term: impl Into<String>) -> Self {
        Self::new(attr, FilterOp::Matches, AttrValue::Text(term.into()))
    }

    pub fn on_or_after(attr: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self::new(attr, FilterOp::OnOrAfter, AttrValue::Date(date))
    }

    pub fn on_or_before(attr: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self::new(attr, FilterOp::OnOrBefore, AttrValue::Date(date))
    }

    /// Check if this filter matches the given record.
    ///
    /// Returns `false` if the attribute doesn't exist or doesn't match.
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        let Some(attr_value) = record.get_attr(&self.attr) else {
            return false;
        };

        match &self.op {
            FilterOp::Eq => values_equal(&attr_value, &self.value),
            FilterOp::Ne => !values_equal(&attr_value, &self.value),
            FilterOp::AnyOf => any_of(&attr_value, &self.value),
            FilterOp::ContainsAll => contains_all(&attr_value, &self.value),
            FilterOp::Matches => text_matches(&attr_value, &self.value),
            FilterOp::OnOrAfter => date_cmp(&attr_value, &self.value, |a, b| a >= b),
            FilterOp::OnOrBefore => date_cmp(&attr_value, &self.value, |a, b| a <= b),
        }
    }
}

/// Check if two attribute values are equal.
///
/// Booleans compare against their string forms (`"true" == true`), numbers
/// against numeric strings, and a present reference against plain text.
fn values_equal(a: &AttrValue, b: &AttrValue) -> bool {
    match (a, b) {
        (AttrValue::Bool(_), _) | (_, AttrValue::Bool(_)) => {
            matches!((a.as_bool(), b.as_bool()), (Some(x), Some(y)) if x == y)
        }
        (AttrValue::Number(_), _) | (_, AttrValue::Number(_)) => {
            matches!((a.as_number(), b.as_number()), (Some(x), Some(y)) if x == y)
        }
        (AttrValue::Date(x), AttrValue::Date(y)) => x == y,
        (AttrValue::List(x), AttrValue::List(y)) => x == y,
        (AttrValue::Ref(None), AttrValue::Ref(None)) => true,
        _ => matches!((a.as_str(), b.as_str()), (Some(x), Some(y)) if x == y),
    }
}

fn any_of(attr_value: &AttrValue, filter_value: &AttrValue) -> bool {
    let wanted = filter_value.as_set();
    attr_value.as_set().iter().any(|v| wanted.contains(v))
}

fn contains_all(attr_value: &AttrValue, filter_value: &AttrValue) -> bool {
    let have = attr_value.as_set();
    filter_value.as_set().iter().all(|v| have.contains(v))
}

fn text_matches(attr_value: &AttrValue, filter_value: &AttrValue) -> bool {
    let Some(term) = filter_value.as_str() else {
        return false;
    };
    let term = term.to_lowercase();
    attr_value
        .as_set()
        .iter()
        .any(|v| v.to_lowercase().contains(&term))
}

fn date_cmp(
    attr_value: &AttrValue,
    filter_value: &AttrValue,
    cmp: impl Fn(DateTime<Utc>, DateTime<Utc>) -> bool,
) -> bool {
    match (attr_value.as_date(), filter_value.as_date()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}
