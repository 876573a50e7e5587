//! Attribute value types.
//!
//! This module defines the runtime representation of record attribute values,
//! shared by filtering and sorting.

use chrono::{DateTime, Utc};

/// Runtime representation of an attribute value.
///
/// Every record exposes its fields through `Record::get_attr`, which wraps the
/// field in the matching variant. Filters carry their comparison value in the
/// same type.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Boolean flag (e.g., `starred`, `isShared`)
    Bool(bool),

    /// Free text (e.g., `name`, `path`, `email`)
    Text(String),

    /// Closed set value as its wire string (e.g., `type` = "image")
    Enum(String),

    /// Numeric value (e.g., `size`, `count`)
    Number(f64),

    /// Timestamp (e.g., `created`, `modified`)
    Date(DateTime<Utc>),

    /// List of strings (e.g., `tags`, `items`, `sharedWith`)
    List(Vec<String>),

    /// Optional reference to another record by id (e.g., `parent`, `folder`)
    Ref(Option<String>),
}

impl AttrValue {
    /// Check if this value represents a "truthy" state.
    ///
    /// - Bool: the boolean value itself
    /// - Text/Enum: non-empty
    /// - Number: non-zero
    /// - Date: always true
    /// - List: true if non-empty
    /// - Ref: true if Some
    pub fn is_truthy(&self) -> bool {
        match self {
            AttrValue::Bool(v) => *v,
            AttrValue::Text(s) | AttrValue::Enum(s) => !s.is_empty(),
            AttrValue::Number(n) => *n != 0.0,
            AttrValue::Date(_) => true,
            AttrValue::List(v) => !v.is_empty(),
            AttrValue::Ref(v) => v.is_some(),
        }
    }

    /// True for values that sort as "missing" (null references).
    pub fn is_missing(&self) -> bool {
        matches!(self, AttrValue::Ref(None))
    }

    /// Get the boolean value, coercing `"true"` / `"false"` strings.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            AttrValue::Text(s) | AttrValue::Enum(s) => parse_bool(s),
            _ => None,
        }
    }

    /// Get a string view for Text, Enum and a present Ref.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) | AttrValue::Enum(s) => Some(s),
            AttrValue::Ref(Some(s)) => Some(s),
            _ => None,
        }
    }

    /// Get the numeric value, parsing numeric-looking strings.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            AttrValue::Text(s) | AttrValue::Enum(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            AttrValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Get the list if this is a List.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AttrValue::List(v) => Some(v),
            _ => None,
        }
    }

    /// Get the referenced id if this is a Ref.
    pub fn as_ref(&self) -> Option<Option<&str>> {
        match self {
            AttrValue::Ref(v) => Some(v.as_deref()),
            _ => None,
        }
    }

    /// The set of strings this value contributes to a set comparison.
    ///
    /// Lists contribute their elements, scalar strings contribute themselves,
    /// null references contribute nothing.
    pub fn as_set(&self) -> Vec<&str> {
        match self {
            AttrValue::List(v) => v.iter().map(String::as_str).collect(),
            other => other.as_str().into_iter().collect(),
        }
    }
}

/// Parses a boolean-like string: `true`/`false`, case-insensitive.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_truthy_for_bool() {
        assert!(AttrValue::Bool(true).is_truthy());
        assert!(!AttrValue::Bool(false).is_truthy());
    }

    #[test]
    fn is_truthy_for_list() {
        assert!(AttrValue::List(vec!["a".into()]).is_truthy());
        assert!(!AttrValue::List(vec![]).is_truthy());
    }

    #[test]
    fn is_truthy_for_ref() {
        assert!(AttrValue::Ref(Some("fld-1".into())).is_truthy());
        assert!(!AttrValue::Ref(None).is_truthy());
    }

    #[test]
    fn as_bool_coerces_strings() {
        assert_eq!(AttrValue::Bool(true).as_bool(), Some(true));
        assert_eq!(AttrValue::Text("true".into()).as_bool(), Some(true));
        assert_eq!(AttrValue::Text("FALSE".into()).as_bool(), Some(false));
        assert_eq!(AttrValue::Text("yes".into()).as_bool(), None);
        assert_eq!(AttrValue::Number(1.0).as_bool(), None);
    }

    #[test]
    fn as_number_parses_numeric_text() {
        assert_eq!(AttrValue::Number(3.5).as_number(), Some(3.5));
        assert_eq!(AttrValue::Text("1024".into()).as_number(), Some(1024.0));
        assert_eq!(AttrValue::Text("big".into()).as_number(), None);
    }

    #[test]
    fn as_set_treats_scalars_as_singletons() {
        assert_eq!(AttrValue::Text("a".into()).as_set(), vec!["a"]);
        assert_eq!(
            AttrValue::List(vec!["a".into(), "b".into()]).as_set(),
            vec!["a", "b"]
        );
        assert!(AttrValue::Ref(None).as_set().is_empty());
    }
}
