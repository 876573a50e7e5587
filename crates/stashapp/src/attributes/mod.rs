//! # Attribute System
//!
//! A uniform view of record fields used by the query engine. Instead of writing a
//! filter or a comparator per entity and field, every record exposes its fields
//! through [`Record::get_attr`](crate::model::Record::get_attr) and every entity
//! declares a registry of [`AttributeSpec`]s.
//!
//! ## Attribute Kinds
//!
//! | Kind | Examples | Filtering |
//! |------|----------|-----------|
//! | `Bool` | `starred`, `isShared` | equality, `"true"` coerced |
//! | `Text` | `name`, `path` | equality, substring search |
//! | `Enum` | `type`, `status`, `role` | equality, any-of |
//! | `Number` | `size`, `count` | equality, numeric sort |
//! | `Date` | `created`, `modified` | inclusive range |
//! | `List` | `tags`, `items` | any-of, contains-all |
//! | `Ref` | `folder`, `parent` | equality, `null` for none |
//!
//! ## Usage
//!
//! ```ignore
//! let filter = AttrFilter::eq("type", AttrValue::Enum("image".into()));
//! if filter.matches(&media_item) { ... }
//!
//! let filter = parse_criterion(MEDIA_ATTRIBUTES, "tags", "beach,sunset")?;
//! ```

mod filter;
mod spec;
mod value;

pub use filter::{AttrFilter, FilterOp};
pub use spec::{
    get_spec, parse_criterion, parse_date, require_filterable, require_sortable,
    searchable_attrs, split_criterion, AttributeKind, AttributeSpec, CATEGORY_ATTRIBUTES,
    COLLECTION_ATTRIBUTES, FOLDER_ATTRIBUTES, MEDIA_ATTRIBUTES, TAG_ATTRIBUTES, USER_ATTRIBUTES,
};
pub use value::{parse_bool, AttrValue};
