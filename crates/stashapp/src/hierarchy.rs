//! # Hierarchy Builder
//!
//! Folders and collections are stored flat, each row pointing at its parent.
//! This module derives trees from those parent pointers.
//!
//! ## Forest Construction
//!
//! [`build_forest`] groups rows by parent id, then walks down from the roots
//! (rows whose parent is null). Children keep the relative order they have in
//! the table. The source slice is never mutated; nodes own clones.
//!
//! ## Malformed Input
//!
//! Parent pointers are data, and data can be wrong:
//!
//! - **Cycles** (`A → B → A`, or a row pointing at itself) are never reachable
//!   from a root, so the walk itself always terminates. Rows left unplaced are
//!   then inspected; if their ancestor chain loops, the build fails with a
//!   `DataIntegrity` error instead of silently dropping them.
//! - **Dangling parents** (pointing at a missing id) are omitted from the forest
//!   and logged.
//!
//! Every walk in this module carries a visited set, so enumeration never
//! revisits an id and never recurses without bound.

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::error::{Result, StashError};
use crate::model::TreeRecord;

/// A record with its nested children.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<T> {
    #[serde(flatten)]
    pub record: T,
    pub children: Vec<TreeNode<T>>,
}

impl<T> TreeNode<T> {
    /// Number of nodes in this subtree, including this one.
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(TreeNode::size).sum::<usize>()
    }
}

/// Builds the forest rooted at records without a parent.
pub fn build_forest<T: TreeRecord>(records: &[T]) -> Result<Vec<TreeNode<T>>> {
    let children_of = group_by_parent(records);
    let mut visited: HashSet<&str> = HashSet::new();

    let roots = children_of.get(&None).cloned().unwrap_or_default();
    let mut forest = Vec::with_capacity(roots.len());
    for root in roots {
        forest.push(build_node(root, &children_of, &mut visited)?);
    }

    if visited.len() < records.len() {
        for record in records.iter().filter(|r| !visited.contains(r.id())) {
            // Errors out on a loop; otherwise the chain ends at a missing parent.
            ancestor_ids(records, record.id())?;
            tracing::warn!(
                entity = T::ENTITY,
                id = record.id(),
                parent = record.parent_id().unwrap_or_default(),
                "omitting record with dangling parent from tree"
            );
        }
    }

    Ok(forest)
}

fn group_by_parent<T: TreeRecord>(records: &[T]) -> HashMap<Option<&str>, Vec<&T>> {
    let mut children_of: HashMap<Option<&str>, Vec<&T>> = HashMap::new();
    for record in records {
        children_of
            .entry(record.parent_id())
            .or_default()
            .push(record);
    }
    children_of
}

fn build_node<'a, T: TreeRecord>(
    record: &'a T,
    children_of: &HashMap<Option<&str>, Vec<&'a T>>,
    visited: &mut HashSet<&'a str>,
) -> Result<TreeNode<T>> {
    if !visited.insert(record.id()) {
        return Err(cycle_error::<T>(record.id()));
    }

    let mut children = Vec::new();
    if let Some(kids) = children_of.get(&Some(record.id())) {
        for kid in kids.iter().copied() {
            children.push(build_node(kid, children_of, visited)?);
        }
    }

    Ok(TreeNode {
        record: record.clone(),
        children,
    })
}

/// Returns all transitive descendant ids of `id`, depth-first.
///
/// The starting id itself is not included. Reaching an id twice means the
/// parent links loop, which is reported as a `DataIntegrity` error.
pub fn descendant_ids<T: TreeRecord>(records: &[T], id: &str) -> Result<Vec<String>> {
    let children_of = group_by_parent(records);
    let mut visited: HashSet<&str> = HashSet::from([id]);
    let mut out = Vec::new();
    let mut stack: Vec<&str> = vec![id];

    while let Some(current) = stack.pop() {
        if current != id {
            out.push(current.to_string());
        }
        let Some(kids) = children_of.get(&Some(current)) else {
            continue;
        };
        // Reverse push keeps siblings in table order.
        for kid in kids.iter().rev() {
            if !visited.insert(kid.id()) {
                return Err(cycle_error::<T>(kid.id()));
            }
            stack.push(kid.id());
        }
    }

    Ok(out)
}

/// Returns the ancestor ids of `id`, nearest parent first, ending at a root or
/// at the first parent that doesn't resolve.
pub fn ancestor_ids<T: TreeRecord>(records: &[T], id: &str) -> Result<Vec<String>> {
    let by_id: HashMap<&str, &T> = records.iter().map(|r| (r.id(), r)).collect();
    let mut visited: HashSet<&str> = HashSet::from([id]);
    let mut out = Vec::new();

    let mut current = by_id.get(id).and_then(|r| r.parent_id());
    while let Some(parent) = current {
        if !visited.insert(parent) {
            return Err(cycle_error::<T>(parent));
        }
        out.push(parent.to_string());
        current = by_id.get(parent).and_then(|r| r.parent_id());
    }

    Ok(out)
}

/// True if `candidate` is `id` itself or one of its descendants.
pub fn is_self_or_descendant<T: TreeRecord>(records: &[T], id: &str, candidate: &str) -> Result<bool> {
    if id == candidate {
        return Ok(true);
    }
    Ok(descendant_ids(records, id)?.iter().any(|d| d == candidate))
}

fn cycle_error<T: TreeRecord>(id: &str) -> StashError {
    StashError::DataIntegrity(format!(
        "{} hierarchy contains a cycle at '{}'",
        T::ENTITY,
        id
    ))
}
