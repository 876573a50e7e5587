//! An ordered, id-unique table of records.

use crate::error::{Result, StashError};
use crate::model::Record;

#[derive(Debug, Clone, PartialEq)]
pub struct Table<T: Record> {
    rows: Vec<T>,
}

impl<T: Record> Default for Table<T> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<T: Record> Table<T> {
    /// Builds a table from seed rows, rejecting duplicate ids.
    pub fn from_rows(rows: Vec<T>) -> Result<Self> {
        let mut table = Self::default();
        for row in rows {
            table.insert(row)?;
        }
        Ok(table)
    }

    pub fn all(&self) -> &[T] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Like [`Table::get`], but a missing id is a `not_found` error.
    pub fn require(&self, id: &str) -> Result<&T> {
        self.get(id).ok_or_else(|| StashError::not_found(T::ENTITY, id))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.rows.iter().any(|r| r.id() == id)
    }

    /// Ids from `ids` that do not resolve, in input order.
    pub fn missing<'a>(&self, ids: &'a [String]) -> Vec<&'a String> {
        ids.iter().filter(|id| !self.contains(id)).collect()
    }

    pub fn insert(&mut self, row: T) -> Result<()> {
        if self.contains(row.id()) {
            return Err(StashError::DataIntegrity(format!(
                "duplicate {} id '{}'",
                T::ENTITY,
                row.id()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Replaces the row with the same id, keeping its position.
    pub fn replace(&mut self, row: T) -> Result<()> {
        let slot = self
            .rows
            .iter_mut()
            .find(|r| r.id() == row.id())
            .ok_or_else(|| StashError::not_found(T::ENTITY, row.id()))?;
        *slot = row;
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<T> {
        let pos = self
            .rows
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| StashError::not_found(T::ENTITY, id))?;
        Ok(self.rows.remove(pos))
    }

    /// Removes every row matching `pred`, returning the removed rows.
    pub fn remove_where(&mut self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        let (removed, kept): (Vec<T>, Vec<T>) = self.rows.drain(..).partition(|r| pred(r));
        self.rows = kept;
        removed
    }

    /// Applies `apply` in place to every row matching `pred`. Returns the number
    /// of rows touched.
    pub fn update_where(&mut self, pred: impl Fn(&T) -> bool, mut apply: impl FnMut(&mut T)) -> usize {
        let mut touched = 0;
        for row in self.rows.iter_mut().filter(|r| pred(r)) {
            apply(row);
            touched += 1;
        }
        touched
    }

    pub(crate) fn clear(&mut self) {
        self.rows.clear();
    }
}
