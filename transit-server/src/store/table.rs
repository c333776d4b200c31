//! In-memory tables holding the records of one feed file.
//!
//! Each table remembers the header it was imported with. The header's
//! field list governs how later records are written back out, so export
//! only ever emits the fields the source file declared.

use std::collections::HashMap;
use std::io::Write;

use crate::feed::{FieldList, Keyed, Record};

/// Records of one file, in import order, with the header they came from.
#[derive(Debug, Clone)]
pub struct Table<T> {
    /// Header line as it appeared in the source file.
    header: String,
    fields: FieldList,
    rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            header: String::new(),
            fields: FieldList::default(),
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    /// Drop every record and forget the header.
    pub fn clear(&mut self) {
        self.header.clear();
        self.fields = FieldList::default();
        self.rows.clear();
    }

    /// Record the header that subsequent rows are laid out by.
    pub fn set_header(&mut self, header: &str, fields: FieldList) {
        self.header = header.to_string();
        self.fields = fields;
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn fields(&self) -> &FieldList {
        &self.fields
    }

    pub fn push(&mut self, record: T) {
        self.rows.push(record);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }

    /// First record matching `pred`.
    pub fn find(&self, pred: impl Fn(&T) -> bool) -> Option<&T> {
        self.rows.iter().find(|r| pred(r))
    }

    pub fn find_mut(&mut self, pred: impl Fn(&T) -> bool) -> Option<&mut T> {
        self.rows.iter_mut().find(|r| pred(r))
    }
}

impl<T: Record> Table<T> {
    /// Write the header line then one line per record.
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "{}", self.header)?;
        for row in &self.rows {
            writeln!(out, "{}", row.to_line(&self.fields))?;
        }
        Ok(())
    }
}

/// Why a record could not be re-keyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RekeyError {
    /// No record has the old key.
    Missing,
    /// Another record already uses the new key.
    Taken,
}

/// A [`Table`] with a unique-key index.
///
/// Iteration follows first insertion. Inserting a record whose key is
/// already present replaces the old record in place.
#[derive(Debug, Clone)]
pub struct KeyedTable<T> {
    table: Table<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for KeyedTable<T> {
    fn default() -> Self {
        Self {
            table: Table::default(),
            index: HashMap::new(),
        }
    }
}

impl<T: Keyed> KeyedTable<T> {
    pub fn clear(&mut self) {
        self.table.clear();
        self.index.clear();
    }

    pub fn set_header(&mut self, header: &str, fields: FieldList) {
        self.table.set_header(header, fields);
    }

    /// Add a record, replacing any record with the same key.
    ///
    /// Returns the record that was replaced.
    pub fn insert(&mut self, record: T) -> Option<T> {
        match self.index.get(record.key()) {
            Some(&pos) => Some(std::mem::replace(&mut self.table.rows[pos], record)),
            None => {
                self.index
                    .insert(record.key().to_string(), self.table.rows.len());
                self.table.push(record);
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.index.get(key).map(|&pos| &self.table.rows[pos])
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Replace the record stored under `old_key` with `record`.
    ///
    /// The record keeps its position. If its key changed, the index is
    /// updated; a new key that belongs to another record is refused and
    /// nothing changes.
    pub fn replace(&mut self, old_key: &str, record: T) -> Result<(), RekeyError> {
        let pos = *self.index.get(old_key).ok_or(RekeyError::Missing)?;
        let new_key = record.key();
        if new_key != old_key {
            if self.index.contains_key(new_key) {
                return Err(RekeyError::Taken);
            }
            self.index.remove(old_key);
            self.index.insert(new_key.to_string(), pos);
        }
        self.table.rows[pos] = record;
        Ok(())
    }

    pub fn header(&self) -> &str {
        self.table.header()
    }

    pub fn fields(&self) -> &FieldList {
        self.table.fields()
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.table.iter()
    }

    pub fn as_table(&self) -> &Table<T> {
        &self.table
    }
}
