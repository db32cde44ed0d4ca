//! Row source abstraction.
//!
//! The catalog only needs a full snapshot of the item definition tables per
//! load pass. Connection handling belongs to the implementation.

use crate::error::{SourceError, SourceResult};
use crate::row::{Columns, Table, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Legacy per-category table names
pub const ETC_ITEMS: &str = "etc_items";
pub const WEAPONS: &str = "weapons";
pub const ARMORS: &str = "armors";

/// Merged single-table name
pub const ITEMS: &str = "items";

/// Which historical schema shape the rows come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaLayout {
    /// Separate `etc_items`, `weapons` and `armors` tables
    Legacy,
    /// One `items` table with a `category` column
    Merged,
}

impl fmt::Display for SchemaLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy => write!(f, "legacy"),
            Self::Merged => write!(f, "merged"),
        }
    }
}

impl std::str::FromStr for SchemaLayout {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "legacy" => Ok(Self::Legacy),
            "merged" => Ok(Self::Merged),
            _ => Err(format!("Unknown schema layout: {}", s)),
        }
    }
}

/// Everything one fetch returned
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    pub layout: SchemaLayout,
    pub tables: Vec<Table>,
}

impl RowSet {
    pub fn new(layout: SchemaLayout) -> Self {
        Self {
            layout,
            tables: Vec::new(),
        }
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }
}

/// Provider of item definition rows
pub trait RowSource: Send + Sync {
    /// Read every item definition table in full
    fn fetch(&self) -> SourceResult<RowSet>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn fetch(&self) -> SourceResult<RowSet> {
        (**self).fetch()
    }
}

impl<S: RowSource + ?Sized> RowSource for std::sync::Arc<S> {
    fn fetch(&self) -> SourceResult<RowSet> {
        (**self).fetch()
    }
}

/// Row source backed by tables held in memory
#[derive(Debug, Clone)]
pub struct MemorySource {
    rows: RowSet,
}

impl MemorySource {
    pub fn new(layout: SchemaLayout) -> Self {
        Self {
            rows: RowSet::new(layout),
        }
    }

    /// Add an empty table with the given columns
    pub fn with_table<I, S>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.tables.push(Table::new(name, Columns::new(columns)));
        self
    }

    /// Add a row to a table previously declared with `with_table`
    pub fn with_row<'a, I>(mut self, table: &str, cells: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        self.push_row(table, cells);
        self
    }

    pub fn push_row<'a, I>(&mut self, table: &str, cells: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        if let Some(t) = self
            .rows
            .tables
            .iter_mut()
            .find(|t| t.name.eq_ignore_ascii_case(table))
        {
            t.push_named(cells);
        }
    }
}

impl RowSource for MemorySource {
    fn fetch(&self) -> SourceResult<RowSet> {
        if self.rows.tables.is_empty() {
            return Err(SourceError::NoTables);
        }
        Ok(self.rows.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_roundtrip() {
        let source = MemorySource::new(SchemaLayout::Legacy)
            .with_table(WEAPONS, ["id", "name", "type"])
            .with_row(
                WEAPONS,
                [
                    ("id", Value::from(1)),
                    ("name", Value::from("Short Sword")),
                    ("type", Value::from("sword")),
                ],
            );
        let rows = source.fetch().unwrap();
        assert_eq!(rows.layout, SchemaLayout::Legacy);
        assert_eq!(rows.row_count(), 1);
        assert_eq!(rows.table("WEAPONS").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_memory_source_fails() {
        let source = MemorySource::new(SchemaLayout::Merged);
        assert!(matches!(source.fetch(), Err(SourceError::NoTables)));
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("merged".parse::<SchemaLayout>(), Ok(SchemaLayout::Merged));
        assert!("modern".parse::<SchemaLayout>().is_err());
        assert_eq!(SchemaLayout::Legacy.to_string(), "legacy");
    }
}
