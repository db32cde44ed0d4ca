//! Named-column rows as delivered by a row source.
//!
//! A `Table` carries its `Columns` descriptor, computed once when the table
//! is fetched. Optional reads consult that descriptor instead of failing, so
//! a table from an older schema simply yields defaults for the columns it
//! lacks.

use crate::error::{RowError, RowResult};
use std::collections::HashMap;

/// A single cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    fn describe(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Real(r) => r.to_string(),
            Self::Text(s) => format!("{:?}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// Column set of one table, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Columns {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Columns {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let positions = names
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_ascii_lowercase(), i))
            .collect();
        Self { names, positions }
    }

    /// Whether the table has this column (case-insensitive)
    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(&name.to_ascii_lowercase()).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A fetched table: its name, its columns, and the raw rows
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub columns: Columns,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Columns) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row; short rows are padded with NULL
    pub fn push_row(&mut self, mut values: Vec<Value>) {
        values.resize(self.columns.len(), Value::Null);
        self.rows.push(values);
    }

    /// Append a row given as (column, value) pairs; unknown columns are ignored
    pub fn push_named<'a, I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = (&'a str, Value)>,
    {
        let mut values = vec![Value::Null; self.columns.len()];
        for (name, value) in cells {
            if let Some(i) = self.columns.position(name) {
                values[i] = value;
            }
        }
        self.rows.push(values);
    }

    pub fn rows(&self) -> impl Iterator<Item = RowRef<'_>> {
        self.rows.iter().map(move |values| RowRef {
            columns: &self.columns,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Borrowed view of one row with typed accessors
#[derive(Debug, Clone, Copy)]
pub struct RowRef<'a> {
    columns: &'a Columns,
    values: &'a [Value],
}

impl<'a> RowRef<'a> {
    pub fn columns(&self) -> &'a Columns {
        self.columns
    }

    /// Raw cell, `None` when the column is absent from the table
    pub fn value(&self, column: &str) -> Option<&'a Value> {
        self.columns
            .position(column)
            .and_then(|i| self.values.get(i))
    }

    fn present(&self, column: &'static str) -> RowResult<&'a Value> {
        match self.value(column) {
            None => Err(RowError::MissingColumn(column)),
            Some(Value::Null) => Err(RowError::NullValue(column)),
            Some(v) => Ok(v),
        }
    }

    fn to_i64(column: &'static str, value: &Value) -> RowResult<i64> {
        match value {
            Value::Integer(i) => Ok(*i),
            Value::Real(r) if r.fract() == 0.0 => Ok(*r as i64),
            Value::Text(s) => s.trim().parse().map_err(|_| RowError::TypeMismatch {
                column,
                found: value.describe(),
            }),
            _ => Err(RowError::TypeMismatch {
                column,
                found: value.describe(),
            }),
        }
    }

    fn narrow<T: TryFrom<i64>>(column: &'static str, value: i64) -> RowResult<T> {
        T::try_from(value).map_err(|_| RowError::OutOfRange { column, value })
    }

    fn to_text(value: &Value) -> String {
        match value {
            Value::Text(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Null => String::new(),
        }
    }

    // === Required columns ===

    pub fn int64(&self, column: &'static str) -> RowResult<i64> {
        Self::to_i64(column, self.present(column)?)
    }

    pub fn int(&self, column: &'static str) -> RowResult<i32> {
        Self::narrow(column, self.int64(column)?)
    }

    pub fn small(&self, column: &'static str) -> RowResult<i16> {
        Self::narrow(column, self.int64(column)?)
    }

    pub fn text(&self, column: &'static str) -> RowResult<String> {
        Ok(Self::to_text(self.present(column)?))
    }

    pub fn flag(&self, column: &'static str) -> RowResult<bool> {
        Ok(self.int64(column)? != 0)
    }

    // === Optional columns ===

    pub fn int_opt(&self, column: &'static str) -> RowResult<Option<i32>> {
        match self.value(column) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => Self::narrow(column, Self::to_i64(column, v)?).map(Some),
        }
    }

    pub fn int_or_zero(&self, column: &'static str) -> RowResult<i32> {
        Ok(self.int_opt(column)?.unwrap_or(0))
    }

    pub fn small_or_zero(&self, column: &'static str) -> RowResult<i16> {
        match self.value(column) {
            None | Some(Value::Null) => Ok(0),
            Some(v) => Self::narrow(column, Self::to_i64(column, v)?),
        }
    }

    pub fn text_opt(&self, column: &'static str) -> Option<String> {
        match self.value(column) {
            None | Some(Value::Null) => None,
            Some(v) => Some(Self::to_text(v)),
        }
    }

    pub fn flag_or_false(&self, column: &'static str) -> RowResult<bool> {
        Ok(self.int_opt(column)?.is_some_and(|v| v != 0))
    }
}
