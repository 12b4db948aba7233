use chrono::NaiveDateTime;
use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

/// One flattened value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    /// An array field, kept whole rather than exploded into rows.
    List(Vec<Value>),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    /// Convert a leaf JSON value. Objects are expected to be flattened by the caller.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Cell::Int(i),
                None => n.as_f64().map(Cell::Float).unwrap_or(Cell::Null),
            },
            Value::String(s) => Cell::Text(s.clone()),
            Value::Array(items) => Cell::List(items.clone()),
            Value::Object(_) => Cell::Text(value.to_string()),
        }
    }

    /// JSON form used when a column has to fall back to text.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(i) => Value::from(*i),
            Cell::Float(f) => Value::from(*f),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Timestamp(ts) => Value::String(ts.format("%Y-%m-%dT%H:%M:%S").to_string()),
            Cell::List(items) => Value::Array(items.clone()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<NaiveDateTime> for Cell {
    fn from(value: NaiveDateTime) -> Self {
        Cell::Timestamp(value)
    }
}

/// Column name to value, in column order.
pub type Row = IndexMap<String, Cell>;

static NULL: Cell = Cell::Null;

/// Rows sharing a column set. Columns keep the order in which they first appeared;
/// a row without a given column reads as null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    columns: IndexSet<String>,
    rows: Vec<Row>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains(name)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Value at `row` for `column`, null when the row lacks it.
    ///
    /// Panics if `row` is out of bounds.
    pub fn get(&self, row: usize, column: &str) -> &Cell {
        self.rows[row].get(column).unwrap_or(&NULL)
    }

    /// All values of one column, null-filled.
    pub fn column(&self, name: &str) -> Vec<&Cell> {
        self.rows
            .iter()
            .map(|row| row.get(name).unwrap_or(&NULL))
            .collect()
    }

    pub fn push_row(&mut self, row: Row) {
        for name in row.keys() {
            if !self.columns.contains(name) {
                self.columns.insert(name.clone());
            }
        }
        self.rows.push(row);
    }

    /// Set `column` to `value` on every row, registering the column even when empty.
    pub fn fill_column(&mut self, column: &str, value: Cell) {
        self.columns.insert(column.to_string());
        for row in &mut self.rows {
            row.insert(column.to_string(), value.clone());
        }
    }

    /// Append all rows of `other`, keeping its row order.
    pub fn append(&mut self, other: Dataset) {
        for name in other.columns {
            self.columns.insert(name);
        }
        self.rows.extend(other.rows);
    }

    pub(crate) fn into_parts(self) -> (IndexSet<String>, Vec<Row>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts(columns: IndexSet<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }
}
