//! In-memory tabular model produced by the parser.

use std::borrow::Cow;

use chrono::NaiveDateTime;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

use super::values::{format_datetime, format_number, is_null_token, parse_plain_number};

/// A single cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Date(NaiveDateTime),
    Text(String),
}

impl Value {
    /// Whether the cell is missing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Text rendering of the cell; `None` when empty.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Value::Empty => None,
            Value::Number(n) => Some(Cow::Owned(format_number(*n))),
            Value::Date(d) => Some(Cow::Owned(format_datetime(d))),
            Value::Text(s) => Some(Cow::Borrowed(s)),
        }
    }

    /// Numeric value of a number cell.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Value of a date cell.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Numeric value treating empty cells as zero.
    pub fn number_or_zero(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Stable key used to compare cells for equality across rows.
    pub(crate) fn key(&self) -> String {
        match self {
            Value::Empty => "\u{0}".to_string(),
            other => other.as_text().map(Cow::into_owned).unwrap_or_default(),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Empty => serializer.serialize_none(),
            Value::Number(n) => serializer.serialize_f64(*n),
            Value::Date(d) => serializer.serialize_str(&format_datetime(d)),
            Value::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Inferred kind of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// No non-empty cells.
    Empty,
    /// Every non-empty cell is a number.
    Numeric,
    /// Every non-empty cell is a date.
    Date,
    /// Anything else; cells hold their text.
    Text,
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<Value>,
}

impl Column {
    /// Build a column from raw cells, inferring its kind.
    ///
    /// Mixed columns are demoted to text so the column stays single-kinded.
    pub fn from_cells(name: impl Into<String>, cells: Vec<Value>) -> Self {
        let mut has_number = false;
        let mut has_date = false;
        let mut has_text = false;
        for cell in &cells {
            match cell {
                Value::Empty => {}
                Value::Number(_) => has_number = true,
                Value::Date(_) => has_date = true,
                Value::Text(_) => has_text = true,
            }
        }

        let kind = match (has_number, has_date, has_text) {
            (false, false, false) => ColumnKind::Empty,
            (true, false, false) => ColumnKind::Numeric,
            (false, true, false) => ColumnKind::Date,
            _ => ColumnKind::Text,
        };

        let values = if kind == ColumnKind::Text {
            cells
                .into_iter()
                .map(|v| match v {
                    Value::Number(_) | Value::Date(_) => {
                        Value::Text(v.as_text().map(Cow::into_owned).unwrap_or_default())
                    }
                    other => other,
                })
                .collect()
        } else {
            cells
        };

        Self {
            name: name.into(),
            kind,
            values,
        }
    }

    /// Build a column from raw delimited-text cells.
    ///
    /// Null tokens become empty; a column whose cells all read as plain
    /// numbers becomes numeric.
    pub fn from_raw(name: impl Into<String>, raw: &[&str]) -> Self {
        let cells: Vec<Value> = raw
            .iter()
            .map(|s| {
                if is_null_token(s) {
                    Value::Empty
                } else {
                    Value::Text(s.trim().to_string())
                }
            })
            .collect();

        let all_numeric = cells.iter().all(|c| match c {
            Value::Text(s) => parse_plain_number(s).is_some(),
            _ => true,
        });

        let cells = if all_numeric {
            cells
                .into_iter()
                .map(|c| match c {
                    Value::Text(s) => parse_plain_number(&s).map_or(Value::Empty, Value::Number),
                    other => other,
                })
                .collect()
        } else {
            cells
        };

        Self::from_cells(name, cells)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Non-empty cells in row order.
    pub fn non_null(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_empty())
    }

    /// Number of empty cells.
    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_empty()).count()
    }
}

/// An ordered set of equal-length columns.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl DataTable {
    /// Build a table from columns of equal length.
    ///
    /// Shorter columns are padded with empty cells so rows stay aligned.
    pub fn new(mut columns: Vec<Column>) -> Self {
        let row_count = columns.iter().map(Column::len).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(row_count, Value::Empty);
        }
        Self { columns, row_count }
    }

    /// Build a table from a header row and row-major raw text.
    pub fn from_rows(headers: &[String], rows: &[Vec<String>]) -> Self {
        let columns = headers
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let raw: Vec<&str> = rows
                    .iter()
                    .map(|row| row.get(idx).map_or("", String::as_str))
                    .collect();
                Column::from_raw(name.clone(), &raw)
            })
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column headers in order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of data rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Get a column by exact header.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Get a specific cell.
    pub fn get(&self, row: usize, col: usize) -> Option<&Value> {
        self.columns.get(col).and_then(|c| c.values.get(row))
    }

    /// Drop rows whose cells are all empty.
    pub fn drop_empty_rows(self) -> Self {
        let keep: Vec<bool> = (0..self.row_count)
            .map(|row| self.columns.iter().any(|c| !c.values[row].is_empty()))
            .collect();
        if keep.iter().all(|&k| k) {
            return self;
        }

        let columns = self
            .columns
            .into_iter()
            .map(|c| {
                let cells = c
                    .values
                    .into_iter()
                    .zip(&keep)
                    .filter_map(|(v, &k)| k.then_some(v))
                    .collect();
                Column::from_cells(c.name, cells)
            })
            .collect();
        Self::new(columns)
    }

    /// Serializable row-oriented view (`[{header: value}, ...]`).
    pub fn records(&self) -> Records<'_> {
        Records(self)
    }
}

/// Row-oriented serialization of a [`DataTable`].
pub struct Records<'a>(&'a DataTable);

struct Record<'a> {
    table: &'a DataTable,
    row: usize,
}

impl Serialize for Records<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let table = self.0;
        let mut seq = serializer.serialize_seq(Some(table.row_count))?;
        for row in 0..table.row_count {
            seq.serialize_element(&Record { table, row })?;
        }
        seq.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.table.column_count()))?;
        for column in &self.table.columns {
            map.serialize_entry(&column.name, &column.values[self.row])?;
        }
        map.end()
    }
}

impl Serialize for DataTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.records().serialize(serializer)
    }
}

/// A structural problem flagged by [`validate_table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum TableIssue {
    Empty,
    TooFewRows { rows: usize, min: usize },
    TooFewColumns { columns: usize, min: usize },
    MostlyUnnamed { unnamed: usize, columns: usize },
}

impl std::fmt::Display for TableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableIssue::Empty => write!(f, "Table is empty"),
            TableIssue::TooFewRows { rows, min } => {
                write!(f, "Table has only {} rows, minimum {} required", rows, min)
            }
            TableIssue::TooFewColumns { columns, min } => {
                write!(f, "Table has only {} columns, minimum {} required", columns, min)
            }
            TableIssue::MostlyUnnamed { unnamed, columns } => write!(
                f,
                "{} of {} columns are unnamed - possible parsing error",
                unnamed, columns
            ),
        }
    }
}

/// Check a table against minimum size and header sanity.
pub fn validate_table(
    table: &DataTable,
    min_rows: usize,
    min_cols: usize,
) -> std::result::Result<(), TableIssue> {
    if table.row_count() == 0 || table.column_count() == 0 {
        return Err(TableIssue::Empty);
    }
    if table.row_count() < min_rows {
        return Err(TableIssue::TooFewRows {
            rows: table.row_count(),
            min: min_rows,
        });
    }
    if table.column_count() < min_cols {
        return Err(TableIssue::TooFewColumns {
            columns: table.column_count(),
            min: min_cols,
        });
    }

    let unnamed = table
        .columns
        .iter()
        .filter(|c| c.name.starts_with("Unnamed:"))
        .count();
    if unnamed * 2 > table.column_count() {
        return Err(TableIssue::MostlyUnnamed {
            unnamed,
            columns: table.column_count(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> DataTable {
        let headers = vec!["Date".to_string(), "Memo".to_string(), "Amount".to_string()];
        let rows = vec![
            vec!["2025-01-01".into(), "Coffee".into(), "4.50".into()],
            vec!["".into(), "".into(), "".into()],
            vec!["2025-01-02".into(), "NA".into(), "12".into()],
        ];
        DataTable::from_rows(&headers, &rows)
    }

    #[test]
    fn test_kind_inference() {
        let t = table();
        assert_eq!(t.column("Date").unwrap().kind, ColumnKind::Text);
        assert_eq!(t.column("Amount").unwrap().kind, ColumnKind::Numeric);
        assert_eq!(t.column("Memo").unwrap().null_count(), 2);
    }

    #[test]
    fn test_mixed_cells_become_text() {
        let col = Column::from_cells(
            "x",
            vec![Value::Number(1.0), Value::Text("abc".into()), Value::Empty],
        );
        assert_eq!(col.kind, ColumnKind::Text);
        assert_eq!(col.values[0], Value::Text("1".into()));
        assert_eq!(col.values[2], Value::Empty);
    }

    #[test]
    fn test_drop_empty_rows() {
        let t = table().drop_empty_rows();
        assert_eq!(t.row_count(), 2);
        assert_eq!(t.get(1, 2), Some(&Value::Number(12.0)));
    }

    #[test]
    fn test_records_serialize_as_objects() {
        let t = table().drop_empty_rows();
        let json = serde_json::to_value(t.records()).unwrap();
        assert_eq!(json[0]["Memo"], "Coffee");
        assert_eq!(json[0]["Amount"], 4.5);
        assert!(json[1]["Memo"].is_null());
    }

    #[test]
    fn test_validate_table() {
        let t = table();
        assert!(validate_table(&t, 1, 1).is_ok());
        assert_eq!(
            validate_table(&t, 5, 1),
            Err(TableIssue::TooFewRows { rows: 3, min: 5 })
        );

        let unnamed = DataTable::new(vec![
            Column::from_raw("Unnamed: 0", &["a"]),
            Column::from_raw("Unnamed: 1", &["b"]),
            Column::from_raw("Total", &["1"]),
        ]);
        assert!(matches!(
            validate_table(&unnamed, 1, 1),
            Err(TableIssue::MostlyUnnamed { unnamed: 2, .. })
        ));
    }
}
