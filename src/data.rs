use crate::error::{PlotError, PlotResult};
use chrono::{NaiveDate, NaiveDateTime};
use ordered_float::OrderedFloat;
use std::collections::HashMap;
use std::fmt;

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Declared type of a column, decided once when the table is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
    Date,
    DateTime,
}

impl ColumnType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::DateTime)
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Text => "text",
            ColumnType::Date => "date",
            ColumnType::DateTime => "datetime",
        }
    }
}

/// A single typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// The column type this value belongs to (`None` for nulls).
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Text(_) => Some(ColumnType::Text),
            Value::Date(_) => Some(ColumnType::Date),
            Value::DateTime(_) => Some(ColumnType::DateTime),
        }
    }

    pub fn key(&self) -> CategoryKey {
        match self {
            Value::Null => CategoryKey::Null,
            Value::Integer(i) => CategoryKey::Integer(*i),
            Value::Float(f) => CategoryKey::Float(OrderedFloat(*f)),
            Value::Text(s) => CategoryKey::Text(s.clone()),
            Value::Date(d) => CategoryKey::Date(*d),
            Value::DateTime(dt) => CategoryKey::DateTime(*dt),
        }
    }

    /// Parse a raw cell as the given column type. Empty cells are null.
    fn parse_as(raw: &str, column_type: ColumnType) -> Option<Value> {
        if raw.is_empty() {
            return Some(Value::Null);
        }
        match column_type {
            ColumnType::Integer => raw.parse::<i64>().ok().map(Value::Integer),
            ColumnType::Float => raw.parse::<f64>().ok().map(Value::Float),
            ColumnType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT).ok().map(Value::Date),
            ColumnType::DateTime => parse_datetime(raw).map(Value::DateTime),
            ColumnType::Text => Some(Value::Text(raw.to_string())),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Text(s) => f.write_str(s),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Hashable, totally ordered form of a cell, used for grouping.
///
/// Values of one column share a variant (or are `Null`), so the derived
/// ordering is the natural ordering of the column: numeric for numbers,
/// chronological for dates, lexicographic for text. Nulls sort first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CategoryKey {
    Null,
    Integer(i64),
    Float(OrderedFloat<f64>),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl From<&str> for CategoryKey {
    fn from(s: &str) -> Self {
        CategoryKey::Text(s.to_string())
    }
}

impl fmt::Display for CategoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryKey::Null => Ok(()),
            CategoryKey::Integer(i) => write!(f, "{}", i),
            CategoryKey::Float(v) => write!(f, "{}", v.0),
            CategoryKey::Text(s) => f.write_str(s),
            CategoryKey::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            CategoryKey::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Immutable, typed, in-memory table.
#[derive(Debug, Clone)]
pub struct TableView {
    headers: Vec<String>,
    types: Vec<ColumnType>,
    rows: Vec<Vec<Value>>,
    index: HashMap<String, usize>,
}

impl TableView {
    /// Build a table from typed rows, checking the structural invariants.
    pub fn new(headers: Vec<String>, types: Vec<ColumnType>, rows: Vec<Vec<Value>>) -> PlotResult<Self> {
        if headers.len() != types.len() {
            return Err(PlotError::config(
                "types",
                format!("{} headers but {} column types", headers.len(), types.len()),
            ));
        }

        let mut index = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            if index.insert(header.clone(), i).is_some() {
                return Err(PlotError::config("headers", format!("duplicate header '{}'", header)));
            }
        }

        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(PlotError::config(
                    "rows",
                    format!(
                        "row {} has {} values, expected {}",
                        row_idx + 1,
                        row.len(),
                        headers.len()
                    ),
                ));
            }
            for (col_idx, value) in row.iter().enumerate() {
                if let Some(actual) = value.column_type() {
                    if actual != types[col_idx] {
                        return Err(PlotError::config(
                            headers[col_idx].clone(),
                            format!(
                                "row {} holds a {} value in a {} column",
                                row_idx + 1,
                                actual.name(),
                                types[col_idx].name()
                            ),
                        ));
                    }
                }
            }
        }

        Ok(Self {
            headers,
            types,
            rows,
            index,
        })
    }

    /// Build a table from raw string cells, inferring each column's type.
    pub fn from_raw(headers: Vec<String>, raw_rows: Vec<Vec<String>>) -> PlotResult<Self> {
        let mut types = Vec::with_capacity(headers.len());
        for col_idx in 0..headers.len() {
            let cells = raw_rows.iter().filter_map(|r| r.get(col_idx)).map(String::as_str);
            types.push(infer_column_type(cells));
        }

        let mut rows = Vec::with_capacity(raw_rows.len());
        for (row_idx, raw) in raw_rows.iter().enumerate() {
            if raw.len() != headers.len() {
                return Err(PlotError::Load(format!(
                    "row {} has {} fields, expected {}",
                    row_idx + 1,
                    raw.len(),
                    headers.len()
                )));
            }
            let row = raw
                .iter()
                .zip(&types)
                // Inference guarantees every non-empty cell parses as its column type
                .map(|(cell, &ty)| Value::parse_as(cell, ty).unwrap_or(Value::Null))
                .collect();
            rows.push(row);
        }

        Self::new(headers, types, rows)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_types(&self) -> &[ColumnType] {
        &self.types
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// Look up a column, failing with a configuration error that names the
    /// option which referenced it.
    pub fn require_column(&self, parameter: &str, name: &str) -> PlotResult<usize> {
        self.column_index(name)
            .ok_or_else(|| PlotError::unknown_column(parameter, name))
    }

    /// Like [`require_column`](Self::require_column), but also demands a numeric column.
    pub fn require_numeric(&self, parameter: &str, name: &str) -> PlotResult<usize> {
        let idx = self.require_column(parameter, name)?;
        let ty = self.types[idx];
        if !ty.is_numeric() {
            return Err(PlotError::config(
                parameter,
                format!("column '{}' is {}, expected a numeric column", name, ty.name()),
            ));
        }
        Ok(idx)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column_index(name).map(|i| self.types[i])
    }

    pub fn column_type_at(&self, idx: usize) -> ColumnType {
        self.types[idx]
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().map(move |row| &row[idx])
    }

    /// Numeric values of a column; nulls become `NaN`.
    pub fn numeric_values(&self, idx: usize) -> Vec<f64> {
        self.column_values(idx)
            .map(|v| v.as_f64().unwrap_or(f64::NAN))
            .collect()
    }

    /// Display strings of a column, in row order.
    pub fn labels(&self, idx: usize) -> Vec<String> {
        self.column_values(idx).map(|v| v.to_string()).collect()
    }

    /// A copy of this table with rows stably sorted by one column.
    pub fn sorted_by(&self, parameter: &str, column: &str, order: SortOrder) -> PlotResult<TableView> {
        let idx = self.require_column(parameter, column)?;
        let mut rows = self.rows.clone();
        rows.sort_by_cached_key(|row| row[idx].key());
        if order == SortOrder::Desc {
            rows.reverse();
        }
        Ok(TableView {
            headers: self.headers.clone(),
            types: self.types.clone(),
            rows,
            index: self.index.clone(),
        })
    }
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Pick the narrowest type every non-empty cell parses as.
fn infer_column_type<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnType {
    let mut non_empty = cells.filter(|c| !c.is_empty()).peekable();
    if non_empty.peek().is_none() {
        return ColumnType::Text;
    }

    let candidates = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Date,
        ColumnType::DateTime,
    ];
    for ty in candidates {
        if non_empty.clone().all(|c| Value::parse_as(c, ty).is_some()) {
            return ty;
        }
    }
    ColumnType::Text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(headers: &[&str], rows: &[&[&str]]) -> TableView {
        TableView::from_raw(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_infer_types() {
        let table = raw(
            &["i", "f", "d", "dt", "t"],
            &[
                &["1", "1.5", "2011-01-01", "2011-01-01 10:00:00", "dog"],
                &["2", "2", "2011-01-02", "2011-01-02T11:30:00", "cat"],
            ],
        );
        assert_eq!(
            table.column_types(),
            &[
                ColumnType::Integer,
                ColumnType::Float,
                ColumnType::Date,
                ColumnType::DateTime,
                ColumnType::Text
            ]
        );
        assert_eq!(table.rows()[1][1], Value::Float(2.0));
    }

    #[test]
    fn test_empty_cells_become_null() {
        let table = raw(&["a", "b"], &[&["1", ""], &["", ""]]);
        assert_eq!(table.column_type("a"), Some(ColumnType::Integer));
        assert_eq!(table.column_type("b"), Some(ColumnType::Text));
        assert_eq!(table.rows()[1][0], Value::Null);
        let values = table.numeric_values(0);
        assert_eq!(values[0], 1.0);
        assert!(values[1].is_nan());
    }

    #[test]
    fn test_mixed_column_falls_back_to_text() {
        let table = raw(&["x"], &[&["1"], &["two"]]);
        assert_eq!(table.column_type("x"), Some(ColumnType::Text));
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let result = TableView::new(
            vec!["a".to_string(), "a".to_string()],
            vec![ColumnType::Integer, ColumnType::Integer],
            vec![],
        );
        assert!(result.unwrap_err().to_string().contains("duplicate header"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let result = TableView::new(
            vec!["a".to_string()],
            vec![ColumnType::Integer],
            vec![vec![Value::Text("x".to_string())]],
        );
        let err = result.unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("text value in a integer column"));
    }

    #[test]
    fn test_require_numeric() {
        let table = raw(&["n", "t"], &[&["1", "a"]]);
        assert_eq!(table.require_numeric("values", "n").unwrap(), 0);
        let err = table.require_numeric("values", "t").unwrap_err();
        assert!(err.to_string().contains("expected a numeric column"));
        let err = table.require_column("values", "nope").unwrap_err();
        assert!(err.to_string().contains("'nope' not found"));
    }

    #[test]
    fn test_sorted_by_leaves_original_untouched() {
        let table = raw(&["k", "v"], &[&["3", "c"], &["1", "a"], &["2", "b"]]);
        let sorted = table.sorted_by("order_by", "k", SortOrder::Asc).unwrap();
        assert_eq!(sorted.labels(1), vec!["a", "b", "c"]);
        let desc = table.sorted_by("order_by", "k", SortOrder::Desc).unwrap();
        assert_eq!(desc.labels(1), vec!["c", "b", "a"]);
        assert_eq!(table.labels(1), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_category_key_natural_order() {
        let mut keys = vec![
            Value::Integer(10).key(),
            Value::Integer(9).key(),
            Value::Integer(100).key(),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![CategoryKey::Integer(9), CategoryKey::Integer(10), CategoryKey::Integer(100)]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::Float(3.0).to_string(), "3");
        let d = NaiveDate::from_ymd_opt(2011, 1, 2).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2011-01-02");
        assert_eq!(Value::Null.to_string(), "");
    }
}
