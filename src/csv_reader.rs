// Table loader: CSV text -> typed TableView

use crate::data::TableView;
use crate::error::{PlotError, PlotResult};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Read CSV from any reader. The first record is the header row.
pub fn read_csv<R: Read>(reader: R) -> PlotResult<TableView> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(PlotError::Load("CSV has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }

    if rows.is_empty() {
        return Err(PlotError::Load("CSV must have at least one data row".to_string()));
    }

    let table = TableView::from_raw(headers, rows)?;
    debug!(
        columns = table.headers().len(),
        rows = table.len(),
        "loaded CSV table"
    );
    Ok(table)
}

pub fn read_csv_path(path: &Path) -> PlotResult<TableView> {
    let file = File::open(path)?;
    read_csv(file)
}

pub fn read_csv_from_stdin() -> PlotResult<TableView> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}
