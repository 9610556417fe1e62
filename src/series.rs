use crate::data::TableView;
use crate::error::PlotResult;
use std::collections::HashSet;

/// One numeric column prepared for plotting.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesSpec {
    pub name: String,
    pub values: Vec<f64>,
    pub excluded: bool,
}

/// Every numeric column except `x_column`, flagged when it appears in `exclude`.
///
/// Output follows the table's header order regardless of how `exclude` was
/// built. Names in `exclude` and `x_column` must exist in the table.
pub fn series_candidates<S: AsRef<str>>(
    table: &TableView,
    exclude: &[S],
    x_column: Option<&str>,
) -> PlotResult<Vec<SeriesSpec>> {
    let mut excluded = HashSet::with_capacity(exclude.len());
    for name in exclude {
        let name = name.as_ref();
        table.require_column("ignore", name)?;
        excluded.insert(name);
    }
    if let Some(x) = x_column {
        table.require_column("x_column", x)?;
    }

    let candidates = table
        .headers()
        .iter()
        .enumerate()
        .filter(|&(idx, header)| {
            table.column_type_at(idx).is_numeric() && Some(header.as_str()) != x_column
        })
        .map(|(idx, header)| SeriesSpec {
            name: header.clone(),
            values: table.numeric_values(idx),
            excluded: excluded.contains(header.as_str()),
        })
        .collect();

    Ok(candidates)
}

/// Numeric columns to plot: numeric, not excluded, not the x column.
pub fn select_series<S: AsRef<str>>(
    table: &TableView,
    exclude: &[S],
    x_column: Option<&str>,
) -> PlotResult<Vec<SeriesSpec>> {
    let mut series = series_candidates(table, exclude, x_column)?;
    series.retain(|s| !s.excluded);
    Ok(series)
}
