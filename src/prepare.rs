use crate::aggregate::{aggregate, aggregate_2d, category_keys};
use crate::data::TableView;
use crate::error::{PlotError, PlotResult};
use crate::ir::{
    Axis, BarGeometry, Geometry, LineGeometry, PieGeometry, PreparedChart, RadarAreaGeometry,
    RadarCurve, RadarGeometry,
};
use crate::layout::{
    compute_bar_layout, compute_pie_layout, compute_radial_bar_layout, compute_radial_layout,
    stack_offsets,
};
use crate::options::{
    BarOptions, ChartRequest, LinearOptions, PieOptions, PlotRequest, RadarAreaOptions, RadarOptions,
    ScatterOptions, StackedBarOptions,
};
use crate::palette::{resolve_palette, Colormap, Palette};
use crate::series::{select_series, SeriesSpec};
use crate::style::{parse_style, StyleToken};
use plotters::style::RGBColor;
use tracing::{debug, trace, warn};

/// Upper colormap bound for line and bar series.
const SERIES_COLOR_SPAN: f64 = 0.9;

/// Tick label rotation applied to date/datetime x axes.
const TEMPORAL_LABEL_ROTATION: f64 = 30.0;

/// Main entry point: turn a chart request into renderer-ready geometry
pub fn prepare_chart(request: PlotRequest<'_>) -> PlotResult<PreparedChart> {
    let table = request.table;
    let chart = match request.chart {
        ChartRequest::Linear(opts) => prepare_linear(table, opts),
        ChartRequest::Scatter(opts) => prepare_scatter(table, opts),
        ChartRequest::Bar(opts) => prepare_bar(table, opts),
        ChartRequest::StackedBar(opts) => prepare_stacked_bar(table, opts),
        ChartRequest::Radar(opts) => prepare_radar(table, opts),
        ChartRequest::RadarArea(opts) => prepare_radar_area(table, opts),
        ChartRequest::Pie(opts) => prepare_pie(table, opts),
    }?;
    debug!(
        kind = request.chart.kind(),
        geometry = chart.geometry.name(),
        legend = chart.legend,
        "prepared chart"
    );
    Ok(chart)
}

/// Numeric columns plotted against the row index.
pub fn prepare_linear(table: &TableView, opts: &LinearOptions) -> PlotResult<PreparedChart> {
    // 1. Tick labels column, validated under its own option name
    let x_axis = match &opts.x_labels {
        Some(column) => {
            let idx = table.require_column("x_labels", column)?;
            Axis::with_ticks(row_positions(table.len(), 0.0), table.labels(idx))
        }
        None => Axis::default(),
    };

    // 2. Series
    let series = select_series(table, &opts.ignore, opts.x_labels.as_deref())?;
    if series.is_empty() {
        return Err(PlotError::config("ignore", "no numeric columns left to plot"));
    }

    // 3. Style, colors, legends
    let token = parse_style(&opts.style)?;
    let colors = line_colors(opts.colors.as_deref(), &token, opts.colormap, series.len())?;
    let labels = opts.legends.labels(&series_names(&series), table.headers())?;

    let xs = row_positions(table.len(), 0.0);
    let lines = build_lines(series, &xs, &colors, labels.as_deref(), &token);

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.grid,
        y_grid: opts.grid,
        legend: labels.is_some(),
        x_axis: Axis {
            limits: checked_limits("x_lim", opts.x_lim)?,
            ..x_axis
        },
        y_axis: Axis {
            limits: checked_limits("y_lim", opts.y_lim)?,
            ..Axis::default()
        },
        geometry: Geometry::Lines(lines),
    })
}

/// Numeric columns plotted against an x column, one x slot per row.
pub fn prepare_scatter(table: &TableView, opts: &ScatterOptions) -> PlotResult<PreparedChart> {
    // 1. Reorder on a copy; the caller's table is left untouched
    let sorted;
    let table = match &opts.order_by {
        Some(column) => {
            sorted = table.sorted_by("order_by", column, opts.ordering)?;
            &sorted
        }
        None => table,
    };

    // 2. X column: explicit, else first temporal column, else first column
    let x_column = match &opts.x_column {
        Some(column) => {
            table.require_column("x_column", column)?;
            column.clone()
        }
        None => default_x_column(table)?,
    };
    let x_idx = table.require_column("x_column", &x_column)?;
    let temporal = table.column_type_at(x_idx).is_temporal();
    trace!(x_column = %x_column, temporal, "scatter x column");

    // 3. Series
    let series = select_series(table, &opts.ignore, Some(x_column.as_str()))?;
    if series.is_empty() {
        return Err(PlotError::config("ignore", "no numeric columns left to plot"));
    }

    // 4. Style, colors, legends
    let token = parse_style(&opts.style)?;
    let colors = line_colors(opts.colors.as_deref(), &token, opts.colormap, series.len())?;
    let labels = opts.legends.labels(&series_names(&series), table.headers())?;

    // 5. Axes
    let xs = row_positions(table.len(), 1.0);
    let x_axis = Axis {
        description: opts
            .labels
            .then(|| opts.x_label.clone().unwrap_or_else(|| x_column.clone())),
        limits: Some(checked_limits("x_lim", opts.x_lim)?.unwrap_or((0.0, table.len() as f64 + 1.0))),
        ticks: xs.clone(),
        tick_labels: table.labels(x_idx),
        label_rotation: if temporal { TEMPORAL_LABEL_ROTATION } else { 0.0 },
    };
    let y_axis = Axis {
        description: (opts.labels && !opts.y_label.is_empty()).then(|| opts.y_label.clone()),
        limits: checked_limits("y_lim", opts.y_lim)?,
        ..Axis::default()
    };

    let lines = build_lines(series, &xs, &colors, labels.as_deref(), &token);

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.grid,
        y_grid: opts.grid,
        legend: labels.is_some(),
        x_axis,
        y_axis,
        geometry: Geometry::Lines(lines),
    })
}

/// Grouped bars: value frequencies of one column, or numeric columns side by side.
pub fn prepare_bar(table: &TableView, opts: &BarOptions) -> PlotResult<PreparedChart> {
    // 1. Heights per series, series names and category labels
    let (heights, names, tick_labels) = match &opts.count {
        Some(column) => {
            if opts.y_columns.is_some() || !opts.ignore.is_empty() {
                warn!(count = %column, "'y_columns' and 'ignore' have no effect together with 'count'");
            }
            let groups = aggregate(table, column, opts.sum.as_deref(), opts.order)?;
            let heights = vec![groups.iter().map(|g| g.aggregate).collect::<Vec<_>>()];
            let keys: Vec<String> = groups.iter().map(|g| g.key.to_string()).collect();
            (heights, vec![column.clone()], keys)
        }
        None => {
            if opts.sum.is_some() {
                return Err(PlotError::config("sum", "'sum' requires 'count'"));
            }
            let tick_labels = match &opts.x_column {
                Some(column) => table.labels(table.require_column("x_column", column)?),
                None => (1..=table.len()).map(|i| i.to_string()).collect(),
            };
            let series = match &opts.y_columns {
                Some(columns) => named_series(table, columns)?,
                None => select_series(table, &opts.ignore, opts.x_column.as_deref())?,
            };
            if series.is_empty() {
                let parameter = if opts.y_columns.is_some() { "y_columns" } else { "ignore" };
                return Err(PlotError::config(parameter, "no numeric columns left to plot"));
            }
            let names = series_names(&series);
            let heights: Vec<Vec<f64>> = series.into_iter().map(|s| s.values).collect();
            (heights, names, tick_labels)
        }
    };

    // 2. Layout
    let x_lim = checked_limits("x_lim", opts.x_lim)?;
    let y_lim = checked_limits("y_lim", opts.y_lim)?;
    let layout = compute_bar_layout(
        heights.len(),
        tick_labels.len(),
        opts.bar_width,
        opts.bar_start,
        opts.bar_increment,
    )?
    .with_tick_labels(tick_labels);

    // 3. Colors and legends
    let palette = resolve_palette(opts.colors.as_deref(), opts.colormap, heights.len(), SERIES_COLOR_SPAN)?;
    let labels = opts.legends.labels(&names, table.headers())?;

    let bars = heights
        .into_iter()
        .enumerate()
        .map(|(s, heights)| BarGeometry {
            label: labels.as_ref().map(|l| l[s].clone()),
            lefts: layout.series_positions(s).to_vec(),
            width: layout.bar_width,
            bottoms: vec![0.0; heights.len()],
            heights,
            color: palette.color(s),
        })
        .collect();

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.grid,
        y_grid: opts.grid,
        legend: labels.is_some(),
        x_axis: Axis {
            description: None,
            limits: Some(x_lim.unwrap_or(layout.x_extent)),
            ticks: layout.ticks,
            tick_labels: layout.tick_labels,
            label_rotation: opts.x_rotation,
        },
        y_axis: Axis {
            description: opts.y_label.clone(),
            limits: y_lim,
            ..Axis::default()
        },
        geometry: Geometry::Bars(bars),
    })
}

/// One bar per x category, stacked by the distinct values of `y_labels`.
pub fn prepare_stacked_bar(table: &TableView, opts: &StackedBarOptions) -> PlotResult<PreparedChart> {
    // 1. Sum per (stack, category), both sorted
    let grouped = aggregate_2d(table, &opts.x_column, &opts.y_labels, &opts.y_column)?;
    let categories: Vec<String> = category_keys(&grouped).iter().map(ToString::to_string).collect();
    let names: Vec<String> = grouped.keys().map(ToString::to_string).collect();
    let heights: Vec<Vec<f64>> = grouped
        .values()
        .map(|groups| groups.iter().map(|g| g.aggregate).collect())
        .collect();

    // 2. Layout: one bar per slot, segments share the left edges
    let layout = compute_bar_layout(1, categories.len(), opts.bar_width, 0.0, 1.0)?
        .with_tick_labels(categories);
    let bottoms = stack_offsets(&heights);

    // 3. Colors and legends
    let palette = resolve_palette(opts.colors.as_deref(), opts.colormap, names.len(), SERIES_COLOR_SPAN)?;
    let labels = opts.legends.labels(&names, &names)?;

    let lefts = layout.series_positions(0).to_vec();
    let bars = heights
        .into_iter()
        .zip(bottoms)
        .enumerate()
        .map(|(s, (heights, bottoms))| BarGeometry {
            label: labels.as_ref().map(|l| l[s].clone()),
            lefts: lefts.clone(),
            width: layout.bar_width,
            heights,
            bottoms,
            color: palette.color(s),
        })
        .collect();

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.grid,
        y_grid: opts.grid,
        legend: labels.is_some(),
        x_axis: Axis {
            description: None,
            limits: Some(layout.x_extent),
            ticks: layout.ticks,
            tick_labels: layout.tick_labels,
            label_rotation: opts.x_rotation,
        },
        y_axis: Axis::default(),
        geometry: Geometry::Bars(bars),
    })
}

/// One closed curve per distinct `legends_column` value over the `axis_labels` axes.
pub fn prepare_radar(table: &TableView, opts: &RadarOptions) -> PlotResult<PreparedChart> {
    // 1. Sum per (curve, axis), both sorted
    let grouped = aggregate_2d(table, &opts.axis_labels, &opts.legends_column, &opts.values)?;
    let axis_labels: Vec<String> = category_keys(&grouped).iter().map(ToString::to_string).collect();
    let angles = compute_radial_layout(axis_labels.len())?;
    let names: Vec<String> = grouped.keys().map(ToString::to_string).collect();

    // 2. Colors and legends
    let palette = resolve_palette(
        opts.colors.as_deref(),
        opts.colormap,
        names.len(),
        cyclic_color_span(names.len()),
    )?;
    let labels = opts.legends.labels(&names, &names)?;

    let curves = grouped
        .values()
        .enumerate()
        .map(|(i, groups)| RadarCurve {
            label: labels.as_ref().map(|l| l[i].clone()),
            values: groups.iter().map(|g| g.aggregate).collect(),
            color: palette.color(i),
        })
        .collect();

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.x_grid,
        y_grid: opts.y_grid,
        legend: labels.is_some(),
        x_axis: Axis::default(),
        y_axis: Axis::default(),
        geometry: Geometry::Radar(RadarGeometry {
            angles,
            axis_labels,
            curves,
            fill_alpha: opts.fill_alpha,
        }),
    })
}

/// One wedge per row, radius given by `values_column`.
pub fn prepare_radar_area(table: &TableView, opts: &RadarAreaOptions) -> PlotResult<PreparedChart> {
    let values = table.numeric_values(table.require_numeric("values_column", &opts.values_column)?);
    let labels = table.labels(table.require_column("labels_column", &opts.labels_column)?);
    let layout = compute_radial_bar_layout(values.len(), opts.spacing)?;

    let palette = resolve_palette(
        opts.colors.as_deref(),
        opts.colormap,
        values.len(),
        cyclic_color_span(values.len()),
    )?;

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: opts.x_grid,
        y_grid: opts.y_grid,
        legend: false,
        x_axis: Axis::default(),
        y_axis: Axis::default(),
        geometry: Geometry::RadarArea(RadarAreaGeometry {
            colors: palette_colors(&palette, values.len()),
            layout,
            values,
            labels,
            fill_alpha: opts.fill_alpha,
        }),
    })
}

/// One slice per row, labelled with its percentage.
pub fn prepare_pie(table: &TableView, opts: &PieOptions) -> PlotResult<PreparedChart> {
    let values = table.numeric_values(table.require_numeric("values_column", &opts.values_column)?);
    let labels = table.labels(table.require_column("labels_column", &opts.labels_column)?);
    let slices = compute_pie_layout(&values, &labels)?;

    let palette = resolve_palette(
        opts.colors.as_deref(),
        opts.colormap,
        slices.len(),
        cyclic_color_span(slices.len()),
    )?;

    Ok(PreparedChart {
        title: opts.title.clone(),
        x_grid: false,
        y_grid: false,
        legend: false,
        x_axis: Axis::default(),
        y_axis: Axis::default(),
        geometry: Geometry::Pie(PieGeometry {
            colors: palette_colors(&palette, slices.len()),
            slices,
        }),
    })
}

fn default_x_column(table: &TableView) -> PlotResult<String> {
    table
        .headers()
        .iter()
        .zip(table.column_types())
        .find(|(_, ty)| ty.is_temporal())
        .map(|(h, _)| h)
        .or_else(|| table.headers().first())
        .cloned()
        .ok_or_else(|| PlotError::config("x_column", "table has no columns"))
}

/// Requested columns in the requested order; each must be numeric.
fn named_series(table: &TableView, columns: &[String]) -> PlotResult<Vec<SeriesSpec>> {
    columns
        .iter()
        .map(|name| {
            let idx = table.require_numeric("y_columns", name)?;
            Ok(SeriesSpec {
                name: name.clone(),
                values: table.numeric_values(idx),
                excluded: false,
            })
        })
        .collect()
}

fn series_names(series: &[SeriesSpec]) -> Vec<String> {
    series.iter().map(|s| s.name.clone()).collect()
}

fn row_positions(rows: usize, first: f64) -> Vec<f64> {
    (0..rows).map(|i| first + i as f64).collect()
}

/// Colormap span for charts whose colors wrap around, so the last color
/// differs from the first.
fn cyclic_color_span(count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        1.0 - 1.0 / count as f64
    }
}

/// An axis range override must be finite and strictly increasing.
fn checked_limits(parameter: &str, limits: Option<(f64, f64)>) -> PlotResult<Option<(f64, f64)>> {
    match limits {
        Some((lo, hi)) if !(lo.is_finite() && hi.is_finite() && lo < hi) => Err(PlotError::config(
            parameter,
            format!("range [{}, {}] must be finite with lower < upper", lo, hi),
        )),
        other => Ok(other),
    }
}

fn palette_colors(palette: &Palette, count: usize) -> Vec<RGBColor> {
    (0..count).map(|i| palette.color(i)).collect()
}

/// Explicit colors first, then the style token's color, then the colormap.
fn line_colors(
    colors: Option<&[String]>,
    token: &StyleToken,
    colormap: Colormap,
    count: usize,
) -> PlotResult<Vec<RGBColor>> {
    if let (None, Some(color)) = (colors, token.color) {
        return Ok(vec![color; count]);
    }
    let palette = resolve_palette(colors, colormap, count, SERIES_COLOR_SPAN)?;
    Ok(palette_colors(&palette, count))
}

fn build_lines(
    series: Vec<SeriesSpec>,
    xs: &[f64],
    colors: &[RGBColor],
    labels: Option<&[String]>,
    token: &StyleToken,
) -> Vec<LineGeometry> {
    series
        .into_iter()
        .enumerate()
        .map(|(i, s)| LineGeometry {
            label: labels.map(|l| l[i].clone()),
            points: xs.iter().copied().zip(s.values).collect(),
            color: colors[i],
            marker: token.marker,
            line: token.line,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::csv_reader::read_csv;
    use crate::data::SortOrder;
    use crate::options::Legends;
    use crate::style::LineKind;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    fn table(csv: &str) -> TableView {
        read_csv(csv.as_bytes()).unwrap()
    }

    fn squares() -> TableView {
        table("\"X Values\",\"Y Values\",\"Z Values\"\n1,1,1\n2,4,8\n3,9,27\n")
    }

    fn animals() -> TableView {
        table("animal\ndog\ncat\ndog\ndog\ndog\ncat\ncat\nhuman\ndog\ntiger\ntiger\ncoati\n")
    }

    fn processes() -> TableView {
        table(
            "year,state,processes\n\
             2010,SP,10\n\
             2010,RJ,4\n\
             2011,SP,12\n\
             2011,MG,3\n\
             2010,SP,5\n",
        )
    }

    fn lines(chart: &PreparedChart) -> &[LineGeometry] {
        match &chart.geometry {
            Geometry::Lines(lines) => lines,
            other => panic!("expected lines, got {}", other.name()),
        }
    }

    fn bars(chart: &PreparedChart) -> &[BarGeometry] {
        match &chart.geometry {
            Geometry::Bars(bars) => bars,
            other => panic!("expected bars, got {}", other.name()),
        }
    }

    #[test]
    fn test_linear_plots_every_numeric_column() {
        let chart = prepare_linear(&squares(), &LinearOptions::default()).unwrap();
        let lines = lines(&chart);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].label.as_deref(), Some("Z Values"));
        assert_eq!(lines[2].points, vec![(0.0, 1.0), (1.0, 8.0), (2.0, 27.0)]);
        assert!(chart.legend);
        assert!(chart.x_grid && chart.y_grid);
    }

    #[test]
    fn test_linear_x_labels_column() {
        let opts = LinearOptions {
            x_labels: Some("X Values".to_string()),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        assert_eq!(lines(&chart).len(), 2);
        assert_eq!(chart.x_axis.ticks, vec![0.0, 1.0, 2.0]);
        assert_eq!(chart.x_axis.tick_labels, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_linear_unknown_x_labels() {
        let opts = LinearOptions {
            x_labels: Some("W Values".to_string()),
            ..LinearOptions::default()
        };
        let err = prepare_linear(&squares(), &opts).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("x_labels"));
    }

    #[test]
    fn test_linear_all_columns_ignored() {
        let opts = LinearOptions {
            ignore: vec!["X Values".into(), "Y Values".into(), "Z Values".into()],
            ..LinearOptions::default()
        };
        assert!(prepare_linear(&squares(), &opts).unwrap_err().is_configuration());
    }

    #[test]
    fn test_linear_colors_wrap_and_style_color() {
        let opts = LinearOptions {
            colors: Some(vec!["red".into(), "blue".into()]),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        let colors: Vec<_> = lines(&chart).iter().map(|l| l.color).collect();
        assert_eq!(colors, vec![RGBColor(255, 0, 0), RGBColor(0, 0, 255), RGBColor(255, 0, 0)]);

        let opts = LinearOptions {
            style: "g--".into(),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        assert!(lines(&chart).iter().all(|l| l.color == RGBColor(0, 128, 0)));
        assert!(lines(&chart).iter().all(|l| l.line == Some(LineKind::Dashed) && l.marker.is_none()));
    }

    #[test]
    fn test_linear_legend_map() {
        let mut map = BTreeMap::new();
        map.insert("Y Values".to_string(), "squares".to_string());
        let opts = LinearOptions {
            legends: Legends::Labels(map),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        let labels: Vec<_> = lines(&chart).iter().map(|l| l.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["X Values", "squares", "Z Values"]);

        let opts = LinearOptions {
            legends: Legends::Show(false),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        assert!(!chart.legend);
        assert!(lines(&chart).iter().all(|l| l.label.is_none()));
    }

    #[test]
    fn test_scatter_defaults_to_date_column() {
        let t = table("value,day\n3,2011-01-03\n1,2011-01-01\n2,2011-01-02\n");
        let chart = prepare_scatter(&t, &ScatterOptions::default()).unwrap();
        let lines = lines(&chart);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].points, vec![(1.0, 3.0), (2.0, 1.0), (3.0, 2.0)]);
        assert_eq!(chart.x_axis.limits, Some((0.0, 4.0)));
        assert_eq!(chart.x_axis.tick_labels, vec!["2011-01-03", "2011-01-01", "2011-01-02"]);
        assert_eq!(chart.x_axis.description.as_deref(), Some("day"));
        assert_eq!(chart.x_axis.label_rotation, TEMPORAL_LABEL_ROTATION);
    }

    #[test]
    fn test_scatter_order_by_sorts_a_copy() {
        let t = table("value,day\n3,2011-01-03\n1,2011-01-01\n2,2011-01-02\n");
        let before = t.rows().to_vec();
        let opts = ScatterOptions {
            order_by: Some("day".into()),
            ordering: SortOrder::Desc,
            x_label: Some("Date".into()),
            y_label: "Value".into(),
            y_lim: Some((0.0, 5.0)),
            ..ScatterOptions::default()
        };
        let chart = prepare_scatter(&t, &opts).unwrap();
        assert_eq!(lines(&chart)[0].points, vec![(1.0, 3.0), (2.0, 2.0), (3.0, 1.0)]);
        assert_eq!(chart.x_axis.description.as_deref(), Some("Date"));
        assert_eq!(chart.y_axis.description.as_deref(), Some("Value"));
        assert_eq!(chart.y_axis.limits, Some((0.0, 5.0)));
        assert_eq!(t.rows(), before.as_slice());
    }

    #[test]
    fn test_scatter_first_column_fallback_and_no_labels() {
        let opts = ScatterOptions {
            labels: false,
            ..ScatterOptions::default()
        };
        let chart = prepare_scatter(&squares(), &opts).unwrap();
        assert_eq!(lines(&chart).len(), 2);
        assert_eq!(chart.x_axis.tick_labels, vec!["1", "2", "3"]);
        assert_eq!(chart.x_axis.label_rotation, 0.0);
        assert!(chart.x_axis.description.is_none());
    }

    #[test]
    fn test_bar_count_first_seen() {
        let opts = BarOptions {
            count: Some("animal".into()),
            order: crate::aggregate::OrderPolicy::FirstSeen,
            ..BarOptions::default()
        };
        let chart = prepare_bar(&animals(), &opts).unwrap();
        let bars = bars(&chart);
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].heights, vec![5.0, 3.0, 1.0, 2.0, 1.0]);
        assert_eq!(bars[0].label.as_deref(), Some("animal"));
        assert_eq!(chart.x_axis.tick_labels, vec!["dog", "cat", "human", "tiger", "coati"]);
        assert_relative_eq!(bars[0].width, 0.8);
        assert_relative_eq!(bars[0].lefts[0], 0.6, epsilon = 1e-12);
    }

    #[test]
    fn test_bar_count_sorted_by_default() {
        let opts = BarOptions {
            count: Some("animal".into()),
            ..BarOptions::default()
        };
        let chart = prepare_bar(&animals(), &opts).unwrap();
        assert_eq!(chart.x_axis.tick_labels, vec!["cat", "coati", "dog", "human", "tiger"]);
        assert_eq!(bars(&chart)[0].heights, vec![3.0, 1.0, 5.0, 1.0, 2.0]);
    }

    #[test]
    fn test_bar_count_with_sum() {
        let opts = BarOptions {
            count: Some("state".into()),
            sum: Some("processes".into()),
            ..BarOptions::default()
        };
        let chart = prepare_bar(&processes(), &opts).unwrap();
        assert_eq!(chart.x_axis.tick_labels, vec!["MG", "RJ", "SP"]);
        assert_eq!(bars(&chart)[0].heights, vec![3.0, 4.0, 27.0]);
    }

    #[test]
    fn test_bar_sum_without_count() {
        let opts = BarOptions {
            sum: Some("processes".into()),
            ..BarOptions::default()
        };
        let err = prepare_bar(&processes(), &opts).unwrap_err();
        assert!(err.to_string().contains("sum"));
    }

    #[test]
    fn test_bar_series_layout() {
        let t = table("label,a,b\nx,1,2\ny,3,4\nz,5,6\n");
        let opts = BarOptions {
            x_column: Some("label".into()),
            ..BarOptions::default()
        };
        let chart = prepare_bar(&t, &opts).unwrap();
        let bars = bars(&chart);
        assert_eq!(bars.len(), 2);
        for (got, want) in bars[0].lefts.iter().zip([0.6, 1.6, 2.6]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        for (got, want) in bars[1].lefts.iter().zip([1.0, 2.0, 3.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(chart.x_axis.ticks, vec![1.0, 2.0, 3.0]);
        assert_eq!(chart.x_axis.tick_labels, vec!["x", "y", "z"]);
        assert_eq!(chart.x_axis.limits, Some((0.0, 4.0)));
        assert_ne!(bars[0].color, bars[1].color);
    }

    #[test]
    fn test_bar_y_columns_order_and_type() {
        let t = table("label,a,b\nx,1,2\ny,3,4\n");
        let opts = BarOptions {
            y_columns: Some(vec!["b".into(), "a".into()]),
            ..BarOptions::default()
        };
        let chart = prepare_bar(&t, &opts).unwrap();
        let labels: Vec<_> = bars(&chart).iter().map(|b| b.label.clone().unwrap()).collect();
        assert_eq!(labels, vec!["b", "a"]);
        assert_eq!(chart.x_axis.tick_labels, vec!["1", "2"]);

        let opts = BarOptions {
            y_columns: Some(vec!["label".into()]),
            ..BarOptions::default()
        };
        let err = prepare_bar(&t, &opts).unwrap_err();
        assert!(err.to_string().contains("y_columns"));
    }

    #[test]
    fn test_bar_rejects_wide_bars() {
        let opts = BarOptions {
            count: Some("animal".into()),
            bar_width: 1.5,
            ..BarOptions::default()
        };
        let err = prepare_bar(&animals(), &opts).unwrap_err();
        assert!(err.to_string().contains("bar_width"));
    }

    #[test]
    fn test_bar_with_every_series_ignored() {
        let t = table("label,a,b\nx,1,2\ny,3,4\n");
        let opts = BarOptions {
            x_column: Some("label".into()),
            ignore: vec!["a".into(), "b".into()],
            ..BarOptions::default()
        };
        let err = prepare_bar(&t, &opts).unwrap_err();
        assert!(matches!(err, PlotError::Configuration { ref parameter, .. } if parameter == "ignore"));

        let opts = BarOptions {
            y_columns: Some(Vec::new()),
            ..BarOptions::default()
        };
        let err = prepare_bar(&t, &opts).unwrap_err();
        assert!(matches!(err, PlotError::Configuration { ref parameter, .. } if parameter == "y_columns"));
    }

    #[test]
    fn test_axis_limit_overrides() {
        let opts = ScatterOptions {
            x_lim: Some((0.0, 10.0)),
            ..ScatterOptions::default()
        };
        let chart = prepare_scatter(&squares(), &opts).unwrap();
        assert_eq!(chart.x_axis.limits, Some((0.0, 10.0)));

        let opts = LinearOptions {
            x_lim: Some((0.0, 10.0)),
            y_lim: Some((0.0, 1.0)),
            ..LinearOptions::default()
        };
        let chart = prepare_linear(&squares(), &opts).unwrap();
        assert_eq!(chart.x_axis.limits, Some((0.0, 10.0)));
        assert_eq!(chart.y_axis.limits, Some((0.0, 1.0)));

        let opts = BarOptions {
            count: Some("animal".into()),
            x_lim: Some((-1.0, 8.0)),
            ..BarOptions::default()
        };
        let chart = prepare_bar(&animals(), &opts).unwrap();
        assert_eq!(chart.x_axis.limits, Some((-1.0, 8.0)));
        assert_eq!(chart.x_axis.ticks.len(), 5);
    }

    #[test]
    fn test_degenerate_axis_limits_are_rejected() {
        for y_lim in [(5.0, 5.0), (10.0, 0.0), (0.0, f64::NAN)] {
            let opts = BarOptions {
                count: Some("animal".into()),
                y_lim: Some(y_lim),
                ..BarOptions::default()
            };
            let err = prepare_bar(&animals(), &opts).unwrap_err();
            assert!(matches!(err, PlotError::Configuration { ref parameter, .. } if parameter == "y_lim"));
        }
        let opts = ScatterOptions {
            x_lim: Some((3.0, 1.0)),
            ..ScatterOptions::default()
        };
        let err = prepare_scatter(&squares(), &opts).unwrap_err();
        assert!(matches!(err, PlotError::Configuration { ref parameter, .. } if parameter == "x_lim"));
    }

    #[test]
    fn test_stacked_bar_offsets() {
        let opts = StackedBarOptions::new("state", "processes", "year");
        let chart = prepare_stacked_bar(&processes(), &opts).unwrap();
        let bars = bars(&chart);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].label.as_deref(), Some("2010"));
        assert_eq!(bars[0].heights, vec![0.0, 4.0, 15.0]);
        assert_eq!(bars[1].heights, vec![3.0, 0.0, 12.0]);
        assert_eq!(bars[0].bottoms, vec![0.0, 0.0, 0.0]);
        assert_eq!(bars[1].bottoms, vec![0.0, 4.0, 15.0]);
        assert_eq!(bars[0].lefts, bars[1].lefts);
        assert_relative_eq!(bars[0].lefts[0], 0.25, epsilon = 1e-12);
        assert_eq!(chart.x_axis.tick_labels, vec!["MG", "RJ", "SP"]);
        assert_eq!(chart.x_axis.ticks, vec![0.5, 1.5, 2.5]);
    }

    #[test]
    fn test_radar_curves() {
        let opts = RadarOptions::new("state", "processes", "year");
        let chart = prepare_radar(&processes(), &opts).unwrap();
        assert!(!chart.legend);
        assert!(!chart.x_grid);
        assert!(chart.y_grid);
        match &chart.geometry {
            Geometry::Radar(radar) => {
                assert_eq!(radar.axis_labels, vec!["MG", "RJ", "SP"]);
                assert_eq!(radar.angles.len(), 3);
                assert_relative_eq!(radar.angles[1], 2.0 * std::f64::consts::PI / 3.0);
                assert_eq!(radar.curves.len(), 2);
                assert_eq!(radar.curves[1].values, vec![3.0, 0.0, 12.0]);
                assert_ne!(radar.curves[0].color, radar.curves[1].color);
                assert_relative_eq!(radar.fill_alpha, 0.5);
            }
            other => panic!("expected radar, got {}", other.name()),
        }
    }

    #[test]
    fn test_radar_legends_use_series_keys() {
        let mut opts = RadarOptions::new("state", "processes", "year");
        let mut map = BTreeMap::new();
        map.insert("2011".to_string(), "last year".to_string());
        opts.legends = Legends::Labels(map);
        let chart = prepare_radar(&processes(), &opts).unwrap();
        assert!(chart.legend);
        match &chart.geometry {
            Geometry::Radar(radar) => {
                assert_eq!(radar.curves[0].label.as_deref(), Some("2010"));
                assert_eq!(radar.curves[1].label.as_deref(), Some("last year"));
            }
            other => panic!("expected radar, got {}", other.name()),
        }

        let mut map = BTreeMap::new();
        map.insert("1999".to_string(), "never".to_string());
        opts.legends = Legends::Labels(map);
        assert!(prepare_radar(&processes(), &opts).unwrap_err().is_configuration());
    }

    #[test]
    fn test_radar_area_wedges() {
        let t = table("label,value\na,1\nb,2\nc,3\nd,4\n");
        let chart = prepare_radar_area(&t, &RadarAreaOptions::new("value", "label")).unwrap();
        match &chart.geometry {
            Geometry::RadarArea(area) => {
                assert_eq!(area.layout.starts.len(), 4);
                assert_relative_eq!(area.layout.width, std::f64::consts::FRAC_PI_2 - 0.05);
                assert_eq!(area.colors.len(), 4);
                assert_eq!(area.labels, vec!["a", "b", "c", "d"]);
            }
            other => panic!("expected radar_area, got {}", other.name()),
        }
    }

    #[test]
    fn test_pie_slices() {
        let t = table("label,value\na,1\nb,3\n");
        let chart = prepare_pie(&t, &PieOptions::new("value", "label")).unwrap();
        match &chart.geometry {
            Geometry::Pie(pie) => {
                assert_eq!(pie.slices.len(), 2);
                assert_relative_eq!(pie.slices[1].fraction, 0.75);
                assert_eq!(pie.slices[1].percent_label, "75.00%");
                assert_eq!(pie.colors.len(), 2);
            }
            other => panic!("expected pie, got {}", other.name()),
        }
        let err = prepare_pie(&t, &PieOptions::new("label", "label")).unwrap_err();
        assert!(err.to_string().contains("values_column"));
    }

    #[test]
    fn test_prepare_chart_dispatch() {
        let chart = ChartRequest::from_json_str(r#"{"kind": "bar", "count": "animal"}"#).unwrap();
        let table = animals();
        let prepared = prepare_chart(PlotRequest {
            table: &table,
            chart: &chart,
        })
        .unwrap();
        assert_eq!(prepared.geometry.name(), "bars");
    }
}
