//! Chart requests as read from JSON configs or built by callers.
//!
//! Every chart kind has its own option struct; field names and defaults
//! match the keys accepted in config files.

use crate::aggregate::OrderPolicy;
use crate::data::{SortOrder, TableView};
use crate::error::{PlotError, PlotResult};
use crate::palette::Colormap;
use crate::RenderOptions;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Legend setting: shown with column names, hidden, or relabelled.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Legends {
    Show(bool),
    Labels(BTreeMap<String, String>),
}

impl Default for Legends {
    fn default() -> Self {
        Legends::Show(true)
    }
}

impl Legends {
    pub fn hidden() -> Self {
        Legends::Show(false)
    }

    pub fn is_shown(&self) -> bool {
        !matches!(self, Legends::Show(false))
    }

    /// Legend labels for `names`, or `None` when legends are hidden.
    ///
    /// Keys of a label map must be in `known`; names without an entry keep
    /// their own name.
    pub fn labels<S: AsRef<str>>(&self, names: &[String], known: &[S]) -> PlotResult<Option<Vec<String>>> {
        match self {
            Legends::Show(false) => Ok(None),
            Legends::Show(true) => Ok(Some(names.to_vec())),
            Legends::Labels(map) => {
                if let Some(unknown) = map.keys().find(|k| !known.iter().any(|n| n.as_ref() == k.as_str())) {
                    return Err(PlotError::config("legends", format!("unknown legend key '{}'", unknown)));
                }
                Ok(Some(
                    names
                        .iter()
                        .map(|n| map.get(n).cloned().unwrap_or_else(|| n.clone()))
                        .collect(),
                ))
            }
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_style() -> String {
    "o-".to_string()
}

fn prgn() -> Colormap {
    Colormap::Prgn
}

fn gist_heat() -> Colormap {
    Colormap::GistHeat
}

fn default_bar_width() -> f64 {
    0.8
}

fn default_bar_start() -> f64 {
    0.5
}

fn default_bar_increment() -> f64 {
    1.0
}

fn default_stacked_bar_width() -> f64 {
    0.5
}

fn default_fill_alpha() -> f64 {
    0.5
}

fn default_spacing() -> f64 {
    0.05
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearOptions {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "default_style")]
    pub style: String,
    /// Column whose values label the x ticks.
    #[serde(default)]
    pub x_labels: Option<String>,
    #[serde(default)]
    pub legends: Legends,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "prgn")]
    pub colormap: Colormap,
    #[serde(default)]
    pub x_lim: Option<(f64, f64)>,
    #[serde(default)]
    pub y_lim: Option<(f64, f64)>,
}

impl Default for LinearOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            grid: true,
            style: default_style(),
            x_labels: None,
            legends: Legends::default(),
            ignore: Vec::new(),
            colors: None,
            colormap: Colormap::Prgn,
            x_lim: None,
            y_lim: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScatterOptions {
    /// Defaults to the first date/datetime column, then the first column.
    #[serde(default)]
    pub x_column: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub grid: bool,
    /// Draw axis descriptions.
    #[serde(default = "default_true")]
    pub labels: bool,
    #[serde(default)]
    pub legends: Legends,
    #[serde(default = "default_style")]
    pub style: String,
    #[serde(default)]
    pub ignore: Vec<String>,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "prgn")]
    pub colormap: Colormap,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub ordering: SortOrder,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: String,
    /// Replaces the default `(0, rows + 1)` x range.
    #[serde(default)]
    pub x_lim: Option<(f64, f64)>,
    #[serde(default)]
    pub y_lim: Option<(f64, f64)>,
}

impl Default for ScatterOptions {
    fn default() -> Self {
        Self {
            x_column: None,
            title: String::new(),
            grid: true,
            labels: true,
            legends: Legends::default(),
            style: default_style(),
            ignore: Vec::new(),
            colors: None,
            colormap: Colormap::Prgn,
            order_by: None,
            ordering: SortOrder::Asc,
            x_label: None,
            y_label: String::new(),
            x_lim: None,
            y_lim: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BarOptions {
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub grid: bool,
    /// Plot the frequency of each value of this column.
    #[serde(default)]
    pub count: Option<String>,
    /// With `count`, sum this column per value instead of counting rows.
    #[serde(default)]
    pub sum: Option<String>,
    #[serde(default)]
    pub order: OrderPolicy,
    #[serde(default = "default_bar_width")]
    pub bar_width: f64,
    /// Column whose values label the categories when plotting series.
    #[serde(default)]
    pub x_column: Option<String>,
    #[serde(default = "default_bar_start")]
    pub bar_start: f64,
    #[serde(default = "default_bar_increment")]
    pub bar_increment: f64,
    #[serde(default)]
    pub legends: Legends,
    /// Tick label angle in degrees, snapped to the nearest quarter turn.
    #[serde(default)]
    pub x_rotation: f64,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "prgn")]
    pub colormap: Colormap,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub x_lim: Option<(f64, f64)>,
    #[serde(default)]
    pub y_lim: Option<(f64, f64)>,
    #[serde(default)]
    pub y_columns: Option<Vec<String>>,
    #[serde(default)]
    pub ignore: Vec<String>,
}

impl Default for BarOptions {
    fn default() -> Self {
        Self {
            title: String::new(),
            grid: true,
            count: None,
            sum: None,
            order: OrderPolicy::default(),
            bar_width: default_bar_width(),
            x_column: None,
            bar_start: default_bar_start(),
            bar_increment: default_bar_increment(),
            legends: Legends::default(),
            x_rotation: 0.0,
            colors: None,
            colormap: Colormap::Prgn,
            y_label: None,
            x_lim: None,
            y_lim: None,
            y_columns: None,
            ignore: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackedBarOptions {
    /// Categories along the x axis.
    pub x_column: String,
    /// Values summed per (stack, category).
    pub y_column: String,
    /// One stacked segment per distinct value of this column.
    pub y_labels: String,
    #[serde(default)]
    pub title: String,
    #[serde(default = "default_true")]
    pub grid: bool,
    #[serde(default = "default_stacked_bar_width")]
    pub bar_width: f64,
    #[serde(default)]
    pub x_rotation: f64,
    #[serde(default)]
    pub legends: Legends,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "gist_heat")]
    pub colormap: Colormap,
}

impl StackedBarOptions {
    pub fn new(x_column: impl Into<String>, y_column: impl Into<String>, y_labels: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            y_column: y_column.into(),
            y_labels: y_labels.into(),
            title: String::new(),
            grid: true,
            bar_width: default_stacked_bar_width(),
            x_rotation: 0.0,
            legends: Legends::default(),
            colors: None,
            colormap: Colormap::GistHeat,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadarOptions {
    /// One axis per distinct value of this column.
    pub axis_labels: String,
    pub values: String,
    /// One curve per distinct value of this column.
    pub legends_column: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_grid: bool,
    #[serde(default = "default_true")]
    pub y_grid: bool,
    #[serde(default = "default_fill_alpha")]
    pub fill_alpha: f64,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "gist_heat")]
    pub colormap: Colormap,
    #[serde(default = "Legends::hidden")]
    pub legends: Legends,
}

impl RadarOptions {
    pub fn new(axis_labels: impl Into<String>, values: impl Into<String>, legends_column: impl Into<String>) -> Self {
        Self {
            axis_labels: axis_labels.into(),
            values: values.into(),
            legends_column: legends_column.into(),
            title: String::new(),
            x_grid: false,
            y_grid: true,
            fill_alpha: default_fill_alpha(),
            colors: None,
            colormap: Colormap::GistHeat,
            legends: Legends::hidden(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RadarAreaOptions {
    pub values_column: String,
    pub labels_column: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_grid: bool,
    #[serde(default = "default_true")]
    pub y_grid: bool,
    #[serde(default = "default_fill_alpha")]
    pub fill_alpha: f64,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "gist_heat")]
    pub colormap: Colormap,
    /// Angular gap between wedges, in radians.
    #[serde(default = "default_spacing")]
    pub spacing: f64,
}

impl RadarAreaOptions {
    pub fn new(values_column: impl Into<String>, labels_column: impl Into<String>) -> Self {
        Self {
            values_column: values_column.into(),
            labels_column: labels_column.into(),
            title: String::new(),
            x_grid: false,
            y_grid: true,
            fill_alpha: default_fill_alpha(),
            colors: None,
            colormap: Colormap::GistHeat,
            spacing: default_spacing(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PieOptions {
    pub values_column: String,
    pub labels_column: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub colors: Option<Vec<String>>,
    #[serde(default = "gist_heat")]
    pub colormap: Colormap,
}

impl PieOptions {
    pub fn new(values_column: impl Into<String>, labels_column: impl Into<String>) -> Self {
        Self {
            values_column: values_column.into(),
            labels_column: labels_column.into(),
            title: String::new(),
            colors: None,
            colormap: Colormap::GistHeat,
        }
    }
}

/// One chart to draw, tagged by `kind`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartRequest {
    Linear(LinearOptions),
    Scatter(ScatterOptions),
    Bar(BarOptions),
    StackedBar(StackedBarOptions),
    Radar(RadarOptions),
    RadarArea(RadarAreaOptions),
    Pie(PieOptions),
}

impl ChartRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ChartRequest::Linear(_) => "linear",
            ChartRequest::Scatter(_) => "scatter",
            ChartRequest::Bar(_) => "bar",
            ChartRequest::StackedBar(_) => "stacked_bar",
            ChartRequest::Radar(_) => "radar",
            ChartRequest::RadarArea(_) => "radar_area",
            ChartRequest::Pie(_) => "pie",
        }
    }

    pub fn from_json_str(json: &str) -> PlotResult<Self> {
        serde_json::from_str(json).map_err(|e| PlotError::config("chart", e.to_string()))
    }
}

/// A chart request bound to the table it reads from.
#[derive(Debug, Clone, Copy)]
pub struct PlotRequest<'a> {
    pub table: &'a TableView,
    pub chart: &'a ChartRequest,
}

fn default_grid_size() -> usize {
    1
}

/// A whole figure: grid shape, image options and the charts, in slot order.
#[derive(Debug, Clone, Deserialize)]
pub struct FigureConfig {
    #[serde(default = "default_grid_size")]
    pub rows: usize,
    #[serde(default = "default_grid_size")]
    pub cols: usize,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub render: RenderOptions,
    #[serde(default)]
    pub charts: Vec<ChartRequest>,
}

impl FigureConfig {
    pub fn from_json_str(json: &str) -> PlotResult<Self> {
        serde_json::from_str(json).map_err(|e| PlotError::config("config", e.to_string()))
    }
}
