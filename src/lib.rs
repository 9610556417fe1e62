// Library exports for csvplotter
//
// Pipeline: CSV -> TableView -> chart request -> PreparedChart -> Figure -> image bytes

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod graph;
pub mod palette;
pub mod template;

// Data preparation
pub mod aggregate;
pub mod ir;
pub mod layout;
pub mod options;
pub mod prepare;
pub mod series;
pub mod style;

pub mod figure;

use serde::Deserialize;

pub use data::{ColumnType, SortOrder, TableView, Value};
pub use error::{PlotError, PlotResult};
pub use figure::{Figure, Plotter};
pub use graph::{ChartRenderer, PlottersRenderer};
pub use options::{ChartRequest, FigureConfig, PlotRequest};
pub use prepare::prepare_chart;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderOptions {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default, rename = "type", alias = "format")]
    pub format: OutputFormat,
}

fn default_width() -> u32 {
    1024
}
fn default_height() -> u32 {
    768
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: OutputFormat::Png,
        }
    }
}
