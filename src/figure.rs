use crate::csv_reader::{read_csv, read_csv_path};
use crate::data::TableView;
use crate::error::{PlotError, PlotResult};
use crate::graph::{ChartRenderer, PlottersRenderer};
use crate::ir::PreparedChart;
use crate::options::{
    BarOptions, ChartRequest, FigureConfig, LinearOptions, PieOptions, PlotRequest,
    RadarAreaOptions, RadarOptions, ScatterOptions, StackedBarOptions,
};
use crate::prepare::prepare_chart;
use crate::{OutputFormat, RenderOptions};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

// =============================================================================
// Composite figure
// =============================================================================

/// A rows × cols grid of prepared charts, filled in row-major order.
#[derive(Debug, Clone)]
pub struct Figure {
    rows: usize,
    cols: usize,
    title: Option<String>,
    charts: Vec<PreparedChart>,
}

impl Figure {
    pub fn new(rows: usize, cols: usize) -> PlotResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(PlotError::config(
                "rows",
                format!("figure grid must be at least 1x1, got {}x{}", rows, cols),
            ));
        }
        Ok(Self {
            rows,
            cols,
            title: None,
            charts: Vec::new(),
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn capacity(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_full(&self) -> bool {
        self.charts.len() >= self.capacity()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn charts(&self) -> &[PreparedChart] {
        &self.charts
    }

    /// Place a chart in the next free slot.
    pub fn push(&mut self, chart: PreparedChart) -> PlotResult<()> {
        if self.is_full() {
            return Err(PlotError::Capacity {
                capacity: self.capacity(),
            });
        }
        self.charts.push(chart);
        Ok(())
    }
}

// =============================================================================
// Plotter facade
// =============================================================================

/// Loads one table and draws any number of charts from it onto a figure.
pub struct Plotter<R: ChartRenderer = PlottersRenderer> {
    table: TableView,
    figure: Figure,
    options: RenderOptions,
    renderer: R,
}

impl Plotter<PlottersRenderer> {
    pub fn new(table: TableView, rows: usize, cols: usize) -> PlotResult<Self> {
        Self::with_renderer(table, rows, cols, PlottersRenderer)
    }

    pub fn from_csv_path(path: impl AsRef<Path>, rows: usize, cols: usize) -> PlotResult<Self> {
        let table = read_csv_path(path.as_ref())?;
        Self::new(table, rows, cols)
    }

    pub fn from_reader<Rd: Read>(reader: Rd, rows: usize, cols: usize) -> PlotResult<Self> {
        Self::new(read_csv(reader)?, rows, cols)
    }

    /// Build a plotter from a figure config, preparing every chart it lists.
    pub fn from_config(table: TableView, config: &FigureConfig) -> PlotResult<Self> {
        let mut plotter = Self::new(table, config.rows, config.cols)?.with_options(config.render.clone());
        if let Some(title) = &config.title {
            plotter.figure.set_title(title.clone());
        }
        for chart in &config.charts {
            plotter.add(chart)?;
        }
        Ok(plotter)
    }
}

impl<R: ChartRenderer> Plotter<R> {
    pub fn with_renderer(table: TableView, rows: usize, cols: usize, renderer: R) -> PlotResult<Self> {
        Ok(Self {
            table,
            figure: Figure::new(rows, cols)?,
            options: RenderOptions::default(),
            renderer,
        })
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn figure(&self) -> &Figure {
        &self.figure
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.figure.set_title(title);
    }

    /// Prepare a chart and place it in the next slot. Capacity is checked
    /// before any preparation work.
    pub fn add(&mut self, chart: &ChartRequest) -> PlotResult<&PreparedChart> {
        if self.figure.is_full() {
            return Err(PlotError::Capacity {
                capacity: self.figure.capacity(),
            });
        }
        let prepared = prepare_chart(PlotRequest {
            table: &self.table,
            chart,
        })?;
        self.figure.push(prepared)?;
        debug!(
            kind = chart.kind(),
            slot = self.figure.charts().len(),
            capacity = self.figure.capacity(),
            "added chart"
        );
        let last = self.figure.charts.len() - 1;
        Ok(&self.figure.charts[last])
    }

    pub fn linear(&mut self, opts: LinearOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::Linear(opts))
    }

    pub fn scatter(&mut self, opts: ScatterOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::Scatter(opts))
    }

    pub fn bar(&mut self, opts: BarOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::Bar(opts))
    }

    pub fn stacked_bar(&mut self, opts: StackedBarOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::StackedBar(opts))
    }

    pub fn radar(&mut self, opts: RadarOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::Radar(opts))
    }

    pub fn radar_area(&mut self, opts: RadarAreaOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::RadarArea(opts))
    }

    pub fn pie(&mut self, opts: PieOptions) -> PlotResult<&PreparedChart> {
        self.add(&ChartRequest::Pie(opts))
    }

    /// Render the figure with the current options.
    pub fn render(&self) -> PlotResult<Vec<u8>> {
        Ok(self.renderer.render(&self.figure, &self.options)?)
    }

    /// Render and write the image. A `.svg` extension selects SVG output,
    /// anything else uses the configured format. Nothing is written when
    /// rendering fails.
    pub fn save(&self, path: impl AsRef<Path>) -> PlotResult<()> {
        let path = path.as_ref();
        let mut options = self.options.clone();
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
        if is_svg {
            options.format = OutputFormat::Svg;
        }
        let bytes = self.renderer.render(&self.figure, &options)?;
        std::fs::write(path, &bytes)?;
        info!(path = %path.display(), bytes = bytes.len(), "saved figure");
        Ok(())
    }
}
