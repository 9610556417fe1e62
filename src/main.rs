use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use csvplotter::csv_reader;
use csvplotter::template::{expand_variables, parse_definitions};
use csvplotter::{ChartRequest, FigureConfig, OutputFormat, Plotter, RenderOptions};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Linear,
    Scatter,
    Bar,
    #[value(name = "stacked_bar")]
    StackedBar,
    Radar,
    #[value(name = "radar_area")]
    RadarArea,
    Pie,
}

impl Kind {
    fn name(self) -> &'static str {
        match self {
            Kind::Linear => "linear",
            Kind::Scatter => "scatter",
            Kind::Bar => "bar",
            Kind::StackedBar => "stacked_bar",
            Kind::Radar => "radar",
            Kind::RadarArea => "radar_area",
            Kind::Pie => "pie",
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Svg,
}

#[derive(Parser, Debug)]
#[command(name = "csvplotter")]
#[command(about = "Draw charts from CSV data", long_about = None)]
struct Args {
    /// Chart kind; also the default `kind` for --chart objects that omit it
    kind: Option<Kind>,

    /// CSV file to read (default: stdin)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Image file to write (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON figure config with rows, cols, render options and charts
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chart request as a JSON object, e.g. '{"kind": "bar", "count": "animal"}'
    #[arg(long = "chart")]
    charts: Vec<String>,

    /// Template variable used in configs and chart requests as $NAME
    #[arg(short = 'D', long = "define", value_name = "NAME=VALUE")]
    defines: Vec<String>,

    #[arg(long)]
    rows: Option<usize>,

    #[arg(long)]
    cols: Option<usize>,

    #[arg(long)]
    width: Option<u32>,

    #[arg(long)]
    height: Option<u32>,

    #[arg(long, value_enum)]
    format: Option<Format>,

    /// Figure title drawn above all charts
    #[arg(long)]
    title: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    // 1. Figure config
    let variables = parse_definitions(&args.defines)?;
    let config = build_config(&args, &variables)?;
    debug!(
        rows = config.rows,
        cols = config.cols,
        charts = config.charts.len(),
        "figure config"
    );

    // 2. Table
    let table = match &args.input {
        Some(path) => csv_reader::read_csv_path(path)
            .with_context(|| format!("Failed to read CSV from {}", path.display()))?,
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?,
    };

    // 3. Prepare every chart before drawing anything
    let plotter = Plotter::from_config(table, &config).context("Failed to prepare charts")?;

    // 4. Render
    match &args.output {
        Some(path) => plotter
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => {
            let bytes = plotter.render().context("Failed to render figure")?;
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle
                .write_all(&bytes)
                .context("Failed to write image to stdout")?;
            handle.flush().context("Failed to flush stdout")?;
        }
    }

    Ok(())
}

fn build_config(args: &Args, variables: &HashMap<String, String>) -> Result<FigureConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            FigureConfig::from_json_str(&expand_variables(&text, variables)?)?
        }
        None => FigureConfig {
            rows: 1,
            cols: 1,
            title: None,
            render: RenderOptions::default(),
            charts: Vec::new(),
        },
    };

    for chart in &args.charts {
        config.charts.push(parse_chart(chart, args.kind, variables)?);
    }
    if config.charts.is_empty() {
        match args.kind {
            Some(kind) => config.charts.push(serde_json::from_value::<ChartRequest>(
                serde_json::json!({ "kind": kind.name() }),
            )
            .map_err(|e| anyhow::anyhow!("'{}' needs options, pass them with --chart: {}", kind.name(), e))?),
            None => bail!("No chart requested: give a KIND, --chart or --config"),
        }
    }

    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }
    if let Some(format) = args.format {
        config.render.format = match format {
            Format::Png => OutputFormat::Png,
            Format::Svg => OutputFormat::Svg,
        };
    }
    if let Some(title) = &args.title {
        config.title = Some(title.clone());
    }
    Ok(config)
}

fn parse_chart(raw: &str, kind: Option<Kind>, variables: &HashMap<String, String>) -> Result<ChartRequest> {
    let expanded = expand_variables(raw, variables)?;
    let mut value: JsonValue = serde_json::from_str(&expanded)
        .with_context(|| format!("Invalid chart JSON: {}", raw))?;
    if let (Some(kind), Some(object)) = (kind, value.as_object_mut()) {
        object
            .entry("kind")
            .or_insert_with(|| JsonValue::from(kind.name()));
    }
    let chart = serde_json::from_value(value).with_context(|| format!("Invalid chart request: {}", raw))?;
    Ok(chart)
}
