use crate::figure::Figure;
use crate::ir::{
    Axis, BarGeometry, Geometry, LineGeometry, PieGeometry, PreparedChart, RadarAreaGeometry,
    RadarGeometry,
};
use crate::style::{LineKind, Marker};
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::{DashedLineSeries, LineSeries};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::iter;
use std::ops::Range;
use tracing::debug;

/// Radius of the drawable disc in polar charts, in chart units.
const POLAR_EXTENT: f64 = 1.3;
const POLAR_RINGS: usize = 4;
const ARC_STEPS: usize = 64;

/// Draws a figure into encoded image bytes.
pub trait ChartRenderer {
    fn render(&self, figure: &Figure, options: &RenderOptions) -> Result<Vec<u8>>;
}

/// Renders with plotters: PNG through an RGB bitmap, or SVG.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, figure: &Figure, options: &RenderOptions) -> Result<Vec<u8>> {
        if options.width == 0 || options.height == 0 {
            anyhow::bail!(
                "Image size must be positive (got {}x{})",
                options.width,
                options.height
            );
        }
        let size = (options.width, options.height);
        debug!(
            width = options.width,
            height = options.height,
            charts = figure.charts().len(),
            "rendering figure"
        );

        match options.format {
            OutputFormat::Png => {
                let mut buffer = vec![0u8; options.width as usize * options.height as usize * 3];
                {
                    let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
                    draw_figure(&root, figure)?;
                    root.present().context("Failed to present drawing")?;
                }
                encode_png(&buffer, options.width, options.height)
            }
            OutputFormat::Svg => {
                let mut svg = String::new();
                {
                    let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                    draw_figure(&root, figure)?;
                    root.present().context("Failed to present drawing")?;
                }
                Ok(svg.into_bytes())
            }
        }
    }
}

/// Encode an RGB buffer as PNG
fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn draw_figure<DB>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;

    let grid = (figure.rows(), figure.cols());
    let areas = match figure.title() {
        Some(title) => root
            .titled(title, ("sans-serif", 28))
            .context("Failed to draw figure title")?
            .split_evenly(grid),
        None => root.split_evenly(grid),
    };

    // Slots without a chart stay blank
    for (slot, (area, chart)) in areas.iter().zip(figure.charts()).enumerate() {
        debug!(slot, geometry = chart.geometry.name(), "drawing chart");
        draw_chart(area, chart).with_context(|| format!("Failed to draw chart in slot {}", slot + 1))?;
    }
    Ok(())
}

fn draw_chart<DB>(area: &DrawingArea<DB, Shift>, chart: &PreparedChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    match &chart.geometry {
        Geometry::Lines(_) | Geometry::Bars(_) => draw_cartesian(area, chart),
        Geometry::Radar(radar) => draw_radar(area, chart, radar),
        Geometry::RadarArea(wedges) => draw_radar_area(area, chart, wedges),
        Geometry::Pie(pie) => draw_pie(area, chart, pie),
    }
}

// =============================================================================
// Cartesian charts
// =============================================================================

/// X axis whose key points are the prepared ticks, labelled with the
/// prepared tick labels.
#[derive(Clone)]
struct CategoryAxis {
    range: Range<f64>,
    axis: Axis,
}

impl Ranged for CategoryAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let range_len = self.range.end - self.range.start;
        let normalized = (*value - self.range.start) / range_len;
        ((limit.1 - limit.0) as f64 * normalized) as i32 + limit.0
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        if self.axis.ticks.is_empty() {
            RangedCoordf64::from(self.range.clone()).key_points(hint)
        } else {
            self.axis
                .ticks
                .iter()
                .copied()
                .filter(|t| self.range.contains(t))
                .collect()
        }
    }

    fn range(&self) -> Range<f64> {
        self.range.clone()
    }
}

impl ValueFormatter<f64> for CategoryAxis {
    fn format_ext(&self, value: &f64) -> String {
        match self.axis.tick_label_at(*value) {
            Some(label) => label.to_string(),
            None => format_number(*value),
        }
    }
}

/// Plotters only turns text by quarter turns. Any tilt below half a turn
/// draws the labels vertically, tilts past it read the other way.
fn label_transform(degrees: f64) -> FontTransform {
    let angle = degrees.rem_euclid(360.0);
    if !angle.is_finite() || angle < 1e-6 || angle > 360.0 - 1e-6 {
        FontTransform::None
    } else if (angle - 180.0).abs() < 1e-6 {
        FontTransform::Rotate180
    } else if angle < 180.0 {
        FontTransform::Rotate90
    } else {
        FontTransform::Rotate270
    }
}

type CartesianContext<'a, DB> = ChartContext<'a, DB, Cartesian2d<CategoryAxis, RangedCoordf64>>;

fn draw_cartesian<DB>(area: &DrawingArea<DB, Shift>, chart: &PreparedChart) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // 1. Ranges
    let x_range = match chart.x_axis.limits {
        Some((lo, hi)) => lo..hi,
        None => data_x_range(&chart.geometry),
    };
    let y_range = match chart.y_axis.limits {
        Some((lo, hi)) => lo..hi,
        None => data_y_range(&chart.geometry),
    };
    let transform = label_transform(chart.x_axis.label_rotation);
    let rotated = !matches!(transform, FontTransform::None);

    // 2. Chart and mesh
    let mut builder = ChartBuilder::on(area);
    builder
        .margin(10)
        .x_label_area_size(if rotated { 80 } else { 40 })
        .y_label_area_size(50);
    if !chart.title.is_empty() {
        builder.caption(&chart.title, ("sans-serif", 20));
    }
    let x_axis = CategoryAxis {
        range: x_range,
        axis: chart.x_axis.clone(),
    };
    let mut ctx = builder
        .build_cartesian_2d(x_axis, y_range)
        .context("Failed to build chart")?;

    let x_font = ("sans-serif", 12).into_font().transform(transform);
    let mut mesh = ctx.configure_mesh();
    mesh.x_label_style(x_font);
    if !chart.x_grid {
        mesh.disable_x_mesh();
    }
    if !chart.y_grid {
        mesh.disable_y_mesh();
    }
    if let Some(desc) = &chart.x_axis.description {
        mesh.x_desc(desc.as_str());
    }
    if let Some(desc) = &chart.y_axis.description {
        mesh.y_desc(desc.as_str());
    }
    mesh.draw().context("Failed to draw mesh")?;

    // 3. Series
    match &chart.geometry {
        Geometry::Lines(lines) => {
            for line in lines {
                draw_line(&mut ctx, line)?;
            }
        }
        Geometry::Bars(series) => {
            for bars in series {
                draw_bars(&mut ctx, bars)?;
            }
        }
        _ => {}
    }

    // 4. Legend
    if chart.legend {
        ctx.configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }
    Ok(())
}

fn draw_line<DB>(ctx: &mut CartesianContext<'_, DB>, line: &LineGeometry) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    // NaN values split the line into segments
    let segments: Vec<Vec<(f64, f64)>> = line
        .points
        .split(|(_, y)| !y.is_finite())
        .filter(|s| !s.is_empty())
        .map(<[(f64, f64)]>::to_vec)
        .collect();

    let color = line.color;
    let stroke = color.stroke_width(2);
    let mut labelled = false;

    if let Some(kind) = line.line {
        for segment in &segments {
            let points = segment.clone();
            let anno = match kind {
                LineKind::Solid => ctx.draw_series(LineSeries::new(points, stroke)),
                LineKind::Dashed => ctx.draw_series(DashedLineSeries::new(points, 10, 6, stroke)),
                LineKind::DashDot => ctx.draw_series(DashedLineSeries::new(points, 14, 4, stroke)),
                LineKind::Dotted => ctx.draw_series(DashedLineSeries::new(points, 2, 4, stroke)),
            }
            .context("Failed to draw line series")?;
            if !labelled {
                if let Some(label) = &line.label {
                    anno.label(label.as_str()).legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
                }
                labelled = true;
            }
        }
    }

    if let Some(marker) = line.marker {
        let points: Vec<(f64, f64)> = segments.concat();
        let fill = color.filled();
        let anno = match marker {
            Marker::Circle => ctx.draw_series(points.iter().map(|&p| Circle::new(p, 4, fill))),
            Marker::Point => ctx.draw_series(points.iter().map(|&p| Circle::new(p, 2, fill))),
            Marker::Square => ctx.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Rectangle::new([(-3, -3), (3, 3)], fill)),
            ),
            Marker::TriangleUp => {
                ctx.draw_series(points.iter().map(|&p| TriangleMarker::new(p, 5, fill)))
            }
            Marker::TriangleDown => ctx.draw_series(
                points
                    .iter()
                    .map(|&p| EmptyElement::at(p) + Polygon::new(vec![(-4, -3), (4, -3), (0, 4)], fill)),
            ),
            Marker::Diamond => ctx.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p) + Polygon::new(vec![(0, -5), (5, 0), (0, 5), (-5, 0)], fill)
            })),
            Marker::Plus | Marker::Star => ctx.draw_series(points.iter().map(|&p| {
                EmptyElement::at(p)
                    + PathElement::new(vec![(-4, 0), (4, 0)], stroke)
                    + PathElement::new(vec![(0, -4), (0, 4)], stroke)
            })),
            Marker::Cross => ctx.draw_series(points.iter().map(|&p| Cross::new(p, 4, stroke))),
        }
        .context("Failed to draw markers")?;
        if !labelled {
            if let Some(label) = &line.label {
                anno.label(label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
            }
        }
    }
    Ok(())
}

fn draw_bars<DB>(ctx: &mut CartesianContext<'_, DB>, bars: &BarGeometry) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let color = bars.color;
    let anno = ctx
        .draw_series(
            bars.rects()
                .map(|(x0, y0, x1, y1)| Rectangle::new([(x0, y0), (x1, y1)], color.filled())),
        )
        .context("Failed to draw bars")?;
    if let Some(label) = &bars.label {
        anno.label(label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
    }
    Ok(())
}

fn data_x_range(geometry: &Geometry) -> Range<f64> {
    match geometry {
        Geometry::Lines(lines) => padded_range(
            lines.iter().flat_map(|l| l.points.iter().map(|p| p.0)),
            false,
        ),
        Geometry::Bars(bars) => padded_range(
            bars.iter().flat_map(|b| b.rects().flat_map(|(x0, _, x1, _)| [x0, x1])),
            false,
        ),
        _ => -1.0..1.0,
    }
}

fn data_y_range(geometry: &Geometry) -> Range<f64> {
    match geometry {
        Geometry::Lines(lines) => padded_range(
            lines.iter().flat_map(|l| l.points.iter().map(|p| p.1)),
            false,
        ),
        Geometry::Bars(bars) => padded_range(
            bars.iter().flat_map(|b| b.rects().flat_map(|(_, y0, _, y1)| [y0, y1])),
            true,
        ),
        _ => -1.0..1.0,
    }
}

/// Finite span of `values` with 5% padding; bars keep their zero baseline.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if lo == hi {
        return (lo - 1.0)..(hi + 1.0);
    }
    let padding = (hi - lo) * 0.05;
    let lo = if include_zero && lo == 0.0 { 0.0 } else { lo - padding };
    lo..(hi + padding)
}

fn format_number(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{:.0}", value)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// =============================================================================
// Polar charts
// =============================================================================

type PolarContext<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

fn polar(angle: f64, radius: f64) -> (f64, f64) {
    (radius * angle.cos(), radius * angle.sin())
}

/// Arc points from `start` to `end` at `radius`, closed through the center.
fn wedge(start: f64, end: f64, radius: f64) -> Vec<(f64, f64)> {
    let steps = (((end - start) / (2.0 * PI)) * ARC_STEPS as f64).ceil().max(2.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push((0.0, 0.0));
    for i in 0..=steps {
        let angle = start + (end - start) * i as f64 / steps as f64;
        points.push(polar(angle, radius));
    }
    points
}

fn square_area<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> DrawingArea<DB, Shift> {
    let (w, h) = area.dim_in_pixel();
    let side = w.min(h);
    area.clone().shrink(((w - side) / 2, (h - side) / 2), (side, side))
}

fn polar_chart<'a, DB>(area: &'a DrawingArea<DB, Shift>, title: &str) -> Result<PolarContext<'a, DB>>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let mut builder = ChartBuilder::on(area);
    builder.margin(20);
    if !title.is_empty() {
        builder.caption(title, ("sans-serif", 20));
    }
    builder
        .build_cartesian_2d(-POLAR_EXTENT..POLAR_EXTENT, -POLAR_EXTENT..POLAR_EXTENT)
        .context("Failed to build chart")
}

fn centered_text(size: u32) -> TextStyle<'static> {
    TextStyle::from(("sans-serif", size).into_font()).pos(Pos::new(HPos::Center, VPos::Center))
}

/// Rings for the radial axis, spokes for the angular axis.
fn draw_polar_grid<DB>(
    ctx: &mut PolarContext<'_, DB>,
    chart: &PreparedChart,
    spokes: &[f64],
    max: f64,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let grid = BLACK.mix(0.2).stroke_width(1);
    if chart.y_grid {
        for ring in 1..=POLAR_RINGS {
            let radius = ring as f64 / POLAR_RINGS as f64;
            let circle: Vec<(f64, f64)> = (0..=ARC_STEPS)
                .map(|i| polar(2.0 * PI * i as f64 / ARC_STEPS as f64, radius))
                .collect();
            ctx.draw_series(iter::once(PathElement::new(circle, grid)))
                .context("Failed to draw grid")?;
            if max > 0.0 {
                ctx.draw_series(iter::once(Text::new(
                    format_number(max * radius),
                    polar(PI / 8.0, radius),
                    ("sans-serif", 11).into_font(),
                )))
                .context("Failed to draw grid labels")?;
            }
        }
    }
    if chart.x_grid {
        ctx.draw_series(
            spokes
                .iter()
                .map(|&a| PathElement::new(vec![(0.0, 0.0), polar(a, 1.0)], grid)),
        )
        .context("Failed to draw grid")?;
    }
    Ok(())
}

fn draw_polar_labels<DB>(ctx: &mut PolarContext<'_, DB>, angles: &[f64], labels: &[String]) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let style = centered_text(13);
    ctx.draw_series(
        angles
            .iter()
            .zip(labels)
            .map(|(&a, label)| Text::new(label.clone(), polar(a, 1.15), style.clone())),
    )
    .context("Failed to draw axis labels")?;
    Ok(())
}

fn finite_max(values: impl Iterator<Item = f64>) -> f64 {
    values.filter(|v| v.is_finite()).fold(0.0, f64::max)
}

fn draw_radar<DB>(area: &DrawingArea<DB, Shift>, chart: &PreparedChart, radar: &RadarGeometry) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let square = square_area(area);
    let mut ctx = polar_chart(&square, &chart.title)?;

    let max = finite_max(radar.curves.iter().flat_map(|c| c.values.iter().copied()));
    let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
    draw_polar_grid(&mut ctx, chart, &radar.angles, max)?;
    draw_polar_labels(&mut ctx, &radar.angles, &radar.axis_labels)?;

    for curve in &radar.curves {
        let points: Vec<(f64, f64)> = radar
            .angles
            .iter()
            .zip(&curve.values)
            .map(|(&a, &v)| polar(a, if v.is_finite() { v * scale } else { 0.0 }))
            .collect();
        ctx.draw_series(iter::once(Polygon::new(
            points.clone(),
            curve.color.mix(radar.fill_alpha).filled(),
        )))
        .context("Failed to draw radar area")?;

        let mut outline = points.clone();
        if let Some(&first) = points.first() {
            outline.push(first);
        }
        let color = curve.color;
        let anno = ctx
            .draw_series(iter::once(PathElement::new(outline, color.stroke_width(2))))
            .context("Failed to draw radar curve")?;
        if let Some(label) = &curve.label {
            anno.label(label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }
    }

    if chart.legend {
        ctx.configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }
    Ok(())
}

fn draw_radar_area<DB>(
    area: &DrawingArea<DB, Shift>,
    chart: &PreparedChart,
    wedges: &RadarAreaGeometry,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let square = square_area(area);
    let mut ctx = polar_chart(&square, &chart.title)?;

    let max = finite_max(wedges.values.iter().copied());
    let scale = if max > 0.0 { 1.0 / max } else { 1.0 };
    draw_polar_grid(&mut ctx, chart, &wedges.layout.label_angles, max)?;

    let width = wedges.layout.width;
    for ((&start, &value), &color) in wedges
        .layout
        .starts
        .iter()
        .zip(&wedges.values)
        .zip(&wedges.colors)
    {
        if !value.is_finite() || value <= 0.0 {
            continue;
        }
        let points = wedge(start, start + width, value * scale);
        ctx.draw_series(iter::once(Polygon::new(
            points.clone(),
            color.mix(wedges.fill_alpha).filled(),
        )))
        .context("Failed to draw wedge")?;
        let mut outline = points;
        outline.push((0.0, 0.0));
        ctx.draw_series(iter::once(PathElement::new(outline, color.stroke_width(1))))
            .context("Failed to draw wedge")?;
    }

    draw_polar_labels(&mut ctx, &wedges.layout.label_angles, &wedges.labels)
}

fn draw_pie<DB>(area: &DrawingArea<DB, Shift>, chart: &PreparedChart, pie: &PieGeometry) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    let square = square_area(area);
    let mut ctx = polar_chart(&square, &chart.title)?;
    let style = centered_text(13);

    for (slice, &color) in pie.slices.iter().zip(&pie.colors) {
        if slice.fraction <= 0.0 {
            continue;
        }
        ctx.draw_series(iter::once(Polygon::new(
            wedge(slice.start_angle, slice.end_angle, 1.0),
            color.filled(),
        )))
        .context("Failed to draw pie slice")?;

        let middle = (slice.start_angle + slice.end_angle) / 2.0;
        ctx.draw_series([
            Text::new(slice.label.clone(), polar(middle, 1.15), style.clone()),
            Text::new(slice.percent_label.clone(), polar(middle, 0.6), style.clone()),
        ])
        .context("Failed to draw pie labels")?;
    }
    Ok(())
}
