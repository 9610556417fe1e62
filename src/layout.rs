//! Layout arithmetic for bar-family and radial charts.
//!
//! Everything here is a pure function of its arguments: positions, ticks and
//! axis extents are recomputed on every call and nothing is cached.

use crate::error::{PlotError, PlotResult};
use std::f64::consts::PI;

/// Bar positions, tick positions and axis extent for a category axis.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutPlan {
    /// Left edges, series-major: `positions[s * category_count + c]`.
    pub positions: Vec<f64>,
    /// Category centers.
    pub ticks: Vec<f64>,
    pub tick_labels: Vec<String>,
    /// Width of a single bar (the group width split across series).
    pub bar_width: f64,
    pub series_count: usize,
    pub category_count: usize,
    pub x_extent: (f64, f64),
}

impl LayoutPlan {
    pub fn left_edge(&self, series: usize, category: usize) -> f64 {
        self.positions[series * self.category_count + category]
    }

    pub fn series_positions(&self, series: usize) -> &[f64] {
        let start = series * self.category_count;
        &self.positions[start..start + self.category_count]
    }

    pub fn with_tick_labels(mut self, labels: Vec<String>) -> Self {
        self.tick_labels = labels;
        self
    }
}

/// Place `series_count` bars side by side in each of `category_count` slots.
///
/// Slot `c` spans `[start + c*increment, start + (c+1)*increment)`; the bar
/// group is `bar_width` wide and centered in the slot.
pub fn compute_bar_layout(
    series_count: usize,
    category_count: usize,
    bar_width: f64,
    start_offset: f64,
    increment: f64,
) -> PlotResult<LayoutPlan> {
    if series_count == 0 {
        return Err(PlotError::config("series_count", "at least one series is required"));
    }
    if category_count == 0 {
        return Err(PlotError::config("category_count", "at least one category is required"));
    }
    if !(bar_width > 0.0 && bar_width <= increment) {
        return Err(PlotError::config(
            "bar_width",
            format!("must satisfy 0 < bar_width <= increment ({} given, increment {})", bar_width, increment),
        ));
    }

    let effective_width = bar_width / series_count as f64;
    let offset = (increment - bar_width) / 2.0;

    let mut positions = Vec::with_capacity(series_count * category_count);
    for s in 0..series_count {
        let left = start_offset + s as f64 * effective_width;
        for c in 0..category_count {
            positions.push(left + c as f64 * increment + offset);
        }
    }

    let ticks: Vec<f64> = (0..category_count)
        .map(|c| start_offset + increment * (c as f64 + 0.5))
        .collect();

    let margin = start_offset.max(increment / 2.0);
    let x_extent = (
        start_offset - margin,
        start_offset + increment * category_count as f64 + margin,
    );

    Ok(LayoutPlan {
        positions,
        ticks,
        tick_labels: Vec::new(),
        bar_width: effective_width,
        series_count,
        category_count,
        x_extent,
    })
}

/// Evenly spaced axis angles in `[0, 2π)`, starting at 0.
pub fn compute_radial_layout(axis_count: usize) -> PlotResult<Vec<f64>> {
    if axis_count == 0 {
        return Err(PlotError::config("axis_count", "a radial layout needs at least one axis"));
    }
    let step = 2.0 * PI / axis_count as f64;
    Ok((0..axis_count).map(|i| i as f64 * step).collect())
}

/// Wedges of a radial bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialBarLayout {
    pub starts: Vec<f64>,
    pub width: f64,
    pub label_angles: Vec<f64>,
}

/// One wedge per value, separated by `spacing` radians.
pub fn compute_radial_bar_layout(count: usize, spacing: f64) -> PlotResult<RadialBarLayout> {
    let base = compute_radial_layout(count)?;
    let width = 2.0 * PI / count as f64 - spacing;
    if spacing < 0.0 || width <= 0.0 {
        return Err(PlotError::config(
            "spacing",
            format!("spacing {} leaves no room for {} wedges", spacing, count),
        ));
    }
    let starts: Vec<f64> = base.iter().map(|a| a + spacing / 2.0).collect();
    let label_angles = starts.iter().map(|a| a + width / 2.0).collect();
    Ok(RadialBarLayout {
        starts,
        width,
        label_angles,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub fraction: f64,
    pub start_angle: f64,
    pub end_angle: f64,
    pub percent_label: String,
}

/// Slices laid out counter-clockwise from angle 0.
pub fn compute_pie_layout(values: &[f64], labels: &[String]) -> PlotResult<Vec<PieSlice>> {
    if values.is_empty() {
        return Err(PlotError::config("values_column", "a pie chart needs at least one value"));
    }
    if values.len() != labels.len() {
        return Err(PlotError::config(
            "labels_column",
            format!("{} labels for {} values", labels.len(), values.len()),
        ));
    }
    if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(PlotError::config(
            "values_column",
            format!("pie values must be finite and non-negative, got {}", bad),
        ));
    }
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        return Err(PlotError::config("values_column", "pie values sum to zero"));
    }

    let mut angle = 0.0;
    let slices = values
        .iter()
        .zip(labels)
        .map(|(&value, label)| {
            let fraction = value / total;
            let start_angle = angle;
            angle += fraction * 2.0 * PI;
            PieSlice {
                label: label.clone(),
                fraction,
                start_angle,
                end_angle: angle,
                percent_label: format!("{:.2}%", fraction * 100.0),
            }
        })
        .collect();
    Ok(slices)
}

/// Running bottoms for stacked bars: series `i` starts where series `i-1` ended.
/// `NaN` heights stack as 0.
pub fn stack_offsets(series: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = series.first().map(Vec::len).unwrap_or(0);
    let mut bottom = vec![0.0; width];
    let mut offsets = Vec::with_capacity(series.len());
    for values in series {
        offsets.push(bottom.clone());
        for (b, v) in bottom.iter_mut().zip(values) {
            if v.is_finite() {
                *b += v;
            }
        }
    }
    offsets
}

/// `n` evenly spaced samples from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}
