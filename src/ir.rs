use crate::layout::{PieSlice, RadialBarLayout};
use crate::style::{LineKind, Marker};
use plotters::style::RGBColor;

// =============================================================================
// Prepared charts
// =============================================================================

/// Everything a renderer needs to draw one chart slot. Colors, labels and
/// positions are final; renderers do no data lookups.
#[derive(Debug, Clone)]
pub struct PreparedChart {
    pub title: String,
    pub x_grid: bool,
    pub y_grid: bool,
    pub legend: bool,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub geometry: Geometry,
}

#[derive(Debug, Clone, Default)]
pub struct Axis {
    pub description: Option<String>,
    /// Fixed limits; computed from the data when absent.
    pub limits: Option<(f64, f64)>,
    /// Explicit tick positions; the renderer picks its own when empty.
    pub ticks: Vec<f64>,
    pub tick_labels: Vec<String>,
    /// Tick label rotation in degrees.
    pub label_rotation: f64,
}

impl Axis {
    pub fn with_ticks(ticks: Vec<f64>, tick_labels: Vec<String>) -> Self {
        Self {
            ticks,
            tick_labels,
            ..Self::default()
        }
    }

    /// Label of the tick closest to `value`, if one is within half a step.
    pub fn tick_label_at(&self, value: f64) -> Option<&str> {
        let tolerance = match self.ticks.as_slice() {
            [a, b, ..] => (b - a).abs() / 2.0,
            _ => 0.5,
        };
        self.ticks
            .iter()
            .zip(&self.tick_labels)
            .filter(|(t, _)| (*t - value).abs() < tolerance)
            .min_by(|(a, _), (b, _)| (*a - value).abs().total_cmp(&(*b - value).abs()))
            .map(|(_, label)| label.as_str())
    }
}

#[derive(Debug, Clone)]
pub enum Geometry {
    Lines(Vec<LineGeometry>),
    Bars(Vec<BarGeometry>),
    Radar(RadarGeometry),
    RadarArea(RadarAreaGeometry),
    Pie(PieGeometry),
}

impl Geometry {
    pub fn name(&self) -> &'static str {
        match self {
            Geometry::Lines(_) => "lines",
            Geometry::Bars(_) => "bars",
            Geometry::Radar(_) => "radar",
            Geometry::RadarArea(_) => "radar_area",
            Geometry::Pie(_) => "pie",
        }
    }

    pub fn is_polar(&self) -> bool {
        matches!(self, Geometry::Radar(_) | Geometry::RadarArea(_) | Geometry::Pie(_))
    }
}

// =============================================================================
// Cartesian geometry
// =============================================================================

/// One plotted column. `NaN` y values are gaps.
#[derive(Debug, Clone)]
pub struct LineGeometry {
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub color: RGBColor,
    pub marker: Option<Marker>,
    pub line: Option<LineKind>,
}

/// One bar series: bars span `[left, left + width]` and `[bottom, bottom + height]`.
#[derive(Debug, Clone)]
pub struct BarGeometry {
    pub label: Option<String>,
    pub lefts: Vec<f64>,
    pub width: f64,
    pub heights: Vec<f64>,
    pub bottoms: Vec<f64>,
    pub color: RGBColor,
}

impl BarGeometry {
    /// `(x0, y0, x1, y1)` per bar, skipping non-finite heights.
    pub fn rects(&self) -> impl Iterator<Item = (f64, f64, f64, f64)> + '_ {
        self.lefts
            .iter()
            .zip(&self.heights)
            .zip(&self.bottoms)
            .filter(|((_, h), _)| h.is_finite())
            .map(move |((&l, &h), &b)| (l, b, l + self.width, b + h))
    }
}

// =============================================================================
// Polar geometry
// =============================================================================

#[derive(Debug, Clone)]
pub struct RadarCurve {
    pub label: Option<String>,
    /// One value per axis, in axis order.
    pub values: Vec<f64>,
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub struct RadarGeometry {
    pub angles: Vec<f64>,
    pub axis_labels: Vec<String>,
    pub curves: Vec<RadarCurve>,
    pub fill_alpha: f64,
}

#[derive(Debug, Clone)]
pub struct RadarAreaGeometry {
    pub layout: RadialBarLayout,
    pub values: Vec<f64>,
    pub labels: Vec<String>,
    pub colors: Vec<RGBColor>,
    pub fill_alpha: f64,
}

#[derive(Debug, Clone)]
pub struct PieGeometry {
    pub slices: Vec<PieSlice>,
    pub colors: Vec<RGBColor>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_label_lookup() {
        let axis = Axis::with_ticks(
            vec![1.0, 2.0, 3.0],
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );
        assert_eq!(axis.tick_label_at(2.0), Some("b"));
        assert_eq!(axis.tick_label_at(2.2), Some("b"));
        assert_eq!(axis.tick_label_at(0.0), None);
        assert_eq!(axis.tick_label_at(5.0), None);
    }

    #[test]
    fn test_bar_rects_skip_gaps() {
        let bars = BarGeometry {
            label: None,
            lefts: vec![0.0, 1.0, 2.0],
            width: 0.5,
            heights: vec![1.0, f64::NAN, 3.0],
            bottoms: vec![0.0, 0.0, 1.0],
            color: RGBColor(0, 0, 0),
        };
        let rects: Vec<_> = bars.rects().collect();
        assert_eq!(rects, vec![(0.0, 0.0, 0.5, 1.0), (2.0, 1.0, 2.5, 4.0)]);
    }
}
