//! Colors: named/hex parsing, colormaps and index-based palettes.

use crate::error::{PlotError, PlotResult};
use crate::layout::linspace;
use plotters::style::RGBColor;
use serde::Deserialize;

const PRGN: [(u8, u8, u8); 11] = [
    (64, 0, 75),
    (118, 42, 131),
    (153, 112, 171),
    (194, 165, 207),
    (231, 212, 232),
    (247, 247, 247),
    (217, 240, 211),
    (166, 219, 160),
    (90, 174, 97),
    (27, 120, 55),
    (0, 68, 27),
];

const VIRIDIS: [(u8, u8, u8); 5] = [
    (68, 1, 84),
    (59, 82, 139),
    (33, 145, 140),
    (94, 201, 98),
    (253, 231, 37),
];

const CATEGORY10: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

/// A function from `[0, 1]` to a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Colormap {
    #[serde(rename = "PRGn", alias = "prgn")]
    Prgn,
    #[serde(rename = "gist_heat")]
    GistHeat,
    #[serde(rename = "viridis")]
    Viridis,
    #[serde(rename = "category10", alias = "tab10")]
    Category10,
}

impl Colormap {
    pub fn sample(self, t: f64) -> RGBColor {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Colormap::Prgn => interpolate(&PRGN, t),
            Colormap::Viridis => interpolate(&VIRIDIS, t),
            Colormap::GistHeat => {
                let channel = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
                RGBColor(channel(1.5 * t), channel(2.0 * t - 1.0), channel(4.0 * t - 3.0))
            }
            Colormap::Category10 => {
                let idx = ((t * CATEGORY10.len() as f64) as usize).min(CATEGORY10.len() - 1);
                let (r, g, b) = CATEGORY10[idx];
                RGBColor(r, g, b)
            }
        }
    }
}

fn interpolate(anchors: &[(u8, u8, u8)], t: f64) -> RGBColor {
    let scaled = t * (anchors.len() - 1) as f64;
    let lo = (scaled.floor() as usize).min(anchors.len() - 1);
    let hi = (lo + 1).min(anchors.len() - 1);
    let frac = scaled - lo as f64;
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * frac).round() as u8;
    let (a, b) = (anchors[lo], anchors[hi]);
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Ordered colors, accessed by index modulo length.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    colors: Vec<RGBColor>,
}

impl Palette {
    /// Palette from user-given color names; order is kept.
    pub fn explicit<S: AsRef<str>>(names: &[S]) -> PlotResult<Self> {
        if names.is_empty() {
            return Err(PlotError::config("colors", "color list is empty"));
        }
        let colors = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                parse_color(n).ok_or_else(|| PlotError::config("colors", format!("unknown color '{}'", n)))
            })
            .collect::<PlotResult<Vec<_>>>()?;
        Ok(Self { colors })
    }

    /// `count` samples of `colormap` at `linspace(0, upper, count)`.
    pub fn from_colormap(colormap: Colormap, count: usize, upper: f64) -> Self {
        let colors = linspace(0.0, upper, count.max(1))
            .into_iter()
            .map(|t| colormap.sample(t))
            .collect();
        Self { colors }
    }

    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Explicit colors win over the colormap.
pub fn resolve_palette(
    colors: Option<&[String]>,
    colormap: Colormap,
    count: usize,
    upper: f64,
) -> PlotResult<Palette> {
    match colors {
        Some(names) => Palette::explicit(names),
        None => Ok(Palette::from_colormap(colormap, count, upper)),
    }
}

/// Parse a color name, a single-letter code (`bgrcmykw`) or `#rrggbb` / `#rgb`.
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }
    let rgb = match color {
        "b" => RGBColor(0, 0, 255),
        "g" => RGBColor(0, 128, 0),
        "r" => RGBColor(255, 0, 0),
        "c" => RGBColor(0, 191, 191),
        "m" => RGBColor(191, 0, 191),
        "y" => RGBColor(191, 191, 0),
        "k" => RGBColor(0, 0, 0),
        "w" => RGBColor(255, 255, 255),
        _ => match color.to_ascii_lowercase().as_str() {
            "red" => RGBColor(255, 0, 0),
            "green" => RGBColor(0, 128, 0),
            "blue" => RGBColor(0, 0, 255),
            "black" => RGBColor(0, 0, 0),
            "white" => RGBColor(255, 255, 255),
            "yellow" => RGBColor(255, 255, 0),
            "cyan" => RGBColor(0, 255, 255),
            "magenta" => RGBColor(255, 0, 255),
            "gray" | "grey" => RGBColor(128, 128, 128),
            "orange" => RGBColor(255, 165, 0),
            "purple" => RGBColor(128, 0, 128),
            "brown" => RGBColor(165, 42, 42),
            "pink" => RGBColor(255, 192, 203),
            _ => return None,
        },
    };
    Some(rgb)
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|d| d * 17);
            Some(RGBColor(digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}
