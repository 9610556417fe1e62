//! Format tokens such as `"o-"`, `"r--"` or `"s:"`.
//!
//! A token is any sequence of at most one color letter (`bgrcmykw`), one
//! marker (`o . s ^ v * + x D`) and one line kind (`-`, `--`, `-.`, `:`).
//! Without a marker or a line kind the series is drawn as a solid line.

use crate::error::{PlotError, PlotResult};
use crate::palette::parse_color;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::one_of,
    combinator::{all_consuming, map, value},
    multi::many0,
    IResult,
};
use plotters::style::RGBColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
    Point,
    Square,
    TriangleUp,
    TriangleDown,
    Star,
    Plus,
    Cross,
    Diamond,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
    DashDot,
    Dotted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleToken {
    pub color: Option<RGBColor>,
    pub marker: Option<Marker>,
    pub line: Option<LineKind>,
}

impl Default for StyleToken {
    fn default() -> Self {
        Self {
            color: None,
            marker: Some(Marker::Circle),
            line: Some(LineKind::Solid),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Part {
    Color(char),
    Marker(Marker),
    Line(LineKind),
}

fn line_kind(input: &str) -> IResult<&str, LineKind> {
    alt((
        value(LineKind::Dashed, tag("--")),
        value(LineKind::DashDot, tag("-.")),
        value(LineKind::Solid, tag("-")),
        value(LineKind::Dotted, tag(":")),
    ))(input)
}

fn marker(input: &str) -> IResult<&str, Marker> {
    map(one_of("o.s^v*+xD"), |c| match c {
        'o' => Marker::Circle,
        '.' => Marker::Point,
        's' => Marker::Square,
        '^' => Marker::TriangleUp,
        'v' => Marker::TriangleDown,
        '*' => Marker::Star,
        '+' => Marker::Plus,
        'x' => Marker::Cross,
        _ => Marker::Diamond,
    })(input)
}

fn part(input: &str) -> IResult<&str, Part> {
    // Line kinds first so "-." is not read as "-" followed by a point marker
    alt((
        map(line_kind, Part::Line),
        map(marker, Part::Marker),
        map(one_of("bgrcmykw"), Part::Color),
    ))(input)
}

/// Parse a format token.
pub fn parse_style(input: &str) -> PlotResult<StyleToken> {
    let input = input.trim();
    let (_, parts) = all_consuming(many0(part))(input)
        .map_err(|_| PlotError::config("style", format!("unrecognized format string '{}'", input)))?;

    let duplicate = |what: &str| {
        PlotError::config("style", format!("'{}' sets the {} more than once", input, what))
    };

    let mut token = StyleToken {
        color: None,
        marker: None,
        line: None,
    };
    for part in parts {
        match part {
            Part::Color(c) => {
                if token.color.is_some() {
                    return Err(duplicate("color"));
                }
                token.color = parse_color(&c.to_string());
            }
            Part::Marker(m) => {
                if token.marker.replace(m).is_some() {
                    return Err(duplicate("marker"));
                }
            }
            Part::Line(l) => {
                if token.line.replace(l).is_some() {
                    return Err(duplicate("line style"));
                }
            }
        }
    }

    if token.marker.is_none() && token.line.is_none() {
        token.line = Some(LineKind::Solid);
    }
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_and_line() {
        let token = parse_style("o-").unwrap();
        assert_eq!(token.marker, Some(Marker::Circle));
        assert_eq!(token.line, Some(LineKind::Solid));
        assert_eq!(token.color, None);
        assert_eq!(token, StyleToken::default());
    }

    #[test]
    fn test_color_and_dashed() {
        let token = parse_style("r--").unwrap();
        assert_eq!(token.color, Some(RGBColor(255, 0, 0)));
        assert_eq!(token.line, Some(LineKind::Dashed));
        assert_eq!(token.marker, None);
    }

    #[test]
    fn test_dash_dot_is_not_a_point_marker() {
        let token = parse_style("-.").unwrap();
        assert_eq!(token.line, Some(LineKind::DashDot));
        assert_eq!(token.marker, None);
    }

    #[test]
    fn test_marker_only_has_no_line() {
        let token = parse_style("s").unwrap();
        assert_eq!(token.marker, Some(Marker::Square));
        assert_eq!(token.line, None);
    }

    #[test]
    fn test_color_only_defaults_to_solid_line() {
        let token = parse_style("g").unwrap();
        assert_eq!(token.line, Some(LineKind::Solid));
        assert_eq!(parse_style("").unwrap().line, Some(LineKind::Solid));
    }

    #[test]
    fn test_invalid_tokens() {
        let err = parse_style("q").unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("style"));
        assert!(parse_style("rb").is_err());
        assert!(parse_style("o-s").is_err());
    }
}
