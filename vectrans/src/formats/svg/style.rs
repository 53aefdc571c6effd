//! Presentation properties and their inheritance.

use super::{colors::parse_color, path_data::number_list, xml::Element};
use crate::{
    color::Color,
    model::style::{Cap, FillRule, Join, TextAlign},
};
use log::debug;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl From<LineCap> for Cap {
    fn from(v: LineCap) -> Self {
        match v {
            LineCap::Butt => Cap::Butt,
            LineCap::Round => Cap::Round,
            LineCap::Square => Cap::Square,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum LineJoin {
    Miter,
    MiterClip,
    Round,
    Bevel,
    Arcs,
}

impl From<LineJoin> for Join {
    fn from(v: LineJoin) -> Self {
        match v {
            LineJoin::Miter | LineJoin::MiterClip | LineJoin::Arcs => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SvgFillRule {
    NonZero,
    EvenOdd,
}

impl From<SvgFillRule> for FillRule {
    fn from(v: SvgFillRule) -> Self {
        match v {
            SvgFillRule::NonZero => FillRule::NonZero,
            SvgFillRule::EvenOdd => FillRule::EvenOdd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::EnumIter, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

impl From<TextAnchor> for TextAlign {
    fn from(v: TextAnchor) -> Self {
        match v {
            TextAnchor::Start => TextAlign::Left,
            TextAnchor::Middle => TextAlign::Center,
            TextAnchor::End => TextAlign::Right,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    None,
    Color(Color),
    CurrentColor,
    /// Reference to a paint server with the color used when it does not resolve.
    Url(String, Option<Color>),
}

fn parse_paint(s: &str) -> Option<Paint> {
    let s = s.trim();
    if s == "none" {
        return Some(Paint::None);
    }
    if s == "currentColor" {
        return Some(Paint::CurrentColor);
    }
    if let Some(rest) = s.strip_prefix("url(") {
        let (id, fallback) = rest.split_once(')')?;
        let id = id.trim().trim_matches(|c| c == '\'' || c == '"');
        let id = id.trim_start_matches('#').to_owned();
        let fallback = parse_paint(fallback).and_then(|p| match p {
            Paint::Color(c) => Some(c),
            _ => None,
        });
        return Some(Paint::Url(id, fallback));
    }
    parse_color(s).map(Paint::Color)
}

/// Pixels per point, SVG user units are CSS pixels.
pub const PT_PER_PX: f64 = 0.75;

/// Parse a length into user units (px). Percentages are relative to `base`.
pub fn parse_length(s: &str, base: f64) -> Option<f64> {
    let s = s.trim();
    let split = s
        .find(|c: char| c.is_ascii_alphabetic() || c == '%')
        .unwrap_or(s.len());
    let (num, unit) = s.split_at(split);
    let v: f64 = num.trim().parse().ok()?;
    let px = match unit {
        "" | "px" => v,
        "pt" => v / PT_PER_PX,
        "pc" => v * 12.0 / PT_PER_PX,
        "mm" => v * 72.0 / 25.4 / PT_PER_PX,
        "cm" => v * 720.0 / 25.4 / PT_PER_PX,
        "in" => v * 72.0 / PT_PER_PX,
        "em" => v * 16.0,
        "ex" => v * 8.0,
        "%" => v * base / 100.0,
        _ => return None,
    };
    Some(px)
}

/// Inherited style state of one element.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgStyle {
    pub fill: Paint,
    pub fill_rule: SvgFillRule,
    pub fill_opacity: f64,
    pub stroke: Paint,
    pub stroke_width: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    pub miter_limit: f64,
    pub dash: Vec<f64>,
    pub stroke_opacity: f64,
    /// Product of the `opacity` of the element and its ancestors.
    pub opacity: f64,
    pub color: Color,
    pub font_family: String,
    pub font_size: f64,
    pub text_anchor: TextAnchor,
}

impl Default for SvgStyle {
    fn default() -> Self {
        Self {
            fill: Paint::Color(Color::rgb(0.0, 0.0, 0.0)),
            fill_rule: SvgFillRule::NonZero,
            fill_opacity: 1.0,
            stroke: Paint::None,
            stroke_width: 1.0,
            line_cap: LineCap::Butt,
            line_join: LineJoin::Miter,
            miter_limit: 4.0,
            dash: vec![],
            stroke_opacity: 1.0,
            opacity: 1.0,
            color: Color::rgb(0.0, 0.0, 0.0),
            font_family: "sans-serif".to_owned(),
            font_size: 16.0,
            text_anchor: TextAnchor::Start,
        }
    }
}

fn keyword<T: FromStr>(name: &str, value: &str) -> Option<T> {
    let r = T::from_str(value.trim()).ok();
    if r.is_none() {
        debug!("ignore {name}: {value}");
    }
    r
}

fn opacity(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().map(|v| v.clamp(0.0, 1.0))
}

impl SvgStyle {
    /// Style of a child: inherited values overridden by the element's
    /// presentation attributes, then by its `style` declarations.
    pub fn derive(&self, el: &Element) -> Self {
        let mut r = self.clone();
        // opacity is not inherited, it multiplies down the tree
        let mut own_opacity = 1.0;
        let declarations = el
            .attr("style")
            .into_iter()
            .flat_map(|s| s.split(';'))
            .filter_map(|d| d.split_once(':'))
            .map(|(k, v)| (k.trim(), v.trim()));
        let attrs = el.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()));
        for (name, value) in attrs.chain(declarations) {
            if value == "inherit" {
                continue;
            }
            match name {
                "fill" => r.fill = parse_paint(value).unwrap_or(r.fill),
                "fill-rule" => r.fill_rule = keyword(name, value).unwrap_or(r.fill_rule),
                "fill-opacity" => r.fill_opacity = opacity(value).unwrap_or(r.fill_opacity),
                "stroke" => r.stroke = parse_paint(value).unwrap_or(r.stroke),
                "stroke-width" => {
                    r.stroke_width = parse_length(value, 0.0).unwrap_or(r.stroke_width)
                }
                "stroke-linecap" => r.line_cap = keyword(name, value).unwrap_or(r.line_cap),
                "stroke-linejoin" => r.line_join = keyword(name, value).unwrap_or(r.line_join),
                "stroke-miterlimit" => {
                    r.miter_limit = value.parse().unwrap_or(r.miter_limit);
                }
                "stroke-dasharray" => {
                    r.dash = if value == "none" {
                        vec![]
                    } else {
                        number_list(value)
                    };
                }
                "stroke-opacity" => r.stroke_opacity = opacity(value).unwrap_or(r.stroke_opacity),
                "opacity" => own_opacity = opacity(value).unwrap_or(own_opacity),
                "color" => r.color = parse_color(value).unwrap_or(r.color),
                "font-family" => r.font_family = value.trim_matches(|c| c == '\'' || c == '"').to_owned(),
                "font-size" => r.font_size = parse_length(value, self.font_size).unwrap_or(r.font_size),
                "text-anchor" => r.text_anchor = keyword(name, value).unwrap_or(r.text_anchor),
                _ => {}
            }
        }
        r.opacity = self.opacity * own_opacity;
        r
    }
}
