//! Colors of the canonical model and the color management seam.
//!
//! Components are floats in `[0, 1]`. Lab is stored normalized:
//! `L = L*/100`, `a = (a* + 128)/255`, `b = (b* + 128)/255`.
//! Device color management (ICC transforms) lives outside this crate, it is
//! reached through the [`ColorManager`] trait. [`SimpleColorManager`] covers
//! the formula based conversions.

use ahash::{HashMap, HashMapExt};
use std::{cell::RefCell, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ColorSpace {
    Rgb,
    Cmyk,
    Lab,
    Gray,
    Spot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorValue {
    Rgb([f64; 3]),
    Cmyk([f64; 4]),
    Lab([f64; 3]),
    Gray(f64),
    /// Named ink, with fallback values for process output.
    Spot { rgb: [f64; 3], cmyk: [f64; 4] },
}

impl ColorValue {
    pub fn space(&self) -> ColorSpace {
        match self {
            Self::Rgb(_) => ColorSpace::Rgb,
            Self::Cmyk(_) => ColorSpace::Cmyk,
            Self::Lab(_) => ColorSpace::Lab,
            Self::Gray(_) => ColorSpace::Gray,
            Self::Spot { .. } => ColorSpace::Spot,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Color {
    pub value: ColorValue,
    pub alpha: f64,
    pub name: Option<String>,
}

fn clamp_all<const N: usize>(v: [f64; N]) -> [f64; N] {
    v.map(|c| c.clamp(0.0, 1.0))
}

impl Color {
    pub fn new(value: ColorValue) -> Self {
        Self {
            value,
            alpha: 1.0,
            name: None,
        }
    }

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self::new(ColorValue::Rgb(clamp_all([r, g, b])))
    }

    pub fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self::new(ColorValue::Cmyk(clamp_all([c, m, y, k])))
    }

    /// Lab color from normalized components.
    pub fn lab(l: f64, a: f64, b: f64) -> Self {
        Self::new(ColorValue::Lab(clamp_all([l, a, b])))
    }

    /// Lab color from `L*` in `0..100` and `a*`/`b*` in `-128..127`.
    pub fn lab_from_cie(l: f64, a: f64, b: f64) -> Self {
        Self::lab(l / 100.0, (a + 128.0) / 255.0, (b + 128.0) / 255.0)
    }

    pub fn gray(g: f64) -> Self {
        Self::new(ColorValue::Gray(g.clamp(0.0, 1.0)))
    }

    pub fn spot(name: impl Into<String>, rgb: [f64; 3], cmyk: [f64; 4]) -> Self {
        Self {
            value: ColorValue::Spot {
                rgb: clamp_all(rgb),
                cmyk: clamp_all(cmyk),
            },
            alpha: 1.0,
            name: Some(name.into()),
        }
    }

    pub fn black() -> Self {
        Self::cmyk(0.0, 0.0, 0.0, 1.0).with_name("Black")
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0).with_name("White")
    }

    /// 8 bit per channel RGB.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
        )
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn space(&self) -> ColorSpace {
        self.value.space()
    }

    /// `#rrggbb` of the display approximation.
    pub fn to_hex(&self, cms: &dyn ColorManager) -> String {
        let [r, g, b] = cms.to_display_rgb(self);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let c = |v: f64| (v * 255.0).round().clamp(0.0, 255.0) as u8;
        format!("#{:02x}{:02x}{:02x}", c(r), c(g), c(b))
    }
}

/// Parse `#rgb` or `#rrggbb`, the leading `#` is optional.
pub fn parse_hex(s: &str) -> Option<Color> {
    let s = s.trim();
    let s = s.strip_prefix('#').unwrap_or(s);
    if !s.is_ascii() {
        return None;
    }
    let digit = |i: usize, n: usize| u8::from_str_radix(&s[i..i + n], 16).ok();
    match s.len() {
        3 => {
            let (r, g, b) = (digit(0, 1)?, digit(1, 1)?, digit(2, 1)?);
            Some(Color::rgb8(r * 17, g * 17, b * 17))
        }
        6 => Some(Color::rgb8(digit(0, 2)?, digit(2, 2)?, digit(4, 2)?)),
        _ => None,
    }
}

/// Colorspace conversion capability, provided by the hosting application.
pub trait ColorManager {
    /// Convert `color` into `space`. Alpha and name are kept.
    fn convert(&self, color: &Color, space: ColorSpace) -> Color;

    /// RGB approximation used for display and for RGB-only output formats.
    fn to_display_rgb(&self, color: &Color) -> [f64; 3] {
        match self.convert(color, ColorSpace::Rgb).value {
            ColorValue::Rgb(rgb) => rgb,
            _ => [0.0, 0.0, 0.0],
        }
    }
}

/// Conversion between two color spaces, built once and shared.
#[derive(Debug)]
pub struct ColorTransform {
    pub from: ColorSpace,
    pub to: ColorSpace,
    f: fn(&ColorValue) -> ColorValue,
}

impl ColorTransform {
    pub fn apply(&self, v: &ColorValue) -> ColorValue {
        (self.f)(v)
    }
}

/// Formula based color manager, caches one transform per space pair.
#[derive(Debug, Default)]
pub struct SimpleColorManager {
    transforms: RefCell<HashMap<(ColorSpace, ColorSpace), Rc<ColorTransform>>>,
}

impl SimpleColorManager {
    pub fn new() -> Self {
        Self {
            transforms: RefCell::new(HashMap::new()),
        }
    }

    pub fn transform(&self, from: ColorSpace, to: ColorSpace) -> Rc<ColorTransform> {
        self.transforms
            .borrow_mut()
            .entry((from, to))
            .or_insert_with(|| {
                let f: fn(&ColorValue) -> ColorValue = match to {
                    ColorSpace::Rgb => |v| ColorValue::Rgb(to_rgb(v)),
                    ColorSpace::Cmyk => |v| ColorValue::Cmyk(to_cmyk(v)),
                    ColorSpace::Gray => |v| ColorValue::Gray(rgb_to_gray(to_rgb(v))),
                    ColorSpace::Lab => |v| match v {
                        ColorValue::Lab(lab) => ColorValue::Lab(*lab),
                        _ => ColorValue::Lab(rgb_to_lab(to_rgb(v))),
                    },
                    ColorSpace::Spot => |v| match v {
                        ColorValue::Spot { .. } => v.clone(),
                        _ => ColorValue::Spot {
                            rgb: to_rgb(v),
                            cmyk: to_cmyk(v),
                        },
                    },
                };
                Rc::new(ColorTransform { from, to, f })
            })
            .clone()
    }
}

impl ColorManager for SimpleColorManager {
    fn convert(&self, color: &Color, space: ColorSpace) -> Color {
        if color.space() == space {
            return color.clone();
        }
        let t = self.transform(color.space(), space);
        Color {
            value: t.apply(&color.value),
            alpha: color.alpha,
            name: color.name.clone(),
        }
    }
}

fn to_rgb(v: &ColorValue) -> [f64; 3] {
    match v {
        ColorValue::Rgb(rgb) | ColorValue::Spot { rgb, .. } => *rgb,
        ColorValue::Cmyk(cmyk) => cmyk_to_rgb(*cmyk),
        ColorValue::Lab(lab) => lab_to_rgb(*lab),
        ColorValue::Gray(g) => [*g, *g, *g],
    }
}

fn to_cmyk(v: &ColorValue) -> [f64; 4] {
    match v {
        ColorValue::Cmyk(cmyk) | ColorValue::Spot { cmyk, .. } => *cmyk,
        ColorValue::Gray(g) => [0.0, 0.0, 0.0, 1.0 - g],
        ColorValue::Rgb(rgb) => rgb_to_cmyk(*rgb),
        ColorValue::Lab(lab) => rgb_to_cmyk(lab_to_rgb(*lab)),
    }
}

pub fn cmyk_to_rgb([c, m, y, k]: [f64; 4]) -> [f64; 3] {
    [
        1.0 - (c + k).min(1.0),
        1.0 - (m + k).min(1.0),
        1.0 - (y + k).min(1.0),
    ]
}

pub fn rgb_to_cmyk([r, g, b]: [f64; 3]) -> [f64; 4] {
    let (c, m, y) = (1.0 - r, 1.0 - g, 1.0 - b);
    let k = c.min(m).min(y);
    [c - k, m - k, y - k, k]
}

pub fn rgb_to_gray([r, g, b]: [f64; 3]) -> f64 {
    (r + g + b) / 3.0
}

fn linear_to_srgb(c: f64) -> f64 {
    if c > 0.003_130_8 {
        c.powf(1.0 / 2.4) * 1.055 - 0.055
    } else {
        c * 12.92
    }
}

fn srgb_to_linear(c: f64) -> f64 {
    if c > 0.003_130_8 * 12.92 {
        (c / 1.055 + 0.055 / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn lab_f(c: f64) -> f64 {
    if c > 216.0 / 24389.0 {
        c.cbrt()
    } else {
        c * (841.0 / 108.0) + 4.0 / 29.0
    }
}

fn lab_f_inv(c: f64) -> f64 {
    if c > 6.0 / 29.0 {
        c * c * c
    } else {
        c * (108.0 / 841.0) - 432.0 / 24389.0
    }
}

/// Normalized Lab to sRGB, D65.
pub fn lab_to_rgb([l, a, b]: [f64; 3]) -> [f64; 3] {
    let l = l * 100.0;
    let a = a * 255.0 - 128.0;
    let b = b * 255.0 - 128.0;

    let fy = l / 116.0 + 16.0 / 116.0;
    let x = lab_f_inv(a / 500.0 + fy);
    let y = if l > 8.0 { fy * fy * fy } else { l * (27.0 / 24389.0) };
    let z = lab_f_inv(fy - b / 200.0);

    let r = x * (1_219_569.0 / 395_920.0) + y * (-608_687.0 / 395_920.0) + z * (-107_481.0 / 197_960.0);
    let g = x * (-80_960_619.0 / 87_888_100.0)
        + y * (82_435_961.0 / 43_944_050.0)
        + z * (3_976_797.0 / 87_888_100.0);
    let bl = x * (93_813.0 / 1_774_030.0) + y * (-180_961.0 / 887_015.0) + z * (107_481.0 / 93_370.0);
    clamp_all([linear_to_srgb(r), linear_to_srgb(g), linear_to_srgb(bl)])
}

/// sRGB to normalized Lab, D65.
pub fn rgb_to_lab([r, g, b]: [f64; 3]) -> [f64; 3] {
    let (r, g, b) = (srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b));
    let x = lab_f(
        r * (10_135_552.0 / 23_359_437.0) + g * (8_788_810.0 / 23_359_437.0) + b * (4_435_075.0 / 23_359_437.0),
    );
    let y = lab_f(
        r * (871_024.0 / 4_096_299.0) + g * (8_788_810.0 / 12_288_897.0) + b * (887_015.0 / 12_288_897.0),
    );
    let z = lab_f(
        r * (158_368.0 / 8_920_923.0) + g * (8_788_810.0 / 80_288_307.0) + b * (70_074_185.0 / 80_288_307.0),
    );
    clamp_all([
        (y * 116.0 - 16.0) / 100.0,
        ((x - y) * 500.0 + 128.0) / 255.0,
        ((y - z) * 200.0 + 128.0) / 255.0,
    ])
}

/// Hue, saturation, value (all `0..1`) to RGB.
pub fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    if s == 0.0 {
        return [v, v, v];
    }
    let h = h.rem_euclid(1.0) * 6.0;
    let i = h.floor();
    let f = h - i;
    let (p, q, t) = (v * (1.0 - s), v * (1.0 - s * f), v * (1.0 - s * (1.0 - f)));
    #[allow(clippy::cast_possible_truncation)]
    match i as i32 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// Hue, lightness, saturation (all `0..1`) to RGB.
pub fn hls_to_rgb(h: f64, l: f64, s: f64) -> [f64; 3] {
    if s == 0.0 {
        return [l, l, l];
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    let channel = |hue: f64| {
        let hue = hue.rem_euclid(1.0);
        if hue < 1.0 / 6.0 {
            m1 + (m2 - m1) * hue * 6.0
        } else if hue < 0.5 {
            m2
        } else if hue < 2.0 / 3.0 {
            m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
        } else {
            m1
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0)]
}

/// YIQ to RGB, result clamped into `0..1`.
pub fn yiq_to_rgb(y: f64, i: f64, q: f64) -> [f64; 3] {
    clamp_all([
        y + 0.946_882 * i + 0.623_557 * q,
        y - 0.274_788 * i - 0.635_691 * q,
        y - 1.108_545 * i + 1.709_007 * q,
    ])
}
