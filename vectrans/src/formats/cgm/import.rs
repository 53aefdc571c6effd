use super::{
    id,
    parser::{parse, read_elements, Element},
    state::{
        precision_bytes, ColourMode, DecodeState, InteriorStyle, RealPrecision, ScalingMode,
        VdcType, WidthMode,
    },
};
use crate::{
    color::Color,
    diag::Session,
    error::{ConvertError, Result},
    formats::{ImportDefaults, Importer},
    formats::reader::RecordReader,
    geom::{
        arc_by_3points, invert_trafo, multiply_trafo, point_angle, ArcType, Path, Point, Trafo,
        Vector,
    },
    model::{
        ellipse_trafo,
        style::{Fill, FillPaint, Pattern, Stroke, Style, TextAlign, TextStyle},
        Circle, Document, NodeId, PageFormat, Primitive, Rectangle, Shape, Text,
    },
};
use log::{debug, info};

/// Abstract scaling maps the larger VDC extent side to this many points.
const ABSTRACT_PAGE_SIZE: f64 = 841.0;

pub struct CgmImporter {
    defaults: ImportDefaults,
}

impl CgmImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

impl Importer for CgmImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let root = parse(data)?;
        let mut t = Translator {
            defaults: &self.defaults,
            doc: Document::new(),
            session,
            state: DecodeState::default(),
            metafile: None,
            fonts: vec![],
            picture: None,
        };
        let title = t.state.string(&mut root.reader());
        if let Some(title) = t.session.absorb(title)? {
            if !title.trim().is_empty() {
                t.doc.meta.add_note(&title);
            }
        }

        let total = root.children.len();
        for (i, el) in root.children.iter().enumerate() {
            t.element(el)?;
            t.session.progress.report(i + 1, total);
        }
        if t.doc.pages().is_empty() {
            let page = t.doc.add_page(None);
            t.doc.add_layer(page, "Layer 1")?;
        }
        Ok(t.doc)
    }
}

/// Page being filled.
struct Picture {
    page: NodeId,
    layer: NodeId,
    /// VDC to page points.
    trafo: Trafo,
    /// Points per VDC unit.
    scale: f64,
}

struct Translator<'d, 's, 'b> {
    defaults: &'d ImportDefaults,
    doc: Document,
    session: &'s mut Session<'b>,
    state: DecodeState,
    /// State at the first BEGIN PICTURE, restored by every later one.
    metafile: Option<DecodeState>,
    fonts: Vec<String>,
    picture: Option<Picture>,
}

/// How a closed arc is closed: 0 pie, 1 chord.
fn close_type(v: i16) -> ArcType {
    match v {
        0 => ArcType::PieSlice,
        _ => ArcType::Chord,
    }
}

/// Dash lengths, in line widths, of the standard line types.
fn dash_pattern(kind: i64) -> Vec<f64> {
    match kind {
        2 => vec![4.0, 2.0],
        3 => vec![1.0, 2.0],
        4 => vec![4.0, 2.0, 1.0, 2.0],
        5 => vec![4.0, 2.0, 1.0, 2.0, 1.0, 2.0],
        1 => vec![],
        other => {
            debug!("cgm line type {other} drawn solid");
            vec![]
        }
    }
}

/// Descriptor and control elements that change how later parameters decode.
fn changes_encoding(el: u16) -> bool {
    matches!(
        el,
        id::VDC_TYPE
            | id::INTEGER_PRECISION
            | id::REAL_PRECISION
            | id::INDEX_PRECISION
            | id::COLOUR_PRECISION
            | id::COLOUR_INDEX_PRECISION
            | id::COLOUR_SELECTION_MODE
            | id::VDC_INTEGER_PRECISION
            | id::VDC_REAL_PRECISION
    )
}

/// Unit-box circle onto the ellipse with the given conjugate diameter
/// end points.
fn conjugate_trafo(center: Point, cdp1: Point, cdp2: Point) -> Trafo {
    let u = cdp1 - center;
    let v = cdp2 - center;
    Trafo::new(
        2.0 * u.x,
        2.0 * u.y,
        2.0 * v.x,
        2.0 * v.y,
        center.x - u.x - v.x,
        center.y - u.y - v.y,
    )
}

impl<'d, 's, 'b> Translator<'d, 's, 'b> {
    fn element(&mut self, el: &Element) -> Result<()> {
        match el.id {
            id::BEGIN_PICTURE => self.picture(el),
            id::BEGIN_PICTURE_BODY => self.picture_body(el),
            id::BEGIN_FIGURE => {
                for child in &el.children {
                    self.element(child)?;
                }
                Ok(())
            }
            id::END_METAFILE | id::END_PICTURE | id::END_FIGURE | id::NOOP => Ok(()),
            id::METAFILE_DEFAULTS_REPLACEMENT => {
                let embedded = read_elements(&el.params)?;
                for e in &embedded {
                    self.element(e)?;
                }
                Ok(())
            }
            _ => match el.class() {
                // later elements can not be decoded without these
                1..=3 if changes_encoding(el.id) => self.descriptor(el),
                1..=3 => {
                    let r = self.descriptor(el);
                    self.session.absorb(r).map(|_| ())
                }
                4 => {
                    let r = self.primitive(el);
                    self.session.absorb(r).map(|_| ())
                }
                5 => {
                    let r = self.attribute(el);
                    self.session.absorb(r).map(|_| ())
                }
                7 if el.id == id::APPLICATION_DATA => {
                    let mut r = el.reader();
                    let text = self
                        .state
                        .int(&mut r)
                        .and_then(|_| self.state.string(&mut r));
                    if let Some(text) = self.session.absorb(text)? {
                        self.doc.meta.add_note(&text);
                    }
                    Ok(())
                }
                _ => {
                    debug!("skip cgm {}", el.name());
                    Ok(())
                }
            },
        }
    }

    fn picture(&mut self, el: &Element) -> Result<()> {
        match &self.metafile {
            Some(defaults) => {
                info!("cgm picture: restore metafile defaults");
                self.state = defaults.clone();
            }
            None => self.metafile = Some(self.state.clone()),
        }
        let name = self.state.string(&mut el.reader());
        let name = self.session.absorb(name)?.unwrap_or_default();
        let page = self.doc.add_page(None);
        let name = if name.trim().is_empty() {
            "Layer 1".to_owned()
        } else {
            name
        };
        let layer = self.doc.add_layer(page, name)?;
        self.picture = Some(Picture {
            page,
            layer,
            trafo: Trafo::identity(),
            scale: 1.0,
        });
        for child in &el.children {
            self.element(child)?;
        }
        self.picture = None;
        Ok(())
    }

    /// Page size and the VDC transform, computed once the picture
    /// descriptor is complete.
    fn picture_body(&mut self, el: &Element) -> Result<()> {
        let (ll, ur) = self.state.extent();
        let (w, h) = (ur.x - ll.x, ur.y - ll.y);
        let scale = match self.state.scaling {
            ScalingMode::Metric(mm) => mm * 72.0 / 25.4,
            ScalingMode::Abstract => ABSTRACT_PAGE_SIZE / w.abs().max(h.abs()).max(f64::EPSILON),
        };
        let trafo = Trafo::translation(-(ll.x + ur.x) / 2.0, -(ll.y + ur.y) / 2.0)
            .then_scale(w.signum() * scale, h.signum() * scale);
        let (pw, ph) = (w.abs() * scale, h.abs() * scale);
        let Some(picture) = &mut self.picture else {
            return Err(ConvertError::structural(
                el.offset,
                u32::from(el.id),
                "picture body outside a picture",
            ));
        };
        picture.trafo = trafo;
        picture.scale = scale;
        let (page, layer) = (picture.page, picture.layer);
        self.doc.set_page_format(page, PageFormat::custom(pw, ph))?;
        if let Some(bg) = self.state.background.clone() {
            let rect = Rectangle::new(-pw / 2.0, -ph / 2.0, pw, ph);
            self.doc.add_primitive(
                layer,
                Primitive::new(Shape::Rectangle(rect), Trafo::identity(), Style::filled(bg)),
            )?;
        }
        Ok(())
    }

    fn descriptor(&mut self, el: &Element) -> Result<()> {
        let mut r = el.reader();
        let s = &mut self.state;
        match el.id {
            id::METAFILE_VERSION => {
                let version = s.int(&mut r)?;
                debug!("cgm version {version}");
            }
            id::METAFILE_DESCRIPTION => {
                let text = s.string(&mut r)?;
                self.doc.meta.add_note(&text);
            }
            id::VDC_TYPE => {
                s.vdc_type = match s.enumeration(&mut r)? {
                    0 => VdcType::Integer,
                    _ => VdcType::Real,
                };
            }
            id::INTEGER_PRECISION => s.int_bytes = precision_bytes(s.int(&mut r)?, "integer")?,
            id::REAL_PRECISION => {
                let form = s.enumeration(&mut r)?;
                s.real = RealPrecision::from_params(form, s.int(&mut r)?, s.int(&mut r)?)?;
            }
            id::INDEX_PRECISION => s.index_bytes = precision_bytes(s.int(&mut r)?, "index")?,
            id::COLOUR_PRECISION => s.colour_bytes = precision_bytes(s.int(&mut r)?, "colour")?,
            id::COLOUR_INDEX_PRECISION => {
                s.colour_index_bytes = precision_bytes(s.int(&mut r)?, "colour index")?;
            }
            id::MAXIMUM_COLOUR_INDEX => {
                let max = s.colour_index(&mut r)?;
                let len = max.saturating_add(1).min(1 << 16);
                s.colour_table.resize(len, Color::rgb(0.0, 0.0, 0.0));
            }
            id::COLOUR_VALUE_EXTENT => {
                let mut raw = [0.0; 6];
                for v in &mut raw {
                    *v = s.colour_component(&mut r)?;
                }
                let (min, max) = ([raw[0], raw[1], raw[2]], [raw[3], raw[4], raw[5]]);
                if min.iter().zip(&max).all(|(a, b)| b > a) {
                    s.colour_min = min;
                    s.colour_max = max;
                } else {
                    debug!("ignore empty cgm colour value extent");
                }
            }
            id::FONT_LIST => {
                self.fonts.clear();
                while !r.is_empty() {
                    let font = s.string(&mut r)?;
                    self.fonts.push(font.trim().to_owned());
                }
            }
            id::SCALING_MODE => {
                let mode = s.enumeration(&mut r)?;
                // the metric factor is always a floating point real
                let precision = match s.real {
                    RealPrecision::Float64 => RealPrecision::Float64,
                    _ => RealPrecision::Float32,
                };
                let factor = s.real_with(&mut r, precision)?;
                s.scaling = if mode == 1 && factor > 0.0 {
                    ScalingMode::Metric(factor)
                } else {
                    ScalingMode::Abstract
                };
            }
            id::COLOUR_SELECTION_MODE => {
                s.colour_mode = match s.enumeration(&mut r)? {
                    0 => ColourMode::Indexed,
                    _ => ColourMode::Direct,
                };
            }
            id::LINE_WIDTH_MODE => s.line_width_mode = s.enumeration(&mut r)?.into(),
            id::EDGE_WIDTH_MODE => s.edge_width_mode = s.enumeration(&mut r)?.into(),
            id::VDC_EXTENT => s.vdc_extent = Some((s.point(&mut r)?, s.point(&mut r)?)),
            id::BACKGROUND_COLOUR => s.background = Some(s.direct_colour(&mut r)?),
            id::VDC_INTEGER_PRECISION => {
                s.vdc_int_bytes = precision_bytes(s.int(&mut r)?, "vdc integer")?;
            }
            id::VDC_REAL_PRECISION => {
                let form = s.enumeration(&mut r)?;
                s.vdc_real = RealPrecision::from_params(form, s.int(&mut r)?, s.int(&mut r)?)?;
            }
            _ => debug!("skip cgm {}", el.name()),
        }
        Ok(())
    }

    fn attribute(&mut self, el: &Element) -> Result<()> {
        let mut r = el.reader();
        let s = &mut self.state;
        match el.id {
            id::LINE_TYPE => s.line.kind = s.index(&mut r)?,
            id::LINE_WIDTH => s.line.width = Some(width(s, s.line_width_mode, &mut r)?),
            id::LINE_COLOUR => s.line.colour = s.colour(&mut r)?,
            id::EDGE_TYPE => s.edge.kind = s.index(&mut r)?,
            id::EDGE_WIDTH => s.edge.width = Some(width(s, s.edge_width_mode, &mut r)?),
            id::EDGE_COLOUR => s.edge.colour = s.colour(&mut r)?,
            id::EDGE_VISIBILITY => s.edge_visible = s.enumeration(&mut r)? == 1,
            id::INTERIOR_STYLE => s.interior = s.enumeration(&mut r)?.into(),
            id::FILL_COLOUR => s.fill_colour = s.colour(&mut r)?,
            id::HATCH_INDEX => s.hatch_index = s.index(&mut r)?,
            id::TEXT_FONT_INDEX => s.text.font_index = s.index(&mut r)?,
            id::TEXT_COLOUR => s.text.colour = s.colour(&mut r)?,
            id::CHARACTER_HEIGHT => s.text.height = Some(s.vdc(&mut r)?),
            id::TEXT_ALIGNMENT => s.text.horizontal = s.enumeration(&mut r)?,
            id::COLOUR_TABLE => {
                let start = s.colour_index(&mut r)?;
                let size = 3 * s.colour_bytes;
                let mut i = start;
                while r.remaining() >= size && i < 1 << 16 {
                    let c = s.direct_colour(&mut r)?;
                    if i >= s.colour_table.len() {
                        s.colour_table.resize(i + 1, Color::rgb(0.0, 0.0, 0.0));
                    }
                    s.colour_table[i] = c;
                    i += 1;
                }
            }
            _ => debug!("skip cgm {}", el.name()),
        }
        Ok(())
    }

    fn picture_ref(&self, el: &Element) -> Result<&Picture> {
        self.picture.as_ref().ok_or_else(|| {
            ConvertError::structural(
                el.offset,
                u32::from(el.id),
                format!("{} outside a picture", el.name()),
            )
        })
    }

    /// Width in points of a line or edge.
    fn stroke_width(&self, width: Option<f64>, mode: WidthMode, scale: f64) -> f64 {
        let (ll, ur) = self.state.extent();
        let extent = (ur.x - ll.x).abs().max((ur.y - ll.y).abs());
        match (width, mode) {
            (None, WidthMode::Absolute) => extent / 3000.0 * scale,
            (None, _) => self.defaults.stroke_width,
            (Some(w), WidthMode::Absolute) => w * scale,
            (Some(w), WidthMode::Scaled) => w * self.defaults.stroke_width,
            (Some(w), WidthMode::Fractional) => w * extent * scale,
            (Some(w), WidthMode::Millimetres) => w * 72.0 / 25.4,
        }
    }

    fn line_stroke(&self, scale: f64) -> Stroke {
        let line = &self.state.line;
        Stroke {
            width: self.stroke_width(line.width, self.state.line_width_mode, scale),
            color: line.colour.clone(),
            dash: dash_pattern(line.kind),
            miter_limit: self.defaults.miter_limit,
            ..Default::default()
        }
    }

    fn line_style(&self, scale: f64) -> Style {
        Style::stroked(self.line_stroke(scale))
    }

    fn fill_style(&self, scale: f64) -> Style {
        let s = &self.state;
        let colour = s.fill_colour.clone();
        let hatch = i32::try_from(s.hatch_index).unwrap_or(1);
        let fill = match s.interior {
            InteriorStyle::Hollow | InteriorStyle::Empty => None,
            InteriorStyle::Hatch => Some(Fill {
                rule: Default::default(),
                paint: FillPaint::Pattern(Pattern::Hatch {
                    index: hatch,
                    color: colour.clone(),
                    background: None,
                }),
            }),
            InteriorStyle::Solid => Some(Fill::solid(colour.clone())),
            other => {
                debug!("cgm interior style {other} filled solid");
                Some(Fill::solid(colour.clone()))
            }
        };
        let stroke = if s.edge_visible {
            let edge = &s.edge;
            Some(Stroke {
                width: self.stroke_width(edge.width, s.edge_width_mode, scale),
                color: edge.colour.clone(),
                dash: dash_pattern(edge.kind),
                miter_limit: self.defaults.miter_limit,
                ..Default::default()
            })
        } else if s.interior == InteriorStyle::Hollow {
            // hollow interiors draw their boundary in the fill colour
            Some(Stroke {
                color: colour,
                ..self.line_stroke(scale)
            })
        } else {
            None
        };
        Style {
            fill,
            stroke,
            ..Default::default()
        }
    }

    fn text_style(&self, scale: f64) -> Style {
        let t = &self.state.text;
        let (ll, ur) = self.state.extent();
        let height = t
            .height
            .unwrap_or_else(|| (ur.x - ll.x).abs().max((ur.y - ll.y).abs()) / 100.0);
        let font = usize::try_from(t.font_index - 1)
            .ok()
            .and_then(|i| self.fonts.get(i))
            .cloned()
            .unwrap_or_else(|| TextStyle::default().font_family);
        let align = match t.horizontal {
            2 => TextAlign::Center,
            3 => TextAlign::Right,
            _ => TextAlign::Left,
        };
        Style {
            fill: Some(Fill::solid(t.colour.clone())),
            text: Some(TextStyle {
                font_family: font,
                font_size: height * scale,
                align,
                color: t.colour.clone(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn add(&mut self, layer: NodeId, primitive: Primitive) -> Result<()> {
        self.doc.add_primitive(layer, primitive)?;
        Ok(())
    }

    fn primitive(&mut self, el: &Element) -> Result<()> {
        let p = self.picture_ref(el)?;
        let (layer, trafo, scale) = (p.layer, p.trafo, p.scale);
        let mut r = el.reader();
        let s = &self.state;
        match el.id {
            id::POLYLINE => {
                let points = s.points(&mut r)?;
                let path = Path::from_points(&points, false)
                    .ok_or_else(|| r.decode_error(4 * s.vdc_size()))?;
                let p = Primitive::curve(vec![path], trafo, self.line_style(scale));
                self.add(layer, p)
            }
            id::DISJOINT_POLYLINE => {
                let points = s.points(&mut r)?;
                let paths: Vec<Path> = points
                    .chunks_exact(2)
                    .filter_map(|pair| Path::from_points(pair, false))
                    .collect();
                if paths.is_empty() {
                    return Err(r.decode_error(4 * s.vdc_size()));
                }
                let p = Primitive::curve(paths, trafo, self.line_style(scale));
                self.add(layer, p)
            }
            id::POLYGON => {
                let points = s.points(&mut r)?;
                let path = Path::from_points(&points, true)
                    .ok_or_else(|| r.decode_error(6 * s.vdc_size()))?;
                let p = Primitive::curve(vec![path], trafo, self.fill_style(scale));
                self.add(layer, p)
            }
            id::POLYGON_SET => {
                let mut paths = vec![];
                let mut current = vec![];
                while r.remaining() >= 2 * s.vdc_size() + 2 {
                    current.push(s.point(&mut r)?);
                    // 2 and 3 close the current polygon
                    if s.enumeration(&mut r)? >= 2 {
                        paths.extend(Path::from_points(&current, true));
                        current.clear();
                    }
                }
                paths.extend(Path::from_points(&current, true));
                if paths.is_empty() {
                    return Err(r.decode_error(2 * s.vdc_size() + 2));
                }
                let p = Primitive::curve(paths, trafo, self.fill_style(scale));
                self.add(layer, p)
            }
            id::RECTANGLE => {
                let (a, b) = (s.point(&mut r)?, s.point(&mut r)?);
                let rect = Rectangle::new(
                    a.x.min(b.x),
                    a.y.min(b.y),
                    (b.x - a.x).abs(),
                    (b.y - a.y).abs(),
                );
                let p = Primitive::new(Shape::Rectangle(rect), trafo, self.fill_style(scale));
                self.add(layer, p)
            }
            id::CIRCLE => {
                let center = s.point(&mut r)?;
                let radius = s.vdc(&mut r)?.abs();
                let local = ellipse_trafo(center, radius, radius);
                let p = Primitive::new(
                    Shape::Circle(Circle::full()),
                    multiply_trafo(&local, &trafo),
                    self.fill_style(scale),
                );
                self.add(layer, p)
            }
            id::ARC_3_POINT | id::ARC_3_POINT_CLOSE => {
                let (p1, p2, p3) = (s.point(&mut r)?, s.point(&mut r)?, s.point(&mut r)?);
                let closed = el.id == id::ARC_3_POINT_CLOSE;
                let arc_type = if closed {
                    close_type(s.enumeration(&mut r)?)
                } else {
                    ArcType::Arc
                };
                let Some((center, radius, a1, a2)) = arc_by_3points(p1, p2, p3) else {
                    self.session.warn(format!("cgm {}: collinear points", el.name()));
                    return Ok(());
                };
                let style = if closed {
                    self.fill_style(scale)
                } else {
                    self.line_style(scale)
                };
                let local = ellipse_trafo(center, radius, radius);
                let p = Primitive::new(
                    Shape::Circle(Circle::arc(a1, a2, arc_type)),
                    multiply_trafo(&local, &trafo),
                    style,
                );
                self.add(layer, p)
            }
            id::ARC_CENTRE | id::ARC_CENTRE_CLOSE => {
                let center = s.point(&mut r)?;
                let (v1, v2) = (s.vector(&mut r)?, s.vector(&mut r)?);
                let radius = s.vdc(&mut r)?.abs();
                let closed = el.id == id::ARC_CENTRE_CLOSE;
                let arc_type = if closed {
                    close_type(s.enumeration(&mut r)?)
                } else {
                    ArcType::Arc
                };
                let a1 = point_angle(center + v1, center);
                let a2 = point_angle(center + v2, center);
                let style = if closed {
                    self.fill_style(scale)
                } else {
                    self.line_style(scale)
                };
                let local = ellipse_trafo(center, radius, radius);
                let p = Primitive::new(
                    Shape::Circle(Circle::arc(a1, a2, arc_type)),
                    multiply_trafo(&local, &trafo),
                    style,
                );
                self.add(layer, p)
            }
            id::ELLIPSE => {
                let (center, cdp1, cdp2) = (s.point(&mut r)?, s.point(&mut r)?, s.point(&mut r)?);
                let local = conjugate_trafo(center, cdp1, cdp2);
                let p = Primitive::new(
                    Shape::Circle(Circle::full()),
                    multiply_trafo(&local, &trafo),
                    self.fill_style(scale),
                );
                self.add(layer, p)
            }
            id::ELLIPTICAL_ARC | id::ELLIPTICAL_ARC_CLOSE => {
                let (center, cdp1, cdp2) = (s.point(&mut r)?, s.point(&mut r)?, s.point(&mut r)?);
                let (v1, v2) = (s.vector(&mut r)?, s.vector(&mut r)?);
                let closed = el.id == id::ELLIPTICAL_ARC_CLOSE;
                let arc_type = if closed {
                    close_type(s.enumeration(&mut r)?)
                } else {
                    ArcType::Arc
                };
                let local = conjugate_trafo(center, cdp1, cdp2);
                // angles are taken in the parameter space of the ellipse
                let inverse = invert_trafo(&local)?;
                let unit_center = Point::new(0.5, 0.5);
                let angle =
                    |v: Vector| point_angle(inverse.transform_point(center + v), unit_center);
                let (a1, a2) = (angle(v1), angle(v2));
                let style = if closed {
                    self.fill_style(scale)
                } else {
                    self.line_style(scale)
                };
                let p = Primitive::new(
                    Shape::Circle(Circle::arc(a1, a2, arc_type)),
                    multiply_trafo(&local, &trafo),
                    style,
                );
                self.add(layer, p)
            }
            id::TEXT => {
                let at = s.point(&mut r)?;
                let _final = s.enumeration(&mut r)?;
                let text = s.string(&mut r)?;
                self.text(layer, trafo.transform_point(at), text, None, scale)
            }
            id::RESTRICTED_TEXT => {
                let (dx, _dy) = (s.vdc(&mut r)?, s.vdc(&mut r)?);
                let at = s.point(&mut r)?;
                let _final = s.enumeration(&mut r)?;
                let text = s.string(&mut r)?;
                let width = Some(dx.abs() * scale);
                self.text(layer, trafo.transform_point(at), text, width, scale)
            }
            id::POLYMARKER | id::CELL_ARRAY | id::GDP => {
                Err(ConvertError::unsupported(format!("cgm {}", el.name())))
            }
            _ => {
                debug!("skip cgm {}", el.name());
                Ok(())
            }
        }
    }

    fn text(
        &mut self,
        layer: NodeId,
        at: Point,
        text: String,
        width: Option<f64>,
        scale: f64,
    ) -> Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let p = Primitive::new(
            Shape::Text(Text {
                anchor: Point::origin(),
                text,
                width,
            }),
            Trafo::translation(at.x, at.y),
            self.text_style(scale),
        );
        self.add(layer, p)
    }
}

/// Line or edge width parameter, VDC in absolute mode, else a real.
fn width(s: &DecodeState, mode: WidthMode, r: &mut RecordReader) -> Result<f64> {
    match mode {
        WidthMode::Absolute => s.vdc(r),
        _ => s.real(r),
    }
}
