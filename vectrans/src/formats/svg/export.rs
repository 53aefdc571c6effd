use crate::{
    diag::Session,
    error::{ConvertError, Result},
    formats::Exporter,
    geom::{
        apply_trafo_to_bbox, apply_trafo_to_paths,
        recognize::{as_ellipse, as_rectangle},
        Bbox, Path, Point, Segment, Trafo,
    },
    model::{
        style::{Fill, FillPaint, FillRule, Gradient, GradientKind, Stroke, Style, TextAlign},
        Document, NodeKind, Primitive, Shape,
    },
};
use educe::Educe;
use itertools::Itertools;
use log::debug;
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};
use std::fmt::Write as _;

#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct SvgOptions {
    /// Spaces per nesting level.
    #[educe(Default = 1)]
    pub indent: usize,
    /// Fraction digits of coordinates.
    #[educe(Default = 3)]
    pub precision: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SvgExporter {
    options: SvgOptions,
}

impl SvgExporter {
    pub fn new(options: SvgOptions) -> Self {
        Self { options }
    }
}

fn write_error(e: impl std::fmt::Display) -> ConvertError {
    ConvertError::structural(0, 0, format!("svg write: {e}"))
}

/// Fixed point number without trailing zeros.
fn fmt_num(v: f64, precision: usize) -> String {
    let s = format!("{v:.precision$}");
    let s = if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        &s
    };
    if s == "-0" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

/// No rotation, skew or axis swap.
fn is_straight(t: &Trafo) -> bool {
    const EPS: f64 = 1e-9;
    t.m12.abs() < EPS && t.m21.abs() < EPS
}

fn cap_name(s: &Stroke) -> String {
    s.cap.to_string().to_lowercase()
}

fn join_name(s: &Stroke) -> String {
    s.join.to_string().to_lowercase()
}

type Attrs = Vec<(&'static str, String)>;

/// Element and attributes to write, built before touching the writer.
struct Item {
    name: &'static str,
    attrs: Attrs,
    text: Option<String>,
}

struct SvgWriter<'s, 'b> {
    writer: Writer<Vec<u8>>,
    precision: usize,
    session: &'s mut Session<'b>,
    gradients: Vec<(String, Gradient)>,
}

impl<'s, 'b> SvgWriter<'s, 'b> {
    fn num(&self, v: f64) -> String {
        fmt_num(v, self.precision)
    }

    fn matrix(&self, t: &Trafo) -> String {
        let n = |v| self.num(v);
        format!(
            "matrix({} {} {} {} {} {})",
            n(t.m11),
            n(t.m12),
            n(t.m21),
            n(t.m22),
            n(t.m31),
            n(t.m32)
        )
    }

    fn path_data(&self, paths: &[Path]) -> String {
        let mut d = String::new();
        let pt = |p: Point| format!("{} {}", self.num(p.x), self.num(p.y));
        for path in paths {
            let _ = write!(d, "M{}", pt(path.start));
            for s in &path.segments {
                let _ = match s {
                    Segment::Line(p) => write!(d, " L{}", pt(*p)),
                    Segment::Curve { c1, c2, end, .. } => {
                        write!(d, " C{} {} {}", pt(*c1), pt(*c2), pt(*end))
                    }
                };
            }
            if path.closed {
                d.push_str(" Z");
            }
            d.push(' ');
        }
        d.trim_end().to_owned()
    }

    fn start(&mut self, item: &Item) -> Result<()> {
        let mut el = BytesStart::new(item.name);
        for (k, v) in &item.attrs {
            el.push_attribute((*k, v.as_str()));
        }
        let event = match &item.text {
            Some(_) => Event::Start(el),
            None => Event::Empty(el),
        };
        self.writer.write_event(event).map_err(write_error)?;
        if let Some(text) = &item.text {
            self.writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
            self.writer
                .write_event(Event::End(BytesEnd::new(item.name)))
                .map_err(write_error)?;
        }
        Ok(())
    }

    fn open(&mut self, name: &str, attrs: &[(&str, String)]) -> Result<()> {
        let mut el = BytesStart::new(name);
        for (k, v) in attrs {
            el.push_attribute((*k, v.as_str()));
        }
        self.writer
            .write_event(Event::Start(el))
            .map_err(write_error)
    }

    fn close(&mut self, name: &str) -> Result<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }

    /// Register a gradient in user space, returns its paint reference.
    fn gradient(&mut self, g: &Gradient, to_user: &Trafo) -> String {
        let id = format!("gradient{}", self.gradients.len() + 1);
        let mut g = g.clone();
        g.trafo = g.trafo.then(to_user);
        self.gradients.push((id.clone(), g));
        format!("url(#{id})")
    }

    fn fill_attrs(&mut self, fill: Option<&Fill>, to_user: &Trafo, attrs: &mut Attrs) {
        let Some(fill) = fill else {
            attrs.push(("fill", "none".to_owned()));
            return;
        };
        match &fill.paint {
            FillPaint::Gradient(g) if !g.stops.is_empty() => {
                let url = self.gradient(g, to_user);
                attrs.push(("fill", url));
            }
            _ => match fill.main_color() {
                Some(c) => {
                    attrs.push(("fill", c.to_hex(self.session.cms)));
                    if c.alpha < 1.0 {
                        attrs.push(("fill-opacity", self.num(c.alpha)));
                    }
                }
                None => attrs.push(("fill", "none".to_owned())),
            },
        }
        let rule = match fill.rule {
            FillRule::EvenOdd => "evenodd",
            FillRule::NonZero => "nonzero",
        };
        attrs.push(("fill-rule", rule.to_owned()));
    }

    fn stroke_attrs(&self, stroke: Option<&Stroke>, attrs: &mut Attrs) {
        let Some(s) = stroke else {
            return;
        };
        attrs.push(("stroke", s.color.to_hex(self.session.cms)));
        if s.color.alpha < 1.0 {
            attrs.push(("stroke-opacity", self.num(s.color.alpha)));
        }
        attrs.push(("stroke-width", self.num(s.width)));
        attrs.push(("stroke-linecap", cap_name(s)));
        attrs.push(("stroke-linejoin", join_name(s)));
        attrs.push(("stroke-miterlimit", self.num(s.miter_limit)));
        if !s.dash.is_empty() {
            let dash = s.dash.iter().map(|d| self.num(d * s.width)).join(" ");
            attrs.push(("stroke-dasharray", dash));
        }
    }

    fn style_attrs(&mut self, style: &Style, to_user: &Trafo) -> Attrs {
        let mut attrs = vec![];
        self.fill_attrs(style.fill.as_ref(), to_user, &mut attrs);
        self.stroke_attrs(style.stroke.as_ref(), &mut attrs);
        attrs
    }

    /// Native element for one primitive, `to_svg` maps page space to SVG
    /// user space.
    fn item(&mut self, p: &Primitive, to_svg: &Trafo) -> Option<Item> {
        let total = p.trafo.then(to_svg);
        match &p.shape {
            Shape::Pixmap(_) => {
                self.session.warn("svg export: pixmap skipped");
                None
            }
            Shape::Text(t) => {
                let text_style = p.style.text.clone().unwrap_or_default();
                let matrix = Trafo::scale(1.0, -1.0)
                    .then_translate(t.anchor.to_vector())
                    .then(&total);
                let mut attrs = vec![
                    ("transform", self.matrix(&matrix)),
                    ("font-family", text_style.font_family.clone()),
                    ("font-size", self.num(text_style.font_size)),
                ];
                let anchor = match text_style.align {
                    TextAlign::Center => Some("middle"),
                    TextAlign::Right => Some("end"),
                    _ => None,
                };
                if let Some(anchor) = anchor {
                    attrs.push(("text-anchor", anchor.to_owned()));
                }
                match &p.style.fill {
                    Some(_) => attrs.extend(self.style_attrs(&p.style, &total)),
                    None => attrs.push(("fill", text_style.color.to_hex(self.session.cms))),
                }
                Some(Item {
                    name: "text",
                    attrs,
                    text: Some(t.text.clone()),
                })
            }
            shape => {
                let paths = apply_trafo_to_paths(&shape.to_paths(), &total);
                if paths.is_empty() {
                    return None;
                }
                let (name, mut attrs) = self.geometry(shape, &total, &paths);
                attrs.extend(self.style_attrs(&p.style, &total));
                Some(Item {
                    name,
                    attrs,
                    text: None,
                })
            }
        }
    }

    /// Element name and geometry attributes, `paths` are in user space.
    fn geometry(&self, shape: &Shape, total: &Trafo, paths: &[Path]) -> (&'static str, Attrs) {
        if let Shape::Rectangle(r) = shape {
            let radii = r.radii();
            if is_straight(total) && radii.iter().all(|v| *v == radii[0]) {
                let local = Bbox::new(r.origin, r.origin + r.size.to_vector());
                let b = apply_trafo_to_bbox(&local, total);
                let mut attrs = self.rect_attrs(&b);
                if radii[0] > 0.0 {
                    attrs.push(("rx", self.num(radii[0] * total.m11.abs())));
                    attrs.push(("ry", self.num(radii[0] * total.m22.abs())));
                }
                return ("rect", attrs);
            }
        }
        if let Some(b) = as_rectangle(paths) {
            return ("rect", self.rect_attrs(&b));
        }
        if let Some(e) = as_ellipse(paths).filter(is_straight) {
            let center = e.transform_point(Point::new(0.5, 0.5));
            let attrs = vec![
                ("cx", self.num(center.x)),
                ("cy", self.num(center.y)),
                ("rx", self.num(e.m11.abs() / 2.0)),
                ("ry", self.num(e.m22.abs() / 2.0)),
            ];
            return ("ellipse", attrs);
        }
        ("path", vec![("d", self.path_data(paths))])
    }

    fn rect_attrs(&self, b: &Bbox) -> Attrs {
        vec![
            ("x", self.num(b.min.x)),
            ("y", self.num(b.min.y)),
            ("width", self.num(b.width())),
            ("height", self.num(b.height())),
        ]
    }

    fn write_gradients(&mut self) -> Result<()> {
        if self.gradients.is_empty() {
            return Ok(());
        }
        self.open("defs", &[])?;
        for (id, g) in std::mem::take(&mut self.gradients) {
            let precision = self.precision;
            let n = |v| fmt_num(v, precision);
            let (name, mut attrs) = match g.kind {
                GradientKind::Linear => (
                    "linearGradient",
                    vec![
                        ("x1", n(g.start.x)),
                        ("y1", n(g.start.y)),
                        ("x2", n(g.end.x)),
                        ("y2", n(g.end.y)),
                    ],
                ),
                GradientKind::Radial => (
                    "radialGradient",
                    vec![
                        ("cx", n(g.start.x)),
                        ("cy", n(g.start.y)),
                        ("r", n((g.end - g.start).length())),
                    ],
                ),
            };
            attrs.insert(0, ("id", id));
            attrs.push(("gradientUnits", "userSpaceOnUse".to_owned()));
            attrs.push(("gradientTransform", self.matrix(&g.trafo)));
            self.open(name, &attrs)?;
            for (offset, color) in &g.stops {
                let mut stop = vec![
                    ("offset", self.num(*offset)),
                    ("stop-color", color.to_hex(self.session.cms)),
                ];
                if color.alpha < 1.0 {
                    stop.push(("stop-opacity", self.num(color.alpha)));
                }
                self.start(&Item {
                    name: "stop",
                    attrs: stop,
                    text: None,
                })?;
            }
            self.close(name)?;
        }
        self.close("defs")
    }
}

impl Exporter for SvgExporter {
    fn export(&self, doc: &Document, session: &mut Session) -> Result<Vec<u8>> {
        let pages = doc.pages();
        let Some(&page) = pages.first() else {
            return Err(ConvertError::unsupported("svg export of a document without pages"));
        };
        if pages.len() > 1 {
            session.warn(format!(
                "svg export: only the first of {} pages is written",
                pages.len()
            ));
        }
        let size = doc.page_format(page)?.size;
        let to_svg = Trafo::new(1.0, 0.0, 0.0, -1.0, size.width / 2.0, size.height / 2.0);

        let mut w = SvgWriter {
            writer: Writer::new_with_indent(Vec::new(), b' ', self.options.indent),
            precision: self.options.precision,
            session,
            gradients: vec![],
        };

        // shapes are built first so gradients land in defs ahead of them
        let mut layers: Vec<(String, Vec<Item>)> = vec![];
        let children = doc.children(page)?;
        let total = children.len();
        for (i, child) in children.iter().enumerate() {
            let name = match doc.kind(*child)? {
                NodeKind::Layer(l) => l.name.clone(),
                kind => {
                    debug!("svg export: {kind:?} directly on page");
                    format!("Layer {}", i + 1)
                }
            };
            let mut items = vec![];
            for (_, p) in doc.primitives(*child)? {
                if let Some(item) = w.item(p, &to_svg) {
                    items.push(item);
                }
            }
            layers.push((name, items));
            w.session.progress.report(i + 1, total);
        }

        w.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        let root = [
            ("xmlns", "http://www.w3.org/2000/svg".to_owned()),
            ("version", "1.1".to_owned()),
            ("width", format!("{}pt", w.num(size.width))),
            ("height", format!("{}pt", w.num(size.height))),
            (
                "viewBox",
                format!("0 0 {} {}", w.num(size.width), w.num(size.height)),
            ),
        ];
        w.open("svg", &root)?;
        w.write_gradients()?;
        for (name, items) in &layers {
            w.open("g", &[("id", name.clone())])?;
            for item in items {
                w.start(item)?;
            }
            w.close("g")?;
        }
        w.close("svg")?;
        Ok(w.writer.into_inner())
    }
}
