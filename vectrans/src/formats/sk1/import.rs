use super::{
    parser::{parse, Call, Value},
    PAGE_FORMATS,
};
use crate::{
    color::Color,
    diag::Session,
    error::{ConvertError, Result},
    formats::{ImportDefaults, Importer},
    geom::{multiply_trafo, ArcType, NodeKind as PointKind, Path, Point, Segment, Trafo},
    model::{
        style::{Cap, Fill, Join, Stroke, Style, TextStyle},
        Circle, DocOrigin, Document, Layer, NodeId, NodeKind, PageFormat, Primitive, Rectangle,
        Shape, Text,
    },
};
use educe::Educe;
use log::{debug, info};

pub struct Sk1Importer {
    defaults: ImportDefaults,
}

impl Sk1Importer {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

impl Importer for Sk1Importer {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        if !super::check(data) {
            return Err(ConvertError::structural(0, 0, "missing sK1 header line"));
        }
        // files older than sK1 are Latin-1
        let text = match std::str::from_utf8(data) {
            Ok(s) => s.to_owned(),
            Err(_) => data.iter().copied().map(char::from).collect(),
        };
        let mut doc = Document::new();
        doc.origin = DocOrigin::LowerLeft;
        doc.page_format = self.defaults.page_format.clone();

        let mut t = Translator {
            doc,
            session,
            page: None,
            layer: None,
            parents: vec![],
            style: SkStyle::default(),
            curve: None,
        };
        for call in parse(&text) {
            if let Some(call) = t.session.absorb(call)? {
                let r = t.call(&call);
                t.session.absorb(r)?;
            }
        }
        t.finish_curve()?;
        if t.doc.pages().is_empty() {
            let page = t.doc.add_page(None);
            t.doc.add_layer(page, "Layer 1")?;
        }
        Ok(t.doc)
    }
}

/// Paint of the pending style, `fp()` and `lp()` without a color take the
/// last pattern.
#[derive(Debug, Clone, PartialEq)]
enum Pattern {
    Empty,
    Solid(Color),
    /// Gradient, hatching or image tile.
    Other(&'static str),
}

/// Style taken by the next object.
#[derive(Debug, Clone, Educe)]
#[educe(Default)]
struct SkStyle {
    fill: Option<Color>,
    #[educe(Default(expression = Some(Color::black())))]
    line: Option<Color>,
    #[educe(Default(expression = 0.28))]
    line_width: f64,
    cap: Cap,
    join: Join,
    dash: Vec<f64>,
    #[educe(Default = "Times-Roman")]
    font: String,
    #[educe(Default(expression = 12.0))]
    font_size: f64,
    #[educe(Default(expression = Pattern::Empty))]
    pattern: Pattern,
}

impl SkStyle {
    fn to_style(&self) -> Style {
        Style {
            fill: self.fill.clone().map(Fill::solid),
            stroke: self.line.clone().map(|color| Stroke {
                width: self.line_width,
                color,
                cap: self.cap,
                join: self.join,
                dash: self.dash.clone(),
                miter_limit: 10.0,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Text is painted with the fill color.
    fn to_text_style(&self) -> Style {
        Style {
            fill: self.fill.clone().map(Fill::solid),
            text: Some(TextStyle {
                font_family: self.font.clone(),
                font_size: self.font_size,
                color: self.fill.clone().unwrap_or_else(Color::black),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

/// Color of a `(r, g, b)` tuple or an sK1 color spec such as
/// `('RGB', r, g, b[, alpha])` or `('CMYK', c, m, y, k[, alpha])`.
fn color(v: &Value) -> Option<Color> {
    let spec = v.seq()?;
    let values =
        |from: usize| -> Option<Vec<f64>> { spec[from..].iter().map(Value::number).collect() };
    let (color, alpha) = match spec.first()? {
        Value::Number(_) => {
            let v = values(0)?;
            (Color::rgb(*v.first()?, *v.get(1)?, *v.get(2)?), None)
        }
        Value::Str(kind) => match kind.as_str() {
            "RGB" => {
                let v = values(1)?;
                (Color::rgb(*v.first()?, *v.get(1)?, *v.get(2)?), v.get(3).copied())
            }
            "CMYK" => {
                let v = values(1)?;
                (
                    Color::cmyk(*v.first()?, *v.get(1)?, *v.get(2)?, *v.get(3)?),
                    v.get(4).copied(),
                )
            }
            "SPOT" => {
                let name = spec.get(2)?.str()?.to_owned();
                let v = values(3)?;
                (
                    Color::spot(
                        name,
                        [*v.first()?, *v.get(1)?, *v.get(2)?],
                        [*v.get(3)?, *v.get(4)?, *v.get(5)?, *v.get(6)?],
                    ),
                    v.get(7).copied(),
                )
            }
            _ => return None,
        },
        _ => return None,
    };
    Some(match alpha {
        Some(a) => color.with_alpha(a),
        None => color,
    })
}

/// Page format of `layout(format, orientation)`, `layout((w, h),
/// orientation)` or `layout(format, (w, h), orientation)`.
fn layout(args: &[Value]) -> Option<PageFormat> {
    let size = |v: &Value| -> Option<(f64, f64)> {
        let s = v.seq()?;
        Some((s.first()?.number()?, s.get(1)?.number()?))
    };
    let (name, (w, h), orientation) = match args {
        [name, dims, orientation] => (name.str()?, size(dims)?, orientation.number()?),
        [Value::Str(name), orientation] => {
            let name = if PAGE_FORMATS.contains_key(name.as_str()) {
                name.as_str()
            } else {
                "A4"
            };
            (name, *PAGE_FORMATS.get(name)?, orientation.number()?)
        }
        [dims, orientation] => ("Custom", size(dims)?, orientation.number()?),
        _ => return None,
    };
    let (w, h) = if orientation != 0.0 { (w.max(h), w.min(h)) } else { (w, h) };
    Some(PageFormat::new(if name.is_empty() { "Custom" } else { name }, w, h))
}

fn bad_arguments(call: &Call) -> ConvertError {
    ConvertError::unsupported(format!(
        "sk1 {}() arguments on line {}",
        call.name, call.line
    ))
}

/// Curve being built by `bs`/`bc` calls.
#[derive(Debug)]
struct CurveBuilder {
    paths: Vec<Path>,
    current: Option<Path>,
    style: Style,
}

impl CurveBuilder {
    fn new_path(&mut self) {
        self.paths.extend(self.current.take());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bracket {
    Group,
    Mask,
}

struct Translator<'s, 'b> {
    doc: Document,
    session: &'s mut Session<'b>,
    page: Option<NodeId>,
    layer: Option<NodeId>,
    /// Open groups, innermost last.
    parents: Vec<(Bracket, NodeId)>,
    style: SkStyle,
    curve: Option<CurveBuilder>,
}

impl Translator<'_, '_> {
    fn page(&mut self) -> NodeId {
        match self.page {
            Some(p) => p,
            None => {
                let p = self.doc.add_page(None);
                self.page = Some(p);
                p
            }
        }
    }

    fn parent(&mut self) -> Result<NodeId> {
        if let Some((_, p)) = self.parents.last() {
            return Ok(*p);
        }
        if let Some(l) = self.layer {
            return Ok(l);
        }
        let page = self.page();
        let l = self.doc.add_layer(page, "Layer 1")?;
        self.layer = Some(l);
        Ok(l)
    }

    fn origin(&self) -> Result<Trafo> {
        let size = match self.page {
            Some(p) => self.doc.page_format(p)?.size,
            None => self.doc.page_format.size,
        };
        Ok(self.doc.origin_trafo(size))
    }

    /// Add an object with the pending style, which is reset.
    fn add(&mut self, shape: Shape, trafo: Trafo, style: Style) -> Result<()> {
        let trafo = multiply_trafo(&trafo, &self.origin()?);
        let parent = self.parent()?;
        self.doc.add_primitive(parent, Primitive::new(shape, trafo, style))?;
        self.style = SkStyle::default();
        Ok(())
    }

    fn finish_curve(&mut self) -> Result<()> {
        if let Some(mut curve) = self.curve.take() {
            curve.new_path();
            let CurveBuilder {
                mut paths, style, ..
            } = curve;
            paths.retain(|p| !p.segments.is_empty());
            if paths.is_empty() {
                debug!("empty sk1 curve");
                return Ok(());
            }
            let trafo = self.origin()?;
            let parent = self.parent()?;
            self.doc.add_primitive(parent, Primitive::curve(paths, trafo, style))?;
        }
        Ok(())
    }

    fn curve(&mut self, call: &Call) -> Result<&mut CurveBuilder> {
        self.curve.as_mut().ok_or_else(|| bad_arguments(call))
    }

    fn call(&mut self, call: &Call) -> Result<()> {
        let name = call.name.as_str();
        if !matches!(name, "bs" | "bc" | "bn" | "bC") {
            self.finish_curve()?;
        }
        match name {
            "document" | "grid" | "add_pages" | "guide" => {}
            "layout" => {
                let format = layout(&call.args).ok_or_else(|| bad_arguments(call))?;
                info!("sk1 page {} {}x{}", format.name, format.size.width, format.size.height);
                self.doc.page_format = format;
            }
            "page" => self.new_page(call)?,
            "layer" | "masterlayer" | "guidelayer" => self.layer(call)?,
            "G" | "B" | "PT" | "PC" => self.open(Bracket::Group)?,
            "M" => self.open(Bracket::Mask)?,
            "G_" | "M_" | "B_" | "PT_" | "PC_" => self.close(call)?,
            "Bi" | "pt" => {}
            "fp" | "lp" => self.paint(call)?,
            "fe" => self.style.fill = None,
            "le" => self.style.line = None,
            "ps" => {
                let c = call.arg(0, "color").and_then(color).ok_or_else(|| bad_arguments(call))?;
                self.style.pattern = Pattern::Solid(c);
            }
            "pe" => self.style.pattern = Pattern::Empty,
            "pgl" | "pgr" | "pgc" => self.style.pattern = Pattern::Other("gradient"),
            "phs" => self.style.pattern = Pattern::Other("hatching"),
            "pit" => self.style.pattern = Pattern::Other("image tile"),
            "gl" | "ft" | "la1" | "la2" | "style" | "use_style" => {
                debug!("ignore sk1 {name}() on line {}", call.line);
            }
            "lw" => {
                self.style.line_width = call.number(0, "width").ok_or_else(|| bad_arguments(call))?;
            }
            "lc" => {
                self.style.cap = match call.number(0, "cap") {
                    Some(c) if c == 2.0 => Cap::Round,
                    Some(c) if c == 3.0 => Cap::Square,
                    _ => Cap::Butt,
                }
            }
            "lj" => {
                self.style.join = match call.number(0, "join") {
                    Some(j) if j == 1.0 => Join::Round,
                    Some(j) if j == 2.0 => Join::Bevel,
                    _ => Join::Miter,
                }
            }
            "ld" => {
                let dashes = call.arg(0, "dashes").and_then(Value::seq).unwrap_or_default();
                self.style.dash = dashes.iter().filter_map(Value::number).collect();
            }
            "Fs" => {
                self.style.font_size = call.number(0, "size").ok_or_else(|| bad_arguments(call))?;
            }
            "Fn" => {
                if let Some(font) = call.arg(0, "name").and_then(Value::str) {
                    self.style.font = font.to_owned();
                }
            }
            "dstyle" => self.style = SkStyle::default(),
            "r" => self.rectangle(call)?,
            "e" => self.ellipse(call)?,
            "b" => {
                self.curve = Some(CurveBuilder {
                    paths: vec![],
                    current: None,
                    style: self.style.to_style(),
                });
                self.style = SkStyle::default();
            }
            "bn" => self.curve(call)?.new_path(),
            "bs" => {
                let [x, y] = call.numbers().ok_or_else(|| bad_arguments(call))?;
                let p = Point::new(x, y);
                match &mut self.curve(call)?.current {
                    Some(path) => path.line_to(p),
                    current @ None => *current = Some(Path::new(p)),
                }
            }
            "bc" => {
                let [x1, y1, x2, y2, x3, y3] = call.numbers().ok_or_else(|| bad_arguments(call))?;
                let node = match call.number(6, "cont") {
                    Some(c) if c == 1.0 => PointKind::Smooth,
                    Some(c) if c == 2.0 => PointKind::Symmetrical,
                    _ => PointKind::Cusp,
                };
                let c1 = Point::new(x1, y1);
                match &mut self.curve(call)?.current {
                    Some(path) => path.segments.push(Segment::Curve {
                        c1,
                        c2: Point::new(x2, y2),
                        end: Point::new(x3, y3),
                        node,
                    }),
                    // a curve without a start point only places it
                    current @ None => *current = Some(Path::new(c1)),
                }
            }
            "bC" => match self.curve(call)?.current.as_mut() {
                Some(path) => path.close(),
                None => return Err(bad_arguments(call)),
            },
            "txt" => self.text(call)?,
            "bm" => {
                return Err(ConvertError::unsupported(format!(
                    "sk1 embedded bitmap on line {}",
                    call.line
                )))
            }
            "im" | "eps" => {
                return Err(ConvertError::unsupported(format!(
                    "sk1 {name}() object on line {}",
                    call.line
                )))
            }
            _ => {
                return Err(ConvertError::unsupported(format!(
                    "sk1 call {name}() on line {}",
                    call.line
                )))
            }
        }
        Ok(())
    }

    fn new_page(&mut self, call: &Call) -> Result<()> {
        let name = call
            .arg(1, "format")
            .filter(|f| f.str().is_some_and(|f| !f.is_empty()));
        let size = call.arg(2, "size").filter(|s| s.seq().is_some());
        let orientation = call
            .arg(3, "orientation")
            .cloned()
            .unwrap_or(Value::Number(0.0));
        let args = match (name, size) {
            (Some(n), Some(s)) => vec![n.clone(), s.clone(), orientation],
            (Some(v), None) | (None, Some(v)) => vec![v.clone(), orientation],
            (None, None) => vec![],
        };
        let format = if args.is_empty() { None } else { layout(&args) };
        let page = self.doc.add_page(format);
        self.page = Some(page);
        self.layer = None;
        self.parents.clear();
        Ok(())
    }

    fn layer(&mut self, call: &Call) -> Result<()> {
        self.parents.clear();
        let page = self.page();
        let flag = |i: usize| call.args.get(i).and_then(Value::number).map_or(true, |v| v != 0.0);
        let name = call.arg(0, "name").and_then(Value::str).unwrap_or_default();
        let mut layer = Layer::new(if name.is_empty() { "Layer 1" } else { name });
        layer.visible = flag(1);
        layer.printable = flag(2);
        if call.name == "guidelayer" {
            layer.printable = false;
        }
        let id = self.doc.add_child(page, NodeKind::Layer(layer))?;
        self.layer = Some(id);
        Ok(())
    }

    fn open(&mut self, bracket: Bracket) -> Result<()> {
        let kind = match bracket {
            Bracket::Group => NodeKind::Group,
            Bracket::Mask => NodeKind::Container,
        };
        let parent = self.parent()?;
        let id = self.doc.add_child(parent, kind)?;
        self.parents.push((bracket, id));
        Ok(())
    }

    fn close(&mut self, call: &Call) -> Result<()> {
        let expect = if call.name == "M_" { Bracket::Mask } else { Bracket::Group };
        match self.parents.pop() {
            Some((bracket, _)) if bracket == expect => Ok(()),
            Some(open) => {
                self.parents.push(open);
                Err(bad_arguments(call))
            }
            None => Err(bad_arguments(call)),
        }
    }

    fn paint(&mut self, call: &Call) -> Result<()> {
        let paint = match call.arg(0, "color") {
            Some(v) => Some(color(v).ok_or_else(|| bad_arguments(call))?),
            None => match &self.style.pattern {
                Pattern::Empty => None,
                Pattern::Solid(c) => Some(c.clone()),
                Pattern::Other(kind) => {
                    let kind = *kind;
                    return Err(ConvertError::unsupported(format!(
                        "sk1 {kind} pattern on line {}",
                        call.line
                    )));
                }
            },
        };
        if call.name == "fp" {
            self.style.fill = paint;
        } else {
            self.style.line = paint;
        }
        Ok(())
    }

    /// Unit square placed by the transform. Elliptic corners, radii
    /// relative to the square, become circular corners of a stretched
    /// rectangle scaled back.
    fn rectangle(&mut self, call: &Call) -> Result<()> {
        let [m11, m12, m21, m22, dx, dy] = call.numbers().ok_or_else(|| bad_arguments(call))?;
        let trafo = Trafo::new(m11, m12, m21, m22, dx, dy);
        let r1 = call.number(6, "radius1").unwrap_or(0.0).abs();
        let r2 = call.number(7, "radius2").unwrap_or(0.0).abs();
        let (rect, trafo) = if r1 > 0.0 && r2 > 0.0 {
            let (rect, stretch) = if r1 > r2 {
                (Rectangle::new(0.0, 0.0, 1.0, r1 / r2), Trafo::scale(1.0, r2 / r1))
            } else {
                (Rectangle::new(0.0, 0.0, r2 / r1, 1.0), Trafo::scale(r1 / r2, 1.0))
            };
            let radius = r1.max(r2);
            (rect.with_radii([radius; 4]), multiply_trafo(&stretch, &trafo))
        } else {
            (Rectangle::new(0.0, 0.0, 1.0, 1.0), trafo)
        };
        let style = self.style.to_style();
        self.add(Shape::Rectangle(rect), trafo, style)
    }

    /// Unit circle at the origin placed by the transform.
    fn ellipse(&mut self, call: &Call) -> Result<()> {
        let [m11, m12, m21, m22, dx, dy] = call.numbers().ok_or_else(|| bad_arguments(call))?;
        let start = call.number(6, "start_angle").unwrap_or(0.0);
        let end = call.number(7, "end_angle").unwrap_or(0.0);
        let arc_type = match call.number(8, "arc_type") {
            Some(t) if t == 0.0 => ArcType::Arc,
            Some(t) if t == 1.0 => ArcType::Chord,
            _ => ArcType::PieSlice,
        };
        let unit_box = Trafo::new(2.0, 0.0, 0.0, 2.0, -1.0, -1.0);
        let trafo = multiply_trafo(&unit_box, &Trafo::new(m11, m12, m21, m22, dx, dy));
        let style = self.style.to_style();
        self.add(Shape::Circle(Circle::arc(start, end, arc_type)), trafo, style)
    }

    /// `txt(text, trafo, ...)`, the transform being `(x, y)` or six values.
    fn text(&mut self, call: &Call) -> Result<()> {
        let text = call.arg(0, "text").and_then(Value::str).ok_or_else(|| bad_arguments(call))?;
        let values: Option<Vec<f64>> = call
            .arg(1, "trafo")
            .and_then(Value::seq)
            .map(|s| s.iter().filter_map(Value::number).collect());
        let trafo = match values.as_deref() {
            Some([x, y]) => Trafo::translation(*x, *y),
            Some([m11, m12, m21, m22, dx, dy]) => Trafo::new(*m11, *m12, *m21, *m22, *dx, *dy),
            _ => return Err(bad_arguments(call)),
        };
        if text.is_empty() {
            self.style = SkStyle::default();
            return Ok(());
        }
        let shape = Shape::Text(Text {
            anchor: Point::origin(),
            text: text.to_owned(),
            width: None,
        });
        let style = self.style.to_text_style();
        self.add(shape, trafo, style)
    }
}
