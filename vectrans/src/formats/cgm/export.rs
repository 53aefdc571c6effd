use super::id;
use crate::{
    color::Color,
    diag::Session,
    error::Result,
    formats::Exporter,
    geom::{
        flatten_paths,
        recognize::{as_ellipse, as_rectangle},
        Path, Point,
    },
    model::{
        style::{FillPaint, Pattern, Stroke, Style},
        Document, Primitive, Shape,
    },
};
use educe::Educe;
use log::debug;

#[derive(Debug, Clone, PartialEq, Educe)]
#[educe(Default)]
pub struct CgmOptions {
    /// Written to BEGIN METAFILE and METAFILE DESCRIPTION.
    #[educe(Default(expression = "vectrans".to_owned()))]
    pub description: String,
    /// Flattening tolerance of curves in points.
    #[educe(Default = 0.25)]
    pub tolerance: f64,
}

#[derive(Debug, Clone, Default)]
pub struct CgmExporter {
    options: CgmOptions,
}

impl CgmExporter {
    pub fn new(options: CgmOptions) -> Self {
        Self { options }
    }
}

/// Longest parameter list of a short form header.
const SHORT_LIMIT: usize = 30;
/// Longest partition of a long form element, kept even.
const PARTITION: usize = 0x7ffe;

/// Parameter list in the default precisions: 16 bit integers and
/// indexes, fixed 16.16 reals and VDC, 8 bit direct colour.
#[derive(Debug, Default)]
struct Params(Vec<u8>);

impl Params {
    fn int(mut self, v: i16) -> Self {
        self.0.extend_from_slice(&v.to_be_bytes());
        self
    }

    fn fixed(mut self, v: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let scaled = (v * 65536.0)
            .round()
            .clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        self.0.extend_from_slice(&scaled.to_be_bytes());
        self
    }

    fn float(mut self, v: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        self.0.extend_from_slice(&(v as f32).to_be_bytes());
        self
    }

    fn point(self, p: Point) -> Self {
        self.fixed(p.x).fixed(p.y)
    }

    fn colour(mut self, rgb: [f64; 3]) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        self.0
            .extend(rgb.map(|v| (v * 255.0).round().clamp(0.0, 255.0) as u8));
        self
    }

    /// Latin-1 string, other characters become `?`.
    fn string(mut self, s: &str) -> Self {
        let bytes: Vec<u8> = s
            .chars()
            .map(|c| u8::try_from(c).unwrap_or(b'?'))
            .collect();
        let len = bytes.len().min(0x7fff);
        match u8::try_from(len) {
            Ok(n) if n < 255 => self.0.push(n),
            _ => {
                self.0.push(255);
                #[allow(clippy::cast_possible_truncation)]
                self.0.extend_from_slice(&(len as u16).to_be_bytes());
            }
        }
        self.0.extend_from_slice(&bytes[..len]);
        self
    }
}

/// Binary encoder of the element stream.
#[derive(Debug, Default)]
struct Encoder {
    out: Vec<u8>,
}

impl Encoder {
    fn element(&mut self, id: u16, params: Params) {
        let data = params.0;
        if data.len() <= SHORT_LIMIT {
            #[allow(clippy::cast_possible_truncation)]
            self.out
                .extend_from_slice(&(id | data.len() as u16).to_be_bytes());
            self.out.extend_from_slice(&data);
        } else {
            self.out.extend_from_slice(&(id | 31).to_be_bytes());
            let mut chunks = data.chunks(PARTITION).peekable();
            while let Some(chunk) = chunks.next() {
                let more = if chunks.peek().is_some() { 0x8000 } else { 0 };
                #[allow(clippy::cast_possible_truncation)]
                self.out
                    .extend_from_slice(&(more | chunk.len() as u16).to_be_bytes());
                self.out.extend_from_slice(chunk);
            }
        }
        if data.len() % 2 == 1 {
            self.out.push(0);
        }
    }

    fn bare(&mut self, id: u16) {
        self.element(id, Params::default());
    }
}

struct PrimitiveWriter<'e, 's, 'b> {
    enc: &'e mut Encoder,
    session: &'s mut Session<'b>,
    tolerance: f64,
}

impl PrimitiveWriter<'_, '_, '_> {
    fn rgb(&self, c: &Color) -> [f64; 3] {
        self.session.cms.to_display_rgb(c)
    }

    fn fill_attrs(&mut self, style: &Style) {
        let (interior, colour) = match style.fill.as_ref().map(|f| &f.paint) {
            None => (0, None),
            Some(FillPaint::Pattern(Pattern::Hatch { index, color, .. })) => {
                let index = i16::try_from(*index).unwrap_or(1);
                self.enc.element(id::HATCH_INDEX, Params::default().int(index));
                (3, Some(color))
            }
            Some(_) => (1, style.fill.as_ref().and_then(|f| f.main_color())),
        };
        // interior style 4 is empty, no boundary drawn in the fill colour
        let interior = if interior == 0 { 4 } else { interior };
        self.enc
            .element(id::INTERIOR_STYLE, Params::default().int(interior));
        if let Some(c) = colour {
            let rgb = self.rgb(c);
            self.enc.element(id::FILL_COLOUR, Params::default().colour(rgb));
        }
        match &style.stroke {
            Some(s) => {
                self.enc.element(id::EDGE_VISIBILITY, Params::default().int(1));
                self.enc
                    .element(id::EDGE_TYPE, Params::default().int(line_type(s)));
                self.enc.element(id::EDGE_WIDTH, Params::default().fixed(s.width));
                let rgb = self.rgb(&s.color);
                self.enc.element(id::EDGE_COLOUR, Params::default().colour(rgb));
            }
            None => self.enc.element(id::EDGE_VISIBILITY, Params::default().int(0)),
        }
    }

    fn line_attrs(&mut self, stroke: &Stroke) {
        self.enc
            .element(id::LINE_TYPE, Params::default().int(line_type(stroke)));
        self.enc
            .element(id::LINE_WIDTH, Params::default().fixed(stroke.width));
        let rgb = self.rgb(&stroke.color);
        self.enc.element(id::LINE_COLOUR, Params::default().colour(rgb));
    }

    fn primitive(&mut self, p: &Primitive) {
        match &p.shape {
            Shape::Pixmap(_) => {
                self.session.warn("cgm export: pixmap skipped");
                return;
            }
            Shape::Text(text) => {
                self.text(p, text.anchor, &text.text);
                return;
            }
            _ => {}
        }
        let paths = p.to_paths();
        if paths.is_empty() {
            return;
        }
        let closed = paths.iter().all(|path| path.closed);
        if closed {
            self.fill_attrs(&p.style);
            if let Some(bbox) = as_rectangle(&paths) {
                self.enc.element(
                    id::RECTANGLE,
                    Params::default().point(bbox.min).point(bbox.max),
                );
            } else if let Some(t) = as_ellipse(&paths) {
                let params = Params::default()
                    .point(t.transform_point(Point::new(0.5, 0.5)))
                    .point(t.transform_point(Point::new(1.0, 0.5)))
                    .point(t.transform_point(Point::new(0.5, 1.0)));
                self.enc.element(id::ELLIPSE, params);
            } else {
                self.polygons(&paths);
            }
        } else {
            let stroke = p.style.stroke.clone().unwrap_or_default();
            self.line_attrs(&stroke);
            for path in flatten_paths(&paths, self.tolerance) {
                let params = path_points(&path)
                    .fold(Params::default(), |params, pt| params.point(pt));
                self.enc.element(id::POLYLINE, params);
            }
        }
    }

    fn polygons(&mut self, paths: &[Path]) {
        let flat = flatten_paths(paths, self.tolerance);
        if let [path] = &flat[..] {
            let params = path_points(path).fold(Params::default(), |params, pt| params.point(pt));
            self.enc.element(id::POLYGON, params);
            return;
        }
        let mut params = Params::default();
        for path in &flat {
            let points: Vec<Point> = path_points(path).collect();
            for (i, pt) in points.iter().enumerate() {
                // 3 closes the polygon and draws the closing edge
                let flag = if i + 1 == points.len() { 3 } else { 1 };
                params = params.point(*pt).int(flag);
            }
        }
        self.enc.element(id::POLYGON_SET, params);
    }

    fn text(&mut self, p: &Primitive, anchor: Point, text: &str) {
        let Some(style) = &p.style.text else {
            debug!("cgm export: text without text style");
            return;
        };
        let rgb = self.rgb(&style.color);
        self.enc.element(id::TEXT_COLOUR, Params::default().colour(rgb));
        self.enc
            .element(id::CHARACTER_HEIGHT, Params::default().fixed(style.font_size));
        let at = p.trafo.transform_point(anchor);
        // final flag 1
        self.enc
            .element(id::TEXT, Params::default().point(at).int(1).string(text));
    }
}

/// Points of a flattened path, without repeating the start of a closed one.
fn path_points(path: &Path) -> impl Iterator<Item = Point> + '_ {
    let skip_last = path.closed && path.end_point() == path.start;
    let n = path.segments.len() + 1 - usize::from(skip_last);
    path.points().take(n)
}

/// 1 solid, 2 dash.
fn line_type(stroke: &Stroke) -> i16 {
    if stroke.dash.is_empty() {
        1
    } else {
        2
    }
}

impl Exporter for CgmExporter {
    fn export(&self, doc: &Document, session: &mut Session) -> Result<Vec<u8>> {
        let mut enc = Encoder::default();
        let description = &self.options.description;
        enc.element(id::BEGIN_METAFILE, Params::default().string(description));
        enc.element(id::METAFILE_VERSION, Params::default().int(1));
        enc.element(
            id::METAFILE_DESCRIPTION,
            Params::default().string(description),
        );
        enc.element(id::VDC_TYPE, Params::default().int(1));
        enc.element(id::COLOUR_PRECISION, Params::default().int(8));
        enc.element(
            id::COLOUR_VALUE_EXTENT,
            Params::default().colour([0.0; 3]).colour([1.0; 3]),
        );
        // drawing set
        enc.element(id::METAFILE_ELEMENT_LIST, Params::default().int(1).int(-1).int(1));

        let total = doc.pages().len();
        for (i, page) in doc.pages().iter().enumerate() {
            let size = doc.page_format(*page)?.size;
            let name = format!("Page {}", i + 1);
            enc.element(id::BEGIN_PICTURE, Params::default().string(&name));
            enc.element(
                id::SCALING_MODE,
                Params::default().int(1).float(25.4 / 72.0),
            );
            enc.element(id::COLOUR_SELECTION_MODE, Params::default().int(1));
            enc.element(id::LINE_WIDTH_MODE, Params::default().int(0));
            enc.element(id::EDGE_WIDTH_MODE, Params::default().int(0));
            let (w, h) = (size.width / 2.0, size.height / 2.0);
            enc.element(
                id::VDC_EXTENT,
                Params::default()
                    .point(Point::new(-w, -h))
                    .point(Point::new(w, h)),
            );
            enc.bare(id::BEGIN_PICTURE_BODY);

            let mut writer = PrimitiveWriter {
                enc: &mut enc,
                session: &mut *session,
                tolerance: self.options.tolerance,
            };
            for (_, p) in doc.primitives(*page)? {
                writer.primitive(p);
            }
            enc.bare(id::END_PICTURE);
            session.progress.report(i + 1, total);
        }
        enc.bare(id::END_METAFILE);
        Ok(enc.out)
    }
}
