use super::{
    function,
    gdi::{colorref, fill_rule, Brush, Font, GdiObject, ObjectTable, Pen, PenStyle},
    parser::{parse, Metafile, Record},
};
use crate::{
    color::Color,
    diag::Session,
    error::{ConvertError, Result},
    formats::{new_document, reader::RecordReader, ImportDefaults, Importer},
    geom::{invert_trafo, point_angle, trafo_scale, ArcType, Path, Point, Size, Trafo, Vector},
    model::{
        ellipse_trafo,
        style::{Fill, FillPaint, FillRule, Pattern, Stroke, StrokePlacement, Style, TextAlign,
            TextStyle},
        Circle, Curve, DocOrigin, Document, NodeId, PageFormat, Pixmap, Primitive, Rectangle,
        Shape, Text,
    },
};
use bitflags::bitflags;
use log::{debug, info};

/// Logical units per inch of a metafile without placeable header.
const PLAIN_UNITS_PER_INCH: f64 = 1440.0;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextOutOptions: u16 {
        const OPAQUE = 0x0002;
        const CLIPPED = 0x0004;
        const GLYPH_INDEX = 0x0010;
        const RTL_READING = 0x0080;
        const NUMERICS_LOCAL = 0x0400;
        const NUMERICS_LATIN = 0x0800;
        const PDY = 0x2000;
    }
}

pub struct WmfImporter {
    defaults: ImportDefaults,
}

impl WmfImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

/// Window and viewport of a device context. Logical coordinates go
/// through the window into the viewport, device coordinates then map onto
/// the page.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mapping {
    window_org: Point,
    window_ext: Vector,
    viewport_org: Point,
    viewport_ext: Vector,
}

impl Mapping {
    fn logical_to_device(&self) -> Trafo {
        let ratio = |v: f64, w: f64| if w == 0.0 { 1.0 } else { v / w };
        Trafo::translation(-self.window_org.x, -self.window_org.y)
            .then_scale(
                ratio(self.viewport_ext.x, self.window_ext.x),
                ratio(self.viewport_ext.y, self.window_ext.y),
            )
            .then_translate(self.viewport_org.to_vector())
    }
}

/// Drawing state saved by SaveDC.
#[derive(Debug, Clone, PartialEq)]
struct DeviceContext {
    pen: Pen,
    brush: Brush,
    font: Font,
    text_color: Color,
    bk_color: Color,
    opaque_bk: bool,
    text_align: u16,
    fill_rule: FillRule,
    current: Point,
    mapping: Mapping,
}

/// `TA_UPDATECP`.
const UPDATE_CP: u16 = 0x0001;

impl DeviceContext {
    fn new(mapping: Mapping) -> Self {
        Self {
            pen: Pen::default(),
            brush: Brush::default(),
            font: Font::default(),
            text_color: Color::rgb8(0, 0, 0),
            bk_color: Color::rgb8(255, 255, 255),
            opaque_bk: true,
            text_align: 0,
            fill_rule: FillRule::EvenOdd,
            current: Point::origin(),
            mapping,
        }
    }
}

impl Importer for WmfImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let metafile = parse(data)?;
        let (factor, device, origin) = match &metafile.placeable {
            Some(p) => {
                let inch = if p.inch == 0 {
                    PLAIN_UNITS_PER_INCH
                } else {
                    f64::from(p.inch)
                };
                let size = Size::new(
                    f64::from(p.right) - f64::from(p.left),
                    f64::from(p.bottom) - f64::from(p.top),
                );
                (
                    72.0 / inch,
                    Some(size),
                    Point::new(f64::from(p.left), f64::from(p.top)),
                )
            }
            None => (72.0 / PLAIN_UNITS_PER_INCH, None, Point::origin()),
        };
        let format = match device {
            Some(size) => {
                PageFormat::custom(size.width.abs() * factor, size.height.abs() * factor)
            }
            None => self.defaults.page_format.clone(),
        };
        let (doc, page, layer) = new_document(format.clone(), DocOrigin::UpperLeft)?;
        // before any SetWindowExt the page is the device
        let device = device.unwrap_or(Size::new(
            format.size.width / factor,
            format.size.height / factor,
        ));
        let mapping = Mapping {
            window_org: origin,
            window_ext: device.to_vector(),
            viewport_org: Point::origin(),
            viewport_ext: device.to_vector(),
        };
        let mut t = Translator {
            defaults: &self.defaults,
            doc,
            session,
            page,
            layer,
            factor,
            device,
            page_from_window: metafile.placeable.is_none(),
            objects: ObjectTable::default(),
            dc: DeviceContext::new(mapping),
            saved: vec![],
            trafo: Trafo::identity(),
        };
        t.update_trafo();
        t.records(&metafile)?;
        Ok(t.doc)
    }
}

struct Translator<'d, 's, 'b> {
    defaults: &'d ImportDefaults,
    doc: Document,
    session: &'s mut Session<'b>,
    page: NodeId,
    layer: NodeId,
    /// Points per logical unit of the metafile.
    factor: f64,
    /// Device extent, its center is the page center.
    device: Size,
    /// Plain metafiles take the page from the first SetWindowExt.
    page_from_window: bool,
    objects: ObjectTable,
    dc: DeviceContext,
    saved: Vec<DeviceContext>,
    /// Logical coordinates to page points, follows `dc.mapping`.
    trafo: Trafo,
}

fn point(r: &mut RecordReader) -> Result<Point> {
    let x = r.le_i16()?;
    let y = r.le_i16()?;
    Ok(Point::new(f64::from(x), f64::from(y)))
}

/// Many records store y before x.
fn point_yx(r: &mut RecordReader) -> Result<Point> {
    let y = r.le_i16()?;
    let x = r.le_i16()?;
    Ok(Point::new(f64::from(x), f64::from(y)))
}

fn points(r: &mut RecordReader, n: i16) -> Result<Vec<Point>> {
    let n = usize::try_from(n).map_err(|_| r.decode_error(0))?;
    if r.remaining() < 4 * n {
        return Err(r.decode_error(4 * n));
    }
    (0..n).map(|_| point(r)).collect()
}

/// Bottom, right, top, left as stored, normalized to `(min, max)`.
fn bounds(r: &mut RecordReader) -> Result<(Point, Point)> {
    let (bottom, right) = (r.le_i16()?, r.le_i16()?);
    let (top, left) = (r.le_i16()?, r.le_i16()?);
    let (x0, x1) = (left.min(right), left.max(right));
    let (y0, y1) = (top.min(bottom), top.max(bottom));
    Ok((
        Point::new(f64::from(x0), f64::from(y0)),
        Point::new(f64::from(x1), f64::from(y1)),
    ))
}

/// Text bytes as Latin-1 up to the first NUL.
fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|b| **b != 0)
        .map(|b| char::from(*b))
        .collect()
}

impl<'d, 's, 'b> Translator<'d, 's, 'b> {
    fn records(&mut self, metafile: &Metafile) -> Result<()> {
        let total = metafile.records.len();
        for (i, record) in metafile.records.iter().enumerate() {
            let r = self.record(record);
            self.session.absorb(r)?;
            self.session.progress.report(i + 1, total);
        }
        Ok(())
    }

    fn update_trafo(&mut self) {
        let page = self.device * self.factor;
        let to_page = Trafo::scale(self.factor, self.factor).then(&self.doc.origin_trafo(page));
        self.trafo = self.dc.mapping.logical_to_device().then(&to_page);
    }

    /// Logical length along x in points.
    fn length(&self, v: f64) -> f64 {
        (v * self.trafo.m11).abs()
    }

    fn add(&mut self, shape: Shape, trafo: Trafo, style: Style) -> Result<()> {
        self.doc
            .add_primitive(self.layer, Primitive::new(shape, trafo, style))?;
        Ok(())
    }

    fn stroke(&self) -> Option<Stroke> {
        let pen = &self.dc.pen;
        if pen.style == PenStyle::Null {
            return None;
        }
        let width = if pen.width > 0.0 {
            self.length(pen.width)
        } else {
            self.defaults.stroke_width
        };
        Some(Stroke {
            placement: if pen.style == PenStyle::InsideFrame {
                StrokePlacement::Inside
            } else {
                StrokePlacement::Center
            },
            width,
            color: pen.color.clone(),
            dash: pen.style.dash(),
            cap: pen.cap,
            join: pen.join,
            miter_limit: self.defaults.miter_limit,
            ..Default::default()
        })
    }

    fn fill(&self) -> Option<Fill> {
        let paint = match &self.dc.brush {
            Brush::Null => return None,
            Brush::White => FillPaint::Solid(Color::rgb8(255, 255, 255)),
            Brush::Solid(c) => FillPaint::Solid(c.clone()),
            Brush::Hatched { color, hatch } => FillPaint::Pattern(Pattern::Hatch {
                index: i32::from(*hatch),
                color: color.clone(),
                background: self.dc.opaque_bk.then(|| self.dc.bk_color.clone()),
            }),
            Brush::Pattern(dib) => FillPaint::Pattern(Pattern::Image {
                data: dib.clone(),
                format: "dib".to_owned(),
            }),
        };
        Some(Fill {
            rule: self.dc.fill_rule,
            paint,
        })
    }

    fn closed_style(&self) -> Style {
        Style {
            fill: self.fill(),
            stroke: self.stroke(),
            ..Default::default()
        }
    }

    fn open_style(&self) -> Style {
        Style {
            stroke: self.stroke(),
            ..Default::default()
        }
    }

    fn record(&mut self, record: &Record) -> Result<()> {
        let mut r = record.reader();
        match record.function {
            function::SAVE_DC => self.saved.push(self.dc.clone()),
            function::RESTORE_DC => self.restore_dc(r.le_i16()?),
            function::SET_MAP_MODE => {
                let mode = r.le_u16()?;
                debug!("wmf map mode {mode}");
            }
            function::SET_WINDOW_ORG => {
                self.dc.mapping.window_org = point_yx(&mut r)?;
                self.update_trafo();
            }
            function::SET_WINDOW_EXT => {
                let ext = point_yx(&mut r)?.to_vector();
                self.set_window_ext(ext)?;
            }
            function::SET_VIEWPORT_ORG => {
                self.dc.mapping.viewport_org = point_yx(&mut r)?;
                self.update_trafo();
            }
            function::SET_VIEWPORT_EXT => {
                self.dc.mapping.viewport_ext = point_yx(&mut r)?.to_vector();
                self.update_trafo();
            }
            function::OFFSET_WINDOW_ORG => {
                self.dc.mapping.window_org += point_yx(&mut r)?.to_vector();
                self.update_trafo();
            }
            function::OFFSET_VIEWPORT_ORG => {
                self.dc.mapping.viewport_org += point_yx(&mut r)?.to_vector();
                self.update_trafo();
            }
            function::SET_POLY_FILL_MODE => self.dc.fill_rule = fill_rule(r.le_u16()?),
            function::SET_BK_MODE => self.dc.opaque_bk = r.le_u16()? == 2,
            function::SET_BK_COLOR => self.dc.bk_color = colorref(&mut r)?,
            function::SET_TEXT_COLOR => self.dc.text_color = colorref(&mut r)?,
            function::SET_TEXT_ALIGN => self.dc.text_align = r.le_u16()?,

            function::CREATE_PEN_INDIRECT => {
                self.objects.add(GdiObject::Pen(Pen::read(&mut r)?));
            }
            function::CREATE_BRUSH_INDIRECT => {
                self.objects.add(GdiObject::Brush(Brush::read(&mut r)?));
            }
            function::DIB_CREATE_PATTERN_BRUSH => {
                self.objects
                    .add(GdiObject::Brush(Brush::read_dib_pattern(&mut r)?));
            }
            function::CREATE_PATTERN_BRUSH => {
                // the bitmap form is obsolete, keep the slot in use
                self.objects.add(GdiObject::Brush(Brush::Solid(Color::rgb8(0, 0, 0))));
            }
            function::CREATE_FONT_INDIRECT => {
                self.objects.add(GdiObject::Font(Font::read(&mut r)?));
            }
            function::CREATE_PALETTE => {
                self.objects.add(GdiObject::Palette);
            }
            function::CREATE_REGION => {
                self.objects.add(GdiObject::Region);
            }
            function::SELECT_OBJECT => self.select_object(r.le_u16()?),
            function::DELETE_OBJECT => {
                let handle = r.le_u16()?;
                if !self.objects.delete(usize::from(handle)) {
                    debug!("wmf delete of empty handle {handle}");
                }
            }

            function::MOVE_TO => self.dc.current = point_yx(&mut r)?,
            function::LINE_TO => {
                let p = point_yx(&mut r)?;
                let mut path = Path::new(self.dc.current);
                path.line_to(p);
                self.dc.current = p;
                self.add(Shape::Curve(Curve { paths: vec![path] }), self.trafo, self.open_style())?;
            }
            function::POLYLINE | function::POLYGON => {
                let n = r.le_i16()?;
                let points = points(&mut r, n)?;
                let closed = record.function == function::POLYGON;
                let Some(path) = Path::from_points(&points, closed) else {
                    return Ok(());
                };
                let style = if closed {
                    self.closed_style()
                } else {
                    self.open_style()
                };
                self.add(Shape::Curve(Curve { paths: vec![path] }), self.trafo, style)?;
            }
            function::POLY_POLYGON => {
                let n = r.le_i16()?;
                let counts = (0..n.max(0))
                    .map(|_| r.le_i16())
                    .collect::<Result<Vec<_>>>()?;
                let mut paths = vec![];
                for count in counts {
                    paths.extend(Path::from_points(&points(&mut r, count)?, true));
                }
                if !paths.is_empty() {
                    self.add(Shape::Curve(Curve { paths }), self.trafo, self.closed_style())?;
                }
            }
            function::RECTANGLE => {
                let (min, max) = bounds(&mut r)?;
                let rect = Rectangle::new(min.x, min.y, max.x - min.x, max.y - min.y);
                self.add(Shape::Rectangle(rect), self.trafo, self.closed_style())?;
            }
            function::ROUND_RECT => {
                let corner_h = f64::from(r.le_i16()?);
                let corner_w = f64::from(r.le_i16()?);
                let (min, max) = bounds(&mut r)?;
                let radius = corner_w.abs().min(corner_h.abs()) / 2.0;
                let rect = Rectangle::new(min.x, min.y, max.x - min.x, max.y - min.y)
                    .with_radii([radius; 4]);
                self.add(Shape::Rectangle(rect), self.trafo, self.closed_style())?;
            }
            function::ELLIPSE => {
                let (min, max) = bounds(&mut r)?;
                let center = min.lerp(max, 0.5);
                let local = ellipse_trafo(center, (max.x - min.x) / 2.0, (max.y - min.y) / 2.0);
                self.add(
                    Shape::Circle(Circle::full()),
                    local.then(&self.trafo),
                    self.closed_style(),
                )?;
            }
            function::ARC | function::PIE | function::CHORD => self.arc(record.function, &mut r)?,
            function::TEXT_OUT => {
                let len = r.le_i16()?;
                let len = usize::try_from(len).map_err(|_| r.decode_error(0))?;
                let text = latin1(r.bytes(len)?);
                r.align2();
                let at = point_yx(&mut r)?;
                self.text(at, text)?;
            }
            function::EXT_TEXT_OUT => {
                let at = point_yx(&mut r)?;
                let len = usize::try_from(r.le_i16()?).map_err(|_| r.decode_error(0))?;
                let options = TextOutOptions::from_bits_truncate(r.le_u16()?);
                if options.intersects(TextOutOptions::OPAQUE | TextOutOptions::CLIPPED) {
                    r.skip(8)?;
                }
                let text = latin1(r.bytes(len)?);
                if options.contains(TextOutOptions::GLYPH_INDEX) {
                    self.session
                        .warn(ConvertError::unsupported("wmf ExtTextOut with glyph indexes"));
                } else {
                    self.text(at, text)?;
                }
            }
            function::STRETCH_DIB => {
                let _rop = r.le_u32()?;
                let _usage = r.le_u16()?;
                let _src = (r.le_i16()?, r.le_i16()?, r.le_i16()?, r.le_i16()?);
                self.pixmap(&mut r)?;
            }
            function::DIB_STRETCH_BLT => {
                let _rop = r.le_u32()?;
                let _src = (r.le_i16()?, r.le_i16()?, r.le_i16()?, r.le_i16()?);
                self.pixmap(&mut r)?;
            }
            function::ESCAPE => {
                let code = r.le_u16()?;
                debug!("wmf escape {code}");
            }
            function::SET_ROP2
            | function::SET_STRETCH_BLT_MODE
            | function::SELECT_PALETTE
            | function::REALIZE_PALETTE
            | function::SELECT_CLIP_REGION
            | function::INTERSECT_CLIP_RECT => debug!("wmf {} ignored", record.name()),
            _ => debug!("skip wmf {} of {} bytes", record.name(), record.params.len()),
        }
        Ok(())
    }

    fn set_window_ext(&mut self, ext: Vector) -> Result<()> {
        self.dc.mapping.window_ext = ext;
        if self.page_from_window && ext.x != 0.0 && ext.y != 0.0 {
            self.page_from_window = false;
            self.device = Size::new(ext.x.abs(), ext.y.abs());
            self.dc.mapping.viewport_ext = Vector::new(ext.x.abs(), ext.y.abs());
            let format = PageFormat::custom(
                self.device.width * self.factor,
                self.device.height * self.factor,
            );
            info!("wmf page {format:?} from window extent");
            self.doc.page_format = format.clone();
            self.doc.set_page_format(self.page, format)?;
        }
        self.update_trafo();
        Ok(())
    }

    /// Negative values restore relative to the top of the stack, positive
    /// values name a saved instance counted from 1.
    fn restore_dc(&mut self, n: i16) {
        let depth = self.saved.len();
        let keep = if n < 0 {
            depth.checked_sub(usize::from(n.unsigned_abs()))
        } else {
            usize::try_from(n).ok().and_then(|n| n.checked_sub(1))
        };
        match keep {
            Some(keep) if keep < depth => {
                self.saved.truncate(keep + 1);
                if let Some(dc) = self.saved.pop() {
                    self.dc = dc;
                }
                self.update_trafo();
            }
            _ => self
                .session
                .warn(format!("wmf RestoreDC {n} with {depth} saved contexts")),
        }
    }

    fn select_object(&mut self, handle: u16) {
        match self.objects.get(usize::from(handle)) {
            Some(GdiObject::Pen(pen)) => self.dc.pen = pen.clone(),
            Some(GdiObject::Brush(brush)) => self.dc.brush = brush.clone(),
            Some(GdiObject::Font(font)) => self.dc.font = font.clone(),
            Some(GdiObject::Palette | GdiObject::Region) => {}
            None => self
                .session
                .warn(format!("wmf SelectObject of empty handle {handle}")),
        }
    }

    fn arc(&mut self, function: u16, r: &mut RecordReader) -> Result<()> {
        let end = point_yx(r)?;
        let start = point_yx(r)?;
        let (min, max) = bounds(r)?;
        let local = ellipse_trafo(
            min.lerp(max, 0.5),
            (max.x - min.x) / 2.0,
            (max.y - min.y) / 2.0,
        );
        let inverse = invert_trafo(&local)?;
        let unit_center = Point::new(0.5, 0.5);
        let angle = |p: Point| point_angle(inverse.transform_point(p), unit_center);
        // GDI draws counter-clockwise on a y down device, a flipping
        // mapping turns that around
        let (a1, a2) = if self.trafo.determinant() < 0.0 {
            (angle(end), angle(start))
        } else {
            (angle(start), angle(end))
        };
        let (arc_type, style) = match function {
            function::PIE => (ArcType::PieSlice, self.closed_style()),
            function::CHORD => (ArcType::Chord, self.closed_style()),
            _ => (ArcType::Arc, self.open_style()),
        };
        self.add(
            Shape::Circle(Circle::arc(a1, a2, arc_type)),
            local.then(&self.trafo),
            style,
        )
    }

    fn text(&mut self, at: Point, text: String) -> Result<()> {
        let at = if self.dc.text_align & UPDATE_CP != 0 {
            self.dc.current
        } else {
            at
        };
        if text.is_empty() {
            return Ok(());
        }
        let font = &self.dc.font;
        let align = match self.dc.text_align & 0x0006 {
            6 => TextAlign::Center,
            2 => TextAlign::Right,
            _ => TextAlign::Left,
        };
        let size = (font.height * self.trafo.m22).abs();
        let size = if size > 0.0 { size } else { Font::default().height };
        let anchor = self.trafo.transform_point(at);
        let trafo = Trafo::rotation(euclid::Angle::degrees(font.escapement / 10.0))
            .then_translate(anchor.to_vector());
        let style = Style {
            fill: Some(Fill::solid(self.dc.text_color.clone())),
            text: Some(TextStyle {
                font_family: font.face.clone(),
                font_size: size,
                align,
                bold: font.bold,
                italic: font.italic,
                color: self.dc.text_color.clone(),
            }),
            ..Default::default()
        };
        let shape = Shape::Text(Text {
            anchor: Point::origin(),
            text,
            width: None,
        });
        self.add(shape, trafo, style)
    }

    /// Destination rectangle then a DIB with its info header.
    fn pixmap(&mut self, r: &mut RecordReader) -> Result<()> {
        let dest_h = f64::from(r.le_i16()?);
        let dest_w = f64::from(r.le_i16()?);
        let origin = point_yx(r)?;
        let dib = r.bytes(r.remaining())?;
        let mut header = RecordReader::new(dib, 0, 0);
        let header_size = header.le_u32()?;
        let size = if header_size == 12 {
            (u32::from(header.le_u16()?), u32::from(header.le_u16()?))
        } else {
            (header.le_i32()?.unsigned_abs(), header.le_i32()?.unsigned_abs())
        };
        let local = Trafo::scale(dest_w, dest_h).then_translate(origin.to_vector());
        let scale = trafo_scale(&self.trafo);
        debug!("wmf bitmap {size:?} at scale {scale}");
        self.add(
            Shape::Pixmap(Pixmap {
                data: dib.to_vec(),
                format: "dib".to_owned(),
                size,
            }),
            local.then(&self.trafo),
            Style::default(),
        )
    }
}
