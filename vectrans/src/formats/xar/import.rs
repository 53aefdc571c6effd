use super::{
    parser::{build_tree, read_records, Record},
    tag, MILLIPOINTS,
};
use crate::{
    color::Color,
    diag::Session,
    error::{ConvertError, Result},
    formats::{reader::RecordReader, ImportDefaults, Importer},
    geom::{multiply_trafo, Path, Point, Trafo, Vector},
    model::{
        style::{Cap, Fill, FillRule, Join, Stroke, Style},
        DocOrigin, Document, Layer, NodeId, NodeKind, PageFormat, Primitive,
    },
};
use ahash::{HashMap, HashMapExt};
use educe::Educe;
use log::debug;

pub struct XarImporter {
    defaults: ImportDefaults,
}

impl XarImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

impl Importer for XarImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let records = build_tree(read_records(data)?)?;
        let format = match find(&records, tag::SPREAD_INFORMATION) {
            Some(rec) => session.absorb(spread_format(rec))?.flatten(),
            None => None,
        };
        let mut doc = Document::new();
        doc.origin = DocOrigin::LowerLeft;
        doc.page_format = format.unwrap_or_else(|| self.defaults.page_format.clone());
        let page = doc.add_page(None);
        let trafo = multiply_trafo(
            &Trafo::scale(1.0 / MILLIPOINTS, 1.0 / MILLIPOINTS),
            &doc.origin_trafo(doc.page_format.size),
        );

        let mut t = Translator {
            doc,
            session,
            page,
            trafo,
            colours: HashMap::new(),
            default_layer: None,
        };
        t.records(&records, None, &XarStyle::default())?;
        if t.doc.children(page)?.is_empty() {
            t.doc.add_layer(page, "Layer 1")?;
        }
        Ok(t.doc)
    }
}

/// First record with `tag` in pre-order.
fn find(records: &[Record], tag: u32) -> Option<&Record> {
    let mut stack: Vec<&Record> = records.iter().rev().collect();
    while let Some(rec) = stack.pop() {
        if rec.tag == tag {
            return Some(rec);
        }
        stack.extend(rec.children.iter().rev());
    }
    None
}

fn millipoint(r: &mut RecordReader) -> Result<f64> {
    Ok(f64::from(r.le_i32()?) / MILLIPOINTS)
}

fn spread_format(rec: &Record) -> Result<Option<PageFormat>> {
    let mut r = rec.reader();
    let width = millipoint(&mut r)?;
    let height = millipoint(&mut r)?;
    Ok((width > 0.0 && height > 0.0).then(|| PageFormat::custom(width, height)))
}

/// UTF-16 string up to a NUL unit or the end of the payload.
fn utf16_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|c| *c != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Attributes in effect for the records of one level.
#[derive(Debug, Clone, Educe)]
#[educe(Default)]
struct XarStyle {
    fill: Option<Color>,
    #[educe(Default(expression = Some(Color::black())))]
    line: Option<Color>,
    #[educe(Default(expression = 0.501))]
    line_width: f64,
    rule: FillRule,
    #[educe(Default(expression = Join::Bevel))]
    join: Join,
    cap: Cap,
    #[educe(Default(expression = 4.0))]
    miter_limit: f64,
}

impl XarStyle {
    fn to_style(&self, filled: bool, stroked: bool) -> Style {
        let fill = self
            .fill
            .clone()
            .filter(|_| filled)
            .map(|c| Fill::solid(c).with_rule(self.rule));
        let stroke = self.line.clone().filter(|_| stroked).map(|color| Stroke {
            width: self.line_width,
            color,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            ..Default::default()
        });
        Style {
            fill,
            stroke,
            ..Default::default()
        }
    }
}

const PT_CLOSE_FIGURE: u8 = 0x1;
const PT_LINE_TO: u8 = 0x2;
const PT_BEZIER_TO: u8 = 0x4;
const PT_MOVE_TO: u8 = 0x6;

/// Coordinate of a relative path entry, bytes of x and y interleaved with
/// the most significant first.
fn delta(r: &mut RecordReader) -> Result<Vector> {
    let b = r.bytes(8)?;
    let x = i32::from_be_bytes([b[0], b[2], b[4], b[6]]);
    let y = i32::from_be_bytes([b[1], b[3], b[5], b[7]]);
    Ok(Vector::new(f64::from(x), f64::from(y)))
}

/// Paths of a relative path record in millipoints. Each entry is a verb
/// byte and a coordinate relative to the previous one, a bezier takes
/// three entries.
fn relative_paths(r: &mut RecordReader) -> Result<Vec<Path>> {
    let mut paths = vec![];
    let mut current: Option<Path> = None;
    let mut pos = Point::origin();
    // curve start and the bezier points read so far
    let mut controls: Vec<Point> = vec![];
    while !r.is_empty() {
        let verb = r.u8()?;
        let last = pos;
        pos += delta(r)?;
        match verb & !PT_CLOSE_FIGURE {
            PT_MOVE_TO => {
                paths.extend(current.take());
                controls.clear();
                current = Some(Path::new(pos));
            }
            PT_LINE_TO => current.get_or_insert_with(|| Path::new(last)).line_to(pos),
            PT_BEZIER_TO => {
                if controls.is_empty() {
                    controls.push(last);
                }
                controls.push(pos);
                if let [start, c1, c2, end] = controls[..] {
                    current
                        .get_or_insert_with(|| Path::new(start))
                        .curve_to(c1, c2, end);
                    controls.clear();
                }
            }
            _ => {
                return Err(ConvertError::unsupported(format!(
                    "xar path verb {verb:#x} in record {}",
                    r.record_id()
                )))
            }
        }
        if verb & PT_CLOSE_FIGURE != 0 {
            if let Some(p) = current.as_mut() {
                p.close();
            }
        }
    }
    paths.extend(current);
    paths.retain(|p| !p.segments.is_empty());
    Ok(paths)
}

fn is_attribute(tag: u32) -> bool {
    matches!(
        tag,
        tag::FLAT_FILL
            | tag::LINE_COLOUR
            | tag::LINE_WIDTH
            | tag::START_CAP
            | tag::JOIN_STYLE
            | tag::MITRE_LIMIT
            | tag::WINDING_RULE
            | tag::FLAT_FILL_NONE..=tag::LINE_COLOUR_WHITE
    )
}

struct Translator<'s, 'b> {
    doc: Document,
    session: &'s mut Session<'b>,
    page: NodeId,
    /// Millipoints to page space.
    trafo: Trafo,
    /// Defined colours by record sequence number.
    colours: HashMap<u32, Color>,
    default_layer: Option<NodeId>,
}

impl Translator<'_, '_> {
    fn parent(&mut self, parent: Option<NodeId>) -> Result<NodeId> {
        if let Some(p) = parent.or(self.default_layer) {
            return Ok(p);
        }
        let l = self.doc.add_layer(self.page, "Layer 1")?;
        self.default_layer = Some(l);
        Ok(l)
    }

    fn records(&mut self, list: &[Record], parent: Option<NodeId>, inherited: &XarStyle) -> Result<()> {
        let mut style = inherited.clone();
        for rec in list {
            match rec.tag {
                tag::DOCUMENT | tag::CHAPTER | tag::SPREAD => {
                    self.records(&rec.children, parent, &style)?;
                }
                tag::LAYER => {
                    let layer = self.layer(rec)?;
                    self.records(&rec.children, Some(layer), &style)?;
                }
                tag::GROUP => {
                    let target = self.parent(parent)?;
                    let group = self.doc.create_node(NodeKind::Group);
                    self.records(&rec.children, Some(group), &style)?;
                    if !self.doc.children(group)?.is_empty() {
                        self.doc.append_child(target, group)?;
                    }
                }
                tag::DEFINE_RGB_COLOUR | tag::DEFINE_COMPLEX_COLOUR => {
                    let r = self.define_colour(rec);
                    self.session.absorb(r)?;
                }
                tag::PATH..=tag::PATH_FILLED_STROKED => {
                    self.session
                        .warn(ConvertError::unsupported("xar absolute path record"));
                }
                tag::PATH_RELATIVE..=tag::PATH_RELATIVE_FILLED_STROKED => {
                    let r = self.path(rec, parent, &style);
                    self.session.absorb(r)?;
                }
                t if is_attribute(t) => {
                    let r = self.attribute(rec, &mut style);
                    self.session.absorb(r)?;
                }
                tag::FILE_HEADER
                | tag::END_OF_FILE
                | tag::START_COMPRESSION
                | tag::END_COMPRESSION
                | tag::SPREAD_INFORMATION
                | tag::LAYER_DETAILS => {}
                other => debug!("skip xar record {other} of {} bytes", rec.data.len()),
            }
        }
        Ok(())
    }

    fn layer(&mut self, rec: &Record) -> Result<NodeId> {
        let count = self.doc.children(self.page)?.len();
        let mut layer = Layer::new(format!("Layer {}", count + 1));
        if let Some(details) = rec.children.iter().find(|c| c.tag == tag::LAYER_DETAILS) {
            if let Some((&flags, name)) = details.data.split_first() {
                layer.visible = flags & 0x1 != 0;
                layer.printable = flags & 0x4 != 0;
                let name = utf16_string(name);
                if !name.is_empty() {
                    layer.name = name;
                }
            }
        }
        Ok(self.doc.add_child(self.page, NodeKind::Layer(layer))?)
    }

    fn define_colour(&mut self, rec: &Record) -> Result<()> {
        let mut r = rec.reader();
        let rgb = r.bytes(3)?;
        let mut color = Color::rgb8(rgb[0], rgb[1], rgb[2]);
        if rec.tag == tag::DEFINE_COMPLEX_COLOUR {
            // model, type, entry index, parent, four components
            if r.skip(2 + 4 + 4 + 16).is_ok() {
                let name = utf16_string(r.bytes(r.remaining())?);
                if !name.is_empty() {
                    color = color.with_name(name);
                }
            }
        }
        self.colours.insert(rec.seq, color);
        Ok(())
    }

    /// Colour of a reference, negative values name built-in colours.
    fn colour_ref(&self, value: i32) -> Result<Option<Color>> {
        let named = |name: &str, r: u8, g: u8, b: u8| Some(Color::rgb8(r, g, b).with_name(name));
        Ok(match value {
            -1 => None,
            -2 | -10 => Some(Color::black()),
            -3 => Some(Color::white()),
            -4 => named("red", 255, 0, 0),
            -5 => named("green", 0, 255, 0),
            -6 => named("blue", 0, 0, 255),
            -7 => Some(Color::cmyk(1.0, 0.0, 0.0, 0.0)),
            -8 => Some(Color::cmyk(0.0, 1.0, 0.0, 0.0)),
            -9 => Some(Color::cmyk(0.0, 0.0, 1.0, 0.0)),
            v => {
                let seq = u32::try_from(v).unwrap_or(0);
                let c = self.colours.get(&seq).cloned();
                if c.is_none() {
                    return Err(ConvertError::unsupported(format!(
                        "xar colour reference {v}"
                    )));
                }
                c
            }
        })
    }

    fn attribute(&self, rec: &Record, style: &mut XarStyle) -> Result<()> {
        let mut r = rec.reader();
        match rec.tag {
            tag::FLAT_FILL => style.fill = self.colour_ref(r.le_i32()?)?,
            tag::LINE_COLOUR => style.line = self.colour_ref(r.le_i32()?)?,
            tag::LINE_WIDTH => style.line_width = millipoint(&mut r)?,
            tag::MITRE_LIMIT => style.miter_limit = millipoint(&mut r)?,
            tag::START_CAP => {
                style.cap = match r.u8()? {
                    1 => Cap::Round,
                    2 => Cap::Square,
                    _ => Cap::Butt,
                }
            }
            tag::JOIN_STYLE => {
                style.join = match r.u8()? {
                    0 => Join::Miter,
                    1 => Join::Round,
                    _ => Join::Bevel,
                }
            }
            tag::WINDING_RULE => {
                style.rule = match r.u8()? {
                    2 => FillRule::EvenOdd,
                    _ => FillRule::NonZero,
                }
            }
            tag::FLAT_FILL_NONE => style.fill = None,
            tag::FLAT_FILL_BLACK => style.fill = Some(Color::black()),
            tag::FLAT_FILL_WHITE => style.fill = Some(Color::white()),
            tag::LINE_COLOUR_NONE => style.line = None,
            tag::LINE_COLOUR_BLACK => style.line = Some(Color::black()),
            tag::LINE_COLOUR_WHITE => style.line = Some(Color::white()),
            _ => {}
        }
        Ok(())
    }

    /// Attributes among the path's children apply to the path only.
    fn path(&mut self, rec: &Record, parent: Option<NodeId>, inherited: &XarStyle) -> Result<()> {
        let mut style = inherited.clone();
        for attr in rec.children.iter().filter(|c| is_attribute(c.tag)) {
            let r = self.attribute(attr, &mut style);
            self.session.absorb(r)?;
        }
        let paths = relative_paths(&mut rec.reader())?;
        if paths.is_empty() {
            debug!("empty xar path at {}", rec.offset);
            return Ok(());
        }
        let (filled, stroked) = match rec.tag {
            tag::PATH_RELATIVE_FILLED => (true, false),
            tag::PATH_RELATIVE_STROKED => (false, true),
            tag::PATH_RELATIVE_FILLED_STROKED => (true, true),
            _ => (false, false),
        };
        let parent = self.parent(parent)?;
        self.doc.add_primitive(
            parent,
            Primitive::curve(paths, self.trafo, style.to_style(filled, stroked)),
        )?;
        Ok(())
    }
}
