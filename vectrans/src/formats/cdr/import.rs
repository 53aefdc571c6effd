use super::{
    arg, chunk_reader,
    loda::{self, Loda, ObjectType},
    props::{FillProp, Properties},
    size_value, Version,
};
use crate::{
    diag::Session,
    error::{ConvertError, Result},
    formats::{ImportDefaults, Importer},
    geom::{ArcType, Point, Trafo},
    model::{
        ellipse_trafo,
        style::{Fill, Stroke, Style},
        Circle, Curve, DocOrigin, Document, NodeId, NodeKind, PageFormat, Primitive, Rectangle,
        Shape,
    },
};
use log::{debug, info};
use riff_parser::{Chunk, File, FourCC};

pub struct CdrImporter {
    defaults: ImportDefaults,
}

impl CdrImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

/// First chunk named `name` in depth first order.
fn find_deep<'a>(chunks: &'a [Chunk], name: &FourCC) -> Option<&'a Chunk> {
    chunks
        .iter()
        .find_map(|c| if &c.name() == name { Some(c) } else { c.find_deep(name) })
}

/// Lists named `name`, not looking inside a match.
fn collect_lists<'a>(chunks: &'a [Chunk], name: &FourCC, out: &mut Vec<&'a Chunk>) {
    for c in chunks.iter().filter(|c| c.is_list()) {
        if &c.name() == name {
            out.push(c);
        } else {
            collect_lists(&c.children, name, out);
        }
    }
}

/// Default page size of the `mcfg` chunk.
fn page_format(mcfg: &Chunk, version: Version) -> Result<PageFormat> {
    let at = match version {
        Version::V6 => 28,
        Version::V7 => 0,
        Version::V13 => 12,
        _ => 4,
    };
    let mut r = chunk_reader(mcfg).at(at)?;
    let (w, h) = (size_value(&mut r)?, size_value(&mut r)?);
    if w == 0.0 || h == 0.0 {
        return Err(r.decode_error(8));
    }
    Ok(PageFormat::custom(w.abs(), h.abs()))
}

impl Importer for CdrImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let file = File::open(data)?;
        let version = Version::from_form(file.form_type).ok_or_else(|| {
            ConvertError::structural(
                8,
                u32::from_be_bytes(file.form_type),
                format!("unsupported RIFF form {}", file.form_type_str()),
            )
        })?;
        info!("cdr {} document", file.form_type_str());

        let props = Properties::collect(&file.chunks, version, &mut |e| session.warn(e));
        let mut doc = Document::new();
        doc.origin = DocOrigin::Center;
        if let Some(mcfg) = find_deep(&file.chunks, b"mcfg") {
            if let Some(format) = session.absorb(page_format(mcfg, version))? {
                doc.page_format = format;
            }
        } else {
            doc.page_format = self.defaults.page_format.clone();
        }

        let mut pages = vec![];
        collect_lists(&file.chunks, b"page", &mut pages);
        let mut t = Translator {
            defaults: &self.defaults,
            version,
            props,
            doc,
            session,
        };
        // the first page holds master objects, such as guides
        let total = pages.len().saturating_sub(1);
        for (i, page) in pages.iter().skip(1).enumerate() {
            t.page(page)?;
            t.session.progress.report(i + 1, total);
        }
        if t.doc.pages().is_empty() {
            let page = t.doc.add_page(None);
            t.doc.add_layer(page, "Layer 1")?;
        }
        Ok(t.doc)
    }
}

struct Translator<'d, 's, 'b> {
    defaults: &'d ImportDefaults,
    version: Version,
    props: Properties,
    doc: Document,
    session: &'s mut Session<'b>,
}

impl Translator<'_, '_, '_> {
    fn page(&mut self, chunk: &Chunk) -> Result<()> {
        let page = self.doc.add_page(None);
        let holder = chunk.find(b"gobj").unwrap_or(chunk);
        let layers: Vec<_> = holder.find_all(b"layr").collect();
        if layers.is_empty() {
            self.doc.add_layer(page, "Layer 1")?;
        }
        // stored top-most first
        for (i, layer) in layers.into_iter().rev().enumerate() {
            let name = self.layer_name(layer);
            let name = name.unwrap_or_else(|| format!("Layer {}", i + 1));
            let id = self.doc.add_layer(page, name)?;
            self.children(layer, id)?;
        }
        Ok(())
    }

    fn layer_name(&mut self, layer: &Chunk) -> Option<String> {
        let loda = layer.find(b"lgob")?.find(b"loda")?;
        let version = self.version;
        let name = Loda::parse(loda).and_then(|l| l.name(version));
        self.session
            .absorb(name)
            .ok()
            .flatten()
            .flatten()
            .filter(|n| !n.is_empty())
    }

    fn children(&mut self, list: &Chunk, parent: NodeId) -> Result<()> {
        for c in list.children.iter().rev() {
            match &c.name() {
                b"obj " => {
                    let r = self.object(c, parent);
                    self.session.absorb(r)?;
                }
                b"grp " => {
                    let group = self.doc.create_node(NodeKind::Group);
                    self.children(c, group)?;
                    if self.doc.children(group)?.is_empty() {
                        debug!("cdr empty group at {} dropped", c.offset);
                    } else {
                        self.doc.append_child(parent, group)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn object(&mut self, chunk: &Chunk, parent: NodeId) -> Result<()> {
        let Some(lgob) = chunk.find(b"lgob") else {
            self.session
                .warn(format!("cdr object at offset {} without lgob", chunk.offset));
            return Ok(());
        };
        let Some(data) = lgob.find(b"loda") else {
            self.session
                .warn(format!("cdr object at offset {} without loda", chunk.offset));
            return Ok(());
        };
        let record = Loda::parse(data)?;
        let Some(kind) = record.kind() else {
            debug!("cdr object type {:#x} skipped", record.object_type);
            return Ok(());
        };
        let trafo = match lgob.find(b"trfl").and_then(|l| l.find(b"trfd")) {
            Some(trfd) => loda::trafo(trfd, self.version)?,
            None => Trafo::identity(),
        };

        let (shape, local) = match kind {
            ObjectType::Rectangle => {
                let (w, h, radii) = record.rectangle(self.version)?;
                let rect = Rectangle::new(w.min(0.0), h.min(0.0), w.abs(), h.abs())
                    .with_radii(radii.map(f64::abs));
                (Shape::Rectangle(rect), Trafo::identity())
            }
            ObjectType::Ellipse => {
                let (w, h, start, end, pie) = record.ellipse()?;
                let circle = if start == end {
                    Circle::full()
                } else {
                    let arc_type = if pie { ArcType::PieSlice } else { ArcType::Arc };
                    Circle::arc(start, end, arc_type)
                };
                let local = ellipse_trafo(Point::new(w / 2.0, h / 2.0), w.abs() / 2.0, h.abs() / 2.0);
                (Shape::Circle(circle), local)
            }
            ObjectType::Curve | ObjectType::Polygon => {
                let paths = record.paths()?;
                if paths.is_empty() {
                    debug!("cdr {kind} without points");
                    return Ok(());
                }
                (Shape::Curve(Curve { paths }), Trafo::identity())
            }
            ObjectType::Text | ObjectType::Image => {
                return Err(ConvertError::unsupported(format!("cdr {kind} object")));
            }
        };
        let style = self.style(&record)?;
        self.doc
            .add_primitive(parent, Primitive::new(shape, local.then(&trafo), style))?;
        Ok(())
    }

    fn style(&mut self, record: &Loda) -> Result<Style> {
        let fill_id = record.property_id(arg::FILD)?;
        let outline_id = record.property_id(arg::OUTL)?;
        let style_id = record.property_id(arg::STLT)?;
        if style_id.is_some() && fill_id.is_none() && outline_id.is_none() {
            return Ok(Style::stroked(self.defaults.stroke()));
        }

        let fill = match fill_id.and_then(|id| self.props.fills.get(&id)) {
            Some(FillProp::Solid(c)) => Some(Fill::solid(c.clone())),
            Some(FillProp::Unsupported(kind)) => {
                self.session
                    .warn(ConvertError::unsupported(format!("cdr fill type {kind}")));
                None
            }
            Some(FillProp::None) | None => None,
        };
        let stroke = outline_id
            .and_then(|id| self.props.outlines.get(&id))
            .cloned()
            .flatten()
            .map(|s| Stroke {
                miter_limit: self.defaults.miter_limit,
                ..s
            });
        Ok(Style {
            fill,
            stroke,
            ..Default::default()
        })
    }
}
