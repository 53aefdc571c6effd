use super::{
    path_data::{number_list, parse_path_data, parse_points},
    style::{parse_length, Paint, SvgStyle, PT_PER_PX},
    transform::parse_transform,
    xml::{parse, Element, MAX_DEPTH, TEXT_NODE},
};
use crate::{
    color::Color,
    diag::Session,
    error::{ConvertError, Result},
    formats::{ImportDefaults, Importer},
    geom::{
        apply_trafo_to_paths, invert_trafo, multiply_trafo, paths_bbox, trafo_scale, Bbox, Path,
        Point, Trafo, Vector,
    },
    model::{
        ellipse_trafo,
        style::{Fill, FillPaint, Gradient, GradientKind, Stroke, Style, TextStyle},
        Circle, Curve, DocOrigin, Document, NodeId, NodeKind, PageFormat, Primitive, Rectangle,
        Shape, Text,
    },
};
use ahash::{HashMap, HashMapExt};
use itertools::Itertools;
use log::{debug, info};

pub struct SvgImporter {
    defaults: ImportDefaults,
}

impl SvgImporter {
    pub fn new(defaults: ImportDefaults) -> Self {
        Self { defaults }
    }
}

impl Importer for SvgImporter {
    fn import(&self, data: &[u8], session: &mut Session) -> Result<Document> {
        let root = parse(data)?;
        let mut doc = Document::new();
        doc.origin = DocOrigin::UpperLeft;
        let (format, viewport) = page(&root, &self.defaults);
        let page_trafo = multiply_trafo(&viewport, &doc.origin_trafo(format.size));
        doc.page_format = format;
        let page = doc.add_page(None);

        let mut t = Translator {
            defs: Definitions::collect(&root),
            doc,
            session,
            gradients: HashMap::new(),
            use_stack: vec![],
            depth: 0,
            page,
            default_layer: None,
        };
        let ctx = Context {
            ctm: page_trafo,
            style: SvgStyle::default().derive(&root),
        };
        let total = root.children.len();
        for (i, child) in root.children.iter().enumerate() {
            if is_layer(child) {
                let name = child
                    .attr("inkscape:label")
                    .or_else(|| child.id())
                    .unwrap_or("Layer");
                let layer = t.doc.add_layer(page, name)?;
                let ctx = ctx.child(child);
                for c in &child.children {
                    t.element(c, layer, &ctx)?;
                }
            } else {
                let layer = t.default_layer()?;
                t.element(child, layer, &ctx)?;
            }
            t.session.progress.report(i + 1, total);
        }
        if t.doc.children(page)?.is_empty() {
            t.default_layer()?;
        }
        Ok(t.doc)
    }
}

/// Id named by a `clip-path` attribute or style property.
fn clip_reference(el: &Element) -> Option<&str> {
    let from_style = el.attr("style").and_then(|s| {
        s.split(';')
            .filter_map(|d| d.split_once(':'))
            .find(|(k, _)| k.trim() == "clip-path")
            .map(|(_, v)| v)
    });
    let value = from_style.or_else(|| el.attr("clip-path"))?.trim();
    let id = value.strip_prefix("url(")?.strip_suffix(')')?.trim();
    let id = id.trim_matches(|c| c == '\'' || c == '"').trim_start_matches('#');
    (!id.is_empty()).then_some(id)
}

fn is_layer(el: &Element) -> bool {
    el.name == "g" && el.attr("inkscape:groupmode") == Some("layer")
}

/// Page format and the map from root user units to page points with the
/// origin at the upper-left corner, y down.
fn page(root: &Element, defaults: &ImportDefaults) -> (PageFormat, Trafo) {
    let view_box = root
        .attr("viewBox")
        .map(number_list)
        .and_then(|v| match v[..] {
            [x, y, w, h] if w > 0.0 && h > 0.0 => Some((x, y, w, h)),
            _ => None,
        });
    let default_px = defaults.page_format.size / PT_PER_PX;
    let (base_w, base_h) = view_box.map_or((default_px.width, default_px.height), |v| (v.2, v.3));
    let width = root
        .attr("width")
        .and_then(|w| parse_length(w, base_w))
        .filter(|w| *w > 0.0);
    let height = root
        .attr("height")
        .and_then(|h| parse_length(h, base_h))
        .filter(|h| *h > 0.0);

    let (format, w, h) = match (width, height) {
        (None, None) if view_box.is_none() => {
            (defaults.page_format.clone(), default_px.width, default_px.height)
        }
        _ => {
            let w = width.unwrap_or(base_w);
            let h = height.unwrap_or(base_h);
            (PageFormat::custom(w * PT_PER_PX, h * PT_PER_PX), w, h)
        }
    };

    let to_px = match view_box {
        Some((x, y, vw, vh)) => viewport_trafo(
            root.attr("preserveAspectRatio"),
            (x, y, vw, vh),
            (w, h),
        ),
        None => Trafo::identity(),
    };
    (format, to_px.then_scale(PT_PER_PX, PT_PER_PX))
}

/// Map a view box onto a viewport of `size`, centered uniform scaling
/// unless the aspect ratio is `none`.
fn viewport_trafo(aspect: Option<&str>, (x, y, vw, vh): (f64, f64, f64, f64), (w, h): (f64, f64)) -> Trafo {
    let (sx, sy) = (w / vw, h / vh);
    if aspect.is_some_and(|a| a.trim() == "none") {
        return Trafo::translation(-x, -y).then_scale(sx, sy);
    }
    let s = sx.min(sy);
    Trafo::translation(-x, -y)
        .then_scale(s, s)
        .then_translate(Vector::new((w - vw * s) / 2.0, (h - vh * s) / 2.0))
}

/// Elements with an id, first one wins, consumers keep the index.
struct Definitions<'a> {
    elements: Vec<&'a Element>,
    index: HashMap<&'a str, usize>,
}

impl<'a> Definitions<'a> {
    fn collect(root: &'a Element) -> Self {
        let mut r = Self {
            elements: vec![],
            index: HashMap::new(),
        };
        let mut stack = vec![root];
        while let Some(el) = stack.pop() {
            if let Some(id) = el.id() {
                if !r.index.contains_key(id) {
                    r.index.insert(id, r.elements.len());
                    r.elements.push(el);
                }
            }
            stack.extend(el.children.iter().rev());
        }
        r
    }

    fn find(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}

/// Gradient attributes after following the `href` chain.
#[derive(Debug, Clone)]
struct GradientDef {
    kind: GradientKind,
    attrs: Vec<(String, String)>,
    stops: Vec<(f64, Color)>,
}

impl GradientDef {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Coordinate attribute, fractions for bounding box units.
    fn coord(&self, name: &str, default: f64, bbox_units: bool) -> f64 {
        let Some(v) = self.attr(name) else {
            return default;
        };
        let v = v.trim();
        if let Some(p) = v.strip_suffix('%') {
            let f = p.trim().parse::<f64>().map_or(default, |p| p / 100.0);
            return f;
        }
        if bbox_units {
            v.parse().unwrap_or(default)
        } else {
            parse_length(v, 0.0).unwrap_or(default)
        }
    }

    /// Canonical gradient for a shape whose user space bbox is `bbox`,
    /// `local` maps the shape's local coordinates into user space.
    fn build(&self, bbox: &Bbox, local: &Trafo) -> Result<Gradient> {
        let bbox_units = self.attr("gradientUnits") != Some("userSpaceOnUse");
        let c = |name, default| self.coord(name, default, bbox_units);
        let (start, end) = match self.kind {
            GradientKind::Linear => (
                Point::new(c("x1", 0.0), c("y1", 0.0)),
                Point::new(c("x2", 1.0), c("y2", 0.0)),
            ),
            GradientKind::Radial => {
                let center = Point::new(c("cx", 0.5), c("cy", 0.5));
                (center, center + Vector::new(c("r", 0.5), 0.0))
            }
        };
        let mut trafo = self
            .attr("gradientTransform")
            .map_or_else(Trafo::identity, parse_transform);
        if bbox_units {
            trafo = trafo.then(&Trafo::new(
                bbox.width(),
                0.0,
                0.0,
                bbox.height(),
                bbox.min.x,
                bbox.min.y,
            ));
        }
        let trafo = multiply_trafo(&trafo, &invert_trafo(local)?);
        Ok(Gradient {
            kind: self.kind,
            start,
            end,
            stops: self.stops.clone(),
            trafo,
        })
    }
}

fn parse_offset(s: &str) -> f64 {
    let s = s.trim();
    let v = match s.strip_suffix('%') {
        Some(p) => p.trim().parse::<f64>().map_or(0.0, |v| v / 100.0),
        None => s.parse().unwrap_or(0.0),
    };
    v.clamp(0.0, 1.0)
}

fn parse_stops(el: &Element) -> Vec<(f64, Color)> {
    let mut r: Vec<(f64, Color)> = vec![];
    for stop in el.children.iter().filter(|c| c.name == "stop") {
        let style = SvgStyle::default().derive(stop);
        let props: Vec<(&str, &str)> = stop
            .attrs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(
                stop.attr("style")
                    .into_iter()
                    .flat_map(|s| s.split(';'))
                    .filter_map(|d| d.split_once(':'))
                    .map(|(k, v)| (k.trim(), v.trim())),
            )
            .collect();
        let prop = |name: &str| props.iter().rev().find(|(k, _)| *k == name).map(|(_, v)| *v);
        let color = match prop("stop-color").map(str::trim) {
            Some("currentColor") => style.color.clone(),
            Some(c) => super::colors::parse_color(c).unwrap_or_else(|| Color::rgb(0.0, 0.0, 0.0)),
            None => Color::rgb(0.0, 0.0, 0.0),
        };
        let alpha = prop("stop-opacity")
            .and_then(|v| v.trim().parse::<f64>().ok())
            .unwrap_or(1.0)
            .clamp(0.0, 1.0);
        let offset = parse_offset(stop.attr("offset").unwrap_or("0"));
        // offsets never decrease
        let offset = r.last().map_or(offset, |(last, _)| offset.max(*last));
        r.push((offset, color.with_alpha(alpha)));
    }
    r
}

/// Inherited state while walking the tree.
#[derive(Debug, Clone)]
struct Context {
    /// User units of the element to canonical page space.
    ctm: Trafo,
    style: SvgStyle,
}

impl Context {
    fn child(&self, el: &Element) -> Self {
        let transform = el
            .attr("transform")
            .map_or_else(Trafo::identity, parse_transform);
        Self {
            ctm: multiply_trafo(&transform, &self.ctm),
            style: self.style.derive(el),
        }
    }
}

/// Geometry of a drawing element in local coordinates and the map from
/// local coordinates into the element's user space.
fn element_shape(el: &Element) -> Option<(Shape, Trafo)> {
    let num = |name: &str| el.attr(name).and_then(|v| parse_length(v, 0.0));
    let at = |x: &str, y: &str| Point::new(num(x).unwrap_or(0.0), num(y).unwrap_or(0.0));
    let curve = |paths: Vec<Path>| (Shape::Curve(Curve { paths }), Trafo::identity());
    match el.name.as_str() {
        "rect" => {
            let (w, h) = (num("width")?, num("height")?);
            if w <= 0.0 || h <= 0.0 {
                return None;
            }
            let (rx, ry) = match (num("rx"), num("ry")) {
                (Some(rx), Some(ry)) => (rx, ry),
                (Some(r), None) | (None, Some(r)) => (r, r),
                (None, None) => (0.0, 0.0),
            };
            let radius = rx.min(w / 2.0).min(ry.min(h / 2.0)).max(0.0);
            let origin = at("x", "y");
            let rect = Rectangle::new(origin.x, origin.y, w, h).with_radii([radius; 4]);
            Some((Shape::Rectangle(rect), Trafo::identity()))
        }
        "circle" => {
            let r = num("r").filter(|r| *r > 0.0)?;
            Some((Shape::Circle(Circle::full()), ellipse_trafo(at("cx", "cy"), r, r)))
        }
        "ellipse" => {
            let rx = num("rx").filter(|r| *r > 0.0)?;
            let ry = num("ry").filter(|r| *r > 0.0)?;
            Some((Shape::Circle(Circle::full()), ellipse_trafo(at("cx", "cy"), rx, ry)))
        }
        "line" => Path::from_points(&[at("x1", "y1"), at("x2", "y2")], false)
            .map(|p| curve(vec![p])),
        "polyline" | "polygon" => {
            let points = parse_points(el.attr("points")?);
            if points.len() < 2 {
                return None;
            }
            Path::from_points(&points, el.name == "polygon").map(|p| curve(vec![p]))
        }
        "path" => {
            let paths = parse_path_data(el.attr("d")?);
            (!paths.is_empty()).then(|| curve(paths))
        }
        _ => None,
    }
}

struct Translator<'a, 's, 'b> {
    defs: Definitions<'a>,
    doc: Document,
    session: &'s mut Session<'b>,
    gradients: HashMap<usize, Option<GradientDef>>,
    /// `use` elements being expanded, by definition index.
    use_stack: Vec<usize>,
    /// Elements being translated, `use` expansion included.
    depth: usize,
    page: NodeId,
    default_layer: Option<NodeId>,
}

impl<'a, 's, 'b> Translator<'a, 's, 'b> {
    fn default_layer(&mut self) -> Result<NodeId> {
        if let Some(l) = self.default_layer {
            return Ok(l);
        }
        let l = self.doc.add_layer(self.page, "Layer 1")?;
        self.default_layer = Some(l);
        Ok(l)
    }

    fn element(&mut self, el: &'a Element, parent: NodeId, ctx: &Context) -> Result<()> {
        if el.attr("display") == Some("none") {
            return Ok(());
        }
        if self.depth >= MAX_DEPTH {
            self.session.warn(format!(
                "svg {}: nested deeper than {MAX_DEPTH} levels, skipped",
                el.name
            ));
            return Ok(());
        }
        self.depth += 1;
        let r = match clip_reference(el) {
            Some(id) => self.clipped(el, id, parent, ctx),
            None => self.draw(el, parent, ctx),
        };
        self.depth -= 1;
        r
    }

    /// Translate `el` into a container clipped by the `clipPath` named
    /// `id`, the container is attached only when something was drawn.
    fn clipped(&mut self, el: &'a Element, id: &str, parent: NodeId, ctx: &Context) -> Result<()> {
        let clip = self
            .defs
            .find(id)
            .map(|idx| self.defs.elements[idx])
            .filter(|c| c.name == "clipPath");
        let Some(clip) = clip else {
            self.session.warn(format!("svg clip-path: unresolved reference {id:?}"));
            return self.draw(el, parent, ctx);
        };
        if clip.attr("clipPathUnits") == Some("objectBoundingBox") {
            self.session
                .warn(ConvertError::unsupported("svg clip-path in bounding box units"));
            return self.draw(el, parent, ctx);
        }
        let Some(paths) = self.clip_paths(clip, &ctx.child(el).ctm) else {
            debug!("svg clip-path {id:?} is empty, {} hidden", el.name);
            return Ok(());
        };
        let container = self.doc.create_node(NodeKind::Container);
        let clip_shape = Primitive::new(
            Shape::Curve(Curve { paths }),
            Trafo::identity(),
            Style::default(),
        );
        self.doc.add_primitive(container, clip_shape)?;
        self.draw(el, container, ctx)?;
        if self.doc.children(container)?.len() > 1 {
            self.doc.append_child(parent, container)?;
        }
        Ok(())
    }

    /// Outlines of the shapes in `clip` in canonical space, `ctm` maps the
    /// user space of the clipped element.
    fn clip_paths(&self, clip: &Element, ctm: &Trafo) -> Option<Vec<Path>> {
        let ctm = multiply_trafo(
            &clip
                .attr("transform")
                .map_or_else(Trafo::identity, parse_transform),
            ctm,
        );
        let mut paths = vec![];
        for child in &clip.children {
            if child.attr("display") == Some("none") {
                continue;
            }
            let Some((shape, local)) = element_shape(child) else {
                continue;
            };
            let transform = child
                .attr("transform")
                .map_or_else(Trafo::identity, parse_transform);
            let total = multiply_trafo(&multiply_trafo(&local, &transform), &ctm);
            paths.extend(apply_trafo_to_paths(&shape.to_paths(), &total));
        }
        (!paths.is_empty()).then_some(paths)
    }

    fn draw(&mut self, el: &'a Element, parent: NodeId, ctx: &Context) -> Result<()> {
        match el.name.as_str() {
            "g" | "a" | "switch" => {
                let ctx = ctx.child(el);
                self.group(&el.children, parent, &ctx)
            }
            "svg" => self.nested_svg(el, parent, ctx),
            "use" => self.use_element(el, parent, ctx),
            "text" => {
                let r = self.text(el, parent, &ctx.child(el));
                self.session.absorb(r).map(|_| ())
            }
            "rect" | "circle" | "ellipse" | "line" | "polyline" | "polygon" | "path" => {
                let r = self.shape(el, parent, &ctx.child(el));
                self.session.absorb(r).map(|_| ())
            }
            "image" => {
                self.session.warn(ConvertError::unsupported("svg image element"));
                Ok(())
            }
            "defs" | "linearGradient" | "radialGradient" | "symbol" | "clipPath" | "mask"
            | "pattern" | "marker" | "style" | "title" | "desc" | "metadata" | "filter"
            | "namedview" | TEXT_NODE => Ok(()),
            other => {
                debug!("skip svg element {other}");
                Ok(())
            }
        }
    }

    /// Translate `children` into a new group, the group is attached only
    /// when something was drawn.
    fn group(&mut self, children: &'a [Element], parent: NodeId, ctx: &Context) -> Result<()> {
        let group = self.doc.create_node(NodeKind::Group);
        for c in children {
            self.element(c, group, ctx)?;
        }
        if !self.doc.children(group)?.is_empty() {
            self.doc.append_child(parent, group)?;
        }
        Ok(())
    }

    fn nested_svg(&mut self, el: &'a Element, parent: NodeId, ctx: &Context) -> Result<()> {
        let num = |name: &str| el.attr(name).and_then(|v| parse_length(v, 0.0));
        let mut ctx = ctx.child(el);
        let (x, y) = (num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
        let view_box = el.attr("viewBox").map(number_list);
        let mut trafo = Trafo::identity();
        if let (Some([vx, vy, vw, vh]), Some(w), Some(h)) = (
            view_box.as_deref().and_then(|v| <[f64; 4]>::try_from(v).ok()),
            num("width"),
            num("height"),
        ) {
            if vw > 0.0 && vh > 0.0 {
                trafo = viewport_trafo(el.attr("preserveAspectRatio"), (vx, vy, vw, vh), (w, h));
            }
        }
        trafo = trafo.then_translate(Vector::new(x, y));
        ctx.ctm = multiply_trafo(&trafo, &ctx.ctm);
        self.group(&el.children, parent, &ctx)
    }

    fn use_element(&mut self, el: &'a Element, parent: NodeId, ctx: &Context) -> Result<()> {
        let Some(idx) = el.href().and_then(|h| self.defs.find(h)) else {
            self.session.warn(format!("svg use: unresolved reference {:?}", el.href()));
            return Ok(());
        };
        if self.use_stack.contains(&idx) {
            self.session
                .warn(format!("svg use: reference cycle through {:?}", el.href()));
            return Ok(());
        }
        let num = |name: &str| el.attr(name).and_then(|v| parse_length(v, 0.0));
        let mut ctx = ctx.child(el);
        let offset = Trafo::translation(num("x").unwrap_or(0.0), num("y").unwrap_or(0.0));
        ctx.ctm = multiply_trafo(&offset, &ctx.ctm);

        let target = self.defs.elements[idx];
        self.use_stack.push(idx);
        let r = if target.name == "symbol" {
            let ctx = Context {
                style: ctx.style.derive(target),
                ..ctx
            };
            self.group(&target.children, parent, &ctx)
        } else {
            let group = self.doc.create_node(NodeKind::Group);
            let r = self.element(target, group, &ctx);
            if r.is_ok() && !self.doc.children(group)?.is_empty() {
                self.doc.append_child(parent, group)?;
            }
            r
        };
        self.use_stack.pop();
        r
    }

    fn gradient_def(&mut self, id: &str) -> Option<GradientDef> {
        let idx = self.defs.find(id)?;
        if let Some(g) = self.gradients.get(&idx) {
            return g.clone();
        }
        let r = self.resolve_gradient(idx);
        self.gradients.insert(idx, r.clone());
        r
    }

    /// Merge attributes and stops along the `href` chain, nearest first.
    fn resolve_gradient(&mut self, idx: usize) -> Option<GradientDef> {
        let first = self.defs.elements[idx];
        let kind = match first.name.as_str() {
            "linearGradient" => GradientKind::Linear,
            "radialGradient" => GradientKind::Radial,
            _ => return None,
        };
        let mut attrs: Vec<(String, String)> = vec![];
        let mut stops = vec![];
        let mut visited = vec![];
        let mut cur = Some(idx);
        while let Some(i) = cur {
            if visited.contains(&i) {
                self.session.warn(format!(
                    "svg gradient {:?}: reference cycle",
                    first.id().unwrap_or_default()
                ));
                return None;
            }
            visited.push(i);
            let el = self.defs.elements[i];
            for (k, v) in &el.attrs {
                if !attrs.iter().any(|(a, _)| a == k) {
                    attrs.push((k.clone(), v.clone()));
                }
            }
            if stops.is_empty() {
                stops = parse_stops(el);
            }
            cur = el.href().and_then(|h| self.defs.find(h));
        }
        if stops.is_empty() {
            info!("svg gradient {:?} has no stops", first.id());
            return None;
        }
        Some(GradientDef { kind, attrs, stops })
    }

    fn paint_color(style: &SvgStyle, paint: &Paint) -> Option<Color> {
        match paint {
            Paint::None => None,
            Paint::Color(c) => Some(c.clone()),
            Paint::CurrentColor => Some(style.color.clone()),
            Paint::Url(_, fallback) => fallback.clone(),
        }
    }

    fn fill(&mut self, style: &SvgStyle, bbox: Option<&Bbox>, local: &Trafo) -> Option<Fill> {
        let alpha = style.fill_opacity * style.opacity;
        let paint = match &style.fill {
            Paint::Url(id, fallback) => {
                let gradient = self.gradient_def(id).zip(bbox).map(|(g, b)| g.build(b, local));
                match gradient {
                    Some(Ok(mut g)) => {
                        for (_, c) in &mut g.stops {
                            c.alpha *= alpha;
                        }
                        Some(FillPaint::Gradient(g))
                    }
                    Some(Err(e)) => {
                        self.session.warn(e);
                        fallback.clone().map(FillPaint::Solid)
                    }
                    None => fallback.clone().map(FillPaint::Solid),
                }
            }
            paint => Self::paint_color(style, paint).map(FillPaint::Solid),
        }?;
        let paint = match paint {
            FillPaint::Solid(c) => {
                let a = c.alpha * alpha;
                FillPaint::Solid(c.with_alpha(a))
            }
            p => p,
        };
        Some(Fill {
            rule: style.fill_rule.into(),
            paint,
        })
    }

    fn stroke(&mut self, style: &SvgStyle, ctm: &Trafo) -> Option<Stroke> {
        let color = match &style.stroke {
            Paint::Url(id, fallback) => self
                .gradient_def(id)
                .and_then(|g| g.stops.first().map(|(_, c)| c.clone()))
                .or_else(|| fallback.clone()),
            paint => Self::paint_color(style, paint),
        }?;
        if style.stroke_width <= 0.0 {
            return None;
        }
        let alpha = color.alpha * style.stroke_opacity * style.opacity;
        let dash = if style.dash.iter().sum::<f64>() > 0.0 {
            style.dash.iter().map(|d| d / style.stroke_width).collect()
        } else {
            vec![]
        };
        Some(Stroke {
            width: style.stroke_width * trafo_scale(ctm),
            color: color.with_alpha(alpha),
            dash,
            cap: style.line_cap.into(),
            join: style.line_join.into(),
            miter_limit: style.miter_limit,
            ..Default::default()
        })
    }

    fn shape(&mut self, el: &Element, parent: NodeId, ctx: &Context) -> Result<()> {
        let Some((shape, local)) = element_shape(el) else {
            debug!("skip empty svg {}", el.name);
            return Ok(());
        };
        let bbox = paths_bbox(&apply_trafo_to_paths(&shape.to_paths(), &local));
        let fill = if el.name == "line" {
            None
        } else {
            self.fill(&ctx.style, bbox.as_ref(), &local)
        };
        let style = Style {
            fill,
            stroke: self.stroke(&ctx.style, &ctx.ctm),
            ..Default::default()
        };
        let trafo = multiply_trafo(&local, &ctx.ctm);
        self.doc
            .add_primitive(parent, Primitive::new(shape, trafo, style))?;
        Ok(())
    }

    fn text(&mut self, el: &Element, parent: NodeId, ctx: &Context) -> Result<()> {
        let text = el.all_text().split_whitespace().join(" ");
        if text.is_empty() {
            return Ok(());
        }
        let first = |name: &str| {
            el.attr(name)
                .and_then(|v| number_list(v).first().copied())
                .unwrap_or(0.0)
        };
        let style = &ctx.style;
        let fill = self.fill(style, None, &Trafo::identity());
        let color = fill
            .as_ref()
            .and_then(Fill::main_color)
            .cloned()
            .unwrap_or_else(Color::black);
        let text_style = TextStyle {
            font_family: style.font_family.clone(),
            font_size: style.font_size,
            align: style.text_anchor.into(),
            color,
            ..Default::default()
        };
        // text runs upright, local y points up
        let trafo = Trafo::scale(1.0, -1.0)
            .then_translate(Vector::new(first("x"), first("y")))
            .then(&ctx.ctm);
        let primitive = Primitive::new(
            Shape::Text(Text {
                anchor: Point::origin(),
                text,
                width: None,
            }),
            trafo,
            Style {
                fill,
                stroke: self.stroke(style, &ctx.ctm),
                text: Some(text_style),
                ..Default::default()
            },
        );
        self.doc.add_primitive(parent, primitive)?;
        Ok(())
    }
}
