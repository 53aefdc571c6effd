//! Canonical document model.
//!
//! A document is a tree: Document, Pages, Page, Layer, then groups and
//! primitives. Nodes live in an arena owned by [`Document`] and are
//! addressed by [`NodeId`]. Child order is paint order.
//!
//! Coordinates are points, origin at page center, y up.

use crate::geom::{multiply_trafo, sum_bbox, Bbox, Size, Trafo};
use log::debug;
use once_cell::unsync::OnceCell;
use std::fmt::Display;
use thiserror::Error;

mod shape;
pub mod style;

pub use shape::*;
use style::Style;

/// A4 in points.
pub const A4: Size = Size::new(595.275_590_551_181_1, 841.889_763_779_527_6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("node {0} already has a parent")]
    AlreadyParented(NodeId),
    #[error("node {0} is an ancestor of the new parent")]
    Cycle(NodeId),
    #[error("node {0} can not have children")]
    LeafParent(NodeId),
    #[error("node {0} is not a primitive")]
    NotPrimitive(NodeId),
    #[error("node {0} is not a page")]
    NotPage(NodeId),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageFormat {
    pub name: String,
    pub size: Size,
    pub orientation: Orientation,
}

impl PageFormat {
    /// Orientation follows the size: landscape when wider than high.
    pub fn new(name: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            name: name.into(),
            size: Size::new(width, height),
            orientation: if width > height {
                Orientation::Landscape
            } else {
                Orientation::Portrait
            },
        }
    }

    pub fn custom(width: f64, height: f64) -> Self {
        Self::new("Custom", width, height)
    }
}

impl Default for PageFormat {
    fn default() -> Self {
        Self::new("A4", A4.width, A4.height)
    }
}

/// Where source coordinates have their origin, and so how they map to the
/// canonical center origin, y-up space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display, strum::EnumIter)]
pub enum DocOrigin {
    /// y up, origin at the lower-left page corner.
    LowerLeft,
    /// y down, origin at the upper-left page corner.
    UpperLeft,
    #[default]
    Center,
}

impl DocOrigin {
    pub fn origin_trafo(self, page: Size) -> Trafo {
        let (w, h) = (page.width, page.height);
        match self {
            Self::Center => Trafo::identity(),
            Self::LowerLeft => Trafo::translation(-w / 2.0, -h / 2.0),
            Self::UpperLeft => Trafo::new(1.0, 0.0, 0.0, -1.0, -w / 2.0, h / 2.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MetaInfo {
    pub author: String,
    pub license: String,
    pub keywords: String,
    pub notes: String,
}

impl MetaInfo {
    /// Append a line to the notes.
    pub fn add_note(&mut self, note: &str) {
        if !self.notes.is_empty() {
            self.notes.push('\n');
        }
        self.notes.push_str(note);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    pub printable: bool,
}

impl Layer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            printable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, strum::Display)]
pub enum NodeKind {
    Document,
    Pages,
    Page(PageFormat),
    Layer(Layer),
    Group,
    /// Clip group, the first child is the clip path.
    Container,
    Primitive(Primitive),
}

impl NodeKind {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    pub fn primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(p) => Some(p),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct Node {
    pub kind: NodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bbox: OnceCell<Option<Bbox>>,
}

impl Node {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: vec![],
            bbox: OnceCell::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

#[derive(Debug)]
pub struct Document {
    nodes: Vec<Node>,
    pub origin: DocOrigin,
    /// Default format of new pages.
    pub page_format: PageFormat,
    pub meta: MetaInfo,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    const ROOT: NodeId = NodeId(0);
    const PAGES: NodeId = NodeId(1);

    pub fn new() -> Self {
        let mut root = Node::new(NodeKind::Document);
        root.children.push(Self::PAGES);
        let mut pages = Node::new(NodeKind::Pages);
        pages.parent = Some(Self::ROOT);
        Self {
            nodes: vec![root, pages],
            origin: DocOrigin::default(),
            page_format: PageFormat::default(),
            meta: MetaInfo::default(),
        }
    }

    pub fn root(&self) -> NodeId {
        Self::ROOT
    }

    pub fn pages_node(&self) -> NodeId {
        Self::PAGES
    }

    pub fn pages(&self) -> &[NodeId] {
        &self.nodes[Self::PAGES.0].children
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(ModelError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(ModelError::UnknownNode(id))
    }

    pub fn kind(&self, id: NodeId) -> Result<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    pub fn primitive(&self, id: NodeId) -> Result<&Primitive> {
        self.kind(id)?
            .primitive()
            .ok_or(ModelError::NotPrimitive(id))
    }

    fn primitive_mut(&mut self, id: NodeId) -> Result<&mut Primitive> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Primitive(p) => Ok(p),
            _ => Err(ModelError::NotPrimitive(id)),
        }
    }

    pub fn children(&self, id: NodeId) -> Result<&[NodeId]> {
        self.node(id).map(Node::children)
    }

    pub fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        self.node(id).map(Node::parent)
    }

    /// Add a detached node, attach it later with [`Self::append_child`].
    pub fn create_node(&mut self, kind: NodeKind) -> NodeId {
        self.nodes.push(Node::new(kind));
        NodeId(self.nodes.len() - 1)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.node(parent)?.kind.is_leaf() {
            return Err(ModelError::LeafParent(parent));
        }
        if child == Self::ROOT || self.node(child)?.parent.is_some() {
            return Err(ModelError::AlreadyParented(child));
        }
        let mut cur = Some(parent);
        while let Some(id) = cur {
            if id == child {
                return Err(ModelError::Cycle(child));
            }
            cur = self.nodes[id.0].parent;
        }

        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        self.invalidate(parent);
        Ok(())
    }

    /// Create and attach in one step.
    pub fn add_child(&mut self, parent: NodeId, kind: NodeKind) -> Result<NodeId> {
        if self.node(parent)?.kind.is_leaf() {
            return Err(ModelError::LeafParent(parent));
        }
        let id = self.create_node(kind);
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Append a page, `None` uses the document page format.
    pub fn add_page(&mut self, format: Option<PageFormat>) -> NodeId {
        let format = format.unwrap_or_else(|| self.page_format.clone());
        let id = self.create_node(NodeKind::Page(format));
        self.nodes[id.0].parent = Some(Self::PAGES);
        self.nodes[Self::PAGES.0].children.push(id);
        debug!("add page {id}");
        id
    }

    pub fn add_layer(&mut self, page: NodeId, name: impl Into<String>) -> Result<NodeId> {
        self.page_format(page)?;
        self.add_child(page, NodeKind::Layer(Layer::new(name)))
    }

    pub fn add_primitive(&mut self, parent: NodeId, primitive: Primitive) -> Result<NodeId> {
        self.add_child(parent, NodeKind::Primitive(primitive))
    }

    pub fn page_format(&self, page: NodeId) -> Result<&PageFormat> {
        match self.kind(page)? {
            NodeKind::Page(f) => Ok(f),
            _ => Err(ModelError::NotPage(page)),
        }
    }

    pub fn set_page_format(&mut self, page: NodeId, format: PageFormat) -> Result<()> {
        match &mut self.node_mut(page)?.kind {
            NodeKind::Page(f) => {
                *f = format;
                Ok(())
            }
            _ => Err(ModelError::NotPage(page)),
        }
    }

    /// Transform from `origin` space of a page to canonical space.
    pub fn origin_trafo(&self, page: Size) -> Trafo {
        self.origin.origin_trafo(page)
    }

    pub fn set_style(&mut self, id: NodeId, style: Style) -> Result<()> {
        self.primitive_mut(id)?.style = style;
        Ok(())
    }

    pub fn set_trafo(&mut self, id: NodeId, trafo: Trafo) -> Result<()> {
        self.primitive_mut(id)?.trafo = trafo;
        self.invalidate(id);
        Ok(())
    }

    pub fn set_shape(&mut self, id: NodeId, shape: Shape) -> Result<()> {
        self.primitive_mut(id)?.shape = shape;
        self.invalidate(id);
        Ok(())
    }

    /// Append `trafo` to every primitive below `id`, `id` included.
    pub fn apply_trafo(&mut self, id: NodeId, trafo: &Trafo) -> Result<()> {
        for n in self.walk(id)? {
            if let NodeKind::Primitive(p) = &mut self.nodes[n.0].kind {
                p.trafo = multiply_trafo(&p.trafo, trafo);
            }
            self.nodes[n.0].bbox.take();
        }
        self.invalidate(id);
        Ok(())
    }

    /// Replace a primitive's shape by the equivalent curve.
    pub fn to_curve(&mut self, id: NodeId) -> Result<()> {
        let curve = self.primitive(id)?.to_curve();
        self.nodes[id.0].kind = NodeKind::Primitive(curve);
        self.invalidate(id);
        Ok(())
    }

    /// Drop the memoized bbox of `id` and its ancestors.
    fn invalidate(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(id) = cur {
            let node = &mut self.nodes[id.0];
            node.bbox.take();
            cur = node.parent;
        }
    }

    /// Bounding box in canonical space, `None` for empty containers.
    pub fn bbox(&self, id: NodeId) -> Result<Option<Bbox>> {
        let node = self.node(id)?;
        Ok(*node.bbox.get_or_init(|| match &node.kind {
            NodeKind::Primitive(p) => p.bbox(),
            NodeKind::Container => {
                let (clip, content) = node.children.split_first()?;
                let clip = self.bbox(*clip).ok().flatten()?;
                content
                    .iter()
                    .filter_map(|c| self.bbox(*c).ok().flatten())
                    .fold(None, |acc, b| Some(sum_bbox(acc, b)))
                    .and_then(|b| b.intersection(&clip))
            }
            _ => node
                .children
                .iter()
                .filter_map(|c| self.bbox(*c).ok().flatten())
                .fold(None, |acc, b| Some(sum_bbox(acc, b))),
        }))
    }

    /// Clip path of a container node.
    pub fn clip_path(&self, id: NodeId) -> Result<Option<NodeId>> {
        let node = self.node(id)?;
        Ok(match node.kind {
            NodeKind::Container => node.children.first().copied(),
            _ => None,
        })
    }

    fn is_clip_path(&self, id: NodeId) -> bool {
        self.nodes[id.0]
            .parent
            .is_some_and(|p| matches!(self.clip_path(p), Ok(Some(c)) if c == id))
    }

    /// Nodes below `id` in pre-order, `id` first.
    pub fn walk(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.node(id)?;
        let mut r = vec![];
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            r.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev());
        }
        Ok(r)
    }

    /// Primitives below `id` in paint order. Clip paths of containers and
    /// everything below them are not painted.
    pub fn primitives(&self, id: NodeId) -> Result<impl Iterator<Item = (NodeId, &Primitive)>> {
        self.node(id)?;
        let mut painted = vec![];
        let mut stack = vec![id];
        while let Some(n) = stack.pop() {
            if n != id && self.is_clip_path(n) {
                continue;
            }
            painted.push(n);
            stack.extend(self.nodes[n.0].children.iter().rev());
        }
        Ok(painted
            .into_iter()
            .filter_map(|n| self.nodes[n.0].kind.primitive().map(|p| (n, p))))
    }
}

#[cfg(test)]
mod tests;
