use super::*;
use crate::geom::{Point, Trafo};
use assert_approx_eq::assert_approx_eq;
use test_case::test_case;

fn rect(x: f64, y: f64, w: f64, h: f64) -> Primitive {
    Primitive::new(
        Shape::Rectangle(Rectangle::new(x, y, w, h)),
        Trafo::identity(),
        Style::default(),
    )
}

fn doc_with_layer() -> (Document, NodeId) {
    let mut doc = Document::new();
    let page = doc.add_page(None);
    let layer = doc.add_layer(page, "Layer 1").unwrap();
    (doc, layer)
}

#[test]
fn new_document() {
    let doc = Document::new();
    assert_eq!(&NodeKind::Document, doc.kind(doc.root()).unwrap());
    assert_eq!(&[doc.pages_node()], doc.children(doc.root()).unwrap());
    assert!(doc.pages().is_empty());
    assert_eq!(Orientation::Portrait, doc.page_format.orientation);
}

#[test]
fn pages_and_layers() {
    let (doc, layer) = doc_with_layer();
    let page = doc.pages()[0];
    assert_eq!(Some(page), doc.parent(layer).unwrap());
    assert_eq!("A4", doc.page_format(page).unwrap().name);
    assert_eq!(Err(ModelError::NotPage(layer)), doc.page_format(layer).map(|_| ()));
}

#[test]
fn child_order_is_paint_order() {
    let (mut doc, layer) = doc_with_layer();
    let a = doc.add_primitive(layer, rect(0.0, 0.0, 1.0, 1.0)).unwrap();
    let b = doc.add_primitive(layer, rect(1.0, 1.0, 1.0, 1.0)).unwrap();
    assert_eq!(&[a, b], doc.children(layer).unwrap());
    let walked = doc.walk(doc.root()).unwrap();
    assert_eq!(vec![a, b], walked[walked.len() - 2..].to_vec());
    assert_eq!(2, doc.primitives(doc.root()).unwrap().count());
}

#[test]
fn append_child_rejections() {
    let (mut doc, layer) = doc_with_layer();
    let leaf = doc.add_primitive(layer, rect(0.0, 0.0, 1.0, 1.0)).unwrap();
    let group = doc.create_node(NodeKind::Group);
    assert_eq!(Err(ModelError::LeafParent(leaf)), doc.append_child(leaf, group));

    doc.append_child(layer, group).unwrap();
    assert_eq!(Err(ModelError::AlreadyParented(group)), doc.append_child(layer, group));

    let inner = doc.add_child(group, NodeKind::Group).unwrap();
    let detached = doc.create_node(NodeKind::Group);
    doc.append_child(detached, inner).unwrap_err();
    // ancestor of the parent
    let outer = doc.create_node(NodeKind::Group);
    let sub = doc.add_child(outer, NodeKind::Group).unwrap();
    assert_eq!(Err(ModelError::Cycle(outer)), doc.append_child(sub, outer));
    assert_eq!(Err(ModelError::AlreadyParented(doc.root())), doc.append_child(layer, doc.root()));
}

#[test]
fn bbox_memoized_and_invalidated() {
    let (mut doc, layer) = doc_with_layer();
    let a = doc.add_primitive(layer, rect(0.0, 0.0, 10.0, 10.0)).unwrap();
    let page = doc.pages()[0];
    assert_eq!(Some(Bbox::new(Point::new(0.0, 0.0), Point::new(10.0, 10.0))), doc.bbox(page).unwrap());

    doc.set_trafo(a, Trafo::translation(5.0, 0.0)).unwrap();
    assert_eq!(Some(Bbox::new(Point::new(5.0, 0.0), Point::new(15.0, 10.0))), doc.bbox(page).unwrap());

    doc.add_primitive(layer, rect(-5.0, -5.0, 1.0, 1.0)).unwrap();
    assert_eq!(Point::new(-5.0, -5.0), doc.bbox(doc.root()).unwrap().unwrap().min);

    doc.apply_trafo(layer, &Trafo::scale(2.0, 2.0)).unwrap();
    assert_eq!(Point::new(-10.0, -10.0), doc.bbox(page).unwrap().unwrap().min);
}

#[test]
fn empty_container_bbox() {
    let (doc, layer) = doc_with_layer();
    assert_eq!(None, doc.bbox(layer).unwrap());
}

#[test]
fn set_style_and_shape_need_primitive() {
    let (mut doc, layer) = doc_with_layer();
    assert_eq!(Err(ModelError::NotPrimitive(layer)), doc.set_style(layer, Style::default()));
    let a = doc.add_primitive(layer, rect(0.0, 0.0, 1.0, 1.0)).unwrap();
    doc.set_style(a, Style::filled(crate::color::Color::black())).unwrap();
    assert!(doc.primitive(a).unwrap().style.fill.is_some());

    doc.set_shape(a, Shape::Circle(Circle::full())).unwrap();
    let b = doc.bbox(a).unwrap().unwrap();
    assert_approx_eq!(1.0, b.max.x);
}

#[test]
fn convert_to_curve() {
    let (mut doc, layer) = doc_with_layer();
    let a = doc.add_primitive(layer, rect(2.0, 3.0, 4.0, 5.0)).unwrap();
    let before = doc.bbox(a).unwrap();
    doc.to_curve(a).unwrap();
    assert!(matches!(doc.primitive(a).unwrap().shape, Shape::Curve(_)));
    assert_eq!(before, doc.bbox(a).unwrap());
}

#[test_case(DocOrigin::Center, (0.0, 0.0) => (0.0, 0.0))]
#[test_case(DocOrigin::LowerLeft, (0.0, 0.0) => (-50.0, -100.0))]
#[test_case(DocOrigin::UpperLeft, (0.0, 0.0) => (-50.0, 100.0))]
#[test_case(DocOrigin::UpperLeft, (100.0, 200.0) => (50.0, -100.0))]
fn origin_trafo(origin: DocOrigin, p: (f64, f64)) -> (f64, f64) {
    let t = origin.origin_trafo(Size::new(100.0, 200.0));
    let p = t.transform_point(Point::new(p.0, p.1));
    (p.x, p.y)
}

#[test]
fn page_format_orientation() {
    assert_eq!(Orientation::Landscape, PageFormat::custom(300.0, 200.0).orientation);
    let (mut doc, _) = doc_with_layer();
    let page = doc.pages()[0];
    doc.set_page_format(page, PageFormat::custom(10.0, 20.0)).unwrap();
    assert_eq!(Size::new(10.0, 20.0), doc.page_format(page).unwrap().size);
}

#[test]
fn meta_notes() {
    let mut meta = MetaInfo::default();
    meta.add_note("a");
    meta.add_note("b");
    assert_eq!("a\nb", meta.notes);
}

#[test]
fn container_clips_bbox_and_paint() {
    let (mut doc, layer) = doc_with_layer();
    let clip_group = doc.add_child(layer, NodeKind::Container).unwrap();
    let clip = doc.add_primitive(clip_group, rect(0.0, 0.0, 5.0, 5.0)).unwrap();
    let content = doc.add_primitive(clip_group, rect(2.0, 2.0, 10.0, 10.0)).unwrap();

    assert_eq!(Some(clip), doc.clip_path(clip_group).unwrap());
    assert_eq!(None, doc.clip_path(layer).unwrap());
    assert_eq!(
        Some(Bbox::new(Point::new(2.0, 2.0), Point::new(5.0, 5.0))),
        doc.bbox(clip_group).unwrap()
    );
    let painted: Vec<_> = doc.primitives(layer).unwrap().map(|(id, _)| id).collect();
    assert_eq!(vec![content], painted);
}

#[test]
fn container_without_content_has_no_bbox() {
    let (mut doc, layer) = doc_with_layer();
    let clip_group = doc.add_child(layer, NodeKind::Container).unwrap();
    doc.add_primitive(clip_group, rect(0.0, 0.0, 5.0, 5.0)).unwrap();
    assert_eq!(None, doc.bbox(clip_group).unwrap());
    assert_eq!(None, doc.bbox(layer).unwrap());
}

#[test]
fn clip_group_is_not_painted() {
    let (mut doc, layer) = doc_with_layer();
    let clip_group = doc.add_child(layer, NodeKind::Container).unwrap();
    let mask = doc.add_child(clip_group, NodeKind::Group).unwrap();
    doc.add_primitive(mask, rect(0.0, 0.0, 5.0, 5.0)).unwrap();
    doc.add_primitive(mask, rect(5.0, 0.0, 5.0, 5.0)).unwrap();
    let content = doc.add_primitive(clip_group, rect(2.0, 2.0, 10.0, 10.0)).unwrap();

    let painted: Vec<_> = doc.primitives(doc.root()).unwrap().map(|(id, _)| id).collect();
    assert_eq!(vec![content], painted);
    assert_eq!(
        Some(Bbox::new(Point::new(2.0, 2.0), Point::new(10.0, 5.0))),
        doc.bbox(clip_group).unwrap()
    );
}
