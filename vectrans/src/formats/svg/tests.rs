use super::*;
use crate::{
    color::Color,
    formats::{tests::with_session, Exporter, ImportDefaults, Importer},
    geom::{Point, Trafo},
    model::{
        ellipse_trafo,
        style::{FillPaint, GradientKind, Stroke, Style},
        Circle, Document, NodeKind, PageFormat, Primitive, Rectangle, Shape,
    },
};
use assert_approx_eq::assert_approx_eq;
use insta::assert_snapshot;
use test_case::test_case;

fn import(svg: &str) -> (Document, Vec<String>) {
    let (doc, diag) =
        with_session(|s| SvgImporter::new(ImportDefaults::default()).import(svg.as_bytes(), s));
    (doc.unwrap(), diag.warnings)
}

fn primitives(doc: &Document) -> Vec<Primitive> {
    doc.primitives(doc.root())
        .unwrap()
        .map(|(_, p)| p.clone())
        .collect()
}

#[test_case(b"<svg/>" => true)]
#[test_case(b"\xef\xbb\xbf<?xml version=\"1.0\"?><svg>" => true ; "bom")]
#[test_case(b"<html><body/></html>" => false)]
#[test_case(b"svg" => false ; "no markup")]
fn check_svg(data: &[u8]) -> bool {
    check(data)
}

#[test_log::test]
fn rounded_rect_corners() {
    let (doc, _) = import(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="100">
            <rect x="10" y="10" width="100" height="50" rx="10"/>
        </svg>"#,
    );
    let prims = primitives(&doc);
    let [p] = &prims[..] else {
        panic!("expect one primitive, got {prims:?}");
    };
    let Shape::Rectangle(r) = &p.shape else {
        panic!("not a rectangle: {:?}", p.shape);
    };
    assert_eq!((100.0, 50.0), (r.size.width, r.size.height));
    for c in r.corners {
        assert_approx_eq!(0.2, c, 1e-9);
    }
}

#[test]
fn circle_on_page_center() {
    // 200x100 px is 150x75 pt, the circle sits on the page center
    let (doc, _) = import(
        r#"<svg width="200" height="100"><circle cx="100" cy="50" r="20" fill="red"/></svg>"#,
    );
    assert_eq!(PageFormat::custom(150.0, 75.0), doc.page_format);
    let prims = primitives(&doc);
    assert!(matches!(prims[0].shape, Shape::Circle(c) if c.is_full()));
    let bbox = prims[0].bbox().unwrap();
    assert_approx_eq!(-15.0, bbox.min.x, 1e-9);
    assert_approx_eq!(-15.0, bbox.min.y, 1e-9);
    assert_approx_eq!(15.0, bbox.max.x, 1e-9);
    assert_approx_eq!(15.0, bbox.max.y, 1e-9);
    let fill = prims[0].style.fill.as_ref().unwrap();
    assert_eq!(Some(&Color::rgb(1.0, 0.0, 0.0).with_name("red")), fill.main_color());
}

#[test]
fn view_box_scales_content() {
    let (doc, _) = import(
        r#"<svg width="100pt" height="100pt" viewBox="0 0 10 10">
            <rect width="10" height="10" stroke="black" stroke-width="0.1"/>
        </svg>"#,
    );
    let prims = primitives(&doc);
    let bbox = prims[0].bbox().unwrap();
    assert_approx_eq!(-50.0, bbox.min.x, 1e-9);
    assert_approx_eq!(50.0, bbox.max.y, 1e-9);
    let stroke = prims[0].style.stroke.as_ref().unwrap();
    assert_approx_eq!(1.0, stroke.width, 1e-9);
}

#[test]
fn layers_and_groups() {
    let (doc, _) = import(
        r#"<svg xmlns:inkscape="http://www.inkscape.org/namespaces/inkscape" width="10" height="10">
            <g inkscape:groupmode="layer" inkscape:label="Back">
                <g transform="translate(1,1)"><line x1="0" y1="0" x2="5" y2="5" stroke="blue"/></g>
                <g/>
            </g>
            <path d="M0 0 L5 0 L5 5 Z"/>
        </svg>"#,
    );
    let page = doc.pages()[0];
    let names: Vec<_> = doc
        .children(page)
        .unwrap()
        .iter()
        .map(|id| match doc.kind(*id).unwrap() {
            NodeKind::Layer(l) => l.name.clone(),
            k => panic!("unexpected {k:?}"),
        })
        .collect();
    assert_eq!(vec!["Back", "Layer 1"], names);
    let back = doc.children(page).unwrap()[0];
    // the empty group is dropped
    assert_eq!(1, doc.children(back).unwrap().len());
    let prims = primitives(&doc);
    assert_eq!(2, prims.len());
    assert!(prims[0].style.fill.is_none());
    assert!(prims[0].style.stroke.is_some());
}

#[test]
fn use_reference_cycle() {
    let (doc, warnings) = import(
        r##"<svg width="10" height="10">
            <g id="a"><rect width="1" height="1"/><use href="#a"/></g>
        </svg>"##,
    );
    // the group and one expanded copy, the nested reference is dropped
    assert_eq!(2, primitives(&doc).len());
    assert!(warnings.iter().any(|w| w.contains("cycle")), "{warnings:?}");
}

#[test]
fn use_places_copy() {
    let (doc, _) = import(
        r##"<svg width="100" height="100">
            <defs><rect id="r" width="10" height="10"/></defs>
            <use href="#r" x="20"/>
            <use xlink:href="#r" transform="translate(0,20)"/>
        </svg>"##,
    );
    let prims = primitives(&doc);
    assert_eq!(2, prims.len());
    let a = prims[0].bbox().unwrap();
    let b = prims[1].bbox().unwrap();
    assert_approx_eq!(20.0 * 0.75, a.min.x - b.min.x, 1e-9);
    assert_approx_eq!(20.0 * 0.75, a.max.y - b.max.y, 1e-9);
}

#[test]
fn linear_gradient_through_href() {
    let (doc, warnings) = import(
        r##"<svg width="100" height="100">
            <linearGradient id="base">
                <stop offset="0" stop-color="red"/>
                <stop offset="100%" stop-color="blue" stop-opacity="0.5"/>
            </linearGradient>
            <linearGradient id="g" href="#base" x2="0" y2="1"/>
            <rect width="10" height="20" fill="url(#g)"/>
        </svg>"##,
    );
    assert!(warnings.is_empty(), "{warnings:?}");
    let prims = primitives(&doc);
    let FillPaint::Gradient(g) = &prims[0].style.fill.as_ref().unwrap().paint else {
        panic!("expect gradient fill");
    };
    assert_eq!(GradientKind::Linear, g.kind);
    assert_eq!(2, g.stops.len());
    assert_approx_eq!(1.0, g.stops[1].0, 1e-9);
    assert_approx_eq!(0.5, g.stops[1].1.alpha, 1e-9);
    // the vertical unit vector covers the rect height in local space
    let end = g.trafo.transform_point(g.end);
    let start = g.trafo.transform_point(g.start);
    assert_approx_eq!(0.0, end.x - start.x, 1e-9);
    assert_approx_eq!(20.0, end.y - start.y, 1e-9);
}

#[test_case("url(#g)" => None ; "no fallback")]
#[test_case("url(#g) green" => Some(Color::rgb(0.0, 128.0 / 255.0, 0.0).with_name("green")) ; "fallback")]
fn self_referencing_gradient(fill: &str) -> Option<Color> {
    let (doc, warnings) = import(&format!(
        r##"<svg width="10" height="10">
            <linearGradient id="g" href="#g"><stop offset="0" stop-color="red"/></linearGradient>
            <rect width="1" height="1" fill="{fill}"/>
        </svg>"##
    ));
    assert!(warnings.iter().any(|w| w.contains("cycle")), "{warnings:?}");
    let prims = primitives(&doc);
    prims[0].style.fill.as_ref().and_then(|f| f.main_color().cloned())
}

#[test]
fn text_element() {
    let (doc, _) = import(
        r#"<svg width="100" height="100">
            <text x="10" y="20" font-size="12" text-anchor="middle">Hello <tspan>world</tspan></text>
        </svg>"#,
    );
    let prims = primitives(&doc);
    let Shape::Text(t) = &prims[0].shape else {
        panic!("expect text");
    };
    assert_eq!("Hello world", t.text);
    let style = prims[0].style.text.as_ref().unwrap();
    assert_eq!(12.0, style.font_size);
    assert_eq!(crate::model::style::TextAlign::Center, style.align);
    // upright: local y up stays up on the page
    assert!(prims[0].trafo.m22 > 0.0);
}

#[test]
fn image_is_unsupported() {
    let (doc, warnings) =
        import(r#"<svg width="10" height="10"><image width="5" height="5" href="a.png"/></svg>"#);
    assert!(primitives(&doc).is_empty());
    assert_eq!(1, warnings.len());
}

#[test]
fn malformed_xml() {
    let (r, _) = with_session(|s| {
        SvgImporter::new(ImportDefaults::default()).import(b"<svg><g></svg>", s)
    });
    assert!(matches!(r, Err(crate::ConvertError::StructuralParse { .. })));
}

fn sample_document() -> Document {
    let mut doc = Document::new();
    doc.page_format = PageFormat::custom(100.0, 50.0);
    let page = doc.add_page(None);
    let layer = doc.add_layer(page, "Layer 1").unwrap();
    let rect = Primitive::new(
        Shape::Rectangle(Rectangle::new(-40.0, -20.0, 20.0, 10.0)),
        Trafo::identity(),
        Style::filled(Color::rgb(1.0, 0.0, 0.0)),
    );
    let ellipse = Primitive::new(
        Shape::Circle(Circle::full()),
        ellipse_trafo(Point::new(20.0, 0.0), 10.0, 5.0),
        Style::stroked(Stroke::solid(1.0, Color::rgb(0.0, 0.0, 1.0))),
    );
    doc.add_primitive(layer, rect).unwrap();
    doc.add_primitive(layer, ellipse).unwrap();
    doc
}

#[test]
fn export_native_elements() {
    let (out, _) = with_session(|s| SvgExporter::default().export(&sample_document(), s));
    let svg = String::from_utf8(out.unwrap()).unwrap();
    assert_snapshot!(svg, @r##"
    <?xml version="1.0" encoding="UTF-8"?>
    <svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="100pt" height="50pt" viewBox="0 0 100 50">
     <g id="Layer 1">
      <rect x="10" y="35" width="20" height="10" fill="#ff0000" fill-rule="evenodd"/>
      <ellipse cx="70" cy="25" rx="10" ry="5" fill="none" stroke="#0000ff" stroke-width="1" stroke-linecap="butt" stroke-linejoin="miter" stroke-miterlimit="10.433"/>
     </g>
    </svg>
    "##);
}

#[test]
fn export_then_import_keeps_page_and_ellipse() {
    let doc = sample_document();
    let (out, _) = with_session(|s| SvgExporter::default().export(&doc, s));
    let (back, warnings) = import(std::str::from_utf8(&out.unwrap()).unwrap());
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_approx_eq!(100.0, back.page_format.size.width, 1e-9);
    assert_approx_eq!(50.0, back.page_format.size.height, 1e-9);

    let prims = primitives(&back);
    assert_eq!(2, prims.len());
    let expected = primitives(&doc)[1].bbox().unwrap();
    let actual = prims[1].bbox().unwrap();
    assert_approx_eq!(expected.min.x, actual.min.x, 1e-6);
    assert_approx_eq!(expected.min.y, actual.min.y, 1e-6);
    assert_approx_eq!(expected.max.x, actual.max.x, 1e-6);
    assert_approx_eq!(expected.max.y, actual.max.y, 1e-6);
    assert!(prims[1].style.fill.is_none());
}

#[test]
fn export_gradient_defs() {
    let mut doc = sample_document();
    let layer = doc.children(doc.pages()[0]).unwrap()[0];
    let (imported, _) = import(
        r##"<svg width="10" height="10">
            <radialGradient id="g"><stop offset="0" stop-color="white"/><stop offset="1" stop-color="black"/></radialGradient>
            <circle r="2" fill="url(#g)"/>
        </svg>"##,
    );
    let p = primitives(&imported).remove(0);
    doc.add_primitive(layer, p).unwrap();
    let (out, _) = with_session(|s| SvgExporter::default().export(&doc, s));
    let svg = String::from_utf8(out.unwrap()).unwrap();
    assert!(svg.contains("<radialGradient id=\"gradient1\""), "{svg}");
    assert!(svg.contains("fill=\"url(#gradient1)\""), "{svg}");
    let (back, _) = import(&svg);
    assert!(matches!(
        &primitives(&back)[2].style.fill.as_ref().unwrap().paint,
        FillPaint::Gradient(g) if g.stops.len() == 2
    ));
}

#[test]
fn export_first_page_only() {
    let mut doc = sample_document();
    doc.add_page(None);
    let (out, diag) = with_session(|s| SvgExporter::default().export(&doc, s));
    assert!(out.is_ok());
    assert_eq!(1, diag.warnings.len());
}

#[test]
fn clip_path_makes_container() {
    let (doc, warnings) = import(
        r#"<svg width="200" height="100">
            <defs><clipPath id="c"><rect width="50" height="100"/></clipPath></defs>
            <rect width="200" height="100" fill="red" style="clip-path: url(#c)"/>
        </svg>"#,
    );
    assert!(warnings.is_empty(), "{warnings:?}");
    let layer = doc.children(doc.pages()[0]).unwrap()[0];
    let &[container] = doc.children(layer).unwrap() else {
        panic!("expect one child of the layer");
    };
    assert_eq!(&NodeKind::Container, doc.kind(container).unwrap());
    assert_eq!(2, doc.children(container).unwrap().len());

    let prims = primitives(&doc);
    assert_eq!(1, prims.len());
    assert!(matches!(prims[0].shape, Shape::Rectangle(_)));

    let bbox = doc.bbox(container).unwrap().unwrap();
    assert_approx_eq!(-75.0, bbox.min.x, 1e-9);
    assert_approx_eq!(-37.5, bbox.max.x, 1e-9);
    assert_approx_eq!(-37.5, bbox.min.y, 1e-9);
    assert_approx_eq!(37.5, bbox.max.y, 1e-9);
}

#[test]
fn unresolved_clip_path_draws_unclipped() {
    let (doc, warnings) = import(
        r#"<svg width="200" height="100"><rect width="20" height="10" clip-path="url(#nope)"/></svg>"#,
    );
    assert_eq!(1, warnings.len(), "{warnings:?}");
    assert_eq!(1, primitives(&doc).len());
    let layer = doc.children(doc.pages()[0]).unwrap()[0];
    assert!(matches!(doc.kind(doc.children(layer).unwrap()[0]).unwrap(), NodeKind::Primitive(_)));
}

#[test]
fn long_use_chain_is_cut() {
    let mut svg = r#"<svg width="200" height="100"><defs>"#.to_owned();
    for i in 0..300 {
        svg.push_str(&format!(r##"<g id="g{i}"><use href="#g{}"/></g>"##, i + 1));
    }
    svg.push_str(r##"<g id="g300"><rect width="10" height="10"/></g></defs><use href="#g0"/></svg>"##);
    let (doc, warnings) = import(&svg);
    assert_eq!(1, warnings.len(), "{warnings:?}");
    assert!(warnings[0].contains("nested deeper"), "{warnings:?}");
    assert!(primitives(&doc).is_empty());
}
