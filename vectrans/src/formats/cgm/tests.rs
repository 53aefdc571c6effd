use super::*;
use crate::{
    color::Color,
    formats::{tests::with_session, Exporter, ImportDefaults, Importer},
    geom::{point_angle, ArcType, Point, Trafo},
    model::{
        style::{Fill, FillPaint, Style},
        Document, Primitive, Rectangle, Shape,
    },
    ConvertError,
};
use assert_approx_eq::assert_approx_eq;
use hex_literal::hex;
use std::f64::consts::FRAC_PI_2;
use test_case::test_case;

/// Short form element, parameters padded to even length.
pub(super) fn el(id: u16, params: &[u8]) -> Vec<u8> {
    assert!(params.len() < 31);
    #[allow(clippy::cast_possible_truncation)]
    let mut r = (id | params.len() as u16).to_be_bytes().to_vec();
    r.extend_from_slice(params);
    if params.len() % 2 == 1 {
        r.push(0);
    }
    r
}

/// 16 bit integers, the default integer, index and integer VDC precision.
pub(super) fn ints(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

fn metafile(body: &[Vec<u8>]) -> Vec<u8> {
    let mut r = el(id::BEGIN_METAFILE, &hex!("04 74 65 73 74"));
    for e in body {
        r.extend_from_slice(e);
    }
    r.extend(el(id::END_METAFILE, &[]));
    r
}

fn picture(body: &[Vec<u8>]) -> Vec<u8> {
    let mut r = el(id::BEGIN_PICTURE, &[0]);
    r.extend(el(id::BEGIN_PICTURE_BODY, &[]));
    for e in body {
        r.extend_from_slice(e);
    }
    r.extend(el(id::END_PICTURE, &[]));
    r
}

fn import(data: &[u8]) -> (crate::Result<Document>, Vec<String>) {
    let (r, diag) = with_session(|s| CgmImporter::new(ImportDefaults::default()).import(data, s));
    (r, diag.warnings)
}

fn primitives(doc: &Document) -> Vec<Primitive> {
    doc.primitives(doc.root())
        .unwrap()
        .map(|(_, p)| p.clone())
        .collect()
}

#[test_case(&hex!("00 22 00 00") => true ; "begin metafile")]
#[test_case(&hex!("00 3f 00 00") => true ; "long form begin metafile")]
#[test_case(&hex!("10 22 00 01") => false ; "version first")]
#[test_case(&[0] => false ; "short")]
fn check_metafile(data: &[u8]) -> bool {
    check(data)
}

#[test]
fn element_names() {
    assert_eq!("BEGIN METAFILE", element_name(id::BEGIN_METAFILE));
    assert_eq!("CIRCULAR ARC CENTRE CLOSE", element_name(id::ARC_CENTRE_CLOSE));
    assert_eq!("element 0x9060", element_name(0x9060));
}

#[test_log::test]
fn arc_centre_close_pie() {
    let data = metafile(&[picture(&[
        el(id::INTERIOR_STYLE, &ints(&[1])),
        el(
            id::ARC_CENTRE_CLOSE,
            &ints(&[100, 100, 10, 0, 0, 10, 10, 0]),
        ),
    ])]);
    let (doc, warnings) = import(&data);
    let doc = doc.unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    assert_eq!(1, doc.pages().len());
    assert_eq!("test", doc.meta.notes);

    let prims = primitives(&doc);
    assert_eq!(1, prims.len());
    let Shape::Circle(c) = prims[0].shape else {
        panic!("expect circle, got {}", prims[0].shape);
    };
    assert_eq!(ArcType::PieSlice, c.arc_type);
    let center = Point::new(100.0, 100.0);
    assert_approx_eq!(point_angle(Point::new(110.0, 100.0), center), c.angle1, 1e-6);
    assert_approx_eq!(point_angle(Point::new(100.0, 110.0), center), c.angle2, 1e-6);
    assert_approx_eq!(FRAC_PI_2, c.angle2, 1e-6);
    assert!(prims[0].style.fill.is_some());
}

#[test]
fn abstract_extent_maps_to_page() {
    let data = metafile(&[picture(&[el(
        id::RECTANGLE,
        &ints(&[0, 0, 32767, 32767]),
    )])]);
    let doc = import(&data).0.unwrap();
    let page = doc.pages()[0];
    let size = doc.page_format(page).unwrap().size;
    assert_approx_eq!(841.0, size.width, 1e-9);
    assert_approx_eq!(841.0, size.height, 1e-9);
    let prims: Vec<_> = doc.primitives(page).unwrap().collect();
    let bbox = doc.bbox(prims[0].0).unwrap().unwrap();
    assert_approx_eq!(-420.5, bbox.min.x, 1e-9);
    assert_approx_eq!(420.5, bbox.max.y, 1e-9);
}

#[test]
fn pictures_restore_metafile_defaults() {
    let rect = el(id::RECTANGLE, &ints(&[0, 0, 100, 100]));
    let data = metafile(&[
        picture(&[el(id::INTERIOR_STYLE, &ints(&[1])), rect.clone()]),
        picture(&[rect]),
    ]);
    let doc = import(&data).0.unwrap();
    assert_eq!(2, doc.pages().len());
    let first: Vec<_> = doc.primitives(doc.pages()[0]).unwrap().collect();
    let second: Vec<_> = doc.primitives(doc.pages()[1]).unwrap().collect();
    assert!(first[0].1.style.fill.is_some());
    // hollow again
    assert!(second[0].1.style.fill.is_none());
}

#[test]
fn indexed_and_direct_colour() {
    let data = metafile(&[picture(&[
        el(id::INTERIOR_STYLE, &ints(&[1])),
        // index 2 is red in the default table
        el(id::FILL_COLOUR, &[2]),
        el(id::RECTANGLE, &ints(&[0, 0, 10, 10])),
        el(id::COLOUR_SELECTION_MODE, &ints(&[1])),
        el(id::FILL_COLOUR, &hex!("00 00 ff")),
        el(id::RECTANGLE, &ints(&[0, 0, 10, 10])),
    ])]);
    let prims = primitives(&import(&data).0.unwrap());
    let colours: Vec<_> = prims
        .iter()
        .map(|p| p.style.fill.as_ref().and_then(Fill::main_color).cloned())
        .collect();
    assert_eq!(
        vec![
            Some(Color::rgb(1.0, 0.0, 0.0)),
            Some(Color::rgb(0.0, 0.0, 1.0))
        ],
        colours
    );
}

#[test]
fn missing_begin_metafile() {
    let data = el(id::POLYLINE, &ints(&[0, 0, 10, 10]));
    assert!(matches!(
        import(&data).0,
        Err(ConvertError::StructuralParse { .. })
    ));
}

#[test]
fn truncated_primitive_is_skipped() {
    let data = metafile(&[picture(&[
        el(id::POLYLINE, &hex!("00 01 00")),
        el(id::POLYLINE, &ints(&[0, 0, 10, 10])),
    ])]);
    let (doc, warnings) = import(&data);
    assert_eq!(1, primitives(&doc.unwrap()).len());
    assert_eq!(1, warnings.len());
    assert!(warnings[0].contains("expected"), "{}", warnings[0]);
}

#[test]
fn unsupported_real_precision_aborts() {
    let data = metafile(&[el(id::REAL_PRECISION, &ints(&[0, 16, 16]))]);
    assert_eq!(
        Some(ConvertError::unsupported("cgm real precision (0, 16, 16)")),
        import(&data).0.err()
    );
}

#[test]
fn truncated_description_is_skipped() {
    let data = metafile(&[
        el(id::METAFILE_DESCRIPTION, &hex!("0a 41")),
        picture(&[el(id::RECTANGLE, &ints(&[0, 0, 10, 10]))]),
    ]);
    let (doc, warnings) = import(&data);
    let doc = doc.unwrap();
    assert_eq!(1, doc.pages().len());
    assert_eq!(1, primitives(&doc).len());
    assert_eq!(1, warnings.len(), "{warnings:?}");
    assert!(warnings[0].contains("expected 10"), "{}", warnings[0]);
}

#[test]
fn truncated_application_data_is_skipped() {
    let data = metafile(&[picture(&[el(id::APPLICATION_DATA, &hex!("00"))])]);
    let (doc, warnings) = import(&data);
    assert_eq!(1, doc.unwrap().pages().len());
    assert_eq!(1, warnings.len(), "{warnings:?}");
}

#[test]
fn truncated_precision_aborts() {
    let data = metafile(&[el(id::INTEGER_PRECISION, &hex!("00"))]);
    assert!(matches!(
        import(&data).0,
        Err(ConvertError::RecordDecode { .. })
    ));
}

#[test]
fn polymarker_is_unsupported() {
    let data = metafile(&[picture(&[el(id::POLYMARKER, &ints(&[0, 0]))])]);
    let (doc, warnings) = import(&data);
    assert!(primitives(&doc.unwrap()).is_empty());
    assert_eq!(vec!["unsupported feature: cgm POLYMARKER".to_owned()], warnings);
}

#[test]
fn empty_metafile_gets_a_page() {
    let doc = import(&metafile(&[])).0.unwrap();
    assert_eq!(1, doc.pages().len());
}

#[test]
fn text_uses_font_list() {
    let data = metafile(&[
        el(id::FONT_LIST, &hex!("05 53 65 72 69 66")),
        picture(&[
            el(id::CHARACTER_HEIGHT, &ints(&[100])),
            el(id::TEXT, &[&ints(&[10, 20, 1])[..], &hex!("02 48 69")].concat()),
        ]),
    ]);
    let prims = primitives(&import(&data).0.unwrap());
    let Shape::Text(text) = &prims[0].shape else {
        panic!("expect text");
    };
    assert_eq!("Hi", text.text);
    let style = prims[0].style.text.as_ref().unwrap();
    assert_eq!("Serif", style.font_family);
    assert_approx_eq!(100.0 * 841.0 / 32767.0, style.font_size, 1e-9);
}

#[test_log::test]
fn export_then_import_keeps_rectangle() {
    let mut doc = Document::new();
    let page = doc.add_page(None);
    let layer = doc.add_layer(page, "Layer 1").unwrap();
    doc.add_primitive(
        layer,
        Primitive::new(
            Shape::Rectangle(Rectangle::new(10.0, 10.0, 20.0, 10.0)),
            Trafo::identity(),
            Style::filled(Color::rgb(1.0, 0.0, 0.0)),
        ),
    )
    .unwrap();
    let (data, _) = with_session(|s| CgmExporter::default().export(&doc, s));
    let data = data.unwrap();
    assert!(check(&data));

    let (back, warnings) = import(&data);
    let back = back.unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");
    let size = back.page_format(back.pages()[0]).unwrap().size;
    let expected = doc.page_format(page).unwrap().size;
    assert_approx_eq!(expected.width, size.width, 1e-3);
    assert_approx_eq!(expected.height, size.height, 1e-3);

    let prims: Vec<_> = back.primitives(back.root()).unwrap().collect();
    assert_eq!(1, prims.len());
    assert!(matches!(prims[0].1.shape, Shape::Rectangle(_)));
    let bbox = back.bbox(prims[0].0).unwrap().unwrap();
    assert_approx_eq!(10.0, bbox.min.x, 1e-3);
    assert_approx_eq!(10.0, bbox.min.y, 1e-3);
    assert_approx_eq!(30.0, bbox.max.x, 1e-3);
    assert_approx_eq!(20.0, bbox.max.y, 1e-3);
    let fill = prims[0].1.style.fill.as_ref().unwrap();
    assert_eq!(FillPaint::Solid(Color::rgb(1.0, 0.0, 0.0)), fill.paint);
    assert!(prims[0].1.style.stroke.is_none());
}

#[test]
fn export_long_element() {
    let mut doc = Document::new();
    let page = doc.add_page(None);
    let layer = doc.add_layer(page, "Layer 1").unwrap();
    let points: Vec<_> = (0..20)
        .map(|i| Point::new(f64::from(i), f64::from(i % 2)))
        .collect();
    doc.add_primitive(
        layer,
        Primitive::curve(
            vec![crate::geom::Path::from_points(&points, false).unwrap()],
            Trafo::identity(),
            Style::stroked(Default::default()),
        ),
    )
    .unwrap();
    let (data, _) = with_session(|s| CgmExporter::default().export(&doc, s));
    let back = import(&data.unwrap()).0.unwrap();
    let prims = primitives(&back);
    let Shape::Curve(c) = &prims[0].shape else {
        panic!("expect curve");
    };
    assert_eq!(19, c.paths[0].segments.len());
}
