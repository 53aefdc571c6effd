use super::*;

#[test]
fn element_tree() {
    let root = parse(
        br##"<?xml version="1.0"?>
<svg:svg xmlns:svg="http://www.w3.org/2000/svg" width="10">
  <svg:g id="a"><svg:rect x="1"/></svg:g>
  <svg:text>Hello <svg:tspan>world</svg:tspan> &amp; more</svg:text>
  <svg:use xlink:href="#a"/>
</svg:svg>"##,
    )
    .unwrap();
    assert_eq!("svg", root.name);
    assert_eq!(Some("10"), root.attr("width"));
    assert_eq!(3, root.children.len());
    assert_eq!("rect", root.children[0].children[0].name);
    assert_eq!(Some("a"), root.children[0].id());
    assert_eq!(Some("a"), root.children[2].href());
    assert_eq!("Hello world & more", root.children[1].all_text());
    assert_eq!(TEXT_NODE, root.children[1].children[1].name);
}

#[test]
fn not_svg() {
    assert!(matches!(
        parse(b"<html></html>"),
        Err(ConvertError::StructuralParse { .. })
    ));
}

#[test]
fn malformed() {
    assert!(matches!(
        parse(b"<svg><g></svg>"),
        Err(ConvertError::StructuralParse { .. })
    ));
}

fn nested_groups(depth: usize) -> Vec<u8> {
    let mut s = "<svg>".to_owned();
    s.push_str(&"<g>".repeat(depth));
    s.push_str("<rect/>");
    s.push_str(&"</g>".repeat(depth));
    s.push_str("</svg>");
    s.into_bytes()
}

#[test]
fn nesting_limit() {
    let mut el = &parse(&nested_groups(MAX_DEPTH - 1)).unwrap();
    let mut depth = 0;
    while let Some(child) = el.children.first() {
        el = child;
        depth += 1;
    }
    assert_eq!("rect", el.name);
    assert_eq!(MAX_DEPTH, depth);

    let err = parse(&nested_groups(MAX_DEPTH)).unwrap_err();
    assert!(err.to_string().contains("nested deeper"), "{err}");
}

#[test]
fn deep_nesting_fails_without_overflow() {
    assert!(matches!(
        parse(&nested_groups(200_000)),
        Err(ConvertError::StructuralParse { .. })
    ));
}
