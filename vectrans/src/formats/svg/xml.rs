//! Element tree of an SVG document.

use crate::error::{ConvertError, Result};
use quick_xml::{events::BytesStart, events::Event, Reader};

/// Name of the pseudo element holding text that follows a child element.
pub const TEXT_NODE: &str = "#text";

/// Deepest element nesting accepted by [`parse`].
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    /// Local name, namespace prefix removed.
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Character data before the first child. Later runs are kept as
    /// `#text` children so document order survives.
    pub text: String,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    /// `href` or `xlink:href`, without the leading `#`.
    pub fn href(&self) -> Option<&str> {
        self.attr("href")
            .or_else(|| self.attr("xlink:href"))
            .map(|s| s.trim().trim_start_matches('#'))
    }

    /// Text of the element and its descendants, in document order.
    pub fn all_text(&self) -> String {
        let mut r = self.text.clone();
        for c in &self.children {
            r.push_str(&c.all_text());
        }
        r
    }
}

fn local_name(name: &[u8]) -> String {
    let name = String::from_utf8_lossy(name);
    match name.rsplit_once(':') {
        Some((_, local)) => local.to_owned(),
        None => name.into_owned(),
    }
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn xml_error(offset: usize, e: impl std::fmt::Display) -> ConvertError {
    ConvertError::structural(offset, 0, format!("xml: {e}"))
}

fn element(reader: &Reader<&[u8]>, e: &BytesStart<'_>) -> Result<Element> {
    let mut attrs = vec![];
    for attr in e.attributes() {
        let attr = attr.map_err(|e| xml_error(position(reader), e))?;
        let value = attr
            .unescape_value()
            .map_err(|e| xml_error(position(reader), e))?;
        attrs.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value.into_owned(),
        ));
    }
    Ok(Element {
        name: local_name(e.name().as_ref()),
        attrs,
        ..Default::default()
    })
}

/// Whitespace between elements is dropped.
fn push_text(el: &mut Element, text: &str) {
    if text.trim().is_empty() {
        return;
    }
    match el.children.last_mut() {
        None => el.text.push_str(text),
        Some(last) if last.name == TEXT_NODE => last.text.push_str(text),
        Some(_) => el.children.push(Element {
            name: TEXT_NODE.to_owned(),
            text: text.to_owned(),
            ..Default::default()
        }),
    }
}

/// Parse the document and return its `svg` root element.
pub fn parse(data: &[u8]) -> Result<Element> {
    let mut reader = Reader::from_reader(data);

    let mut stack: Vec<Element> = vec![];
    let mut root = None;
    let mut buf = Vec::new();
    loop {
        let event = reader
            .read_event_into(&mut buf)
            .map_err(|e| xml_error(usize::try_from(reader.error_position()).unwrap_or(0), e))?;
        match event {
            Event::Start(ref e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(ConvertError::structural(
                        position(&reader),
                        0,
                        format!("elements nested deeper than {MAX_DEPTH} levels"),
                    ));
                }
                stack.push(element(&reader, e)?)
            }
            Event::Empty(ref e) => {
                let el = element(&reader, e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(el),
                    None => root = root.or(Some(el)),
                }
            }
            Event::End(_) => {
                if let Some(el) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(el),
                        None => root = root.or(Some(el)),
                    }
                }
            }
            Event::Text(ref t) => {
                let text = t.unescape().map_err(|e| xml_error(position(&reader), e))?;
                if let Some(top) = stack.last_mut() {
                    push_text(top, &text);
                }
            }
            Event::CData(ref t) => {
                if let Some(top) = stack.last_mut() {
                    push_text(top, &String::from_utf8_lossy(t));
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match root {
        Some(root) if root.name == "svg" => Ok(root),
        _ => Err(ConvertError::structural(0, 0, "no svg root element")),
    }
}

#[cfg(test)]
mod tests;
