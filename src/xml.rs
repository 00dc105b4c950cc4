//! Minimal element tree and its pretty-printed serialization.
//!
//! Documents describe their XML shape through [`ToXml`]; [`serialize`] wraps
//! that shape in the `<kml>` root with both namespaces and writes it with a
//! declaration and 2-space indentation. Output depends only on the tree.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::error::{KmzError, Result};

pub const KML_NAMESPACE: &str = "http://www.opengis.net/kml/2.2";
pub const WPML_NAMESPACE: &str = "http://www.dji.com/wpmz/1.0.6";

const INDENT_WIDTH: usize = 2;

/// Anything that renders to the `<Document>` element of a KML/WPML file.
pub trait ToXml {
    fn to_xml(&self) -> XmlElement;
}

#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub content: XmlContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum XmlContent {
    Empty,
    Text(String),
    Children(Vec<XmlElement>),
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: XmlContent::Empty,
        }
    }

    /// Leaf element holding `text`.
    pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            content: XmlContent::Text(text.into()),
        }
    }

    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    pub fn child(mut self, child: XmlElement) -> Self {
        self.push(child);
        self
    }

    /// Shorthand for `child(XmlElement::leaf(name, text))`.
    pub fn text(self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.child(XmlElement::leaf(name, text))
    }

    pub fn children(mut self, children: impl IntoIterator<Item = XmlElement>) -> Self {
        for c in children {
            self.push(c);
        }
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        match &mut self.content {
            XmlContent::Children(list) => list.push(child),
            // text and children never mix in these documents; a child replaces text
            content => *content = XmlContent::Children(vec![child]),
        }
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        match &self.content {
            XmlContent::Children(list) => list.iter().find(|c| c.name == name),
            _ => None,
        }
    }

    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            XmlContent::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Fixed-point rendering used for every floating-point field.
pub fn fixed(value: f64, decimals: usize) -> String {
    format!("{value:.decimals$}")
}

/// Render `doc` as a complete UTF-8 KML/WPML file.
pub fn serialize<D: ToXml + ?Sized>(doc: &D) -> Result<String> {
    let root = XmlElement::new("kml")
        .attr("xmlns", KML_NAMESPACE)
        .attr("xmlns:wpml", WPML_NAMESPACE)
        .child(doc.to_xml());

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(KmzError::xml)?;
    write_element(&mut writer, &root)?;

    String::from_utf8(writer.into_inner()).map_err(KmzError::xml)
}

fn write_element(writer: &mut Writer<Vec<u8>>, el: &XmlElement) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (key, value) in &el.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    match &el.content {
        XmlContent::Empty => {
            writer.write_event(Event::Empty(start)).map_err(KmzError::xml)?;
        }
        XmlContent::Text(text) => {
            writer.write_event(Event::Start(start)).map_err(KmzError::xml)?;
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(KmzError::xml)?;
            writer
                .write_event(Event::End(BytesEnd::new(el.name.as_str())))
                .map_err(KmzError::xml)?;
        }
        XmlContent::Children(children) => {
            writer.write_event(Event::Start(start)).map_err(KmzError::xml)?;
            for child in children {
                write_element(writer, child)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(el.name.as_str())))
                .map_err(KmzError::xml)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    impl ToXml for Sample {
        fn to_xml(&self) -> XmlElement {
            XmlElement::new("Document")
                .text("wpml:author", "pilot & co")
                .child(XmlElement::new("wpml:payloadParam").text("wpml:payloadPositionIndex", "7"))
                .child(XmlElement::new("wpml:actionActuatorFuncParam"))
        }
    }

    #[test]
    fn test_layout() {
        let expected = r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2" xmlns:wpml="http://www.dji.com/wpmz/1.0.6">
  <Document>
    <wpml:author>pilot &amp; co</wpml:author>
    <wpml:payloadParam>
      <wpml:payloadPositionIndex>7</wpml:payloadPositionIndex>
    </wpml:payloadParam>
    <wpml:actionActuatorFuncParam/>
  </Document>
</kml>"#;
        assert_eq!(serialize(&Sample).unwrap(), expected);
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(serialize(&Sample).unwrap(), serialize(&Sample).unwrap());
    }

    #[test]
    fn test_fixed_precision() {
        assert_eq!(fixed(1.0, 6), "1.000000");
        assert_eq!(fixed(113.5, 12), "113.500000000000");
        assert_eq!(fixed(-90.0, 6), "-90.000000");
        assert_eq!(fixed(1e-7, 6), "0.000000");
    }

    #[test]
    fn test_find_child() {
        let el = Sample.to_xml();
        assert_eq!(
            el.find("wpml:author").and_then(XmlElement::text_content),
            Some("pilot & co")
        );
        assert!(el.find("wpml:missing").is_none());
    }
}
