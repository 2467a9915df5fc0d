//! Owned XML tree
//!
//! `roxmltree` documents borrow the source text, so parsed XML is copied
//! into an owned [`XmlElement`] tree that can outlive the response body.

use roxmltree::{Document, Node, ParsingOptions};
use serde::Serialize;
use std::fmt;

/// An XML element with its attributes and children, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct XmlElement {
    /// Local tag name
    pub name: String,
    /// Attributes as (name, value) pairs
    pub attributes: Vec<(String, String)>,
    /// Child elements and non-blank text runs
    pub children: Vec<XmlNode>,
}

/// A child of an [`XmlElement`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

impl XmlElement {
    /// Returns the value of the named attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the first child element with the given name
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|element| element.name == name)
    }

    /// Iterates over child elements, skipping text
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|node| match node {
            XmlNode::Element(element) => Some(element),
            XmlNode::Text(_) => None,
        })
    }

    /// Concatenates all descendant text in document order
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for node in &self.children {
            match node {
                XmlNode::Text(text) => out.push_str(text),
                XmlNode::Element(element) => element.collect_text(out),
            }
        }
    }

    fn from_node(node: Node<'_, '_>) -> Self {
        let attributes = node
            .attributes()
            .map(|attr| (attr.name().to_string(), attr.value().to_string()))
            .collect();

        let children = node
            .children()
            .filter_map(|child| {
                if child.is_element() {
                    Some(XmlNode::Element(Self::from_node(child)))
                } else if child.is_text() {
                    child
                        .text()
                        .filter(|text| !text.trim().is_empty())
                        .map(|text| XmlNode::Text(text.to_string()))
                } else {
                    None
                }
            })
            .collect();

        Self {
            name: node.tag_name().name().to_string(),
            attributes,
            children,
        }
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.name)?;
        for (name, value) in &self.attributes {
            write!(f, " {}=\"{}\"", name, escape(value, true))?;
        }
        if self.children.is_empty() {
            return write!(f, "/>");
        }
        write!(f, ">")?;
        for child in &self.children {
            match child {
                XmlNode::Element(element) => write!(f, "{}", element)?,
                XmlNode::Text(text) => write!(f, "{}", escape(text, false))?,
            }
        }
        write!(f, "</{}>", self.name)
    }
}

fn escape(text: &str, in_attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if in_attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Returns true if the body starts with an XML declaration
///
/// Leading whitespace is ignored; the declaration must be followed by
/// whitespace (`<?xml version=...`).
pub fn has_xml_declaration(body: &str) -> bool {
    body.trim_start()
        .strip_prefix("<?xml")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Parses an XML document into an owned tree rooted at its document element
///
/// Returns None if the body is not well-formed XML.
pub fn parse_xml(body: &str) -> Option<XmlElement> {
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;

    match Document::parse_with_options(body.trim_start(), options) {
        Ok(document) => Some(XmlElement::from_node(document.root_element())),
        Err(e) => {
            tracing::debug!("Body has an XML declaration but failed to parse: {}", e);
            None
        }
    }
}
