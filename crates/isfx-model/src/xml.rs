//! Minimal element tree built from quick-xml events.
//!
//! Only tags, attributes and nesting are kept; text, comments and processing
//! instructions are dropped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::model::ModelError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub tag: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    fn from_start(e: &BytesStart<'_>) -> Result<Self, ModelError> {
        let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| ModelError::Xml(err.to_string()))?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr
                .unescape_value()
                .map_err(|err| ModelError::Xml(err.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(Self {
            tag,
            attributes,
            children: Vec::new(),
        })
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Like [`attr`](Self::attr), but a missing attribute is an error.
    pub fn required_attr(&self, name: &str) -> Result<&str, ModelError> {
        self.attr(name).ok_or_else(|| ModelError::MissingAttribute {
            tag: self.tag.clone(),
            attribute: name.to_string(),
        })
    }

    /// All nodes below this one, depth first in document order.
    pub fn descendants(&self) -> Vec<&XmlNode> {
        let mut out = Vec::new();
        let mut stack: Vec<&XmlNode> = self.children.iter().rev().collect();
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Descendants with the given tag.
    pub fn find_all(&self, tag: &str) -> Vec<&XmlNode> {
        self.descendants()
            .into_iter()
            .filter(|n| n.tag == tag)
            .collect()
    }

    /// First descendant with the given tag.
    pub fn find(&self, tag: &str) -> Option<&XmlNode> {
        self.descendants().into_iter().find(|n| n.tag == tag)
    }
}

/// Parse a document into a synthetic root whose children are the top-level
/// elements.
pub fn parse_document(text: &str) -> Result<XmlNode, ModelError> {
    let mut reader = Reader::from_str(text);
    let mut stack = vec![XmlNode::default()];

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ModelError::Xml(format!("at byte {}: {}", reader.buffer_position(), e)))?;
        match event {
            Event::Start(ref e) => stack.push(XmlNode::from_start(e)?),
            Event::Empty(ref e) => {
                let node = XmlNode::from_start(e)?;
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Event::End(_) => {
                if stack.len() < 2 {
                    return Err(ModelError::Xml("unbalanced closing tag".to_string()));
                }
                if let Some(node) = stack.pop() {
                    if let Some(parent) = stack.last_mut() {
                        parent.children.push(node);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if stack.len() != 1 {
        return Err(ModelError::Xml(format!(
            "{} unclosed element(s) at end of document",
            stack.len() - 1
        )));
    }
    Ok(stack.pop().unwrap_or_default())
}
