use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::catalog::{parameter_info, ElementType, ParameterInfo};
use crate::xml::{parse_document, XmlNode};

/// Name reported for models parsed from a string.
pub const DEFAULT_FILE_NAME: &str = "FromString.isfx";
const PARSED_TREE: &str = "parsed-tree";

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("XML error: {0}")]
    Xml(String),
    #[error("model has no <parsed-tree> element")]
    MissingParsedTree,
    #[error("<{tag}> lacks attribute {attribute:?}")]
    MissingAttribute { tag: String, attribute: String },
    #[error("attribute {attribute:?} is not a number: {value:?}")]
    InvalidNumber { attribute: String, value: String },
    #[error("{element_type} has no parameter with index {index}")]
    UnknownParameterType { element_type: String, index: usize },
    #[error("duplicate element name {0:?}")]
    DuplicateElement(String),
}

/// Scientific notation with a signed, two-digit exponent (`1.000e+03`).
fn scientific(value: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, value);
    match s.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(d) => ('-', d),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => s,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementParameter {
    pub name: String,
    pub unit: String,
    pub value: f64,
    /// Excluded from fitting.
    pub fixed: bool,
}

impl ElementParameter {
    fn from_node(node: &XmlNode, element_type: &ElementType) -> Result<Self, ModelError> {
        let value_text = node.required_attr("value")?;
        let value: f64 = value_text
            .trim()
            .parse()
            .map_err(|_| ModelError::InvalidNumber {
                attribute: "value".to_string(),
                value: value_text.to_string(),
            })?;

        let catalog = || -> Result<ParameterInfo, ModelError> {
            let index_text = node.required_attr("index")?;
            let index: usize = index_text
                .trim()
                .parse()
                .map_err(|_| ModelError::InvalidNumber {
                    attribute: "index".to_string(),
                    value: index_text.to_string(),
                })?;
            parameter_info(element_type, index).ok_or_else(|| ModelError::UnknownParameterType {
                element_type: element_type.to_string(),
                index,
            })
        };
        let name = match node.attr("name") {
            Some(n) => n.to_string(),
            None => catalog()?.name.to_string(),
        };
        let unit = match node.attr("unit") {
            Some(u) => u.to_string(),
            None => catalog()?.unit.to_string(),
        };

        Ok(Self {
            name,
            unit,
            value,
            fixed: node.attr("fitterFixed") == Some("0"),
        })
    }
}

impl fmt::Display for ElementParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            " {:>6}: {:>10} {:<8} fixed: {}",
            self.name,
            scientific(self.value, 3),
            self.unit,
            self.fixed
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitElement {
    pub name: String,
    pub element_type: ElementType,
    pub parameters: Vec<ElementParameter>,
}

impl CircuitElement {
    fn from_node(node: &XmlNode) -> Result<Self, ModelError> {
        let name = node.required_attr("name")?.to_string();
        let element_type = ElementType::from_tag(&node.tag);

        let mut parameter_nodes = node.find_all("parameter");
        if parameter_nodes.is_empty() {
            parameter_nodes = node.find_all("user-parameter");
        }
        let parameters = parameter_nodes
            .into_iter()
            .map(|p| ElementParameter::from_node(p, &element_type))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            element_type,
            parameters,
        })
    }

    pub fn parameter(&self, name: &str) -> Option<&ElementParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

impl fmt::Display for CircuitElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} : {}", self.element_type, self.name)?;
        for p in &self.parameters {
            writeln!(f, "{}", p)?;
        }
        Ok(())
    }
}

/// Tags carrying only a non-empty `name` and some content are circuit
/// element types.
fn is_element_node(node: &XmlNode) -> bool {
    node.attributes.len() == 1
        && node.attr("name").is_some_and(|n| !n.is_empty())
        && !node.children.is_empty()
}

fn collect_elements(document: &XmlNode) -> Result<Vec<CircuitElement>, ModelError> {
    let tree = document
        .find(PARSED_TREE)
        .ok_or(ModelError::MissingParsedTree)?;
    let nodes = tree.descendants();
    let element_tags: HashSet<&str> = nodes
        .iter()
        .filter(|n| is_element_node(n))
        .map(|n| n.tag.as_str())
        .collect();

    let mut seen = HashSet::new();
    let mut elements = Vec::new();
    for node in nodes.iter().filter(|n| element_tags.contains(n.tag.as_str())) {
        let element = CircuitElement::from_node(node)?;
        if !seen.insert(element.name.clone()) {
            return Err(ModelError::DuplicateElement(element.name));
        }
        elements.push(element);
    }
    Ok(elements)
}

/// Equivalent-circuit model read from `.isfx` XML.
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitModel {
    file_name: String,
    xml: String,
    elements: Vec<CircuitElement>,
}

impl CircuitModel {
    pub fn from_xml(xml: impl Into<String>) -> Result<Self, ModelError> {
        Self::parse(xml.into(), DEFAULT_FILE_NAME.to_string())
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse(xml, file_name)
    }

    fn parse(xml: String, file_name: String) -> Result<Self, ModelError> {
        let document = parse_document(&xml)?;
        let elements = collect_elements(&document)?;
        log::debug!("Parsed {} with {} elements", file_name, elements.len());
        Ok(Self {
            file_name,
            xml,
            elements,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The model XML exactly as read.
    pub fn xml(&self) -> &str {
        &self.xml
    }

    pub fn binary_content(&self) -> &[u8] {
        self.xml.as_bytes()
    }

    pub fn elements(&self) -> &[CircuitElement] {
        &self.elements
    }

    pub fn element(&self, name: &str) -> Option<&CircuitElement> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Shorthand for `element(element)?.parameter(parameter)`.
    pub fn parameter(&self, element: &str, parameter: &str) -> Option<&ElementParameter> {
        self.element(element)?.parameter(parameter)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, &self.xml)
    }
}

impl FromStr for CircuitModel {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_xml(s)
    }
}

impl fmt::Display for CircuitModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for e in &self.elements {
            write!(f, "{}", e)?;
        }
        Ok(())
    }
}
