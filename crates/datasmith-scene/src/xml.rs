//! Owned XML element tree with quick-xml backed parse and render.
//!
//! The scene document is small enough to hold fully in memory, and both
//! directions (parse and render) want random access to attributes and
//! children, so the event streams are materialized into this tree.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{Result, SceneError};

/// One XML element: tag, ordered attributes, optional text, children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    /// Element tag.
    pub tag: String,
    /// Attributes in document order.
    pub attrs: Vec<(String, String)>,
    /// Text content, if any.
    pub text: Option<String>,
    /// Child elements in document order.
    pub children: Vec<XmlElement>,
}

impl XmlElement {
    /// Create an element with the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Builder: add an attribute.
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((key.into(), value.into()));
        self
    }

    /// Builder: set the text content.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Builder: add a child element.
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    /// Add an attribute in place.
    pub fn set_attr(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attrs.push((key.into(), value.into()));
    }

    /// Add a child element in place.
    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Look up an attribute value.
    pub fn attr_value(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First child with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.tag == tag)
    }

    /// All children with the given tag, in document order.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a XmlElement> {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Text content of the first child with the given tag.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.find_child(tag).and_then(|c| c.text.as_deref())
    }

    /// `value` attribute of the first child with the given tag.
    pub fn child_value(&self, tag: &str) -> Option<&str> {
        self.find_child(tag).and_then(|c| c.attr_value("value"))
    }

    /// Parse a document into its root element.
    pub fn parse(text: &str) -> Result<XmlElement> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;

        loop {
            let position = reader.buffer_position() as u64;
            match reader.read_event() {
                Ok(Event::Start(start)) => stack.push(element_from_start(&start, position)?),
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start, position)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| SceneError::parse("unbalanced closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => {
                    if let Some(top) = stack.last_mut() {
                        let chunk = text.unescape().map_err(|e| SceneError::Xml {
                            message: e.to_string(),
                            position,
                        })?;
                        match &mut top.text {
                            Some(existing) => existing.push_str(&chunk),
                            None => top.text = Some(chunk.into_owned()),
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {} // declarations, comments, processing instructions
                Err(e) => {
                    return Err(SceneError::Xml {
                        message: e.to_string(),
                        position,
                    })
                }
            }
        }

        if !stack.is_empty() {
            return Err(SceneError::parse("document ended with unclosed elements"));
        }
        root.ok_or_else(|| SceneError::parse("document has no root element"))
    }

    /// Render the element as a full document, indented, with declaration.
    pub fn to_document_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
            .map_err(write_error)?;
        self.write_into(&mut writer)?;

        let mut bytes = writer.into_inner();
        bytes.push(b'\n');
        String::from_utf8(bytes).map_err(|_| SceneError::parse("rendered document is not utf-8"))
    }

    fn write_into(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.tag.as_str());
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() && self.text.is_none() {
            return writer.write_event(Event::Empty(start)).map_err(write_error);
        }

        writer.write_event(Event::Start(start)).map_err(write_error)?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(write_error)?;
        }
        for child in &self.children {
            child.write_into(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.tag.as_str())))
            .map_err(write_error)
    }
}

fn write_error<E: std::fmt::Display>(e: E) -> SceneError {
    SceneError::parse(format!("xml write: {e}"))
}

fn element_from_start(start: &BytesStart<'_>, position: u64) -> Result<XmlElement> {
    let tag = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(tag);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| SceneError::Xml {
            message: e.to_string(),
            position,
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| SceneError::Xml {
                message: e.to_string(),
                position,
            })?
            .into_owned();
        element.attrs.push((key, value));
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(SceneError::parse("document has multiple root elements"))
    }
}

/// Parse a float attribute or element value.
pub(crate) fn parse_float(value: &str, what: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|_| SceneError::parse(format!("{what}: invalid number {value:?}")))
}
