/*++

Licensed under the Apache-2.0 license.

File Name:

    dom.rs

Abstract:

    Minimal owned XML element tree on top of the quick-xml reader/writer.
    quick-xml exposes a streaming event API only; the provisioning pipeline
    needs in-place mutation of a small document, so events are collected
    into a tree and written back out after patching. Whitespace text nodes
    are preserved so the emitted document keeps the template's indentation.

--*/

use anyhow::{bail, Context};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// A node in the element tree.
#[derive(Debug, Clone)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// An XML element: name, attributes in document order, child nodes.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Attribute value by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or add) an attribute.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(k, _)| k == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    /// Concatenated direct text content.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Node::Text(t) = child {
                out.push_str(t);
            }
        }
        out
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    /// Direct child elements with the given tag name.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter_map(move |n| match n {
            Node::Element(e) if e.name == tag => Some(e),
            _ => None,
        })
    }

    /// The `n`th descendant element with the given tag, pre-order.
    pub fn descendant(&self, tag: &str, n: usize) -> Option<&Element> {
        let mut counter = 0;
        find_nth(self, tag, n, &mut counter)
    }

    /// Mutable variant of [`Element::descendant`].
    pub fn descendant_mut(&mut self, tag: &str, n: usize) -> Option<&mut Element> {
        let mut counter = 0;
        find_nth_mut(self, tag, n, &mut counter)
    }

    /// Count of descendant elements with the given tag.
    pub fn descendant_count(&self, tag: &str) -> usize {
        let mut count = 0;
        walk_count(self, tag, &mut count);
        count
    }

    /// Remove the `n`th direct child element named `tag`, along with the
    /// whitespace text node preceding it. Returns whether a child was
    /// removed.
    pub fn remove_child(&mut self, tag: &str, n: usize) -> bool {
        let mut seen = 0;
        for i in 0..self.children.len() {
            let Node::Element(e) = &self.children[i] else {
                continue;
            };
            if e.name != tag {
                continue;
            }
            if seen == n {
                self.children.remove(i);
                if i > 0 {
                    if let Node::Text(t) = &self.children[i - 1] {
                        if t.trim().is_empty() {
                            self.children.remove(i - 1);
                        }
                    }
                }
                return true;
            }
            seen += 1;
        }
        false
    }
}

fn find_nth<'a>(
    el: &'a Element,
    tag: &str,
    n: usize,
    counter: &mut usize,
) -> Option<&'a Element> {
    for child in &el.children {
        if let Node::Element(e) = child {
            if e.name == tag {
                if *counter == n {
                    return Some(e);
                }
                *counter += 1;
            }
            if let Some(found) = find_nth(e, tag, n, counter) {
                return Some(found);
            }
        }
    }
    None
}

fn find_nth_mut<'a>(
    el: &'a mut Element,
    tag: &str,
    n: usize,
    counter: &mut usize,
) -> Option<&'a mut Element> {
    for child in el.children.iter_mut() {
        if let Node::Element(e) = child {
            if e.name == tag {
                if *counter == n {
                    return Some(e);
                }
                *counter += 1;
            }
            if let Some(found) = find_nth_mut(e, tag, n, counter) {
                return Some(found);
            }
        }
    }
    None
}

fn walk_count(el: &Element, tag: &str, count: &mut usize) {
    for child in &el.children {
        if let Node::Element(e) = child {
            if e.name == tag {
                *count += 1;
            }
            walk_count(e, tag, count);
        }
    }
}

fn start_to_element(e: &BytesStart) -> anyhow::Result<Element> {
    let name = String::from_utf8(e.name().as_ref().to_vec()).context("non-utf8 element name")?;
    let mut element = Element::new(name);
    for attr in e.attributes() {
        let attr = attr.context("malformed attribute")?;
        let key =
            String::from_utf8(attr.key.as_ref().to_vec()).context("non-utf8 attribute name")?;
        let value = attr.unescape_value().context("bad attribute value")?;
        element.attrs.push((key, value.into_owned()));
    }
    Ok(element)
}

/// Append text to an element, merging with a trailing text node.
fn push_text(parent: &mut Element, text: &str) {
    if let Some(Node::Text(prev)) = parent.children.last_mut() {
        prev.push_str(text);
    } else {
        parent.children.push(Node::Text(text.to_string()));
    }
}

/// Parse an XML document into its root element.
pub fn parse(text: &str) -> anyhow::Result<Element> {
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Element> = vec![];
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event().context("XML parse error")? {
            Event::Start(e) => {
                stack.push(start_to_element(&e)?);
            }
            Event::Empty(e) => {
                let element = start_to_element(&e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None if root.is_none() => root = Some(element),
                    None => bail!("multiple root elements"),
                }
            }
            Event::End(_) => {
                let element = stack.pop().context("unbalanced end tag")?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(Node::Element(element)),
                    None if root.is_none() => root = Some(element),
                    None => bail!("multiple root elements"),
                }
            }
            Event::Text(t) => {
                let raw = reader
                    .decoder()
                    .decode(t.as_ref())
                    .context("non-utf8 text")?;
                let text = quick_xml::escape::unescape(&raw).context("bad text escape")?;
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &text);
                }
            }
            Event::CData(t) => {
                let raw = reader
                    .decoder()
                    .decode(t.as_ref())
                    .context("non-utf8 cdata")?;
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &raw);
                }
            }
            // The reader splits text at entity references and reports them
            // separately.
            Event::GeneralRef(r) => {
                let name = reader
                    .decoder()
                    .decode(r.as_ref())
                    .context("non-utf8 entity reference")?;
                let resolved = match name.as_ref() {
                    "amp" => '&',
                    "lt" => '<',
                    "gt" => '>',
                    "apos" => '\'',
                    "quot" => '"',
                    _ => r
                        .resolve_char_ref()
                        .context("bad character reference")?
                        .with_context(|| format!("unsupported entity reference &{name};"))?,
                };
                if let Some(parent) = stack.last_mut() {
                    push_text(parent, &resolved.to_string());
                }
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
            Event::Eof => break,
        }
    }

    if !stack.is_empty() {
        bail!("unterminated element {:?}", stack.last().unwrap().name);
    }
    root.context("document has no root element")
}

fn write_element(el: &Element, writer: &mut Writer<&mut Vec<u8>>) -> anyhow::Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for (k, v) in &el.attrs {
        start.push_attribute((k.as_str(), v.as_str()));
    }
    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        match child {
            Node::Element(e) => write_element(e, writer)?,
            Node::Text(t) => writer.write_event(Event::Text(BytesText::new(t)))?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}

/// Serialize an element tree back to text.
pub fn serialize(root: &Element) -> anyhow::Result<String> {
    let mut buf: Vec<u8> = vec![];
    let mut writer = Writer::new(&mut buf);
    write_element(root, &mut writer)?;
    String::from_utf8(buf).context("serialized XML is not utf8")
}
