//! Arena-backed XML element tree for in-place document mutation.
//!
//! Package parts are parsed once into an arena of nodes addressed by
//! [`NodeId`] handles, mutated through the handles, and serialized back
//! with quick-xml. Qualified names keep their prefixes verbatim
//! (`p:sp`, `a:off`), matching how PresentationML parts are edited.
//!
//! Mixed element/text content is not preserved: text is stored per
//! element, which covers PresentationML and chart parts where text only
//! occurs in leaf elements (`a:t`, `c:v`).

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum XmlError {
    #[error("XML parsing error: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    Attr(String),

    #[error("UTF-8 conversion error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("document has no root element")]
    NoRoot,
}

impl From<quick_xml::events::attributes::AttrError> for XmlError {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        XmlError::Attr(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, XmlError>;

/// Handle to one element in an [`XmlDoc`] arena.
///
/// Handles stay valid for the lifetime of the document; detaching a
/// subtree makes it unreachable from the root without invalidating ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

#[derive(Debug, Clone)]
struct Node {
    name: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// One XML part held as a mutable element arena.
#[derive(Debug, Clone)]
pub struct XmlDoc {
    nodes: Vec<Node>,
    root: NodeId,
}

impl XmlDoc {
    /// Parse a part from its raw bytes.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(bytes);
        let mut nodes: Vec<Node> = Vec::new();
        let mut stack: Vec<NodeId> = Vec::new();
        let mut root: Option<NodeId> = None;
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    let id = push_node(&mut nodes, e, stack.last().copied())?;
                    if let Some(&parent) = stack.last() {
                        nodes[parent.0 as usize].children.push(id);
                    } else if root.is_none() {
                        root = Some(id);
                    }
                    stack.push(id);
                },
                Event::Empty(ref e) => {
                    let id = push_node(&mut nodes, e, stack.last().copied())?;
                    if let Some(&parent) = stack.last() {
                        nodes[parent.0 as usize].children.push(id);
                    } else if root.is_none() {
                        root = Some(id);
                    }
                },
                Event::Text(ref t) => {
                    let raw = std::str::from_utf8(t.as_ref())?;
                    // Whitespace between elements is formatting, not content.
                    if raw.trim().is_empty() {
                        continue;
                    }
                    let text = quick_xml::escape::unescape(raw)
                        .map_err(|e| XmlError::Attr(e.to_string()))?;
                    if let Some(&current) = stack.last() {
                        let node = &mut nodes[current.0 as usize];
                        match node.text {
                            Some(ref mut existing) => existing.push_str(&text),
                            None => node.text = Some(text.into_owned()),
                        }
                    }
                },
                Event::End(_) => {
                    stack.pop();
                },
                Event::Eof => break,
                // Declarations, comments, PIs and doctypes carry no
                // content this system edits.
                _ => {},
            }
            buf.clear();
        }

        let root = root.ok_or(XmlError::NoRoot)?;
        Ok(Self { nodes, root })
    }

    /// Serialize the tree back to bytes, with an XML declaration.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
        self.write_element(&mut writer, self.root)?;
        Ok(writer.into_inner())
    }

    fn write_element(&self, writer: &mut Writer<Vec<u8>>, id: NodeId) -> Result<()> {
        let node = &self.nodes[id.0 as usize];
        let mut start = BytesStart::new(node.name.as_str());
        for (key, value) in &node.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if node.children.is_empty() && node.text.is_none() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(ref text) = node.text {
            writer.write_event(Event::Text(BytesText::new(text)))?;
        }
        for &child in &node.children {
            self.write_element(writer, child)?;
        }
        writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
        Ok(())
    }

    /// The document's root element.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Qualified element name, prefix included.
    #[inline]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0 as usize].name
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0 as usize].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0 as usize].children
    }

    /// Attribute value by name.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0 as usize]
            .attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set (or add) an attribute, preserving attribute order.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        let node = &mut self.nodes[id.0 as usize];
        match node.attrs.iter_mut().find(|(key, _)| key == name) {
            Some((_, existing)) => *existing = value.into(),
            None => node.attrs.push((name.to_string(), value.into())),
        }
    }

    /// Remove an attribute if present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) {
        self.nodes[id.0 as usize].attrs.retain(|(key, _)| key != name);
    }

    #[inline]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0 as usize].text.as_deref()
    }

    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0 as usize].text = Some(text.into());
    }

    /// First direct child with the given qualified name.
    pub fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.name(child) == name)
    }

    /// Descendants of `id` in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            result.push(node);
            stack.extend(self.children(node).iter().rev());
        }
        result
    }

    /// First descendant with the given qualified name, document order.
    pub fn find_descendant(&self, id: NodeId, name: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            if self.name(node) == name {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        None
    }

    /// All descendants with the given qualified name, document order.
    pub fn find_descendants(&self, id: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(id)
            .into_iter()
            .filter(|&node| self.name(node) == name)
            .collect()
    }

    /// First descendant whose local name (prefix stripped) matches.
    pub fn find_descendant_local(&self, id: NodeId, local: &str) -> Option<NodeId> {
        let mut stack: Vec<NodeId> = self.children(id).iter().rev().copied().collect();
        while let Some(node) = stack.pop() {
            let name = self.name(node);
            if name.rsplit(':').next() == Some(local) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev());
        }
        None
    }

    /// Create a new element without attaching it anywhere.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: name.into(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
            parent: None,
        });
        id
    }

    /// Append `child` to `parent`'s child list, detaching it from any
    /// previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0 as usize].children.push(child);
        self.nodes[child.0 as usize].parent = Some(parent);
    }

    /// Insert `child` at a position in `parent`'s child list.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0 as usize].children.insert(index, child);
        self.nodes[child.0 as usize].parent = Some(parent);
    }

    /// Remove the subtree rooted at `id` from its parent. The nodes stay
    /// in the arena (ids remain valid) but no longer serialize.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0 as usize].parent {
            self.nodes[parent.0 as usize]
                .children
                .retain(|&child| child != id);
            self.nodes[id.0 as usize].parent = None;
        }
    }

    /// Detach every child of `id`.
    pub fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0 as usize].children);
        for child in children {
            self.nodes[child.0 as usize].parent = None;
        }
    }

    /// Remove all attributes, text and children of `id`.
    pub fn clear(&mut self, id: NodeId) {
        self.clear_children(id);
        let node = &mut self.nodes[id.0 as usize];
        node.attrs.clear();
        node.text = None;
    }

    /// Deep-copy the subtree rooted at `id`. The copy gets fresh ids,
    /// shares nothing with the source, and starts detached.
    pub fn deep_clone(&mut self, id: NodeId) -> NodeId {
        let copy = self.clone_shallow(id);
        let children = self.nodes[id.0 as usize].children.clone();
        for child in children {
            let child_copy = self.deep_clone(child);
            self.nodes[copy.0 as usize].children.push(child_copy);
            self.nodes[child_copy.0 as usize].parent = Some(copy);
        }
        copy
    }

    fn clone_shallow(&mut self, id: NodeId) -> NodeId {
        let source = &self.nodes[id.0 as usize];
        let node = Node {
            name: source.name.clone(),
            attrs: source.attrs.clone(),
            text: source.text.clone(),
            children: Vec::new(),
            parent: None,
        };
        let copy = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        copy
    }

    /// Copy a subtree from another document into this arena. Returns the
    /// detached copy's root.
    pub fn import(&mut self, source: &XmlDoc, id: NodeId) -> NodeId {
        let src = &source.nodes[id.0 as usize];
        let copy = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            name: src.name.clone(),
            attrs: src.attrs.clone(),
            text: src.text.clone(),
            children: Vec::new(),
            parent: None,
        });
        for &child in &src.children {
            let child_copy = self.import(source, child);
            self.nodes[copy.0 as usize].children.push(child_copy);
            self.nodes[child_copy.0 as usize].parent = Some(copy);
        }
        copy
    }

    /// Get the first direct child with the given name, creating an empty
    /// one (appended last) if absent.
    pub fn get_or_create_child(&mut self, parent: NodeId, name: &str) -> NodeId {
        if let Some(child) = self.find_child(parent, name) {
            return child;
        }
        let child = self.create_element(name);
        self.append_child(parent, child);
        child
    }
}

fn push_node(nodes: &mut Vec<Node>, e: &BytesStart, parent: Option<NodeId>) -> Result<NodeId> {
    let name = std::str::from_utf8(e.name().as_ref())?.to_string();
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr?;
        let key = std::str::from_utf8(attr.key.as_ref())?.to_string();
        let value = attr.unescape_value()?.into_owned();
        attrs.push((key, value));
    }
    let id = NodeId(nodes.len() as u32);
    nodes.push(Node {
        name,
        attrs,
        text: None,
        children: Vec::new(),
        parent,
    });
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">
  <p:cSld>
    <p:spTree>
      <p:sp><p:nvSpPr><p:cNvPr id="2" name="Box" title="B2"/></p:nvSpPr><p:txBody><a:p><a:r><a:t>hello</a:t></a:r></a:p></p:txBody></p:sp>
      <p:sp><p:nvSpPr><p:cNvPr id="3" name="Other"/></p:nvSpPr></p:sp>
    </p:spTree>
  </p:cSld>
</p:sld>"#;

    #[test]
    fn test_parse_and_navigate() {
        let doc = XmlDoc::parse(SAMPLE.as_bytes()).unwrap();
        assert_eq!(doc.name(doc.root()), "p:sld");

        let sp_tree = doc.find_descendant(doc.root(), "p:spTree").unwrap();
        let shapes = doc.find_descendants(sp_tree, "p:sp");
        assert_eq!(shapes.len(), 2);

        let cnv = doc.find_descendant(shapes[0], "p:cNvPr").unwrap();
        assert_eq!(doc.attr(cnv, "title"), Some("B2"));
        assert_eq!(doc.attr(cnv, "id"), Some("2"));

        let t = doc.find_descendant(shapes[0], "a:t").unwrap();
        assert_eq!(doc.text(t), Some("hello"));
    }

    #[test]
    fn test_mutate_and_serialize() {
        let mut doc = XmlDoc::parse(SAMPLE.as_bytes()).unwrap();
        let t = doc.find_descendant(doc.root(), "a:t").unwrap();
        doc.set_text(t, "42 < 43");

        let bytes = doc.serialize().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("<a:t>42 &lt; 43</a:t>"));

        // Round-trips through the parser.
        let again = XmlDoc::parse(text.as_bytes()).unwrap();
        let t = again.find_descendant(again.root(), "a:t").unwrap();
        assert_eq!(again.text(t), Some("42 < 43"));
    }

    #[test]
    fn test_detach_removes_from_output() {
        let mut doc = XmlDoc::parse(SAMPLE.as_bytes()).unwrap();
        let sp_tree = doc.find_descendant(doc.root(), "p:spTree").unwrap();
        let shapes = doc.find_descendants(sp_tree, "p:sp");
        doc.detach(shapes[0]);

        let text = String::from_utf8(doc.serialize().unwrap()).unwrap();
        assert!(!text.contains("title=\"B2\""));
        assert!(text.contains("name=\"Other\""));
        // The handle is still usable after detach.
        assert_eq!(doc.name(shapes[0]), "p:sp");
        assert!(doc.parent(shapes[0]).is_none());
    }

    #[test]
    fn test_deep_clone_is_independent() {
        let mut doc = XmlDoc::parse(SAMPLE.as_bytes()).unwrap();
        let sp_tree = doc.find_descendant(doc.root(), "p:spTree").unwrap();
        let shape = doc.find_descendants(sp_tree, "p:sp")[0];

        let copy = doc.deep_clone(shape);
        assert_ne!(copy, shape);
        assert!(doc.parent(copy).is_none());

        let copy_cnv = doc.find_descendant(copy, "p:cNvPr").unwrap();
        doc.set_attr(copy_cnv, "id", "99");

        let orig_cnv = doc.find_descendant(shape, "p:cNvPr").unwrap();
        assert_eq!(doc.attr(orig_cnv, "id"), Some("2"));
        assert_eq!(doc.attr(copy_cnv, "id"), Some("99"));
    }

    #[test]
    fn test_get_or_create_child() {
        let mut doc = XmlDoc::parse("<c:scaling/>".as_bytes()).unwrap();
        let root = doc.root();
        let max = doc.get_or_create_child(root, "c:max");
        assert_eq!(doc.get_or_create_child(root, "c:max"), max);
        assert_eq!(doc.children(root).len(), 1);
    }

    #[test]
    fn test_import_across_documents() {
        let source = XmlDoc::parse(SAMPLE.as_bytes()).unwrap();
        let shape = source.find_descendant(source.root(), "p:sp").unwrap();

        let mut target = XmlDoc::parse("<p:spTree/>".as_bytes()).unwrap();
        let copy = target.import(&source, shape);
        target.append_child(target.root(), copy);

        let text = String::from_utf8(target.serialize().unwrap()).unwrap();
        assert!(text.contains("title=\"B2\""));
        assert!(text.contains("<a:t>hello</a:t>"));
    }
}
