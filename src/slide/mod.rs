//! Document model accessor for the slide part.
//!
//! [`SlideDoc`] owns the parsed slide tree plus per-generation session
//! state: the title index, the template shape registry and the monotonic
//! shape-id counter (seeded from the maximum id found at load time, and
//! owned by the session rather than shared globally).
//!
//! Lifecycle per generation: Loaded -> Indexed -> Mutated (n times) ->
//! Serialized -> Archived -> Disposed.

mod compose;
mod geometry;
mod text;

use crate::opc::bundle::{Bundle, SLIDE_PART};
use crate::opc::error::PackageError;
use crate::xml::{NodeId, XmlDoc, XmlError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum SlideError {
    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("required template shapes were not found: {}", .0.join(", "))]
    TemplatesMissing(Vec<String>),

    #[error("no shape with title '{0}'")]
    ShapeNotFound(String),

    #[error("no template shape registered under '{0}'")]
    TemplateNotFound(String),

    #[error("shape '{0}' has no transform node")]
    NoTransform(String),

    #[error("shape has no text run")]
    NoTextRun,

    #[error("shape has no '{0}' node")]
    MissingNode(&'static str),

    #[error("attribute '{0}' is not numeric")]
    BadAttr(&'static str),
}

pub type Result<T> = std::result::Result<T, SlideError>;

/// The slide part, parsed and indexed for mutation.
pub struct SlideDoc {
    doc: XmlDoc,
    sp_tree: NodeId,
    shapes: HashMap<String, NodeId>,
    templates: HashMap<String, NodeId>,
    last_id: u64,
    fill_empty: bool,
}

impl SlideDoc {
    /// Parse the slide part out of a bundle.
    ///
    /// With `fill_empty` set, every text write blanks the target instead
    /// of filling it (used for producing an empty visual template).
    pub fn load(bundle: &Bundle, fill_empty: bool) -> Result<Self> {
        let doc = XmlDoc::parse(&bundle.read_part(SLIDE_PART)?)?;
        let sp_tree = doc
            .find_descendant(doc.root(), "p:spTree")
            .ok_or(SlideError::MissingNode("p:spTree"))?;

        // Seed the id counter from the maximum id present anywhere in
        // the part, so freshly inserted shapes never collide.
        let mut last_id = 0u64;
        for node in doc.descendants(doc.root()) {
            if let Some(id) = doc.attr(node, "id").and_then(|v| v.parse::<u64>().ok()) {
                last_id = last_id.max(id);
            }
        }
        debug!(last_id, "loaded slide part");

        Ok(Self {
            doc,
            sp_tree,
            shapes: HashMap::new(),
            templates: HashMap::new(),
            last_id,
            fill_empty,
        })
    }

    /// The underlying element tree.
    #[inline]
    pub fn doc(&self) -> &XmlDoc {
        &self.doc
    }

    /// Mutable access to the element tree, for rules the typed surface
    /// does not cover.
    #[inline]
    pub fn doc_mut(&mut self) -> &mut XmlDoc {
        &mut self.doc
    }

    /// The shape tree root.
    #[inline]
    pub fn sp_tree(&self) -> NodeId {
        self.sp_tree
    }

    #[inline]
    pub fn fill_empty(&self) -> bool {
        self.fill_empty
    }

    /// Remove shapes lacking a title from the shape tree (stray template
    /// artifacts; CLI `--clean`).
    pub fn clean(&mut self) {
        let candidates: Vec<NodeId> = self
            .doc
            .children(self.sp_tree)
            .iter()
            .copied()
            .filter(|&child| {
                matches!(self.doc.name(child), "p:sp" | "p:pic" | "p:cxnSp")
                    && !self.has_titled_props(child)
            })
            .collect();
        for node in &candidates {
            self.doc.detach(*node);
        }
        if !candidates.is_empty() {
            debug!(removed = candidates.len(), "cleaned untitled shapes");
        }
    }

    fn has_titled_props(&self, node: NodeId) -> bool {
        self.doc
            .find_descendants(node, "p:cNvPr")
            .iter()
            .any(|&cnv| self.doc.attr(cnv, "title").is_some())
    }

    /// The title of a shape: the `title` attribute on the `p:cNvPr` of
    /// its name-properties child.
    pub fn title_of(&self, node: NodeId) -> Option<&str> {
        for &child in self.doc.children(node) {
            if let Some(cnv) = self.doc.find_child(child, "p:cNvPr")
                && let Some(title) = self.doc.attr(cnv, "title")
            {
                return Some(title);
            }
        }
        None
    }

    /// All live shapes with the given title, in document order.
    pub fn find_all_by_title(&self, title: &str) -> Vec<NodeId> {
        self.doc
            .descendants(self.sp_tree)
            .into_iter()
            .filter(|&node| self.title_of(node) == Some(title))
            .collect()
    }

    /// The shape with the given title. Titles are expected unique: when
    /// several shapes match, a warning is logged and the first in
    /// document order is used.
    pub fn find_by_title(&self, title: &str) -> Result<NodeId> {
        let matches = self.find_all_by_title(title);
        if matches.len() > 1 {
            warn!(
                title,
                count = matches.len(),
                "one shape expected for title, using the first"
            );
        }
        matches
            .first()
            .copied()
            .ok_or_else(|| SlideError::ShapeNotFound(title.to_string()))
    }

    /// Extract the designated template shapes out of the live tree,
    /// retaining one prototype per name for later cloning. Extras under
    /// the same name are discarded with a warning (first wins).
    ///
    /// Template shapes are structural prerequisites: any requested name
    /// with no match fails the whole generation.
    pub fn extract_templates<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        let mut missing = Vec::new();
        for name in names {
            let name = name.as_ref();
            let found = self.find_all_by_title(name);
            if found.is_empty() {
                missing.push(name.to_string());
                continue;
            }
            if found.len() > 1 {
                warn!(
                    title = name,
                    count = found.len(),
                    "several template shapes share a title; the first is kept, the rest removed"
                );
            }
            for &node in &found {
                self.doc.detach(node);
            }
            self.templates.insert(name.to_string(), found[0]);
        }

        if !missing.is_empty() {
            return Err(SlideError::TemplatesMissing(missing));
        }
        Ok(())
    }

    /// Build the title index over plain shapes (`p:sp`), one scan.
    /// Duplicate titles keep the first occurrence and log a warning.
    pub fn index_shapes(&mut self) {
        let mut shapes = HashMap::new();
        for node in self.doc.find_descendants(self.sp_tree, "p:sp") {
            let Some(title) = self.title_of(node) else {
                continue;
            };
            if shapes.contains_key(title) {
                warn!(title, "duplicate shape title; keeping the first occurrence");
                continue;
            }
            shapes.insert(title.to_string(), node);
        }
        debug!(indexed = shapes.len(), "indexed shapes by title");
        self.shapes = shapes;
    }

    /// Indexed shape lookup (plain shapes only; see [`Self::index_shapes`]).
    pub fn shape(&self, title: &str) -> Option<NodeId> {
        self.shapes.get(title).copied()
    }

    /// Allocate the next shape id for this document session.
    pub fn next_id(&mut self) -> u64 {
        self.last_id += 1;
        self.last_id
    }

    /// Deep-copy the retained prototype registered under `name`.
    /// Repeated calls yield independent clones; none alias the
    /// prototype. The clone starts detached — insert it with
    /// [`Self::add_shape`].
    pub fn clone_template(&mut self, name: &str) -> Result<NodeId> {
        let proto = *self
            .templates
            .get(name)
            .ok_or_else(|| SlideError::TemplateNotFound(name.to_string()))?;
        Ok(self.doc.deep_clone(proto))
    }

    /// Insert a shape into the shape tree (or a target group), assigning
    /// it a fresh unique id and suffixing its name with that id.
    pub fn add_shape(&mut self, node: NodeId, target: Option<NodeId>) -> Result<()> {
        let cnv = self
            .doc
            .find_descendant(node, "p:cNvPr")
            .ok_or(SlideError::MissingNode("p:cNvPr"))?;
        let id = self.next_id();
        let name = self.doc.attr(cnv, "name").unwrap_or_default().to_string();
        self.doc.set_attr(cnv, "id", id.to_string());
        self.doc.set_attr(cnv, "name", format!("{name} {id}"));
        self.doc.append_child(target.unwrap_or(self.sp_tree), node);
        Ok(())
    }

    /// Serialize the slide tree back into the bundle.
    pub fn store(&self, bundle: &Bundle) -> Result<()> {
        bundle.write_part(SLIDE_PART, &self.doc.serialize()?)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// A small slide part exercising the tree shapes the accessor
    /// understands: titled shapes, a template arrow, a group and a
    /// duplicate-titled pair.
    pub const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="a" xmlns:p="p" xmlns:r="r"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name="Slide"/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="12192000" cy="6858000"/></a:xfrm></p:grpSpPr><p:sp><p:nvSpPr><p:cNvPr id="2" name="Box B2" title="B2"/></p:nvSpPr><p:spPr><a:xfrm><a:off x="100" y="200"/><a:ext cx="300" cy="400"/></a:xfrm><a:solidFill><a:srgbClr val="112233"/></a:solidFill></p:spPr><p:txBody><a:bodyPr/><a:p><a:pPr algn="ctr"/><a:r><a:rPr sz="1400"/><a:t>old</a:t></a:r><a:r><a:rPr sz="1400"/><a:t>stale</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:nvSpPr><p:cNvPr id="3" name="Untitled"/></p:nvSpPr><p:spPr/></p:sp><p:cxnSp><p:nvCxnSpPr><p:cNvPr id="4" name="Arrow" title="template-arrow"/><p:cNvCxnSpPr><a:stCxn id="2" idx="0"/></p:cNvCxnSpPr></p:nvCxnSpPr><p:spPr><a:xfrm><a:off x="10" y="20"/><a:ext cx="50" cy="60"/></a:xfrm></p:spPr></p:cxnSp><p:grpSp><p:nvGrpSpPr><p:cNvPr id="5" name="Group" title="chart-group"/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="1000" y="1000"/><a:ext cx="2000" cy="1000"/></a:xfrm></p:grpSpPr></p:grpSp><p:sp><p:nvSpPr><p:cNvPr id="6" name="Dup" title="dup"/></p:nvSpPr><p:spPr/></p:sp><p:sp><p:nvSpPr><p:cNvPr id="7" name="Dup2" title="dup"/></p:nvSpPr><p:spPr/></p:sp></p:spTree></p:cSld></p:sld>"#;

    pub fn slide_doc() -> SlideDoc {
        let doc = XmlDoc::parse(SLIDE.as_bytes()).unwrap();
        let sp_tree = doc.find_descendant(doc.root(), "p:spTree").unwrap();
        let mut last_id = 0;
        for node in doc.descendants(doc.root()) {
            if let Some(id) = doc.attr(node, "id").and_then(|v| v.parse::<u64>().ok()) {
                last_id = last_id.max(id);
            }
        }
        SlideDoc {
            doc,
            sp_tree,
            shapes: HashMap::new(),
            templates: HashMap::new(),
            last_id,
            fill_empty: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::slide_doc;
    use super::*;

    #[test]
    fn test_id_counter_seeded_from_max() {
        let mut slide = slide_doc();
        assert_eq!(slide.next_id(), 8);
        assert_eq!(slide.next_id(), 9);
    }

    #[test]
    fn test_find_by_title() {
        let slide = slide_doc();
        let shape = slide.find_by_title("B2").unwrap();
        assert_eq!(slide.doc().name(shape), "p:sp");
        assert!(matches!(
            slide.find_by_title("nope"),
            Err(SlideError::ShapeNotFound(_))
        ));
        // Duplicate titles resolve to the first match in document order.
        let dup = slide.find_by_title("dup").unwrap();
        let cnv = slide.doc().find_descendant(dup, "p:cNvPr").unwrap();
        assert_eq!(slide.doc().attr(cnv, "id"), Some("6"));
    }

    #[test]
    fn test_extract_templates_removes_and_retains() {
        let mut slide = slide_doc();
        slide.extract_templates(&["template-arrow"]).unwrap();
        assert!(slide.find_all_by_title("template-arrow").is_empty());

        // The prototype clones independently, never aliasing itself.
        let first = slide.clone_template("template-arrow").unwrap();
        let second = slide.clone_template("template-arrow").unwrap();
        assert_ne!(first, second);

        slide.add_shape(first, None).unwrap();
        slide.add_shape(second, None).unwrap();
        let c1 = slide.doc().find_descendant(first, "p:cNvPr").unwrap();
        let c2 = slide.doc().find_descendant(second, "p:cNvPr").unwrap();
        assert_ne!(slide.doc().attr(c1, "id"), slide.doc().attr(c2, "id"));
    }

    #[test]
    fn test_extract_templates_missing_is_fatal() {
        let mut slide = slide_doc();
        let err = slide
            .extract_templates(&["template-arrow", "template-dot"])
            .unwrap_err();
        match err {
            SlideError::TemplatesMissing(names) => assert_eq!(names, vec!["template-dot"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_clean_strips_untitled_shapes() {
        let mut slide = slide_doc();
        slide.clean();
        assert!(slide.find_by_title("B2").is_ok());
        let untitled: Vec<_> = slide
            .doc()
            .find_descendants(slide.sp_tree(), "p:sp")
            .into_iter()
            .filter(|&n| slide.title_of(n).is_none())
            .collect();
        assert!(untitled.is_empty());
    }

    #[test]
    fn test_index_keeps_first_duplicate() {
        let mut slide = slide_doc();
        slide.index_shapes();
        let dup = slide.shape("dup").unwrap();
        let cnv = slide.doc().find_descendant(dup, "p:cNvPr").unwrap();
        assert_eq!(slide.doc().attr(cnv, "id"), Some("6"));
    }
}
