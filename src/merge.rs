//! Presentation merger.
//!
//! Combines N independently generated single-slide decks into one
//! multi-slide deck. The first deck is the base and keeps its part
//! names; every further deck's parts are renumbered with the deck's
//! 1-based index ("slide1.xml" from deck 2 becomes "2slide1.xml") so
//! part paths and relationship ids stay globally unique.
//!
//! Parts are discovered by walking each slide's relationship graph with
//! an explicit breadth-first worklist and a visited set keyed by the
//! absolute source part name, so shared sub-resources are copied once
//! and cyclic relationship graphs cannot recurse without bound. A fixed
//! deny-list of relationship types (masters, layouts, OLE) is never
//! followed: those parts stay bound to the base deck's shared parts.

use crate::opc::bundle::{
    Bundle, CONTENT_TYPES_PART, PRESENTATION_PART, PRESENTATION_RELS_PART, SLIDE_PART,
};
use crate::opc::constants::{NON_FOLLOW_RELTYPES, content_type, relationship_type};
use crate::opc::content_types::ContentTypes;
use crate::opc::error::PackageError;
use crate::opc::packuri::PackUri;
use crate::opc::rel::Relationships;
use crate::xml::{XmlDoc, XmlError};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("at least one deck is required")]
    NoSources,

    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("presentation part has no '{0}' node")]
    MissingNode(&'static str),

    #[error("no content type declared for part '{0}' in '{1}'")]
    UnresolvedContentType(String, String),
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Merge the given decks into one multi-slide deck at `output`.
pub fn merge_presentations<P: AsRef<Path>>(sources: &[P], output: &Path) -> Result<()> {
    let Some((base_path, rest)) = sources.split_first() else {
        return Err(MergeError::NoSources);
    };
    info!(decks = sources.len(), output = %output.display(), "merging decks");

    let base = Bundle::extract(base_path)?;
    let mut merger = PresentationMerger::scan_base(&base)?;

    for (offset, source_path) in rest.iter().enumerate() {
        // Source indices are 1-based over the whole input list, so the
        // first renumbered deck is index 2.
        let index = offset + 2;
        let source = Bundle::extract(source_path)?;
        merger.merge_source(&base, &source, index)?;
    }

    merger.finalize(&base)?;
    base.archive_to(output)?;
    Ok(())
}

/// Mutable merge state over the base deck.
struct PresentationMerger {
    content_types: ContentTypes,
    presentation: XmlDoc,
    presentation_rels: Relationships,
    last_slide_id: u64,
}

impl PresentationMerger {
    /// Parse the base deck's manifest, presentation part and
    /// relationships, and scan its highest slide id.
    fn scan_base(base: &Bundle) -> Result<Self> {
        let content_types = ContentTypes::parse(&base.read_part(CONTENT_TYPES_PART)?)?;
        let presentation = XmlDoc::parse(&base.read_part(PRESENTATION_PART)?)?;
        let presentation_rels = Relationships::parse(&base.read_part(PRESENTATION_RELS_PART)?)?;

        let mut last_slide_id = 0;
        for node in presentation.find_descendants(presentation.root(), "p:sldId") {
            if let Some(id) = presentation.attr(node, "id").and_then(|v| v.parse().ok()) {
                last_slide_id = std::cmp::max(last_slide_id, id);
            }
        }
        if last_slide_id == 0 {
            return Err(MergeError::MissingNode("p:sldId"));
        }

        Ok(Self {
            content_types,
            presentation,
            presentation_rels,
            last_slide_id,
        })
    }

    /// Merge one source deck under the given 1-based index.
    fn merge_source(&mut self, base: &Bundle, source: &Bundle, index: usize) -> Result<()> {
        let slide_uri = PackUri::new(format!("/{SLIDE_PART}"))?;
        let new_slide_uri = slide_uri.renumbered(index)?;

        // Register the incoming slide on the presentation: content-type
        // override, slide-id entry and presentation relationship.
        self.content_types
            .add_override(new_slide_uri.as_str(), content_type::SLIDE);

        self.last_slide_id += 1;
        let r_id = format!("rId{}", index * 100);
        let sld_id_lst = self
            .presentation
            .find_descendant(self.presentation.root(), "p:sldIdLst")
            .ok_or(MergeError::MissingNode("p:sldIdLst"))?;
        let sld_id = self.presentation.create_element("p:sldId");
        self.presentation
            .set_attr(sld_id, "id", self.last_slide_id.to_string());
        self.presentation.set_attr(sld_id, "r:id", &r_id);
        self.presentation.append_child(sld_id_lst, sld_id);
        self.presentation_rels.add(
            r_id,
            relationship_type::SLIDE,
            format!("slides/{}", new_slide_uri.filename()),
        );

        // Source defaults merge into the manifest, deduplicated by
        // extension (base declarations win).
        let source_types = ContentTypes::parse(&source.read_part(CONTENT_TYPES_PART)?)?;
        for (ext, ct) in source_types.defaults() {
            self.content_types.add_default(ext, ct);
        }

        self.copy_related(base, source, index, &source_types, &slide_uri)?;
        Ok(())
    }

    /// Copy the slide and everything it transitively references,
    /// renumbering part names and relationship targets: a breadth-first
    /// worklist over the relationship graph with a visited map keyed by
    /// absolute source part name.
    fn copy_related(
        &mut self,
        base: &Bundle,
        source: &Bundle,
        index: usize,
        source_types: &ContentTypes,
        start: &PackUri,
    ) -> Result<()> {
        let mut visited: HashMap<String, PackUri> = HashMap::new();
        let mut worklist: VecDeque<PackUri> = VecDeque::new();

        visited.insert(start.as_str().to_string(), start.renumbered(index)?);
        worklist.push_back(start.clone());

        while let Some(part) = worklist.pop_front() {
            let new_part = visited[part.as_str()].clone();
            base.copy_part_from(source, part.membername(), new_part.membername())?;
            debug!(from = %part, to = %new_part, "copied part");

            let rels_part = part.rels_uri()?;
            if !source.part_exists(rels_part.membername()) {
                continue;
            }
            let mut rels = Relationships::parse(&source.read_part(rels_part.membername())?)?;

            // Pass 1: enqueue every followed target not yet visited.
            for rel in rels.iter() {
                if rel.external || NON_FOLLOW_RELTYPES.contains(&rel.reltype.as_str()) {
                    continue;
                }
                let target = rel.target_partname(part.base_uri())?;
                if !visited.contains_key(target.as_str()) {
                    visited.insert(target.as_str().to_string(), target.renumbered(index)?);
                    worklist.push_back(target);
                }
            }

            // Pass 2: rewrite followed targets to their renumbered
            // absolute names and carry their content-type overrides.
            let mut rewrites: Vec<(usize, String)> = Vec::new();
            for (rel_index, rel) in rels.iter().enumerate() {
                if rel.external || NON_FOLLOW_RELTYPES.contains(&rel.reltype.as_str()) {
                    continue;
                }
                let target = rel.target_partname(part.base_uri())?;
                let new_target = visited[target.as_str()].clone();

                // Declarations travel with the part: overrides always,
                // defaults only when the base manifest lacks the
                // extension. A followed part with no declaration at all
                // marks a malformed source deck.
                let ext = target.ext();
                if ext == "xml" || !self.content_types.has_default(ext) {
                    match source_types.lookup(target.as_str(), ext) {
                        Some(ct) => {
                            if source_types.override_for(target.as_str()).is_some() {
                                self.content_types.add_override(new_target.as_str(), ct);
                            }
                        },
                        None => {
                            return Err(MergeError::UnresolvedContentType(
                                target.as_str().to_string(),
                                part.as_str().to_string(),
                            ));
                        },
                    }
                }
                rewrites.push((rel_index, new_target.as_str().to_string()));
            }
            for (rel_index, new_target) in rewrites {
                if let Some(rel) = rels.iter_mut().nth(rel_index) {
                    rel.target = new_target;
                }
            }

            let new_rels_part = new_part.rels_uri()?;
            base.write_part(new_rels_part.membername(), &rels.to_xml())?;
        }
        Ok(())
    }

    /// Write the mutated manifest, presentation part and relationships
    /// back into the base bundle.
    fn finalize(&self, base: &Bundle) -> Result<()> {
        base.write_part(CONTENT_TYPES_PART, &self.content_types.to_xml())?;
        base.write_part(PRESENTATION_PART, &self.presentation.serialize()?)?;
        base.write_part(PRESENTATION_RELS_PART, &self.presentation_rels.to_xml())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs::File;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    const LAYOUT_RELTYPE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    const IMAGE_RELTYPE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

    /// A deck whose slide references a chart, an image and a layout
    /// (deny-listed), with the chart and image sharing the image part.
    fn write_deck(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        let chart_reltype = crate::opc::constants::relationship_type::CHART;
        let parts: Vec<(String, String)> = vec![
            (
                CONTENT_TYPES_PART.into(),
                r#"<?xml version="1.0"?><Types xmlns="ct"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/charts/chart1.xml" ContentType="application/vnd.openxmlformats-officedocument.drawingml.chart+xml"/></Types>"#.into(),
            ),
            (
                PRESENTATION_PART.into(),
                r#"<?xml version="1.0"?><p:presentation xmlns:p="p" xmlns:r="r"><p:sldIdLst><p:sldId id="256" r:id="rId1"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#.into(),
            ),
            (
                PRESENTATION_RELS_PART.into(),
                format!(
                    r#"<?xml version="1.0"?><Relationships xmlns="rl"><Relationship Id="rId1" Type="{}" Target="slides/slide1.xml"/></Relationships>"#,
                    relationship_type::SLIDE
                ),
            ),
            (
                SLIDE_PART.into(),
                r#"<?xml version="1.0"?><p:sld xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#.into(),
            ),
            (
                "ppt/slides/_rels/slide1.xml.rels".into(),
                format!(
                    r#"<?xml version="1.0"?><Relationships xmlns="rl"><Relationship Id="rId1" Type="{LAYOUT_RELTYPE}" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="{chart_reltype}" Target="../charts/chart1.xml"/><Relationship Id="rId3" Type="{IMAGE_RELTYPE}" Target="../media/image1.png"/></Relationships>"#
                ),
            ),
            (
                "ppt/charts/chart1.xml".into(),
                r#"<?xml version="1.0"?><c:chartSpace xmlns:c="c"/>"#.into(),
            ),
            (
                "ppt/charts/_rels/chart1.xml.rels".into(),
                format!(
                    r#"<?xml version="1.0"?><Relationships xmlns="rl"><Relationship Id="rId1" Type="{IMAGE_RELTYPE}" Target="../media/image1.png"/></Relationships>"#
                ),
            ),
            ("ppt/media/image1.png".into(), "PNGDATA".into()),
            (
                "ppt/slideLayouts/slideLayout1.xml".into(),
                r#"<?xml version="1.0"?><p:sldLayout xmlns:p="p"/>"#.into(),
            ),
        ];
        for (part, body) in parts {
            writer.start_file(part.as_str(), options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn test_merge_two_decks() {
        let scratch = TempDir::new().unwrap();
        let a = write_deck(scratch.path(), "a.pptx");
        let b = write_deck(scratch.path(), "b.pptx");
        let out = scratch.path().join("merged.pptx");

        merge_presentations(&[a, b], &out).unwrap();

        let merged = Bundle::extract(&out).unwrap();
        let names = merged.member_names().unwrap();

        // Every part path is unique and the renumbered parts landed.
        let unique: HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
        assert!(names.contains(&"ppt/slides/2slide1.xml".to_string()));
        assert!(names.contains(&"ppt/charts/2chart1.xml".to_string()));
        assert!(names.contains(&"ppt/media/2image1.png".to_string()));
        // Deny-listed layouts are not duplicated.
        assert!(!names.contains(&"ppt/slideLayouts/2slideLayout1.xml".to_string()));

        // The presentation gained a second slide with a unique id.
        let pres = XmlDoc::parse(&merged.read_part(PRESENTATION_PART).unwrap()).unwrap();
        let slide_ids = pres.find_descendants(pres.root(), "p:sldId");
        assert_eq!(slide_ids.len(), 2);
        let ids: HashSet<_> = slide_ids
            .iter()
            .map(|&n| pres.attr(n, "id").unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 2);

        // Presentation relationships stay unique and include the new slide.
        let rels =
            Relationships::parse(&merged.read_part(PRESENTATION_RELS_PART).unwrap()).unwrap();
        let rel_ids: HashSet<_> = rels.iter().map(|r| r.id.clone()).collect();
        assert_eq!(rel_ids.len(), rels.len());
        assert_eq!(rels.get("rId200").unwrap().target, "slides/2slide1.xml");

        // The copied slide's rels point at renumbered absolute targets;
        // the deny-listed layout target is untouched.
        let slide_rels =
            Relationships::parse(&merged.read_part("ppt/slides/_rels/2slide1.xml.rels").unwrap())
                .unwrap();
        assert_eq!(slide_rels.get("rId2").unwrap().target, "/ppt/charts/2chart1.xml");
        assert_eq!(slide_rels.get("rId3").unwrap().target, "/ppt/media/2image1.png");
        assert_eq!(
            slide_rels.get("rId1").unwrap().target,
            "../slideLayouts/slideLayout1.xml"
        );

        // Content types: one default per extension, override for the new
        // slide and chart, none for the png (a default covers it).
        let types = ContentTypes::parse(&merged.read_part(CONTENT_TYPES_PART).unwrap()).unwrap();
        assert_eq!(types.defaults().filter(|(e, _)| *e == "png").count(), 1);
        assert!(types.override_for("/ppt/slides/2slide1.xml").is_some());
        assert!(types.override_for("/ppt/charts/2chart1.xml").is_some());
        assert!(types.override_for("/ppt/media/2image1.png").is_none());
    }

    #[test]
    fn test_merge_three_decks_renumbers_each() {
        let scratch = TempDir::new().unwrap();
        let decks: Vec<_> = ["a.pptx", "b.pptx", "c.pptx"]
            .iter()
            .map(|name| write_deck(scratch.path(), name))
            .collect();
        let out = scratch.path().join("merged.pptx");

        merge_presentations(&decks, &out).unwrap();

        let merged = Bundle::extract(&out).unwrap();
        let names = merged.member_names().unwrap();
        assert!(names.contains(&"ppt/slides/2slide1.xml".to_string()));
        assert!(names.contains(&"ppt/slides/3slide1.xml".to_string()));

        let pres = XmlDoc::parse(&merged.read_part(PRESENTATION_PART).unwrap()).unwrap();
        assert_eq!(pres.find_descendants(pres.root(), "p:sldId").len(), 3);
    }

    #[test]
    fn test_unresolved_content_type_aborts() {
        let scratch = TempDir::new().unwrap();
        let a = write_deck(scratch.path(), "a.pptx");

        // A deck whose chart part has no content-type declaration.
        let broken = {
            let path = scratch.path().join("broken.pptx");
            let file = File::create(&path).unwrap();
            let mut writer = ZipWriter::new(file);
            let options = SimpleFileOptions::default();
            let chart_reltype = crate::opc::constants::relationship_type::CHART;
            let parts: Vec<(String, String)> = vec![
                (
                    CONTENT_TYPES_PART.into(),
                    r#"<?xml version="1.0"?><Types xmlns="ct"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#.into(),
                ),
                (
                    SLIDE_PART.into(),
                    r#"<?xml version="1.0"?><p:sld xmlns:p="p"/>"#.into(),
                ),
                (
                    "ppt/slides/_rels/slide1.xml.rels".into(),
                    format!(
                        r#"<?xml version="1.0"?><Relationships xmlns="rl"><Relationship Id="rId1" Type="{chart_reltype}" Target="../charts/chart1.xml"/></Relationships>"#
                    ),
                ),
                (
                    "ppt/charts/chart1.xml".into(),
                    r#"<?xml version="1.0"?><c:chartSpace xmlns:c="c"/>"#.into(),
                ),
            ];
            for (part, body) in parts {
                writer.start_file(part.as_str(), options).unwrap();
                writer.write_all(body.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
            path
        };

        let out = scratch.path().join("merged.pptx");
        assert!(matches!(
            merge_presentations(&[a, broken], &out),
            Err(MergeError::UnresolvedContentType(_, _))
        ));
    }
}
