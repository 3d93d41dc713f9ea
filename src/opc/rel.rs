//! Relationship collections (.rels parts).
//!
//! A relationships part links a source part to the parts it references,
//! keyed by relationship ID. Document order is preserved so rewritten
//! .rels files stay diffable against their sources.

use crate::opc::error::{PackageError, Result};
use crate::opc::packuri::PackUri;
use crate::xml::XmlDoc;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID ("rId1", "rId2", ...).
    pub id: String,
    /// Relationship type URI.
    pub reltype: String,
    /// Target reference: a part reference, or a URL for external
    /// relationships.
    pub target: String,
    /// Whether the target is external to the package.
    pub external: bool,
}

impl Relationship {
    /// Resolve the absolute target partname against the source's base
    /// URI. Fails for external relationships.
    pub fn target_partname(&self, base_uri: &str) -> Result<PackUri> {
        if self.external {
            return Err(PackageError::InvalidRelationship(format!(
                "relationship {} is external and has no partname",
                self.id
            )));
        }
        PackUri::from_rel_ref(base_uri, &self.target)
    }
}

/// An ordered collection of relationships from one source part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    rels: Vec<Relationship>,
}

impl Relationships {
    /// Parse a .rels part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDoc::parse(bytes)?;
        let mut rels = Vec::new();
        for node in doc.descendants(doc.root()) {
            if !doc.name(node).ends_with("Relationship") {
                continue;
            }
            let id = doc
                .attr(node, "Id")
                .ok_or_else(|| {
                    PackageError::InvalidRelationship("relationship without Id".into())
                })?
                .to_string();
            let reltype = doc.attr(node, "Type").unwrap_or_default().to_string();
            let target = doc.attr(node, "Target").unwrap_or_default().to_string();
            let external = doc.attr(node, "TargetMode") == Some("External");
            rels.push(Relationship {
                id,
                reltype,
                target,
                external,
            });
        }
        Ok(Self { rels })
    }

    /// Add a relationship at the end of the collection.
    pub fn add(&mut self, id: impl Into<String>, reltype: &str, target: impl Into<String>) {
        self.rels.push(Relationship {
            id: id.into(),
            reltype: reltype.to_string(),
            target: target.into(),
            external: false,
        });
    }

    /// Get a relationship by its ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.rels.iter().find(|rel| rel.id == id)
    }

    /// Iterate the relationships in document order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.rels.iter()
    }

    /// Mutable iteration, used by the merger to rewrite targets.
    #[inline]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Relationship> {
        self.rels.iter_mut()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize the collection to .rels XML.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = String::with_capacity(256 + self.rels.len() * 128);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for rel in &self.rels {
            let target_mode = if rel.external {
                r#" TargetMode="External""#
            } else {
                ""
            };
            xml.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"{}/>"#,
                escape_xml(&rel.id),
                escape_xml(&rel.reltype),
                escape_xml(&rel.target),
                target_mode,
            ));
        }
        xml.push_str("</Relationships>");
        xml.into_bytes()
    }
}

/// Escape XML special characters in attribute values.
fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml"/>
  <Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn test_parse() {
        let rels = Relationships::parse(RELS.as_bytes()).unwrap();
        assert_eq!(rels.len(), 3);

        let chart = rels.get("rId2").unwrap();
        assert_eq!(chart.target, "../charts/chart1.xml");
        assert!(!chart.external);
        assert!(rels.get("rId3").unwrap().external);
    }

    #[test]
    fn test_target_partname() {
        let rels = Relationships::parse(RELS.as_bytes()).unwrap();
        let chart = rels.get("rId2").unwrap();
        assert_eq!(
            chart.target_partname("/ppt/slides").unwrap().as_str(),
            "/ppt/charts/chart1.xml"
        );
        assert!(rels.get("rId3").unwrap().target_partname("/ppt/slides").is_err());
    }

    #[test]
    fn test_round_trip() {
        let rels = Relationships::parse(RELS.as_bytes()).unwrap();
        let again = Relationships::parse(&rels.to_xml()).unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(again.get("rId1").unwrap().target, "../slideLayouts/slideLayout1.xml");
        assert!(again.get("rId3").unwrap().external);
    }
}
