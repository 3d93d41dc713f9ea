//! The content-type manifest ([Content_Types].xml).
//!
//! Maps part names to content types through `Default` entries (keyed by
//! extension) and `Override` entries (keyed by exact part name). The
//! merger's dedup rules live here: at most one default per extension,
//! at most one override per part name.

use crate::opc::error::Result;
use crate::xml::XmlDoc;

/// Parsed content-type manifest.
#[derive(Debug, Clone, Default)]
pub struct ContentTypes {
    defaults: Vec<(String, String)>,
    overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Parse a [Content_Types].xml part.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let doc = XmlDoc::parse(bytes)?;
        let mut types = Self::default();
        for node in doc.children(doc.root()) {
            match doc.name(*node) {
                "Default" => {
                    if let (Some(ext), Some(ct)) =
                        (doc.attr(*node, "Extension"), doc.attr(*node, "ContentType"))
                    {
                        types.defaults.push((ext.to_string(), ct.to_string()));
                    }
                },
                "Override" => {
                    if let (Some(part), Some(ct)) =
                        (doc.attr(*node, "PartName"), doc.attr(*node, "ContentType"))
                    {
                        types.overrides.push((part.to_string(), ct.to_string()));
                    }
                },
                _ => {},
            }
        }
        Ok(types)
    }

    /// Whether a default entry exists for the extension.
    pub fn has_default(&self, ext: &str) -> bool {
        self.defaults.iter().any(|(e, _)| e == ext)
    }

    /// Add a default entry unless the extension is already declared.
    pub fn add_default(&mut self, ext: &str, content_type: &str) {
        if !self.has_default(ext) {
            self.defaults.push((ext.to_string(), content_type.to_string()));
        }
    }

    /// The override content type for an exact part name.
    pub fn override_for(&self, part_name: &str) -> Option<&str> {
        self.overrides
            .iter()
            .find(|(part, _)| part == part_name)
            .map(|(_, ct)| ct.as_str())
    }

    /// Add an override unless one already targets the part name.
    pub fn add_override(&mut self, part_name: &str, content_type: &str) {
        if self.override_for(part_name).is_none() {
            self.overrides
                .push((part_name.to_string(), content_type.to_string()));
        }
    }

    /// Resolve a part's content type, override first, then default by
    /// extension.
    pub fn lookup(&self, part_name: &str, ext: &str) -> Option<&str> {
        self.override_for(part_name).or_else(|| {
            self.defaults
                .iter()
                .find(|(e, _)| e == ext)
                .map(|(_, ct)| ct.as_str())
        })
    }

    /// Iterate default entries as (extension, content type).
    pub fn defaults(&self) -> impl Iterator<Item = (&str, &str)> {
        self.defaults.iter().map(|(e, ct)| (e.as_str(), ct.as_str()))
    }

    /// Iterate override entries as (part name, content type).
    pub fn overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.overrides.iter().map(|(p, ct)| (p.as_str(), ct.as_str()))
    }

    /// Serialize the manifest.
    pub fn to_xml(&self) -> Vec<u8> {
        let mut xml = String::with_capacity(256 + (self.defaults.len() + self.overrides.len()) * 96);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(r#"<Default Extension="{ext}" ContentType="{ct}"/>"#));
        }
        for (part, ct) in &self.overrides {
            xml.push_str(&format!(r#"<Override PartName="{part}" ContentType="{ct}"/>"#));
        }
        xml.push_str("</Types>");
        xml.into_bytes()
    }
}
