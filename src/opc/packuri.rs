//! The PackUri value type: a part name within a package.
//!
//! Pack URIs always begin with a forward slash and use forward slashes
//! as separators ("/ppt/slides/slide1.xml").

use crate::opc::error::{PackageError, Result};

/// A part name within a package.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackUri {
    uri: String,
}

impl PackUri {
    /// Create a new PackUri. Fails unless the URI begins with a slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(PackageError::InvalidPackUri(format!(
                "part name must begin with a slash, got '{uri}'"
            )));
        }
        Ok(PackUri { uri })
    }

    /// Resolve a relative reference (like "../charts/chart1.xml") against
    /// a base URI (like "/ppt/slides") into an absolute PackUri.
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self> {
        if let Some(absolute) = relative_ref.strip_prefix('/') {
            // Absolute targets resolve to themselves.
            return Self::new(format!("/{absolute}"));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{base_uri}{relative_ref}")
        } else {
            format!("{base_uri}/{relative_ref}")
        };
        Self::new(normalize_path(&joined))
    }

    /// The directory portion ("/ppt/slides" for "/ppt/slides/slide1.xml").
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// The filename portion ("slide1.xml").
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// The extension, without the leading period ("xml").
    pub fn ext(&self) -> &str {
        match self.filename().rfind('.') {
            Some(pos) => &self.filename()[pos + 1..],
            None => "",
        }
    }

    /// The URI with the leading slash stripped, as used for the ZIP
    /// member name and the on-disk path inside a bundle.
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// The PackUri of the .rels part for this part
    /// ("/ppt/slides/_rels/slide1.xml.rels").
    pub fn rels_uri(&self) -> Result<PackUri> {
        let base = self.base_uri();
        let uri = if base == "/" {
            format!("/_rels/{}.rels", self.filename())
        } else {
            format!("{}/_rels/{}.rels", base, self.filename())
        };
        Self::new(uri)
    }

    /// The same part renumbered for merge: the filename gains a source
    /// index prefix ("/ppt/slides/slide1.xml" at index 2 becomes
    /// "/ppt/slides/2slide1.xml").
    pub fn renumbered(&self, index: usize) -> Result<PackUri> {
        let base = self.base_uri();
        let uri = if base == "/" {
            format!("/{}{}", index, self.filename())
        } else {
            format!("{}/{}{}", base, index, self.filename())
        };
        Self::new(uri)
    }

    /// The full URI string.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackUri {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// Resolve "." and ".." segments in a slash-separated path.
fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {
                if parts.is_empty() {
                    parts.push("");
                }
            },
            ".." => {
                if parts.len() > 1 {
                    parts.pop();
                }
            },
            _ => parts.push(part),
        }
    }
    if parts.len() <= 1 {
        return "/".to_string();
    }
    parts.join("/")
}

/// The URI for the content-type manifest part.
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_requires_leading_slash() {
        assert!(PackUri::new("/ppt/slides/slide1.xml").is_ok());
        assert!(PackUri::new("ppt/slides/slide1.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackUri::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(uri.base_uri(), "/ppt/slides");
        assert_eq!(uri.filename(), "slide1.xml");
        assert_eq!(uri.ext(), "xml");
        assert_eq!(uri.membername(), "ppt/slides/slide1.xml");
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackUri::from_rel_ref("/ppt/slides", "../charts/chart1.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/charts/chart1.xml");

        let uri = PackUri::from_rel_ref("/ppt/slides", "slide2.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/slides/slide2.xml");

        // Absolute targets pass through untouched.
        let uri = PackUri::from_rel_ref("/ppt/slides", "/ppt/charts/2chart1.xml").unwrap();
        assert_eq!(uri.as_str(), "/ppt/charts/2chart1.xml");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackUri::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(uri.rels_uri().unwrap().as_str(), "/ppt/slides/_rels/slide1.xml.rels");

        let root_part = PackUri::new("/presentation.xml").unwrap();
        assert_eq!(root_part.rels_uri().unwrap().as_str(), "/_rels/presentation.xml.rels");
    }

    #[test]
    fn test_renumbered() {
        let uri = PackUri::new("/ppt/slides/slide1.xml").unwrap();
        assert_eq!(uri.renumbered(2).unwrap().as_str(), "/ppt/slides/2slide1.xml");
    }
}
