//! The unpacked directory form of one package.
//!
//! A bundle is created by extracting a zipped package into a scratch
//! directory, mutated through a single generation or merge pass, zipped
//! back to its final output, and removed with the scratch directory on
//! all exit paths (including errors) via RAII.

use crate::opc::error::{PackageError, Result};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;
use zip::CompressionMethod;
use zip::ZipArchive;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// The slide part every template and generated deck must carry.
pub const SLIDE_PART: &str = "ppt/slides/slide1.xml";

/// The slide part's relationships part.
pub const SLIDE_RELS_PART: &str = "ppt/slides/_rels/slide1.xml.rels";

/// The presentation part.
pub const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// The presentation part's relationships part.
pub const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// The content-type manifest part.
pub const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

/// One package extracted to a scratch directory.
#[derive(Debug)]
pub struct Bundle {
    dir: TempDir,
}

impl Bundle {
    /// Extract a zipped package into a fresh scratch directory.
    ///
    /// Fails with [`PackageError::NotAPackage`] when the file is not a
    /// valid archive and [`PackageError::MissingSlide`] when the slide
    /// part is absent.
    pub fn extract<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PackageError::PackageNotFound(path.display().to_string()));
        }

        let file = File::open(path)?;
        let mut archive = ZipArchive::new(BufReader::new(file))
            .map_err(|_| PackageError::NotAPackage(path.display().to_string()))?;

        let dir = TempDir::new()?;
        for i in 0..archive.len() {
            let mut member = archive.by_index(i)?;
            if member.is_dir() {
                continue;
            }
            let Some(relative) = member.enclosed_name().map(PathBuf::from) else {
                continue;
            };
            let out_path = dir.path().join(relative);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&out_path)?;
            io::copy(&mut member, &mut out)?;
        }

        let bundle = Self { dir };
        if !bundle.part_exists(SLIDE_PART) {
            return Err(PackageError::MissingSlide(path.display().to_string()));
        }
        debug!(package = %path.display(), dir = %bundle.dir.path().display(), "extracted package");
        Ok(bundle)
    }

    /// The bundle's root directory.
    #[inline]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute filesystem path of a part ("ppt/slides/slide1.xml").
    pub fn part_path(&self, part: &str) -> PathBuf {
        self.dir.path().join(part)
    }

    /// Whether a part exists in the bundle.
    pub fn part_exists(&self, part: &str) -> bool {
        self.part_path(part).is_file()
    }

    /// Read a part's bytes.
    pub fn read_part(&self, part: &str) -> Result<Vec<u8>> {
        fs::read(self.part_path(part)).map_err(|_| PackageError::PartNotFound(part.to_string()))
    }

    /// Write a part's bytes, creating parent directories as needed.
    pub fn write_part(&self, part: &str, bytes: &[u8]) -> Result<()> {
        let path = self.part_path(part);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, bytes)?;
        Ok(())
    }

    /// Copy a part from another bundle under a (possibly different) name.
    pub fn copy_part_from(&self, source: &Bundle, part: &str, new_part: &str) -> Result<()> {
        let bytes = source.read_part(part)?;
        self.write_part(new_part, &bytes)
    }

    /// All part names in the bundle, slash-separated, sorted.
    pub fn member_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        collect_files(self.dir.path(), self.dir.path(), &mut names)?;
        names.sort();
        Ok(names)
    }

    /// Zip the bundle directory to its final output archive.
    pub fn archive_to<P: AsRef<Path>>(&self, dst: P) -> Result<()> {
        let dst = dst.as_ref();
        if let Some(parent) = dst.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(dst)?;
        let mut writer = ZipWriter::new(BufWriter::new(file));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for name in self.member_names()? {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(&self.read_part(&name)?)?;
        }
        writer.finish()?;
        debug!(output = %dst.display(), "archived package");
        Ok(())
    }

    /// Copy the whole bundle tree into a fresh scratch directory
    /// (separate-chart export works on a copy).
    pub fn clone_dir(&self) -> Result<Bundle> {
        let dir = TempDir::new()?;
        for name in self.member_names()? {
            let out_path = dir.path().join(&name);
            if let Some(parent) = out_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(self.part_path(&name), out_path)?;
        }
        Ok(Bundle { dir })
    }
}

/// Recursively collect slash-separated relative file paths.
fn collect_files(root: &Path, dir: &Path, names: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, names)?;
        } else {
            let relative = path
                .strip_prefix(root)
                .expect("entry is below the walk root");
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            names.push(name);
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Build a minimal single-slide package on disk and return its path.
    pub(crate) fn write_minimal_package(dir: &Path) -> PathBuf {
        let path = dir.join("template.pptx");
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: &[(&str, &str)] = &[
            (CONTENT_TYPES_PART, r#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/></Types>"#),
            (SLIDE_PART, r#"<?xml version="1.0"?><p:sld xmlns:p="p"><p:cSld><p:spTree/></p:cSld></p:sld>"#),
        ];
        for (name, body) in parts {
            writer.start_file(*name, options).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::write_minimal_package;
    use super::*;

    #[test]
    fn test_extract_and_round_trip() {
        let scratch = TempDir::new().unwrap();
        let package = write_minimal_package(scratch.path());

        let bundle = Bundle::extract(&package).unwrap();
        assert!(bundle.part_exists(SLIDE_PART));

        bundle
            .write_part("ppt/charts/chart1.xml", b"<c:chartSpace/>")
            .unwrap();

        let out = scratch.path().join("out.pptx");
        bundle.archive_to(&out).unwrap();

        let again = Bundle::extract(&out).unwrap();
        let names = again.member_names().unwrap();
        assert!(names.contains(&SLIDE_PART.to_string()));
        assert!(names.contains(&"ppt/charts/chart1.xml".to_string()));
        assert_eq!(again.read_part("ppt/charts/chart1.xml").unwrap(), b"<c:chartSpace/>");
    }

    #[test]
    fn test_extract_rejects_non_archives() {
        let scratch = TempDir::new().unwrap();
        let path = scratch.path().join("not-a-package.pptx");
        fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            Bundle::extract(&path),
            Err(PackageError::NotAPackage(_))
        ));
    }

    #[test]
    fn test_extract_requires_slide_part() {
        let scratch = TempDir::new().unwrap();
        let path = scratch.path().join("empty.pptx");
        let file = File::create(&path).unwrap();
        let mut writer = ZipWriter::new(file);
        writer
            .start_file("other.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"x").unwrap();
        writer.finish().unwrap();

        assert!(matches!(
            Bundle::extract(&path),
            Err(PackageError::MissingSlide(_))
        ));
    }

    #[test]
    fn test_clone_dir_is_independent() {
        let scratch = TempDir::new().unwrap();
        let package = write_minimal_package(scratch.path());
        let bundle = Bundle::extract(&package).unwrap();

        let copy = bundle.clone_dir().unwrap();
        copy.write_part(SLIDE_PART, b"<p:sld/>").unwrap();
        assert_ne!(
            bundle.read_part(SLIDE_PART).unwrap(),
            copy.read_part(SLIDE_PART).unwrap()
        );
    }
}
