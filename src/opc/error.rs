//! Error types for package operations.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("package not found: {0}")]
    PackageNotFound(String),

    #[error("not a valid package archive: {0}")]
    NotAPackage(String),

    #[error("package has no slide part: {0}")]
    MissingSlide(String),

    #[error("part not found: {0}")]
    PartNotFound(String),

    #[error("invalid pack URI: {0}")]
    InvalidPackUri(String),

    #[error("invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xml(#[from] crate::xml::XmlError),
}

pub type Result<T> = std::result::Result<T, PackageError>;
