//! Crate-level error type aggregating the per-module errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Address(#[from] crate::addr::AddressError),

    #[error(transparent)]
    Workbook(#[from] crate::workbook::WorkbookError),

    #[error(transparent)]
    Format(#[from] crate::format::FormatError),

    #[error(transparent)]
    Xml(#[from] crate::xml::XmlError),

    #[error(transparent)]
    Package(#[from] crate::opc::PackageError),

    #[error(transparent)]
    Slide(#[from] crate::slide::SlideError),

    #[error(transparent)]
    Chart(#[from] crate::chart::ChartError),

    #[error(transparent)]
    Merge(#[from] crate::merge::MergeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("shape '{0}' has no chart reference")]
    NoChartReference(String),

    #[error("slide has no relationship '{0}'")]
    ChartRelationshipNotFound(String),

    #[error("unknown dashboard '{0}'")]
    UnknownDashboard(String),
}

pub type Result<T> = std::result::Result<T, Error>;
