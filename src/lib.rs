//! Longan - template-driven PowerPoint dashboard generation
//!
//! This library fills a fixed PresentationML (.pptx) template's named
//! shapes from Excel workbook cells: positions, sizes, colors, text and
//! embedded chart caches are all driven by cell values, producing one
//! single-slide deck per dashboard. A merge step combines the generated
//! decks into one multi-slide deck with globally unique part paths and
//! relationship ids.
//!
//! # Features
//!
//! - **Cell addressing**: "A1"-style names, ranges and round-tripping
//! - **Document model accessor**: title-indexed shape lookup with
//!   geometry, text and style mutation over an arena element tree
//! - **Template shape registry**: prototypes extracted once and cloned
//!   per generated graphic
//! - **Chart data filler**: cached series rewriting and axis bounds
//! - **Value formatters**: percent, money, magnitude suffixes, with
//!   documented clamp/rounding contracts
//! - **Presentation merger**: breadth-first relationship walk with
//!   part renumbering and content-type deduplication
//!
//! # Example - Generating one dashboard deck
//!
//! ```no_run
//! use longan::dashboard;
//! use longan::generate::{GenerateOptions, Generator};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dashboard = dashboard::find("service-area").expect("registered");
//! let options = GenerateOptions::new("template.pptx", "figures.xlsx");
//! Generator::run(dashboard.as_ref(), options)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Merging generated decks
//!
//! ```no_run
//! use longan::merge::merge_presentations;
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! merge_presentations(
//!     &["deck-a.pptx", "deck-b.pptx"],
//!     Path::new("combined.pptx"),
//! )?;
//! # Ok(())
//! # }
//! ```

/// Spreadsheet cell addressing: names, indices and ranges.
pub mod addr;

/// Chart data filler for embedded chart parts.
pub mod chart;

/// Built-in dashboard rule sets and their registry.
pub mod dashboard;

/// Crate-level error type.
pub mod error;

/// Pure value formatters with documented clamp/rounding contracts.
pub mod format;

/// The per-dashboard generation run.
pub mod generate;

/// The presentation merger.
pub mod merge;

/// Package plumbing: pack URIs, relationships, content types, bundles.
pub mod opc;

/// The slide document model accessor.
pub mod slide;

/// Read-only workbook access.
pub mod workbook;

/// Arena-backed XML element tree.
pub mod xml;

pub use error::{Error, Result};
pub use generate::{Dashboard, GenerateOptions, Generator};
pub use slide::SlideDoc;
pub use workbook::{CellValue, Workbook};
