//! Package plumbing: pack URIs, relationships, content types and the
//! unpacked bundle form of a zipped document package.

pub mod bundle;
pub mod constants;
pub mod content_types;
pub mod error;
pub mod packuri;
pub mod rel;

pub use bundle::Bundle;
pub use content_types::ContentTypes;
pub use error::PackageError;
pub use packuri::PackUri;
pub use rel::{Relationship, Relationships};
