//! Relationship-type and content-type URIs used by the engine.

/// Relationship type URIs.
pub mod relationship_type {
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const NOTES_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesMaster";
    pub const OLE_OBJECT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/oleObject";
    pub const CHART: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";
}

/// Content type URIs.
pub mod content_type {
    pub const SLIDE: &str =
        "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";
}

/// Relationship types the merger must not follow or duplicate: these
/// parts stay bound to the base deck's shared masters and layouts.
pub const NON_FOLLOW_RELTYPES: [&str; 4] = [
    relationship_type::SLIDE_MASTER,
    relationship_type::NOTES_MASTER,
    relationship_type::SLIDE_LAYOUT,
    relationship_type::OLE_OBJECT,
];
