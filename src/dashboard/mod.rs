//! Built-in dashboard rule sets.
//!
//! Each dashboard encodes one slide's bespoke visual specification:
//! which cells land in which shapes, and the numeric thresholds driving
//! layout ("hide the label below 1.5% width", "switch to billions above
//! 999"). The thresholds are deliberately local constants per
//! dashboard — no shared model exists across them.

mod cash_position;
mod service_area;
mod top_clients;

use crate::generate::Dashboard;

pub use cash_position::CashPosition;
pub use service_area::ServiceArea;
pub use top_clients::TopClients;

/// Every built-in dashboard, in the order the batch run generates and
/// merges them.
pub fn registry() -> Vec<Box<dyn Dashboard>> {
    vec![
        Box::new(TopClients),
        Box::new(CashPosition),
        Box::new(ServiceArea),
    ]
}

/// Look up a dashboard by its registry name.
pub fn find(name: &str) -> Option<Box<dyn Dashboard>> {
    registry().into_iter().find(|d| d.name() == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let mut names: Vec<_> = registry().iter().map(|d| d.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), registry().len());
    }

    #[test]
    fn test_find() {
        assert!(find("service-area").is_some());
        assert!(find("no-such-dashboard").is_none());
    }
}
