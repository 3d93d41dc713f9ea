//! Chart data filler.
//!
//! A chart part caches its series data; the host renderer plots the
//! cache without consulting the original workbook. Filling a chart
//! means rewriting the cached point nodes wholesale and, when a rule
//! calls for it, pinning or releasing the value-axis bounds.

use crate::opc::bundle::Bundle;
use crate::opc::error::PackageError;
use crate::xml::{NodeId, XmlDoc, XmlError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error(transparent)]
    Package(#[from] PackageError),

    #[error(transparent)]
    Xml(#[from] XmlError),

    #[error("chart has no series with index {0}")]
    SeriesNotFound(u32),

    #[error("chart has no '{0}' node")]
    MissingNode(&'static str),

    #[error("attribute '{0}' is not numeric")]
    BadAttr(&'static str),
}

pub type Result<T> = std::result::Result<T, ChartError>;

/// One chart part, parsed for cache rewriting.
pub struct ChartDoc {
    doc: XmlDoc,
    part: String,
}

impl ChartDoc {
    /// Parse a chart part out of a bundle ("ppt/charts/chart1.xml").
    pub fn open(bundle: &Bundle, part: &str) -> Result<Self> {
        let doc = XmlDoc::parse(&bundle.read_part(part)?)?;
        Ok(Self {
            doc,
            part: part.to_string(),
        })
    }

    /// The bundle-relative part path this chart was read from.
    #[inline]
    pub fn part(&self) -> &str {
        &self.part
    }

    /// Rewrite the cached values of one series.
    ///
    /// Existing cached points are deleted and one point per input value
    /// written in order, so point indices are always dense from
    /// `0..values.len()` — stale indices never survive a refill. The
    /// `convert` hook is applied per value (visibility clamping and the
    /// like).
    pub fn fill_series(
        &mut self,
        values: &[f64],
        series_index: u32,
        convert: Option<&dyn Fn(f64) -> f64>,
    ) -> Result<()> {
        let num_cache = self.series_cache(series_index)?;

        let stale: Vec<NodeId> = self
            .doc
            .children(num_cache)
            .iter()
            .copied()
            .filter(|&pt| self.doc.name(pt) == "c:pt")
            .collect();
        for pt in stale {
            self.doc.detach(pt);
        }

        for (index, &value) in values.iter().enumerate() {
            let value = match convert {
                Some(convert) => convert(value),
                None => value,
            };
            let pt = self.doc.create_element("c:pt");
            self.doc.set_attr(pt, "idx", index.to_string());
            let v = self.doc.create_element("c:v");
            self.doc.set_text(v, value.to_string());
            self.doc.append_child(pt, v);
            self.doc.append_child(num_cache, pt);
        }
        Ok(())
    }

    /// Fill several series at once, one row per series index.
    pub fn fill_data(&mut self, rows: &[Vec<f64>], convert: Option<&dyn Fn(f64) -> f64>) -> Result<()> {
        for (series_index, row) in rows.iter().enumerate() {
            self.fill_series(row, series_index as u32, convert)?;
        }
        Ok(())
    }

    fn series_cache(&self, series_index: u32) -> Result<NodeId> {
        let wanted = series_index.to_string();
        for ser in self.doc.find_descendants(self.doc.root(), "c:ser") {
            let matches = self
                .doc
                .find_child(ser, "c:idx")
                .and_then(|idx| self.doc.attr(idx, "val"))
                .is_some_and(|val| val == wanted);
            if matches {
                return self
                    .doc
                    .find_descendant(ser, "c:numCache")
                    .ok_or(ChartError::MissingNode("c:numCache"));
            }
        }
        Err(ChartError::SeriesNotFound(series_index))
    }

    /// Pin or release the value-axis maximum. `None` removes the node,
    /// letting the host renderer auto-scale.
    pub fn set_axis_max(&mut self, value: Option<&str>) -> Result<()> {
        self.set_scaling_bound("c:max", value)
    }

    /// Pin or release the value-axis minimum.
    pub fn set_axis_min(&mut self, value: Option<&str>) -> Result<()> {
        self.set_scaling_bound("c:min", value)
    }

    fn set_scaling_bound(&mut self, name: &'static str, value: Option<&str>) -> Result<()> {
        let val_ax = self
            .doc
            .find_descendant(self.doc.root(), "c:valAx")
            .ok_or(ChartError::MissingNode("c:valAx"))?;
        let scaling = self
            .doc
            .find_child(val_ax, "c:scaling")
            .ok_or(ChartError::MissingNode("c:scaling"))?;

        match value {
            Some(value) => {
                let bound = self.doc.get_or_create_child(scaling, name);
                self.doc.set_attr(bound, "val", value);
            },
            None => {
                if let Some(bound) = self.doc.find_child(scaling, name) {
                    self.doc.detach(bound);
                }
            },
        }
        Ok(())
    }

    /// Pin or release the value-axis major unit.
    pub fn set_major_unit(&mut self, value: Option<&str>) -> Result<()> {
        let val_ax = self
            .doc
            .find_descendant(self.doc.root(), "c:valAx")
            .ok_or(ChartError::MissingNode("c:valAx"))?;
        match value {
            Some(value) => {
                let unit = self.doc.get_or_create_child(val_ax, "c:majorUnit");
                self.doc.set_attr(unit, "val", value);
            },
            None => {
                if let Some(unit) = self.doc.find_child(val_ax, "c:majorUnit") {
                    self.doc.detach(unit);
                }
            },
        }
        Ok(())
    }

    /// Plot-area layout fraction of the chart frame: x offset.
    pub fn x(&self) -> Result<f64> {
        self.layout_fraction("c:x")
    }

    /// Plot-area layout fraction: y offset.
    pub fn y(&self) -> Result<f64> {
        self.layout_fraction("c:y")
    }

    /// Plot-area layout fraction: width.
    pub fn w(&self) -> Result<f64> {
        self.layout_fraction("c:w")
    }

    /// Plot-area layout fraction: height.
    pub fn h(&self) -> Result<f64> {
        self.layout_fraction("c:h")
    }

    fn layout_fraction(&self, name: &'static str) -> Result<f64> {
        let node = self
            .doc
            .find_descendant(self.doc.root(), name)
            .ok_or(ChartError::MissingNode(name))?;
        self.doc
            .attr(node, "val")
            .and_then(|v| v.parse().ok())
            .ok_or(ChartError::BadAttr("val"))
    }

    /// Serialize the chart part back into the bundle.
    pub fn store(&self, bundle: &Bundle) -> Result<()> {
        bundle.write_part(&self.part, &self.doc.serialize()?)?;
        Ok(())
    }
}
