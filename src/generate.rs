//! One dashboard generation run.
//!
//! A [`Generator`] drives a single pass: open the workbook, extract the
//! template bundle, index the slide, apply the dashboard's fillers and
//! bespoke rules, serialize, archive, export separate charts and
//! dispose of the scratch state.
//!
//! Data fills degrade gracefully — a cell whose value cannot be
//! formatted renders the visible `INVALID VALUE` sentinel and logs a
//! warning instead of aborting the run. Structural failures (missing
//! template shapes, malformed packages) abort.

use crate::chart::ChartDoc;
use crate::error::{Error, Result};
use crate::format::{self, INVALID_VALUE};
use crate::opc::bundle::{Bundle, PRESENTATION_PART, SLIDE_PART, SLIDE_RELS_PART};
use crate::opc::rel::Relationships;
use crate::slide::{SlideDoc, SlideError};
use crate::workbook::{CellValue, Workbook};
use crate::xml::XmlDoc;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// The template package to fill.
    pub template: PathBuf,
    /// The workbook the cell values come from.
    pub workbook: PathBuf,
    /// Where the generated deck is written.
    pub output: PathBuf,
    /// Blank every text fill instead of writing values (produces an
    /// empty visual template).
    pub fill_empty: bool,
    /// Strip shapes lacking a title before filling.
    pub clean: bool,
    /// Directory receiving the per-section separate chart exports.
    pub separate_charts_dir: PathBuf,
}

impl GenerateOptions {
    pub fn new(template: impl Into<PathBuf>, workbook: impl Into<PathBuf>) -> Self {
        Self {
            template: template.into(),
            workbook: workbook.into(),
            output: PathBuf::from("output.pptx"),
            fill_empty: false,
            clean: false,
            separate_charts_dir: PathBuf::from("separate-charts"),
        }
    }
}

/// Conversion from a cell value to display text. Failures degrade to
/// the [`INVALID_VALUE`] sentinel per cell.
pub type Convert = Box<dyn Fn(&CellValue) -> format::Result<String>>;

/// Cells whose values fill same-titled shapes through one conversion.
pub struct SimpleFiller {
    pub cells: Vec<String>,
    pub convert: Convert,
}

impl SimpleFiller {
    /// Build a filler from groups of cell names (the output of
    /// [`crate::addr::cell_range`] calls) and a conversion.
    pub fn new<F>(groups: Vec<Vec<String>>, convert: F) -> Self
    where
        F: Fn(&CellValue) -> format::Result<String> + 'static,
    {
        Self {
            cells: groups.into_iter().flatten().collect(),
            convert: Box::new(convert),
        }
    }
}

/// Cells whose text is split into words and rendered one paragraph per
/// word, each truncated to `max_chars`.
pub struct LineFiller {
    pub max_chars: usize,
    pub cells: Vec<String>,
}

impl LineFiller {
    pub fn new(max_chars: usize, groups: Vec<Vec<String>>) -> Self {
        Self {
            max_chars,
            cells: groups.into_iter().flatten().collect(),
        }
    }
}

/// One dashboard's rule set: which sheet it reads, which template
/// shapes it clones, what it exports, and its fill logic.
pub trait Dashboard {
    /// The registry name used on the command line.
    fn name(&self) -> &'static str;

    /// Preferred worksheet; generation falls back to the first sheet.
    fn sheet_name(&self) -> Option<&'static str> {
        None
    }

    /// Titles of shapes pulled out as clonable prototypes before
    /// filling. All of them must exist in the template.
    fn template_shape_names(&self) -> &'static [&'static str] {
        &[]
    }

    /// (shape title, output file name) pairs exported as standalone
    /// single-shape decks.
    fn separate_charts(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    fn simple_fillers(&self) -> Result<Vec<SimpleFiller>> {
        Ok(Vec::new())
    }

    fn line_fillers(&self) -> Result<Vec<LineFiller>> {
        Ok(Vec::new())
    }

    /// Bespoke layout rules, run after the declarative fillers.
    fn fill(&self, generator: &mut Generator) -> Result<()> {
        let _ = generator;
        Ok(())
    }
}

/// State for one generation pass.
pub struct Generator {
    workbook: Workbook,
    bundle: Bundle,
    slide: SlideDoc,
    options: GenerateOptions,
}

impl Generator {
    /// Run one dashboard generation end to end.
    pub fn run(dashboard: &dyn Dashboard, options: GenerateOptions) -> Result<()> {
        info!(
            dashboard = dashboard.name(),
            template = %options.template.display(),
            output = %options.output.display(),
            "generating deck"
        );

        let workbook = Workbook::open(&options.workbook, dashboard.sheet_name())?;
        let bundle = Bundle::extract(&options.template)?;
        let mut slide = SlideDoc::load(&bundle, options.fill_empty)?;

        if options.clean {
            slide.clean();
        }
        slide.extract_templates(dashboard.template_shape_names())?;
        slide.index_shapes();

        let mut generator = Self {
            workbook,
            bundle,
            slide,
            options,
        };
        generator.fill_values(dashboard)?;
        dashboard.fill(&mut generator)?;

        generator.slide.store(&generator.bundle)?;
        generator.bundle.archive_to(&generator.options.output)?;
        generator.export_separate_charts(dashboard)?;
        Ok(())
    }

    #[inline]
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    #[inline]
    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    #[inline]
    pub fn slide(&self) -> &SlideDoc {
        &self.slide
    }

    #[inline]
    pub fn slide_mut(&mut self) -> &mut SlideDoc {
        &mut self.slide
    }

    /// Look up a cell value by name.
    pub fn cell(&self, name: &str) -> Result<CellValue> {
        Ok(self.workbook.cell(name)?)
    }

    /// Look up a cell and coerce it to a float.
    pub fn cell_f64(&self, name: &str) -> Result<f64> {
        Ok(format::cell_to_f64(&self.workbook.cell(name)?)?)
    }

    /// Look up a cell as display text.
    pub fn cell_text(&self, name: &str) -> Result<String> {
        Ok(format::cell_to_string(&self.workbook.cell(name)?))
    }

    /// Apply the dashboard's declarative fillers. Cells filled more
    /// than once are collected and logged as one warning.
    fn fill_values(&mut self, dashboard: &dyn Dashboard) -> Result<()> {
        let mut filled: HashSet<String> = HashSet::new();
        let mut duplicated: BTreeSet<String> = BTreeSet::new();

        for filler in dashboard.simple_fillers()? {
            for cell in &filler.cells {
                if !filled.insert(cell.clone()) {
                    duplicated.insert(cell.clone());
                }
                let value = self.workbook.cell(cell)?;
                let text = display_text(&filler.convert, &value, cell);
                if let Err(err) = self.slide.set_text(cell, &text) {
                    warn!(cell = %cell, %err, "could not set text");
                }
            }
        }

        for filler in dashboard.line_fillers()? {
            for cell in &filler.cells {
                if !filled.insert(cell.clone()) {
                    duplicated.insert(cell.clone());
                }
                let value = self.cell_text(cell)?;
                let lines: Vec<String> = value
                    .split_whitespace()
                    .map(|word| word.chars().take(filler.max_chars).collect())
                    .collect();
                let shape = self.slide.find_by_title(cell)?;
                self.slide.set_element_text_lines(shape, &lines)?;
            }
        }

        if !duplicated.is_empty() {
            warn!(cells = ?duplicated, "cells were filled several times");
        }
        Ok(())
    }

    /// Open an embedded chart by its index-addressed part
    /// ("ppt/charts/chart3.xml").
    pub fn chart_by_index(&self, index: u32) -> Result<ChartDoc> {
        Ok(ChartDoc::open(&self.bundle, &format!("ppt/charts/chart{index}.xml"))?)
    }

    /// Open the embedded chart referenced by the shape with the given
    /// title, resolving its relationship through the slide's .rels part.
    pub fn chart_by_title(&self, title: &str) -> Result<ChartDoc> {
        let shape = self.slide.find_by_title(title)?;
        let chart_ref = self
            .slide
            .doc()
            .find_descendant(shape, "c:chart")
            .ok_or_else(|| Error::NoChartReference(title.to_string()))?;
        let r_id = self
            .slide
            .doc()
            .attr(chart_ref, "r:id")
            .ok_or_else(|| Error::NoChartReference(title.to_string()))?
            .to_string();

        let rels = Relationships::parse(&self.bundle.read_part(SLIDE_RELS_PART)?)?;
        let rel = rels
            .get(&r_id)
            .ok_or(Error::ChartRelationshipNotFound(r_id))?;
        let part = rel.target_partname("/ppt/slides")?;
        Ok(ChartDoc::open(&self.bundle, part.membername())?)
    }

    /// Write a chart part back into the bundle.
    pub fn store_chart(&self, chart: &ChartDoc) -> Result<()> {
        Ok(chart.store(&self.bundle)?)
    }

    /// Fill a chart from cell names, one group of cells per series.
    pub fn fill_chart_from_cells(
        &self,
        chart: &mut ChartDoc,
        series_cells: &[Vec<String>],
        convert: Option<&dyn Fn(f64) -> f64>,
    ) -> Result<()> {
        let mut rows = Vec::with_capacity(series_cells.len());
        for cells in series_cells {
            let mut values = Vec::with_capacity(cells.len());
            for cell in cells {
                values.push(self.cell_f64(cell)?);
            }
            rows.push(values);
        }
        Ok(chart.fill_data(&rows, convert)?)
    }

    /// The plot-area rectangle of a chart shape in slide coordinates:
    /// the shape's frame scaled by the chart's layout fractions.
    pub fn plot_area_coords(&self, title: &str) -> Result<(i64, i64, i64, i64)> {
        let shape = self.slide.find_by_title(title)?;
        let (x0, y0, x1, y1) = self.slide.element_coords(shape)?;
        let chart = self.chart_by_title(title)?;

        let w = (x1 - x0) as f64;
        let h = (y1 - y0) as f64;
        let px0 = x0 as f64 + w * chart.x()?;
        let py0 = y0 as f64 + h * chart.y()?;
        let px1 = px0 + w * chart.w()?;
        let py1 = py0 + h * chart.h()?;
        Ok((
            px0.round() as i64,
            py0.round() as i64,
            px1.round() as i64,
            py1.round() as i64,
        ))
    }

    /// Export each declared shape group as a standalone deck whose slide
    /// is resized to exactly fit the group (preserving the master deck's
    /// aspect ratio) with the group centered.
    fn export_separate_charts(&mut self, dashboard: &dyn Dashboard) -> Result<()> {
        let exports = dashboard.separate_charts();
        if exports.is_empty() {
            return Ok(());
        }

        let pres = XmlDoc::parse(&self.bundle.read_part(PRESENTATION_PART)?)?;
        let sld_sz = pres
            .find_descendant(pres.root(), "p:sldSz")
            .ok_or(SlideError::MissingNode("p:sldSz"))?;
        let main_w: f64 = pres
            .attr(sld_sz, "cx")
            .and_then(|v| v.parse().ok())
            .ok_or(SlideError::BadAttr("cx"))?;
        let main_h: f64 = pres
            .attr(sld_sz, "cy")
            .and_then(|v| v.parse().ok())
            .ok_or(SlideError::BadAttr("cy"))?;
        let main_proportions = main_w / main_h;

        for &(title, file_name) in exports {
            let source = self.slide.find_by_title(title)?;
            let element = self.slide.doc_mut().deep_clone(source);
            let (e_w, e_h) = self.slide.element_sizes(element)?;

            let separate = self.bundle.clone_dir()?;
            let (slide_w, slide_h) =
                set_slide_size(&separate, e_w as f64, e_h as f64, main_proportions)?;
            self.slide.set_element_pos(
                element,
                Some((slide_w - e_w as f64) / 2.0),
                Some((slide_h - e_h as f64) / 2.0),
            )?;

            let mut sep_slide = XmlDoc::parse(&separate.read_part(SLIDE_PART)?)?;
            let sp_tree = sep_slide
                .find_descendant(sep_slide.root(), "p:spTree")
                .ok_or(SlideError::MissingNode("p:spTree"))?;
            let nv_grp = sep_slide
                .find_child(sp_tree, "p:nvGrpSpPr")
                .ok_or(SlideError::MissingNode("p:nvGrpSpPr"))?;
            let grp_pr = sep_slide
                .find_child(sp_tree, "p:grpSpPr")
                .ok_or(SlideError::MissingNode("p:grpSpPr"))?;
            let imported = sep_slide.import(self.slide.doc(), element);

            sep_slide.clear_children(sp_tree);
            sep_slide.append_child(sp_tree, nv_grp);
            sep_slide.append_child(sp_tree, grp_pr);
            sep_slide.append_child(sp_tree, imported);
            separate.write_part(SLIDE_PART, &sep_slide.serialize()?)?;

            fs::create_dir_all(&self.options.separate_charts_dir)?;
            let out = self.options.separate_charts_dir.join(file_name);
            separate.archive_to(&out)?;
            info!(title, output = %out.display(), "exported separate chart");
        }
        Ok(())
    }
}

/// Convert one cell value to display text. A conversion failure is
/// recoverable: the cell renders the visible sentinel, a warning is
/// logged and generation continues — one bad cell must not cost the
/// rest of the slide.
fn display_text(convert: &Convert, value: &CellValue, cell: &str) -> String {
    match convert(value) {
        Ok(text) => text,
        Err(err) => {
            warn!(cell = %cell, value = %value, %err, "could not prepare cell value");
            INVALID_VALUE.to_string()
        },
    }
}

/// Resize a bundle's slide to the element extent, widened or heightened
/// to preserve the master aspect ratio. Returns the adjusted size.
fn set_slide_size(
    bundle: &Bundle,
    e_w: f64,
    e_h: f64,
    main_proportions: f64,
) -> Result<(f64, f64)> {
    let mut pres = XmlDoc::parse(&bundle.read_part(PRESENTATION_PART)?)?;
    let sld_sz = pres
        .find_descendant(pres.root(), "p:sldSz")
        .ok_or(SlideError::MissingNode("p:sldSz"))?;

    let (mut w, mut h) = (e_w, e_h);
    if w / h < main_proportions {
        w = (h * main_proportions).round();
    } else {
        h = (w / main_proportions).round();
    }

    pres.set_attr(sld_sz, "cx", (w as i64).to_string());
    pres.set_attr(sld_sz, "cy", (h as i64).to_string());
    bundle.write_part(PRESENTATION_PART, &pres.serialize()?)?;
    Ok((w, h))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::cell_to_f64;

    #[test]
    fn test_bad_cell_degrades_to_sentinel() {
        let convert: Convert =
            Box::new(|v| Ok(format!("{}%", crate::format::format_percent(cell_to_f64(v)?, &Default::default()))));

        // A non-numeric value renders the visible sentinel...
        assert_eq!(
            display_text(&convert, &CellValue::Text("N/A".into()), "B9"),
            INVALID_VALUE
        );
        // ...while the neighbouring cells keep formatting normally.
        assert_eq!(display_text(&convert, &CellValue::Number(0.256), "C9"), "25.6%");
    }

    #[test]
    fn test_set_slide_size_preserves_aspect_ratio() {
        let scratch = tempfile::TempDir::new().unwrap();
        let package = crate::opc::bundle::testutil::write_minimal_package(scratch.path());
        let bundle = Bundle::extract(&package).unwrap();
        bundle
            .write_part(
                PRESENTATION_PART,
                br#"<?xml version="1.0"?><p:presentation xmlns:p="p"><p:sldSz cx="12192000" cy="6858000"/></p:presentation>"#,
            )
            .unwrap();

        // A tall element gets widened to the 16:9 master ratio.
        let (w, h) = set_slide_size(&bundle, 1000.0, 2000.0, 12192000.0 / 6858000.0).unwrap();
        assert_eq!(h, 2000.0);
        assert!((w / h - 12192000.0 / 6858000.0).abs() < 1e-3);

        // A wide element gets heightened instead.
        let (w, h) = set_slide_size(&bundle, 8000.0, 1000.0, 12192000.0 / 6858000.0).unwrap();
        assert_eq!(w, 8000.0);
        assert!((w / h - 12192000.0 / 6858000.0).abs() < 1e-2);

        let pres = XmlDoc::parse(&bundle.read_part(PRESENTATION_PART).unwrap()).unwrap();
        let sld_sz = pres.find_descendant(pres.root(), "p:sldSz").unwrap();
        assert_eq!(pres.attr(sld_sz, "cx"), Some("8000"));
    }
}
