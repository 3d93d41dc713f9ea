//! Service-area dashboard: headline growth chevrons plus a proportional
//! column chart built from per-function revenue/earnings ratios.

use crate::addr::{alpha_range, cell_range};
use crate::error::Result;
use crate::format::{FloatFormat, cell_to_f64, cell_to_string, format_float, format_percent};
use crate::generate::{Dashboard, Generator, SimpleFiller};

pub struct ServiceArea;

// Width thresholds for the column sections, as fractions of the chart
// box: below MIN_LABEL_WIDTH no figures render at all, below
// VERTICAL_LABEL_WIDTH they turn vertical, below ROTATED_TITLE_WIDTH the
// first column's outer labels move outside the chart.
const MIN_LABEL_WIDTH: f64 = 0.015;
const VERTICAL_LABEL_WIDTH: f64 = 0.035;
const ROTATED_TITLE_WIDTH: f64 = 0.04;

impl ServiceArea {
    fn fill_headline_metrics(&self, g: &mut Generator) -> Result<()> {
        // Negative growth keeps the downward chevron, positive the
        // upward one; the other is dropped.
        for cell in ["C4", "F4", "H4", "K4"] {
            let value = g.cell_f64(cell)?;
            let drop = if value < 0.0 { "up" } else { "down" };
            let arrow = g.slide().find_by_title(&format!("{cell}-arrow-{drop}"))?;
            g.slide_mut().doc_mut().detach(arrow);
        }

        // The risk-analytics service line reads as plain analytics on
        // this deck.
        let mut label = cell_to_string(&g.cell("C2")?);
        if label == "Risk Analytics" {
            label = "Analytics".to_string();
        }
        g.slide_mut().set_text("C2", &label)?;
        Ok(())
    }

    fn fill_chart(&self, g: &mut Generator) -> Result<()> {
        let cols = alpha_range('B', 'M');

        let chart_box = g.slide().find_by_title("chart-box")?;
        let (x0, y0, x1, y1) = g.slide().element_coords(chart_box)?;
        let w = (x1 - x0) as f64;
        let h = (y1 - y0) as f64;
        let (x0, y0) = (x0 as f64, y0 as f64);

        let eba_axis = g.slide().find_by_title("eba")?;
        g.slide_mut().set_element_pos(eba_axis, None, Some(y0 + h * 0.75))?;

        let mut x = x0;
        for (i, &col) in cols.iter().enumerate() {
            // Row 8 is the section's revenue share, row 11 its margin;
            // the solid box height is clamped between 8% and 83%.
            let wpn = g.cell_f64(&format!("{col}8"))?;
            let wn = wpn * w;
            let hpn = g.cell_f64(&format!("{col}11"))?.clamp(0.08, 0.83);
            let hn = hpn * h;

            let rotated = wpn <= ROTATED_TITLE_WIDTH;

            let rect = g.slide().find_by_title(&format!("{col}11"))?;
            let eba_label = g.slide().find_by_title(&format!("{col}10"))?;
            let revenue_label = g.slide().find_by_title(&format!("{col}7"))?;
            let title = g.slide().find_by_title(&format!("{col}6"))?;
            let arrow = g.slide_mut().clone_template("template-arrow")?;

            g.slide_mut().set_element_size(rect, Some(wn), Some(hn))?;
            g.slide_mut().set_element_pos(rect, Some(x), Some(y0 + h - hn))?;

            // Earnings figure placement by margin band: high margins get
            // white text inside the box, lower bands recolor the figure
            // to the function color and nudge it.
            if hpn >= 0.32 {
                g.slide_mut().set_element_pos(eba_label, None, Some(y0 + h - 0.32 * h))?;
            } else if hpn >= 0.27 {
                let color = g.slide().element_fill_color(rect)?;
                g.slide_mut().set_element_text_color(eba_label, &color)?;
                g.slide_mut().set_element_pos(eba_label, None, Some(y0 + h - 0.345 * h))?;
            } else {
                let color = g.slide().element_fill_color(rect)?;
                g.slide_mut().set_element_text_color(eba_label, &color)?;
                g.slide_mut().set_element_pos(eba_label, None, Some(y0 + h - 0.32 * h))?;
            }

            // The rotated column title's top-right corner sits at the
            // section's horizontal center.
            let (title_w, title_h) = g.slide().element_sizes(title)?;
            let title_angle = (g.slide().element_rotation(title)? / 60000.0).to_radians();
            let title_shift =
                (title_w as f64 * title_angle.cos() + title_h as f64 * title_angle.sin()) / 2.0;
            g.slide_mut()
                .set_element_pos(title, Some(x + (wn - title_w as f64) / 2.0 - title_shift), None)?;

            // Sections wide enough get their growth chevron, pointing up
            // for positive growth.
            if wpn > MIN_LABEL_WIDTH {
                let (arrow_w, _) = g.slide().element_sizes(arrow)?;
                g.slide_mut()
                    .set_element_pos(arrow, Some(x + (wn - arrow_w as f64) / 2.0), None)?;
                let group = g.slide().find_by_title("separate-revenue-eba")?;
                g.slide_mut().add_shape(arrow, Some(group))?;

                if g.cell_f64(&format!("{col}9"))? < 0.0 {
                    g.slide_mut().set_element_flip_v(arrow, true)?;
                    g.slide_mut().set_element_flip_h(arrow, true)?;
                }
            }

            // Figure labels by width band: hidden when too narrow,
            // vertical right-aligned when narrow, horizontal centered
            // otherwise.
            for row in [7, 9, 10, 12] {
                let label = g.slide().find_by_title(&format!("{col}{row}"))?;
                if wpn <= MIN_LABEL_WIDTH {
                    g.slide_mut().doc_mut().detach(label);
                } else {
                    g.slide_mut().set_element_size(label, Some(wn), None)?;
                    g.slide_mut().set_element_pos(label, Some(x), None)?;
                    let narrow = wpn < VERTICAL_LABEL_WIDTH;
                    g.slide_mut()
                        .set_element_text_direction(label, narrow.then_some("vert270"))?;
                    g.slide_mut()
                        .set_element_text_alignment(label, Some(if narrow { "r" } else { "ctr" }))?;
                }
            }

            // The first column carries the axis labels.
            if i == 0 {
                if rotated {
                    // Too narrow: the labels move outside the left edge,
                    // rendered black.
                    for outer in ["eba", "revenue", "margin"] {
                        let label = g.slide().find_by_title(outer)?;
                        let (label_w, _) = g.slide().element_sizes(label)?;
                        g.slide_mut().set_element_pos(label, Some(x0 - label_w as f64), None)?;
                        g.slide_mut().set_element_text_color(label, "000000")?;
                    }
                } else if hpn < 0.25 {
                    // Low margin: the earnings label takes the box color.
                    let eba = g.slide().find_by_title("eba")?;
                    let color = g.slide().element_fill_color(rect)?;
                    g.slide_mut().set_element_text_color(eba, &color)?;
                } else if hpn > 0.8 {
                    // Very high margin: the revenue figure moves inside
                    // the box and turns white.
                    let revenue = g.slide().find_by_title("revenue")?;
                    g.slide_mut().set_element_pos(revenue, None, Some(y0 + 0.25 * h))?;
                    let (_, rev_label_h) = g.slide().element_sizes(revenue_label)?;
                    g.slide_mut().set_element_pos(
                        revenue_label,
                        None,
                        Some(y0 + 0.25 * h - rev_label_h as f64),
                    )?;
                    g.slide_mut().set_element_text_color(revenue_label, "FFFFFF")?;
                    g.slide_mut().set_element_text_color(revenue, "FFFFFF")?;
                }
            }

            x += wn;

            if i + 1 < cols.len() {
                let sep = g.slide().find_by_title(&format!("{col}-sep"))?;
                g.slide_mut().set_element_pos(sep, Some(x), None)?;
            }
        }

        // Function group labels centered over their column spans.
        for (label_title, first, last) in [
            ("advisory", 'B', 'E'),
            ("audit", 'F', 'F'),
            ("consulting", 'G', 'I'),
            ("tax", 'J', 'M'),
        ] {
            let label = g.slide().find_by_title(label_title)?;
            let start = g.slide().find_by_title(&format!("{first}11"))?;
            let end = g.slide().find_by_title(&format!("{last}11"))?;
            let (label_w, _) = g.slide().element_sizes(label)?;
            let left = g.slide().element_coords(start)?.0;
            let right = g.slide().element_coords(end)?.2;
            g.slide_mut()
                .set_element_pos(label, Some((right + left - label_w) as f64 / 2.0), None)?;
        }
        Ok(())
    }
}

impl Dashboard for ServiceArea {
    fn name(&self) -> &'static str {
        "service-area"
    }

    fn sheet_name(&self) -> Option<&'static str> {
        Some("Service Area Dashboard")
    }

    fn template_shape_names(&self) -> &'static [&'static str] {
        &["template-arrow"]
    }

    fn separate_charts(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("separate-headline-metrics", "1-Service-Area-Headline-Metrics.pptx"),
            ("separate-revenue-eba", "1-Service-Area-Rev-Eba.pptx"),
        ]
    }

    fn simple_fillers(&self) -> Result<Vec<SimpleFiller>> {
        Ok(vec![
            SimpleFiller::new(
                vec![
                    cell_range("F2", None)?,
                    cell_range("H2", None)?,
                    cell_range("K2", None)?,
                    cell_range("B6", Some("M6"))?,
                ],
                |v| Ok(cell_to_string(v)),
            ),
            SimpleFiller::new(
                vec![
                    cell_range("C4", None)?,
                    cell_range("F4", None)?,
                    cell_range("H4", None)?,
                    cell_range("K4", None)?,
                    cell_range("B9", Some("M9"))?,
                ],
                |v| {
                    Ok(format!(
                        "{}%",
                        format_percent(cell_to_f64(v)?.abs(), &FloatFormat::precision(0))
                    ))
                },
            ),
            SimpleFiller::new(vec![cell_range("B12", Some("M12"))?], |v| {
                Ok(format!(
                    "{}%",
                    format_percent(cell_to_f64(v)?, &FloatFormat::precision(0))
                ))
            }),
            SimpleFiller::new(
                vec![cell_range("B7", Some("M7"))?, cell_range("B10", Some("M10"))?],
                |v| {
                    Ok(format!(
                        "${}",
                        format_float(cell_to_f64(v)? / 1e6, &FloatFormat::precision(0))
                    ))
                },
            ),
        ])
    }

    fn fill(&self, g: &mut Generator) -> Result<()> {
        self.fill_headline_metrics(g)?;
        self.fill_chart(g)?;
        Ok(())
    }
}
