//! Top-clients dashboard: ranked client lists with rank-movement
//! dot/line graphics between the prior and current year, plus the
//! composition charts refilled against a shared axis maximum.

use crate::addr::cell_range;
use crate::error::Result;
use crate::format::{FloatFormat, cell_to_f64, cell_to_string, format_float, format_percent};
use crate::generate::{Dashboard, Generator, SimpleFiller};
use std::cmp::Ordering;
use std::collections::HashMap;

pub struct TopClients;

/// Chart portions at or below this share render as zero (invisible).
const PORTION_FLOOR: f64 = 0.015;

/// Client names longer than this are cut to fit their row.
const MAX_CLIENT_NAME: usize = 27;

/// The (start row, optional end row) of each embedded composition
/// chart, in chart part order: detail blocks alternate with totals.
const CHART_ROWS: [(u32, Option<u32>); 8] = [
    (9, Some(23)),
    (25, None),
    (30, Some(44)),
    (46, None),
    (50, Some(54)),
    (55, None),
    (59, Some(63)),
    (64, None),
];

impl TopClients {
    /// Connect the two ranked lists: a dot per client on each side and a
    /// movement-colored connector for clients present in both years.
    fn add_position_graphics(&self, g: &mut Generator, cells_prior: &[String], cells_current: &[String]) -> Result<()> {
        let group = g.slide().find_by_title("separate-top-clients-by-revenue")?;

        let prior = self.positions(g, cells_prior)?;
        let current = self.positions(g, cells_current)?;

        let mut dropped: Vec<&String> = prior.keys().filter(|c| !current.contains_key(*c)).collect();
        let mut new: Vec<&String> = current.keys().filter(|c| !prior.contains_key(*c)).collect();
        let mut kept: Vec<&String> = prior.keys().filter(|c| current.contains_key(*c)).collect();
        dropped.sort();
        new.sort();
        kept.sort();

        // Gone from the current list: a dot on the prior side, no line.
        for client in dropped {
            let (x, y) = self.right_middle(g, &prior[client].1)?;
            g.slide_mut().add_circle(x, y, "rating-point-dropped", Some(group))?;
        }

        // New on the current list: a dot on the current side, no line.
        for client in new {
            let (x, y) = self.left_middle(g, &current[client].1)?;
            g.slide_mut().add_circle(x, y, "rating-point-new", Some(group))?;
        }

        // Present in both: endpoint dots plus a connector whose template
        // encodes the direction of the rank change.
        for client in kept {
            let (prior_pos, prior_cell) = &prior[client];
            let (current_pos, current_cell) = &current[client];
            let suffix = match prior_pos.cmp(current_pos) {
                Ordering::Less => "-down",
                Ordering::Equal => "-same",
                Ordering::Greater => "-up",
            };

            let (x0, y0) = self.right_middle(g, prior_cell)?;
            let (x1, y1) = self.left_middle(g, current_cell)?;
            g.slide_mut().add_circle(x0, y0, &format!("rating-point{suffix}"), Some(group))?;
            g.slide_mut().add_circle(x1, y1, &format!("rating-point{suffix}"), Some(group))?;
            g.slide_mut().add_line(x0, y0, x1, y1, &format!("rating-line{suffix}"), Some(group))?;
        }
        Ok(())
    }

    /// Client name -> (list position, cell name) for one ranked list.
    fn positions(&self, g: &Generator, cells: &[String]) -> Result<HashMap<String, (usize, String)>> {
        let mut positions = HashMap::new();
        for (pos, cell) in cells.iter().enumerate() {
            positions.insert(cell_to_string(&g.cell(cell)?), (pos, cell.clone()));
        }
        Ok(positions)
    }

    /// Middle of the right edge of a titled shape (the prior-year list
    /// progresses right to left).
    fn right_middle(&self, g: &Generator, title: &str) -> Result<(f64, f64)> {
        let (_, y0, x1, y1) = g.slide().shape_coords(title)?;
        Ok((x1 as f64, (y0 + y1) as f64 / 2.0))
    }

    /// Middle of the left edge (the current-year list progresses left to
    /// right).
    fn left_middle(&self, g: &Generator, title: &str) -> Result<(f64, f64)> {
        let (x0, y0, _, y1) = g.slide().shape_coords(title)?;
        Ok((x0 as f64, (y0 + y1) as f64 / 2.0))
    }

    /// Refill every composition chart. All bars share one axis maximum
    /// so sizes stay comparable across blocks, and portions at or below
    /// the visibility floor are clamped to zero.
    fn fill_charts(&self, g: &mut Generator) -> Result<()> {
        let mut chart_max = f64::MIN;
        for (row0, row1) in CHART_ROWS {
            let Some(row1) = row1 else { continue };
            for row in row0..=row1 {
                let mut total = 0.0;
                for col in ['F', 'G', 'H', 'I'] {
                    total += g.cell_f64(&format!("{col}{row}"))?;
                }
                chart_max = chart_max.max(total);
            }
        }
        let axis_max = format_float(chart_max, &FloatFormat::default());

        for (index, (row0, row1)) in CHART_ROWS.into_iter().enumerate() {
            let mut series_cells: Vec<Vec<String>> = Vec::new();
            for col in ['F', 'G', 'H', 'I'] {
                let mut cells = cell_range(
                    &format!("{col}{row0}"),
                    row1.map(|r| format!("{col}{r}")).as_deref(),
                )?;
                // The bars run bottom-up while the worksheet lists
                // clients top-down.
                cells.reverse();
                series_cells.push(cells);
            }

            let mut chart = g.chart_by_index(index as u32 + 1)?;
            let floor = |v: f64| if (0.0..=PORTION_FLOOR).contains(&v) { 0.0 } else { v };
            g.fill_chart_from_cells(&mut chart, &series_cells, Some(&floor))?;
            chart.set_axis_max(Some(&axis_max))?;
            g.store_chart(&chart)?;
        }
        Ok(())
    }
}

impl Dashboard for TopClients {
    fn name(&self) -> &'static str {
        "top-clients"
    }

    fn sheet_name(&self) -> Option<&'static str> {
        Some("Client Dashboard")
    }

    fn template_shape_names(&self) -> &'static [&'static str] {
        &[
            "rating-point-dropped",
            "rating-point-new",
            "rating-point-up",
            "rating-point-down",
            "rating-point-same",
            "rating-line-up",
            "rating-line-down",
            "rating-line-same",
        ]
    }

    fn separate_charts(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("separate-headline-metrics", "3-Headline-Metrics.pptx"),
            ("separate-top-clients-by-revenue", "3-Top-Clients-by-Revenue.pptx"),
            ("separate-top-clients-by-gcm", "3-Top-Clients-by-GCM.pptx"),
        ]
    }

    fn simple_fillers(&self) -> Result<Vec<SimpleFiller>> {
        Ok(vec![
            SimpleFiller::new(vec![cell_range("B4", Some("E4"))?], |v| {
                Ok(format!("{}%", format_percent(cell_to_f64(v)?, &FloatFormat::default())))
            }),
            SimpleFiller::new(
                vec![
                    cell_range("F25", None)?,
                    cell_range("H25", Some("I25"))?,
                    cell_range("F46", None)?,
                    cell_range("H46", Some("I46"))?,
                    cell_range("D68", Some("E88"))?,
                ],
                |v| {
                    Ok(format!(
                        "{}%",
                        format_percent(cell_to_f64(v)?, &FloatFormat::precision(0))
                    ))
                },
            ),
            // Revenue of individual clients caps at $999.
            SimpleFiller::new(
                vec![
                    cell_range("D9", Some("D23"))?,
                    cell_range("D30", Some("D44"))?,
                    cell_range("D50", Some("D54"))?,
                    cell_range("D59", Some("D63"))?,
                    cell_range("B68", Some("C87"))?,
                ],
                |v| {
                    Ok(format!(
                        "${}",
                        format_float(
                            cell_to_f64(v)? / 1e6,
                            &FloatFormat::precision(0).with_maximum(999.0)
                        )
                    ))
                },
            ),
            // Revenue totals cap at $9999.
            SimpleFiller::new(
                vec![
                    cell_range("D24", None)?,
                    cell_range("F24", None)?,
                    cell_range("H24", Some("I24"))?,
                    cell_range("D45", None)?,
                    cell_range("F45", None)?,
                    cell_range("H45", Some("I45"))?,
                    cell_range("D55", None)?,
                    cell_range("D64", None)?,
                    cell_range("B88", Some("C88"))?,
                ],
                |v| {
                    Ok(format!(
                        "${}",
                        format_float(
                            cell_to_f64(v)? / 1e6,
                            &FloatFormat::precision(0).with_maximum(9999.0)
                        )
                    ))
                },
            ),
            // Client names fit their rows, spaces included.
            SimpleFiller::new(
                vec![
                    cell_range("A9", Some("A23"))?,
                    cell_range("A30", Some("A44"))?,
                    cell_range("A50", Some("A54"))?,
                    cell_range("A59", Some("A63"))?,
                    cell_range("A68", Some("A87"))?,
                ],
                |v| {
                    Ok(cell_to_string(v)
                        .trim()
                        .chars()
                        .take(MAX_CLIENT_NAME)
                        .collect())
                },
            ),
        ])
    }

    fn fill(&self, g: &mut Generator) -> Result<()> {
        let prior_top = cell_range("A9", Some("A23"))?;
        let current_top = cell_range("A30", Some("A44"))?;
        self.add_position_graphics(g, &prior_top, &current_top)?;

        let prior_rising = cell_range("A50", Some("A54"))?;
        let current_rising = cell_range("A59", Some("A63"))?;
        self.add_position_graphics(g, &prior_rising, &current_rising)?;

        self.fill_charts(g)?;
        Ok(())
    }
}
