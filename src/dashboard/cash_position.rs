//! Cash-position dashboard: headline liquidity metrics with
//! magnitude-scaled money figures and capped rate displays.

use crate::addr::cell_range;
use crate::error::Result;
use crate::format::{
    FloatFormat, ScaleBreak, cell_to_f64, cell_to_string, format_float, format_percent,
    format_scaled, with_comma,
};
use crate::generate::{Dashboard, Generator, SimpleFiller};

pub struct CashPosition;

// Up to $999M figures display in millions with no decimals; above that
// they switch to billions with two. The breakpoint is this dashboard's
// own — other decks scale differently.
const MILLIONS_TO_BILLIONS: ScaleBreak = ScaleBreak {
    break_at: 999.0,
    divisor: 1000.0,
    lower: "M",
    upper: "B",
    lower_precision: 0,
    upper_precision: 2,
};

fn big_money(value: f64) -> String {
    let millions = (value / 1e6).round();
    format!("${}", format_scaled(millions, &MILLIONS_TO_BILLIONS))
}

impl CashPosition {
    fn fill_headline_metrics(&self, g: &mut Generator) -> Result<()> {
        // The weeks-in-receivable chevron points up for zero or positive
        // movement, down otherwise (the template ships pointing down).
        let value = g.cell_f64("C5")?;
        if value >= 0.0 {
            let arrow = g.slide().find_by_title("C5 Arrow")?;
            g.slide_mut().set_element_flip_v(arrow, true)?;
        }
        Ok(())
    }
}

impl Dashboard for CashPosition {
    fn name(&self) -> &'static str {
        "cash-position"
    }

    fn sheet_name(&self) -> Option<&'static str> {
        Some("Liquidity Dashboard")
    }

    fn simple_fillers(&self) -> Result<Vec<SimpleFiller>> {
        Ok(vec![
            SimpleFiller::new(vec![cell_range("C4", None)?], |v| {
                Ok(format_float(cell_to_f64(v)?, &FloatFormat::default().with_strip(false)))
            }),
            SimpleFiller::new(vec![cell_range("C5", None)?], |v| {
                Ok(format!(
                    "{} Weeks",
                    format_float(cell_to_f64(v)?.abs(), &FloatFormat::default().with_strip(false))
                ))
            }),
            SimpleFiller::new(
                vec![cell_range("F6", None)?, cell_range("I6", None)?, cell_range("L6", None)?],
                |v| {
                    Ok(format!(
                        "{}BPS",
                        format_float(cell_to_f64(v)?.abs().min(99_999.0), &FloatFormat::precision(0))
                    ))
                },
            ),
            SimpleFiller::new(
                vec![cell_range("F5", None)?, cell_range("I5", None)?, cell_range("L5", None)?],
                |v| {
                    Ok(format!(
                        "{}%",
                        format_percent(
                            cell_to_f64(v)?.min(0.999),
                            &FloatFormat::default().with_strip(false)
                        )
                    ))
                },
            ),
            SimpleFiller::new(
                vec![cell_range("F4", None)?, cell_range("I4", None)?, cell_range("L4", None)?],
                |v| Ok(big_money(cell_to_f64(v)?)),
            ),
            SimpleFiller::new(vec![cell_range("B25", Some("G26"))?], |v| {
                Ok(big_money(cell_to_f64(v)?.min(99.99 * 1000.0) * 1e6))
            }),
            SimpleFiller::new(
                vec![cell_range("A10", Some("A12"))?, cell_range("A18", Some("A20"))?],
                |v| Ok(cell_to_string(v)),
            ),
            SimpleFiller::new(vec![cell_range("B18", Some("E20"))?], |v| {
                Ok(format_float(cell_to_f64(v)?, &FloatFormat::default().with_strip(false)))
            }),
            SimpleFiller::new(vec![cell_range("H25", Some("H26"))?], |v| {
                let value = cell_to_f64(v)?;
                Ok(if value >= 999.0 {
                    "999".to_string()
                } else {
                    format_float(value, &FloatFormat::default().with_strip(false))
                })
            }),
            SimpleFiller::new(vec![cell_range("I25", Some("I26"))?], |v| {
                let value = cell_to_f64(v)?;
                Ok(if value >= 999.0 {
                    "999".to_string()
                } else {
                    format_float(value, &FloatFormat::precision(0))
                })
            }),
            SimpleFiller::new(vec![cell_range("C39", Some("C41"))?], |v| {
                Ok(format!("${}", with_comma(cell_to_f64(v)? / 1e6)))
            }),
        ])
    }

    fn fill(&self, g: &mut Generator) -> Result<()> {
        self.fill_headline_metrics(g)
    }
}
