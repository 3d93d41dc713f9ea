//! Pure value formatters mapping numeric cell values to display strings.
//!
//! Every formatter documents its clamp/rounding contract: clamping is
//! applied before rounding, stripping removes trailing zeros but never a
//! leading sign, and a `+` prefix is emitted for strictly positive values
//! only.

use crate::workbook::CellValue;
use thiserror::Error;

/// Sentinel substituted for a cell whose value could not be formatted.
/// Visible in the rendered deck so a reviewer can spot the bad cell.
pub const INVALID_VALUE: &str = "INVALID VALUE";

#[derive(Error, Debug, PartialEq)]
pub enum FormatError {
    #[error("not a numeric value: {0}")]
    NotNumeric(String),
}

pub type Result<T> = std::result::Result<T, FormatError>;

/// Rendering contract for [`format_float`] and the formatters built on it.
#[derive(Debug, Clone)]
pub struct FloatFormat {
    /// Number of decimal places to round to.
    pub precision: usize,
    /// Remove trailing zeros and a trailing decimal point.
    pub strip: bool,
    /// Clamp the value to this maximum before rounding.
    pub maximum: Option<f64>,
    /// Prefix `+` for strictly positive values (never for zero or negatives).
    pub signed: bool,
}

impl Default for FloatFormat {
    fn default() -> Self {
        Self {
            precision: 1,
            strip: true,
            maximum: None,
            signed: false,
        }
    }
}

impl FloatFormat {
    /// Shorthand for a given precision with the remaining defaults.
    pub fn precision(precision: usize) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    pub fn with_strip(mut self, strip: bool) -> Self {
        self.strip = strip;
        self
    }

    pub fn with_maximum(mut self, maximum: f64) -> Self {
        self.maximum = Some(maximum);
        self
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }
}

/// Format a float per the given contract.
///
/// The value is clamped to `maximum` first, then rounded to `precision`
/// decimals; half-way cases round to even, matching the rendering of the
/// standard formatter.
pub fn format_float(value: f64, fmt: &FloatFormat) -> String {
    let value = match fmt.maximum {
        Some(max) if value > max => max,
        _ => value,
    };

    let mut s = format!("{:.*}", fmt.precision, value);
    if fmt.strip && s.contains('.') {
        s.truncate(s.trim_end_matches('0').trim_end_matches('.').len());
    }

    if fmt.signed && value > 0.0 {
        s.insert(0, '+');
    }
    s
}

/// Format a ratio as a percentage figure (0.256 -> "25.6"); the percent
/// sign itself is appended by the caller.
pub fn format_percent(value: f64, fmt: &FloatFormat) -> String {
    format_float(value * 100.0, fmt)
}

/// Format a money value with a `$` between the sign and the magnitude
/// (`-12.5` -> "-$12.5"). The `signed` flag of the contract controls the
/// `+` prefix for positive amounts.
pub fn format_money(value: f64, fmt: &FloatFormat) -> String {
    let sign = if value < 0.0 {
        "-"
    } else if fmt.signed && value > 0.0 {
        "+"
    } else {
        ""
    };
    let magnitude = FloatFormat {
        signed: false,
        ..fmt.clone()
    };
    format!("{}${}", sign, format_float(value.abs(), &magnitude))
}

/// Render a value as an integer with thousands separators
/// (1234567.0 -> "1,234,567").
pub fn with_comma(value: f64) -> String {
    let s = format_float(value, &FloatFormat::precision(0));
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}")
}

/// A magnitude breakpoint for [`format_scaled`].
///
/// Breakpoints are dashboard-specific constants supplied at the call
/// site, not engine constants: one dashboard switches from millions to
/// billions at 999, another never switches at all.
#[derive(Debug, Clone)]
pub struct ScaleBreak {
    /// Values at or below this stay in the lower unit; strictly above
    /// switches to the upper unit.
    pub break_at: f64,
    /// Divisor applied when switching to the upper unit.
    pub divisor: f64,
    /// Suffix for the lower unit (e.g. "M").
    pub lower: &'static str,
    /// Suffix for the upper unit (e.g. "B").
    pub upper: &'static str,
    /// Decimal places in the lower unit.
    pub lower_precision: usize,
    /// Decimal places in the upper unit, rendered without stripping so
    /// the precision is visible ("1.00B", not "1B").
    pub upper_precision: usize,
}

/// Format a value with a magnitude suffix chosen by comparing against the
/// breakpoint. A value exactly at the breakpoint renders in the lower
/// unit; one unit above switches.
pub fn format_scaled(value: f64, scale: &ScaleBreak) -> String {
    if value <= scale.break_at {
        format!(
            "{}{}",
            format_float(value, &FloatFormat::precision(scale.lower_precision)),
            scale.lower
        )
    } else {
        format!(
            "{}{}",
            format_float(
                value / scale.divisor,
                &FloatFormat::precision(scale.upper_precision).with_strip(false),
            ),
            scale.upper
        )
    }
}

/// Coerce a cell value to a float, failing on text and empty cells so the
/// caller can substitute the [`INVALID_VALUE`] sentinel.
pub fn cell_to_f64(value: &CellValue) -> Result<f64> {
    match value {
        CellValue::Number(n) => Ok(*n),
        other => Err(FormatError::NotNumeric(other.to_string())),
    }
}

/// Render a cell value as display text. Numbers that are whole render
/// without a decimal point.
pub fn cell_to_string(value: &CellValue) -> String {
    value.to_string()
}
