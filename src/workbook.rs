//! Read-only workbook access.
//!
//! One designated worksheet (matched by name, falling back to the first
//! sheet) provides every cell value for a generation run. Only cell
//! lookup and sheet metadata are exposed; anything deeper than that is
//! out of scope.

use crate::addr;
use calamine::{Data, Range, Reader, Xlsx, open_workbook};
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WorkbookError {
    #[error("could not open workbook: {0}")]
    Open(#[from] calamine::XlsxError),

    #[error("workbook has no worksheets")]
    NoSheets,

    #[error(transparent)]
    Address(#[from] addr::AddressError),
}

pub type Result<T> = std::result::Result<T, WorkbookError>;

/// A single cell's value, reduced to the shapes the formatters consume.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Whole numbers render without a decimal point.
            CellValue::Number(n) if n.fract() == 0.0 => write!(f, "{}", *n as i64),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Float(f) => CellValue::Number(*f),
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
            Data::Error(_) | Data::Empty => CellValue::Empty,
        }
    }
}

/// The worksheet a generation run reads from.
pub struct Workbook {
    sheet: String,
    range: Range<Data>,
}

impl Workbook {
    /// Open a workbook and select the worksheet: the preferred name when
    /// it exists, otherwise the first sheet.
    pub fn open<P: AsRef<Path>>(path: P, preferred_sheet: Option<&str>) -> Result<Self> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let names = workbook.sheet_names().to_owned();

        let sheet = preferred_sheet
            .filter(|name| names.iter().any(|n| n == name))
            .map(str::to_string)
            .or_else(|| names.first().cloned())
            .ok_or(WorkbookError::NoSheets)?;

        let range = workbook.worksheet_range(&sheet)?;
        debug!(sheet = %sheet, rows = range.height(), cols = range.width(), "loaded worksheet");
        Ok(Self { sheet, range })
    }

    /// The selected worksheet's name.
    #[inline]
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// Look up a cell by its name ("B12"). Cells outside the used range
    /// read as empty.
    pub fn cell(&self, name: &str) -> Result<CellValue> {
        let (row, col) = addr::parse_cell_name(name)?;
        Ok(self
            .range
            .get_value((row, col))
            .map(CellValue::from)
            .unwrap_or(CellValue::Empty))
    }

    /// Number of rows in the used range.
    #[inline]
    pub fn rows(&self) -> usize {
        self.range.height()
    }

    /// Number of columns in the used range.
    #[inline]
    pub fn cols(&self) -> usize {
        self.range.width()
    }
}
