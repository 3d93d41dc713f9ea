//! Spreadsheet cell addressing.
//!
//! Converts between "A1"-style cell names and 0-based (row, column)
//! indices, and expands rectangular ranges into row-major cell lists.

use thiserror::Error;

/// Errors raised while parsing cell names.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("cell name '{0}' has no column letters")]
    NoColumn(String),

    #[error("cell name '{0}' has no row number")]
    NoRow(String),

    #[error("cell name '{0}' has a malformed row number")]
    BadRow(String),
}

pub type Result<T> = std::result::Result<T, AddressError>;

/// Convert a 0-based column index to Excel column letters
/// (0 -> "A", 25 -> "Z", 26 -> "AA").
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col + 1;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

/// Convert column letters to a 0-based column index
/// ("A" -> 0, "Z" -> 25, "AA" -> 26). Case-insensitive.
fn letters_to_column(letters: &str) -> u32 {
    let mut col = 0u32;
    for ch in letters.chars() {
        col = col * 26 + (ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    col - 1
}

/// Format a cell name from 0-based row and column indices
/// (`cell_name(0, 0)` -> "A1").
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", column_to_letters(col), row + 1)
}

/// Parse a cell name into 0-based (row, column) indices.
///
/// The name must be an alphabetic column prefix followed by a 1-based
/// row number; anything else fails with an [`AddressError`].
pub fn parse_cell_name(name: &str) -> Result<(u32, u32)> {
    let split = name
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(name.len());

    let (letters, digits) = name.split_at(split);
    if letters.is_empty() {
        return Err(AddressError::NoColumn(name.to_string()));
    }
    if digits.is_empty() {
        return Err(AddressError::NoRow(name.to_string()));
    }

    let row: u32 = digits
        .parse()
        .map_err(|_| AddressError::BadRow(name.to_string()))?;
    if row == 0 {
        return Err(AddressError::BadRow(name.to_string()));
    }

    Ok((row - 1, letters_to_column(letters)))
}

/// Expand a cell range into the full rectangular block between the two
/// corners inclusive, enumerated row-major.
///
/// With `end` omitted the result is just the (normalized) start cell.
/// Corners are normalized to their min/max components, so either
/// diagonal order yields the same set of cells.
pub fn cell_range(start: &str, end: Option<&str>) -> Result<Vec<String>> {
    let start = parse_cell_name(start)?;
    let Some(end) = end else {
        return Ok(vec![cell_name(start.0, start.1)]);
    };
    let end = parse_cell_name(end)?;

    let (row0, row1) = (start.0.min(end.0), start.0.max(end.0));
    let (col0, col1) = (start.1.min(end.1), start.1.max(end.1));

    let mut cells = Vec::with_capacity(((row1 - row0 + 1) * (col1 - col0 + 1)) as usize);
    for row in row0..=row1 {
        for col in col0..=col1 {
            cells.push(cell_name(row, col));
        }
    }
    Ok(cells)
}

/// Inclusive character span ('B', 'E' -> ['B', 'C', 'D', 'E']), used by
/// dashboards that sweep a run of columns.
pub fn alpha_range(start: char, stop: char) -> Vec<char> {
    (start..=stop).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(column_to_letters(0), "A");
        assert_eq!(column_to_letters(25), "Z");
        assert_eq!(column_to_letters(26), "AA");
        assert_eq!(column_to_letters(27), "AB");
        assert_eq!(column_to_letters(701), "ZZ");
        assert_eq!(column_to_letters(702), "AAA");
    }

    #[test]
    fn test_parse_cell_name() {
        assert_eq!(parse_cell_name("A1"), Ok((0, 0)));
        assert_eq!(parse_cell_name("B12"), Ok((11, 1)));
        assert_eq!(parse_cell_name("aa3"), Ok((2, 26)));
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        assert_eq!(
            parse_cell_name("12"),
            Err(AddressError::NoColumn("12".to_string()))
        );
        assert_eq!(
            parse_cell_name("B"),
            Err(AddressError::NoRow("B".to_string()))
        );
        assert_eq!(
            parse_cell_name("B0"),
            Err(AddressError::BadRow("B0".to_string()))
        );
        assert_eq!(
            parse_cell_name("B1x"),
            Err(AddressError::BadRow("B1x".to_string()))
        );
    }

    #[test]
    fn test_single_cell_range() {
        assert_eq!(cell_range("B2", Some("B2")).unwrap(), vec!["B2"]);
        assert_eq!(cell_range("B2", None).unwrap(), vec!["B2"]);
    }

    #[test]
    fn test_range_corner_order_is_irrelevant() {
        let forward = cell_range("A1", Some("B2")).unwrap();
        let backward = cell_range("B2", Some("A1")).unwrap();
        assert_eq!(forward, vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(forward, backward);

        // Anti-diagonal corners cover the same rectangle.
        let anti = cell_range("B1", Some("A2")).unwrap();
        assert_eq!(anti, forward);
    }

    #[test]
    fn test_alpha_range() {
        assert_eq!(alpha_range('B', 'E'), vec!['B', 'C', 'D', 'E']);
        assert_eq!(alpha_range('M', 'M'), vec!['M']);
    }

    proptest! {
        #[test]
        fn roundtrip(row in 0u32..100_000, col in 0u32..20_000) {
            prop_assert_eq!(parse_cell_name(&cell_name(row, col)), Ok((row, col)));
        }
    }
}
