use core::str::FromStr;

use serde::{Deserialize, Serialize};

use cinema_core::{DomainError, Entity, ValueObject};

/// Highest row letter a hall can have.
pub const MAX_ROWS: u8 = 26;

/// Seat code: row letter followed by a 1-based column number (e.g. `C7`).
///
/// Ordering is row-major, so sorted codes follow the hall layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeatCode {
    row: u8,
    column: u16,
}

impl SeatCode {
    /// Build a code from a zero-based row index and a 1-based column.
    pub fn new(row: u8, column: u16) -> Result<Self, DomainError> {
        if row >= MAX_ROWS {
            return Err(DomainError::invalid_id(format!(
                "row index {row} is past row Z"
            )));
        }
        if column == 0 {
            return Err(DomainError::invalid_id("seat columns start at 1"));
        }
        Ok(Self { row, column })
    }

    /// Zero-based row index (`A` = 0).
    pub fn row_index(&self) -> u8 {
        self.row
    }

    pub fn row_letter(&self) -> char {
        char::from(b'A' + self.row)
    }

    pub fn column(&self) -> u16 {
        self.column
    }
}

impl ValueObject for SeatCode {}

impl core::fmt::Display for SeatCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for SeatCode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let mut chars = raw.chars();
        let letter = chars
            .next()
            .filter(char::is_ascii_alphabetic)
            .ok_or_else(|| DomainError::invalid_id(format!("seat code {raw:?}: expected a row letter")))?;
        let digits = chars.as_str();
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DomainError::invalid_id(format!(
                "seat code {raw:?}: expected a column number after the row letter"
            )));
        }
        let column = digits
            .parse::<u16>()
            .map_err(|e| DomainError::invalid_id(format!("seat code {raw:?}: {e}")))?;

        let row = letter.to_ascii_uppercase() as u8 - b'A';
        Self::new(row, column)
            .map_err(|e| DomainError::invalid_id(format!("seat code {raw:?}: {e}")))
    }
}

impl TryFrom<String> for SeatCode {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SeatCode> for String {
    fn from(value: SeatCode) -> Self {
        value.to_string()
    }
}

/// Seat category; drives the price multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatCategory {
    Ordinary,
    Premium,
    /// Paired seat sold as one unit at double price.
    Couple,
    Accessible,
}

/// Seat status.
///
/// Allowed moves: `Available -> Selected -> Booked` and `Selected -> Available`.
/// `Booked` and `Unavailable` are final for the lifetime of a showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Available,
    Selected,
    Booked,
    Unavailable,
}

/// One seat of a showing. Only the registry can change its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    code: SeatCode,
    category: SeatCategory,
    status: SeatStatus,
    price: u64,
}

impl Seat {
    pub(crate) fn new(code: SeatCode, category: SeatCategory, status: SeatStatus, price: u64) -> Self {
        Self {
            code,
            category,
            status,
            price,
        }
    }

    pub fn code(&self) -> SeatCode {
        self.code
    }

    pub fn category(&self) -> SeatCategory {
        self.category
    }

    pub fn status(&self) -> SeatStatus {
        self.status
    }

    /// Price in smallest currency unit, category multiplier included.
    pub fn price(&self) -> u64 {
        self.price
    }

    pub fn is_available(&self) -> bool {
        self.status == SeatStatus::Available
    }

    pub(crate) fn set_status(&mut self, status: SeatStatus) {
        self.status = status;
    }

    pub fn snapshot(&self) -> SeatSnapshot {
        SeatSnapshot {
            code: self.code,
            category: self.category,
            status: self.status,
            price: self.price,
        }
    }
}

impl Entity for Seat {
    type Id = SeatCode;

    fn id(&self) -> &Self::Id {
        &self.code
    }
}

/// Read-only copy of a seat for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatSnapshot {
    pub code: SeatCode,
    pub category: SeatCategory,
    pub status: SeatStatus,
    pub price: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_row_letter_and_column() {
        let code: SeatCode = "C12".parse().unwrap();
        assert_eq!(code.row_index(), 2);
        assert_eq!(code.row_letter(), 'C');
        assert_eq!(code.column(), 12);
        assert_eq!(code.to_string(), "C12");
    }

    #[test]
    fn lowercase_and_whitespace_are_normalised() {
        let code: SeatCode = " b3 ".parse().unwrap();
        assert_eq!(code.to_string(), "B3");
    }

    #[test]
    fn malformed_codes_are_invalid_ids() {
        for raw in ["", "1A", "A", "A0", "AA1", "A-1", "A1x", "A99999"] {
            match raw.parse::<SeatCode>() {
                Err(DomainError::InvalidId(_)) => {}
                other => panic!("Expected InvalidId for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn codes_sort_row_major() {
        let mut codes: Vec<SeatCode> = ["B1", "A10", "A2", "C1"]
            .iter()
            .map(|c| c.parse().unwrap())
            .collect();
        codes.sort();
        let rendered: Vec<String> = codes.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["A2", "A10", "B1", "C1"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let code: SeatCode = "E5".parse().unwrap();
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"E5\"");
        let back: SeatCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<SeatCode>("\"5E\"").is_err());
    }
}
