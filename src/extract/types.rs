use std::error::Error;
use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::normalize::coerce_count;

/// Grid parameters for a Minesweeper board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of rows in the grid
    pub rows: u32,
    /// Number of columns in the grid
    pub columns: u32,
    /// Number of mines on the grid
    pub mines: u32,
}

impl Dimensions {
    pub fn new(rows: u32, columns: u32, mines: u32) -> Self {
        Self { rows, columns, mines }
    }

    /// Total number of cells on the board
    pub fn cells(&self) -> u64 {
        self.rows as u64 * self.columns as u64
    }

    /// Fraction of cells holding a mine
    pub fn density(&self) -> f64 {
        match self.cells() {
            0 => 0.0,
            cells => self.mines as f64 / cells as f64,
        }
    }

    /// Builds a record from a normalized field map, validating every field.
    ///
    /// `rows` and `columns` must be at least 1 and at least one cell must stay
    /// free of mines.
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self, ParseError> {
        let rows = read_count(fields, "rows")?;
        let columns = read_count(fields, "columns")?;
        let mines = read_count(fields, "mines")?;

        if rows == 0 || columns == 0 {
            return Err(ParseError::OutOfRange(format!(
                "grid must be at least 1x1, got {}x{}",
                rows, columns
            )));
        }

        let dims = Self::new(rows, columns, mines);
        if mines as u64 >= dims.cells() {
            return Err(ParseError::OutOfRange(format!(
                "{} mines do not fit a {}x{} grid",
                mines, rows, columns
            )));
        }
        Ok(dims)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{} with {} mines", self.rows, self.columns, self.mines)
    }
}

fn read_count(fields: &Map<String, Value>, key: &str) -> Result<u32, ParseError> {
    let value = fields.get(key).ok_or_else(|| ParseError::MissingKey {
        key: key.to_string(),
        got: Value::Object(fields.clone()).to_string(),
    })?;
    coerce_count(value).ok_or_else(|| ParseError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Errors raised while turning model output into `Dimensions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// No JSON object could be found in the text
    NoJson(String),
    /// A required key is absent after alias normalization
    MissingKey { key: String, got: String },
    /// A value is not a non-negative integer
    InvalidValue { key: String, value: String },
    /// Values are integers but do not describe a playable board
    OutOfRange(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::NoJson(text) => write!(f, "no JSON object found in output: {:?}", text),
            ParseError::MissingKey { key, got } => {
                write!(f, "expected key `{}` to be present, but got {}", key, got)
            }
            ParseError::InvalidValue { key, value } => {
                write!(f, "value for `{}` is not a non-negative integer: {}", key, value)
            }
            ParseError::OutOfRange(msg) => write!(f, "invalid dimensions: {}", msg),
        }
    }
}

impl Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_from_fields() {
        let dims = Dimensions::from_fields(&fields(json!({"rows": "16", "columns": 30.0, "mines": 99}))).unwrap();
        assert_eq!(dims, Dimensions::new(16, 30, 99));
        assert_eq!(dims.cells(), 480);
    }

    #[test]
    fn test_missing_key() {
        let err = Dimensions::from_fields(&fields(json!({"rows": 16, "columns": 16}))).unwrap_err();
        assert!(matches!(err, ParseError::MissingKey { ref key, .. } if key == "mines"));
    }

    #[test]
    fn test_rejects_empty_grid_and_full_board() {
        let err = Dimensions::from_fields(&fields(json!({"rows": 0, "columns": 9, "mines": 0}))).unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange(_)));

        let err = Dimensions::from_fields(&fields(json!({"rows": 3, "columns": 3, "mines": 9}))).unwrap_err();
        assert!(matches!(err, ParseError::OutOfRange(_)));
    }

    #[test]
    fn test_serializes_canonical_keys_only() {
        let value = serde_json::to_value(Dimensions::new(16, 16, 40)).unwrap();
        assert_eq!(value, json!({"rows": 16, "columns": 16, "mines": 40}));
    }

    #[test]
    fn test_density() {
        let dims = Dimensions::new(9, 9, 10);
        assert!((dims.density() - 10.0 / 81.0).abs() < 1e-9);
        assert_eq!(dims.to_string(), "9x9 with 10 mines");
    }
}
