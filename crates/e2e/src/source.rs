//! Tabular test case source
//!
//! Test cases come from UTF-8 CSV files: the header row names the fields and
//! every following row becomes one [`TestCaseRecord`], in file order.

use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::error::{E2eError, E2eResult};

/// Marker meaning "no expectation for this aspect; verify it is absent".
pub const NOT_APPLICABLE: &str = "N/A";

/// Column names tried, in order, when a suite does not name its id column.
const ID_COLUMNS: &[&str] = &["test_case_id", "tc_id", "test_id", "TC_ID", "id"];

/// One row of test data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseRecord {
    /// 1-based data row number (the header is row 0)
    pub row: usize,
    fields: Vec<(String, String)>,
}

impl TestCaseRecord {
    pub fn new(row: usize, fields: Vec<(String, String)>) -> Self {
        Self { row, fields }
    }

    /// Build a record from literal pairs
    pub fn from_pairs(row: usize, pairs: &[(&str, &str)]) -> Self {
        Self::new(
            row,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    /// A field the scenario cannot run without
    pub fn require(&self, field: &str) -> E2eResult<&str> {
        self.get(field)
            .ok_or_else(|| E2eError::MissingField(field.to_string()))
    }

    /// An expectation field; a missing column reads as the "N/A" sentinel.
    pub fn expected(&self, field: &str) -> &str {
        self.get(field).unwrap_or(NOT_APPLICABLE)
    }

    /// Parse a required field as a non-negative count
    pub fn count(&self, field: &str) -> E2eResult<usize> {
        let raw = self.require(field)?;
        raw.trim()
            .parse()
            .map_err(|e| E2eError::invalid_field(field, raw, e))
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Identifier used in progress lines and the summary
    pub fn id(&self, id_column: Option<&str>) -> String {
        let explicit = id_column.and_then(|column| self.get(column));
        explicit
            .or_else(|| ID_COLUMNS.iter().find_map(|column| self.get(column)))
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| format!("row-{}", self.row))
    }
}

/// Load every record from a CSV file
pub fn load(path: &Path) -> E2eResult<Vec<TestCaseRecord>> {
    let file = std::fs::File::open(path).map_err(|e| E2eError::data_source(path, e))?;
    read_records(path, file)
}

/// Load records from in-memory CSV text; `name` is used in error messages.
pub fn load_str(name: &str, text: &str) -> E2eResult<Vec<TestCaseRecord>> {
    read_records(Path::new(name), text.as_bytes())
}

fn read_records<R: Read>(path: &Path, input: R) -> E2eResult<Vec<TestCaseRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(input);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| E2eError::data_source(path, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(E2eError::data_source(path, "missing header row"));
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = row.map_err(|e| E2eError::data_source(path, e))?;
        let fields = headers
            .iter()
            .cloned()
            .zip(row.iter().map(str::to_string))
            .collect();
        records.push(TestCaseRecord::new(index + 1, fields));
    }

    Ok(records)
}
