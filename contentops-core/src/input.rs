//! Loading batch records from an inline list or a delimited file.

use crate::error::FatalError;
use crate::model::LocationId;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

/// Parse a comma-separated list of identifiers.
///
/// Tokens are trimmed, empty tokens are dropped, order and duplicates are
/// kept. Any other token that does not parse fails the whole load.
pub fn load_inline<T>(list: &str) -> Result<Vec<T>, FatalError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    list.split(',')
        .map(str::trim)
        .enumerate()
        .filter(|(_, token)| !token.is_empty())
        .map(|(index, token)| {
            token.parse().map_err(|e| FatalError::InvalidSource {
                location: format!("token {} ('{}')", index + 1, token),
                reason: format!("{e}"),
            })
        })
        .collect()
}

/// One data row of a delimited file, keyed by header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: u64,
    pub fields: BTreeMap<String, String>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    /// Parse a required column.
    pub fn parse<T>(&self, column: &str) -> Result<T, FatalError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let value = self
            .get(column)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FatalError::InvalidSource {
                location: format!("line {}", self.line),
                reason: format!("missing value for column '{column}'"),
            })?;
        value.parse().map_err(|e| FatalError::InvalidSource {
            location: format!("line {}", self.line),
            reason: format!("column '{column}' value '{value}': {e}"),
        })
    }
}

/// Read a header-plus-rows file into field-keyed rows.
///
/// Header cells that are empty (a trailing delimiter) are ignored, as are
/// data cells beyond the last named column.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, FatalError> {
    let file = File::open(path).map_err(|source| FatalError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let invalid = |e: csv::Error| FatalError::InvalidSource {
        location: path.display().to_string(),
        reason: e.to_string(),
    };

    let headers: Vec<String> = reader
        .headers()
        .map_err(invalid)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(invalid)?;
        let line = record.position().map_or(0, csv::Position::line);
        if record.iter().all(str::is_empty) {
            continue;
        }
        let fields = headers
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect();
        rows.push(Row { line, fields });
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), "input rows read");
    Ok(rows)
}

/// A relocation request read from the move file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MoveRow {
    pub location_id: LocationId,
    pub new_parent_location_id: LocationId,
}

pub const MOVE_COLUMNS: [&str; 2] = ["locationId", "newParentLocationId"];

pub fn load_move_rows(path: &Path) -> Result<Vec<MoveRow>, FatalError> {
    read_rows(path)?
        .iter()
        .map(|row| {
            Ok(MoveRow {
                location_id: row.parse(MOVE_COLUMNS[0])?,
                new_parent_location_id: row.parse(MOVE_COLUMNS[1])?,
            })
        })
        .collect()
}
