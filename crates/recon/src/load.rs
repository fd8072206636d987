//! Directive loader: CSV → validated [`DirectiveSet`].
//!
//! Header names match case-insensitively, ignoring spaces, underscores and
//! hyphens. Two name-column layouts are accepted:
//!
//! | Layout        | Serial column            | Name column   |
//! |---------------|--------------------------|---------------|
//! | `DesiredName` | `SerialNumber` / `Serial` | `DesiredName` |
//! | `DisplayName` | `SerialNumber` / `Serial` | `DisplayName` |
//!
//! The `DisplayName` layout is what `export` writes, so an edited export can
//! be fed straight back. When both name columns exist, `DesiredName` wins.

use std::path::Path;

use crate::error::ReconError;
use crate::model::{DirectiveSet, Insert};

const SERIAL_HEADERS: [&str; 2] = ["serialnumber", "serial"];

/// Which column supplied the desired names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameColumn {
    DesiredName,
    DisplayName,
}

impl NameColumn {
    fn header_key(&self) -> &'static str {
        match self {
            Self::DesiredName => "desiredname",
            Self::DisplayName => "displayname",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DesiredName => "DesiredName",
            Self::DisplayName => "DisplayName",
        }
    }
}

/// Row accounting for one load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    pub rows_read: usize,
    /// Rows with a blank serial or blank desired name.
    pub dropped_blank: usize,
    /// Rows whose serial repeated an earlier row (last write wins).
    pub replaced: usize,
}

#[derive(Debug, Clone)]
pub struct LoadedDirectives {
    pub directives: DirectiveSet,
    pub name_column: NameColumn,
    pub stats: LoadStats,
}

/// Normalize a header cell for matching.
fn header_key(h: &str) -> String {
    h.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Load directives from CSV text. `input` labels errors (usually the file path).
pub fn load_directives(input: &str, csv_data: &str) -> Result<LoadedDirectives, ReconError> {
    let data = csv_data.strip_prefix('\u{feff}').unwrap_or(csv_data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ReconError::Csv {
            input: input.into(),
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let found: Vec<String> = headers
        .iter()
        .filter(|h| !h.trim().is_empty())
        .cloned()
        .collect();
    let keys: Vec<String> = headers.iter().map(|h| header_key(h)).collect();

    let serial_idx = SERIAL_HEADERS
        .iter()
        .find_map(|want| keys.iter().position(|k| k == want))
        .ok_or_else(|| ReconError::MissingColumn {
            input: input.into(),
            column: "SerialNumber".into(),
            found: found.clone(),
        })?;

    let (name_column, name_idx) = [NameColumn::DesiredName, NameColumn::DisplayName]
        .into_iter()
        .find_map(|col| {
            keys.iter()
                .position(|k| k == col.header_key())
                .map(|idx| (col, idx))
        })
        .ok_or_else(|| ReconError::MissingColumn {
            input: input.into(),
            column: "DesiredName (or DisplayName)".into(),
            found,
        })?;

    let mut directives = DirectiveSet::new();
    let mut stats = LoadStats::default();

    for record in reader.records() {
        let record = record.map_err(|e| ReconError::Csv {
            input: input.into(),
            message: e.to_string(),
        })?;

        // Fully empty lines between rows are not data
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        stats.rows_read += 1;

        let serial = record.get(serial_idx).unwrap_or("");
        let name = record.get(name_idx).unwrap_or("");
        match directives.insert(serial, name) {
            Insert::Added => {}
            Insert::Replaced => stats.replaced += 1,
            Insert::Skipped => stats.dropped_blank += 1,
        }
    }

    if directives.is_empty() {
        return Err(ReconError::NoDirectives {
            input: input.into(),
        });
    }

    Ok(LoadedDirectives {
        directives,
        name_column,
        stats,
    })
}

/// Read and load a directive file from disk.
pub fn load_directives_file(path: &Path) -> Result<LoadedDirectives, ReconError> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| ReconError::Io(format!("cannot read {}: {e}", path.display())))?;
    load_directives(&path.display().to_string(), &data)
}
