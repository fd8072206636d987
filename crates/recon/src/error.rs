use std::fmt;

#[derive(Debug)]
pub enum ReconError {
    /// Required column absent from the directive file header.
    MissingColumn {
        input: String,
        column: String,
        found: Vec<String>,
    },
    /// Directive file parsed but yielded zero usable rows.
    NoDirectives { input: String },
    /// Malformed CSV (bad quoting, invalid UTF-8, etc.).
    Csv { input: String, message: String },
    /// Output location cannot be used (empty path, no file name, ...).
    InvalidOutput(String),
    /// Report or export could not be written.
    Write { path: String, message: String },
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColumn { input, column, found } => {
                if found.is_empty() {
                    write!(f, "{input}: missing column '{column}' (no header row found)")
                } else {
                    write!(
                        f,
                        "{input}: missing column '{column}' (found: {})",
                        found.join(", ")
                    )
                }
            }
            Self::NoDirectives { input } => {
                write!(f, "{input}: no directives (every row is blank or missing a serial/name)")
            }
            Self::Csv { input, message } => write!(f, "{input}: CSV error: {message}"),
            Self::InvalidOutput(msg) => write!(f, "invalid output location: {msg}"),
            Self::Write { path, message } => write!(f, "cannot write {path}: {message}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
