use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty path, zero cap, etc.).
    ConfigValidation(String),
    /// An input table is missing or unreadable. Fatal for the whole run.
    InputUnavailable { path: PathBuf, detail: String },
    /// An input table could not be read as delimited text.
    InputMalformed { table: &'static str, detail: String },
    /// A required column is absent from an input header row.
    MissingColumn { table: &'static str, column: String },
    /// The summary directory cannot be enumerated.
    SummaryScan { path: PathBuf, detail: String },
    /// Supplemental page rendering failed.
    Render(String),
    /// Page-level PDF merge failed.
    Merge(String),
    /// The miss report could not be written.
    Report { path: PathBuf, detail: String },
    /// Other IO error (output directory, temp file).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::InputUnavailable { path, detail } => {
                write!(f, "input unavailable: {}: {detail}", path.display())
            }
            Self::InputMalformed { table, detail } => {
                write!(f, "{table} table: cannot parse as delimited text: {detail}")
            }
            Self::MissingColumn { table, column } => {
                write!(f, "{table} table: missing column '{column}'")
            }
            Self::SummaryScan { path, detail } => {
                write!(f, "cannot scan summary directory {}: {detail}", path.display())
            }
            Self::Render(msg) => write!(f, "render error: {msg}"),
            Self::Merge(msg) => write!(f, "merge error: {msg}"),
            Self::Report { path, detail } => {
                write!(f, "cannot write miss report {}: {detail}", path.display())
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
