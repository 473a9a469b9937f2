use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No snapshot files found in {}", .dir.display())]
    NoCurrentSnapshot { dir: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not read snapshot {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Archive fetch failed: {0}")]
    RemoteFetch(String),

    #[error("Report rendering failed: {0}")]
    Render(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for the binary. `NoCurrentSnapshot` is a soft halt.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReportError::NoCurrentSnapshot { .. } => 0,
            ReportError::Config(_) => 2,
            ReportError::Io { .. } | ReportError::Csv { .. } | ReportError::RemoteFetch(_) => 3,
            ReportError::Render(_) | ReportError::Json(_) => 4,
        }
    }
}

impl From<std::fmt::Error> for ReportError {
    fn from(e: std::fmt::Error) -> Self {
        ReportError::Render(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
