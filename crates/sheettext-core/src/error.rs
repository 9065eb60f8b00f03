use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("No workbook path provided.")]
    MissingPath,

    #[error("File does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{0}")]
    Workbook(String),

    #[error("{0}")]
    Sheet(String),

    #[error("Neither {tried} is available for legacy XLS files.")]
    NoLegacyBackend { tried: String },

    #[error("workbook part '{0}' is referenced but missing from the package")]
    MissingPart(String),

    #[error("malformed workbook part '{part}': {reason}")]
    MalformedPart { part: String, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ExtractError {
    /// Failures raised before any file is opened: no path, or no such file.
    pub fn is_preflight(&self) -> bool {
        matches!(self, ExtractError::MissingPath | ExtractError::NotFound(_))
    }
}
