pub mod cell;
pub mod detect;
pub mod error;
pub mod extraction;
pub mod model;
pub mod serialize;

use std::path::Path;

use tracing::debug;

use detect::FileFormat;
use error::ExtractError;
use extraction::LegacyBackend;
use model::{ExtractionOutput, SheetResult};

/// Knobs for what goes into XLSX sheet text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Append the `[Comment at ...]` block after the rows.
    pub include_comments: bool,
    /// Append image and chart placeholder lines.
    pub include_placeholders: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            include_comments: true,
            include_placeholders: true,
        }
    }
}

/// Format detection plus dispatch to the matching extractor.
pub struct Extractor {
    options: ExtractOptions,
    legacy_backends: Vec<Box<dyn LegacyBackend>>,
}

impl Default for Extractor {
    fn default() -> Self {
        Extractor::new(ExtractOptions::default())
    }
}

impl Extractor {
    /// Extractor with the built-in legacy XLS backends.
    pub fn new(options: ExtractOptions) -> Self {
        Extractor {
            options,
            legacy_backends: extraction::xls::default_backends(),
        }
    }

    /// Replace the legacy XLS backends, highest priority first.
    pub fn with_legacy_backends(mut self, backends: Vec<Box<dyn LegacyBackend>>) -> Self {
        self.legacy_backends = backends;
        self
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract all sheets from a file.
    ///
    /// `Err` means the whole file failed; per-sheet failures are reported
    /// inside the returned list.
    pub fn extract(&self, path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
        if !path.exists() {
            return Err(ExtractError::NotFound(path.to_path_buf()));
        }

        let format = detect::detect_format(path)?;
        debug!(path = %path.display(), %format, "detected format");

        match format {
            FileFormat::Csv => extraction::csv_file::extract_csv(path),
            FileFormat::Xlsx => extraction::xlsx::extract_xlsx(path, &self.options),
            FileFormat::Xls => extraction::xls::extract_xls(path, &self.legacy_backends),
        }
    }

    /// Run one invocation: missing path, extraction and error folding.
    pub fn run(&self, path: Option<&Path>) -> ExtractionOutput {
        let result = match path {
            Some(path) => self.extract(path),
            None => Err(ExtractError::MissingPath),
        };
        ExtractionOutput::from_result(result)
    }
}

/// Main API entry point: extract a file with default options and backends.
pub fn extract_file(path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
    Extractor::default().extract(path)
}
