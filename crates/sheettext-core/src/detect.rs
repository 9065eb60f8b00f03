use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::ExtractError;

/// Extraction path chosen for an input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => write!(f, "csv"),
            FileFormat::Xlsx => write!(f, "xlsx"),
            FileFormat::Xls => write!(f, "xls"),
        }
    }
}

/// Local file header, empty archive and spanned archive markers.
const ZIP_SIGNATURES: [[u8; 4]; 3] = [*b"PK\x03\x04", *b"PK\x05\x06", *b"PK\x07\x08"];

/// Pick the extraction path for a file.
///
/// A `.csv` extension wins; otherwise anything that starts like a ZIP archive
/// is treated as XLSX and everything else as legacy XLS. Any ZIP passes, so a
/// non-spreadsheet archive only fails later when the workbook is opened.
pub fn detect_format(path: &Path) -> Result<FileFormat, ExtractError> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    if is_csv {
        return Ok(FileFormat::Csv);
    }

    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    let mut filled = 0;
    while filled < magic.len() {
        let n = file.read(&mut magic[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    if is_zip_signature(&magic[..filled]) {
        Ok(FileFormat::Xlsx)
    } else {
        Ok(FileFormat::Xls)
    }
}

pub fn is_zip_signature(bytes: &[u8]) -> bool {
    ZIP_SIGNATURES.iter().any(|sig| bytes.starts_with(sig))
}
