use std::path::Path;

use calamine::{Reader, Xls};
use tracing::{debug, warn};

use crate::error::ExtractError;
use crate::extraction::{sheet_rows, LegacyBackend};
use crate::model::SheetResult;
use crate::serialize::serialize_values;

/// Reads BIFF workbooks with calamine's `Xls` reader, walking every sheet
/// cell by cell from A1 to its last used row and column.
pub struct CalamineXls;

impl CalamineXls {
    pub fn new() -> Self {
        CalamineXls
    }
}

impl Default for CalamineXls {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyBackend for CalamineXls {
    fn backend_name(&self) -> &str {
        "calamine-xls"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "xls")
    }

    fn extract_sheets(&self, path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
        let mut workbook: Xls<_> = calamine::open_workbook(path)
            .map_err(|e| ExtractError::Workbook(format!("failed to open xls: {e}")))?;

        let names = workbook.sheet_names();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let result = workbook
                .worksheet_range(&name)
                .map_err(|e| ExtractError::Sheet(format!("failed to read sheet '{name}': {e}")))
                .and_then(|range| serialize_values(sheet_rows(&range)));
            if let Err(ref e) = result {
                warn!(sheet = %name, error = %e, "failed to extract sheet");
            }
            sheets.push(SheetResult::from_result(name, result));
        }
        Ok(sheets)
    }
}

/// Opens the file with calamine's extension-based reader selection and walks
/// each sheet from A1, like `CalamineXls`.
pub struct CalamineAuto;

impl CalamineAuto {
    pub fn new() -> Self {
        CalamineAuto
    }
}

impl Default for CalamineAuto {
    fn default() -> Self {
        Self::new()
    }
}

impl LegacyBackend for CalamineAuto {
    fn backend_name(&self) -> &str {
        "calamine-auto"
    }

    fn is_available(&self) -> bool {
        cfg!(feature = "xls-auto")
    }

    fn extract_sheets(&self, path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
        let mut workbook = calamine::open_workbook_auto(path)
            .map_err(|e| ExtractError::Workbook(format!("failed to open workbook: {e}")))?;

        let names = workbook.sheet_names();
        let mut sheets = Vec::with_capacity(names.len());
        for name in names {
            let result = workbook
                .worksheet_range(&name)
                .map_err(|e| ExtractError::Sheet(format!("failed to read sheet '{name}': {e}")))
                .and_then(|range| serialize_values(sheet_rows(&range)));
            if let Err(ref e) = result {
                warn!(sheet = %name, error = %e, "failed to extract sheet");
            }
            sheets.push(SheetResult::from_result(name, result));
        }
        Ok(sheets)
    }
}

/// The built-in legacy backends in priority order.
pub fn default_backends() -> Vec<Box<dyn LegacyBackend>> {
    vec![Box::new(CalamineXls::new()), Box::new(CalamineAuto::new())]
}

/// First available backend, in the order given.
pub fn select_backend(backends: &[Box<dyn LegacyBackend>]) -> Option<&dyn LegacyBackend> {
    backends.iter().map(|b| &**b).find(|b| b.is_available())
}

/// Extract a legacy XLS file with the first available backend.
pub fn extract_xls(
    path: &Path,
    backends: &[Box<dyn LegacyBackend>],
) -> Result<Vec<SheetResult>, ExtractError> {
    let backend = select_backend(backends).ok_or_else(|| ExtractError::NoLegacyBackend {
        tried: backends
            .iter()
            .map(|b| b.backend_name().to_string())
            .collect::<Vec<_>>()
            .join(" nor "),
    })?;
    debug!(backend = backend.backend_name(), "extracting legacy xls");
    backend.extract_sheets(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubBackend {
        name: &'static str,
        available: bool,
    }

    impl LegacyBackend for StubBackend {
        fn backend_name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn extract_sheets(&self, _path: &Path) -> Result<Vec<SheetResult>, ExtractError> {
            Ok(vec![SheetResult::text(self.name, "")])
        }
    }

    fn stub(name: &'static str, available: bool) -> Box<dyn LegacyBackend> {
        Box::new(StubBackend { name, available })
    }

    #[test]
    fn test_select_first_available() {
        let backends = vec![stub("first", false), stub("second", true), stub("third", true)];
        assert_eq!(select_backend(&backends).unwrap().backend_name(), "second");
    }

    #[test]
    fn test_none_available_is_fatal() {
        let backends = vec![stub("xlrd-like", false), stub("fallback", false)];
        let err = extract_xls(Path::new("unused.xls"), &backends).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Neither xlrd-like nor fallback is available for legacy XLS files."
        );
    }

    #[test]
    fn test_default_backends_order() {
        let names: Vec<String> = default_backends()
            .iter()
            .map(|b| b.backend_name().to_string())
            .collect();
        assert_eq!(names, vec!["calamine-xls", "calamine-auto"]);
    }

    #[test]
    fn test_auto_backend_keeps_leading_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(1, 1, "x").unwrap();
        sheet.write_number(2, 2, 7).unwrap();
        workbook.save(&path).unwrap();

        let sheets = CalamineAuto::new().extract_sheets(&path).unwrap();
        assert_eq!(sheets, vec![SheetResult::text("Sheet1", ",,\n,x,\n,,7\n")]);
    }

    #[test]
    fn test_not_a_workbook_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.xls");
        std::fs::write(&path, b"this is not a spreadsheet").unwrap();

        let err = CalamineXls::new().extract_sheets(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Workbook(_)));
    }
}
