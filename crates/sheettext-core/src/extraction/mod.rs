pub mod csv_file;
pub mod ooxml;
pub mod xls;
pub mod xlsx;

use std::path::Path;

use calamine::{Data, Range};

use crate::cell::CellValue;
use crate::error::ExtractError;
use crate::model::SheetResult;

/// Trait for legacy XLS reading backends.
///
/// Backends are probed in priority order and the first one reporting
/// `is_available()` handles the file.
pub trait LegacyBackend: Send + Sync {
    /// Name of this backend (for diagnostics and the "none available" error).
    fn backend_name(&self) -> &str;

    /// Whether this backend can run in the current build.
    fn is_available(&self) -> bool;

    /// Extract every sheet. Per-sheet failures become error entries; only
    /// whole-file failures are returned as `Err`.
    fn extract_sheets(&self, path: &Path) -> Result<Vec<SheetResult>, ExtractError>;
}

/// Rows from A1 to the last used cell of a calamine range, produced one at a
/// time. Cells before the range start come back empty.
pub(crate) fn sheet_rows(
    range: &Range<Data>,
) -> impl Iterator<Item = impl Iterator<Item = CellValue> + '_> + '_ {
    let bounds = range.start().zip(range.end());
    let (height, width) =
        bounds.map_or((0, 0), |(_, end)| (end.0 as u64 + 1, end.1 as u64 + 1));

    (0..height).map(move |r| {
        (0..width).map(move |c| {
            let (r, c) = (r as u32, c as u32);
            match bounds {
                Some((start, _)) if r >= start.0 && c >= start.1 => {
                    range.get_value((r, c)).map(CellValue::from).unwrap_or_default()
                }
                _ => CellValue::Empty,
            }
        })
    })
}
