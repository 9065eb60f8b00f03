use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Reader, SheetType, Xlsx};
use tracing::{debug, warn};

use crate::cell::cell_reference;
use crate::error::ExtractError;
use crate::extraction::ooxml::{SheetAnnotations, SheetComment, WorkbookPackage};
use crate::extraction::sheet_rows;
use crate::model::SheetResult;
use crate::serialize::{serialize_sheet, CellComment};
use crate::ExtractOptions;

/// Extract every worksheet of an XLSX file.
///
/// Opening the workbook is all-or-nothing; after that each worksheet gets
/// its own `text` or `error` entry.
pub fn extract_xlsx(path: &Path, options: &ExtractOptions) -> Result<Vec<SheetResult>, ExtractError> {
    let mut workbook: Xlsx<_> = calamine::open_workbook(path)
        .map_err(|e| ExtractError::Workbook(format!("failed to open xlsx: {e}")))?;
    let mut package = WorkbookPackage::open(path)?;

    let names: Vec<String> = workbook
        .sheets_metadata()
        .iter()
        .filter(|s| s.typ == SheetType::WorkSheet)
        .map(|s| s.name.clone())
        .collect();
    debug!(sheets = names.len(), "opened xlsx workbook");

    let mut sheets = Vec::with_capacity(names.len());
    for name in names {
        let result = render_sheet(&mut workbook, &mut package, &name, options);
        if let Err(ref e) = result {
            warn!(sheet = %name, error = %e, "failed to extract sheet");
        }
        sheets.push(SheetResult::from_result(name, result));
    }

    Ok(sheets)
}

fn render_sheet<RS, R>(
    workbook: &mut Xlsx<RS>,
    package: &mut WorkbookPackage<R>,
    name: &str,
    options: &ExtractOptions,
) -> Result<String, ExtractError>
where
    RS: Read + Seek,
    R: Read + Seek,
{
    let range = workbook
        .worksheet_range(name)
        .map_err(|e| ExtractError::Sheet(format!("failed to read sheet '{name}': {e}")))?;

    let annotations = if options.include_comments || options.include_placeholders {
        package.sheet_annotations(name)?
    } else {
        SheetAnnotations::default()
    };

    let comments: Vec<CellComment> = if options.include_comments {
        annotations.comments.iter().map(cell_comment).collect()
    } else {
        Vec::new()
    };
    let mut text = serialize_sheet(sheet_rows(&range), &comments)?;

    if options.include_placeholders {
        append_placeholders(&mut text, annotations.image_count, annotations.chart_count);
    }

    debug!(
        sheet = name,
        rows = range.end().map_or(0, |end| end.0 as u64 + 1),
        images = annotations.image_count,
        charts = annotations.chart_count,
        "extracted sheet"
    );
    Ok(text)
}

fn cell_comment(comment: &SheetComment) -> CellComment {
    CellComment {
        coordinate: cell_reference(comment.row, comment.col),
        text: comment.text.clone(),
    }
}

/// `text + "\n" + placeholder lines + "\n"`, only when something is attached.
fn append_placeholders(text: &mut String, images: usize, charts: usize) {
    let mut lines = Vec::new();
    if images > 0 {
        lines.push(format!("[{images} image(s) attached to this sheet]"));
    }
    if charts > 0 {
        lines.push(format!("[{charts} chart(s) attached to this sheet]"));
    }
    if lines.is_empty() {
        return;
    }
    text.push('\n');
    text.push_str(&lines.join("\n"));
    text.push('\n');
}
