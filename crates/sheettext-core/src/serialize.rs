use crate::cell::{format_cell_value, CellValue};
use crate::error::ExtractError;

/// Comment attached to a cell, with the A1 reference it was found at.
#[derive(Debug, Clone, PartialEq)]
pub struct CellComment {
    pub coordinate: String,
    pub text: String,
}

/// Row-by-row CSV writer over an in-memory buffer.
///
/// Records may have any number of fields, including none; an empty record
/// becomes an empty line rather than the `""` the csv writer would emit.
pub struct CsvText {
    builder: csv::WriterBuilder,
    buf: Vec<u8>,
}

impl CsvText {
    pub fn new() -> Self {
        let mut builder = csv::WriterBuilder::new();
        builder
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .buffer_capacity(1024);
        CsvText {
            builder,
            buf: Vec::new(),
        }
    }

    pub fn write_row<I, T>(&mut self, fields: I) -> Result<(), ExtractError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            self.buf.push(b'\n');
            return Ok(());
        }
        let mut writer = self.builder.from_writer(&mut self.buf);
        writer.write_record(fields)?;
        writer.flush()?;
        Ok(())
    }

    pub fn finish(self) -> Result<String, ExtractError> {
        // Every field was a Rust string, so this never replaces anything
        Ok(String::from_utf8_lossy(&self.buf).into_owned())
    }
}

impl Default for CsvText {
    fn default() -> Self {
        Self::new()
    }
}

/// Serialize rows into a CSV text block, then the comment block.
///
/// Rows are written as they are pulled from the iterator. Comments follow
/// after a blank line as `[Comment at B2]: text`, in the order given;
/// comments with empty text are left out.
pub fn serialize_sheet<I, R>(rows: I, comments: &[CellComment]) -> Result<String, ExtractError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = CellValue>,
{
    let mut out = CsvText::new();
    for row in rows {
        out.write_row(row.into_iter().map(|v| format_cell_value(&v)))?;
    }

    let mut notes = comments.iter().filter(|c| !c.text.is_empty()).peekable();
    if notes.peek().is_some() {
        out.write_row(std::iter::empty::<&str>())?;
        for comment in notes {
            out.write_row([format!("[Comment at {}]: {}", comment.coordinate, comment.text)])?;
        }
    }

    out.finish()
}

/// Serialize rows of plain values (no comments).
pub fn serialize_values<I, R>(rows: I) -> Result<String, ExtractError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = CellValue>,
{
    serialize_sheet(rows, &[])
}
