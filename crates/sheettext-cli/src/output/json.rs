use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use sheettext_core::error::ExtractError;
use sheettext_core::model::ExtractionOutput;

/// Single-line JSON with `", "` between items and `": "` after keys.
#[derive(Debug, Default)]
pub struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

pub fn to_string(output: &ExtractionOutput, pretty: bool) -> Result<String, ExtractError> {
    let mut buf = Vec::new();
    if pretty {
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::new());
        output.serialize(&mut ser)?;
    } else {
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
        output.serialize(&mut ser)?;
    }
    // serde_json only ever writes UTF-8
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

pub fn print(output: &ExtractionOutput, pretty: bool) -> Result<(), ExtractError> {
    let json = to_string(output, pretty)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    stdout.flush()?;
    Ok(())
}
