use std::fmt;

use calamine::Data;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// A single cell value as read from any of the supported formats.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(chrono::Duration),
    /// Spreadsheet error literal such as `#DIV/0!`.
    Error(String),
}

/// Format a cell value for CSV output.
///
/// Empty cells become `""`, dates and datetimes their ISO-8601 form, and
/// everything else its plain string form.
pub fn format_cell_value(value: &CellValue) -> String {
    value.to_string()
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{i}"),
            CellValue::Float(x) => write_float(f, *x),
            CellValue::Bool(true) => f.write_str("True"),
            CellValue::Bool(false) => f.write_str("False"),
            CellValue::DateTime(dt) => {
                if dt.nanosecond() == 0 {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S"))
                } else {
                    write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6f"))
                }
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            CellValue::Time(t) => {
                if t.nanosecond() == 0 {
                    write!(f, "{}", t.format("%H:%M:%S"))
                } else {
                    write!(f, "{}", t.format("%H:%M:%S%.6f"))
                }
            }
            CellValue::Duration(d) => write_duration(f, d),
            CellValue::Error(e) => f.write_str(e),
        }
    }
}

/// Whole numbers stored as floats (every XLSX number is) print without a
/// trailing `.0`. Other values print in shortest round-trip form, switching
/// to exponent notation (`1e+16`, `1.5e-05`) below 1e-4 or from 1e16 up.
fn write_float(f: &mut fmt::Formatter<'_>, x: f64) -> fmt::Result {
    if x.is_nan() {
        return f.write_str("nan");
    }
    if x.is_infinite() {
        return f.write_str(if x > 0.0 { "inf" } else { "-inf" });
    }
    if x.fract() == 0.0 && x.abs() < 1e16 {
        return write!(f, "{}", x as i64);
    }

    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    if (-4..16).contains(&exp) {
        write!(f, "{x}")
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        write!(f, "{mantissa}e{sign}{:02}", exp.abs())
    }
}

fn write_duration(f: &mut fmt::Formatter<'_>, d: &chrono::Duration) -> fmt::Result {
    // Days absorb the sign; the clock part is always non-negative
    let total_us = d.num_seconds() as i128 * 1_000_000 + (d.subsec_nanos() / 1_000) as i128;
    let days = total_us.div_euclid(86_400_000_000);
    let rest = total_us.rem_euclid(86_400_000_000);
    let (secs, micros) = (rest / 1_000_000, rest % 1_000_000);
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if days != 0 {
        let unit = if days.abs() == 1 { "day" } else { "days" };
        write!(f, "{days} {unit}, ")?;
    }
    write!(f, "{hours}:{minutes:02}:{seconds:02}")?;
    if micros != 0 {
        write!(f, ".{micros:06}")?;
    }
    Ok(())
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(x) => CellValue::Float(*x),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(e) => CellValue::Error(e.to_string()),
            Data::DateTime(dt) => {
                if dt.is_duration() {
                    return dt
                        .as_duration()
                        .map(CellValue::Duration)
                        .unwrap_or(CellValue::Float(dt.as_f64()));
                }
                match dt.as_datetime() {
                    // Serials below one day carry no date part
                    Some(ndt) if dt.as_f64() < 1.0 => CellValue::Time(ndt.time()),
                    Some(ndt) => CellValue::DateTime(ndt),
                    None => CellValue::Float(dt.as_f64()),
                }
            }
            Data::DateTimeIso(s) => parse_iso(s),
            Data::DurationIso(s) => CellValue::Text(s.clone()),
        }
    }
}

fn parse_iso(s: &str) -> CellValue {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        CellValue::DateTime(dt)
    } else if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        CellValue::Date(d)
    } else if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M:%S%.f") {
        CellValue::Time(t)
    } else {
        CellValue::Text(s.to_string())
    }
}

/// A1-style reference for a zero-based (row, column) position.
pub fn cell_reference(row: u32, col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col as u64 + 1;
    while n > 0 {
        let rem = ((n - 1) % 26) as u8;
        letters.push(b'A' + rem);
        n = (n - 1) / 26;
    }
    letters.reverse();
    let mut out = String::from_utf8(letters).unwrap_or_default();
    out.push_str(&(row as u64 + 1).to_string());
    out
}

/// Parse an A1-style reference into a zero-based (row, column) position.
/// `$` anchors are ignored.
pub fn parse_cell_reference(reference: &str) -> Option<(u32, u32)> {
    let cleaned: String = reference.chars().filter(|c| *c != '$').collect();
    let split = cleaned.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = cleaned.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > u32::MAX as u64 {
            return None;
        }
    }
    let row: u64 = digits.parse().ok()?;
    if row == 0 || row > u32::MAX as u64 {
        return None;
    }
    Some(((row - 1) as u32, (col - 1) as u32))
}
