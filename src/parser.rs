use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::aggregate::aggregate;
use crate::columns::resolve_columns;
use crate::error::{AttendanceError, Result};
use crate::models::AttendanceReport;
use crate::rows::extract_row;

const BOM: char = '\u{feff}';

/// Decode an uploaded blob as UTF-8, dropping a leading byte-order mark.
pub fn decode_upload(bytes: &[u8]) -> Result<&str> {
    let text = std::str::from_utf8(bytes)
        .map_err(|err| AttendanceError::Parse(format!("upload is not valid UTF-8: {err}")))?;
    Ok(text.strip_prefix(BOM).unwrap_or(text))
}

/// Every CSV record as plain strings; rows may differ in length.
pub fn read_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record: StringRecord = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Parse an attendance report export into hours-weighted subject figures
/// and their overall total.
pub fn parse_attendance_csv(bytes: &[u8]) -> Result<AttendanceReport> {
    let text = decode_upload(bytes)?;
    let rows = read_rows(text)?;

    let (headers, data) = rows.split_first().ok_or(AttendanceError::EmptyInput)?;
    let columns = resolve_columns(headers)?;

    let subjects: Vec<_> = data
        .iter()
        .filter_map(|row| {
            let stat = extract_row(row, &columns);
            if stat.is_none() {
                debug!(?row, "skipping row");
            }
            stat
        })
        .collect();

    let global = aggregate(&subjects);
    info!(
        subjects = subjects.len(),
        attended = global.attended,
        conducted = global.conducted,
        "parsed attendance report"
    );

    Ok(AttendanceReport { global, subjects })
}
