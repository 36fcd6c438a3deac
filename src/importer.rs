use chrono::NaiveDate;
use tracing::{info, warn};

use crate::error::{AttendanceError, Result};
use crate::models::ImportRecord;
use crate::parser::read_rows;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y"];

/// How the importer located the log columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// The first row names the columns.
    Headers,
    /// No usable header; columns are subject, type, status, date.
    Positional,
}

impl ImportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Headers => "headers",
            Self::Positional => "positional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LogColumns {
    subject: usize,
    kind: Option<usize>,
    status: usize,
    date: usize,
}

impl LogColumns {
    const POSITIONAL: Self = Self {
        subject: 0,
        kind: Some(1),
        status: 2,
        date: 3,
    };

    fn from_headers(headers: &[String]) -> Option<Self> {
        let find = |matches: &dyn Fn(&str) -> bool| {
            headers
                .iter()
                .map(|h| h.trim().to_lowercase())
                .position(|h| matches(h.as_str()))
        };

        let subject = find(&|h: &str| {
            (h.contains("subject") || h.contains("course"))
                && !h.contains("code")
                && !h.contains("type")
        })?;
        let kind = find(&|h: &str| h.contains("type") || h.contains("session"));
        let is_date = |h: &str| h.contains("date") || h.contains("day");
        let date = find(&is_date)?;
        let status = find(&|h: &str| h.contains("status"))
            .or_else(|| find(&|h: &str| h.contains("attendance") && !is_date(h)))?;
        if status == date {
            return None;
        }

        Some(Self {
            subject,
            kind,
            status,
            date,
        })
    }
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

/// Reads per-session attendance logs (one row per class held) into records
/// for the reconciler.
pub struct LogImporter<'a> {
    text: &'a str,
    mode: ImportMode,
}

impl<'a> LogImporter<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text: text.strip_prefix('\u{feff}').unwrap_or(text),
            mode: ImportMode::Positional,
        }
    }

    pub fn mode(&self) -> ImportMode {
        self.mode
    }

    pub fn parse(&mut self) -> Result<Vec<ImportRecord>> {
        let rows = read_rows(self.text)?;
        let first = rows.first().ok_or(AttendanceError::EmptyInput)?;

        let (columns, data) = match LogColumns::from_headers(first) {
            Some(columns) => {
                self.mode = ImportMode::Headers;
                (columns, &rows[1..])
            }
            None => {
                self.mode = ImportMode::Positional;
                (LogColumns::POSITIONAL, &rows[..])
            }
        };
        info!(mode = self.mode.as_str(), rows = data.len(), "importing attendance logs");

        let cell = |row: &[String], index: usize| -> String {
            row.get(index).map(|v| v.trim().to_string()).unwrap_or_default()
        };

        let mut records = Vec::with_capacity(data.len());
        for (line, row) in data.iter().enumerate() {
            if row.iter().all(|value| value.trim().is_empty()) {
                continue;
            }

            let raw_date = cell(row, columns.date);
            let Some(date) = parse_date(&raw_date) else {
                warn!(line = line + 1, date = %raw_date, "skipping log with unreadable date");
                continue;
            };

            let session_type = match columns.kind.map(|index| cell(row, index)) {
                Some(kind) if !kind.is_empty() => kind,
                _ => "Lecture".to_string(),
            };

            records.push(ImportRecord {
                subject: cell(row, columns.subject),
                session_type,
                status: cell(row, columns.status),
                date,
            });
        }

        Ok(records)
    }
}
