use tracing::info;

use crate::error::{AttendanceError, Result};

const MAPPING_FAILED: &str =
    "Could not map columns. Please use the standard Attendance Report format.";

/// Zero-based positions of the six logical columns of an attendance report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMap {
    pub subject: Option<usize>,
    pub kind: Option<usize>,
    pub present: Option<usize>,
    pub od: Option<usize>,
    pub makeup: Option<usize>,
    pub absent: Option<usize>,
}

impl ColumnMap {
    fn is_complete(&self) -> bool {
        self.subject.is_some() && self.present.is_some()
    }
}

/// Lowercased, trimmed header cells. Empty cells stay as `None` so every
/// named header keeps its real column position.
#[derive(Debug, Clone)]
pub struct HeaderRow {
    cells: Vec<Option<String>>,
}

impl HeaderRow {
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let cells = raw
            .iter()
            .map(|cell| {
                let normalized = cell.as_ref().trim().to_lowercase();
                (!normalized.is_empty()).then_some(normalized)
            })
            .collect();
        Self { cells }
    }

    fn named_count(&self) -> usize {
        self.cells.iter().flatten().count()
    }

    fn at(&self, position: usize) -> Option<&str> {
        self.cells.get(position).and_then(|cell| cell.as_deref())
    }

    fn named(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(position, cell)| cell.as_deref().map(|name| (position, name)))
    }
}

/// One way of recognising a report layout.
pub trait ColumnDetector {
    fn name(&self) -> &'static str;

    /// A complete mapping, or `None` when this layout does not apply.
    fn detect(&self, headers: &HeaderRow) -> Option<ColumnMap>;
}

/// The standard "#, Subject Code, Subject, Subject Type, Present, OD,
/// Makeup, Absent" export. Its "Subject Code" column would fool a name scan,
/// so the positions are fixed.
pub struct SignatureDetector;

impl ColumnDetector for SignatureDetector {
    fn name(&self) -> &'static str {
        "signature"
    }

    fn detect(&self, headers: &HeaderRow) -> Option<ColumnMap> {
        let contains = |position: usize, needle: &str| {
            headers
                .at(position)
                .is_some_and(|header| header.contains(needle))
        };

        let known = headers.named_count() > 4
            && contains(1, "code")
            && contains(2, "subject")
            && contains(4, "present");

        known.then_some(ColumnMap {
            subject: Some(2),
            kind: Some(3),
            present: Some(4),
            od: Some(5),
            makeup: Some(6),
            absent: Some(7),
        })
    }
}

/// Fallback that classifies each header by keyword. A header lands in the
/// first category it matches and the first header per category wins.
pub struct HeaderScanDetector;

impl HeaderScanDetector {
    /// A word starting with "od" ("OD", "ODs", "ODL") or "on duty". Bare
    /// substrings would hit "code" and "period".
    fn is_od(header: &str) -> bool {
        header
            .split(|c: char| !c.is_ascii_alphanumeric())
            .any(|word| word.starts_with("od"))
            || header.contains("duty")
    }
}

impl ColumnDetector for HeaderScanDetector {
    fn name(&self) -> &'static str {
        "header-scan"
    }

    fn detect(&self, headers: &HeaderRow) -> Option<ColumnMap> {
        let mut map = ColumnMap::default();

        for (position, header) in headers.named() {
            let slot = if header.contains("subject")
                && !header.contains("code")
                && !header.contains("type")
            {
                &mut map.subject
            } else if header.contains("type") || header.contains("session") {
                &mut map.kind
            } else if header.contains("present") {
                &mut map.present
            } else if Self::is_od(header) {
                &mut map.od
            } else if header.contains("makeup") {
                &mut map.makeup
            } else if header.contains("absent") {
                &mut map.absent
            } else {
                continue;
            };
            slot.get_or_insert(position);
        }

        map.is_complete().then_some(map)
    }
}

/// Try each detector in order; the first complete mapping wins.
pub fn resolve_columns<S: AsRef<str>>(raw_headers: &[S]) -> Result<ColumnMap> {
    let headers = HeaderRow::new(raw_headers);
    let detectors: [&dyn ColumnDetector; 2] = [&SignatureDetector, &HeaderScanDetector];

    for detector in detectors {
        if let Some(map) = detector.detect(&headers) {
            info!(detector = detector.name(), ?map, "resolved report columns");
            return Ok(map);
        }
    }

    Err(AttendanceError::ColumnMapping(MAPPING_FAILED.to_string()))
}
