use crate::cleaner::clean_count;
use crate::columns::ColumnMap;
use crate::models::SubjectStat;
use crate::stats::percentage;

const MIN_ROW_CELLS: usize = 5;
const LAB_WEIGHT: i64 = 3;
const LECTURE_WEIGHT: i64 = 1;

/// Hours one session of this type is worth: labs run three hours.
pub fn type_weight(kind: &str) -> i64 {
    if kind.to_lowercase().contains("lab") {
        LAB_WEIGHT
    } else {
        LECTURE_WEIGHT
    }
}

fn cell<'a, S: AsRef<str>>(row: &'a [S], index: Option<usize>) -> &'a str {
    index
        .and_then(|i| row.get(i))
        .map(|value| value.as_ref().trim())
        .unwrap_or("")
}

/// Turn one data row into hours-weighted subject figures.
///
/// Returns `None` for short rows, rows without a subject name and repeated
/// header or summary rows ("Total", "Subject").
pub fn extract_row<S: AsRef<str>>(row: &[S], columns: &ColumnMap) -> Option<SubjectStat> {
    if row.len() < MIN_ROW_CELLS {
        return None;
    }

    let name = cell(row, columns.subject);
    let lowered = name.to_lowercase();
    if name.is_empty() || lowered.contains("total") || lowered.contains("subject") {
        return None;
    }

    let present = clean_count(cell(row, columns.present));
    let od = clean_count(cell(row, columns.od));
    let makeup = clean_count(cell(row, columns.makeup));
    let absent = clean_count(cell(row, columns.absent));

    let kind = match cell(row, columns.kind) {
        "" => "Lecture",
        value => value,
    };
    let weight = type_weight(kind);

    let attended = present
        .saturating_add(od)
        .saturating_add(makeup)
        .saturating_mul(weight);
    let absent_hours = absent.saturating_mul(weight);
    let conducted = attended.saturating_add(absent_hours);

    Some(SubjectStat {
        id: name.to_string(),
        name: name.to_string(),
        kind: kind.to_string(),
        attended,
        conducted,
        percentage: percentage(attended, conducted),
    })
}
