use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::aggregate::aggregate;
use crate::models::{AttendanceReport, AttendanceStatus, SubjectLogs, SubjectStat};

/// How persisted logs turn into attended/conducted totals. The two rules
/// serve different call paths and are chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentageMode {
    /// Every log contributes its session type's weight in hours.
    HoursWeighted,
    /// Every log counts as one session.
    SessionCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tally {
    pub attended: Decimal,
    pub conducted: Decimal,
}

impl Tally {
    pub fn percentage(&self) -> f64 {
        decimal_percentage(self.attended, self.conducted)
    }
}

impl PercentageMode {
    pub fn tally(self, logs: &[(AttendanceStatus, Decimal)]) -> Tally {
        logs.iter().fold(Tally::default(), |mut tally, (status, weight)| {
            let amount = match self {
                Self::HoursWeighted => *weight,
                Self::SessionCount => Decimal::ONE,
            };
            tally.conducted = tally.conducted.saturating_add(amount);
            if *status == AttendanceStatus::Present {
                tally.attended = tally.attended.saturating_add(amount);
            }
            tally
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// attended/conducted as a percentage, 0 when nothing was conducted.
pub fn percentage(attended: i64, conducted: i64) -> f64 {
    if conducted > 0 {
        round2(attended as f64 / conducted as f64 * 100.0)
    } else {
        0.0
    }
}

pub fn decimal_percentage(attended: Decimal, conducted: Decimal) -> f64 {
    if conducted <= Decimal::ZERO {
        return 0.0;
    }
    attended
        .checked_div(conducted)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .map(|pct| pct.round_dp(2))
        .and_then(|pct| pct.to_f64())
        .unwrap_or(0.0)
}

pub fn type_label(session_types: &[String]) -> String {
    if session_types.is_empty() {
        "Lecture".to_string()
    } else {
        session_types.join(", ")
    }
}

/// Session-count standing per subject plus the overall figure.
pub fn dashboard_report(subjects: &[SubjectLogs]) -> AttendanceReport {
    let stats: Vec<SubjectStat> = subjects
        .iter()
        .map(|entry| {
            let tally = PercentageMode::SessionCount.tally(&entry.logs);
            let attended = tally.attended.to_i64().unwrap_or(0);
            let conducted = tally.conducted.to_i64().unwrap_or(0);
            SubjectStat {
                id: entry.subject.id.to_string(),
                name: entry.subject.name.clone(),
                kind: type_label(&entry.session_types),
                attended,
                conducted,
                percentage: percentage(attended, conducted),
            }
        })
        .collect();

    AttendanceReport {
        global: aggregate(&stats),
        subjects: stats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Subject;
    use uuid::Uuid;

    fn logs() -> Vec<(AttendanceStatus, Decimal)> {
        vec![
            (AttendanceStatus::Present, Decimal::from(3)),
            (AttendanceStatus::Absent, Decimal::ONE),
            (AttendanceStatus::Present, Decimal::ONE),
        ]
    }

    #[test]
    fn zero_conducted_is_zero_percent() {
        assert_eq!(percentage(0, 0), 0.0);
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(decimal_percentage(Decimal::ONE, Decimal::ZERO), 0.0);
        assert_eq!(decimal_percentage(Decimal::ONE, Decimal::NEGATIVE_ONE), 0.0);
    }

    #[test]
    fn percentages_round_to_two_places() {
        assert_eq!(percentage(15, 18), 83.33);
        assert_eq!(percentage(2, 3), 66.67);
        assert_eq!(decimal_percentage(Decimal::from(2), Decimal::from(3)), 66.67);
    }

    #[test]
    fn modes_disagree_on_weighted_logs() {
        let hours = PercentageMode::HoursWeighted.tally(&logs());
        assert_eq!(hours.attended, Decimal::from(4));
        assert_eq!(hours.conducted, Decimal::from(5));
        assert_eq!(hours.percentage(), 80.0);

        let sessions = PercentageMode::SessionCount.tally(&logs());
        assert_eq!(sessions.attended, Decimal::from(2));
        assert_eq!(sessions.conducted, Decimal::from(3));
        assert_eq!(sessions.percentage(), 66.67);
    }

    #[test]
    fn dashboard_counts_sessions_and_totals_them() {
        let subject = Subject {
            id: Uuid::new_v4(),
            owner: "avery".to_string(),
            name: "Physics".to_string(),
        };
        let empty = Subject {
            id: Uuid::new_v4(),
            owner: "avery".to_string(),
            name: "History".to_string(),
        };
        let report = dashboard_report(&[
            SubjectLogs {
                subject: subject.clone(),
                session_types: vec!["Lab".to_string()],
                logs: logs(),
            },
            SubjectLogs {
                subject: empty,
                session_types: Vec::new(),
                logs: Vec::new(),
            },
        ]);

        assert_eq!(report.subjects[0].id, subject.id.to_string());
        assert_eq!(report.subjects[0].attended, 2);
        assert_eq!(report.subjects[0].conducted, 3);
        assert_eq!(report.subjects[1].kind, "Lecture");
        assert_eq!(report.subjects[1].percentage, 0.0);
        assert_eq!(report.global.attended, 2);
        assert_eq!(report.global.conducted, 3);
        assert_eq!(report.global.percentage, 66.67);
    }
}
