use std::collections::HashMap;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{
    Action, AttendanceReport, ForecastResult, SimulationStep, SubjectImpact, SubjectLogs,
};
use crate::stats::{PercentageMode, Tally};

/// Running attended/conducted hours per subject and overall. Built fresh
/// for each forecast request.
#[derive(Debug, Clone, Default)]
pub struct ForecastState {
    subjects: HashMap<String, Tally>,
    global: Tally,
}

impl ForecastState {
    /// Baseline from a parsed report. Subjects are keyed by the ids the
    /// report emits; rows sharing an id are merged.
    pub fn from_report(report: &AttendanceReport) -> Self {
        let mut state = Self::default();
        for stat in &report.subjects {
            state.add(
                &stat.id,
                Tally {
                    attended: Decimal::from(stat.attended),
                    conducted: Decimal::from(stat.conducted),
                },
            );
        }
        state
    }

    /// Baseline from persisted logs, weighting each log by its session type.
    pub fn from_subject_logs(subjects: &[SubjectLogs]) -> Self {
        let mut state = Self::default();
        for entry in subjects {
            let tally = PercentageMode::HoursWeighted.tally(&entry.logs);
            state.add(&entry.subject.id.to_string(), tally);
        }
        state
    }

    fn add(&mut self, subject_id: &str, tally: Tally) {
        let current = self.subjects.entry(subject_id.to_string()).or_default();
        current.attended = current.attended.saturating_add(tally.attended);
        current.conducted = current.conducted.saturating_add(tally.conducted);
        self.global.attended = self.global.attended.saturating_add(tally.attended);
        self.global.conducted = self.global.conducted.saturating_add(tally.conducted);
    }

    /// Apply one step. Unknown subjects are ignored and yield `None`.
    pub fn apply(&mut self, step: &SimulationStep) -> Option<ForecastResult> {
        let Some(subject) = self.subjects.get_mut(&step.subject_id) else {
            debug!(subject_id = %step.subject_id, "forecast step for unknown subject");
            return None;
        };

        let weight = step.weight;
        subject.conducted = subject.conducted.saturating_add(weight);
        self.global.conducted = self.global.conducted.saturating_add(weight);
        if step.action == Action::Attend {
            subject.attended = subject.attended.saturating_add(weight);
            self.global.attended = self.global.attended.saturating_add(weight);
        }

        Some(ForecastResult {
            subject_impact: SubjectImpact {
                subject_id: step.subject_id.clone(),
                new_percentage: subject.percentage(),
            },
            global_percentage: self.global.percentage(),
        })
    }

    /// Run steps in order; each one sees the effect of those before it.
    pub fn simulate(&mut self, steps: &[SimulationStep]) -> Vec<ForecastResult> {
        steps.iter().filter_map(|step| self.apply(step)).collect()
    }
}
