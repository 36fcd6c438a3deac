use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Attendance figures for one subject, in hours or sessions depending on
/// which computation produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectStat {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub attended: i64,
    pub conducted: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalStat {
    pub attended: i64,
    pub conducted: i64,
    pub percentage: f64,
}

/// Payload of the upload and dashboard paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceReport {
    pub global: GlobalStat,
    pub subjects: Vec<SubjectStat>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub owner: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionType {
    pub id: Uuid,
    pub name: String,
    pub weight: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// Anything outside the recognised "present" spellings counts as absent.
    pub fn from_raw(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "PRESENT" | "P" | "YES" | "ATTENDED" => Self::Present,
            _ => Self::Absent,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "Present",
            Self::Absent => "Absent",
        }
    }

    pub fn parse_stored(value: &str) -> Self {
        if value == "Present" {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceLog {
    pub subject_id: Uuid,
    pub date: NaiveDate,
    pub session_type_id: Uuid,
    pub status: AttendanceStatus,
}

/// Whether an upsert wrote a new log or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
}

/// A subject together with its linked session types and every log recorded
/// against it. The weight of each log is the weight of its session type.
#[derive(Debug, Clone)]
pub struct SubjectLogs {
    pub subject: Subject,
    pub session_types: Vec<String>,
    pub logs: Vec<(AttendanceStatus, Decimal)>,
}

/// One row handed to the reconciler by the log importer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRecord {
    pub subject: String,
    pub session_type: String,
    pub status: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub status: String,
    pub mode: String,
    pub logs_created: usize,
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Attend,
    #[default]
    Skip,
}

impl Action {
    /// Unknown or missing actions fall back to a skip.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|value| value.trim().to_uppercase()) {
            Some(value) if value == "ATTEND" => Self::Attend,
            _ => Self::Skip,
        }
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_label(label.as_deref()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub subject_id: String,
    #[serde(default)]
    pub action: Action,
    #[serde(default = "default_weight")]
    pub weight: Decimal,
}

fn default_weight() -> Decimal {
    Decimal::ONE
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectImpact {
    pub subject_id: String,
    pub new_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    pub subject_impact: SubjectImpact,
    pub global_percentage: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_normalisation_accepts_known_spellings() {
        for raw in ["present", " P ", "yes", "Attended"] {
            assert_eq!(AttendanceStatus::from_raw(raw), AttendanceStatus::Present);
        }
        for raw in ["", "absent", "no", "late"] {
            assert_eq!(AttendanceStatus::from_raw(raw), AttendanceStatus::Absent);
        }
    }

    #[test]
    fn simulation_step_defaults_to_one_hour_skip() {
        let step: SimulationStep = serde_json::from_str(r#"{"subject_id": "math"}"#).unwrap();
        assert_eq!(step.action, Action::Skip);
        assert_eq!(step.weight, Decimal::ONE);
    }

    #[test]
    fn simulation_step_reads_numeric_weight_and_lowercase_action() {
        let step: SimulationStep =
            serde_json::from_str(r#"{"subject_id": "math", "action": "attend", "weight": 3}"#)
                .unwrap();
        assert_eq!(step.action, Action::Attend);
        assert_eq!(step.weight, Decimal::from(3));

        let step: SimulationStep =
            serde_json::from_str(r#"{"subject_id": "math", "action": "bunk"}"#).unwrap();
        assert_eq!(step.action, Action::Skip);
    }

    #[test]
    fn subject_stat_serialises_kind_as_type() {
        let stat = SubjectStat {
            id: "Physics".to_string(),
            name: "Physics".to_string(),
            kind: "Lab".to_string(),
            attended: 15,
            conducted: 18,
            percentage: 83.33,
        };
        let value = serde_json::to_value(&stat).unwrap();
        assert_eq!(value["type"], "Lab");
    }
}
