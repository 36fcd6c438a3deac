use serde::Serialize;
use serde_json::{json, Value};
use tracing::error;

use crate::error::AttendanceError;
use crate::forecast::ForecastState;
use crate::models::SimulationStep;
use crate::parser::{decode_upload, parse_attendance_csv};
use crate::reconcile::import_attendance;
use crate::stats::dashboard_report;
use crate::store::AttendanceStore;

/// Transport-agnostic response: an HTTP-style status and a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    fn ok<T: Serialize>(payload: &T) -> Self {
        match serde_json::to_value(payload) {
            Ok(body) => Self { status: 200, body },
            Err(err) => Self::error(500, err.to_string()),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    fn from_error(err: &AttendanceError) -> Self {
        Self::error(err.status_code(), err.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn unauthenticated() -> ApiResponse {
    ApiResponse::error(401, "Authentication required")
}

/// Parse an uploaded report without touching the store.
pub fn upload(file: Option<&[u8]>) -> ApiResponse {
    let Some(bytes) = file else {
        return ApiResponse::error(400, "No file uploaded");
    };

    match parse_attendance_csv(bytes) {
        Ok(report) => ApiResponse::ok(&report),
        Err(err) => ApiResponse::from_error(&err),
    }
}

/// Reconcile an uploaded log file into the store for `user`.
pub async fn import<S: AttendanceStore>(
    store: &S,
    user: Option<&str>,
    file: Option<&[u8]>,
) -> ApiResponse {
    let Some(user) = user else {
        return unauthenticated();
    };
    let Some(bytes) = file else {
        return ApiResponse::error(400, "No file uploaded");
    };

    let outcome = match decode_upload(bytes) {
        Ok(text) => import_attendance(store, user, text).await,
        Err(err) => Err(err),
    };

    match outcome {
        Ok(summary) => ApiResponse::ok(&json!({
            "message": "Import successful",
            "summary": summary,
        })),
        Err(err) => {
            error!(user, error = ?err, "attendance import failed");
            ApiResponse::error(500, err.to_string())
        }
    }
}

/// Session-count standing for `user`.
pub async fn dashboard<S: AttendanceStore>(store: &S, user: Option<&str>) -> ApiResponse {
    let Some(user) = user else {
        return unauthenticated();
    };

    match store.subject_logs(user).await {
        Ok(subjects) => ApiResponse::ok(&dashboard_report(&subjects)),
        Err(err) => {
            error!(user, error = ?err, "dashboard query failed");
            ApiResponse::from_error(&err)
        }
    }
}

/// Forecast against the stored, hours-weighted standing of `user`.
pub async fn forecast<S: AttendanceStore>(
    store: &S,
    user: Option<&str>,
    steps: &[SimulationStep],
) -> ApiResponse {
    let Some(user) = user else {
        return unauthenticated();
    };

    match store.subject_logs(user).await {
        Ok(subjects) => {
            let mut state = ForecastState::from_subject_logs(&subjects);
            ApiResponse::ok(&state.simulate(steps))
        }
        Err(err) => {
            error!(user, error = ?err, "forecast baseline query failed");
            ApiResponse::from_error(&err)
        }
    }
}

/// Forecast against a report parsed from an upload; subjects are addressed
/// by name.
pub fn forecast_upload(file: Option<&[u8]>, steps: &[SimulationStep]) -> ApiResponse {
    let Some(bytes) = file else {
        return ApiResponse::error(400, "No file uploaded");
    };

    match parse_attendance_csv(bytes) {
        Ok(report) => {
            let mut state = ForecastState::from_report(&report);
            ApiResponse::ok(&state.simulate(steps))
        }
        Err(err) => ApiResponse::from_error(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Action;
    use crate::store::memory::MemoryStore;
    use rust_decimal::Decimal;

    const REPORT: &[u8] = b"\
#,Subject Code,Subject,Subject Type,Present,OD,Makeup,Absent
1,LAB101,Physics Lab,Lab,5,0,0,1
";

    const LOGS: &[u8] = b"\
Subject,Type,Status,Date
Physics,Lab,Present,2026-01-05
Physics,Lab,Absent,2026-01-06
Maths,Lecture,P,2026-01-05
";

    #[test]
    fn upload_returns_report_payload() {
        let response = upload(Some(REPORT));
        assert_eq!(response.status, 200);
        assert_eq!(response.body["global"]["conducted"], 18);
        assert_eq!(response.body["subjects"][0]["percentage"], 83.33);
        assert_eq!(response.body["subjects"][0]["type"], "Lab");
    }

    #[test]
    fn upload_errors_are_client_faults() {
        assert_eq!(upload(None).status, 400);

        let response = upload(Some(&b"Name,Hours\nAlgo,3\n"[..]));
        assert_eq!(response.status, 400);
        assert!(response.body["error"]
            .as_str()
            .unwrap()
            .starts_with("Could not map columns"));
    }

    #[tokio::test]
    async fn import_requires_user_and_file() {
        let store = MemoryStore::default();
        assert_eq!(import(&store, None, Some(LOGS)).await.status, 401);
        assert_eq!(import(&store, Some("avery"), None).await.status, 400);
    }

    #[tokio::test]
    async fn import_failures_are_server_faults() {
        let store = MemoryStore::default();
        let response = import(&store, Some("avery"), Some(&b""[..])).await;
        assert_eq!(response.status, 500);
        assert_eq!(response.body["error"], "Empty CSV");
    }

    #[tokio::test]
    async fn import_then_dashboard_counts_sessions() {
        let store = MemoryStore::default();
        let response = import(&store, Some("avery"), Some(LOGS)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["summary"]["logs_created"], 3);
        assert_eq!(response.body["summary"]["mode"], "headers");

        let response = dashboard(&store, Some("avery")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body["global"]["attended"], 2);
        assert_eq!(response.body["global"]["conducted"], 3);
        assert_eq!(response.body["subjects"][0]["name"], "Maths");
        assert_eq!(response.body["subjects"][1]["percentage"], 50.0);

        let response = dashboard(&store, Some("jules")).await;
        assert_eq!(response.body["global"]["percentage"], 0.0);
    }

    #[tokio::test]
    async fn forecast_uses_stored_subject_ids() {
        let store = MemoryStore::default();
        import(&store, Some("avery"), Some(LOGS)).await;
        let subjects = store.subject_logs("avery").await.unwrap();
        let maths = subjects[0].subject.id.to_string();

        let steps = vec![SimulationStep {
            subject_id: maths.clone(),
            action: Action::Skip,
            weight: Decimal::ONE,
        }];
        let response = forecast(&store, Some("avery"), &steps).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.body[0]["subject_impact"]["subject_id"], maths);
        assert_eq!(response.body[0]["subject_impact"]["new_percentage"], 50.0);
        // 2 attended of 4 conducted overall
        assert_eq!(response.body[0]["global_percentage"], 50.0);
    }

    #[test]
    fn forecast_upload_addresses_subjects_by_name() {
        let steps: Vec<SimulationStep> = serde_json::from_str(
            r#"[{"subject_id": "Physics Lab", "action": "ATTEND", "weight": 3},
                {"subject_id": "Nope", "action": "ATTEND"}]"#,
        )
        .unwrap();
        let response = forecast_upload(Some(REPORT), &steps);
        assert_eq!(response.status, 200);
        assert_eq!(response.body.as_array().unwrap().len(), 1);
        // 18 / 21
        assert_eq!(response.body[0]["subject_impact"]["new_percentage"], 85.71);
    }
}
