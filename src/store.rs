use crate::error::Result;
use crate::models::{AttendanceLog, SessionType, Subject, SubjectLogs, UpsertOutcome};

/// Persistence boundary for reconciled imports and dashboards.
///
/// Every operation must be atomic on its uniqueness key so concurrent
/// imports for the same user never create duplicates.
pub trait AttendanceStore {
    /// Subject owned by `owner` whose name matches case-insensitively,
    /// created with `name` as its canonical casing when missing.
    async fn get_or_create_subject(&self, owner: &str, name: &str) -> Result<Subject>;

    /// Session type matched case-insensitively, created with weight 1.0.
    async fn get_or_create_session_type(&self, name: &str) -> Result<SessionType>;

    /// Idempotent many-to-many link.
    async fn link_session_type(&self, subject: &Subject, session_type: &SessionType)
        -> Result<()>;

    /// Create or overwrite the log keyed by (subject, date, session type).
    async fn upsert_log(&self, log: &AttendanceLog) -> Result<UpsertOutcome>;

    /// All subjects of `owner` with their session types and logs, ordered by
    /// subject name.
    async fn subject_logs(&self, owner: &str) -> Result<Vec<SubjectLogs>>;
}
