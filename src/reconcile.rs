use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::error::Result;
use crate::importer::LogImporter;
use crate::models::{AttendanceLog, AttendanceStatus, ImportRecord, ImportSummary};
use crate::store::AttendanceStore;

/// Fold imported records into the store for `owner`.
///
/// Subjects and session types are matched case-insensitively and created
/// on first sight; logs are upserted on (subject, date, session type), so
/// importing the same file twice corrects rather than duplicates.
pub async fn reconcile<S: AttendanceStore>(
    store: &S,
    owner: &str,
    mode: &str,
    records: &[ImportRecord],
) -> Result<ImportSummary> {
    let mut logs_created = 0usize;
    let mut subjects = BTreeSet::new();

    for record in records {
        let subject_name = record.subject.trim();
        if subject_name.is_empty() {
            warn!(date = %record.date, "skipping record without subject");
            continue;
        }

        let subject = store.get_or_create_subject(owner, subject_name).await?;
        subjects.insert(subject.name.clone());

        let session_type = store
            .get_or_create_session_type(record.session_type.trim())
            .await?;
        store.link_session_type(&subject, &session_type).await?;

        let log = AttendanceLog {
            subject_id: subject.id,
            date: record.date,
            session_type_id: session_type.id,
            status: AttendanceStatus::from_raw(&record.status),
        };
        store.upsert_log(&log).await?;
        logs_created += 1;
    }

    info!(owner, logs_created, subjects = subjects.len(), "reconciled import");

    Ok(ImportSummary {
        status: "success".to_string(),
        mode: mode.to_string(),
        logs_created,
        subjects: subjects.into_iter().collect(),
    })
}

/// Parse log CSV text and reconcile it in one go.
pub async fn import_attendance<S: AttendanceStore>(
    store: &S,
    owner: &str,
    csv_text: &str,
) -> Result<ImportSummary> {
    let mut importer = LogImporter::new(csv_text);
    let records = importer.parse()?;
    reconcile(store, owner, importer.mode().as_str(), &records).await
}
