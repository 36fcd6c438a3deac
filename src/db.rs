use std::collections::HashMap;

use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AttendanceError, Result};
use crate::models::{
    AttendanceLog, AttendanceStatus, SessionType, Subject, SubjectLogs, UpsertOutcome,
};
use crate::store::AttendanceStore;

pub async fn connect(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AttendanceError::Config("DATABASE_URL must be set".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn init_db(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|err| AttendanceError::Database(err.into()))?;
    Ok(())
}

/// Postgres-backed store. Each operation is a single upsert statement
/// against a unique index, so it is atomic without an explicit transaction.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AttendanceStore for PgStore {
    async fn get_or_create_subject(&self, owner: &str, name: &str) -> Result<Subject> {
        // The no-op update makes RETURNING hand back the existing row.
        let row = sqlx::query(
            r#"
            INSERT INTO attendance.subjects (id, owner, name)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner, lower(name)) DO UPDATE
            SET owner = EXCLUDED.owner
            RETURNING id, owner, name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(Subject {
            id: row.get("id"),
            owner: row.get("owner"),
            name: row.get("name"),
        })
    }

    async fn get_or_create_session_type(&self, name: &str) -> Result<SessionType> {
        let row = sqlx::query(
            r#"
            INSERT INTO attendance.session_types (id, name, weight)
            VALUES ($1, $2, $3)
            ON CONFLICT (lower(name)) DO UPDATE
            SET weight = attendance.session_types.weight
            RETURNING id, name, weight
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(Decimal::ONE)
        .fetch_one(&self.pool)
        .await?;

        Ok(SessionType {
            id: row.get("id"),
            name: row.get("name"),
            weight: row.get("weight"),
        })
    }

    async fn link_session_type(
        &self,
        subject: &Subject,
        session_type: &SessionType,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO attendance.subject_session_types (subject_id, session_type_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(subject.id)
        .bind(session_type.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert_log(&self, log: &AttendanceLog) -> Result<UpsertOutcome> {
        let inserted: bool = sqlx::query(
            r#"
            INSERT INTO attendance.attendance_logs
            (id, subject_id, log_date, session_type_id, status)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subject_id, log_date, session_type_id) DO UPDATE
            SET status = EXCLUDED.status, updated_at = now()
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(log.subject_id)
        .bind(log.date)
        .bind(log.session_type_id)
        .bind(log.status.as_str())
        .fetch_one(&self.pool)
        .await?
        .get("inserted");

        Ok(if inserted {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn subject_logs(&self, owner: &str) -> Result<Vec<SubjectLogs>> {
        let subject_rows = sqlx::query(
            r#"
            SELECT s.id, s.owner, s.name,
                   COALESCE(
                       array_agg(t.name ORDER BY t.name) FILTER (WHERE t.name IS NOT NULL),
                       '{}'
                   ) AS session_types
            FROM attendance.subjects s
            LEFT JOIN attendance.subject_session_types st ON st.subject_id = s.id
            LEFT JOIN attendance.session_types t ON t.id = st.session_type_id
            WHERE s.owner = $1
            GROUP BY s.id, s.owner, s.name
            ORDER BY s.name
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let log_rows = sqlx::query(
            r#"
            SELECT l.subject_id, l.status, t.weight
            FROM attendance.attendance_logs l
            JOIN attendance.subjects s ON s.id = l.subject_id
            JOIN attendance.session_types t ON t.id = l.session_type_id
            WHERE s.owner = $1
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;

        let mut logs_by_subject: HashMap<Uuid, Vec<(AttendanceStatus, Decimal)>> = HashMap::new();
        for row in log_rows {
            let status: String = row.get("status");
            logs_by_subject
                .entry(row.get("subject_id"))
                .or_default()
                .push((AttendanceStatus::parse_stored(&status), row.get("weight")));
        }

        let mut subjects = Vec::with_capacity(subject_rows.len());
        for row in subject_rows {
            let id: Uuid = row.get("id");
            subjects.push(SubjectLogs {
                subject: Subject {
                    id,
                    owner: row.get("owner"),
                    name: row.get("name"),
                },
                session_types: row.get("session_types"),
                logs: logs_by_subject.remove(&id).unwrap_or_default(),
            });
        }

        Ok(subjects)
    }
}
