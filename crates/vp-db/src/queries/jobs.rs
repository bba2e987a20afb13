//! Job queue operations.
//!
//! The queue is a single `jobs` table; [`claim_next`] is the only
//! concurrency-correctness mechanism in the system.  Everything else is a
//! short independent read or write.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use rusqlite::Connection;
use vp_core::{Error, JobId, JobSource, JobStatus, Profile, Result};

use crate::models::Job;

const COLS: &str = "id, source, user_id, chat_id, input_path, output_path, status,
    profile, progress, input_bytes, output_bytes, duration_seconds,
    created_at, updated_at, error_message, download_token";

/// Generate a URL-safe download token (24 random bytes, base64url).
fn generate_download_token() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Fields supplied by ingress when creating a job.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub source: JobSource,
    pub user_id: Option<String>,
    pub chat_id: Option<String>,
    pub input_path: String,
    pub profile: Profile,
    pub input_bytes: i64,
}

/// Partial update applied to a job row.
///
/// Only fields set to `Some` are written; `updated_at` is always bumped.
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<i64>,
    pub output_path: Option<String>,
    pub output_bytes: Option<i64>,
    pub duration_seconds: Option<i64>,
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// Shorthand for a progress-only update.
    pub fn progress(percent: i64) -> Self {
        Self {
            progress: Some(percent),
            ..Default::default()
        }
    }

    /// Shorthand for finalizing a job as `error` with a message.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Error),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Create a new job in `queued` state with a fresh download token.
pub fn create_job(conn: &Connection, new: &NewJob) -> Result<Job> {
    let id = JobId::new();
    let token = generate_download_token();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO jobs (id, source, user_id, chat_id, input_path, output_path,
             status, profile, progress, input_bytes, output_bytes,
             duration_seconds, created_at, updated_at, error_message, download_token)
         VALUES (?1, ?2, ?3, ?4, ?5, NULL, 'queued', ?6, 0, ?7, 0, 0, ?8, ?8, '', ?9)",
        rusqlite::params![
            id.to_string(),
            new.source.to_string(),
            new.user_id,
            new.chat_id,
            new.input_path,
            new.profile.to_string(),
            new.input_bytes,
            &now,
            &token,
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Job {
        id,
        source: new.source,
        user_id: new.user_id.clone(),
        chat_id: new.chat_id.clone(),
        input_path: new.input_path.clone(),
        output_path: None,
        status: JobStatus::Queued,
        profile: new.profile,
        progress: 0,
        input_bytes: new.input_bytes,
        output_bytes: 0,
        duration_seconds: 0,
        created_at: now.clone(),
        updated_at: now,
        error_message: String::new(),
        download_token: token,
    })
}

/// Get a job by ID.
pub fn get_job(conn: &Connection, id: JobId) -> Result<Option<Job>> {
    let q = format!("SELECT {COLS} FROM jobs WHERE id = ?1");
    let result = conn.query_row(&q, [id.to_string()], Job::from_row);
    match result {
        Ok(j) => Ok(Some(j)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Apply a partial update to a job, always bumping `updated_at`.
pub fn update_job(conn: &Connection, id: JobId, update: &JobUpdate) -> Result<bool> {
    let now = Utc::now().to_rfc3339();

    let mut assignments: Vec<&str> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(status) = update.status {
        assignments.push("status = ?");
        values.push(Box::new(status.to_string()));
    }
    if let Some(progress) = update.progress {
        assignments.push("progress = ?");
        values.push(Box::new(progress));
    }
    if let Some(ref output_path) = update.output_path {
        assignments.push("output_path = ?");
        values.push(Box::new(output_path.clone()));
    }
    if let Some(output_bytes) = update.output_bytes {
        assignments.push("output_bytes = ?");
        values.push(Box::new(output_bytes));
    }
    if let Some(duration_seconds) = update.duration_seconds {
        assignments.push("duration_seconds = ?");
        values.push(Box::new(duration_seconds));
    }
    if let Some(ref error_message) = update.error_message {
        assignments.push("error_message = ?");
        values.push(Box::new(error_message.clone()));
    }

    assignments.push("updated_at = ?");
    values.push(Box::new(now));
    values.push(Box::new(id.to_string()));

    // Positional placeholders are numbered left to right.
    let q = {
        let mut n = 0;
        let set_clause: Vec<String> = assignments
            .iter()
            .map(|a| {
                n += 1;
                a.replace('?', &format!("?{n}"))
            })
            .collect();
        format!(
            "UPDATE jobs SET {} WHERE id = ?{}",
            set_clause.join(", "),
            n + 1
        )
    };

    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        values.iter().map(|b| b.as_ref()).collect();
    let n = conn
        .execute(&q, params_refs.as_slice())
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Atomically claim the oldest queued job.
///
/// Transitions it to `processing` with `progress=0` and returns the updated
/// record, or `None` when the queue is empty.  The sub-select plus the
/// `status='queued'` guard make the claim a single indivisible statement, so
/// concurrent callers never observe or claim the same job twice.
pub fn claim_next(conn: &Connection) -> Result<Option<Job>> {
    let now = Utc::now().to_rfc3339();

    // SQLite RETURNING is supported since 3.35.
    let q = format!(
        "UPDATE jobs SET status='processing', progress=0, updated_at=?1
         WHERE id = (
             SELECT id FROM jobs WHERE status='queued'
             ORDER BY created_at ASC, rowid ASC LIMIT 1
         )
         AND status='queued'
         RETURNING {COLS}"
    );

    let result = conn.query_row(&q, rusqlite::params![&now], Job::from_row);
    match result {
        Ok(j) => Ok(Some(j)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
