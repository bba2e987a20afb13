//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`.

use std::str::FromStr;

use uuid::Uuid;
use vp_core::{JobId, JobSource, JobStatus, Profile};

/// Parse the UUID-based job id from a text column.
fn parse_id(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<JobId> {
    let s: String = row.get(idx)?;
    let uuid = Uuid::parse_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(JobId::from(uuid))
}

/// Parse an enum stored as lowercase text.
fn parse_enum<T>(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr<Err = vp_core::Error>,
{
    let s: String = row.get(idx)?;
    T::from_str(&s).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// One unit of submitted transcoding work with persisted state.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: JobId,
    pub source: JobSource,
    pub user_id: Option<String>,
    pub chat_id: Option<String>,
    pub input_path: String,
    pub output_path: Option<String>,
    pub status: JobStatus,
    pub profile: Profile,
    /// Percent complete, 0..=100. Non-decreasing while processing.
    pub progress: i64,
    pub input_bytes: i64,
    pub output_bytes: i64,
    pub duration_seconds: i64,
    pub created_at: String,
    pub updated_at: String,
    pub error_message: String,
    /// Opaque credential generated once at creation; never regenerated.
    pub download_token: String,
}

impl Job {
    /// Build from a row selected as:
    /// id, source, user_id, chat_id, input_path, output_path, status,
    /// profile, progress, input_bytes, output_bytes, duration_seconds,
    /// created_at, updated_at, error_message, download_token
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: parse_id(row, 0)?,
            source: parse_enum(row, 1)?,
            user_id: row.get(2)?,
            chat_id: row.get(3)?,
            input_path: row.get(4)?,
            output_path: row.get(5)?,
            status: parse_enum(row, 6)?,
            profile: parse_enum(row, 7)?,
            progress: row.get(8)?,
            input_bytes: row.get(9)?,
            output_bytes: row.get(10)?,
            duration_seconds: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
            error_message: row.get(14)?,
            download_token: row.get(15)?,
        })
    }
}
