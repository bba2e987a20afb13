//! Per-user quality preference storage.
//!
//! Last-write-wins upsert keyed by `user_id`; read by ingress at
//! job-creation time.

use chrono::Utc;
use rusqlite::Connection;
use std::str::FromStr;
use vp_core::{Error, Profile, Result};

/// Set (or replace) a user's preferred profile.
pub fn set_user_profile(conn: &Connection, user_id: &str, profile: Profile) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO user_settings (user_id, profile, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
             profile = excluded.profile,
             updated_at = excluded.updated_at",
        rusqlite::params![user_id, profile.to_string(), &now],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Get a user's preferred profile, if one has been set.
pub fn get_user_profile(conn: &Connection, user_id: &str) -> Result<Option<Profile>> {
    let result = conn.query_row(
        "SELECT profile FROM user_settings WHERE user_id = ?1",
        [user_id],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(s) => Profile::from_str(&s).map(Some),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}
