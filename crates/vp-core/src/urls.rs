//! Download URL construction shared by the dispatcher and ingress surfaces.

use crate::ids::JobId;

/// Build the authorized download URL for a finished job.
///
/// The token is the job's immutable `download_token`; knowledge of it is the
/// sole download authorization.
pub fn download_url(base_url: &str, job_id: JobId, token: &str) -> String {
    format!(
        "{}/api/download/{job_id}?token={token}",
        base_url.trim_end_matches('/')
    )
}
