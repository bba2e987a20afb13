//! Unified error type for the vidpress application.
//!
//! All crates funnel their failures into [`Error`]. The variants mirror the
//! failure taxonomy of the job pipeline: probing, policy gates, encoding,
//! delivery, plus the usual database/IO/tool plumbing. API handlers can derive
//! an HTTP status code via [`Error::http_status`].

/// Unified error type covering all failure modes in vidpress.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A database operation failed.
    #[error("Database error: {source}")]
    Database {
        /// The underlying database error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// An external tool (ffmpeg, ffprobe) could not be run.
    #[error("Tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// Media probing failed: tool failure, unparsable output, or no video
    /// stream in the input.
    #[error("Probe error: {0}")]
    Probe(String),

    /// The job was rejected by a policy gate before encoding started.
    #[error("{0}")]
    Policy(String),

    /// The transcoding process failed.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Delivering a finished artifact failed. Never job-fatal.
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::Database { .. } => 500,
            Error::Io { .. } => 500,
            Error::Tool { .. } => 502,
            Error::Probe(_) => 422,
            Error::Policy(_) => 422,
            Error::Encode(_) => 500,
            Error::Delivery(_) => 502,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::Database`].
    pub fn database(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Error::Database {
            source: source.into(),
        }
    }

    /// Convenience constructor for [`Error::Tool`].
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display() {
        let err = Error::Validation("profile is required".into());
        assert_eq!(err.to_string(), "Validation error: profile is required");
        assert_eq!(err.http_status(), 400);
    }

    #[test]
    fn database_display() {
        let err = Error::database("connection refused");
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn io_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io { .. }));
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn tool_display() {
        let err = Error::tool("ffmpeg", "exit code 1");
        assert_eq!(err.to_string(), "Tool error [ffmpeg]: exit code 1");
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn probe_display() {
        let err = Error::Probe("No video stream detected".into());
        assert_eq!(err.to_string(), "Probe error: No video stream detected");
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn policy_carries_bare_message() {
        // Policy errors land verbatim in the job's error_message column.
        let err = Error::Policy("Duration exceeds limit".into());
        assert_eq!(err.to_string(), "Duration exceeds limit");
        assert_eq!(err.http_status(), 422);
    }

    #[test]
    fn encode_display() {
        let err = Error::Encode("ffmpeg exited with status 1".into());
        assert_eq!(err.to_string(), "Encode error: ffmpeg exited with status 1");
        assert_eq!(err.http_status(), 500);
    }

    #[test]
    fn delivery_display() {
        let err = Error::Delivery("sendVideo returned 413".into());
        assert_eq!(err.http_status(), 502);
    }

    #[test]
    fn result_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);
    }
}
