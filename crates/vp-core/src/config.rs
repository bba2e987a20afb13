//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries
//! sub-configs for storage, the worker loop, external tools, and bot
//! delivery. Every section defaults sensibly so a completely empty `{}` file
//! is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::Error;

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub worker: WorkerConfig,
    pub tools: ToolsConfig,
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.worker.max_duration_seconds == 0 {
            warnings.push("worker.max_duration_seconds is 0; every job will be rejected".into());
        }

        if self.worker.poll_interval_secs == 0 {
            warnings.push("worker.poll_interval_secs is 0; idle workers will spin".into());
        }

        if self.delivery.base_url.is_empty() {
            warnings.push("delivery.base_url is empty; download links will be broken".into());
        }

        if self.delivery.bot_token.is_none() {
            warnings.push("delivery.bot_token is not set; bot delivery is disabled".into());
        }

        if self.delivery.direct_send_limit_mb == 0 {
            warnings.push(
                "delivery.direct_send_limit_mb is 0; every delivery falls back to a link".into(),
            );
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Database and file storage locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Directory ingress writes uploaded inputs into.
    pub upload_dir: PathBuf,
    /// Directory finished outputs are written into.
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/vidpress.db"),
            upload_dir: PathBuf::from("./data/uploads"),
            output_dir: PathBuf::from("./data/outputs"),
        }
    }
}

/// Worker loop settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Seconds to sleep between claim attempts when the queue is empty.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Jobs whose probed duration exceeds this are rejected before encoding.
    #[serde(default = "default_max_duration")]
    pub max_duration_seconds: u64,
}

fn default_poll_interval() -> u64 {
    1
}

fn default_max_duration() -> u64 {
    900
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            max_duration_seconds: default_max_duration(),
        }
    }
}

/// Paths to external CLI tools. `None` means "search PATH".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Bot delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Messaging-bot API token. Delivery is skipped entirely when unset.
    pub bot_token: Option<String>,
    /// Public base URL used to build download links.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Outputs at or below this size are sent directly; larger ones get a
    /// download link instead.
    #[serde(default = "default_direct_send_limit")]
    pub direct_send_limit_mb: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".into()
}

fn default_direct_send_limit() -> u64 {
    45
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            base_url: default_base_url(),
            direct_send_limit_mb: default_direct_send_limit(),
        }
    }
}
