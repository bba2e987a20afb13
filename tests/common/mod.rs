//! Shared helpers for integration tests: stub tool scripts and a worker
//! context wired to an in-memory database.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use vidpress::context::WorkerContext;
use vp_av::ToolRegistry;
use vp_core::config::{Config, DeliveryConfig};
use vp_db::pool::{init_memory_pool, DbPool};

/// Write an executable shell script into `dir` and return its path.
#[cfg(unix)]
pub fn stub_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "#!/bin/sh\n{body}").unwrap();
    let mut perms = f.metadata().unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

/// ffprobe stub body emitting a fixed report.
pub fn ffprobe_body(duration: &str, width: u32, height: u32) -> String {
    format!(
        r#"printf '{{"format":{{"duration":"{duration}"}},"streams":[{{"codec_type":"video","width":{width},"height":{height}}}]}}'"#
    )
}

/// ffmpeg stub body: records the invocation, emits progress, writes the
/// output file (the last argument on the real command line).
pub fn ffmpeg_body(marker: &Path) -> String {
    format!(
        "touch {marker}\n\
         for last in \"$@\"; do :; done\n\
         printf 'out_time_us=5000000\\nprogress=continue\\n'\n\
         sleep 0.6\n\
         printf 'progress=end\\n'\n\
         printf 'encoded' > \"$last\"",
        marker = marker.display()
    )
}

/// Build a worker context over an in-memory pool and the given stub tools.
#[cfg(unix)]
pub fn test_context(
    db: DbPool,
    output_dir: &Path,
    max_duration_seconds: u64,
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
) -> WorkerContext {
    test_context_with_delivery(
        db,
        output_dir,
        max_duration_seconds,
        ffprobe,
        ffmpeg,
        DeliveryConfig::default(),
    )
}

/// Same as [`test_context`], with explicit delivery settings.
#[cfg(unix)]
pub fn test_context_with_delivery(
    db: DbPool,
    output_dir: &Path,
    max_duration_seconds: u64,
    ffprobe: PathBuf,
    ffmpeg: PathBuf,
    delivery: DeliveryConfig,
) -> WorkerContext {
    let mut config = Config::default();
    config.storage.output_dir = output_dir.to_path_buf();
    config.worker.max_duration_seconds = max_duration_seconds;
    config.delivery = delivery;

    WorkerContext::new(db, Arc::new(config), ToolRegistry::with_paths(ffmpeg, ffprobe))
}

/// In-memory pool with migrations applied.
pub fn test_pool() -> DbPool {
    init_memory_pool().unwrap()
}
