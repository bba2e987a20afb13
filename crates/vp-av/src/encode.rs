//! Encode execution: runs ffmpeg for a planned job and forwards debounced
//! progress to the caller.

use std::path::Path;

use crate::command::ToolCommand;
use crate::plan::EncodePlan;
use crate::progress::ProgressTracker;
use crate::tools::ToolRegistry;

/// Run the planned transcode, streaming progress into `on_progress`.
///
/// Blocks the calling task until the process exits.  No wall-clock timeout
/// applies: duration is gated before the encode starts.
///
/// # Errors
///
/// Returns [`vp_core::Error::Encode`] when ffmpeg exits non-zero (the
/// message carries the stderr tail), or [`vp_core::Error::Tool`] when it
/// cannot be spawned.
pub async fn run_encode(
    tools: &ToolRegistry,
    plan: &EncodePlan,
    input: &Path,
    output: &Path,
    duration_secs: f64,
    mut on_progress: impl FnMut(i64),
) -> vp_core::Result<()> {
    let ffmpeg = tools.require("ffmpeg")?;

    let mut cmd = ToolCommand::new(ffmpeg.path.clone());
    cmd.args(plan.to_args(input, output));

    let mut child = cmd.spawn_streaming()?;
    let mut tracker = ProgressTracker::new(duration_secs);

    while let Some(line) = child.next_line().await? {
        if let Some(percent) = tracker.push(&line) {
            on_progress(percent);
        }
    }

    let (status, stderr) = child.wait().await?;
    if !status.success() {
        let detail = stderr.trim();
        return Err(vp_core::Error::Encode(if detail.is_empty() {
            format!("ffmpeg exited with status {status}")
        } else {
            format!("ffmpeg exited with status {status}: {detail}")
        }));
    }

    Ok(())
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;
    use vp_core::Profile;

    /// Write an executable shell script standing in for ffmpeg.
    fn stub_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("ffmpeg");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "#!/bin/sh\n{body}").unwrap();
        let mut perms = f.metadata().unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    #[tokio::test]
    async fn progress_lines_reach_callback() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_tool(
            dir.path(),
            "printf 'out_time_us=5000000\\nprogress=continue\\n'; sleep 0.6; printf 'progress=end\\n'",
        );
        let tools = ToolRegistry::with_paths(ffmpeg.clone(), ffmpeg);

        let plan = EncodePlan::build(Profile::Balanced, 1280, 720);
        let mut seen = Vec::new();
        run_encode(
            &tools,
            &plan,
            Path::new("/in.mp4"),
            Path::new("/out.mp4"),
            10.0,
            |p| seen.push(p),
        )
        .await
        .unwrap();

        assert_eq!(seen, vec![50, 100]);
    }

    #[tokio::test]
    async fn nonzero_exit_is_encode_error() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_tool(dir.path(), "echo 'boom' >&2; exit 1");
        let tools = ToolRegistry::with_paths(ffmpeg.clone(), ffmpeg);

        let plan = EncodePlan::build(Profile::Small, 1920, 1080);
        let err = run_encode(
            &tools,
            &plan,
            Path::new("/in.mp4"),
            Path::new("/out.mp4"),
            10.0,
            |_| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, vp_core::Error::Encode(_)));
        assert!(err.to_string().contains("boom"));
    }
}
