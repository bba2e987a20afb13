//! FFprobe-based media inspection.
//!
//! Shells out to `ffprobe -v error -print_format json -show_format
//! -show_streams` and maps the JSON output into a [`ProbeReport`].

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::command::ToolCommand;
use crate::tools::ToolRegistry;

/// Normalized result of probing an input file.
///
/// A report is only produced when a video stream exists; duration may still
/// be 0.0 when the container does not specify one, and the *caller* decides
/// whether that is fatal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProbeReport {
    /// Container duration in seconds; 0.0 when unspecified.
    pub duration_secs: f64,
    /// Video stream width in pixels.
    pub width: u32,
    /// Video stream height in pixels.
    pub height: u32,
}

/// Probe an input file with ffprobe.
///
/// # Errors
///
/// Returns [`vp_core::Error::Probe`] when ffprobe exits non-zero, its output
/// is unparsable, or the file has no video stream.
pub async fn probe_file(tools: &ToolRegistry, path: &Path) -> vp_core::Result<ProbeReport> {
    let ffprobe = tools.require("ffprobe")?;

    let mut cmd = ToolCommand::new(ffprobe.path.clone());
    cmd.timeout(ffprobe.timeout);
    cmd.args([
        "-v",
        "error",
        "-print_format",
        "json",
        "-show_format",
        "-show_streams",
    ]);
    cmd.arg(path.to_string_lossy().as_ref());

    let output = cmd.execute().await.map_err(|e| match e {
        vp_core::Error::Tool { message, .. } => {
            vp_core::Error::Probe(format!("ffprobe failed: {message}"))
        }
        other => other,
    })?;

    let ff: FfprobeOutput = serde_json::from_str(&output.stdout)
        .map_err(|e| vp_core::Error::Probe(format!("ffprobe JSON parse error: {e}")))?;

    parse_ffprobe_output(ff)
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Default, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

fn parse_ffprobe_output(output: FfprobeOutput) -> vp_core::Result<ProbeReport> {
    // Unspecified or unparsable duration maps to 0.0; the worker treats
    // that as fatal, not this adapter.
    let duration_secs = output
        .format
        .duration
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    let video = output
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| vp_core::Error::Probe("No video stream detected".into()))?;

    Ok(ProbeReport {
        duration_secs,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
    })
}
