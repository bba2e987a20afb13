//! Encode parameter planning.
//!
//! Pure mapping from (quality profile, source dimensions) to the ffmpeg
//! argument plan: optional downscale filter, codec and rate-control
//! settings, streamable container flags, and the machine-parseable progress
//! request.

use std::path::Path;

use vp_core::Profile;

/// An ordered transcoding argument plan for one job.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodePlan {
    /// Downscale filter (`scale=-2:<h>`), present only when the profile's
    /// height cap is strictly below the source height.
    pub scale_filter: Option<String>,
    /// Video codec and rate-control arguments.
    pub video_args: Vec<String>,
    /// Audio codec arguments.
    pub audio_args: Vec<String>,
}

impl EncodePlan {
    /// Build a plan from the job's profile and the probed source dimensions.
    ///
    /// All profiles scale preserving aspect ratio; `scale=-2` lets ffmpeg
    /// derive an even-rounded width from the target height.
    pub fn build(profile: Profile, _width: u32, height: u32) -> Self {
        let target_height = match profile {
            Profile::Small => {
                if height > 720 {
                    720
                } else if height > 480 {
                    480
                } else {
                    height
                }
            }
            Profile::Balanced => {
                if height > 720 {
                    720
                } else {
                    height
                }
            }
            Profile::Hq => {
                if height > 1080 {
                    1080
                } else {
                    height
                }
            }
        };

        let scale_filter =
            (target_height < height).then(|| format!("scale=-2:{target_height}"));

        let (video_args, audio_bitrate) = match profile {
            Profile::Small => (
                args(&["-c:v", "libx264", "-b:v", "1000k", "-maxrate", "1200k", "-bufsize", "2000k"]),
                "96k",
            ),
            Profile::Balanced => (
                args(&["-c:v", "libx264", "-b:v", "1600k", "-maxrate", "2000k", "-bufsize", "3000k"]),
                "128k",
            ),
            Profile::Hq => (
                args(&["-c:v", "libx264", "-crf", "23", "-preset", "medium"]),
                "128k",
            ),
        };

        Self {
            scale_filter,
            video_args,
            audio_args: args(&["-c:a", "aac", "-b:a", audio_bitrate]),
        }
    }

    /// Render the full ffmpeg argument vector for this plan.
    ///
    /// Includes `+faststart` for a streamable container and a progress
    /// stream on stdout (`-progress pipe:1 -nostats`).
    pub fn to_args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut argv = args(&["-y", "-i"]);
        argv.push(input.to_string_lossy().to_string());

        if let Some(ref filter) = self.scale_filter {
            argv.push("-vf".into());
            argv.push(filter.clone());
        }

        argv.extend(self.video_args.iter().cloned());
        argv.extend(self.audio_args.iter().cloned());
        argv.extend(args(&[
            "-movflags",
            "+faststart",
            "-progress",
            "pipe:1",
            "-nostats",
            "-v",
            "error",
        ]));
        argv.push(output.to_string_lossy().to_string());
        argv
    }
}

fn args(strs: &[&str]) -> Vec<String> {
    strs.iter().map(|s| s.to_string()).collect()
}
