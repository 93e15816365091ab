//! FFmpeg transcoding invocation.

use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// One ffmpeg run: a single input transcoded into a single output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeRequest {
    /// Source file.
    pub input: PathBuf,
    /// File ffmpeg writes to.
    pub output: PathBuf,
    /// Video encoder (e.g. `libx264`).
    pub video_encoder: String,
    /// Encoder speed preset (e.g. `medium`).
    pub preset: String,
    /// Constant rate factor.
    pub crf: u32,
    /// Audio encoder (e.g. `aac`).
    pub audio_encoder: String,
    /// Audio bitrate (e.g. `160k`).
    pub audio_bitrate: String,
    /// Output channel count.
    pub audio_channels: u32,
    /// Relocate the moov atom to the start of the file.
    pub faststart: bool,
}

impl EncodeRequest {
    /// Build the ffmpeg argument list. Paths are passed through untouched,
    /// whatever their encoding.
    pub fn to_args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-nostdin".into(), "-y".into(), "-i".into()];
        args.push(self.input.clone().into_os_string());

        // Video settings
        args.extend([
            "-c:v".into(),
            self.video_encoder.clone().into(),
            "-preset".into(),
            self.preset.clone().into(),
            "-crf".into(),
            self.crf.to_string().into(),
        ]);

        // Audio settings
        args.extend([
            "-c:a".into(),
            self.audio_encoder.clone().into(),
            "-b:a".into(),
            self.audio_bitrate.clone().into(),
            "-ac".into(),
            self.audio_channels.to_string().into(),
        ]);

        if self.faststart {
            args.extend(["-movflags".into(), "+faststart".into()]);
        }

        args.push(self.output.clone().into_os_string());
        args
    }
}

/// Run ffmpeg for `request`. Only exit status 0 counts as success.
pub async fn encode_with_ffmpeg(ffmpeg: &Path, request: &EncodeRequest) -> Result<()> {
    let args = request.to_args();
    tracing::debug!("FFmpeg args: {:?}", args);

    let output = Command::new(ffmpeg)
        .args(&args)
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| Error::from_spawn("ffmpeg", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
        return Err(Error::tool_failed(
            "ffmpeg",
            format!(
                "exited with {}: {}",
                output.status,
                tail.into_iter().rev().collect::<Vec<_>>().join(" | ")
            ),
        ));
    }

    Ok(())
}
