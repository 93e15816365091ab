//! The [`MediaTool`] seam between the conversion pipeline and ffmpeg.

use crate::encode::{encode_with_ffmpeg, EncodeRequest};
use crate::probe::{probe_with_ffprobe, MediaInfo};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Probes and encodes media files.
///
/// The production implementation shells out to ffprobe/ffmpeg; tests swap
/// in deterministic stubs.
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Inspect a file's container and streams.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Produce `request.output` from `request.input`.
    async fn encode(&self, request: &EncodeRequest) -> Result<()>;
}

/// [`MediaTool`] backed by the ffprobe and ffmpeg binaries.
#[derive(Debug, Clone)]
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl FfmpegTool {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        probe_with_ffprobe(&self.ffprobe, path).await
    }

    async fn encode(&self, request: &EncodeRequest) -> Result<()> {
        encode_with_ffmpeg(&self.ffmpeg, request).await
    }
}
