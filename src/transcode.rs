//! Conversion of incompatible files into the target profile.
//!
//! A conversion writes to a reserved temp file beside the source, and only
//! after the encoder succeeds is the source removed and the temp file renamed
//! to the normalised final name. The window between removing the source and
//! the rename is not crash-safe: if the process dies there, the converted
//! file survives only under [`TEMP_FILE_NAME`] and must be recovered by hand.

use crate::config::EncodeConfig;
use crate::naming;
use crate::probe::{MediaInfo, MediaTool};
use playready_av::EncodeRequest;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Reserved name of the in-progress output, one per directory.
pub const TEMP_FILE_NAME: &str = "__converted_temp__.mp4";

/// Channel count assumed when the probe does not report one.
pub const DEFAULT_AUDIO_CHANNELS: u32 = 2;

/// Audio bitrate for the given output channel count.
pub fn audio_bitrate_for(channels: u32) -> &'static str {
    if channels <= 2 {
        "160k"
    } else {
        "384k"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("invalid source path: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("could not remove stale temp file {}: {source}", path.display())]
    TempCleanup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("encode failed: {0}")]
    Encode(#[from] playready_av::Error),

    #[error("encoder reported success but produced no output at {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("could not remove source {}: {source}", path.display())]
    SourceRemoval {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not move {} to {}: {source}", temp.display(), target.display())]
    Finalize {
        temp: PathBuf,
        target: PathBuf,
        source: std::io::Error,
    },
}

/// Everything needed to convert one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    pub source_path: PathBuf,
    /// Always in the same directory as `source_path`.
    pub temp_output_path: PathBuf,
    pub final_output_path: PathBuf,
    pub audio_channels: u32,
    pub audio_bitrate: String,
}

impl ConversionJob {
    /// Plan the conversion of `source` using whatever `info` tells us about
    /// its audio.
    pub fn plan(source: &Path, info: Option<&MediaInfo>) -> Result<Self, ConversionError> {
        let invalid = || ConversionError::InvalidSource(source.to_path_buf());

        let file_name = source.file_name().ok_or_else(invalid)?.to_string_lossy();
        let parent = source.parent().ok_or_else(invalid)?;

        let audio_channels = info
            .and_then(MediaInfo::first_audio_channels)
            .filter(|&c| c > 0)
            .unwrap_or(DEFAULT_AUDIO_CHANNELS);

        Ok(Self {
            source_path: source.to_path_buf(),
            temp_output_path: parent.join(TEMP_FILE_NAME),
            final_output_path: parent.join(naming::normalize(&file_name)),
            audio_channels,
            audio_bitrate: audio_bitrate_for(audio_channels).to_string(),
        })
    }

    /// The encoder invocation for this job under `profile`.
    pub fn encode_request(&self, profile: &EncodeConfig) -> EncodeRequest {
        EncodeRequest {
            input: self.source_path.clone(),
            output: self.temp_output_path.clone(),
            video_encoder: profile.video_encoder.clone(),
            preset: profile.preset.clone(),
            crf: profile.crf,
            audio_encoder: profile.audio_encoder.clone(),
            audio_bitrate: self.audio_bitrate.clone(),
            audio_channels: self.audio_channels,
            faststart: true,
        }
    }
}

/// Runs conversion jobs through a [`MediaTool`].
pub struct Transcoder {
    tool: Arc<dyn MediaTool>,
    profile: EncodeConfig,
}

impl Transcoder {
    pub fn new(tool: Arc<dyn MediaTool>, profile: EncodeConfig) -> Self {
        Self { tool, profile }
    }

    /// Convert `job.source_path`, returning the final output path.
    ///
    /// On any failure before the source is removed, the source is left as it
    /// was and no temp file remains.
    pub async fn convert(&self, job: &ConversionJob) -> Result<PathBuf, ConversionError> {
        let temp = &job.temp_output_path;

        if temp.exists() {
            tokio::fs::remove_file(temp)
                .await
                .map_err(|source| ConversionError::TempCleanup {
                    path: temp.clone(),
                    source,
                })?;
            info!("Removed stale temp file: {:?}", temp);
        }

        info!(
            "Converting {:?} ({} channels, audio {})",
            job.source_path, job.audio_channels, job.audio_bitrate
        );

        let request = job.encode_request(&self.profile);
        if let Err(e) = self.tool.encode(&request).await {
            remove_temp(temp).await;
            return Err(e.into());
        }

        if !temp.exists() {
            return Err(ConversionError::MissingOutput(temp.clone()));
        }

        if let Err(source) = tokio::fs::remove_file(&job.source_path).await {
            remove_temp(temp).await;
            return Err(ConversionError::SourceRemoval {
                path: job.source_path.clone(),
                source,
            });
        }
        debug!("Removed source {:?}", job.source_path);

        if job.final_output_path != job.source_path && job.final_output_path.exists() {
            warn!(
                "Replacing existing file {:?} with converted output",
                job.final_output_path
            );
        }

        if let Err(source) = tokio::fs::rename(temp, &job.final_output_path).await {
            error!(
                "Source {:?} was removed but the converted file could not be moved into place; \
                 it remains at {:?}",
                job.source_path, temp
            );
            return Err(ConversionError::Finalize {
                temp: temp.clone(),
                target: job.final_output_path.clone(),
                source,
            });
        }

        info!("Converted successfully: {:?}", job.final_output_path);
        Ok(job.final_output_path.clone())
    }
}

async fn remove_temp(temp: &Path) {
    if !temp.exists() {
        return;
    }
    if let Err(e) = tokio::fs::remove_file(temp).await {
        warn!("Failed to remove temp file {:?}: {}", temp, e);
    }
}
