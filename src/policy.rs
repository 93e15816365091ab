//! Compatibility evaluation.
//!
//! Decides whether a probed file already plays on the target as-is. The
//! check fails closed: anything missing from the probe report makes the file
//! incompatible, which sends it to conversion.

use crate::config::CompatibilityPolicy;
use crate::probe::{CodecType, MediaInfo};

/// Why a probe report could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Malformed {
    #[error("no media info")]
    Missing,
    #[error("report has no container format")]
    NoContainer,
    #[error("report has no stream list")]
    NoStreams,
    #[error("stream #{0} has no codec type")]
    NoCodecType(usize),
    #[error("stream #{0} has no codec name")]
    NoCodecName(usize),
}

/// `true` only when container, video and audio all satisfy `policy`.
///
/// Malformed or absent info is logged and reported as not compatible.
pub fn is_compatible(info: Option<&MediaInfo>, policy: &CompatibilityPolicy) -> bool {
    match evaluate(info, policy) {
        Ok(compatible) => compatible,
        Err(e) => {
            tracing::warn!("Compatibility check failed: {}", e);
            false
        }
    }
}

/// Evaluate `info` against `policy`, surfacing malformed reports as errors.
pub fn evaluate(info: Option<&MediaInfo>, policy: &CompatibilityPolicy) -> Result<bool, Malformed> {
    let info = info.ok_or(Malformed::Missing)?;
    let containers = info.containers.as_ref().ok_or(Malformed::NoContainer)?;
    let streams = info.streams.as_ref().ok_or(Malformed::NoStreams)?;

    if containers.is_disjoint(&policy.containers) {
        return Ok(false);
    }

    let mut video_ok = false;
    let mut audio_ok = false;

    for (i, stream) in streams.iter().enumerate() {
        let kind = stream.codec_type.ok_or(Malformed::NoCodecType(i))?;
        if kind == CodecType::Other {
            continue;
        }

        let codec = stream
            .codec_name
            .as_deref()
            .ok_or(Malformed::NoCodecName(i))?;

        match kind {
            CodecType::Video if codec == policy.video_codec => video_ok = true,
            CodecType::Audio if policy.audio_codecs.contains(codec) => audio_ok = true,
            _ => {}
        }
    }

    Ok(video_ok && audio_ok)
}
